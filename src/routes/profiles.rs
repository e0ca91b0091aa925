use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::extractors::JsonBody;
use crate::quiz::{ProfileSnapshot, QuizMode, Tag};
use crate::response::{created, ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/:id",
            get(get_profile).put(import_profile).delete(reset_profile),
        )
        .route("/:id/name", patch(rename_profile))
        .route("/:id/progress", get(get_progress))
        .route("/:id/bookmarks/:item_id", post(toggle_bookmark))
        .route("/:id/sessions", post(start_session))
}

async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.engine().snapshot(&id).await?))
}

async fn import_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(snapshot): JsonBody<ProfileSnapshot>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.engine().import_snapshot(&id, snapshot).await?))
}

async fn reset_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.engine().reset_profile(&id).await?))
}

#[derive(Debug, Deserialize)]
struct RenameRequest {
    name: String,
}

async fn rename_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<RenameRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::bad_request("INVALID_NAME", "名前を入力してください"));
    }
    let snapshot = state.engine().rename_profile(&id, &req.name).await?;
    Ok(ok(snapshot.profile))
}

async fn get_progress(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.engine().progress(&id).await?))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BookmarkResponse {
    item_id: String,
    /// `None` when the item has never been answered.
    bookmarked: Option<bool>,
}

async fn toggle_bookmark(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let bookmarked = state.engine().toggle_bookmark(&id, &item_id).await?;
    Ok(ok(BookmarkResponse { item_id, bookmarked }))
}

/// 未指定地层时从最浅层开始
const DEFAULT_LAYER_DEPTH: u8 = 1;

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub mode: String,
    pub depth: Option<u8>,
    pub tag: Option<Tag>,
}

impl StartSessionRequest {
    pub fn into_mode(self) -> Result<QuizMode, AppError> {
        let mode = match self.mode.as_str() {
            "daily" => QuizMode::Daily,
            "trial" => QuizMode::Trial,
            "repair" => QuizMode::Repair,
            "layer" => QuizMode::Layer {
                depth: self.depth.unwrap_or(DEFAULT_LAYER_DEPTH),
            },
            "category" => QuizMode::Category {
                tag: self
                    .tag
                    .ok_or_else(|| AppError::bad_request("MISSING_TAG", "category mode requires tag"))?,
            },
            "exam_short" => QuizMode::ExamShort,
            "exam_full" => QuizMode::ExamFull,
            other => {
                return Err(AppError::bad_request(
                    "UNKNOWN_MODE",
                    &format!("unknown quiz mode: {other}"),
                ))
            }
        };
        Ok(mode)
    }
}

async fn start_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<StartSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mode = req.into_mode()?;
    Ok(created(state.engine().start_session(&id, mode).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(mode: &str, depth: Option<u8>, tag: Option<Tag>) -> StartSessionRequest {
        StartSessionRequest {
            mode: mode.to_string(),
            depth,
            tag,
        }
    }

    #[test]
    fn parses_every_mode() {
        assert_eq!(request("daily", None, None).into_mode().unwrap(), QuizMode::Daily);
        assert_eq!(
            request("layer", Some(4), None).into_mode().unwrap(),
            QuizMode::Layer { depth: 4 }
        );
        assert_eq!(
            request("category", None, Some(Tag::Homophone)).into_mode().unwrap(),
            QuizMode::Category { tag: Tag::Homophone }
        );
        assert_eq!(request("exam_full", None, None).into_mode().unwrap(), QuizMode::ExamFull);
        assert_eq!(
            request("layer", None, None).into_mode().unwrap(),
            QuizMode::Layer { depth: 1 }
        );
    }

    #[test]
    fn rejects_incomplete_modes() {
        assert_eq!(request("category", None, None).into_mode().unwrap_err().code, "MISSING_TAG");
        assert_eq!(request("sprint", None, None).into_mode().unwrap_err().code, "UNKNOWN_MODE");
    }
}
