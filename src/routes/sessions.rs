use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::extractors::JsonBody;
use crate::quiz::types::{ErrorType, SelfScore};
use crate::quiz::AnswerRecord;
use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:sid", get(get_session).delete(end_session))
        .route("/:sid/answers", post(submit_answer))
}

async fn get_session(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.engine().current(sid).await?))
}

async fn end_session(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.engine().end_session(sid).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    #[serde(alias = "questionId")]
    pub item_id: String,
    /// 书写题可只给自评，由自评推出对错
    pub correct: Option<bool>,
    pub self_score: Option<SelfScore>,
    pub error_type: Option<ErrorType>,
    #[serde(default)]
    pub time_spent: u32,
}

async fn submit_answer(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
    JsonBody(req): JsonBody<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let engine = state.engine();
    let tag = engine
        .catalog()
        .get(&req.item_id)
        .map(|item| item.tag)
        .ok_or_else(|| AppError::bad_request("UNKNOWN_ITEM", &format!("unknown item {}", req.item_id)))?;

    let correct = match (req.correct, req.self_score) {
        (Some(correct), _) => correct,
        (None, Some(score)) => score != SelfScore::Miss,
        (None, None) => {
            return Err(AppError::bad_request(
                "MISSING_RESULT",
                "either correct or selfScore is required",
            ))
        }
    };

    let record = AnswerRecord {
        self_score: req.self_score,
        error_type: req.error_type,
        time_spent: req.time_spent,
        ..AnswerRecord::new(&req.item_id, tag, correct)
    };
    Ok(ok(engine.submit(sid, record).await?))
}
