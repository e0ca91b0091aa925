use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::Serialize;

use crate::quiz::catalog::{tag_label, LAYERS, PASSING_SCORE, TOTAL_POINTS};
use crate::quiz::rewards::BADGES;
use crate::quiz::Tag;
use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/layers", get(list_layers))
        .route("/items/:id", get(get_item))
        .route("/badges", get(list_badges))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TagSummary {
    tag: Tag,
    label: &'static str,
    items: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LayerSummary {
    depth: u8,
    name: &'static str,
    points: u32,
    percent: u32,
    target_rate: f64,
    tags: Vec<TagSummary>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CatalogOverview {
    total_points: u32,
    passing_score: u32,
    total_items: usize,
    layers: Vec<LayerSummary>,
}

async fn list_layers(State(state): State<AppState>) -> impl IntoResponse {
    let catalog = state.engine().catalog();
    let counts = catalog.count_by_tag();
    let layers = LAYERS
        .iter()
        .map(|layer| LayerSummary {
            depth: layer.depth,
            name: layer.name,
            points: layer.points,
            percent: layer.percent,
            target_rate: layer.target_rate,
            tags: layer
                .tags
                .iter()
                .map(|&tag| TagSummary {
                    tag,
                    label: tag_label(tag),
                    items: counts.get(&tag).copied().unwrap_or(0),
                })
                .collect(),
        })
        .collect();

    ok(CatalogOverview {
        total_points: TOTAL_POINTS,
        passing_score: PASSING_SCORE,
        total_items: catalog.len(),
        layers,
    })
}

async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let item = state
        .engine()
        .catalog()
        .get(&id)
        .cloned()
        .ok_or_else(|| AppError::not_found(&format!("item {id} not found")))?;
    Ok(ok(item))
}

async fn list_badges() -> impl IntoResponse {
    ok(BADGES)
}
