use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{Html, Json},
    routing::{get, post},
    Form, Router,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::api_errors::AppError;
use crate::app_state::AppState;
use crate::errors::DashError;
use crate::form_builder::{FieldControl, FormEdits};
use crate::labels::RawLabel;
use crate::model::ModelInfo;
use crate::pages::{self, PageOutcome};
use crate::record::{FeatureValue, InputRecord};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictResponse {
    pub request_id: Uuid,
    pub record: InputRecord,
    pub raw_label: RawLabel,
    pub display_label: String,
    pub is_positive_outcome: bool,
}

/// Dashboard pages, JSON API and health endpoints over shared state
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/api/form", get(form_controls))
        .route("/api/record/default", get(default_record))
        .route("/api/predict", post(predict))
        .route("/api/model", get(model_info))
        .layer(CorsLayer::permissive());

    Router::new()
        .route("/", get(home_page))
        .route("/predict", get(prediction_page).post(submit_prediction))
        .route("/model-info", get(model_info_page))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .merge(api)
        .with_state(state)
}

async fn home_page() -> Html<String> {
    Html(pages::home_page())
}

async fn prediction_page(State(st): State<Arc<AppState>>) -> Html<String> {
    let record = st.form.default_record();
    Html(pages::prediction_page(
        &st.form.controls_for(&record),
        Some(&record),
        None,
    ))
}

async fn submit_prediction(
    State(st): State<Arc<AppState>>,
    Form(fields): Form<HashMap<String, String>>,
) -> (StatusCode, Html<String>) {
    let edits: FormEdits = fields
        .into_iter()
        .map(|(name, value)| (name, FeatureValue::Text(value)))
        .collect();
    let (cycle, outcome) = st.predict(&edits);

    // A rejected form keeps the submitted values but has no record to show
    let record = cycle.record();
    let controls = match record {
        Some(record) => st.form.controls_for(record),
        None => st.form.controls_for(&st.form.echo_record(&edits)),
    };

    match outcome {
        Ok(result) => (
            StatusCode::OK,
            Html(pages::prediction_page(
                &controls,
                record,
                Some(PageOutcome::Resolved(&result)),
            )),
        ),
        Err(e) => {
            let (invalid, message) = match &e {
                DashError::Validation { field, message } => (true, format!("{field}: {message}")),
                DashError::Prediction { message } => (false, message.clone()),
                other => (false, other.to_string()),
            };
            let outcome = if invalid {
                PageOutcome::Invalid(&message)
            } else {
                PageOutcome::Failed(&message)
            };
            (
                AppError::from(e).status(),
                Html(pages::prediction_page(&controls, record, Some(outcome))),
            )
        }
    }
}

async fn model_info_page(State(st): State<Arc<AppState>>) -> Html<String> {
    Html(pages::model_info_page(&st.model_info))
}

async fn form_controls(State(st): State<Arc<AppState>>) -> Json<Vec<FieldControl>> {
    Json(st.form.controls())
}

async fn default_record(State(st): State<Arc<AppState>>) -> Json<InputRecord> {
    Json(st.form.default_record())
}

async fn predict(
    State(st): State<Arc<AppState>>,
    body: Result<Json<FormEdits>, JsonRejection>,
) -> Result<Json<PredictResponse>, AppError> {
    let Json(edits) = body.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let (cycle, outcome) = st.predict(&edits);
    let result = outcome?;
    let record = cycle
        .record()
        .cloned()
        .ok_or_else(|| AppError::internal("resolved cycle has no record"))?;

    Ok(Json(PredictResponse {
        request_id: cycle.id,
        record,
        raw_label: result.raw_label,
        display_label: result.display_label,
        is_positive_outcome: result.is_positive_outcome,
    }))
}

async fn model_info(State(st): State<Arc<AppState>>) -> Json<ModelInfo> {
    Json(st.model_info.clone())
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn readyz(State(st): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ready": true, "model": st.model_info.name }))
}
