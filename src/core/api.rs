//! REST API over a single schema editor
//!
//! - GET    /api/schema                             - Export schema JSON
//! - PUT    /api/schema                             - Import schema JSON
//! - POST   /api/tables                             - Add a table
//! - PUT    /api/tables/{id}                        - Replace a table
//! - DELETE /api/tables/{id}                        - Delete a table (cascades)
//! - POST   /api/tables/{id}/columns                - Add a column
//! - DELETE /api/tables/{id}/columns/{column_id}    - Delete a column
//! - POST   /api/relationships                      - Add a relationship
//! - DELETE /api/relationships/{id}                 - Delete a relationship
//! - GET    /api/validation                         - Findings, checklist and score
//! - GET    /api/sql, /api/sql/{mode}               - Generated SQL
//! - POST   /api/insights                           - Learning insights

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde::Serialize;
use tokio::sync::RwLock;

use super::config::Config;
use super::editor::{EXPORT_FILE_NAME, SchemaEditor};
use super::error::SchemaError;
use super::insights::{LearnerProgress, LearningInsightsProvider, provider_for};
use super::schema::{Column, Relationship, Table};
use super::sql_generator::{SqlMode, sql_file_name};

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub editor: Arc<RwLock<SchemaEditor>>,
    pub insights: Arc<dyn LearningInsightsProvider>,
    pub default_sql_mode: SqlMode,
}

impl AppState {
    /// Wrap an editor and an insights provider
    pub fn new(editor: SchemaEditor, insights: Arc<dyn LearningInsightsProvider>) -> Self {
        Self {
            editor: Arc::new(RwLock::new(editor)),
            insights,
            default_sql_mode: SqlMode::default(),
        }
    }

    /// Fresh editor plus the provider and SQL mode picked by config
    pub fn from_config(config: &Config) -> Self {
        Self {
            default_sql_mode: config.default_sql_mode,
            ..Self::new(SchemaEditor::new(), provider_for(config))
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: &'static str,
    pub message: String,
}

impl IntoResponse for SchemaError {
    fn into_response(self) -> Response {
        let status = match &self {
            e if e.is_not_found() => StatusCode::NOT_FOUND,
            SchemaError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SchemaError::DuplicateColumn { .. } => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        };
        let body = ApiError {
            error: self.code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Router
// ============================================================================

/// Create the API router over the given state
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/schema", get(export_schema).put(import_schema))
        .route("/api/tables", post(add_table))
        .route("/api/tables/{id}", put(update_table).delete(delete_table))
        .route("/api/tables/{id}/columns", post(add_column))
        .route("/api/tables/{id}/columns/{column_id}", delete(delete_column))
        .route("/api/relationships", post(add_relationship))
        .route("/api/relationships/{id}", delete(delete_relationship))
        .route("/api/validation", get(validation))
        .route("/api/sql", get(default_sql))
        .route("/api/sql/{mode}", get(sql))
        .route("/api/insights", post(insights))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> &'static str {
    "ok"
}

async fn export_schema(State(state): State<AppState>) -> Result<Response, SchemaError> {
    let bytes = state.editor.read().await.export_schema()?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
            ),
        ],
        bytes,
    )
        .into_response())
}

async fn import_schema(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode, SchemaError> {
    state.editor.write().await.import_schema(&body)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_table(State(state): State<AppState>) -> impl IntoResponse {
    let mut editor = state.editor.write().await;
    let table = editor.add_table().clone();
    (StatusCode::CREATED, Json(table))
}

async fn update_table(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut table): Json<Table>,
) -> Result<Json<Table>, SchemaError> {
    table.id = id.clone();
    if state.editor.write().await.update_table(table.clone()) {
        Ok(Json(table))
    } else {
        Err(SchemaError::TableNotFound(id))
    }
}

async fn delete_table(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    state.editor.write().await.delete_table(&id);
    StatusCode::NO_CONTENT
}

async fn add_column(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(column): Json<Column>,
) -> Result<impl IntoResponse, SchemaError> {
    state
        .editor
        .write()
        .await
        .add_column(&id, column.clone())?;
    Ok((StatusCode::CREATED, Json(column)))
}

async fn delete_column(
    State(state): State<AppState>,
    Path((id, column_id)): Path<(String, String)>,
) -> Result<StatusCode, SchemaError> {
    state.editor.write().await.delete_column(&id, &column_id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_relationship(
    State(state): State<AppState>,
    Json(relationship): Json<Relationship>,
) -> impl IntoResponse {
    state
        .editor
        .write()
        .await
        .add_relationship(relationship.clone());
    (StatusCode::CREATED, Json(relationship))
}

async fn delete_relationship(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> StatusCode {
    state.editor.write().await.delete_relationship(&id);
    StatusCode::NO_CONTENT
}

async fn validation(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.editor.read().await.validation_report())
}

async fn default_sql(State(state): State<AppState>) -> Response {
    let mode = state.default_sql_mode;
    render_sql(&state, mode).await
}

async fn sql(
    State(state): State<AppState>,
    Path(mode): Path<String>,
) -> Result<Response, SchemaError> {
    let mode: SqlMode = mode.parse()?;
    Ok(render_sql(&state, mode).await)
}

async fn render_sql(state: &AppState, mode: SqlMode) -> Response {
    let sql = state.editor.read().await.generate_sql(mode);
    let file_name = sql_file_name(mode, chrono::Utc::now());
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        sql,
    )
        .into_response()
}

async fn insights(
    State(state): State<AppState>,
    Json(progress): Json<LearnerProgress>,
) -> impl IntoResponse {
    Json(state.insights.insights(&progress))
}
