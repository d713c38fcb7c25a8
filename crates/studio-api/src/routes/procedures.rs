//! # Procedure Routes
//!
//! | Route                                | Returns                             |
//! |--------------------------------------|-------------------------------------|
//! | `GET /api/procedures`                | path to kind for every procedure    |
//! | `GET /api/procedures/:path`          | one procedure with its descriptors  |
//! | `POST /api/procedures/:path/execute` | the relayed invocation outcome      |

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/procedures", get(list_procedures))
        .route("/api/procedures/:path", get(get_procedure))
        .route("/api/procedures/:path/execute", post(execute_procedure))
}

async fn list_procedures(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.catalog.kinds())
}

async fn get_procedure(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let info = state
        .catalog
        .get(&path)
        .ok_or_else(|| AppError::procedure_not_found(&path))?;
    Ok(Json(info.clone()))
}

async fn execute_procedure(
    State(state): State<AppState>,
    Path(path): Path<String>,
    body: Bytes,
) -> Result<Response, AppError> {
    let info = state
        .catalog
        .get(&path)
        .ok_or_else(|| AppError::procedure_not_found(&path))?;
    if !info.kind.is_executable() {
        return Err(AppError::BadRequest(format!(
            "`{path}` is a {}; it cannot be executed from here",
            info.kind
        )));
    }

    let relayed = state.relay.invoke(&path, info.kind, &body).await?;
    let status = StatusCode::from_u16(relayed.status).unwrap_or(StatusCode::BAD_GATEWAY);
    Ok((status, Json(relayed.body)).into_response())
}
