use super::{AssetError, BatchFailure, Confirmation, ReorderOutcome, UploadFile};
use crate::AppState;
use crate::catalog::Asset;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

#[derive(Serialize)]
pub struct MutationResponse {
    success: bool,
    message: String,
}

fn refuse_unauthorized(headers: &HeaderMap, state: &AppState) -> Result<(), StatusCode> {
    if crate::api::is_caller_authorized(headers, &state.config.app) {
        Ok(())
    } else {
        warn!("unauthorized back-office request refused");
        Err(StatusCode::UNAUTHORIZED)
    }
}

fn error_status(error: &AssetError) -> StatusCode {
    match error {
        AssetError::EmptyBatch | AssetError::NotConfirmed => StatusCode::BAD_REQUEST,
        AssetError::UnknownAsset(_) => StatusCode::NOT_FOUND,
        AssetError::MissingStoragePath(_) => StatusCode::CONFLICT,
        AssetError::Storage(_) | AssetError::Catalog(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Serialize)]
pub struct AssetListResponse {
    assets: Vec<Asset>,
}

pub async fn list_assets_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AssetListResponse>, StatusCode> {
    refuse_unauthorized(&headers, &app_state)?;

    match app_state.library.snapshot().await {
        Ok(assets) => Ok(Json(AssetListResponse { assets })),
        Err(e) => {
            error!("failed to load asset snapshot: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn folders_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, StatusCode> {
    refuse_unauthorized(&headers, &app_state)?;

    match app_state.library.folders().await {
        Ok(folders) => Ok(Json(folders)),
        Err(e) => {
            error!("failed to build folder index: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[derive(Serialize)]
pub struct UploadResponse {
    success: bool,
    message: String,
    uploaded: Vec<Asset>,
    failed: Option<BatchFailure>,
}

pub async fn upload_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, StatusCode> {
    refuse_unauthorized(&headers, &app_state)?;

    let mut category = String::new();
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("malformed multipart upload: {}", e);
        StatusCode::BAD_REQUEST
    })? {
        match field.name() {
            Some("category") => {
                category = field.text().await.map_err(|e| {
                    warn!("unreadable category field: {}", e);
                    StatusCode::BAD_REQUEST
                })?;
            }
            Some("file") => {
                let name = field.file_name().unwrap_or("file").to_string();
                let content_type = field
                    .content_type()
                    .map(|ct| ct.to_string())
                    .unwrap_or_else(|| {
                        mime_guess::from_path(&name)
                            .first_or_octet_stream()
                            .to_string()
                    });
                let bytes = field.bytes().await.map_err(|e| {
                    warn!(file = %name, "failed to read upload body: {}", e);
                    StatusCode::BAD_REQUEST
                })?;
                files.push(UploadFile {
                    name,
                    bytes: bytes.to_vec(),
                    content_type,
                });
            }
            _ => {}
        }
    }

    match app_state.library.upload_batch(files, &category).await {
        Ok(report) => {
            let status = if report.failed.is_none() {
                StatusCode::OK
            } else {
                StatusCode::MULTI_STATUS
            };
            let response = UploadResponse {
                success: report.failed.is_none(),
                message: report.summary(),
                uploaded: report.uploaded,
                failed: report.failed,
            };
            Ok((status, Json(response)))
        }
        Err(e) => {
            error!("upload rejected: {}", e);
            Err(error_status(&e))
        }
    }
}

#[derive(Deserialize)]
pub struct ReorderRequest {
    pub category: String,
    pub asset_id: u64,
    pub target_index: usize,
}

#[derive(Serialize)]
pub struct ReorderResponse {
    success: bool,
    changed: bool,
    message: String,
    order: Vec<u64>,
}

pub async fn reorder_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ReorderRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    refuse_unauthorized(&headers, &app_state)?;

    let outcome = app_state
        .library
        .reorder_category(&request.category, request.asset_id, request.target_index)
        .await
        .map_err(|e| {
            error!("reorder failed: {}", e);
            error_status(&e)
        })?;

    let response = match outcome {
        ReorderOutcome::Unchanged => (
            StatusCode::OK,
            Json(ReorderResponse {
                success: true,
                changed: false,
                message: "no change".to_string(),
                order: Vec::new(),
            }),
        ),
        ReorderOutcome::Applied { order } => (
            StatusCode::OK,
            Json(ReorderResponse {
                success: true,
                changed: true,
                message: "order saved".to_string(),
                order: order.iter().map(|a| a.id).collect(),
            }),
        ),
        ReorderOutcome::Reverted { order, error } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ReorderResponse {
                success: false,
                changed: false,
                message: format!("failed to save order, reloaded saved state: {error}"),
                order: order.iter().map(|a| a.id).collect(),
            }),
        ),
    };
    Ok(response)
}

pub async fn delete_asset_handler(
    State(app_state): State<AppState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Result<Json<MutationResponse>, StatusCode> {
    refuse_unauthorized(&headers, &app_state)?;

    match app_state.library.delete_asset(id).await {
        Ok(()) => Ok(Json(MutationResponse {
            success: true,
            message: format!("deleted asset {id}"),
        })),
        Err(e) => {
            error!(id, "failed to delete asset: {}", e);
            Err(error_status(&e))
        }
    }
}

#[derive(Deserialize)]
pub struct ConfirmQuery {
    #[serde(default)]
    pub confirm: bool,
}

pub async fn delete_category_handler(
    State(app_state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<ConfirmQuery>,
    headers: HeaderMap,
) -> Result<Json<MutationResponse>, StatusCode> {
    refuse_unauthorized(&headers, &app_state)?;

    match app_state
        .library
        .delete_category(&name, Confirmation::from_flag(query.confirm))
        .await
    {
        Ok(report) => Ok(Json(MutationResponse {
            success: true,
            message: format!(
                "deleted category '{}': {} object(s), {} row(s)",
                name, report.objects_deleted, report.rows_deleted
            ),
        })),
        Err(e) => {
            error!(category = %name, "failed to delete category: {}", e);
            Err(error_status(&e))
        }
    }
}

pub async fn delete_all_handler(
    State(app_state): State<AppState>,
    Query(query): Query<ConfirmQuery>,
    headers: HeaderMap,
) -> Result<Json<MutationResponse>, StatusCode> {
    refuse_unauthorized(&headers, &app_state)?;

    match app_state
        .library
        .delete_all(Confirmation::from_flag(query.confirm))
        .await
    {
        Ok(report) => Ok(Json(MutationResponse {
            success: true,
            message: format!(
                "deleted all assets: {} object(s), {} row(s)",
                report.objects_deleted, report.rows_deleted
            ),
        })),
        Err(e) => {
            error!("failed to delete all assets: {}", e);
            Err(error_status(&e))
        }
    }
}
