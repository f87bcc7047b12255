use super::{GalleryFilter, GalleryPage, GalleryQuery};
use crate::AppState;
use axum::{
    extract::{Query, State},
    response::Json,
};
use tracing::error;

/// Anonymous paginated gallery feed. A failed read degrades to an explicit
/// empty page rather than an error view.
pub async fn gallery_page_handler(
    State(app_state): State<AppState>,
    Query(query): Query<GalleryQuery>,
) -> Json<GalleryPage> {
    let filter = GalleryFilter::parse(query.filter.as_deref().unwrap_or(""));
    let page = query.page.unwrap_or(0);

    match app_state.reader.fetch_page(filter, page).await {
        Ok(gallery_page) => Json(gallery_page),
        Err(e) => {
            error!(filter = %filter.as_str(), page, "gallery fetch failed: {}", e);
            Json(GalleryPage {
                items: Vec::new(),
                page,
                page_size: app_state.reader.page_size(),
                has_more: false,
                filter: filter.as_str().to_string(),
            })
        }
    }
}
