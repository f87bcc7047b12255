use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod api;
pub mod assets;
pub mod catalog;
pub mod gallery;
pub mod startup_checks;
pub mod storage;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub app: AppConfig,
    pub storage: StorageConfig,
    pub catalog: CatalogConfig,
    pub library: LibraryConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub name: String,
    pub log_level: String,
    pub session_secret: String,
    pub admin_password: String,
    /// Email whitelist for the back office. Sessions are only issued to
    /// these addresses, and every mutating route re-checks the session.
    #[serde(default)]
    pub admin_emails: Vec<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub root_directory: PathBuf,
    /// Route prefix under which stored objects are served publicly.
    #[serde(default = "default_media_prefix")]
    pub public_prefix: String,
}

fn default_media_prefix() -> String {
    "/media".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    pub file: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    /// Fixed category vocabulary, unioned with observed freeform categories
    /// for folder display.
    pub known_categories: Vec<String>,
    pub gallery_page_size: usize,
    /// Sampling interval for upload progress reporting, in milliseconds.
    pub progress_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            app: AppConfig {
                name: "Atelier".to_string(),
                log_level: "info".to_string(),
                session_secret: "change-me-in-production".to_string(),
                admin_password: "password".to_string(),
                admin_emails: Vec::new(),
                base_url: None,
            },
            storage: StorageConfig {
                root_directory: PathBuf::from("media"),
                public_prefix: default_media_prefix(),
            },
            catalog: CatalogConfig {
                file: PathBuf::from("catalog.json"),
            },
            library: LibraryConfig {
                known_categories: assets::KNOWN_CATEGORIES
                    .iter()
                    .map(|c| c.to_string())
                    .collect(),
                gallery_page_size: 24,
                progress_interval_ms: 250,
            },
        }
    }
}

use axum::Router;
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub library: Arc<assets::AssetLibrary>,
    pub reader: Arc<gallery::GalleryReader>,
    pub catalog: catalog::SharedCatalog,
    pub config: Config,
}

pub async fn create_app(config: Config) -> Result<Router, Box<dyn std::error::Error>> {
    let catalog: catalog::SharedCatalog =
        Arc::new(catalog::JsonCatalog::load_or_create(&config.catalog.file).await?);

    let storage = storage::create_gateway(&config.storage, config.app.base_url.as_deref());

    let library = Arc::new(assets::AssetLibrary::new(
        storage,
        catalog.clone(),
        config.library.clone(),
        config.storage.public_prefix.clone(),
    ));

    let reader = Arc::new(gallery::GalleryReader::new(
        catalog.clone(),
        config.library.gallery_page_size,
    ));

    let app_state = AppState {
        library,
        reader,
        catalog,
        config: config.clone(),
    };

    let router = Router::new()
        .route("/api/auth", axum::routing::post(api::authenticate_handler))
        .route("/api/verify", axum::routing::get(api::verify_handler))
        .route(
            "/api/gallery",
            axum::routing::get(gallery::gallery_page_handler),
        )
        .route(
            "/api/admin/assets",
            axum::routing::get(assets::list_assets_handler).delete(assets::delete_all_handler),
        )
        .route(
            "/api/admin/folders",
            axum::routing::get(assets::folders_handler),
        )
        .route(
            "/api/admin/upload",
            axum::routing::post(assets::upload_handler),
        )
        .route(
            "/api/admin/reorder",
            axum::routing::post(assets::reorder_handler),
        )
        .route(
            "/api/admin/asset/{id}",
            axum::routing::delete(assets::delete_asset_handler),
        )
        .route(
            "/api/admin/category/{name}",
            axum::routing::delete(assets::delete_category_handler),
        )
        .nest_service(
            "/media",
            ServeDir::new(config.storage.root_directory.clone()),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let method = request.method();
                    let uri = request.uri();
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched_path| matched_path.as_str());

                    tracing::info_span!(
                        "http_request",
                        method = %method,
                        uri = %uri,
                        matched_path,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    let method = request.method();
                    let uri = request.uri();
                    let headers = request.headers();
                    let user_agent = headers
                        .get("user-agent")
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("-");
                    let referer = headers
                        .get("referer")
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("-");

                    tracing::info!(
                        target: "access_log",
                        method = %method,
                        path = %uri.path(),
                        query = ?uri.query(),
                        user_agent = %user_agent,
                        referer = %referer,
                        "request"
                    );
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        let status = response.status();
                        let size = response
                            .headers()
                            .get("content-length")
                            .and_then(|h| h.to_str().ok())
                            .unwrap_or("-");

                        tracing::info!(
                            target: "access_log",
                            status = %status,
                            size = %size,
                            latency_ms = %latency.as_millis(),
                            "response"
                        );
                    },
                ),
        )
        .with_state(app_state);

    Ok(router)
}
