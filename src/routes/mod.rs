mod auth;
mod home;
mod upload;
mod videos;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::get_config;
use crate::middleware::auth::auth_middleware;
use crate::services::ingest::{Ingestor, SeaVideoStore};
use crate::services::s3::{ObjectStore, S3Service};
use crate::services::staging::StagingStore;
use crate::services::tool::ProcessRunner;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub ingestor: Arc<Ingestor>,
    pub objects: Arc<dyn ObjectStore>,
}

// Define the OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // General endpoints
        home::root,
        // Authentication endpoints
        auth::register,
        auth::login,
        // Video record endpoints
        videos::create_video,
        videos::list_videos,
        videos::get_video,
        videos::delete_video,
        // Upload endpoints
        upload::upload_video,
        upload::upload_thumbnail,
    ),
    components(
        schemas(
            home::RootResponse,
            auth::RegisterRequest,
            auth::UserResponse,
            auth::LoginRequest,
            auth::LoginResponse,
            videos::CreateVideoRequest,
            videos::VideoResponse,
        )
    ),
    tags(
        (name = "General", description = "General API information"),
        (name = "Authentication", description = "Account registration and login"),
        (name = "Videos", description = "Owner-scoped video records"),
        (name = "Upload", description = "Video and thumbnail ingestion")
    ),
    info(
        title = "ClipStream API",
        version = "0.1.0",
        description = "A Rust/Axum service that ingests uploaded videos, rewrites them for fast-start streaming, and stores them in S3",
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

// Add security scheme for JWT Bearer tokens
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            utoipa::openapi::security::SecurityScheme::Http(
                utoipa::openapi::security::Http::new(
                    utoipa::openapi::security::HttpAuthScheme::Bearer
                )
            ),
        );
    }
}

pub async fn create_routes(db: DatabaseConnection) -> Router {
    let config = get_config();

    let s3 = Arc::new(S3Service::new().await);
    if let Err(e) = s3.ensure_bucket_exists().await {
        eprintln!("S3 | Failed to ensure bucket exists: {:?}", e);
    }

    let ingestor = Arc::new(Ingestor::new(
        Arc::new(SeaVideoStore::new(db.clone())),
        s3.clone(),
        Arc::new(ProcessRunner),
        StagingStore::new(config.upload_temp_dir.clone()),
    ));

    let state = AppState {
        db,
        ingestor,
        objects: s3,
    };

    // Swagger UI (stateless)
    let swagger_router: Router = SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into();

    // Video bodies get a 1 GiB ceiling, thumbnails 10 MiB
    let upload_routes = Router::new()
        .route("/videos/{id}/upload", post(upload::upload_video))
        .layer(DefaultBodyLimit::max(1 << 30))
        .merge(
            Router::new()
                .route("/videos/{id}/thumbnail", post(upload::upload_thumbnail))
                .layer(DefaultBodyLimit::max(10 << 20)),
        );

    // Protected routes that require auth
    let protected_routes = Router::new()
        .route("/videos", post(videos::create_video))
        .route("/videos", get(videos::list_videos))
        .route("/videos/{id}", get(videos::get_video))
        .route("/videos/{id}", delete(videos::delete_video))
        .merge(upload_routes)
        .layer(middleware::from_fn(auth_middleware));

    // Public routes (no auth required) and merge all together
    let app_routes = Router::new()
        .route("/", get(home::root))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .merge(protected_routes)
        .with_state(state);

    // Merge Swagger UI (which has no state) with the rest
    Router::new()
        .merge(swagger_router)
        .merge(app_routes)
        .layer(CorsLayer::permissive())
}
