/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use minitask_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = minitask_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::{ApiError, ApiResult},
    middleware::security::SecurityHeadersLayer,
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use minitask_shared::auth::middleware::{authenticate, InitDataSettings};
use minitask_shared::telegram::{ProfileLookup, TeloxideProfiles};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Telegram profile source; `None` when no bot token is configured
    pub profiles: Option<Arc<dyn ProfileLookup>>,
}

impl AppState {
    /// Creates new application state, wiring the Bot API profile lookup
    /// when a bot token is configured
    pub fn new(db: PgPool, config: Config) -> Self {
        let profiles = config.telegram.bot_token.as_ref().map(|token| {
            Arc::new(TeloxideProfiles::new(
                token.clone(),
                config.static_files.avatar_dir(),
                config.static_files.avatar_url_prefix(),
            )) as Arc<dyn ProfileLookup>
        });

        Self {
            db,
            config: Arc::new(config),
            profiles,
        }
    }

    /// Replaces the profile lookup
    pub fn with_profiles(mut self, profiles: Arc<dyn ProfileLookup>) -> Self {
        self.profiles = Some(profiles);
        self
    }

    /// Settings for verifying init data
    pub fn init_data_settings(&self) -> InitDataSettings {
        InitDataSettings {
            bot_token: self.config.telegram.bot_token.clone(),
            max_age: self.config.telegram.init_data_max_age(),
        }
    }

    /// Profile lookup, or a configuration error when the bot token is absent
    pub fn profiles(&self) -> ApiResult<Arc<dyn ProfileLookup>> {
        self.profiles.clone().ok_or_else(|| {
            ApiError::Configuration("Server is missing BOT_TOKEN configuration".to_string())
        })
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                     # Health check (public)
/// ├── /static/*                   # Cached avatars (public)
/// ├── /tasks                      # init data required from here down
/// │   ├── POST   /
/// │   ├── GET    /?filter_plan_id=
/// │   ├── POST   /analyze-task
/// │   ├── GET    /:id
/// │   ├── PUT    /:id
/// │   ├── DELETE /:id
/// │   └── POST   /:id/share
/// ├── /plans
/// │   ├── POST   /
/// │   ├── GET    /
/// │   ├── GET    /:id
/// │   ├── PUT    /:id
/// │   ├── DELETE /:id
/// │   └── POST   /:id/share
/// ├── GET /reminders
/// └── GET /tg/info/:identifier
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Init data authentication (protected routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let task_routes = Router::new()
        .route(
            "/",
            post(routes::tasks::create_task).get(routes::tasks::list_tasks),
        )
        .route("/analyze-task", post(routes::tasks::analyze_task))
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/:id/share", post(routes::tasks::share_task));

    let plan_routes = Router::new()
        .route(
            "/",
            post(routes::plans::create_plan).get(routes::plans::list_plans),
        )
        .route(
            "/:id",
            get(routes::plans::get_plan)
                .put(routes::plans::update_plan)
                .delete(routes::plans::delete_plan),
        )
        .route("/:id/share", post(routes::plans::share_plan));

    let protected_routes = Router::new()
        .nest("/tasks", task_routes)
        .nest("/plans", plan_routes)
        .route("/reminders", get(routes::reminders::list_reminders))
        .route("/tg/info/:identifier", get(routes::telegram::get_telegram_info))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            init_data_auth_layer,
        ));

    let static_files = ServeDir::new(&state.config.static_files.dir);
    let static_prefix = state.config.static_files.url_prefix.as_str();

    let router = Router::new().merge(health_routes).merge(protected_routes);
    let router = if static_prefix == "/" {
        router.fallback_service(static_files)
    } else {
        router.nest_service(static_prefix, static_files)
    };

    router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// CORS for the mini-app origin(s)
fn cors_layer(config: &Config) -> CorsLayer {
    let init_data_header = HeaderName::from_static("x-telegram-init-data");
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        // Development mode: any origin, no credentials
        return CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, init_data_header]);
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers([header::CONTENT_TYPE, init_data_header])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Init data authentication middleware layer
///
/// Verifies the `X-Telegram-Init-Data` header, then injects the
/// `InitDataUser` into request extensions.
async fn init_data_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(req.headers(), &state.init_data_settings())?;

    tracing::debug!(user_id = user.id, path = %req.uri().path(), "Authenticated request");
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
