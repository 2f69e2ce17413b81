use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use foodstats_core::analysis::AnalysisGateway;
use foodstats_core::ledger::SessionLedger;
use foodstats_core::profile::ProfileStore;
use foodstats_core::recommend::RecommendationGateway;

mod analyzer;
mod catalog;
mod config;
mod error;
mod extract;
mod middleware;
mod recommender;
mod routes;
mod script;
mod session;
mod state;
mod sweeper;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "FoodStats API",
        version = "0.1.0",
        description = "Session-scoped nutrition ledger, recipe catalog and nutrition analysis. \
                       Pass a session id via the X-Session-ID header, the session_id query \
                       parameter or the session_id cookie."
    ),
    paths(
        routes::health::banner,
        routes::health::health_check,
        routes::ingredients::add_ingredient,
        routes::ingredients::list_ingredients,
        routes::ingredients::calculate,
        routes::ingredients::delete_ingredient,
        routes::ingredients::reset_ingredients,
        routes::ingredients::suggestions,
        routes::recipes::list_recipes,
        routes::recipes::get_recipe,
        routes::recipes::add_recipe,
        routes::recipes::suggest_recipes,
        routes::analysis::analyze_nutrition,
        routes::recommendations::smart_recommendations,
        routes::profile::save_profile,
        routes::profile::get_profile,
        routes::profile::reset_profile,
    ),
    components(schemas(
        routes::health::BannerResponse,
        routes::health::HealthResponse,
        routes::MessageResponse,
        routes::StatusResponse,
        routes::profile::ProfileResponse,
        routes::recommendations::RecommendationRequest,
        routes::recommendations::RecommendationResponse,
        foodstats_core::error::ApiError,
        foodstats_core::nutrition::NutrientFacts,
        foodstats_core::nutrition::TemplateIngredient,
        foodstats_core::nutrition::Ingredient,
        foodstats_core::nutrition::NutritionTotals,
        foodstats_core::catalog::Recipe,
        foodstats_core::catalog::RecipeDraft,
        foodstats_core::matcher::RecipeSuggestion,
        foodstats_core::analysis::NutritionAnalysis,
        foodstats_core::recommend::RecipeRecommendation,
        foodstats_core::recommend::RecommendedIngredient,
        foodstats_core::profile::UserProfile,
    ))
)]
struct ApiDoc;

/// Full HTTP stack around `state`. Rate limits key on the client IP, so the
/// server must be run with connect info.
fn build_app(state: state::AppState, request_timeout: Duration) -> Router {
    let session_layer = session::SessionLayer::new(state.secure_cookies);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(routes::api_router())
        .layer(session_layer)
        .layer(axum::middleware::from_fn(middleware::security_headers::apply))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(middleware::cors::build_cors_layer()),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "foodstats_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = match config::AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            std::process::exit(1);
        }
    };

    // Catalog database
    let pool = match PgPoolOptions::new()
        .max_connections(20)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => pool,
        Err(err) => {
            tracing::error!(error = %err, "failed to connect to catalog database");
            std::process::exit(1);
        }
    };

    if let Err(err) = sqlx::migrate!("../migrations").run(&pool).await {
        tracing::error!(error = %err, "failed to run migrations");
        std::process::exit(1);
    }

    let catalog = Arc::new(catalog::PgCatalog::new(pool));
    let analyzer = Arc::new(analyzer::SubprocessAnalyzer::new(
        config.analyzer_program.clone(),
        config.analyzer_script.clone(),
    ));
    let recommender = Arc::new(recommender::SubprocessRecommender::new(
        config.analyzer_program.clone(),
        config.recommender_script.clone(),
    ));
    tracing::info!(
        program = %config.analyzer_program,
        analyzer = %config.analyzer_script.display(),
        recommender = %config.recommender_script.display(),
        timeout_secs = config.analyzer_timeout.as_secs(),
        "analysis scripts configured"
    );

    let app_state = state::AppState {
        ledger: Arc::new(SessionLedger::new()),
        profiles: Arc::new(ProfileStore::new()),
        ingredients: catalog.clone(),
        recipes: catalog,
        analysis: Arc::new(AnalysisGateway::new(analyzer, config.analyzer_timeout)),
        recommendations: Arc::new(RecommendationGateway::new(
            recommender,
            config.analyzer_timeout,
        )),
        secure_cookies: config.secure_cookies(),
    };

    sweeper::spawn_session_sweeper(
        app_state.ledger.clone(),
        app_state.profiles.clone(),
        config.session_sweep_interval,
        config.session_idle_ttl,
    );

    let app = build_app(app_state, config.request_timeout);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("FoodStats API listening on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, %addr, "failed to bind");
            std::process::exit(1);
        }
    };
    if let Err(err) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        tracing::error!(error = %err, "server error");
        std::process::exit(1);
    }
}
