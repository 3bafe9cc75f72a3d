//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{card_llm::OpenAiCardAdapter, db::DbAdapter, plan_llm::OpenAiPlanAdapter},
    config::Config,
    error::ApiError,
    suggester,
    web::{
        auth::{login_handler, logout_handler, me_handler, signup_handler},
        flashcards, habits, middleware::require_auth, notifications, planner, pomodoro, state::AppState,
        stats, tasks, ApiDoc,
    },
};
use async_openai::{config::OpenAIConfig, Client};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize the LLM Adapters ---
    let mut openai_config = OpenAIConfig::new().with_api_base(&config.llm_api_base);
    match &config.llm_api_key {
        Some(key) => openai_config = openai_config.with_api_key(key),
        None => warn!("LLM_API_KEY is not set; plan and card generation will fail"),
    }
    let llm_client = Client::with_config(openai_config);

    let plan_adapter = Arc::new(OpenAiPlanAdapter::new(
        llm_client.clone(),
        config.plan_model.clone(),
    ));
    let card_adapter = Arc::new(OpenAiCardAdapter::new(
        llm_client.clone(),
        config.card_model.clone(),
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        db: db_adapter.clone(),
        config: config.clone(),
        plan_adapter,
        card_adapter,
    });

    // --- 5. Start the Background Suggestion Sweep ---
    suggester::spawn(db_adapter, config.suggestion_interval_secs);

    let cors = tower_http::cors::CorsLayer::new()
        .allow_origin(
            config
                .cors_origin
                .parse::<HeaderValue>()
                .map_err(|e| ApiError::Internal(format!("Invalid CORS_ORIGIN: {}", e)))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 6. Create the Web Router ---
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/auth/me", get(me_handler))
        .route(
            "/tasks",
            get(tasks::list_tasks_handler).post(tasks::create_task_handler),
        )
        .route(
            "/tasks/{id}",
            put(tasks::update_task_handler).delete(tasks::delete_task_handler),
        )
        .route(
            "/flashcards/sets",
            get(flashcards::list_sets_handler).post(flashcards::create_set_handler),
        )
        .route(
            "/flashcards/sets/{set_id}",
            delete(flashcards::delete_set_handler),
        )
        .route(
            "/flashcards/sets/{set_id}/cards",
            get(flashcards::list_cards_handler).post(flashcards::create_card_handler),
        )
        .route(
            "/flashcards/sets/{set_id}/queue",
            get(flashcards::due_queue_handler),
        )
        .route(
            "/flashcards/sets/{set_id}/sessions",
            post(flashcards::finish_session_handler),
        )
        .route(
            "/flashcards/cards/{card_id}",
            delete(flashcards::delete_card_handler),
        )
        .route(
            "/flashcards/cards/{card_id}/grade",
            post(flashcards::grade_card_handler),
        )
        .route("/flashcards/generate", post(flashcards::generate_cards_handler))
        .route(
            "/pomodoro/sessions",
            get(pomodoro::list_intervals_handler).post(pomodoro::record_interval_handler),
        )
        .route("/pomodoro/focus-count", get(pomodoro::focus_count_handler))
        .route("/plans/generate", post(planner::generate_plan_handler))
        .route("/plans", get(planner::list_plans_handler))
        .route(
            "/plans/{id}",
            delete(planner::delete_plan_handler),
        )
        .route("/plans/{id}/items", put(planner::update_plan_items_handler))
        .route(
            "/habits",
            get(habits::list_habits_handler).post(habits::create_habit_handler),
        )
        .route("/habits/logs", get(habits::list_habit_logs_handler))
        .route(
            "/habits/{id}",
            put(habits::update_habit_handler).delete(habits::delete_habit_handler),
        )
        .route("/habits/{id}/logs", put(habits::upsert_habit_log_handler))
        .route(
            "/notifications",
            get(notifications::list_notifications_handler),
        )
        .route(
            "/notifications/{id}/read",
            post(notifications::mark_read_handler),
        )
        .route("/statistics", get(stats::get_stats_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 7. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
