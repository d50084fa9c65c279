use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use storage::{Database, services::JudgingService, store::PgStore};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod extract;
mod features;
mod middleware;
mod routes;
mod state;

use config::Config;
use features::{criteria, groups, results, scores};
use middleware::auth::ApiKeys;
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        groups::handlers::list_groups,
        groups::handlers::get_group,
        groups::handlers::create_group,
        groups::handlers::update_group,
        groups::handlers::delete_group,
        groups::handlers::check_access,
        criteria::handlers::list_criteria,
        criteria::handlers::save_criteria,
        scores::handlers::submit_score,
        scores::handlers::my_scores,
        results::handlers::get_results,
        results::handlers::get_judge_breakdown,
        results::handlers::export_results,
    ),
    components(
        schemas(
            storage::dto::group::CreateGroupRequest,
            storage::dto::group::UpdateGroupRequest,
            storage::dto::group::GroupResponse,
            storage::dto::criterion::CriterionInput,
            storage::dto::criterion::SaveCriteriaRequest,
            storage::dto::score::SubmitScoreRequest,
            storage::dto::results::GroupResultsResponse,
            storage::dto::results::JudgeBreakdownResponse,
            storage::dto::results::GroupInfo,
            storage::dto::results::RankingEntry,
            storage::dto::results::SubmissionInfo,
            storage::dto::results::SubmissionCriterionScores,
            storage::dto::results::CriterionBreakdown,
            storage::dto::results::JudgeSummary,
            storage::dto::results::JudgeSubmissionScores,
            storage::dto::results::JudgeRating,
            storage::dto::results::GroupStatistics,
            storage::dto::common::PaginationMeta,
            storage::services::AccessDecision,
            storage::services::AccessReason,
            storage::services::GatedResource,
            storage::models::Criterion,
            storage::models::Score,
            storage::models::Visibility,
            storage::models::ScoringScale,
            storage::models::ClosedReason,
        )
    ),
    tags(
        (name = "groups", description = "Judging group administration and access checks"),
        (name = "criteria", description = "Judging criteria of a group"),
        (name = "scores", description = "Judge scoring"),
        (name = "results", description = "Aggregated results and exports"),
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("API Key")
                        .build(),
                ),
            )
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting judging API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    tracing::info!(
        "Connecting to database at: {}",
        config
            .database_url
            .split('@')
            .next_back()
            .unwrap_or("unknown")
    );
    let db = Database::new(&config.database_url)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations");
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    let service = JudgingService::from_store(Arc::new(PgStore::new(&db)));
    let state = AppState::new(service, ApiKeys::from_comma_separated(&config.api_keys));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    let app = routes::api_router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors);

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    axum::serve(listener, app).await?;

    Ok(())
}
