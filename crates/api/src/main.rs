use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use finsight_core::analytics;
use finsight_core::chat::DialogueRouter;
use finsight_core::config::Settings;
use finsight_core::domain::chat::{ChatMessage, ConversationLog};
use finsight_core::domain::market::TopMovers;
use finsight_core::domain::prediction::StockPrediction;
use finsight_core::domain::recommendation::SectorRecommendations;
use finsight_core::domain::transaction::{Dashboard, Transaction};
use finsight_core::error::Error;
use finsight_core::market::http::HttpMarketData;
use finsight_core::market::movers::MoversBoard;
use finsight_core::market::MarketDataClient;
use finsight_core::projection::Projector;
use finsight_core::recommend::SectorRanker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    if settings.news_api_key.is_none() {
        tracing::warn!("NEWS_API_KEY missing; news answers will fall back to the default reply");
    }

    let client: Arc<dyn MarketDataClient> = Arc::new(HttpMarketData::from_settings(&settings)?);
    let deadline = settings.fetch_timeout();

    let movers = Arc::new(MoversBoard::new(client.clone(), deadline));
    let movers_task = movers
        .clone()
        .spawn_refresh_loop(settings.movers_refresh_interval());

    let state = AppState {
        router: DialogueRouter::new(client.clone(), deadline, &settings.news_query),
        projector: Arc::new(Projector::new(client.clone(), deadline)),
        movers,
        conversation: Arc::new(Mutex::new(ConversationLog::new())),
        client,
        settings: Arc::new(settings),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/dashboard", post(post_dashboard))
        .route("/recommendations", post(post_recommendations))
        .route("/predictions/:symbol", get(get_prediction))
        .route("/movers", get(get_movers))
        .route("/chat", post(post_chat))
        .route("/chat/history", get(get_chat_history))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    movers_task.abort();
    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    client: Arc<dyn MarketDataClient>,
    settings: Arc<Settings>,
    router: DialogueRouter,
    projector: Arc<Projector>,
    movers: Arc<MoversBoard>,
    conversation: Arc<Mutex<ConversationLog>>,
}

#[derive(Debug, Deserialize)]
struct TransactionsRequest {
    transactions: Vec<Transaction>,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    transactions: Vec<Transaction>,
}

#[derive(Debug, Serialize)]
struct ApiRecommendations {
    balance: f64,
    used_fallback: bool,
    sectors: Vec<SectorRecommendations>,
}

#[derive(Debug, Serialize)]
struct ApiError {
    error: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

fn error_response(err: Error) -> (StatusCode, Json<ApiError>) {
    let status = match &err {
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::DataInsufficient { .. } | Error::UndefinedMetric(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        Error::Superseded { .. } => StatusCode::CONFLICT,
        Error::FetchFailure(_) => StatusCode::BAD_GATEWAY,
    };
    if status.is_server_error() {
        sentry_anyhow::capture_anyhow(&anyhow::Error::new(err.clone()));
        tracing::error!(error = %err, "request failed");
    }
    (
        status,
        Json(ApiError {
            error: err.to_string(),
        }),
    )
}

async fn post_dashboard(Json(req): Json<TransactionsRequest>) -> ApiResult<Dashboard> {
    analytics::validate_transactions(&req.transactions).map_err(error_response)?;
    Ok(Json(analytics::dashboard(&req.transactions)))
}

async fn post_recommendations(
    State(state): State<AppState>,
    Json(req): Json<TransactionsRequest>,
) -> ApiResult<ApiRecommendations> {
    analytics::validate_transactions(&req.transactions).map_err(error_response)?;
    let balance = analytics::financial_metrics(&req.transactions).balance;

    let ranker = SectorRanker::new(
        state.client.as_ref(),
        state.settings.fetch_timeout(),
        &state.settings.news_query,
    );
    let outcome = ranker.recommend(balance).await;

    Ok(Json(ApiRecommendations {
        balance,
        used_fallback: outcome.used_fallback,
        sectors: outcome.sectors,
    }))
}

async fn get_prediction(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> ApiResult<StockPrediction> {
    let prediction = state
        .projector
        .predict(&symbol)
        .await
        .map_err(error_response)?;
    Ok(Json(prediction))
}

async fn get_movers(State(state): State<AppState>) -> Json<TopMovers> {
    Json(state.movers.current().await)
}

async fn post_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> ApiResult<ChatMessage> {
    analytics::validate_transactions(&req.transactions).map_err(error_response)?;
    let metrics = analytics::financial_metrics(&req.transactions);

    // The log lock is never held across a fetch.
    let (user, reply) = state.router.exchange(&req.message, &metrics).await;
    state
        .conversation
        .lock()
        .await
        .record_exchange(user, reply.clone());
    Ok(Json(reply))
}

async fn get_chat_history(State(state): State<AppState>) -> Json<Vec<ChatMessage>> {
    let log = state.conversation.lock().await;
    Json(log.messages().to_vec())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
