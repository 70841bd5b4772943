use std::future::Future;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, State},
    http::request::Parts,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};

use common::games::tictactoe::{Board, BotInput, calculate_minimax_move};
use common::stats::{GameOutcome, StatsCounters, StatsError, StatsStore};
use common::{SessionId, UserId, log};

use crate::api_types::{
    BotMoveRequest, BotMoveResponse, CreateGameRequest, GameView, IncrementStatsRequest,
    MoveRequest, ResetRequest, parse_player_mark,
};
use crate::error::ServerError;
use crate::game_session_manager::GameSessionManager;

pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Clone)]
pub struct WebServerState {
    pub session_manager: GameSessionManager,
    pub stats_store: Arc<dyn StatsStore>,
}

/// The caller's identity, taken from the `X-User-Id` header.
#[derive(Debug, Clone)]
pub struct UserIdentity(pub UserId);

impl<S> FromRequestParts<S> for UserIdentity
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| UserIdentity(UserId::from(value)))
            .ok_or(ServerError::MissingUserId)
    }
}

pub fn router(state: WebServerState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/bot/move", post(bot_move_handler))
        .route("/api/games", post(create_game_handler))
        .route("/api/games/{id}", get(get_game_handler))
        .route("/api/games/{id}/move", post(make_move_handler))
        .route("/api/games/{id}/reset", post(reset_game_handler))
        .route("/api/stats", get(get_stats_handler))
        .route("/api/stats/increment", post(increment_stats_handler))
        .route("/api/stats/reset", post(reset_stats_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn run_web_server(
    state: WebServerState,
    bind_address: &str,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    log!("Web server listening on {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
}

pub async fn bot_move_handler(
    Json(request): Json<BotMoveRequest>,
) -> Result<Json<BotMoveResponse>, ServerError> {
    let board = Board::from_symbols(&request.board)?;
    let bot_mark = parse_player_mark(&request.bot_mark)?;
    let input = BotInput::new(board, bot_mark);

    let index = tokio::task::spawn_blocking(move || calculate_minimax_move(&input))
        .await
        .map_err(|e| ServerError::Worker(e.to_string()))??;

    Ok(Json(BotMoveResponse { index }))
}

pub async fn create_game_handler(
    State(state): State<WebServerState>,
    UserIdentity(user): UserIdentity,
    Json(request): Json<CreateGameRequest>,
) -> Result<Json<GameView>, ServerError> {
    let view = state
        .session_manager
        .create_session(user, request.game_mode()?, request.first_mark()?)
        .await?;
    Ok(Json(view))
}

pub async fn get_game_handler(
    State(state): State<WebServerState>,
    UserIdentity(user): UserIdentity,
    Path(id): Path<String>,
) -> Result<Json<GameView>, ServerError> {
    let view = state
        .session_manager
        .get_view(&user, &SessionId::new(id))
        .await?;
    Ok(Json(view))
}

pub async fn make_move_handler(
    State(state): State<WebServerState>,
    UserIdentity(user): UserIdentity,
    Path(id): Path<String>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<GameView>, ServerError> {
    let view = state
        .session_manager
        .make_move(&user, &SessionId::new(id), request.index)
        .await?;
    Ok(Json(view))
}

pub async fn reset_game_handler(
    State(state): State<WebServerState>,
    UserIdentity(user): UserIdentity,
    Path(id): Path<String>,
    Json(request): Json<ResetRequest>,
) -> Result<Json<GameView>, ServerError> {
    let view = state
        .session_manager
        .reset_session(&user, &SessionId::new(id), request.first_mark()?)
        .await?;
    Ok(Json(view))
}

pub async fn get_stats_handler(
    State(state): State<WebServerState>,
    UserIdentity(user): UserIdentity,
) -> Result<Json<StatsCounters>, ServerError> {
    let counters = run_stats(&state.stats_store, move |store| store.get_stats(&user)).await?;
    Ok(Json(counters))
}

pub async fn increment_stats_handler(
    State(state): State<WebServerState>,
    UserIdentity(user): UserIdentity,
    Json(request): Json<IncrementStatsRequest>,
) -> Result<Json<StatsCounters>, ServerError> {
    let outcome: GameOutcome = request
        .result
        .parse()
        .map_err(ServerError::InvalidRequest)?;
    let counters = run_stats(&state.stats_store, move |store| store.increment(&user, outcome)).await?;
    Ok(Json(counters))
}

pub async fn reset_stats_handler(
    State(state): State<WebServerState>,
    UserIdentity(user): UserIdentity,
) -> Result<Json<StatsCounters>, ServerError> {
    log!("Resetting stats for user {}", user);
    let counters = run_stats(&state.stats_store, move |store| store.reset(&user)).await?;
    Ok(Json(counters))
}

// Stores may block on file I/O, which must stay off the runtime workers.
async fn run_stats<T, F>(store: &Arc<dyn StatsStore>, operation: F) -> Result<T, ServerError>
where
    T: Send + 'static,
    F: FnOnce(&dyn StatsStore) -> Result<T, StatsError> + Send + 'static,
{
    let store = store.clone();
    let result = tokio::task::spawn_blocking(move || operation(store.as_ref()))
        .await
        .map_err(|e| ServerError::Worker(e.to_string()))?;
    Ok(result?)
}
