use axum::{
    extract::{ws::WebSocket, Path, State, WebSocketUpgrade},
    http::{HeaderMap, StatusCode},
    response::Response,
    Json,
};
use futures::StreamExt;
use tracing::{info, instrument, warn};

use super::game_hub::HubSummary;
use super::models::UserId;
use crate::shared::{user_id, AppError, AppState};

/// HTTP handler for taking a game live
///
/// POST /games/:pin/start
/// Returns the running hub, whether it was just started or already live
#[instrument(name = "start_game", skip(state, headers))]
pub async fn start_game(
    State(state): State<AppState>,
    Path(pin): Path<String>,
    headers: HeaderMap,
) -> Result<Json<HubSummary>, AppError> {
    let user_id = user_id(&headers)?;
    info!(game_pin = %pin, user_id, "Starting game");

    let hub = state.registry.start_game(&pin, user_id).await?;
    Ok(Json(hub.summary()))
}

/// HTTP handler for ending a live game
///
/// POST /games/:pin/end
/// Only the owner may end a game
#[instrument(name = "end_game", skip(state, headers))]
pub async fn end_game(
    State(state): State<AppState>,
    Path(pin): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let user_id = user_id(&headers)?;
    let hub = state
        .registry
        .get(&pin)
        .ok_or_else(|| AppError::NotFound(format!("Game not live: {}", pin)))?;

    if hub.owner_id() != user_id {
        warn!(game_pin = %pin, user_id, "Non-owner tried to end game");
        return Err(AppError::Forbidden("Only the owner can end a game".to_string()));
    }

    state.registry.end(&pin).await?;
    info!(game_pin = %pin, user_id, "Game ended");
    Ok(StatusCode::NO_CONTENT)
}

/// WebSocket endpoint for keepers
///
/// GET /games/:pin/keep
/// Authorization is checked before the upgrade so refused keepers get a plain HTTP error
pub async fn keep_game(
    ws: WebSocketUpgrade,
    Path(pin): Path<String>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let user_id = user_id(&headers)?;
    let hub = state
        .registry
        .get(&pin)
        .ok_or_else(|| AppError::NotFound(format!("Game not live: {}", pin)))?;
    if !hub.is_authorized(user_id) {
        warn!(game_pin = %pin, user_id, "Rejecting unauthorized keeper");
        return Err(super::HubError::KeeperNotAuthorized(user_id).into());
    }

    info!(game_pin = %pin, user_id, "Keeper connection requested");
    let max_message_size = state.registry.config().max_message_size;
    Ok(ws
        .max_message_size(max_message_size)
        .on_upgrade(move |socket| handle_keeper_connection(socket, pin, user_id, state)))
}

async fn handle_keeper_connection(socket: WebSocket, pin: String, user_id: UserId, state: AppState) {
    let (sink, stream) = socket.split();
    if let Err(e) = state.registry.join_keeper(&pin, user_id, sink, stream).await {
        warn!(game_pin = %pin, user_id, error = %e, "Keeper could not join");
    }
}

/// WebSocket endpoint for watchers
///
/// GET /games/:pin/watch
pub async fn watch_game(
    ws: WebSocketUpgrade,
    Path(pin): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    if state.registry.get(&pin).is_none() {
        return Err(AppError::NotFound(format!("Game not live: {}", pin)));
    }

    info!(game_pin = %pin, "Watcher connection requested");
    let max_message_size = state.registry.config().max_message_size;
    Ok(ws
        .max_message_size(max_message_size)
        .on_upgrade(move |socket| handle_watcher_connection(socket, pin, state)))
}

async fn handle_watcher_connection(socket: WebSocket, pin: String, state: AppState) {
    // Watchers never send anything the hub needs; the read half only keeps the connection serviced
    let (sink, mut stream) = socket.split();
    match state.registry.join_watcher(&pin, sink).await {
        Ok(_) => {
            while let Some(Ok(_)) = stream.next().await {}
        }
        Err(e) => warn!(game_pin = %pin, error = %e, "Watcher could not join"),
    }
}
