use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use common::SessionId;
use common::games::tictactoe::{BoardError, BotError, GameError};
use common::stats::StatsError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("missing user id")]
    MissingUserId,

    #[error("game {0} not found")]
    SessionNotFound(SessionId),

    #[error("{0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Board(#[from] BoardError),

    #[error(transparent)]
    Bot(#[from] BotError),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error("bot worker failed: {0}")]
    Worker(String),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::MissingUserId => StatusCode::UNAUTHORIZED,
            ServerError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::InvalidRequest(_) | ServerError::Board(_) | ServerError::Bot(_) => {
                StatusCode::BAD_REQUEST
            }
            ServerError::Game(GameError::GameOver | GameError::NotYourTurn) => StatusCode::CONFLICT,
            ServerError::Game(_) => StatusCode::BAD_REQUEST,
            ServerError::Stats(_) | ServerError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
