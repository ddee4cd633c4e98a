//! Error taxonomy shared by stores, the synchronizer, the quiz engine,
//! and the HTTP/WS boundary.
//!
//! Every variant is recoverable: handlers surface it as a transient
//! message and the process stays up.

use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

use crate::protocol::ErrorOut;

/// Failures reported by a lesson or community-pool store.
#[derive(Debug, Error)]
pub enum StoreError {
  /// The referenced document does not exist in durable storage.
  #[error("not found")]
  NotFound,
  /// I/O or serialization failure; the message carries the cause.
  #[error("store unavailable: {0}")]
  Unavailable(String),
}

/// Failures reported by the lesson synchronizer.
#[derive(Debug, Error)]
pub enum SyncError {
  #[error("lesson not found")]
  NotFound,
  #[error("lesson is already shared")]
  AlreadyShared,
  #[error("store unavailable: {0}")]
  Store(String),
}

impl From<StoreError> for SyncError {
  fn from(e: StoreError) -> Self {
    match e {
      StoreError::NotFound => SyncError::NotFound,
      StoreError::Unavailable(msg) => SyncError::Store(msg),
    }
  }
}

/// Failures reported by the quiz engine.
#[derive(Debug, Error)]
pub enum QuizError {
  #[error("at least {need} flashcards are required to start a quiz, got {have}")]
  InsufficientCards { have: usize, need: usize },
  #[error("no quiz is in progress")]
  NotInProgress,
  #[error("the current question was already answered")]
  AlreadyAnswered,
}

/// Intent-level error surfaced over HTTP and WebSocket.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  NotFound(String),
  #[error("{0}")]
  AlreadyShared(String),
  #[error("{0}")]
  InsufficientCards(String),
  #[error("{0}")]
  ValidationFailed(String),
  #[error("{0}")]
  GenerationFailed(String),
  #[error("{0}")]
  StoreUnavailable(String),
}

impl From<SyncError> for ApiError {
  fn from(e: SyncError) -> Self {
    match e {
      SyncError::NotFound => ApiError::NotFound("Lesson not found.".into()),
      SyncError::AlreadyShared => {
        ApiError::AlreadyShared("This lesson is already shared. You can unshare it first.".into())
      }
      SyncError::Store(msg) => ApiError::StoreUnavailable(msg),
    }
  }
}

impl From<QuizError> for ApiError {
  fn from(e: QuizError) -> Self {
    match e {
      QuizError::InsufficientCards { .. } => ApiError::InsufficientCards(e.to_string()),
      QuizError::NotInProgress | QuizError::AlreadyAnswered => {
        ApiError::ValidationFailed(e.to_string())
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> axum::response::Response {
    let status = match &self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::AlreadyShared(_) => StatusCode::CONFLICT,
      ApiError::InsufficientCards(_) | ApiError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
      ApiError::GenerationFailed(_) => StatusCode::BAD_GATEWAY,
      ApiError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(ErrorOut { error: self.to_string() })).into_response()
  }
}
