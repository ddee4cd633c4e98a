//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.

use std::sync::Arc;

use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::error::ApiError;
use crate::logic::*;
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;
use crate::util::trunc_for_log;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "memodeck_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "memodeck_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "memodeck_backend", msg = %trunc_for_log(&txt, 200), "WS received");
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "memodeck_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => {
        let _ = socket.send(Message::Pong(payload)).await;
      }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "memodeck_backend", "WebSocket disconnected");
}

fn err_reply(e: ApiError) -> ServerWsMessage {
  ServerWsMessage::Error { message: e.to_string() }
}

#[instrument(level = "info", skip(msg, state))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::Generate { topic } => match generate_cards(state, &topic).await {
      Ok((flashcards, origin)) => {
        info!(target: "memodeck_backend", count = flashcards.len(), %origin, "WS generate served");
        ServerWsMessage::Generated { flashcards, origin }
      }
      Err(e) => err_reply(e),
    },

    ClientWsMessage::SuggestName => match suggest_name(state).await {
      Ok(name) => ServerWsMessage::NameSuggestion { name },
      Err(e) => err_reply(e),
    },

    ClientWsMessage::SaveLesson { name } => match save_lesson(state, &name).await {
      Ok(lesson) => {
        info!(target: "lesson", id = %lesson.id, "WS lesson saved");
        ServerWsMessage::LessonSaved { lesson }
      }
      Err(e) => err_reply(e),
    },

    ClientWsMessage::ListLessons => {
      let lessons = list_lessons(state).await;
      ServerWsMessage::Lessons { lessons }
    }

    ClientWsMessage::LoadLesson { lesson_id } => match load_lesson(state, &lesson_id).await {
      Ok(lesson) => ServerWsMessage::LessonLoaded { lesson },
      Err(e) => err_reply(e),
    },

    ClientWsMessage::DeleteLesson { lesson_id } => match delete_lesson(state, &lesson_id).await {
      Ok(()) => {
        info!(target: "lesson", %lesson_id, "WS lesson deleted");
        ServerWsMessage::LessonDeleted { lesson_id }
      }
      Err(e) => err_reply(e),
    },

    ClientWsMessage::ShareLesson { lesson_id, shared_by } => {
      match share_lesson(state, &lesson_id, shared_by).await {
        Ok(community) => {
          info!(target: "lesson", %lesson_id, community_id = %community.community_id, "WS share served");
          ServerWsMessage::LessonShared { community }
        }
        Err(e) => err_reply(e),
      }
    }

    ClientWsMessage::UnshareLesson { lesson_id } => match unshare_lesson(state, &lesson_id).await {
      Ok(()) => ServerWsMessage::LessonUnshared { lesson_id },
      Err(e) => err_reply(e),
    },

    ClientWsMessage::ListCommunity => match list_community(state).await {
      Ok(lessons) => ServerWsMessage::Community { lessons },
      Err(e) => err_reply(e),
    },

    ClientWsMessage::CopyLesson { community_id, confirm } => {
      match copy_lesson(state, &community_id, confirm).await {
        Ok(out) => ServerWsMessage::LessonCopied {
          requires_confirmation: out.requires_confirmation,
          lesson: out.lesson,
          message: out.message,
        },
        Err(e) => err_reply(e),
      }
    }

    ClientWsMessage::QuizStart => match quiz_start(state).await {
      Ok(quiz) => ServerWsMessage::QuizState { quiz },
      Err(e) => err_reply(e),
    },

    ClientWsMessage::QuizAnswer { answer } => match quiz_answer(state, &answer).await {
      Ok(out) => ServerWsMessage::AnswerResult {
        correct: out.correct,
        correct_answer: out.correct_answer,
        is_final: out.is_final,
        score: out.score,
      },
      Err(e) => err_reply(e),
    },

    ClientWsMessage::QuizNext => match quiz_next(state).await {
      Ok(quiz) => ServerWsMessage::QuizState { quiz },
      Err(e) => err_reply(e),
    },

    ClientWsMessage::QuizRestart => match quiz_restart(state).await {
      Ok(quiz) => ServerWsMessage::QuizState { quiz },
      Err(e) => err_reply(e),
    },

    ClientWsMessage::QuizExit => ServerWsMessage::QuizState { quiz: quiz_exit(state).await },
  }
}
