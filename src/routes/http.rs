//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; errors map to status codes via `ApiError`.

use std::sync::Arc;

use axum::{
  extract::{Path, State},
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::logic::*;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state, body), fields(topic_len = body.topic.len()))]
pub async fn http_generate(
  State(state): State<Arc<AppState>>,
  Json(body): Json<GenerateIn>,
) -> Result<Json<GenerateOut>, ApiError> {
  let (flashcards, origin) = generate_cards(&state, &body.topic).await?;
  info!(target: "memodeck_backend", count = flashcards.len(), %origin, "HTTP generate served");
  Ok(Json(GenerateOut { flashcards, origin }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_suggest_name(
  State(state): State<Arc<AppState>>,
) -> Result<Json<NameOut>, ApiError> {
  let name = suggest_name(&state).await?;
  Ok(Json(NameOut { name }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_lessons(State(state): State<Arc<AppState>>) -> Json<Vec<crate::domain::Lesson>> {
  let lessons = list_lessons(&state).await;
  info!(target: "lesson", count = lessons.len(), "HTTP lesson list served");
  Json(lessons)
}

#[instrument(level = "info", skip(state, body), fields(name = %body.name))]
pub async fn http_save_lesson(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SaveLessonIn>,
) -> Result<Json<crate::domain::Lesson>, ApiError> {
  let lesson = save_lesson(&state, &body.name).await?;
  info!(target: "lesson", id = %lesson.id, "HTTP lesson saved");
  Ok(Json(lesson))
}

#[instrument(level = "info", skip(state, body), fields(%body.lesson_id))]
pub async fn http_load_lesson(
  State(state): State<Arc<AppState>>,
  Json(body): Json<LoadLessonIn>,
) -> Result<Json<crate::domain::Lesson>, ApiError> {
  let lesson = load_lesson(&state, &body.lesson_id).await?;
  Ok(Json(lesson))
}

#[instrument(level = "info", skip(state), fields(%lesson_id))]
pub async fn http_delete_lesson(
  State(state): State<Arc<AppState>>,
  Path(lesson_id): Path<String>,
) -> Result<Json<SuccessOut>, ApiError> {
  delete_lesson(&state, &lesson_id).await?;
  Ok(Json(SuccessOut { success: true }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_community(
  State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<crate::domain::CommunityLesson>>, ApiError> {
  let lessons = list_community(&state).await?;
  info!(target: "lesson", count = lessons.len(), "HTTP community list served");
  Ok(Json(lessons))
}

#[instrument(level = "info", skip(state, body), fields(%body.lesson_id))]
pub async fn http_share_lesson(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ShareIn>,
) -> Result<Json<crate::domain::CommunityLesson>, ApiError> {
  let community = share_lesson(&state, &body.lesson_id, body.shared_by).await?;
  info!(target: "lesson", id = %body.lesson_id, community_id = %community.community_id, "HTTP share served");
  Ok(Json(community))
}

#[instrument(level = "info", skip(state, body), fields(%body.lesson_id))]
pub async fn http_unshare_lesson(
  State(state): State<Arc<AppState>>,
  Json(body): Json<UnshareIn>,
) -> Result<Json<SuccessOut>, ApiError> {
  unshare_lesson(&state, &body.lesson_id).await?;
  Ok(Json(SuccessOut { success: true }))
}

#[instrument(level = "info", skip(state, body), fields(%body.community_id, confirm = body.confirm))]
pub async fn http_copy_lesson(
  State(state): State<Arc<AppState>>,
  Json(body): Json<CopyIn>,
) -> Result<Json<CopyOut>, ApiError> {
  let out = copy_lesson(&state, &body.community_id, body.confirm).await?;
  Ok(Json(out))
}

#[instrument(level = "info", skip(state))]
pub async fn http_quiz_state(State(state): State<Arc<AppState>>) -> Json<QuizStateOut> {
  Json(quiz_state(&state).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_quiz_start(
  State(state): State<Arc<AppState>>,
) -> Result<Json<QuizStateOut>, ApiError> {
  Ok(Json(quiz_start(&state).await?))
}

#[instrument(level = "info", skip(state, body), fields(answer_len = body.answer.len()))]
pub async fn http_quiz_answer(
  State(state): State<Arc<AppState>>,
  Json(body): Json<QuizAnswerIn>,
) -> Result<Json<AnswerOut>, ApiError> {
  Ok(Json(quiz_answer(&state, &body.answer).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_quiz_next(
  State(state): State<Arc<AppState>>,
) -> Result<Json<QuizStateOut>, ApiError> {
  Ok(Json(quiz_next(&state).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_quiz_restart(
  State(state): State<Arc<AppState>>,
) -> Result<Json<QuizStateOut>, ApiError> {
  Ok(Json(quiz_restart(&state).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_quiz_exit(State(state): State<Arc<AppState>>) -> Json<QuizStateOut> {
  Json(quiz_exit(&state).await)
}
