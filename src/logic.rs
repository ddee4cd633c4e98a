//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Generating flashcards from a topic (OpenAI, or seed decks when no
//!     key is configured)
//!   - Suggesting a lesson name from the working set
//!   - Saving/loading/deleting/sharing lessons through the synchronizer
//!   - Driving the quiz engine

use tracing::{error, info, instrument, warn};

use crate::domain::{CommunityLesson, Flashcard, Lesson};
use crate::error::ApiError;
use crate::parser::{parse_flashcards, render_flashcards};
use crate::protocol::{quiz_to_out, AnswerOut, CopyOut, QuizStateOut};
use crate::seeds::{fallback_deck, pick_deck};
use crate::state::AppState;

const FALLBACK_LESSON_NAME: &str = "Untitled Lesson";

/// How many cards the name-suggestion prompt samples.
const NAME_SAMPLE_CARDS: usize = 3;

/// Generate flashcards for a topic and make them the session's working
/// set. With OpenAI configured, a transport failure surfaces as
/// `GenerationFailed`; without a key, the seed decks serve instead.
#[instrument(level = "info", skip(state, topic), fields(topic_len = topic.len()))]
pub async fn generate_cards(
  state: &AppState,
  topic: &str,
) -> Result<(Vec<Flashcard>, &'static str), ApiError> {
  let topic = topic.trim();
  if topic.is_empty() {
    return Err(ApiError::ValidationFailed(
      "Please enter a topic or some terms and definitions.".into(),
    ));
  }

  let (text, origin) = if let Some(oa) = &state.openai {
    match oa.generate_flashcards_text(&state.prompts, topic).await {
      Ok(text) => (text, "generated"),
      Err(e) => {
        error!(target: "memodeck_backend", error = %e, "Flashcard generation failed");
        return Err(ApiError::GenerationFailed(format!(
          "Failed to generate flashcards: {e}"
        )));
      }
    }
  } else {
    let cards = match pick_deck(&state.seed_decks, topic) {
      Some(deck) => {
        warn!(target: "memodeck_backend", deck = %deck.name, "OpenAI disabled; serving matching seed deck");
        deck.cards.clone()
      }
      None => {
        let deck = fallback_deck();
        warn!(target: "memodeck_backend", deck = %deck.name, "OpenAI disabled and no topic match; serving fallback deck");
        deck.cards
      }
    };
    (cards, "seed_deck")
  };

  let cards = parse_flashcards(&text);
  if cards.is_empty() {
    return Err(ApiError::ValidationFailed(
      "No valid flashcards could be generated. Please check the format or try a different topic."
        .into(),
    ));
  }

  *state.working_set.write().await = cards.clone();
  info!(target: "memodeck_backend", count = cards.len(), %origin, "Working set replaced");
  Ok((cards, origin))
}

/// Suggest a lesson name from the first few cards of the working set.
#[instrument(level = "info", skip(state))]
pub async fn suggest_name(state: &AppState) -> Result<String, ApiError> {
  let cards = state.working_set.read().await.clone();
  if cards.is_empty() {
    return Err(ApiError::ValidationFailed(
      "No flashcards to name. Please generate some first.".into(),
    ));
  }

  if let Some(oa) = &state.openai {
    let sample = render_flashcards(&cards[..cards.len().min(NAME_SAMPLE_CARDS)]);
    match oa.suggest_lesson_name(&state.prompts, &sample).await {
      Ok(name) if !name.trim().is_empty() => return Ok(name.trim().to_string()),
      Ok(_) => warn!(target: "memodeck_backend", "Empty name suggestion; using fallback"),
      Err(e) => {
        return Err(ApiError::GenerationFailed(format!("Error suggesting name: {e}")))
      }
    }
  }
  Ok(FALLBACK_LESSON_NAME.into())
}

/// Save the working set as a new lesson.
#[instrument(level = "info", skip(state), fields(name = %name))]
pub async fn save_lesson(state: &AppState, name: &str) -> Result<Lesson, ApiError> {
  let name = name.trim();
  if name.is_empty() {
    return Err(ApiError::ValidationFailed(
      "Lesson name cannot be empty. Please enter a name.".into(),
    ));
  }
  let cards = state.working_set.read().await.clone();
  if cards.is_empty() {
    return Err(ApiError::ValidationFailed(
      "No flashcards to save. Please generate some first.".into(),
    ));
  }

  let lesson = Lesson::new(name.to_string(), cards);
  state.sync.write().await.save(lesson.clone()).await?;
  Ok(lesson)
}

/// Current lesson collection, refreshed from the store (with the
/// snapshot fallback built into the synchronizer).
#[instrument(level = "info", skip(state))]
pub async fn list_lessons(state: &AppState) -> Vec<Lesson> {
  state.sync.write().await.load_all().await
}

/// Load a lesson into the working set.
#[instrument(level = "info", skip(state), fields(%lesson_id))]
pub async fn load_lesson(state: &AppState, lesson_id: &str) -> Result<Lesson, ApiError> {
  let sync = state.sync.read().await;
  let lesson = sync
    .get(lesson_id)
    .cloned()
    .ok_or_else(|| ApiError::NotFound("Lesson not found.".into()))?;
  drop(sync);
  *state.working_set.write().await = lesson.flashcards.clone();
  Ok(lesson)
}

#[instrument(level = "info", skip(state), fields(%lesson_id))]
pub async fn delete_lesson(state: &AppState, lesson_id: &str) -> Result<(), ApiError> {
  state.sync.write().await.delete(lesson_id).await?;
  Ok(())
}

#[instrument(level = "info", skip(state, shared_by), fields(%lesson_id))]
pub async fn share_lesson(
  state: &AppState,
  lesson_id: &str,
  shared_by: Option<String>,
) -> Result<CommunityLesson, ApiError> {
  let community = state
    .sync
    .write()
    .await
    .share(lesson_id, shared_by.as_deref().unwrap_or(""))
    .await?;
  Ok(community)
}

#[instrument(level = "info", skip(state), fields(%lesson_id))]
pub async fn unshare_lesson(state: &AppState, lesson_id: &str) -> Result<(), ApiError> {
  state.sync.write().await.unshare(lesson_id).await?;
  Ok(())
}

/// Community pool, most recently shared first (the order the list
/// renders in).
#[instrument(level = "info", skip(state))]
pub async fn list_community(state: &AppState) -> Result<Vec<CommunityLesson>, ApiError> {
  let mut pool = state.sync.write().await.refresh_community().await?;
  pool.sort_by(|a, b| b.shared_timestamp.cmp(&a.shared_timestamp));
  Ok(pool)
}

/// Copy a community lesson into the collection. A duplicate name needs
/// the caller's confirmation first; the copy itself is unconditional.
#[instrument(level = "info", skip(state), fields(%community_id, confirm))]
pub async fn copy_lesson(
  state: &AppState,
  community_id: &str,
  confirm: bool,
) -> Result<CopyOut, ApiError> {
  let mut sync = state.sync.write().await;

  if !confirm {
    let name = sync
      .community()
      .iter()
      .find(|c| c.community_id == community_id)
      .map(|c| c.name.clone())
      .ok_or_else(|| ApiError::NotFound("Community lesson not found.".into()))?;
    if sync.name_exists(&name) {
      info!(target: "lesson", %community_id, "Copy needs duplicate-name confirmation");
      return Ok(CopyOut {
        requires_confirmation: true,
        lesson: None,
        message: Some(format!(
          "A lesson named \"{name}\" already exists in your lessons. Confirm to copy it anyway."
        )),
      });
    }
  }

  let lesson = sync.copy_to_mine(community_id).await?;
  Ok(CopyOut { requires_confirmation: false, lesson: Some(lesson), message: None })
}

// -------- Quiz intents --------

#[instrument(level = "info", skip(state))]
pub async fn quiz_start(state: &AppState) -> Result<QuizStateOut, ApiError> {
  let cards = state.working_set.read().await.clone();
  let mut quiz = state.quiz.write().await;
  quiz.start(&cards)?;
  info!(target: "quiz", total = quiz.len(), "Quiz started");
  Ok(quiz_to_out(&quiz))
}

#[instrument(level = "info", skip(state, answer), fields(answer_len = answer.len()))]
pub async fn quiz_answer(state: &AppState, answer: &str) -> Result<AnswerOut, ApiError> {
  let mut quiz = state.quiz.write().await;
  let outcome = quiz.submit_answer(answer)?;
  info!(target: "quiz", correct = outcome.correct, score = outcome.score, "Answer evaluated");
  Ok(outcome.into())
}

#[instrument(level = "info", skip(state))]
pub async fn quiz_next(state: &AppState) -> Result<QuizStateOut, ApiError> {
  let mut quiz = state.quiz.write().await;
  let phase = quiz.advance()?;
  info!(target: "quiz", ?phase, index = quiz.index(), "Quiz advanced");
  Ok(quiz_to_out(&quiz))
}

#[instrument(level = "info", skip(state))]
pub async fn quiz_restart(state: &AppState) -> Result<QuizStateOut, ApiError> {
  let mut quiz = state.quiz.write().await;
  quiz.restart()?;
  info!(target: "quiz", total = quiz.len(), "Quiz restarted");
  Ok(quiz_to_out(&quiz))
}

#[instrument(level = "info", skip(state))]
pub async fn quiz_exit(state: &AppState) -> QuizStateOut {
  let mut quiz = state.quiz.write().await;
  quiz.exit();
  info!(target: "quiz", "Quiz exited");
  quiz_to_out(&quiz)
}

/// Read-only quiz snapshot for the renderer.
pub async fn quiz_state(state: &AppState) -> QuizStateOut {
  quiz_to_out(&*state.quiz.read().await)
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use super::*;
  use crate::config::Prompts;
  use crate::domain::CommunityLesson;
  use crate::seeds::seed_decks;
  use crate::store::testing::{MemLessonStore, MemPoolStore};
  use crate::store::SnapshotCache;

  fn make_state(dir: &std::path::Path) -> (AppState, Arc<MemLessonStore>, Arc<MemPoolStore>) {
    let lesson_store = Arc::new(MemLessonStore::default());
    let pool_store = Arc::new(MemPoolStore::default());
    let state = AppState::from_parts(
      lesson_store.clone(),
      pool_store.clone(),
      SnapshotCache::new(dir.join(".snapshot.json")),
      None,
      Prompts::default(),
      seed_decks(),
    );
    (state, lesson_store, pool_store)
  }

  #[tokio::test]
  async fn generation_without_openai_serves_seed_decks() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (state, _, _) = make_state(dir.path());

    let (cards, origin) = generate_cards(&state, "world capitals").await.expect("generate");
    assert_eq!(origin, "seed_deck");
    assert!(cards.len() >= 4);
    assert_eq!(*state.working_set.read().await, cards);

    // Unknown topics still produce a usable deck.
    let (fallback, origin) = generate_cards(&state, "category theory").await.expect("generate");
    assert_eq!(origin, "seed_deck");
    assert!(fallback.len() >= 4);
  }

  #[tokio::test]
  async fn empty_topic_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (state, _, _) = make_state(dir.path());
    assert!(matches!(
      generate_cards(&state, "   ").await,
      Err(ApiError::ValidationFailed(_))
    ));
  }

  #[tokio::test]
  async fn save_requires_a_name_and_a_working_set() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (state, lesson_store, _) = make_state(dir.path());

    assert!(matches!(
      save_lesson(&state, "Capitals").await,
      Err(ApiError::ValidationFailed(_))
    ));

    generate_cards(&state, "capitals").await.expect("generate");
    assert!(matches!(save_lesson(&state, "  ").await, Err(ApiError::ValidationFailed(_))));

    let lesson = save_lesson(&state, "Capitals").await.expect("save");
    assert_eq!(lesson.name, "Capitals");
    assert_eq!(lesson_store.docs.lock().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn name_suggestion_falls_back_without_openai() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (state, _, _) = make_state(dir.path());
    assert!(matches!(suggest_name(&state).await, Err(ApiError::ValidationFailed(_))));

    generate_cards(&state, "biology").await.expect("generate");
    assert_eq!(suggest_name(&state).await.expect("name"), FALLBACK_LESSON_NAME);
  }

  #[tokio::test]
  async fn load_lesson_replaces_the_working_set() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (state, _, _) = make_state(dir.path());
    generate_cards(&state, "capitals").await.expect("generate");
    let saved = save_lesson(&state, "Capitals").await.expect("save");

    *state.working_set.write().await = Vec::new();
    let loaded = load_lesson(&state, &saved.id).await.expect("load");
    assert_eq!(loaded.id, saved.id);
    assert_eq!(*state.working_set.read().await, saved.flashcards);

    assert!(matches!(
      load_lesson(&state, "missing").await,
      Err(ApiError::NotFound(_))
    ));
  }

  #[tokio::test]
  async fn copying_a_duplicate_name_asks_for_confirmation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (state, _, pool_store) = make_state(dir.path());

    generate_cards(&state, "capitals").await.expect("generate");
    save_lesson(&state, "World Capitals").await.expect("save");

    pool_store.pool.lock().unwrap().push(CommunityLesson {
      community_id: "c-1".into(),
      name: "world capitals".into(),
      flashcards: state.working_set.read().await.clone(),
      shared_by: "Gil".into(),
      shared_timestamp: 1,
    });
    state.sync.write().await.refresh_community().await.expect("refresh");

    let first = copy_lesson(&state, "c-1", false).await.expect("copy attempt");
    assert!(first.requires_confirmation);
    assert!(first.lesson.is_none());

    let second = copy_lesson(&state, "c-1", true).await.expect("confirmed copy");
    assert!(!second.requires_confirmation);
    let copied = second.lesson.expect("lesson");
    assert_eq!(copied.copied_from_community_id.as_deref(), Some("c-1"));
  }

  #[tokio::test]
  async fn quiz_flow_over_the_working_set() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (state, _, _) = make_state(dir.path());

    assert!(matches!(quiz_start(&state).await, Err(ApiError::InsufficientCards(_))));

    generate_cards(&state, "capitals").await.expect("generate");
    let started = quiz_start(&state).await.expect("start");
    assert_eq!(started.index, 0);
    let question = started.question.expect("question");
    assert_eq!(question.options.len(), 4);

    let outcome = quiz_answer(&state, &question.options[0]).await.expect("answer");
    assert_eq!(outcome.score as usize, usize::from(outcome.correct));

    let after_exit = quiz_exit(&state).await;
    assert!(after_exit.question.is_none());
    assert_eq!(after_exit.total, 0);
  }
}
