//! Application state: one session's synchronizer, quiz engine, working
//! card set, prompts, seed decks, and optional OpenAI client.
//!
//! This module owns:
//!   - the lesson synchronizer (lesson collection + community mirror)
//!   - the quiz engine
//!   - the "working set": the cards currently on the generator screen,
//!     which is what save persists and quiz start quizzes over
//!
//! One AppState is one session. There is exactly one user actor; the
//! RwLocks serialize that actor's intents, they are not a concurrency
//! control story for multiple writers.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::config::{load_agent_config_from_env, Prompts};
use crate::domain::Flashcard;
use crate::openai::OpenAI;
use crate::quiz::QuizEngine;
use crate::seeds::{seed_decks, SeedDeck};
use crate::store::{
  CommunityPoolStore, FileCommunityStore, FileLessonStore, LessonStore, SnapshotCache,
};
use crate::sync::LessonSync;

pub struct AppState {
  pub sync: RwLock<LessonSync>,
  pub quiz: RwLock<QuizEngine>,
  pub working_set: RwLock<Vec<Flashcard>>,
  pub openai: Option<OpenAI>,
  pub prompts: Prompts,
  pub seed_decks: Vec<SeedDeck>,
}

impl AppState {
  /// Build state from env: load config, wire the file stores, collect
  /// seed decks, init OpenAI.
  #[instrument(level = "info", skip_all)]
  pub fn new() -> Self {
    let cfg_opt = load_agent_config_from_env();
    let prompts = cfg_opt
      .as_ref()
      .map(|c| c.prompts.clone())
      .unwrap_or_default();

    // Config decks first so they win keyword selection over built-ins.
    let mut decks: Vec<SeedDeck> = cfg_opt
      .map(|c| c.seed_lessons.into_iter().map(Into::into).collect())
      .unwrap_or_default();
    let config_decks = decks.len();
    decks.extend(seed_decks());
    info!(
      target: "memodeck_backend",
      config_decks,
      builtin_decks = decks.len() - config_decks,
      "Seed deck inventory"
    );

    let lessons_dir = std::env::var("LESSONS_DIR")
      .map(PathBuf::from)
      .unwrap_or_else(|_| PathBuf::from("./lessons"));
    let snapshot_path = std::env::var("SNAPSHOT_PATH")
      .map(PathBuf::from)
      .unwrap_or_else(|_| lessons_dir.join(".snapshot.json"));
    info!(target: "lesson", dir = %lessons_dir.display(), "Lesson storage directory");

    let lesson_store = Arc::new(FileLessonStore::new(&lessons_dir));
    let pool_store = Arc::new(FileCommunityStore::new(&lessons_dir));

    let openai = OpenAI::from_env();
    if let Some(oa) = &openai {
      info!(target: "memodeck_backend", base_url = %oa.base_url, fast_model = %oa.fast_model, strong_model = %oa.strong_model, "OpenAI enabled.");
    } else {
      info!(target: "memodeck_backend", "OpenAI disabled (no OPENAI_API_KEY). Generation serves seed decks.");
    }

    Self::from_parts(
      lesson_store,
      pool_store,
      SnapshotCache::new(snapshot_path),
      openai,
      prompts,
      decks,
    )
  }

  /// Assemble state from explicit collaborators. `new` funnels through
  /// here; tests inject in-memory stores the same way.
  pub fn from_parts(
    lesson_store: Arc<dyn LessonStore>,
    pool_store: Arc<dyn CommunityPoolStore>,
    snapshot: SnapshotCache,
    openai: Option<OpenAI>,
    prompts: Prompts,
    seed_decks: Vec<SeedDeck>,
  ) -> Self {
    Self {
      sync: RwLock::new(LessonSync::new(lesson_store, pool_store, snapshot)),
      quiz: RwLock::new(QuizEngine::new()),
      working_set: RwLock::new(Vec::new()),
      openai,
      prompts,
      seed_decks,
    }
  }

  /// Populate the lesson collection and community mirror at startup.
  /// Neither failure is fatal: lessons degrade through the snapshot and
  /// the pool simply starts empty.
  #[instrument(level = "info", skip(self))]
  pub async fn bootstrap(&self) {
    let mut sync = self.sync.write().await;
    let lessons = sync.load_all().await;
    info!(target: "lesson", count = lessons.len(), "Startup lesson inventory");
    if let Err(e) = sync.refresh_community().await {
      warn!(target: "lesson", error = %e, "Community pool unavailable at startup");
    }
  }
}
