//! Durable storage: the lesson store, the community pool store, and the
//! local snapshot cache.
//!
//! Layout on disk:
//!   - one `<lesson-id>.json` document per user lesson under the lessons
//!     directory
//!   - a single `community_lessons.json` array document for the pool
//!   - a hidden `.snapshot.json` mirror of the lesson collection, written
//!     after every mutating synchronizer operation and read only as the
//!     `load_all` fallback
//!
//! The traits are the seam the synchronizer is tested through; the file
//! implementations are what production uses.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, error, instrument, warn};

use crate::domain::{CommunityLesson, Lesson};
use crate::error::StoreError;

const COMMUNITY_FILE: &str = "community_lessons.json";

#[async_trait]
pub trait LessonStore: Send + Sync {
  async fn create_or_replace(&self, lesson: &Lesson) -> Result<(), StoreError>;
  async fn list_all(&self) -> Result<Vec<Lesson>, StoreError>;
  async fn delete_by_id(&self, id: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait CommunityPoolStore: Send + Sync {
  async fn list_all(&self) -> Result<Vec<CommunityLesson>, StoreError>;
  async fn append(&self, lesson: &CommunityLesson) -> Result<(), StoreError>;
  async fn remove_by_id(&self, community_id: &str) -> Result<(), StoreError>;
}

fn io_err(e: std::io::Error) -> StoreError {
  StoreError::Unavailable(e.to_string())
}

async fn ensure_dir(dir: &Path) -> Result<(), StoreError> {
  tokio::fs::create_dir_all(dir).await.map_err(io_err)
}

/// One JSON document per lesson under `dir`.
pub struct FileLessonStore {
  dir: PathBuf,
}

impl FileLessonStore {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  fn path_for(&self, id: &str) -> PathBuf {
    self.dir.join(format!("{id}.json"))
  }
}

#[async_trait]
impl LessonStore for FileLessonStore {
  #[instrument(level = "debug", skip(self, lesson), fields(id = %lesson.id))]
  async fn create_or_replace(&self, lesson: &Lesson) -> Result<(), StoreError> {
    ensure_dir(&self.dir).await?;
    let body = serde_json::to_vec_pretty(lesson)
      .map_err(|e| StoreError::Unavailable(e.to_string()))?;
    tokio::fs::write(self.path_for(&lesson.id), body).await.map_err(io_err)
  }

  #[instrument(level = "debug", skip(self))]
  async fn list_all(&self) -> Result<Vec<Lesson>, StoreError> {
    ensure_dir(&self.dir).await?;
    let mut lessons = Vec::new();
    let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(io_err)?;
    while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
      let name = entry.file_name().to_string_lossy().into_owned();
      if !name.ends_with(".json") || name == COMMUNITY_FILE || name.starts_with('.') {
        continue;
      }
      let raw = tokio::fs::read_to_string(entry.path()).await.map_err(io_err)?;
      match serde_json::from_str::<Lesson>(&raw) {
        Ok(lesson) => lessons.push(lesson),
        // A corrupt document should not take the whole listing down.
        Err(e) => warn!(target: "lesson", file = %name, error = %e, "Skipping unparseable lesson file"),
      }
    }
    debug!(target: "lesson", count = lessons.len(), "Listed lesson documents");
    Ok(lessons)
  }

  #[instrument(level = "debug", skip(self), fields(%id))]
  async fn delete_by_id(&self, id: &str) -> Result<(), StoreError> {
    let path = self.path_for(id);
    if tokio::fs::metadata(&path).await.is_err() {
      return Err(StoreError::NotFound);
    }
    tokio::fs::remove_file(&path).await.map_err(io_err)
  }
}

/// A single JSON array document holding every shared lesson.
pub struct FileCommunityStore {
  path: PathBuf,
}

impl FileCommunityStore {
  /// `dir` is the lessons directory; the pool document lives next to the
  /// per-lesson files.
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { path: dir.into().join(COMMUNITY_FILE) }
  }

  async fn load(&self) -> Result<Vec<CommunityLesson>, StoreError> {
    match tokio::fs::read_to_string(&self.path).await {
      Ok(raw) => match serde_json::from_str(&raw) {
        Ok(pool) => Ok(pool),
        Err(e) => {
          // A broken pool document reads as an empty pool.
          error!(target: "lesson", error = %e, "Community pool file unparseable; treating as empty");
          Ok(Vec::new())
        }
      },
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
      Err(e) => Err(io_err(e)),
    }
  }

  async fn save(&self, pool: &[CommunityLesson]) -> Result<(), StoreError> {
    if let Some(parent) = self.path.parent() {
      ensure_dir(parent).await?;
    }
    let body = serde_json::to_vec_pretty(pool)
      .map_err(|e| StoreError::Unavailable(e.to_string()))?;
    tokio::fs::write(&self.path, body).await.map_err(io_err)
  }
}

#[async_trait]
impl CommunityPoolStore for FileCommunityStore {
  #[instrument(level = "debug", skip(self))]
  async fn list_all(&self) -> Result<Vec<CommunityLesson>, StoreError> {
    self.load().await
  }

  #[instrument(level = "debug", skip(self, lesson), fields(community_id = %lesson.community_id))]
  async fn append(&self, lesson: &CommunityLesson) -> Result<(), StoreError> {
    let mut pool = self.load().await?;
    pool.push(lesson.clone());
    self.save(&pool).await
  }

  #[instrument(level = "debug", skip(self), fields(%community_id))]
  async fn remove_by_id(&self, community_id: &str) -> Result<(), StoreError> {
    let mut pool = self.load().await?;
    let before = pool.len();
    pool.retain(|l| l.community_id != community_id);
    if pool.len() == before {
      return Err(StoreError::NotFound);
    }
    self.save(&pool).await
  }
}

/// Whole-collection mirror of the user's lessons, refreshed on every
/// mutating synchronizer operation and consulted only when the lesson
/// store itself is unreachable.
pub struct SnapshotCache {
  path: PathBuf,
}

impl SnapshotCache {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  /// Best-effort write: a failed snapshot refresh is logged, never
  /// propagated, so it cannot fail the operation that triggered it.
  #[instrument(level = "debug", skip(self, lessons), fields(count = lessons.len()))]
  pub async fn write(&self, lessons: &[Lesson]) {
    let body = match serde_json::to_vec_pretty(lessons) {
      Ok(b) => b,
      Err(e) => {
        error!(target: "lesson", error = %e, "Snapshot serialization failed");
        return;
      }
    };
    if let Some(parent) = self.path.parent() {
      if let Err(e) = tokio::fs::create_dir_all(parent).await {
        warn!(target: "lesson", error = %e, "Snapshot directory unavailable");
        return;
      }
    }
    if let Err(e) = tokio::fs::write(&self.path, body).await {
      warn!(target: "lesson", error = %e, "Snapshot write failed");
    }
  }

  /// Returns the cached collection, or None when absent or unreadable.
  #[instrument(level = "debug", skip(self))]
  pub async fn read(&self) -> Option<Vec<Lesson>> {
    let raw = tokio::fs::read_to_string(&self.path).await.ok()?;
    match serde_json::from_str(&raw) {
      Ok(lessons) => Some(lessons),
      Err(e) => {
        warn!(target: "lesson", error = %e, "Snapshot unparseable; ignoring");
        None
      }
    }
  }
}
