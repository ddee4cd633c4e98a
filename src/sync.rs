//! Lesson synchronization: the in-memory lesson collection reconciled
//! against the lesson store and the community pool.
//!
//! This module owns:
//!   - the session's lesson collection (source of truth for the view)
//!   - the community pool mirror
//!   - the share invariant: a lesson carries `sharedCommunityId` iff the
//!     pool currently holds that community lesson
//!
//! The snapshot cache is refreshed after every mutating operation,
//! whether or not the store write succeeded, and is read only when the
//! lesson store itself is unreachable at load time.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::domain::{CommunityLesson, Lesson};
use crate::error::{StoreError, SyncError};
use crate::store::{CommunityPoolStore, LessonStore, SnapshotCache};
use crate::util::epoch_millis;

pub struct LessonSync {
  lessons: Vec<Lesson>,
  community: Vec<CommunityLesson>,
  lesson_store: Arc<dyn LessonStore>,
  pool_store: Arc<dyn CommunityPoolStore>,
  snapshot: SnapshotCache,
}

impl LessonSync {
  pub fn new(
    lesson_store: Arc<dyn LessonStore>,
    pool_store: Arc<dyn CommunityPoolStore>,
    snapshot: SnapshotCache,
  ) -> Self {
    Self {
      lessons: Vec::new(),
      community: Vec::new(),
      lesson_store,
      pool_store,
      snapshot,
    }
  }

  /// Replace the collection from the lesson store. Never fails: a store
  /// outage degrades to the snapshot cache, and an unreadable snapshot
  /// degrades to an empty collection.
  #[instrument(level = "info", skip(self))]
  pub async fn load_all(&mut self) -> Vec<Lesson> {
    match self.lesson_store.list_all().await {
      Ok(lessons) => {
        info!(target: "lesson", count = lessons.len(), "Loaded lessons from store");
        self.lessons = lessons;
      }
      Err(e) => {
        warn!(target: "lesson", error = %e, "Lesson store unavailable; falling back to snapshot");
        self.lessons = self.snapshot.read().await.unwrap_or_default();
      }
    }
    self.lessons.clone()
  }

  /// Replace the community mirror from the pool store.
  #[instrument(level = "info", skip(self))]
  pub async fn refresh_community(&mut self) -> Result<Vec<CommunityLesson>, SyncError> {
    self.community = self.pool_store.list_all().await?;
    Ok(self.community.clone())
  }

  /// Append a lesson and persist it. The lesson stays in the collection
  /// even when the persist fails; the error is reported so the user can
  /// retry.
  #[instrument(level = "info", skip(self, lesson), fields(id = %lesson.id, name = %lesson.name))]
  pub async fn save(&mut self, lesson: Lesson) -> Result<(), SyncError> {
    self.lessons.push(lesson.clone());
    self.snapshot.write(&self.lessons).await;
    self.lesson_store.create_or_replace(&lesson).await?;
    info!(target: "lesson", id = %lesson.id, "Lesson saved");
    Ok(())
  }

  /// Delete a lesson. A shared lesson is unshared first, and the delete
  /// aborts if that fails, so the share invariant survives the failure.
  #[instrument(level = "info", skip(self), fields(%lesson_id))]
  pub async fn delete(&mut self, lesson_id: &str) -> Result<(), SyncError> {
    let idx = self
      .lessons
      .iter()
      .position(|l| l.id == lesson_id)
      .ok_or(SyncError::NotFound)?;

    if self.lessons[idx].shared_community_id.is_some() {
      // Unshare must land before any store delete is attempted.
      self.unshare(lesson_id).await?;
    }

    match self.lesson_store.delete_by_id(lesson_id).await {
      Ok(()) => {}
      Err(StoreError::NotFound) => {
        warn!(target: "lesson", %lesson_id, "Lesson document already absent; removing locally")
      }
      Err(e) => return Err(e.into()),
    }

    self.lessons.remove(idx);
    self.snapshot.write(&self.lessons).await;
    info!(target: "lesson", %lesson_id, "Lesson deleted");
    Ok(())
  }

  /// Share a lesson: value-copy its cards into a fresh community lesson,
  /// append that to the pool, then mark and persist the lesson.
  ///
  /// The pool write goes first; if it fails nothing is mutated. If the
  /// follow-up lesson persist fails, the pool copy exists and the
  /// in-memory marker is set (consistent with the pool); only the durable
  /// lesson document is stale. That window is reported, not rolled back.
  #[instrument(level = "info", skip(self, display_name), fields(%lesson_id))]
  pub async fn share(
    &mut self,
    lesson_id: &str,
    display_name: &str,
  ) -> Result<CommunityLesson, SyncError> {
    let idx = self
      .lessons
      .iter()
      .position(|l| l.id == lesson_id)
      .ok_or(SyncError::NotFound)?;
    if self.lessons[idx].shared_community_id.is_some() {
      return Err(SyncError::AlreadyShared);
    }

    let shared_by = match display_name.trim() {
      "" => "Anonymous".to_string(),
      name => name.to_string(),
    };
    let community = CommunityLesson {
      community_id: uuid::Uuid::new_v4().to_string(),
      name: self.lessons[idx].name.clone(),
      flashcards: self.lessons[idx].flashcards.clone(),
      shared_by,
      shared_timestamp: epoch_millis(),
    };

    self.pool_store.append(&community).await?;
    self.community.push(community.clone());
    self.lessons[idx].shared_community_id = Some(community.community_id.clone());
    self.snapshot.write(&self.lessons).await;
    self.lesson_store.create_or_replace(&self.lessons[idx]).await?;
    info!(target: "lesson", %lesson_id, community_id = %community.community_id, "Lesson shared");
    Ok(community)
  }

  /// Remove a lesson's community copy and clear its share marker.
  #[instrument(level = "info", skip(self), fields(%lesson_id))]
  pub async fn unshare(&mut self, lesson_id: &str) -> Result<(), SyncError> {
    let idx = self
      .lessons
      .iter()
      .position(|l| l.id == lesson_id)
      .ok_or(SyncError::NotFound)?;
    let community_id = self.lessons[idx]
      .shared_community_id
      .clone()
      .ok_or(SyncError::NotFound)?;

    match self.pool_store.remove_by_id(&community_id).await {
      Ok(()) => {}
      Err(StoreError::NotFound) => {
        warn!(target: "lesson", %lesson_id, %community_id, "Community copy already absent; clearing the share marker")
      }
      Err(e) => return Err(e.into()),
    }

    self.community.retain(|c| c.community_id != community_id);
    self.lessons[idx].shared_community_id = None;
    self.snapshot.write(&self.lessons).await;
    self.lesson_store.create_or_replace(&self.lessons[idx]).await?;
    info!(target: "lesson", %lesson_id, %community_id, "Lesson unshared");
    Ok(())
  }

  /// Copy a community lesson into the collection as a fresh, unshared
  /// lesson. Duplicate-name confirmation is the caller's pre-condition;
  /// this operation itself is unconditional.
  #[instrument(level = "info", skip(self), fields(%community_id))]
  pub async fn copy_to_mine(&mut self, community_id: &str) -> Result<Lesson, SyncError> {
    let source = self
      .community
      .iter()
      .find(|c| c.community_id == community_id)
      .ok_or(SyncError::NotFound)?;

    let mut lesson = Lesson::new(source.name.clone(), source.flashcards.clone());
    lesson.copied_from_community_id = Some(source.community_id.clone());

    self.lessons.push(lesson.clone());
    self.snapshot.write(&self.lessons).await;
    self.lesson_store.create_or_replace(&lesson).await?;
    info!(target: "lesson", %community_id, lesson_id = %lesson.id, "Community lesson copied");
    Ok(lesson)
  }

  pub fn lessons(&self) -> &[Lesson] {
    &self.lessons
  }

  pub fn community(&self) -> &[CommunityLesson] {
    &self.community
  }

  pub fn get(&self, lesson_id: &str) -> Option<&Lesson> {
    self.lessons.iter().find(|l| l.id == lesson_id)
  }

  /// Case-insensitive name collision check, used by callers to decide
  /// whether copy-to-mine needs a confirmation round trip.
  pub fn name_exists(&self, name: &str) -> bool {
    self
      .lessons
      .iter()
      .any(|l| crate::util::eq_ignore_case(&l.name, name))
  }
}

#[cfg(test)]
mod tests {
  use std::path::Path;

  use super::*;
  use crate::domain::Flashcard;
  use crate::store::testing::{MemLessonStore, MemPoolStore};

  fn cards() -> Vec<Flashcard> {
    vec![
      Flashcard { term: "a".into(), definition: "1".into() },
      Flashcard { term: "b".into(), definition: "2".into() },
    ]
  }

  fn make_sync(dir: &Path) -> (LessonSync, Arc<MemLessonStore>, Arc<MemPoolStore>) {
    let lesson_store = Arc::new(MemLessonStore::default());
    let pool_store = Arc::new(MemPoolStore::default());
    let sync = LessonSync::new(
      lesson_store.clone(),
      pool_store.clone(),
      SnapshotCache::new(dir.join(".snapshot.json")),
    );
    (sync, lesson_store, pool_store)
  }

  /// Every lesson claiming a community id must find it in the mirror.
  fn assert_share_invariant(sync: &LessonSync) {
    for l in sync.lessons() {
      if let Some(cid) = &l.shared_community_id {
        assert!(
          sync.community().iter().any(|c| &c.community_id == cid),
          "lesson {} points at missing community copy {}",
          l.id,
          cid
        );
      }
    }
  }

  #[tokio::test]
  async fn share_then_unshare_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut sync, _, pool_store) = make_sync(dir.path());

    let lesson = Lesson::new("Rivers".into(), cards());
    let id = lesson.id.clone();
    sync.save(lesson).await.expect("save");

    let shared = sync.share(&id, "Alice").await.expect("share");
    assert_eq!(shared.shared_by, "Alice");
    assert_eq!(shared.name, "Rivers");
    assert_eq!(pool_store.pool.lock().unwrap().len(), 1);
    assert_eq!(
      sync.get(&id).unwrap().shared_community_id.as_deref(),
      Some(shared.community_id.as_str())
    );
    assert_share_invariant(&sync);

    sync.unshare(&id).await.expect("unshare");
    assert!(pool_store.pool.lock().unwrap().is_empty());
    assert!(sync.get(&id).unwrap().shared_community_id.is_none());
    assert_share_invariant(&sync);
  }

  #[tokio::test]
  async fn sharing_twice_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut sync, _, _) = make_sync(dir.path());
    let lesson = Lesson::new("Once".into(), cards());
    let id = lesson.id.clone();
    sync.save(lesson).await.expect("save");
    sync.share(&id, "").await.expect("first share");
    assert!(matches!(sync.share(&id, "").await, Err(SyncError::AlreadyShared)));
  }

  #[tokio::test]
  async fn blank_display_name_becomes_anonymous() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut sync, _, _) = make_sync(dir.path());
    let lesson = Lesson::new("Anon".into(), cards());
    let id = lesson.id.clone();
    sync.save(lesson).await.expect("save");
    let shared = sync.share(&id, "   ").await.expect("share");
    assert_eq!(shared.shared_by, "Anonymous");
  }

  #[tokio::test]
  async fn deleting_a_shared_lesson_unshares_first() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut sync, lesson_store, pool_store) = make_sync(dir.path());
    let lesson = Lesson::new("Shared then gone".into(), cards());
    let id = lesson.id.clone();
    sync.save(lesson).await.expect("save");
    sync.share(&id, "Bob").await.expect("share");

    sync.delete(&id).await.expect("delete");
    assert!(pool_store.pool.lock().unwrap().is_empty());
    assert!(lesson_store.docs.lock().unwrap().is_empty());
    assert!(sync.lessons().is_empty());
    assert_share_invariant(&sync);
  }

  #[tokio::test]
  async fn deleting_an_unshared_lesson_leaves_the_pool_alone() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut sync, lesson_store, pool_store) = make_sync(dir.path());
    let keep = Lesson::new("Keep".into(), cards());
    let keep_id = keep.id.clone();
    sync.save(keep).await.expect("save");
    sync.share(&keep_id, "Cara").await.expect("share");

    let gone = Lesson::new("Gone".into(), cards());
    let gone_id = gone.id.clone();
    sync.save(gone).await.expect("save");
    sync.delete(&gone_id).await.expect("delete");

    assert_eq!(pool_store.pool.lock().unwrap().len(), 1);
    assert_eq!(lesson_store.docs.lock().unwrap().len(), 1);
    assert_share_invariant(&sync);
  }

  #[tokio::test]
  async fn delete_aborts_when_unshare_cannot_reach_the_pool() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut sync, lesson_store, pool_store) = make_sync(dir.path());
    let lesson = Lesson::new("Stuck".into(), cards());
    let id = lesson.id.clone();
    sync.save(lesson).await.expect("save");
    sync.share(&id, "Dee").await.expect("share");

    pool_store.set_failing(true);
    assert!(matches!(sync.delete(&id).await, Err(SyncError::Store(_))));

    // Nothing moved: the lesson is still present, still shared, and the
    // store still holds its document.
    assert!(sync.get(&id).unwrap().shared_community_id.is_some());
    assert_eq!(lesson_store.docs.lock().unwrap().len(), 1);
    assert_share_invariant(&sync);
  }

  #[tokio::test]
  async fn share_failure_leaves_state_untouched() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut sync, _, pool_store) = make_sync(dir.path());
    let lesson = Lesson::new("No pool".into(), cards());
    let id = lesson.id.clone();
    sync.save(lesson).await.expect("save");

    pool_store.set_failing(true);
    assert!(matches!(sync.share(&id, "Eve").await, Err(SyncError::Store(_))));
    assert!(sync.get(&id).unwrap().shared_community_id.is_none());
    assert!(sync.community().is_empty());
    assert_share_invariant(&sync);
  }

  #[tokio::test]
  async fn unsharing_an_unshared_lesson_is_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut sync, _, _) = make_sync(dir.path());
    let lesson = Lesson::new("Plain".into(), cards());
    let id = lesson.id.clone();
    sync.save(lesson).await.expect("save");
    assert!(matches!(sync.unshare(&id).await, Err(SyncError::NotFound)));
    assert!(matches!(sync.unshare("missing").await, Err(SyncError::NotFound)));
  }

  #[tokio::test]
  async fn copy_to_mine_is_a_value_copy_with_fresh_identity() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut sync, _, pool_store) = make_sync(dir.path());
    pool_store.pool.lock().unwrap().push(CommunityLesson {
      community_id: "c-7".into(),
      name: "From the pool".into(),
      flashcards: cards(),
      shared_by: "Finn".into(),
      shared_timestamp: 7,
    });
    sync.refresh_community().await.expect("refresh");

    let copied = sync.copy_to_mine("c-7").await.expect("copy");
    assert_eq!(copied.flashcards, cards());
    assert_ne!(copied.id, "c-7");
    assert_eq!(copied.copied_from_community_id.as_deref(), Some("c-7"));
    assert!(copied.shared_community_id.is_none());

    // The pool copy is untouched by the new lesson's existence.
    assert_eq!(pool_store.pool.lock().unwrap().len(), 1);
    assert!(matches!(sync.copy_to_mine("c-8").await, Err(SyncError::NotFound)));
  }

  #[tokio::test]
  async fn load_all_falls_back_to_snapshot_then_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut sync, lesson_store, _) = make_sync(dir.path());
    sync.save(Lesson::new("Persisted".into(), cards())).await.expect("save");

    // Same snapshot path, store now failing: the snapshot serves.
    lesson_store.set_failing(true);
    let (mut offline, _, _) = {
      let pool_store = Arc::new(MemPoolStore::default());
      let s = LessonSync::new(
        lesson_store.clone(),
        pool_store.clone(),
        SnapshotCache::new(dir.path().join(".snapshot.json")),
      );
      (s, lesson_store.clone(), pool_store)
    };
    let recovered = offline.load_all().await;
    assert_eq!(recovered.len(), 1);
    assert_eq!(recovered[0].name, "Persisted");

    // No snapshot either: empty collection, no error.
    let bare_dir = tempfile::tempdir().expect("tempdir");
    let (mut bare, bare_store, _) = make_sync(bare_dir.path());
    bare_store.set_failing(true);
    assert!(bare.load_all().await.is_empty());
  }

  #[tokio::test]
  async fn save_reports_store_failure_but_keeps_the_lesson() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut sync, lesson_store, _) = make_sync(dir.path());
    lesson_store.set_failing(true);

    let lesson = Lesson::new("Unstored".into(), cards());
    assert!(matches!(sync.save(lesson).await, Err(SyncError::Store(_))));
    assert_eq!(sync.lessons().len(), 1);

    // The snapshot caught the mutation even though the store missed it.
    let cached = SnapshotCache::new(dir.path().join(".snapshot.json"))
      .read()
      .await
      .expect("snapshot");
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].name, "Unstored");
  }

  #[tokio::test]
  async fn name_collisions_are_detected_case_insensitively() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut sync, _, _) = make_sync(dir.path());
    sync.save(Lesson::new("Ancient Rome".into(), cards())).await.expect("save");
    assert!(sync.name_exists("ancient rome"));
    assert!(!sync.name_exists("Ancient Greece"));
  }
}
