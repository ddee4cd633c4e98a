//! Domain models: flashcards, user-owned lessons, and community lessons.
//!
//! Wire field names stay camelCase so lesson documents on disk keep the
//! shape the web client consumes.

use serde::{Deserialize, Serialize};

/// One term/definition pair. Both sides are non-empty after trimming;
/// the parser enforces this before a card ever exists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
  pub term: String,
  pub definition: String,
}

/// A named, user-owned ordered set of flashcards, persisted 1:1 to the
/// lesson store.
///
/// Invariant: `shared_community_id` is set iff a community lesson with
/// that id currently exists in the pool. The synchronizer maintains this
/// in both directions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Lesson {
  pub id: String,
  pub name: String,
  pub flashcards: Vec<Flashcard>,
  #[serde(rename = "sharedCommunityId", default, skip_serializing_if = "Option::is_none")]
  pub shared_community_id: Option<String>,
  #[serde(rename = "copiedFromCommunityId", default, skip_serializing_if = "Option::is_none")]
  pub copied_from_community_id: Option<String>,
}

impl Lesson {
  /// A fresh, unshared lesson with a server-assigned id.
  pub fn new(name: String, flashcards: Vec<Flashcard>) -> Self {
    Self {
      id: uuid::Uuid::new_v4().to_string(),
      name,
      flashcards,
      shared_community_id: None,
      copied_from_community_id: None,
    }
  }
}

/// A shared, independently-owned copy of a lesson's flashcards, visible
/// to all users. Sharing performs a value copy: editing or deleting the
/// originating lesson afterwards does not touch this document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommunityLesson {
  #[serde(rename = "communityId")]
  pub community_id: String,
  pub name: String,
  pub flashcards: Vec<Flashcard>,
  #[serde(rename = "sharedBy")]
  pub shared_by: String,
  #[serde(rename = "sharedTimestamp")]
  pub shared_timestamp: u64,
}
