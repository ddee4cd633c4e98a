//! Quiz engine: randomized question order, multiple-choice option
//! construction, scoring, and progress tracking.
//!
//! The engine owns its RNG so tests can seed it; production uses entropy.
//! A question is built once — when it becomes current — and held, so the
//! answer is always graded against exactly what was shown.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::domain::Flashcard;
use crate::error::QuizError;
use crate::util::eq_ignore_case;

/// A multiple-choice quiz needs this many cards: one correct answer plus
/// three distractor slots.
pub const MIN_QUIZ_CARDS: usize = 4;

const OPTION_COUNT: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuizPhase {
  Idle,
  InProgress,
  Finished,
}

/// One question as shown to the user, plus the grading key.
#[derive(Clone, Debug)]
pub struct Question {
  /// true: the prompt is the term and the answer is its definition;
  /// false: the reverse.
  pub shows_term: bool,
  pub prompt: String,
  pub correct: String,
  pub options: Vec<String>,
  pub answered: bool,
}

#[derive(Clone, Debug)]
pub struct AnswerOutcome {
  pub correct: bool,
  pub correct_answer: String,
  /// Whether this was the last question, so the caller can label the
  /// advance control "Show Results" instead of "Next".
  pub is_final: bool,
  pub score: u32,
}

pub struct QuizEngine {
  rng: StdRng,
  source_cards: Vec<Flashcard>,
  order: Vec<Flashcard>,
  index: usize,
  score: u32,
  phase: QuizPhase,
  current: Option<Question>,
}

impl QuizEngine {
  pub fn new() -> Self {
    Self::from_rng(StdRng::from_entropy())
  }

  /// Deterministic engine for tests and reproducible runs.
  pub fn with_seed(seed: u64) -> Self {
    Self::from_rng(StdRng::seed_from_u64(seed))
  }

  fn from_rng(rng: StdRng) -> Self {
    Self {
      rng,
      source_cards: Vec::new(),
      order: Vec::new(),
      index: 0,
      score: 0,
      phase: QuizPhase::Idle,
      current: None,
    }
  }

  /// Begin a quiz over the given cards: fresh shuffle, zero score.
  pub fn start(&mut self, cards: &[Flashcard]) -> Result<(), QuizError> {
    if cards.len() < MIN_QUIZ_CARDS {
      return Err(QuizError::InsufficientCards { have: cards.len(), need: MIN_QUIZ_CARDS });
    }
    self.source_cards = cards.to_vec();
    self.begin();
    Ok(())
  }

  /// Re-run over the same card set with a fresh shuffle.
  pub fn restart(&mut self) -> Result<(), QuizError> {
    if self.source_cards.len() < MIN_QUIZ_CARDS {
      return Err(QuizError::InsufficientCards {
        have: self.source_cards.len(),
        need: MIN_QUIZ_CARDS,
      });
    }
    self.begin();
    Ok(())
  }

  /// Leave the quiz, discarding order, score, and progress.
  pub fn exit(&mut self) {
    self.source_cards.clear();
    self.order.clear();
    self.index = 0;
    self.score = 0;
    self.phase = QuizPhase::Idle;
    self.current = None;
  }

  fn begin(&mut self) {
    self.order = self.source_cards.clone();
    self.order.shuffle(&mut self.rng);
    self.index = 0;
    self.score = 0;
    self.phase = QuizPhase::InProgress;
    self.current = Some(self.build_question(0));
  }

  pub fn current_question(&self) -> Result<&Question, QuizError> {
    if self.phase != QuizPhase::InProgress {
      return Err(QuizError::NotInProgress);
    }
    self.current.as_ref().ok_or(QuizError::NotInProgress)
  }

  /// Grade a selected option against the current question. Scoring is a
  /// case-insensitive exact match; the index does not move.
  pub fn submit_answer(&mut self, selected: &str) -> Result<AnswerOutcome, QuizError> {
    if self.phase != QuizPhase::InProgress {
      return Err(QuizError::NotInProgress);
    }
    let is_final = self.index + 1 >= self.order.len();
    let question = self.current.as_mut().ok_or(QuizError::NotInProgress)?;
    if question.answered {
      return Err(QuizError::AlreadyAnswered);
    }
    question.answered = true;
    let correct = eq_ignore_case(selected, &question.correct);
    let correct_answer = question.correct.clone();
    if correct {
      self.score += 1;
    }
    Ok(AnswerOutcome { correct, correct_answer, is_final, score: self.score })
  }

  /// Move to the next question; past the last one the quiz finishes.
  pub fn advance(&mut self) -> Result<QuizPhase, QuizError> {
    if self.phase != QuizPhase::InProgress {
      return Err(QuizError::NotInProgress);
    }
    self.index += 1;
    if self.index >= self.order.len() {
      self.phase = QuizPhase::Finished;
      self.current = None;
    } else {
      self.current = Some(self.build_question(self.index));
    }
    Ok(self.phase)
  }

  fn build_question(&mut self, idx: usize) -> Question {
    let card = self.order[idx].clone();
    let shows_term = self.rng.gen_bool(0.5);
    let (prompt, correct) = if shows_term {
      (card.term, card.definition)
    } else {
      (card.definition, card.term)
    };
    let options = self.mcq_options(&correct, shows_term);
    Question { shows_term, prompt, correct, options, answered: false }
  }

  /// One correct answer plus three distractors, shuffled. Distractors
  /// come from the full card set (not just the quiz order), excluding
  /// the correct text and case-insensitive duplicates; small sets are
  /// topped up with synthesized placeholders.
  fn mcq_options(&mut self, correct: &str, shows_term: bool) -> Vec<String> {
    let mut pool: Vec<String> = self
      .source_cards
      .iter()
      .map(|c| if shows_term { c.definition.clone() } else { c.term.clone() })
      .filter(|t| !t.trim().is_empty() && !eq_ignore_case(t, correct))
      .collect();
    pool.shuffle(&mut self.rng);

    let mut distractors: Vec<String> = Vec::new();
    for text in pool {
      if distractors.len() == OPTION_COUNT - 1 {
        break;
      }
      if distractors.iter().any(|d| eq_ignore_case(d, &text)) {
        continue;
      }
      distractors.push(text);
    }

    let mut n = 1;
    while distractors.len() < OPTION_COUNT - 1 {
      let fallback = format!("None of the other options ({n})");
      n += 1;
      if eq_ignore_case(&fallback, correct) {
        continue;
      }
      distractors.push(fallback);
    }

    let mut options = Vec::with_capacity(OPTION_COUNT);
    options.push(correct.to_string());
    options.extend(distractors);
    options.shuffle(&mut self.rng);
    options
  }

  pub fn phase(&self) -> QuizPhase {
    self.phase
  }

  pub fn index(&self) -> usize {
    self.index
  }

  pub fn len(&self) -> usize {
    self.order.len()
  }

  pub fn score(&self) -> u32 {
    self.score
  }

  /// The current question without a phase check, for view building.
  pub fn current(&self) -> Option<&Question> {
    self.current.as_ref()
  }
}

impl Default for QuizEngine {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn cards(n: usize) -> Vec<Flashcard> {
    (0..n)
      .map(|i| Flashcard {
        term: format!("term-{i}"),
        definition: format!("definition-{i}"),
      })
      .collect()
  }

  fn assert_options_well_formed(q: &Question) {
    assert_eq!(q.options.len(), 4, "exactly four options");
    for (i, a) in q.options.iter().enumerate() {
      for b in q.options.iter().skip(i + 1) {
        assert!(!eq_ignore_case(a, b), "duplicate option {a:?}");
      }
    }
    assert!(q.options.iter().any(|o| o == &q.correct), "correct answer present");
  }

  #[test]
  fn every_question_has_four_distinct_options_for_any_seed() {
    for seed in 0..50 {
      let mut quiz = QuizEngine::with_seed(seed);
      quiz.start(&cards(6)).expect("start");
      loop {
        let q = quiz.current_question().expect("question").clone();
        assert_options_well_formed(&q);
        // The prompt/answer pair must come from one source card.
        let matched = cards(6).iter().any(|c| {
          if q.shows_term {
            c.term == q.prompt && c.definition == q.correct
          } else {
            c.definition == q.prompt && c.term == q.correct
          }
        });
        assert!(matched, "question not derived from a card");
        if quiz.advance().expect("advance") == QuizPhase::Finished {
          break;
        }
      }
    }
  }

  #[test]
  fn small_sets_with_duplicate_texts_get_placeholders() {
    let dupes = vec![
      Flashcard { term: "a".into(), definition: "same".into() },
      Flashcard { term: "b".into(), definition: "same".into() },
      Flashcard { term: "c".into(), definition: "same".into() },
      Flashcard { term: "d".into(), definition: "different".into() },
    ];
    for seed in 0..50 {
      let mut quiz = QuizEngine::with_seed(seed);
      quiz.start(&dupes).expect("start");
      loop {
        assert_options_well_formed(quiz.current_question().expect("question"));
        if quiz.advance().expect("advance") == QuizPhase::Finished {
          break;
        }
      }
    }
  }

  #[test]
  fn correct_answers_score_and_wrong_answers_do_not() {
    let mut quiz = QuizEngine::with_seed(9);
    quiz.start(&cards(5)).expect("start");

    let correct = quiz.current_question().expect("question").correct.clone();
    let outcome = quiz.submit_answer(&correct.to_uppercase()).expect("submit");
    assert!(outcome.correct);
    assert_eq!(outcome.score, 1);
    assert_eq!(outcome.correct_answer, correct);

    quiz.advance().expect("advance");
    let q = quiz.current_question().expect("question").clone();
    let wrong = q
      .options
      .iter()
      .find(|o| !eq_ignore_case(o, &q.correct))
      .expect("a wrong option")
      .clone();
    let outcome = quiz.submit_answer(&wrong).expect("submit");
    assert!(!outcome.correct);
    assert_eq!(outcome.score, 1);
    assert_eq!(quiz.score(), 1);
  }

  #[test]
  fn four_cards_run_to_finished_over_four_advances() {
    let mut quiz = QuizEngine::with_seed(3);
    quiz.start(&cards(4)).expect("start");
    for i in 0..4 {
      let q = quiz.current_question().expect("question").clone();
      let outcome = quiz.submit_answer(&q.correct).expect("submit");
      assert_eq!(outcome.is_final, i == 3);
      quiz.advance().expect("advance");
    }
    assert_eq!(quiz.phase(), QuizPhase::Finished);
    assert_eq!(quiz.index(), 4);
    assert_eq!(quiz.score(), 4);
  }

  #[test]
  fn answering_the_same_question_twice_is_rejected() {
    let mut quiz = QuizEngine::with_seed(1);
    quiz.start(&cards(4)).expect("start");
    let correct = quiz.current_question().expect("question").correct.clone();
    quiz.submit_answer(&correct).expect("first submit");
    assert!(matches!(quiz.submit_answer(&correct), Err(QuizError::AlreadyAnswered)));
    assert_eq!(quiz.score(), 1);
  }

  #[test]
  fn restart_reshuffles_and_resets_progress() {
    let mut quiz = QuizEngine::with_seed(5);
    quiz.start(&cards(4)).expect("start");
    let correct = quiz.current_question().expect("question").correct.clone();
    quiz.submit_answer(&correct).expect("submit");
    quiz.advance().expect("advance");

    quiz.restart().expect("restart");
    assert_eq!(quiz.phase(), QuizPhase::InProgress);
    assert_eq!(quiz.index(), 0);
    assert_eq!(quiz.score(), 0);
    assert_eq!(quiz.len(), 4);
  }

  #[test]
  fn exit_discards_everything() {
    let mut quiz = QuizEngine::with_seed(2);
    quiz.start(&cards(4)).expect("start");
    quiz.exit();
    assert_eq!(quiz.phase(), QuizPhase::Idle);
    assert!(quiz.current_question().is_err());
    assert!(matches!(quiz.restart(), Err(QuizError::InsufficientCards { .. })));
  }

  #[test]
  fn too_few_cards_cannot_start() {
    let mut quiz = QuizEngine::with_seed(0);
    let err = quiz.start(&cards(3)).expect_err("must fail");
    assert!(matches!(err, QuizError::InsufficientCards { have: 3, need: 4 }));
    assert_eq!(quiz.phase(), QuizPhase::Idle);
  }
}
