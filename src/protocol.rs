//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{CommunityLesson, Flashcard, Lesson};
use crate::quiz::{AnswerOutcome, QuizEngine, QuizPhase};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    Generate {
        topic: String,
    },
    SuggestName,
    SaveLesson {
        name: String,
    },
    ListLessons,
    LoadLesson {
        #[serde(rename = "lessonId")]
        lesson_id: String,
    },
    DeleteLesson {
        #[serde(rename = "lessonId")]
        lesson_id: String,
    },
    ShareLesson {
        #[serde(rename = "lessonId")]
        lesson_id: String,
        #[serde(rename = "sharedBy", default)]
        shared_by: Option<String>,
    },
    UnshareLesson {
        #[serde(rename = "lessonId")]
        lesson_id: String,
    },
    ListCommunity,
    CopyLesson {
        #[serde(rename = "communityId")]
        community_id: String,
        #[serde(default)]
        confirm: bool,
    },
    QuizStart,
    QuizAnswer {
        answer: String,
    },
    QuizNext,
    QuizRestart,
    QuizExit,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Generated {
        flashcards: Vec<Flashcard>,
        origin: &'static str,
    },
    NameSuggestion {
        name: String,
    },
    LessonSaved {
        lesson: Lesson,
    },
    Lessons {
        lessons: Vec<Lesson>,
    },
    LessonLoaded {
        lesson: Lesson,
    },
    LessonDeleted {
        #[serde(rename = "lessonId")]
        lesson_id: String,
    },
    LessonShared {
        community: CommunityLesson,
    },
    LessonUnshared {
        #[serde(rename = "lessonId")]
        lesson_id: String,
    },
    Community {
        lessons: Vec<CommunityLesson>,
    },
    LessonCopied {
        #[serde(rename = "requiresConfirmation")]
        requires_confirmation: bool,
        lesson: Option<Lesson>,
        message: Option<String>,
    },
    QuizState {
        quiz: QuizStateOut,
    },
    AnswerResult {
        correct: bool,
        #[serde(rename = "correctAnswer")]
        correct_answer: String,
        #[serde(rename = "isFinal")]
        is_final: bool,
        score: u32,
    },
    Error {
        message: String,
    },
}

//
// Quiz view-model
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizPhaseOut {
    Idle,
    InProgress,
    Finished,
}

impl From<QuizPhase> for QuizPhaseOut {
    fn from(p: QuizPhase) -> Self {
        match p {
            QuizPhase::Idle => QuizPhaseOut::Idle,
            QuizPhase::InProgress => QuizPhaseOut::InProgress,
            QuizPhase::Finished => QuizPhaseOut::Finished,
        }
    }
}

/// What the renderer sees of a question: the grading key stays server-side.
#[derive(Debug, Serialize)]
pub struct QuestionOut {
    pub prompt: String,
    #[serde(rename = "showsTerm")]
    pub shows_term: bool,
    pub options: Vec<String>,
    pub answered: bool,
}

#[derive(Debug, Serialize)]
pub struct QuizStateOut {
    pub phase: QuizPhaseOut,
    pub index: usize,
    pub total: usize,
    pub score: u32,
    pub question: Option<QuestionOut>,
}

/// Convert the engine's state to the public view-model.
pub fn quiz_to_out(quiz: &QuizEngine) -> QuizStateOut {
    QuizStateOut {
        phase: quiz.phase().into(),
        index: quiz.index(),
        total: quiz.len(),
        score: quiz.score(),
        question: quiz.current().map(|q| QuestionOut {
            prompt: q.prompt.clone(),
            shows_term: q.shows_term,
            options: q.options.clone(),
            answered: q.answered,
        }),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct GenerateIn {
    pub topic: String,
}
#[derive(Serialize)]
pub struct GenerateOut {
    pub flashcards: Vec<Flashcard>,
    pub origin: &'static str,
}

#[derive(Serialize)]
pub struct NameOut {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveLessonIn {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoadLessonIn {
    #[serde(rename = "lessonId")]
    pub lesson_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ShareIn {
    #[serde(rename = "lessonId")]
    pub lesson_id: String,
    #[serde(rename = "sharedBy", default)]
    pub shared_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UnshareIn {
    #[serde(rename = "lessonId")]
    pub lesson_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CopyIn {
    #[serde(rename = "communityId")]
    pub community_id: String,
    #[serde(default)]
    pub confirm: bool,
}
#[derive(Serialize)]
pub struct CopyOut {
    #[serde(rename = "requiresConfirmation")]
    pub requires_confirmation: bool,
    pub lesson: Option<Lesson>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuizAnswerIn {
    pub answer: String,
}
#[derive(Serialize)]
pub struct AnswerOut {
    pub correct: bool,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: String,
    #[serde(rename = "isFinal")]
    pub is_final: bool,
    pub score: u32,
}

impl From<AnswerOutcome> for AnswerOut {
    fn from(o: AnswerOutcome) -> Self {
        Self {
            correct: o.correct,
            correct_answer: o.correct_answer,
            is_final: o.is_final,
            score: o.score,
        }
    }
}

#[derive(Serialize)]
pub struct SuccessOut {
    pub success: bool,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
