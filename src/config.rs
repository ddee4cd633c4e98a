//! Loading agent configuration (prompts + optional seed lesson bank) from TOML.
//!
//! See `AgentConfig` and `Prompts` for expected schema.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AgentConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub seed_lessons: Vec<SeedLessonCfg>,
}

/// Seed lesson entry accepted in TOML configuration.
/// `cards` holds one `Term: Definition` pair per line; `topics` lists the
/// keywords that select this deck when generation runs without OpenAI.
#[derive(Clone, Debug, Deserialize)]
pub struct SeedLessonCfg {
  pub name: String,
  #[serde(default)]
  pub topics: Vec<String>,
  pub cards: String,
}

/// Prompts used by the OpenAI client. Defaults are sensible for flashcard
/// generation. You can override them in TOML if you need to tune tone/structure.
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
  // Flashcard generation from a topic
  pub generate_system: String,
  pub generate_user_template: String,
  // Lesson name suggestion from sample cards
  pub name_system: String,
  pub name_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      generate_system:
        "You are a flashcard content generator. Output ONLY lines of the form Term: Definition, one pair per line, nothing else.".into(),
      generate_user_template:
        "Generate a list of flashcards for the topic \"{topic}\". Each flashcard should have a term and a concise definition. Format the output as a list of \"Term: Definition\" pairs, with each pair on a new line. Ensure terms and definitions are distinct and clearly separated by a single colon. For example:\nTerm1: Definition1\nTerm2: Definition2\nAnother Term: Another Definition".into(),
      name_system:
        "You name study lessons. Reply with the name only: no introductory phrases, no quotation marks, no extra text.".into(),
      name_user_template:
        "Suggest a concise and descriptive name (2-5 words) for a study lesson based on these flashcards. Return only the name itself.\nFlashcards:\n{cards}\n\nSuggested Lesson Name:".into(),
    }
  }
}

/// Attempt to load `AgentConfig` from AGENT_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_agent_config_from_env() -> Option<AgentConfig> {
  let path = std::env::var("AGENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AgentConfig>(&s) {
      Ok(cfg) => {
        info!(target: "memodeck_backend", %path, "Loaded agent config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "memodeck_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "memodeck_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
