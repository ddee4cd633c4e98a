//! Seed data: built-in decks that keep the generator useful when no
//! OpenAI key is configured.

use crate::config::SeedLessonCfg;

/// A deck the generator can serve locally. `topics` are the keywords that
/// select it; `cards` is `Term: Definition` lines, same as model output.
#[derive(Clone, Debug)]
pub struct SeedDeck {
  pub name: String,
  pub topics: Vec<String>,
  pub cards: String,
}

impl From<SeedLessonCfg> for SeedDeck {
  fn from(cfg: SeedLessonCfg) -> Self {
    Self { name: cfg.name, topics: cfg.topics, cards: cfg.cards }
  }
}

/// Minimal set of built-in decks that guarantee the app is useful even
/// without external config or OpenAI.
pub fn seed_decks() -> Vec<SeedDeck> {
  vec![
    SeedDeck {
      name: "World Capitals".into(),
      topics: vec!["capital".into(), "geography".into(), "country".into()],
      cards: "France: Paris\n\
              Japan: Tokyo\n\
              Canada: Ottawa\n\
              Australia: Canberra\n\
              Brazil: Brasília\n\
              Kenya: Nairobi"
        .into(),
    },
    SeedDeck {
      name: "Cell Biology Basics".into(),
      topics: vec!["biology".into(), "cell".into(), "science".into()],
      cards: "Mitochondria: Organelle that produces the cell's energy\n\
              Ribosome: Site of protein synthesis\n\
              Nucleus: Contains the cell's genetic material\n\
              Osmosis: Diffusion of water across a membrane\n\
              Enzyme: Protein that catalyzes a reaction"
        .into(),
    },
  ]
}

/// Absolute last-resort deck when no topic keyword matches.
pub fn fallback_deck() -> SeedDeck {
  SeedDeck {
    name: "Study Skills".into(),
    topics: Vec::new(),
    cards: "Spaced repetition: Reviewing material at increasing intervals\n\
            Active recall: Testing yourself instead of rereading\n\
            Interleaving: Mixing related topics within one session\n\
            Mnemonic: A memory aid that encodes information"
      .into(),
  }
}

/// Pick the deck whose topic keywords match the requested topic, falling
/// back to the generic deck.
pub fn pick_deck<'a>(decks: &'a [SeedDeck], topic: &str) -> Option<&'a SeedDeck> {
  let topic = topic.to_lowercase();
  decks
    .iter()
    .find(|d| d.topics.iter().any(|t| topic.contains(&t.to_lowercase())))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parser::parse_flashcards;

  #[test]
  fn builtin_decks_parse_to_quizzable_sets() {
    for deck in seed_decks().iter().chain(std::iter::once(&fallback_deck())) {
      let cards = parse_flashcards(&deck.cards);
      assert!(cards.len() >= 4, "deck {} has {} cards", deck.name, cards.len());
    }
  }

  #[test]
  fn topic_keywords_select_a_deck() {
    let decks = seed_decks();
    let deck = pick_deck(&decks, "European capital cities").expect("match");
    assert_eq!(deck.name, "World Capitals");
    assert!(pick_deck(&decks, "quantum chromodynamics").is_none());
  }
}
