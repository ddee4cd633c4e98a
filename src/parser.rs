//! Flashcard parsing: raw generated text in, validated term/definition
//! pairs out.
//!
//! The generator asks the model for one `Term: Definition` pair per line.
//! Parsing is deliberately forgiving: malformed lines are dropped, never
//! reported. An empty result is the caller's cue that generation failed.

use crate::domain::Flashcard;

/// Parse one block of free text into flashcards.
///
/// Per line: split on the first colon; the term is what precedes it, the
/// definition is the remainder. Lines with no colon, an empty term, or an
/// empty definition (after trimming) are discarded, as is any pair that
/// echoes the "Term: Definition" header the prompt shows the model.
/// Order is preserved and duplicates are allowed.
pub fn parse_flashcards(text: &str) -> Vec<Flashcard> {
  let mut cards = Vec::new();
  for line in text.lines() {
    let Some((head, tail)) = line.split_once(':') else {
      continue;
    };
    let term = head.trim();
    let definition = tail.trim();
    if term.is_empty() || definition.is_empty() {
      continue;
    }
    if term.eq_ignore_ascii_case("term") || definition.eq_ignore_ascii_case("definition") {
      continue;
    }
    cards.push(Flashcard {
      term: term.to_string(),
      definition: definition.to_string(),
    });
  }
  cards
}

/// Render flashcards back to the `Term: Definition` line format.
/// This is the parser's inverse for well-formed cards; it also feeds the
/// name-suggestion prompt and the TOML seed banks.
pub fn render_flashcards(cards: &[Flashcard]) -> String {
  cards
    .iter()
    .map(|c| format!("{}: {}", c.term, c.definition))
    .collect::<Vec<_>>()
    .join("\n")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn keeps_valid_lines_and_discards_the_rest() {
    let parsed = parse_flashcards("Term: Definition\nCat: A small feline\nDog:");
    assert_eq!(
      parsed,
      vec![Flashcard { term: "Cat".into(), definition: "A small feline".into() }]
    );
  }

  #[test]
  fn definition_is_the_remainder_after_the_first_colon() {
    let parsed = parse_flashcards("HTTP: protocol: hypertext transfer");
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].term, "HTTP");
    assert_eq!(parsed[0].definition, "protocol: hypertext transfer");
  }

  #[test]
  fn header_echo_is_discarded_case_insensitively() {
    assert!(parse_flashcards("TERM: whatever").is_empty());
    assert!(parse_flashcards("Photosynthesis: DEFINITION").is_empty());
  }

  #[test]
  fn empty_term_or_missing_colon_is_discarded() {
    assert!(parse_flashcards(":  definition only").is_empty());
    assert!(parse_flashcards("no separator on this line").is_empty());
    assert!(parse_flashcards("").is_empty());
  }

  #[test]
  fn order_and_duplicates_are_preserved() {
    let parsed = parse_flashcards("a: 1\nb: 2\na: 1");
    assert_eq!(parsed.len(), 3);
    assert_eq!(parsed[0], parsed[2]);
  }

  #[test]
  fn parse_is_idempotent_through_render() {
    let text = "Mitochondria: powerhouse of the cell\nOsmosis: diffusion of water\nEnzyme: a biological catalyst";
    let once = parse_flashcards(text);
    let twice = parse_flashcards(&render_flashcards(&once));
    assert_eq!(once, twice);
  }
}
