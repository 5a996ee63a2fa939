//! Display-name comparison: exact, word-set, then edit distance.

use std::collections::HashSet;

use super::Flag;

/// Maximum relative Levenshtein distance still considered "close".
const EDIT_RATIO_THRESHOLD: f64 = 0.15;

fn word_set(name: &str) -> HashSet<&str> {
  name.split_whitespace().collect()
}

/// Compare two display names.
///
/// +1 if the lowercased, trimmed names are identical or contain the same set
/// of words in any order ("Jean Dupont" / "Dupont Jean"); 0 if either name is
/// empty, or if the relative Levenshtein distance (distance ÷ max char
/// length) is ≤ 0.15; −1 otherwise.
///
/// The two meanings of 0 — no data, and close-but-uncertain — share a flag on
/// purpose; callers must not read 0 as "neutral".
pub fn compare_names(candidate: &str, tms: &str) -> Flag {
  if candidate.trim().is_empty() || tms.trim().is_empty() {
    return Flag::NoData;
  }

  let cand = candidate.trim().to_lowercase();
  let known = tms.trim().to_lowercase();

  if cand == known || word_set(&cand) == word_set(&known) {
    return Flag::Match;
  }

  let distance = strsim::levenshtein(&cand, &known);
  let max_len = cand.chars().count().max(known.chars().count());
  let ratio = distance as f64 / max_len as f64;

  if ratio <= EDIT_RATIO_THRESHOLD {
    Flag::NoData
  } else {
    Flag::Mismatch
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn exact_match_ignores_case_and_whitespace() {
    assert_eq!(compare_names("  Jean Dupont ", "jean dupont"), Flag::Match);
  }

  #[test]
  fn word_order_is_irrelevant() {
    assert_eq!(compare_names("Jean Dupont", "Dupont Jean"), Flag::Match);
  }

  #[test]
  fn small_edit_distance_is_uncertain() {
    // One substitution over eleven characters: ratio ≈ 0.09.
    assert_eq!(compare_names("Jean Dupont", "Jean Dupond"), Flag::NoData);
  }

  #[test]
  fn unrelated_names_mismatch() {
    assert_eq!(compare_names("Jean Dupont", "Paul Martin"), Flag::Mismatch);
  }

  #[test]
  fn empty_name_is_no_data() {
    assert_eq!(compare_names("", "Jean Dupont"), Flag::NoData);
    assert_eq!(compare_names("Jean Dupont", "   "), Flag::NoData);
  }

  #[test]
  fn ratio_uses_char_count_not_bytes() {
    // Accented names: é is two bytes but one char; the ratio must not be
    // inflated by UTF-8 length.
    assert_eq!(compare_names("Frédéric Bazille", "Frederic Bazille"), Flag::NoData);
  }
}
