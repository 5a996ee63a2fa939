//! Accent- and case-insensitive place-name comparison.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use super::Flag;

/// Lowercase, trim, NFD-decompose and drop combining marks, so that
/// `"Orléans"` and `"orleans"` compare equal.
pub fn normalize(place: &str) -> String {
  place
    .trim()
    .to_lowercase()
    .nfd()
    .filter(|c| !is_combining_mark(*c))
    .collect()
}

/// Compare two collections of place names.
///
/// +1 if any normalized candidate place equals, contains, or is contained in
/// any normalized TMS place; 0 if either collection is empty; −1 otherwise.
/// Substring containment is intentionally permissive: it tolerates partial
/// administrative-division names ("Paris" vs "Paris, France").
pub fn compare_places(candidate: &[String], tms: &[String]) -> Flag {
  if candidate.is_empty() || tms.is_empty() {
    return Flag::NoData;
  }

  for cand in candidate {
    let cand_norm = normalize(cand);
    for known in tms {
      let known_norm = normalize(known);
      if cand_norm == known_norm
        || cand_norm.contains(&known_norm)
        || known_norm.contains(&cand_norm)
      {
        return Flag::Match;
      }
    }
  }

  Flag::Mismatch
}
