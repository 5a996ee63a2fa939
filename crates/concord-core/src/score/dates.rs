//! Precision-aware date comparison.
//!
//! Dates arrive as loose strings (`"1867"`, `"1867-05"`, `"1867-05-14"`) with
//! a knowledge-base precision code. Two dates agree when they are equal after
//! truncation to the coarser of the two precisions.

use super::Flag;

/// Knowledge-base date precision codes. Numerically smaller is coarser.
pub const PRECISION_MILLENNIUM: u8 = 6;
pub const PRECISION_CENTURY: u8 = 7;
pub const PRECISION_DECADE: u8 = 8;
pub const PRECISION_YEAR: u8 = 9;
pub const PRECISION_MONTH: u8 = 10;
pub const PRECISION_DAY: u8 = 11;

/// A date string paired with its precision code, as read from an event row.
/// A missing or malformed precision is treated as day precision.
#[derive(Debug, Clone)]
pub struct DatedValue {
  pub date:      String,
  pub precision: Option<u8>,
}

impl DatedValue {
  pub fn new(date: impl Into<String>, precision: Option<u8>) -> Self {
    Self { date: date.into(), precision }
  }

  fn precision_or_day(&self) -> u8 {
    self.precision.unwrap_or(PRECISION_DAY)
  }
}

/// Complete a partial date to the first day/month so positional truncation
/// is uniform: `"1867"` → `"1867-01-01"`, `"1867-05"` → `"1867-05-01"`.
fn complete(date: &str) -> String {
  let date = date.trim();
  match date.len() {
    4 => format!("{date}-01-01"),
    7 => format!("{date}-01"),
    _ => date.to_string(),
  }
}

/// Truncate a date string to the given precision.
///
/// Returns an empty string for input that cannot be truncated (which the
/// caller treats as "no usable value", never as a match).
pub fn truncate(date: &str, precision: u8) -> String {
  let date = complete(date);
  match precision {
    PRECISION_CENTURY => match date.get(..4).and_then(|y| y.parse::<i64>().ok()) {
      Some(year) => (((year - 1) / 100) + 1).to_string(),
      None => String::new(),
    },
    PRECISION_DECADE => match date.get(..3) {
      Some(prefix) => format!("{prefix}0"),
      None => String::new(),
    },
    PRECISION_YEAR => date.get(..4).unwrap_or("").to_string(),
    PRECISION_MONTH => date.get(..7).unwrap_or("").to_string(),
    PRECISION_DAY => date.get(..10).unwrap_or("").to_string(),
    // Millennium and out-of-range codes: compare the full string.
    _ => date,
  }
}

/// Compare two collections of dated values.
///
/// +1 if any cross pair matches at the coarser of its two precisions, 0 if
/// either collection is empty (insufficient data, not a disagreement), −1 if
/// both sides have data but nothing matches. Pairs where either date string
/// is empty are skipped.
pub fn compare_dates(candidate: &[DatedValue], tms: &[DatedValue]) -> Flag {
  if candidate.is_empty() || tms.is_empty() {
    return Flag::NoData;
  }

  for cand in candidate {
    for known in tms {
      if cand.date.trim().is_empty() || known.date.trim().is_empty() {
        continue;
      }

      let precision = cand.precision_or_day().min(known.precision_or_day());
      let left = truncate(&cand.date, precision);
      let right = truncate(&known.date, precision);

      if !left.is_empty() && left == right {
        return Flag::Match;
      }
    }
  }

  Flag::Mismatch
}

#[cfg(test)]
mod tests {
  use super::*;

  fn dated(date: &str, precision: u8) -> DatedValue {
    DatedValue::new(date, Some(precision))
  }

  #[test]
  fn exact_day_match() {
    let flag = compare_dates(
      &[dated("1867-05-14", PRECISION_DAY)],
      &[dated("1867-05-14", PRECISION_DAY)],
    );
    assert_eq!(flag, Flag::Match);
  }

  #[test]
  fn coarser_precision_wins() {
    // Candidate knows only the year; TMS has the full date. They agree at
    // year granularity.
    let flag = compare_dates(
      &[dated("1867", PRECISION_YEAR)],
      &[dated("1867-05-14", PRECISION_DAY)],
    );
    assert_eq!(flag, Flag::Match);
  }

  #[test]
  fn decade_truncation() {
    assert_eq!(truncate("1867-05-14", PRECISION_DECADE), "1860");
    let flag = compare_dates(
      &[dated("1869", PRECISION_DECADE)],
      &[dated("1861-01-02", PRECISION_DAY)],
    );
    assert_eq!(flag, Flag::Match);
  }

  #[test]
  fn century_truncation() {
    assert_eq!(truncate("1867", PRECISION_CENTURY), "19");
    assert_eq!(truncate("1900", PRECISION_CENTURY), "19");
    assert_eq!(truncate("1901", PRECISION_CENTURY), "20");
  }

  #[test]
  fn month_mismatch_at_month_precision() {
    let flag = compare_dates(
      &[dated("1867-05", PRECISION_MONTH)],
      &[dated("1867-06-01", PRECISION_DAY)],
    );
    assert_eq!(flag, Flag::Mismatch);
  }

  #[test]
  fn any_matching_cross_pair_suffices() {
    let flag = compare_dates(
      &[dated("1900-01-01", PRECISION_DAY), dated("1867", PRECISION_YEAR)],
      &[dated("1867-05-14", PRECISION_DAY)],
    );
    assert_eq!(flag, Flag::Match);
  }

  #[test]
  fn empty_collection_is_no_data_regardless_of_content() {
    assert_eq!(
      compare_dates(&[], &[dated("1867", PRECISION_YEAR)]),
      Flag::NoData
    );
    assert_eq!(
      compare_dates(&[dated("1867", PRECISION_YEAR)], &[]),
      Flag::NoData
    );
    assert_eq!(compare_dates(&[], &[]), Flag::NoData);
  }

  #[test]
  fn malformed_precision_defaults_to_day() {
    // No precision on either side: full-date comparison.
    let flag = compare_dates(
      &[DatedValue::new("1867-05-14", None)],
      &[DatedValue::new("1867-05-14", None)],
    );
    assert_eq!(flag, Flag::Match);

    let flag = compare_dates(
      &[DatedValue::new("1867-05-14", None)],
      &[DatedValue::new("1867-05-15", None)],
    );
    assert_eq!(flag, Flag::Mismatch);
  }

  #[test]
  fn partial_dates_are_completed_before_truncation() {
    // "1867" completes to 1867-01-01; at day precision it only matches the
    // first of January.
    let flag = compare_dates(
      &[dated("1867", PRECISION_DAY)],
      &[dated("1867-01-01", PRECISION_DAY)],
    );
    assert_eq!(flag, Flag::Match);
  }

  #[test]
  fn pairs_with_empty_date_strings_are_skipped() {
    let flag = compare_dates(
      &[dated("", PRECISION_DAY)],
      &[dated("1867-01-01", PRECISION_DAY)],
    );
    assert_eq!(flag, Flag::Mismatch);
  }

  #[test]
  fn all_precision_pairs_match_on_equal_truncations() {
    let precisions = [
      PRECISION_MILLENNIUM,
      PRECISION_CENTURY,
      PRECISION_DECADE,
      PRECISION_YEAR,
      PRECISION_MONTH,
      PRECISION_DAY,
    ];
    for &p1 in &precisions {
      for &p2 in &precisions {
        let flag = compare_dates(
          &[dated("1867-05-14", p1)],
          &[dated("1867-05-14", p2)],
        );
        assert_eq!(flag, Flag::Match, "precisions ({p1}, {p2})");
      }
    }
  }
}
