//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{TimeZone, Utc};

use concord_core::{
  candidate::{Candidate, CandidateKind, CandidatePlace},
  curator::DomainPreferences,
  entity::{EventKind, ValidationStatus, VitalEvent},
  history::DecisionAction,
  score::dates::PRECISION_DAY,
  store::{AlignmentStore, NewEntity},
};

use crate::{Error, SqliteStore};

const BIRTH: &str = "1867-05-14";
const DEATH: &str = "1901-02-03";

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory().await.expect("in-memory store")
}

/// A TMS entity with full vital data: born in Paris, died in Lyon.
async fn seed_entity(s: &SqliteStore, tms_id: i64, domains: Option<&[&str]>) {
  let domains =
    domains.map(|d| d.iter().map(|t| t.to_string()).collect());
  s.add_entity(NewEntity {
    tms_id,
    display_name: "Jean Dupont".to_string(),
    domains,
  })
  .await
  .unwrap();
  s.add_entity_event(tms_id, VitalEvent {
    kind:      EventKind::Birth,
    date:      Some(BIRTH.to_string()),
    precision: Some(PRECISION_DAY),
    place:     Some("Paris, France".to_string()),
  })
  .await
  .unwrap();
  s.add_entity_event(tms_id, VitalEvent {
    kind:      EventKind::Death,
    date:      Some(DEATH.to_string()),
    precision: Some(PRECISION_DAY),
    place:     Some("Lyon".to_string()),
  })
  .await
  .unwrap();
}

/// A candidate engineered to reach a given aggregate against [`seed_entity`]:
/// 5 = every field agrees, 4 = birth date missing, 3 = death place disagrees.
async fn seed_candidate(s: &SqliteStore, qid: &str, total: i32) {
  s.add_candidate(Candidate {
    qid:   qid.to_string(),
    kind:  CandidateKind::Person,
    label: Some("Jean Dupont".to_string()),
  })
  .await
  .unwrap();

  if total != 4 {
    s.add_candidate_event(qid, VitalEvent {
      kind:      EventKind::Birth,
      date:      Some(BIRTH.to_string()),
      precision: Some(PRECISION_DAY),
      place:     None,
    })
    .await
    .unwrap();
  }
  s.add_candidate_event(qid, VitalEvent {
    kind:      EventKind::Death,
    date:      Some(DEATH.to_string()),
    precision: Some(PRECISION_DAY),
    place:     None,
  })
  .await
  .unwrap();

  s.add_candidate_place(qid, CandidatePlace {
    kind: EventKind::Birth,
    name: "Paris".to_string(),
  })
  .await
  .unwrap();
  let death_place = if total == 3 { "Marseille" } else { "Lyon" };
  s.add_candidate_place(qid, CandidatePlace {
    kind: EventKind::Death,
    name: death_place.to_string(),
  })
  .await
  .unwrap();
}

/// Entity + candidate + relation, ready for scoring.
async fn seed_pair(s: &SqliteStore, tms_id: i64, qid: &str, total: i32) {
  seed_entity(s, tms_id, None).await;
  seed_candidate(s, qid, total).await;
  s.add_relation(tms_id, qid, None).await.unwrap();
}

async fn curator(s: &SqliteStore, name: &str) -> i64 {
  s.add_curator(name.to_string(), DomainPreferences::All)
    .await
    .unwrap()
    .curator_id
}

// ─── ETL imports ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_entity() {
  let s = store().await;
  seed_entity(&s, 42, Some(&["painting"])).await;

  let entity = s.get_entity(42).await.unwrap().unwrap();
  assert_eq!(entity.tms_id, 42);
  assert_eq!(entity.display_name, "Jean Dupont");
  assert_eq!(entity.domains, Some(vec!["painting".to_string()]));
  assert!(entity.status.is_none());
  assert!(entity.lock.is_none());
}

#[tokio::test]
async fn get_entity_missing_returns_none() {
  let s = store().await;
  assert!(s.get_entity(999).await.unwrap().is_none());
}

#[tokio::test]
async fn curator_preferences_round_trip() {
  let s = store().await;
  let prefs = DomainPreferences::parse(&[
    "painting".to_string(),
    "untagged".to_string(),
  ])
  .unwrap();

  let created =
    s.add_curator("alice".to_string(), prefs.clone()).await.unwrap();
  let fetched = s.get_curator(created.curator_id).await.unwrap().unwrap();
  assert_eq!(fetched.name, "alice");
  assert_eq!(fetched.preferences, prefs);

  s.set_preferences(created.curator_id, DomainPreferences::All)
    .await
    .unwrap();
  let fetched = s.get_curator(created.curator_id).await.unwrap().unwrap();
  assert_eq!(fetched.preferences, DomainPreferences::All);
}

#[tokio::test]
async fn set_preferences_unknown_curator_errors() {
  let s = store().await;
  let result = s.set_preferences(999, DomainPreferences::All).await;
  assert!(matches!(result, Err(Error::CuratorNotFound(999))));
}

// ─── Batch scoring ───────────────────────────────────────────────────────────

#[tokio::test]
async fn full_agreement_scores_plus_five() {
  let s = store().await;
  seed_pair(&s, 1, "Q1", 5).await;

  let report = s.run_scoring().await.unwrap();
  assert_eq!(report.scored, 1);
  assert_eq!(report.failed, 0);

  let relations = s.relations_for_entity(1).await.unwrap();
  let flags = relations[0].flags.unwrap();
  assert_eq!(flags.total, 5);
  assert_eq!(flags.birth_place, 1);
}

#[tokio::test]
async fn engineered_aggregates_land_where_expected() {
  let s = store().await;
  seed_entity(&s, 1, None).await;
  seed_candidate(&s, "Q4", 4).await;
  seed_candidate(&s, "Q3", 3).await;
  s.add_relation(1, "Q4", None).await.unwrap();
  s.add_relation(1, "Q3", None).await.unwrap();

  s.run_scoring().await.unwrap();

  let relations = s.relations_for_entity(1).await.unwrap();
  let by_qid = |qid: &str| {
    relations.iter().find(|r| r.qid == qid).unwrap().flags.unwrap()
  };
  assert_eq!(by_qid("Q4").total, 4);
  assert_eq!(by_qid("Q4").birth_date, 0);
  assert_eq!(by_qid("Q3").total, 3);
  assert_eq!(by_qid("Q3").death_place, -1);
}

#[tokio::test]
async fn dangling_candidate_gets_the_sentinel() {
  let s = store().await;
  seed_entity(&s, 1, None).await;
  // No candidate row behind this qid.
  s.add_relation(1, "Q404", None).await.unwrap();

  let report = s.run_scoring().await.unwrap();
  assert_eq!(report.scored, 0);
  assert_eq!(report.failed, 1);

  let relations = s.relations_for_entity(1).await.unwrap();
  assert!(relations[0].flags.unwrap().is_error());
}

#[tokio::test]
async fn one_failure_never_aborts_the_batch() {
  let s = store().await;
  seed_pair(&s, 1, "Q1", 5).await;
  s.add_relation(1, "Q404", None).await.unwrap();

  let report = s.run_scoring().await.unwrap();
  assert_eq!(report.scored, 1);
  assert_eq!(report.failed, 1);
}

#[tokio::test]
async fn rescoring_replaces_the_sentinel() {
  let s = store().await;
  seed_entity(&s, 1, None).await;
  s.add_relation(1, "Q1", None).await.unwrap();
  s.run_scoring().await.unwrap();
  assert!(
    s.relations_for_entity(1).await.unwrap()[0].flags.unwrap().is_error()
  );

  // The candidate arrives in a later import; the next run heals the row.
  seed_candidate(&s, "Q1", 5).await;
  let report = s.run_scoring().await.unwrap();
  assert_eq!(report.failed, 0);
  assert_eq!(s.relations_for_entity(1).await.unwrap()[0].flags.unwrap().total, 5);
}

// ─── Scheduler ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn assigns_the_highest_level_first() {
  let s = store().await;
  seed_pair(&s, 1, "Q1", 3).await;
  seed_pair(&s, 2, "Q2", 5).await;
  s.run_scoring().await.unwrap();
  let a = curator(&s, "alice").await;

  let entity = s.next_entity(a, None).await.unwrap().unwrap();
  assert_eq!(entity.tms_id, 2);
  let lock = entity.lock.unwrap();
  assert_eq!(lock.held_by, a);
}

#[tokio::test]
async fn mean_breaks_level_ties() {
  let s = store().await;
  // Entity 10 has candidates at +5 and +3 (mean 4); entity 20 has a single
  // +5 (mean 5). Both sit at level +5; 20 wins on mean.
  seed_entity(&s, 10, None).await;
  seed_candidate(&s, "Q5", 5).await;
  seed_candidate(&s, "Q3", 3).await;
  s.add_relation(10, "Q5", None).await.unwrap();
  s.add_relation(10, "Q3", None).await.unwrap();
  seed_entity(&s, 20, None).await;
  seed_candidate(&s, "Q5b", 5).await;
  s.add_relation(20, "Q5b", None).await.unwrap();
  s.run_scoring().await.unwrap();
  let a = curator(&s, "alice").await;

  let entity = s.next_entity(a, None).await.unwrap().unwrap();
  assert_eq!(entity.tms_id, 20);
}

#[tokio::test]
async fn a_live_foreign_lock_excludes_the_entity() {
  let s = store().await;
  seed_pair(&s, 1, "Q1", 5).await;
  s.run_scoring().await.unwrap();
  let a = curator(&s, "alice").await;
  let b = curator(&s, "bob").await;

  let first = s.next_entity(a, None).await.unwrap().unwrap();
  assert_eq!(first.tms_id, 1);

  assert!(s.next_entity(b, None).await.unwrap().is_none());
}

#[tokio::test]
async fn the_holder_reacquires_its_own_lock() {
  let s = store().await;
  seed_pair(&s, 1, "Q1", 5).await;
  s.run_scoring().await.unwrap();
  let a = curator(&s, "alice").await;

  let first = s.next_entity(a, None).await.unwrap().unwrap();
  let again = s.next_entity(a, None).await.unwrap().unwrap();
  assert_eq!(first.tms_id, again.tms_id);
}

#[tokio::test]
async fn an_expired_lock_is_reclaimed() {
  let s = store().await;
  seed_pair(&s, 1, "Q1", 5).await;
  s.run_scoring().await.unwrap();
  let a = curator(&s, "alice").await;
  let b = curator(&s, "bob").await;

  let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
  s.next_entity(a, Some(t0)).await.unwrap().unwrap();

  // Five minutes in the lock still holds; past the timeout it does not.
  let soon = t0 + chrono::TimeDelta::minutes(5);
  assert!(s.next_entity(b, Some(soon)).await.unwrap().is_none());

  let later = t0 + chrono::TimeDelta::minutes(16);
  let entity = s.next_entity(b, Some(later)).await.unwrap().unwrap();
  assert_eq!(entity.tms_id, 1);
  assert_eq!(entity.lock.unwrap().held_by, b);
}

#[tokio::test]
async fn skipping_removes_the_entity_from_that_curators_pool_only() {
  let s = store().await;
  seed_pair(&s, 1, "Q1", 5).await;
  s.run_scoring().await.unwrap();
  let a = curator(&s, "alice").await;
  let b = curator(&s, "bob").await;

  s.next_entity(a, None).await.unwrap().unwrap();
  s.record_skip(1, a).await.unwrap();

  assert!(s.next_entity(a, None).await.unwrap().is_none());
  let entity = s.next_entity(b, None).await.unwrap().unwrap();
  assert_eq!(entity.tms_id, 1);
}

#[tokio::test]
async fn preferences_filter_the_pool() {
  let s = store().await;
  seed_entity(&s, 1, Some(&["painting"])).await;
  seed_entity(&s, 2, None).await;
  seed_candidate(&s, "Q1", 5).await;
  s.add_relation(1, "Q1", None).await.unwrap();
  s.add_relation(2, "Q1", None).await.unwrap();
  s.run_scoring().await.unwrap();

  let sculptor = s
    .add_curator(
      "bob".to_string(),
      DomainPreferences::parse(&[
        "sculpture".to_string(),
        "untagged".to_string(),
      ])
      .unwrap(),
    )
    .await
    .unwrap()
    .curator_id;
  let painter = s
    .add_curator(
      "carol".to_string(),
      DomainPreferences::parse(&["painting".to_string()]).unwrap(),
    )
    .await
    .unwrap()
    .curator_id;

  // The sculptor only qualifies for the untagged entity, the painter only
  // for the tagged one.
  let entity = s.next_entity(sculptor, None).await.unwrap().unwrap();
  assert_eq!(entity.tms_id, 2);
  let entity = s.next_entity(painter, None).await.unwrap().unwrap();
  assert_eq!(entity.tms_id, 1);
}

#[tokio::test]
async fn reviewed_and_community_matched_entities_are_out_of_the_pool() {
  let s = store().await;
  seed_pair(&s, 1, "Q1", 5).await;
  s.run_scoring().await.unwrap();
  let a = curator(&s, "alice").await;

  s.set_status(1, Some(ValidationStatus::CommunityMatched)).await.unwrap();
  assert!(s.next_entity(a, None).await.unwrap().is_none());

  s.set_status(1, None).await.unwrap();
  assert!(s.next_entity(a, None).await.unwrap().is_some());
}

#[tokio::test]
async fn unscored_relations_are_never_assigned() {
  let s = store().await;
  seed_pair(&s, 1, "Q1", 5).await;
  // No scoring run.
  let a = curator(&s, "alice").await;
  assert!(s.next_entity(a, None).await.unwrap().is_none());
}

#[tokio::test]
async fn scheduling_for_an_unknown_curator_errors() {
  let s = store().await;
  let result = s.next_entity(999, None).await;
  assert!(matches!(result, Err(Error::CuratorNotFound(999))));
}

// ─── Decision ledger ─────────────────────────────────────────────────────────

#[tokio::test]
async fn validation_splits_history_and_aligns() {
  let s = store().await;
  seed_entity(&s, 1, None).await;
  seed_candidate(&s, "Q1", 5).await;
  seed_candidate(&s, "Q2", 3).await;
  s.add_relation(1, "Q1", None).await.unwrap();
  s.add_relation(1, "Q2", None).await.unwrap();
  s.run_scoring().await.unwrap();
  let a = curator(&s, "alice").await;
  s.next_entity(a, None).await.unwrap().unwrap();

  let summary =
    s.record_validation(1, a, &["Q1".to_string()]).await.unwrap();
  assert_eq!(summary.validated, 1);
  assert_eq!(summary.refused, 1);
  assert_eq!(summary.skipped, 0);

  let entity = s.get_entity(1).await.unwrap().unwrap();
  assert_eq!(entity.status, Some(ValidationStatus::Aligned));
  assert!(entity.lock.is_none());

  let history = s.history_for_entity(1).await.unwrap();
  assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn refusing_all_marks_not_aligned() {
  let s = store().await;
  seed_pair(&s, 1, "Q1", 5).await;
  s.run_scoring().await.unwrap();
  let a = curator(&s, "alice").await;

  let summary = s.record_refuse_all(1, a).await.unwrap();
  assert_eq!(summary.refused, 1);

  let entity = s.get_entity(1).await.unwrap().unwrap();
  assert_eq!(entity.status, Some(ValidationStatus::NotAligned));
}

#[tokio::test]
async fn skipping_leaves_the_status_unset() {
  let s = store().await;
  seed_pair(&s, 1, "Q1", 5).await;
  s.run_scoring().await.unwrap();
  let a = curator(&s, "alice").await;
  s.next_entity(a, None).await.unwrap().unwrap();

  let summary = s.record_skip(1, a).await.unwrap();
  assert_eq!(summary.skipped, 1);

  let entity = s.get_entity(1).await.unwrap().unwrap();
  assert!(entity.status.is_none());
  assert!(entity.lock.is_none());
}

#[tokio::test]
async fn validating_an_empty_selection_is_rejected() {
  let s = store().await;
  seed_pair(&s, 1, "Q1", 5).await;
  s.run_scoring().await.unwrap();
  let a = curator(&s, "alice").await;

  // Aligning while refusing every candidate would be contradictory; the
  // caller meant refuse-all.
  let result = s.record_validation(1, a, &[]).await;
  assert!(matches!(result, Err(Error::EmptySelection(1))));

  let entity = s.get_entity(1).await.unwrap().unwrap();
  assert!(entity.status.is_none());
  assert!(s.history_for_entity(1).await.unwrap().is_empty());
}

#[tokio::test]
async fn deciding_without_relations_errors() {
  let s = store().await;
  seed_entity(&s, 1, None).await;
  let a = curator(&s, "alice").await;

  let result = s.record_refuse_all(1, a).await;
  assert!(matches!(result, Err(Error::NoRelations(1))));
}

#[tokio::test]
async fn undo_removes_the_rows_and_clears_the_status() {
  let s = store().await;
  seed_entity(&s, 1, None).await;
  seed_candidate(&s, "Q1", 5).await;
  seed_candidate(&s, "Q2", 3).await;
  s.add_relation(1, "Q1", None).await.unwrap();
  s.add_relation(1, "Q2", None).await.unwrap();
  s.run_scoring().await.unwrap();
  let a = curator(&s, "alice").await;
  s.record_validation(1, a, &["Q1".to_string()]).await.unwrap();

  let summary = s
    .undo(1, a, &[DecisionAction::Validated, DecisionAction::Refused])
    .await
    .unwrap();
  assert_eq!(summary.validated, 1);
  assert_eq!(summary.refused, 1);
  assert_eq!(summary.total(), 2);

  assert!(s.history_for_entity(1).await.unwrap().is_empty());
  let entity = s.get_entity(1).await.unwrap().unwrap();
  assert!(entity.status.is_none());

  // The entity is schedulable again.
  assert!(s.next_entity(a, None).await.unwrap().is_some());
}

#[tokio::test]
async fn undo_touches_only_the_requested_kinds() {
  let s = store().await;
  seed_entity(&s, 1, None).await;
  seed_candidate(&s, "Q1", 5).await;
  seed_candidate(&s, "Q2", 3).await;
  s.add_relation(1, "Q1", None).await.unwrap();
  s.add_relation(1, "Q2", None).await.unwrap();
  s.run_scoring().await.unwrap();
  let a = curator(&s, "alice").await;
  s.record_validation(1, a, &["Q1".to_string()]).await.unwrap();

  let summary = s.undo(1, a, &[DecisionAction::Refused]).await.unwrap();
  assert_eq!(summary.refused, 1);
  assert_eq!(summary.validated, 0);

  let history = s.history_for_entity(1).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].action, DecisionAction::Validated);
}

#[tokio::test]
async fn undo_does_not_touch_other_curators_decisions() {
  let s = store().await;
  seed_pair(&s, 1, "Q1", 5).await;
  s.run_scoring().await.unwrap();
  let a = curator(&s, "alice").await;
  let b = curator(&s, "bob").await;
  s.next_entity(a, None).await.unwrap().unwrap();
  s.record_skip(1, a).await.unwrap();

  let result = s.undo(1, b, &[DecisionAction::Skipped]).await;
  assert!(matches!(result, Err(Error::NothingToUndo(1))));
  assert_eq!(s.history_for_entity(1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn undo_with_nothing_recorded_errors() {
  let s = store().await;
  seed_pair(&s, 1, "Q1", 5).await;
  let a = curator(&s, "alice").await;

  let result = s.undo(1, a, &[DecisionAction::Validated]).await;
  assert!(matches!(result, Err(Error::NothingToUndo(1))));
}
