//! [`SqliteStore`] — the SQLite implementation of [`AlignmentStore`].

use std::{collections::BTreeSet, path::Path};

use chrono::{DateTime, TimeDelta, Utc};
use rusqlite::OptionalExtension as _;

use concord_core::{
  candidate::{Candidate, CandidatePlace},
  curator::{Curator, DomainPreferences},
  entity::{EventKind, TmsEntity, ValidationStatus, VitalEvent},
  history::{
    DecisionAction, DecisionSummary, HistoryEntry, UndoSummary,
  },
  relation::{FieldScores, MatchRelation},
  schedule::{self, EntityScores},
  score::{dates::DatedValue, score_relation, RelationFacts, ScoringReport},
  store::{AlignmentStore, NewEntity},
};

use crate::{
  encode::{
    decode_candidate_kind, decode_domains, decode_preferences, encode_candidate_kind,
    encode_domains, encode_dt, encode_event_kind, encode_preferences, encode_status,
    RawCurator, RawEntity, RawHistory, RawRelation,
  },
  schema::SCHEMA,
  Error, Result,
};

/// How long a curator may sit on an assigned entity before the lock is
/// treated as abandoned.
pub const DEFAULT_INACTIVITY_TIMEOUT: TimeDelta =
  match TimeDelta::new(15 * 60, 0) {
    Some(t) => t,
    None => panic!("constant timeout is in range"),
  };

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Concord alignment store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. The single
/// connection also serialises the read-then-write transactions of the
/// scheduler and ledger, which is what makes the cooperative locks sound.
#[derive(Clone)]
pub struct SqliteStore {
  conn:    tokio_rusqlite::Connection,
  timeout: TimeDelta,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(
    path: impl AsRef<Path>,
    timeout: TimeDelta,
  ) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, timeout };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store with the default timeout — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    Self::open_in_memory_with_timeout(DEFAULT_INACTIVITY_TIMEOUT).await
  }

  pub async fn open_in_memory_with_timeout(
    timeout: TimeDelta,
  ) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, timeout };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Shared body of the three decision-recording operations. One transaction:
  /// curator and entity checks, one history row per relation, the status
  /// write, the lock release.
  async fn record_decision(
    &self,
    tms_id: i64,
    curator_id: i64,
    mode: DecisionMode,
  ) -> Result<DecisionSummary> {
    if let DecisionMode::Validate(selected) = &mode
      && selected.is_empty()
    {
      return Err(Error::EmptySelection(tms_id));
    }

    let now_str = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        if !curator_exists(&tx, curator_id)? {
          return Ok(LedgerOutcome::NoCurator);
        }
        if !entity_exists(&tx, tms_id)? {
          return Ok(LedgerOutcome::NoEntity);
        }

        let relations: Vec<(i64, String)> = {
          let mut stmt = tx.prepare(
            "SELECT match_id, qid FROM match_relations WHERE tms_id = ?1
             ORDER BY match_id",
          )?;
          let rows = stmt
            .query_map(rusqlite::params![tms_id], |r| {
              Ok((r.get(0)?, r.get(1)?))
            })?
            .collect::<rusqlite::Result<_>>()?;
          rows
        };

        if relations.is_empty() {
          return Ok(LedgerOutcome::NoRelations);
        }

        let mut summary = DecisionSummary::default();
        for (match_id, qid) in &relations {
          let action = match &mode {
            DecisionMode::Validate(selected) => {
              if selected.contains(qid) {
                DecisionAction::Validated
              } else {
                DecisionAction::Refused
              }
            }
            DecisionMode::RefuseAll => DecisionAction::Refused,
            DecisionMode::Skip => DecisionAction::Skipped,
          };
          match action {
            DecisionAction::Validated => summary.validated += 1,
            DecisionAction::Refused => summary.refused += 1,
            DecisionAction::Skipped => summary.skipped += 1,
          }
          tx.execute(
            "INSERT INTO history (curator_id, match_id, action, recorded_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![curator_id, match_id, action.as_str(), now_str],
          )?;
        }

        let status = match &mode {
          DecisionMode::Validate(_) => Some(ValidationStatus::Aligned),
          DecisionMode::RefuseAll => Some(ValidationStatus::NotAligned),
          DecisionMode::Skip => None,
        };
        if let Some(status) = status {
          tx.execute(
            "UPDATE tms_entities SET status = ?2 WHERE tms_id = ?1",
            rusqlite::params![tms_id, encode_status(status)],
          )?;
        }

        tx.execute(
          "UPDATE tms_entities SET locked_by = NULL, locked_at = NULL
           WHERE tms_id = ?1",
          rusqlite::params![tms_id],
        )?;

        tx.commit()?;
        Ok(LedgerOutcome::Recorded(summary))
      })
      .await?;

    match outcome {
      LedgerOutcome::NoCurator => Err(Error::CuratorNotFound(curator_id)),
      LedgerOutcome::NoEntity => Err(Error::EntityNotFound(tms_id)),
      LedgerOutcome::NoRelations => Err(Error::NoRelations(tms_id)),
      LedgerOutcome::Recorded(summary) => Ok(summary),
    }
  }
}

/// Which of the three decisions is being recorded.
enum DecisionMode {
  /// Validate the listed qids, refuse every other candidate.
  Validate(Vec<String>),
  RefuseAll,
  Skip,
}

/// Transaction result carried out of the `conn.call` closure; mapped to a
/// domain error (or a summary) on the async side.
enum LedgerOutcome {
  NoCurator,
  NoEntity,
  NoRelations,
  Recorded(DecisionSummary),
}

enum NextOutcome {
  NoCurator,
  Nothing,
  Assigned(RawEntity),
}

enum UndoOutcome {
  NoCurator,
  NoEntity,
  NothingMatched,
  Undone(UndoSummary),
}

// ─── AlignmentStore impl ─────────────────────────────────────────────────────

impl AlignmentStore for SqliteStore {
  type Error = Error;

  // ── Curators ──────────────────────────────────────────────────────────────

  async fn add_curator(
    &self,
    name: String,
    preferences: DomainPreferences,
  ) -> Result<Curator> {
    let created_at = Utc::now();
    let prefs_str = encode_preferences(&preferences)?;
    let at_str = encode_dt(created_at);

    let insert_name = name.clone();
    let curator_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO curators (name, preferences, created_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![insert_name, prefs_str, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Curator { curator_id, name, preferences, created_at })
  }

  async fn get_curator(&self, curator_id: i64) -> Result<Option<Curator>> {
    let raw: Option<RawCurator> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            "SELECT curator_id, name, preferences, created_at
             FROM curators WHERE curator_id = ?1",
            rusqlite::params![curator_id],
            |r| {
              Ok(RawCurator {
                curator_id:  r.get(0)?,
                name:        r.get(1)?,
                preferences: r.get(2)?,
                created_at:  r.get(3)?,
              })
            },
          )
          .optional()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawCurator::into_curator).transpose()
  }

  async fn set_preferences(
    &self,
    curator_id: i64,
    preferences: DomainPreferences,
  ) -> Result<()> {
    let prefs_str = encode_preferences(&preferences)?;

    let affected = self
      .conn
      .call(move |conn| {
        let affected = conn.execute(
          "UPDATE curators SET preferences = ?2 WHERE curator_id = ?1",
          rusqlite::params![curator_id, prefs_str],
        )?;
        Ok(affected)
      })
      .await?;

    if affected == 0 {
      return Err(Error::CuratorNotFound(curator_id));
    }
    Ok(())
  }

  // ── ETL imports ───────────────────────────────────────────────────────────

  async fn add_entity(&self, input: NewEntity) -> Result<TmsEntity> {
    let domains_str =
      input.domains.as_deref().map(encode_domains).transpose()?;
    let tms_id = input.tms_id;
    let insert_name = input.display_name.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO tms_entities (tms_id, display_name, domains)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![tms_id, insert_name, domains_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(TmsEntity {
      tms_id:       input.tms_id,
      display_name: input.display_name,
      domains:      input.domains,
      status:       None,
      lock:         None,
    })
  }

  async fn get_entity(&self, tms_id: i64) -> Result<Option<TmsEntity>> {
    let raw: Option<RawEntity> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            "SELECT tms_id, display_name, domains, status, locked_by, locked_at
             FROM tms_entities WHERE tms_id = ?1",
            rusqlite::params![tms_id],
            entity_row,
          )
          .optional()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawEntity::into_entity).transpose()
  }

  async fn add_entity_event(
    &self,
    tms_id: i64,
    event: VitalEvent,
  ) -> Result<()> {
    let kind_str = encode_event_kind(event.kind);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO tms_events (tms_id, kind, date, precision, place)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            tms_id,
            kind_str,
            event.date,
            event.precision,
            event.place,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn add_candidate(&self, candidate: Candidate) -> Result<()> {
    let kind_str = encode_candidate_kind(candidate.kind);

    self
      .conn
      .call(move |conn| {
        // Re-imports refresh the label and kind in place.
        conn.execute(
          "INSERT INTO candidates (qid, kind, label) VALUES (?1, ?2, ?3)
           ON CONFLICT (qid) DO UPDATE
           SET kind = excluded.kind, label = excluded.label",
          rusqlite::params![candidate.qid, kind_str, candidate.label],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_candidate(&self, qid: &str) -> Result<Option<Candidate>> {
    let qid_owned = qid.to_string();

    let raw: Option<(String, String, Option<String>)> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            "SELECT qid, kind, label FROM candidates WHERE qid = ?1",
            rusqlite::params![qid_owned],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
          )
          .optional()?;
        Ok(raw)
      })
      .await?;

    raw
      .map(|(qid, kind_str, label)| {
        Ok(Candidate { qid, kind: decode_candidate_kind(&kind_str)?, label })
      })
      .transpose()
  }

  async fn add_candidate_event(
    &self,
    qid: &str,
    event: VitalEvent,
  ) -> Result<()> {
    let qid_owned = qid.to_string();
    let kind_str = encode_event_kind(event.kind);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO candidate_events (qid, kind, date, precision)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![qid_owned, kind_str, event.date, event.precision],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn add_candidate_place(
    &self,
    qid: &str,
    place: CandidatePlace,
  ) -> Result<()> {
    let qid_owned = qid.to_string();
    let kind_str = encode_event_kind(place.kind);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO candidate_places (qid, kind, name) VALUES (?1, ?2, ?3)",
          rusqlite::params![qid_owned, kind_str, place.name],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn add_relation(
    &self,
    tms_id: i64,
    qid: &str,
    api_score: Option<f64>,
  ) -> Result<MatchRelation> {
    let qid_owned = qid.to_string();
    let insert_qid = qid_owned.clone();

    let match_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO match_relations (tms_id, qid, api_score)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![tms_id, insert_qid, api_score],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(MatchRelation {
      match_id,
      tms_id,
      qid: qid_owned,
      api_score,
      flags: None,
    })
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn relations_for_entity(
    &self,
    tms_id: i64,
  ) -> Result<Vec<MatchRelation>> {
    let raws: Vec<RawRelation> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT match_id, tms_id, qid, api_score,
                  flag_birth_date, flag_death_date, flag_birth_place,
                  flag_death_place, flag_name, flag_total
           FROM match_relations WHERE tms_id = ?1 ORDER BY match_id",
        )?;
        let raws = stmt
          .query_map(rusqlite::params![tms_id], relation_row)?
          .collect::<rusqlite::Result<_>>()?;
        Ok(raws)
      })
      .await?;

    Ok(raws.into_iter().map(RawRelation::into_relation).collect())
  }

  async fn history_for_entity(
    &self,
    tms_id: i64,
  ) -> Result<Vec<HistoryEntry>> {
    let raws: Vec<RawHistory> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT h.history_id, h.curator_id, h.match_id, h.action,
                  h.recorded_at
           FROM history h
           JOIN match_relations r ON r.match_id = h.match_id
           WHERE r.tms_id = ?1
           ORDER BY h.history_id",
        )?;
        let raws = stmt
          .query_map(rusqlite::params![tms_id], |r| {
            Ok(RawHistory {
              history_id:  r.get(0)?,
              curator_id:  r.get(1)?,
              match_id:    r.get(2)?,
              action:      r.get(3)?,
              recorded_at: r.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<_>>()?;
        Ok(raws)
      })
      .await?;

    raws.into_iter().map(RawHistory::into_entry).collect()
  }

  // ── Batch scoring ─────────────────────────────────────────────────────────

  async fn run_scoring(&self) -> Result<ScoringReport> {
    let report = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let relations: Vec<(i64, i64, String)> = {
          let mut stmt = tx.prepare(
            "SELECT match_id, tms_id, qid FROM match_relations
             ORDER BY match_id",
          )?;
          let rows = stmt
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?
            .collect::<rusqlite::Result<_>>()?;
          rows
        };

        let mut report = ScoringReport::default();
        for (match_id, tms_id, qid) in relations {
          let scores = match gather_facts(&tx, tms_id, &qid)? {
            Some(facts) => {
              report.scored += 1;
              score_relation(&facts)
            }
            // Dangling qid or entity row: isolate with the sentinel.
            None => {
              report.failed += 1;
              FieldScores::error()
            }
          };
          tx.execute(
            "UPDATE match_relations
             SET flag_birth_date = ?1, flag_death_date = ?2,
                 flag_birth_place = ?3, flag_death_place = ?4,
                 flag_name = ?5, flag_total = ?6
             WHERE match_id = ?7",
            rusqlite::params![
              scores.birth_date,
              scores.death_date,
              scores.birth_place,
              scores.death_place,
              scores.name,
              scores.total,
              match_id,
            ],
          )?;
        }

        tx.commit()?;
        Ok(report)
      })
      .await?;

    tracing::info!(
      scored = report.scored,
      failed = report.failed,
      "batch scoring complete",
    );
    Ok(report)
  }

  // ── Scheduler ─────────────────────────────────────────────────────────────

  async fn next_entity(
    &self,
    curator_id: i64,
    now: Option<DateTime<Utc>>,
  ) -> Result<Option<TmsEntity>> {
    let now = now.unwrap_or_else(Utc::now);
    let now_str = encode_dt(now);
    let threshold_str = encode_dt(now - self.timeout);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let prefs_str: Option<String> = tx
          .query_row(
            "SELECT preferences FROM curators WHERE curator_id = ?1",
            rusqlite::params![curator_id],
            |r| r.get(0),
          )
          .optional()?;
        let Some(prefs_str) = prefs_str else {
          return Ok(NextOutcome::NoCurator);
        };
        let prefs = decode_preferences(&prefs_str).map_err(other_err)?;

        // Stale locks expire for everyone, not just this curator.
        tx.execute(
          "UPDATE tms_entities SET locked_by = NULL, locked_at = NULL
           WHERE locked_at IS NOT NULL AND locked_at < ?1",
          rusqlite::params![threshold_str],
        )?;

        // Unreviewed, not locked by someone else, and not previously skipped
        // by this curator. Preference filtering happens below, on the
        // decoded tag lists.
        let candidates: Vec<(i64, Option<String>)> = {
          let mut stmt = tx.prepare(
            "SELECT tms_id, domains FROM tms_entities
             WHERE status IS NULL
               AND (locked_by IS NULL OR locked_by = ?1)
               AND tms_id NOT IN (
                 SELECT r.tms_id FROM match_relations r
                 JOIN history h ON h.match_id = r.match_id
                 WHERE h.curator_id = ?1 AND h.action = 'skipped'
               )",
          )?;
          let rows = stmt
            .query_map(rusqlite::params![curator_id], |r| {
              Ok((r.get(0)?, r.get(1)?))
            })?
            .collect::<rusqlite::Result<_>>()?;
          rows
        };

        let mut groups = Vec::new();
        {
          let mut stmt = tx.prepare(
            "SELECT flag_total FROM match_relations WHERE tms_id = ?1",
          )?;
          for (tms_id, domains_str) in candidates {
            let domains = domains_str
              .as_deref()
              .map(decode_domains)
              .transpose()
              .map_err(other_err)?;
            if !prefs.matches(domains.as_deref()) {
              continue;
            }

            let totals: Vec<Option<i32>> = stmt
              .query_map(rusqlite::params![tms_id], |r| r.get(0))?
              .collect::<rusqlite::Result<_>>()?;
            groups.push(EntityScores { tms_id, totals });
          }
        }

        let Some(winner) = schedule::pick_entity(&groups) else {
          tx.commit()?;
          return Ok(NextOutcome::Nothing);
        };

        tx.execute(
          "UPDATE tms_entities SET locked_by = ?2, locked_at = ?3
           WHERE tms_id = ?1",
          rusqlite::params![winner, curator_id, now_str],
        )?;

        let raw = tx.query_row(
          "SELECT tms_id, display_name, domains, status, locked_by, locked_at
           FROM tms_entities WHERE tms_id = ?1",
          rusqlite::params![winner],
          entity_row,
        )?;

        tx.commit()?;
        Ok(NextOutcome::Assigned(raw))
      })
      .await?;

    match outcome {
      NextOutcome::NoCurator => Err(Error::CuratorNotFound(curator_id)),
      NextOutcome::Nothing => Ok(None),
      NextOutcome::Assigned(raw) => Ok(Some(raw.into_entity()?)),
    }
  }

  // ── Decision ledger ───────────────────────────────────────────────────────

  async fn record_validation(
    &self,
    tms_id: i64,
    curator_id: i64,
    selected_qids: &[String],
  ) -> Result<DecisionSummary> {
    self
      .record_decision(
        tms_id,
        curator_id,
        DecisionMode::Validate(selected_qids.to_vec()),
      )
      .await
  }

  async fn record_refuse_all(
    &self,
    tms_id: i64,
    curator_id: i64,
  ) -> Result<DecisionSummary> {
    self.record_decision(tms_id, curator_id, DecisionMode::RefuseAll).await
  }

  async fn record_skip(
    &self,
    tms_id: i64,
    curator_id: i64,
  ) -> Result<DecisionSummary> {
    self.record_decision(tms_id, curator_id, DecisionMode::Skip).await
  }

  async fn undo(
    &self,
    tms_id: i64,
    curator_id: i64,
    kinds: &[DecisionAction],
  ) -> Result<UndoSummary> {
    let kind_strs: BTreeSet<&'static str> =
      kinds.iter().map(DecisionAction::as_str).collect();
    if kind_strs.is_empty() {
      return Err(Error::NothingToUndo(tms_id));
    }

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        if !curator_exists(&tx, curator_id)? {
          return Ok(UndoOutcome::NoCurator);
        }
        if !entity_exists(&tx, tms_id)? {
          return Ok(UndoOutcome::NoEntity);
        }

        let placeholders = vec!["?"; kind_strs.len()].join(", ");
        let sql = format!(
          "SELECT h.history_id, h.action FROM history h
           JOIN match_relations r ON r.match_id = h.match_id
           WHERE r.tms_id = ? AND h.curator_id = ? AND h.action IN ({placeholders})",
        );

        let mut params: Vec<Box<dyn rusqlite::ToSql>> =
          vec![Box::new(tms_id), Box::new(curator_id)];
        for kind in &kind_strs {
          params.push(Box::new(*kind));
        }

        let matched: Vec<(i64, String)> = {
          let mut stmt = tx.prepare(&sql)?;
          let rows = stmt
            .query_map(
              rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
              |r| Ok((r.get(0)?, r.get(1)?)),
            )?
            .collect::<rusqlite::Result<_>>()?;
          rows
        };

        if matched.is_empty() {
          return Ok(UndoOutcome::NothingMatched);
        }

        let mut summary = UndoSummary::default();
        for (_, action) in &matched {
          match action.as_str() {
            "validated" => summary.validated += 1,
            "refused" => summary.refused += 1,
            _ => summary.skipped += 1,
          }
        }

        // history_id values come from our own select, never from input.
        let ids: Vec<String> =
          matched.iter().map(|(id, _)| id.to_string()).collect();
        tx.execute(
          &format!(
            "DELETE FROM history WHERE history_id IN ({})",
            ids.join(", "),
          ),
          [],
        )?;

        tx.execute(
          "UPDATE tms_entities SET status = NULL WHERE tms_id = ?1",
          rusqlite::params![tms_id],
        )?;

        tx.commit()?;
        Ok(UndoOutcome::Undone(summary))
      })
      .await?;

    match outcome {
      UndoOutcome::NoCurator => Err(Error::CuratorNotFound(curator_id)),
      UndoOutcome::NoEntity => Err(Error::EntityNotFound(tms_id)),
      UndoOutcome::NothingMatched => Err(Error::NothingToUndo(tms_id)),
      UndoOutcome::Undone(summary) => Ok(summary),
    }
  }

  async fn set_status(
    &self,
    tms_id: i64,
    status: Option<ValidationStatus>,
  ) -> Result<()> {
    let status_str = status.map(encode_status);

    let affected = self
      .conn
      .call(move |conn| {
        let affected = conn.execute(
          "UPDATE tms_entities SET status = ?2 WHERE tms_id = ?1",
          rusqlite::params![tms_id, status_str],
        )?;
        Ok(affected)
      })
      .await?;

    if affected == 0 {
      return Err(Error::EntityNotFound(tms_id));
    }
    Ok(())
  }
}

// ─── Row mappers and transaction helpers ─────────────────────────────────────

fn entity_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<RawEntity> {
  Ok(RawEntity {
    tms_id:       r.get(0)?,
    display_name: r.get(1)?,
    domains:      r.get(2)?,
    status:       r.get(3)?,
    locked_by:    r.get(4)?,
    locked_at:    r.get(5)?,
  })
}

fn relation_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<RawRelation> {
  Ok(RawRelation {
    match_id:    r.get(0)?,
    tms_id:      r.get(1)?,
    qid:         r.get(2)?,
    api_score:   r.get(3)?,
    birth_date:  r.get(4)?,
    death_date:  r.get(5)?,
    birth_place: r.get(6)?,
    death_place: r.get(7)?,
    name:        r.get(8)?,
    total:       r.get(9)?,
  })
}

fn curator_exists(
  tx: &rusqlite::Transaction<'_>,
  curator_id: i64,
) -> rusqlite::Result<bool> {
  Ok(
    tx.query_row(
      "SELECT 1 FROM curators WHERE curator_id = ?1",
      rusqlite::params![curator_id],
      |_| Ok(true),
    )
    .optional()?
    .unwrap_or(false),
  )
}

fn entity_exists(
  tx: &rusqlite::Transaction<'_>,
  tms_id: i64,
) -> rusqlite::Result<bool> {
  Ok(
    tx.query_row(
      "SELECT 1 FROM tms_entities WHERE tms_id = ?1",
      rusqlite::params![tms_id],
      |_| Ok(true),
    )
    .optional()?
    .unwrap_or(false),
  )
}

/// Pull everything the comparators need for one relation. `None` when the
/// entity or candidate row is missing, which the caller scores with the
/// error sentinel.
fn gather_facts(
  tx: &rusqlite::Transaction<'_>,
  tms_id: i64,
  qid: &str,
) -> rusqlite::Result<Option<RelationFacts>> {
  let tms_name: Option<String> = tx
    .query_row(
      "SELECT display_name FROM tms_entities WHERE tms_id = ?1",
      rusqlite::params![tms_id],
      |r| r.get(0),
    )
    .optional()?;
  let Some(tms_name) = tms_name else {
    return Ok(None);
  };

  let candidate: Option<Option<String>> = tx
    .query_row(
      "SELECT label FROM candidates WHERE qid = ?1",
      rusqlite::params![qid],
      |r| r.get(0),
    )
    .optional()?;
  let Some(candidate_label) = candidate else {
    return Ok(None);
  };

  let mut facts = RelationFacts {
    candidate_label,
    tms_name,
    ..RelationFacts::default()
  };

  {
    let mut stmt = tx.prepare(
      "SELECT kind, date, precision, place FROM tms_events WHERE tms_id = ?1",
    )?;
    let rows = stmt.query_map(rusqlite::params![tms_id], |r| {
      Ok((
        r.get::<_, String>(0)?,
        r.get::<_, Option<String>>(1)?,
        r.get::<_, Option<u8>>(2)?,
        r.get::<_, Option<String>>(3)?,
      ))
    })?;
    for row in rows {
      let (kind_str, date, precision, place) = row?;
      let Some(kind) = event_kind(&kind_str) else { continue };
      let (dates, places) = match kind {
        EventKind::Birth => {
          (&mut facts.tms_birth_dates, &mut facts.tms_birth_places)
        }
        EventKind::Death => {
          (&mut facts.tms_death_dates, &mut facts.tms_death_places)
        }
      };
      if let Some(date) = date {
        dates.push(DatedValue::new(date, precision));
      }
      if let Some(place) = place {
        places.push(place);
      }
    }
  }

  {
    let mut stmt = tx.prepare(
      "SELECT kind, date, precision FROM candidate_events WHERE qid = ?1",
    )?;
    let rows = stmt.query_map(rusqlite::params![qid], |r| {
      Ok((
        r.get::<_, String>(0)?,
        r.get::<_, Option<String>>(1)?,
        r.get::<_, Option<u8>>(2)?,
      ))
    })?;
    for row in rows {
      let (kind_str, date, precision) = row?;
      let Some(kind) = event_kind(&kind_str) else { continue };
      if let Some(date) = date {
        let dates = match kind {
          EventKind::Birth => &mut facts.candidate_birth_dates,
          EventKind::Death => &mut facts.candidate_death_dates,
        };
        dates.push(DatedValue::new(date, precision));
      }
    }
  }

  {
    let mut stmt = tx
      .prepare("SELECT kind, name FROM candidate_places WHERE qid = ?1")?;
    let rows = stmt.query_map(rusqlite::params![qid], |r| {
      Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
    })?;
    for row in rows {
      let (kind_str, name) = row?;
      let Some(kind) = event_kind(&kind_str) else { continue };
      let places = match kind {
        EventKind::Birth => &mut facts.candidate_birth_places,
        EventKind::Death => &mut facts.candidate_death_places,
      };
      places.push(name);
    }
  }

  Ok(Some(facts))
}

fn event_kind(s: &str) -> Option<EventKind> {
  match s {
    "birth" => Some(EventKind::Birth),
    "death" => Some(EventKind::Death),
    _ => None,
  }
}

fn other_err(e: Error) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(e))
}
