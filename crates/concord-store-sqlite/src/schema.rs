//! SQL schema for the Concord SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS curators (
    curator_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    preferences TEXT NOT NULL,        -- JSON DomainPreferences
    created_at  TEXT NOT NULL         -- ISO 8601 UTC
);

CREATE TABLE IF NOT EXISTS tms_entities (
    tms_id       INTEGER PRIMARY KEY, -- catalog key, assigned by the ETL
    display_name TEXT NOT NULL,
    domains      TEXT,                -- JSON array of tags; NULL = untagged
    status       TEXT,                -- 'aligned' | 'not_aligned' | 'community_matched'
    locked_by    INTEGER REFERENCES curators(curator_id),
    locked_at    TEXT
);

CREATE TABLE IF NOT EXISTS tms_events (
    event_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    tms_id    INTEGER NOT NULL REFERENCES tms_entities(tms_id),
    kind      TEXT NOT NULL,          -- 'birth' | 'death'
    date      TEXT,
    precision INTEGER,
    place     TEXT
);

CREATE TABLE IF NOT EXISTS candidates (
    qid   TEXT PRIMARY KEY,
    kind  TEXT NOT NULL,              -- 'person' | 'other'
    label TEXT
);

CREATE TABLE IF NOT EXISTS candidate_events (
    event_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    qid       TEXT NOT NULL REFERENCES candidates(qid),
    kind      TEXT NOT NULL,
    date      TEXT,
    precision INTEGER
);

CREATE TABLE IF NOT EXISTS candidate_places (
    place_id INTEGER PRIMARY KEY AUTOINCREMENT,
    qid      TEXT NOT NULL REFERENCES candidates(qid),
    kind     TEXT NOT NULL,
    name     TEXT NOT NULL
);

-- Deliberately no foreign key on qid: the ETL can emit a relation before
-- (or without) its candidate row, and batch scoring isolates the orphan
-- with the error sentinel instead of rejecting the import.
CREATE TABLE IF NOT EXISTS match_relations (
    match_id         INTEGER PRIMARY KEY AUTOINCREMENT,
    tms_id           INTEGER NOT NULL REFERENCES tms_entities(tms_id),
    qid              TEXT NOT NULL,
    api_score        REAL,
    flag_birth_date  INTEGER,
    flag_death_date  INTEGER,
    flag_birth_place INTEGER,
    flag_death_place INTEGER,
    flag_name        INTEGER,
    flag_total       INTEGER,
    UNIQUE (tms_id, qid)
);

CREATE TABLE IF NOT EXISTS history (
    history_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    curator_id  INTEGER NOT NULL REFERENCES curators(curator_id),
    match_id    INTEGER NOT NULL REFERENCES match_relations(match_id),
    action      TEXT NOT NULL,        -- 'validated' | 'refused' | 'skipped'
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS tms_events_entity_idx    ON tms_events(tms_id);
CREATE INDEX IF NOT EXISTS candidate_events_qid_idx ON candidate_events(qid);
CREATE INDEX IF NOT EXISTS candidate_places_qid_idx ON candidate_places(qid);
CREATE INDEX IF NOT EXISTS relations_entity_idx     ON match_relations(tms_id);
CREATE INDEX IF NOT EXISTS relations_total_idx      ON match_relations(flag_total);
CREATE INDEX IF NOT EXISTS history_match_idx        ON history(match_id);
CREATE INDEX IF NOT EXISTS history_curator_idx      ON history(curator_id);

PRAGMA user_version = 1;
";
