//! Curators and their documentation-domain preferences.
//!
//! The source system stored preferences as a loose JSON list with magic
//! string members. Here the model is a closed enum, parsed and validated at
//! the boundary; the magic members survive only as input spellings.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Input spelling that means "every domain".
pub const PREF_ALL: &str = "all";
/// Input spelling that opts a curator into entities with no domain tags.
pub const PREF_UNTAGGED: &str = "untagged";

/// Which entities a curator wants to be assigned, by documentation domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DomainPreferences {
  /// No filtering: any entity is acceptable.
  All,
  /// Only entities tagged with one of `tags`, plus untagged entities when
  /// `include_untagged` is set.
  Tags {
    tags:             BTreeSet<String>,
    include_untagged: bool,
  },
}

impl Default for DomainPreferences {
  fn default() -> Self { Self::All }
}

impl DomainPreferences {
  /// Parse the list form accepted at the API boundary.
  ///
  /// `["all"]` (alone or alongside anything) means [`Self::All`];
  /// `"untagged"` sets `include_untagged`; every other member is a domain
  /// tag. An empty list — or a list that selects nothing — is rejected.
  pub fn parse(members: &[String]) -> Result<Self> {
    if members.is_empty() {
      return Err(Error::InvalidPreferences(
        "preference list is empty".to_string(),
      ));
    }

    if members.iter().any(|m| m == PREF_ALL) {
      return Ok(Self::All);
    }

    let mut tags = BTreeSet::new();
    let mut include_untagged = false;
    for member in members {
      let member = member.trim();
      if member.is_empty() {
        return Err(Error::InvalidPreferences(
          "preference list contains an empty tag".to_string(),
        ));
      }
      if member == PREF_UNTAGGED {
        include_untagged = true;
      } else {
        tags.insert(member.to_string());
      }
    }

    Ok(Self::Tags { tags, include_untagged })
  }

  /// Whether an entity with the given domain tags is acceptable.
  /// `domains = None` means the entity is untagged.
  pub fn matches(&self, domains: Option<&[String]>) -> bool {
    match self {
      Self::All => true,
      Self::Tags { tags, include_untagged } => match domains {
        None => *include_untagged,
        Some(entity_tags) => {
          entity_tags.iter().any(|tag| tags.contains(tag))
            || (*include_untagged && entity_tags.is_empty())
        }
      },
    }
  }
}

/// A human adjudicator. Authentication lives outside this core; curators
/// exist here so preferences and history rows have an owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Curator {
  pub curator_id:  i64,
  pub name:        String,
  pub preferences: DomainPreferences,
  pub created_at:  DateTime<Utc>,
}
