//! Authoring/config layer: immutable records loaded at startup.
//!
//! Форматы:
//! - `CombatRules` - один RON struct (`data/combat_rules.ron`)
//! - `ActionDefinitions` - RON список `ActionDefinition` (`data/actions.ron`)
//!
//! Runtime никогда не пишет конфиг обратно.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::actions::{ActionDefinitions, ActionId};

pub mod rules;


pub use rules::{CombatRules, TagMultiplier, TierParams, VulnerabilityTable};

/// Встроенные правила (те же значения, что и `CombatRules::default()`)
pub const DEFAULT_RULES_RON: &str = include_str!("../../data/combat_rules.ron");

/// Встроенная таблица действий
pub const DEFAULT_ACTIONS_RON: &str = include_str!("../../data/actions.ron");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {what}: {source}")]
    Parse {
        what: String,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("duplicate action id {0}")]
    DuplicateAction(ActionId),
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_combat_rules(path: &Path) -> Result<CombatRules, ConfigError> {
    CombatRules::from_ron_str(&read_file(path)?)
}

pub fn load_action_definitions(path: &Path) -> Result<ActionDefinitions, ConfigError> {
    ActionDefinitions::from_ron_str(&read_file(path)?)
}
