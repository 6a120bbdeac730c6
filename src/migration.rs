//! Forward migration of saved documents.
//!
//! Migrations run on the plain value tree before it is turned back into a
//! [`GameState`](crate::model::GameState). Each step moves a document from
//! one known version to the next by adding what is missing. Fields a step
//! does not know about are left alone.

use crate::error::{Result, SaveError};
use crate::model::BASE_VERSION;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

/// Transformation applied to the top-level object of a document.
pub type MigrationFn = fn(&mut Map<String, Value>);

/// One forward step between two adjacent schema versions.
#[derive(Clone, Copy)]
pub struct MigrationStep {
    pub from: &'static str,
    pub to: &'static str,
    pub apply: MigrationFn,
}

impl std::fmt::Debug for MigrationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MigrationStep({} -> {})", self.from, self.to)
    }
}

/// Every known step, oldest first.
pub const MIGRATIONS: &[MigrationStep] = &[MigrationStep {
    from: "0.0.0",
    to: "1.0.0",
    apply: add_stats,
}];

/// 0.0.0 saves predate cumulative statistics.
fn add_stats(doc: &mut Map<String, Value>) {
    backfill(
        doc,
        "stats",
        json!({
            "enemiesDefeated": 0,
            "goldEarned": 0,
            "goldSpent": 0,
            "buildingsBuilt": 0,
            "buildingsDestroyed": 0,
            "wavesSurvived": 0,
        }),
    );
}

/// Insert `defaults` under `key` when absent or null. When the existing value
/// is an object, insert only the default fields it lacks.
fn backfill(doc: &mut Map<String, Value>, key: &str, defaults: Value) {
    match doc.get_mut(key) {
        None | Some(Value::Null) => {
            doc.insert(key.to_string(), defaults);
        }
        Some(Value::Object(existing)) => {
            if let Value::Object(defaults) = defaults {
                for (field, value) in defaults {
                    existing.entry(field).or_insert(value);
                }
            }
        }
        // Wrong shape; left for deserialization to reject.
        Some(_) => {}
    }
}

/// Applies the migration chain up to a target version.
#[derive(Clone, Debug)]
pub struct Migrator {
    current: String,
    steps: Vec<MigrationStep>,
}

impl Migrator {
    /// Migrator using the built-in chain.
    pub fn new(current: impl Into<String>) -> Self {
        Self::with_steps(current, MIGRATIONS.to_vec())
    }

    pub fn with_steps(current: impl Into<String>, steps: Vec<MigrationStep>) -> Self {
        Self {
            current: current.into(),
            steps,
        }
    }

    pub fn current_version(&self) -> &str {
        &self.current
    }

    /// Bring a document up to the current version and stamp it.
    ///
    /// A version that is neither current nor the start of a known step is
    /// rejected rather than passed through.
    pub fn migrate(&self, value: Value) -> Result<Value> {
        let mut doc = match value {
            Value::Object(doc) => doc,
            other => {
                return Err(SaveError::Decode(format!(
                    "expected a JSON object, found {}",
                    kind_of(&other)
                )))
            }
        };

        let found = match doc.get("version") {
            None | Some(Value::Null) => BASE_VERSION.to_string(),
            Some(Value::String(v)) => v.clone(),
            Some(other) => {
                return Err(SaveError::Decode(format!(
                    "version must be a string, found {}",
                    kind_of(other)
                )))
            }
        };

        let mut version = found.clone();
        let mut applied = 0;
        while version != self.current {
            let step = self
                .steps
                .iter()
                .find(|s| s.from == version)
                .filter(|_| applied < self.steps.len())
                .ok_or_else(|| SaveError::UnsupportedVersion {
                    found: found.clone(),
                    current: self.current.clone(),
                })?;

            debug!(from = step.from, to = step.to, "applying migration step");
            (step.apply)(&mut doc);
            version = step.to.to_string();
            applied += 1;
        }

        if applied > 0 {
            info!(from = %found, to = %self.current, steps = applied, "migrated save");
        }

        doc.insert("version".to_string(), Value::String(self.current.clone()));
        Ok(Value::Object(doc))
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
