// src/types.rs

use std::str::FromStr;
use serde::Deserialize;

/// What happens to a trigger that arrives while the same task is still running.
///
/// - `Queue`: remember it; every trigger received during the run collapses
///   into a single re-run started when the current run completes (default).
/// - `Drop`: discard it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BusyPolicy {
    #[default]
    Queue,
    Drop,
}

impl FromStr for BusyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "queue" => Ok(BusyPolicy::Queue),
            "drop" => Ok(BusyPolicy::Drop),
            other => Err(format!(
                "invalid busy_policy: {other} (expected \"queue\" or \"drop\")"
            )),
        }
    }
}
