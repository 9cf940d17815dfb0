use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Behaviour when a binding is triggered again while its previous run is
/// still in flight.
///
/// - `Queue`: remember the trigger and start exactly one follow-up run when
///   the current one finishes, no matter how many events arrived (default).
/// - `Skip`: drop the trigger; only the in-flight run happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TriggerWhileRunningBehaviour {
    #[default]
    Queue,
    Skip,
}

impl FromStr for TriggerWhileRunningBehaviour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "queue" => Ok(TriggerWhileRunningBehaviour::Queue),
            "skip" => Ok(TriggerWhileRunningBehaviour::Skip),
            other => Err(format!(
                "invalid while_running: {other} (expected \"queue\" or \"skip\")"
            )),
        }
    }
}

/// What connected preview clients should do after a task run.
///
/// Ordered by strength: a run that touched both stylesheets and templates
/// asks for the stronger `Full` reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReloadKind {
    /// Nothing to push (e.g. optimized images not referenced by a page yet).
    #[default]
    None,
    /// Hot-swap stylesheets without losing page state.
    Style,
    /// Reload the whole page.
    Full,
}

impl fmt::Display for ReloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReloadKind::None => "none",
            ReloadKind::Style => "style",
            ReloadKind::Full => "full",
        };
        f.write_str(s)
    }
}
