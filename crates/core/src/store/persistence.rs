//! Pure helpers for the Redis vs Memcached persistence comparison.

use super::Backend;

/// Key written by the persistence demo.
pub const DEMO_KEY: &str = "demo_data";

/// Value the demo writes to `backend`, tagged with who wrote it and when.
///
/// # Examples
///
/// ```
/// use chatrelay_core::store::{demo_value, Backend};
///
/// assert_eq!(
///     demo_value(Backend::Redis, "user_7", "10:00:00"),
///     "Redis_data_from_user_7_at_10:00:00"
/// );
/// ```
pub fn demo_value(backend: Backend, participant: &str, timestamp: &str) -> String {
    format!("{}_data_from_{}_at_{}", backend, participant, timestamp)
}

/// What happened to the demo value across a service restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceOutcome {
    /// The value is still there (or, without an expectation, any value is there).
    Survived,
    /// The key is gone.
    Lost,
    /// A different value is stored, e.g. another session wrote it since.
    Replaced,
}

impl PersistenceOutcome {
    /// Compares what was written (if this process wrote it) with what was read.
    pub fn evaluate(expected: Option<&str>, found: Option<&str>) -> Self {
        match (expected, found) {
            (_, None) => PersistenceOutcome::Lost,
            (Some(expected), Some(found)) if expected != found => PersistenceOutcome::Replaced,
            _ => PersistenceOutcome::Survived,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PersistenceOutcome::Survived => "survived",
            PersistenceOutcome::Lost => "lost",
            PersistenceOutcome::Replaced => "replaced",
        }
    }
}

/// Formats the report line for one backend after the restart.
pub fn outcome_line(backend: Backend, found: Option<&str>, outcome: PersistenceOutcome) -> String {
    let icon = match outcome {
        PersistenceOutcome::Survived => "✅",
        PersistenceOutcome::Lost => "❌",
        PersistenceOutcome::Replaced => "⚠️",
    };
    format!(
        "{} {} value: {} ({})",
        icon,
        backend,
        found.unwrap_or("None"),
        outcome.as_str()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate() {
        assert_eq!(
            PersistenceOutcome::evaluate(Some("a"), Some("a")),
            PersistenceOutcome::Survived
        );
        assert_eq!(
            PersistenceOutcome::evaluate(Some("a"), None),
            PersistenceOutcome::Lost
        );
        assert_eq!(
            PersistenceOutcome::evaluate(Some("a"), Some("b")),
            PersistenceOutcome::Replaced
        );
        assert_eq!(
            PersistenceOutcome::evaluate(None, Some("anything")),
            PersistenceOutcome::Survived
        );
        assert_eq!(
            PersistenceOutcome::evaluate(None, None),
            PersistenceOutcome::Lost
        );
    }

    #[test]
    fn test_outcome_line() {
        assert_eq!(
            outcome_line(Backend::Memcached, None, PersistenceOutcome::Lost),
            "❌ Memcached value: None (lost)"
        );
        assert_eq!(
            outcome_line(Backend::Redis, Some("v"), PersistenceOutcome::Survived),
            "✅ Redis value: v (survived)"
        );
    }
}
