//! Redis vs Memcached persistence comparison.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use chatrelay_core::chat::{current_timestamp, ParticipantId};
use chatrelay_core::store::{
    demo_value, outcome_line, Backend, KeyValueStore, PersistenceOutcome, StoreError, DEMO_KEY,
};

use crate::output::Output;

/// What one store reported after the restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCheck {
    pub backend: Backend,
    pub found: Option<String>,
    pub outcome: PersistenceOutcome,
}

/// Writes the demo key to every store and checks it after a restart.
pub struct PersistenceDemo<O: Output> {
    stores: Vec<Arc<dyn KeyValueStore>>,
    participant: ParticipantId,
    output: O,
}

impl<O: Output> PersistenceDemo<O> {
    pub fn new(stores: Vec<Arc<dyn KeyValueStore>>, participant: ParticipantId, output: O) -> Self {
        Self {
            stores,
            participant,
            output,
        }
    }

    /// Runs the demo. With `check_only`, only the read phase runs.
    ///
    /// `input` is where the operator presses ENTER once the services have
    /// been restarted.
    ///
    /// # Errors
    ///
    /// Returns the first store error; the demo cannot continue without both
    /// sides of the comparison.
    pub async fn run<R>(&self, input: R, check_only: bool) -> Result<Vec<StoreCheck>, StoreError>
    where
        R: AsyncBufRead + Unpin,
    {
        self.header();

        let expected: Vec<Option<String>> = if check_only {
            vec![None; self.stores.len()]
        } else {
            let written = self.write_phase().await?;
            self.output
                .line("\nNow RESTART Redis & Memcached, then press ENTER to continue...");
            let mut lines = input.lines();
            if let Err(err) = lines.next_line().await {
                tracing::warn!(error = %err, "Failed to read confirmation");
            }
            written.into_iter().map(Some).collect()
        };

        self.output.line("\n---- Checking values after restart ----");
        let checks = self.check_phase(&expected).await?;

        if checks
            .iter()
            .any(|check| check.outcome == PersistenceOutcome::Lost)
        {
            self.output
                .line("\n💡 Redis data persists across restarts, Memcached doesn't!");
        }
        Ok(checks)
    }

    /// Non-interactive variant run before the chat starts: writes and reads
    /// back the demo key, then points at the restart comparison.
    pub async fn seed(&self) -> Result<Vec<String>, StoreError> {
        self.header();
        let written = self.write_phase().await?;
        self.output
            .line("\n💡 Redis data persists across restarts, Memcached doesn't!");
        self.output
            .line("   Restart the services and run `chatrelay persistence --check-only` to see it.\n");
        Ok(written)
    }

    fn header(&self) {
        self.output.line("🔧 PERSISTENCE TEST");
        self.output.line(&"=".repeat(50));
    }

    /// Stores a fresh demo value in every store and echoes what each returns.
    pub async fn write_phase(&self) -> Result<Vec<String>, StoreError> {
        let timestamp = current_timestamp();
        let mut written = Vec::with_capacity(self.stores.len());

        for store in &self.stores {
            let backend = store.backend();
            let value = demo_value(backend, self.participant.as_str(), &timestamp);
            store.set(DEMO_KEY, &value).await?;

            let stored = store.get(DEMO_KEY).await?;
            tracing::debug!(%backend, key = DEMO_KEY, "Demo value stored");
            self.output.line(&format!(
                "✅ Stored in {}: {}",
                backend,
                stored.as_deref().unwrap_or("None")
            ));
            written.push(value);
        }

        Ok(written)
    }

    /// Reads the demo key back from every store.
    ///
    /// `expected[i]` is the value this process wrote to store `i`, if any.
    pub async fn check_phase(&self, expected: &[Option<String>]) -> Result<Vec<StoreCheck>, StoreError> {
        let mut checks = Vec::with_capacity(self.stores.len());

        for (i, store) in self.stores.iter().enumerate() {
            let backend = store.backend();
            let found = store.get(DEMO_KEY).await?;
            let wanted = expected.get(i).and_then(|value| value.as_deref());
            let outcome = PersistenceOutcome::evaluate(wanted, found.as_deref());

            self.output
                .line(&outcome_line(backend, found.as_deref(), outcome));
            checks.push(StoreCheck {
                backend,
                found,
                outcome,
            });
        }

        Ok(checks)
    }
}
