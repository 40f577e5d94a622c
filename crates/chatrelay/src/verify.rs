//! End-to-end check: a listener and the synthetic publisher in one process.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};

use chatrelay_core::broker::{Broker, BrokerError};
use chatrelay_core::chat::{ParticipantId, SyntheticTally, SYNTHETIC_SENDER};

use crate::listener::{Listener, ListenerReport};
use crate::output::Output;
use crate::synthetic::SyntheticPublisher;

/// Namespace a verify run uses, so concurrent chats and publishers on the
/// same server never mix into the tally.
pub fn verify_namespace(namespace: &str, pid: u32) -> String {
    format!("{}verify_{}:", namespace, pid)
}

/// Result of one verify run.
#[derive(Debug, Clone)]
pub struct VerifyOutcome {
    pub cycles: u64,
    pub tally: SyntheticTally,
    pub report: ListenerReport,
}

impl VerifyOutcome {
    pub fn passed(&self) -> bool {
        self.tally.matches_cycles(self.cycles) && self.tally.is_ordered()
    }
}

/// Settings for [`run_verify`].
#[derive(Debug, Clone)]
pub struct VerifyOptions {
    pub namespace: String,
    pub cycles: u64,
    pub interval: Duration,
    /// How long to wait for outstanding messages once publishing is done.
    pub timeout: Duration,
}

/// Publishes `cycles` synthetic messages and tallies what the listener
/// rendered.
///
/// # Errors
///
/// Returns an error if the listener cannot subscribe.
pub async fn run_verify<O: Output>(
    broker: Arc<dyn Broker>,
    options: &VerifyOptions,
    output: O,
) -> Result<VerifyOutcome, BrokerError> {
    let (deliveries_tx, mut deliveries) = mpsc::unbounded_channel();
    let mut listener = Listener::new(
        ParticipantId::from_process(),
        options.namespace.as_str(),
        output.clone(),
    )
    .with_deliveries(deliveries_tx);
    listener.subscribe(broker.as_ref()).await?;

    let publisher = SyntheticPublisher::new(broker, SYNTHETIC_SENDER, options.interval, output.clone())
        .with_limit(options.cycles);

    let (stop_tx, stop_rx) = broadcast::channel(1);

    let drive = async {
        let published = publisher.run(stop_tx.subscribe()).await;
        tracing::debug!(published, "Synthetic publishing finished");

        let deadline = tokio::time::sleep(options.timeout);
        tokio::pin!(deadline);

        let mut tally = SyntheticTally::new();
        while (tally.total() as u64) < options.cycles {
            tokio::select! {
                _ = &mut deadline => {
                    tracing::warn!(received = tally.total(), "Timed out waiting for messages");
                    break;
                }
                delivery = deliveries.recv() => match delivery {
                    Some(delivery) if delivery.envelope.sender == SYNTHETIC_SENDER => {
                        tally.record(delivery.channel, &delivery.envelope.message);
                    }
                    Some(delivery) => {
                        tracing::debug!(sender = %delivery.envelope.sender, "Ignoring foreign sender");
                    }
                    None => break,
                },
            }
        }

        let _ = stop_tx.send(());
        tally
    };

    let (report, tally) = tokio::join!(listener.run(stop_rx), drive);
    tracing::debug!(state = ?listener.state(), "Verify listener finished");

    let outcome = VerifyOutcome {
        cycles: options.cycles,
        tally,
        report,
    };

    output.line(&format!("\n📋 Received: {}", outcome.tally.summary()));
    if outcome.passed() {
        output.line(&format!(
            "✅ Verified {} synthetic messages in order",
            outcome.cycles
        ));
    } else {
        output.line(&format!(
            "❌ Verification failed: expected {} messages, rendered {} (ordered: {})",
            outcome.cycles,
            outcome.tally.total(),
            outcome.tally.is_ordered()
        ));
    }

    Ok(outcome)
}
