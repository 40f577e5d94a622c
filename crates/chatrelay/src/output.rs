//! Where operator-facing lines go.
//!
//! The listener and the session both write through an [`Output`] so tests can
//! capture exactly what a human would have seen on the terminal.

use tokio::sync::mpsc;

/// A line-oriented operator console.
pub trait Output: Clone + Send + Sync + 'static {
    fn line(&self, line: &str);
}

/// Writes lines to standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stdout;

impl Output for Stdout {
    fn line(&self, line: &str) {
        println!("{}", line);
    }
}

/// Forwards lines into a channel. Lines sent after the receiver is gone are
/// dropped.
impl Output for mpsc::UnboundedSender<String> {
    fn line(&self, line: &str) {
        let _ = self.send(line.to_string());
    }
}
