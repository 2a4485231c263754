//! Caller-facing notification sink
//!
//! Recoverable load failures are reported here instead of being raised
//! into a render loop that has nowhere to put them.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Receives user-visible messages from the scheduler
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, is_error: bool);
}

impl<F> Notifier for F
where
    F: Fn(&str, bool) + Send + Sync,
{
    fn notify(&self, message: &str, is_error: bool) {
        self(message, is_error);
    }
}

/// Logs notifications through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, is_error: bool) {
        if is_error {
            tracing::error!(target: "pacer::notify", "{message}");
        } else {
            tracing::warn!(target: "pacer::notify", "{message}");
        }
    }
}

/// A message delivered through [`ChannelNotifier`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub is_error: bool,
}

/// Forwards notifications over an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiving end of its channel
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, message: &str, is_error: bool) {
        // A dropped receiver means nobody is listening any more
        let _ = self.tx.send(Notification {
            message: message.to_string(),
            is_error,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn closures_are_notifiers() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = Arc::clone(&seen);
            move |msg: &str, is_error: bool| seen.lock().unwrap().push((msg.to_string(), is_error))
        };

        sink.notify("missing asset", true);
        assert_eq!(seen.lock().unwrap()[0], ("missing asset".to_string(), true));
    }

    #[test]
    fn channel_delivers_in_order() {
        let (notifier, mut rx) = ChannelNotifier::channel();
        notifier.notify("first", false);
        notifier.notify("second", true);

        assert_eq!(rx.try_recv().unwrap().message, "first");
        assert!(rx.try_recv().unwrap().is_error);
    }

    #[test]
    fn closed_channel_is_ignored() {
        let (notifier, rx) = ChannelNotifier::channel();
        drop(rx);
        notifier.notify("nobody home", false);
    }
}
