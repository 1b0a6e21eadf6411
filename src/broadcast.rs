//! Concurrent delivery of one roster to many connections.
//!
//! The message is wrapped in an `Arc` once and each recipient receives a
//! pointer clone, so a roster update costs one serialization per writer task
//! rather than one deep copy per recipient.

use futures_util::future::join_all;
use std::sync::Arc;

use crate::protocol::{ConnectionId, ServerMessage};
use crate::server::{ConnectionHandle, RosterDelivery};

/// Result of one fan-out.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastOutcome {
    /// Number of recipients whose queue accepted the message
    pub delivered: usize,
    /// Recipients that already had a newer roster queued
    pub superseded: usize,
    /// Recipients whose connection had already gone away
    pub failed: Vec<ConnectionId>,
}

impl BroadcastOutcome {
    pub fn all_delivered(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Queue a roster taken at registry `generation` on every recipient concurrently.
///
/// `recipients` must come from the same snapshot as the roster; the registry
/// may change while sends are in flight without affecting this iteration.
/// No ordering is guaranteed between recipients, but a recipient never gets
/// this roster after a newer one.
pub async fn fan_out(
    recipients: &[ConnectionHandle],
    message: Arc<ServerMessage>,
    generation: u64,
) -> BroadcastOutcome {
    let sends = recipients.iter().map(|recipient| {
        let message = Arc::clone(&message);
        async move {
            let delivery = recipient.send_roster(message, generation).await;
            (recipient.id(), delivery)
        }
    });

    let mut outcome = BroadcastOutcome::default();
    for (connection_id, delivery) in join_all(sends).await {
        match delivery {
            Ok(RosterDelivery::Queued) => outcome.delivered += 1,
            Ok(RosterDelivery::Superseded) => outcome.superseded += 1,
            Err(_) => outcome.failed.push(connection_id),
        }
    }
    outcome
}
