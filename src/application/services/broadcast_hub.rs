//! Broadcast Hub
//!
//! Stateless fan-out. `route` snapshots the room's members and enqueues one
//! shared envelope on each of them without ever awaiting, so a slow
//! recipient cannot stall the sender's reader. Failures are per recipient:
//! a full queue is handled by the overflow policy, a closed recipient (a
//! stale snapshot entry) is skipped, and neither affects anyone else.
//!
//! Per-sender FIFO follows from each connection's reader calling `route`
//! sequentially and each recipient queue being FIFO.

use std::sync::Arc;

use crate::application::connection::CloseReason;
use crate::application::services::RoomRegistry;
use crate::domain::{ConnectionId, DeliveryPolicy, EchoPolicy, Envelope, OverflowPolicy, RoomName};
use crate::infrastructure::metrics;
use crate::shared::error::RelayError;

/// Outcome of one `route` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteReport {
    /// Members in the snapshot
    pub recipients: usize,
    /// Enqueued successfully
    pub delivered: usize,
    /// Dropped for a full queue (`DropNewest`)
    pub dropped: usize,
    /// Closed for a full queue (`Disconnect`)
    pub disconnected: usize,
    /// Already closing when reached
    pub stale: usize,
    /// Sender skipped (`ExcludeSender`)
    pub skipped: usize,
}

/// Mediates between readers and the registry. Holds no room state.
pub struct BroadcastHub {
    registry: Arc<RoomRegistry>,
    policy: DeliveryPolicy,
}

impl BroadcastHub {
    pub fn new(registry: Arc<RoomRegistry>, policy: DeliveryPolicy) -> Self {
        Self { registry, policy }
    }

    pub fn policy(&self) -> DeliveryPolicy {
        self.policy
    }

    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Fan `payload` out to every member of `room` at the time of the call.
    ///
    /// Routing to an absent or empty room is a no-op.
    pub fn route(
        &self,
        room: &RoomName,
        sender: ConnectionId,
        payload: impl Into<String>,
    ) -> RouteReport {
        let envelope = Arc::new(Envelope::new(room.clone(), sender, payload));
        let members = self.registry.members(room);

        let mut report = RouteReport {
            recipients: members.len(),
            ..Default::default()
        };

        for member in members {
            if self.policy.echo == EchoPolicy::ExcludeSender && envelope.is_from(member.id()) {
                report.skipped += 1;
                continue;
            }

            match member.send(Arc::clone(&envelope)) {
                Ok(()) => report.delivered += 1,
                Err(RelayError::QueueFull) => match self.policy.overflow {
                    OverflowPolicy::DropNewest => {
                        tracing::warn!(
                            room = %room,
                            recipient = %member.id(),
                            "Outbound queue full, message dropped"
                        );
                        report.dropped += 1;
                    }
                    OverflowPolicy::Disconnect => {
                        tracing::warn!(
                            room = %room,
                            recipient = %member.id(),
                            "Outbound queue full, disconnecting slow consumer"
                        );
                        member.close(CloseReason::SlowConsumer);
                        report.disconnected += 1;
                    }
                },
                Err(e) => {
                    tracing::debug!(
                        room = %room,
                        recipient = %member.id(),
                        error = %e,
                        "Skipping recipient"
                    );
                    report.stale += 1;
                }
            }
        }

        metrics::record_route(
            report.delivered as u64,
            report.dropped as u64,
            report.disconnected as u64,
            report.stale as u64,
            report.skipped as u64,
        );

        tracing::trace!(
            room = %room,
            sender = %envelope.sender(),
            recipients = report.recipients,
            delivered = report.delivered,
            "Message routed"
        );

        report
    }
}
