//! Notification consumer.
//!
//! Polls the notification queue on a fixed cadence and runs every message
//! through fetch → decode → dispatch, one message at a time and in received
//! order. A message is acknowledged only when its whole chain succeeds;
//! anything else leaves it for redelivery after the visibility timeout.
//!
//! Cancellation is observed between ticks and between messages of a batch,
//! never inside one message, so an in-flight dispatch is bounded only by the
//! callback timeout.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::callback::{CallbackRequest, CallbackSender};
use crate::config::ConsumerConfig;
use crate::document::DocumentDecoder;
use crate::error::{DecodeError, ProcessError, QueueError};
use crate::queue::{
    QueueAcker, QueueHandle, QueueMessage, QueuePoller, QueueResolver, StorageEventNotification,
};
use crate::storage::ObjectFetcher;

/// Loop settings.
#[derive(Debug, Clone)]
pub struct ConsumerSettings {
    pub poll_interval: Duration,
    pub max_messages: i32,
    /// Acknowledge notifications that need no callback
    pub ack_skipped: bool,
}

impl Default for ConsumerSettings {
    fn default() -> Self {
        Self::from_config(&ConsumerConfig::default())
    }
}

impl ConsumerSettings {
    pub fn from_config(config: &ConsumerConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            max_messages: config.batch_size(),
            ack_skipped: config.ack_skipped,
        }
    }
}

/// Capabilities the consumer is built from.
#[derive(Clone)]
pub struct ConsumerDeps {
    pub poller: Arc<dyn QueuePoller>,
    pub acker: Arc<dyn QueueAcker>,
    pub fetcher: Arc<dyn ObjectFetcher>,
    pub decoder: Arc<dyn DocumentDecoder>,
    pub sender: Arc<dyn CallbackSender>,
}

/// Why a notification needed no work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoRecords,
    NotObjectCreated { event_name: String },
    EmptyObjectKey,
}

/// Successful end state of processing one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// The callback answered 200
    Dispatched { callback_url: String },
    /// The document carries no callback url
    NoCallbackTarget,
    /// The notification was filtered out before any fetch
    Skipped(SkipReason),
}

/// What happened to a message on the queue side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    Acknowledged,
    /// Left on the queue for redelivery
    Unacknowledged,
    /// Processing succeeded but the delete call failed
    AckFailed,
}

/// Counts for one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub received: usize,
    pub acknowledged: usize,
    pub unacknowledged: usize,
    pub ack_failed: usize,
}

impl CycleReport {
    fn record(&mut self, outcome: MessageOutcome) {
        match outcome {
            MessageOutcome::Acknowledged => self.acknowledged += 1,
            MessageOutcome::Unacknowledged => self.unacknowledged += 1,
            MessageOutcome::AckFailed => self.ack_failed += 1,
        }
    }
}

pub struct Consumer {
    queue: QueueHandle,
    deps: ConsumerDeps,
    settings: ConsumerSettings,
}

impl Consumer {
    pub fn new(queue: QueueHandle, deps: ConsumerDeps, settings: ConsumerSettings) -> Self {
        Self {
            queue,
            deps,
            settings,
        }
    }

    /// Resolve the queue once and build the consumer around its handle.
    ///
    /// Resolution failure is fatal for the caller: there is nothing to poll.
    pub async fn connect(
        resolver: &dyn QueueResolver,
        queue_name: &str,
        deps: ConsumerDeps,
        settings: ConsumerSettings,
    ) -> Result<Self, QueueError> {
        let queue = resolver.resolve(queue_name).await?;
        Ok(Self::new(queue, deps, settings))
    }

    pub fn queue(&self) -> &QueueHandle {
        &self.queue
    }

    /// Run poll cycles until `shutdown` fires.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut ticker = interval(self.settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            queue_url = %self.queue,
            poll_interval = ?self.settings.poll_interval,
            max_messages = self.settings.max_messages,
            ack_skipped = self.settings.ack_skipped,
            "consumer_started"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("consumer_stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let report = self.run_cycle(&shutdown).await;
                    if report.received > 0 {
                        info!(
                            received = report.received,
                            acknowledged = report.acknowledged,
                            unacknowledged = report.unacknowledged,
                            ack_failed = report.ack_failed,
                            "consumer_cycle_complete"
                        );
                    }
                }
            }
        }

        info!("consumer_stopped");
    }

    /// Poll one batch and process it to completion.
    ///
    /// A poll failure is logged and yields an empty report; the next tick
    /// polls again.
    pub async fn run_cycle(&self, shutdown: &CancellationToken) -> CycleReport {
        let messages = match self
            .deps
            .poller
            .poll(&self.queue, self.settings.max_messages)
            .await
        {
            Ok(messages) => messages,
            Err(e) => {
                error!(queue_url = %self.queue, error = %e, "consumer_poll_failed");
                return CycleReport::default();
            }
        };

        let mut report = CycleReport {
            received: messages.len(),
            ..Default::default()
        };

        for (index, message) in messages.iter().enumerate() {
            if shutdown.is_cancelled() {
                info!(
                    remaining = messages.len() - index,
                    "consumer_batch_interrupted"
                );
                break;
            }
            report.record(self.handle_message(message).await);
        }

        report
    }

    /// Process one message and acknowledge it if appropriate.
    pub async fn handle_message(&self, message: &QueueMessage) -> MessageOutcome {
        let span = info_span!("message", message_id = %message.id);

        async {
            let should_ack = match self.process_message(message).await {
                Ok(Disposition::Skipped(reason)) => {
                    info!(reason = ?reason, ack = self.settings.ack_skipped, "message_skipped");
                    self.settings.ack_skipped
                }
                Ok(Disposition::NoCallbackTarget) => {
                    info!("message_without_callback_target");
                    true
                }
                Ok(Disposition::Dispatched { callback_url }) => {
                    info!(callback_url = %callback_url, "callback_dispatched");
                    true
                }
                Err(e) => {
                    error!(stage = e.stage(), error = %e, "message_processing_failed");
                    false
                }
            };

            if !should_ack {
                return MessageOutcome::Unacknowledged;
            }

            match self.deps.acker.ack(&self.queue, &message.ack_token).await {
                Ok(()) => {
                    info!("message_acknowledged");
                    MessageOutcome::Acknowledged
                }
                Err(e) => {
                    // The callback may already have fired; redelivery will fire it again.
                    error!(error = %e, "message_ack_failed");
                    MessageOutcome::AckFailed
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Run the fetch → decode → dispatch chain for one message.
    ///
    /// Does not touch the queue; acknowledging is up to the caller.
    pub async fn process_message(&self, message: &QueueMessage) -> Result<Disposition, ProcessError> {
        debug!(message_id = %message.id, body = %message.body, "message_received");

        let Some(notification) = StorageEventNotification::parse(&message.body)? else {
            return Ok(Disposition::Skipped(SkipReason::NoRecords));
        };

        if !notification.is_object_created() {
            return Ok(Disposition::Skipped(SkipReason::NotObjectCreated {
                event_name: notification.event_name,
            }));
        }

        let Some(key) = notification.actionable_key() else {
            warn!(event_name = %notification.event_name, "notification_without_object_key");
            return Ok(Disposition::Skipped(SkipReason::EmptyObjectKey));
        };

        info!(object_key = key, "document_fetch_starting");
        let bytes = self.deps.fetcher.fetch(key).await?;

        let document = self.deps.decoder.decode(&bytes)?;
        debug!(
            object_key = key,
            uuid = %document.uuid,
            routing_key = %document.routing_key,
            "document_decoded"
        );

        let Some(callback_url) = document.callback_url() else {
            return Ok(Disposition::NoCallbackTarget);
        };

        let payload = document.to_json().map_err(DecodeError::from)?;
        let request = CallbackRequest::new(callback_url, payload);
        self.deps.sender.send(&request).await?;

        Ok(Disposition::Dispatched {
            callback_url: request.url,
        })
    }
}
