//! Alert hook
//!
//! Forwards error-class records to an external alerting service through the
//! [`Alerter`] contract. Records below error level are ignored.

use crate::core::{
    error::{LoggerError, Result},
    hook::Hook,
    log_level::LogLevel,
    metadata::Metadata,
    value::{merge, Fields},
};
use crossbeam_channel::{Receiver, TryRecvError};
use std::collections::HashMap;
use std::sync::Arc;

/// Event handed to an [`Alerter`].
#[derive(Debug, Clone, PartialEq)]
pub struct AlertPacket {
    pub message: String,
    pub level: LogLevel,
    pub error: Option<String>,
    pub channel: String,
    /// Context fields with the record fields merged on top.
    pub extra: Fields,
}

/// Alerting collaborator.
///
/// `capture` returns the event id and a channel that later yields the
/// outcome of the delivery.
pub trait Alerter: Send + Sync {
    fn capture(
        &self,
        packet: &AlertPacket,
        tags: &HashMap<String, String>,
    ) -> (String, Receiver<Result<()>>);
}

pub struct AlertHook {
    alerter: Arc<dyn Alerter>,
}

impl AlertHook {
    pub fn new<A: Alerter + 'static>(alerter: A) -> Self {
        Self {
            alerter: Arc::new(alerter),
        }
    }

    pub fn shared(alerter: Arc<dyn Alerter>) -> Self {
        Self { alerter }
    }
}

fn string_tags(tags: &Fields) -> HashMap<String, String> {
    tags.iter()
        .map(|(key, value)| (key.clone(), value.to_string()))
        .collect()
}

impl Hook for AlertHook {
    fn fire(
        &self,
        level: LogLevel,
        message: &str,
        error: Option<&(dyn std::error::Error + 'static)>,
        data: &Metadata,
    ) -> Result<()> {
        if !level.is_error_class() {
            return Ok(());
        }

        let packet = AlertPacket {
            message: message.to_string(),
            level,
            error: error.map(|e| e.to_string()),
            channel: data.channel().to_string(),
            extra: merge(data.context_fields(), data.fields()),
        };

        let (_event_id, outcome) = self.alerter.capture(&packet, &string_tags(data.tags()));

        // Only a failure that is already known is reported; delivery that is
        // still in flight is not waited for.
        match outcome.try_recv() {
            Ok(Err(e)) => Err(LoggerError::hook(self.name(), e.to_string())),
            Ok(Ok(())) | Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "alert"
    }
}
