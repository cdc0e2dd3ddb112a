//! # Event Relay
//!
//! Mirrors host push notifications into observable cells for the view.
//!
//! ## Overview
//!
//! The relay keeps only the latest value per channel: a burst of errors
//! leaves the last one on screen, and an `execution-started` notification
//! clears it. Notifications are applied in the order they arrive.
//!
//! Error payloads are checked against [`ExecutionError`] before they are
//! stored. A payload that does not parse is dropped and logged, so the view
//! can always deserialize whatever `error_state` holds.

pub mod observable;

use crate::host::{HostNotification, EXECUTION_ERROR, EXECUTION_STARTED};
use serde::Deserialize;

pub use observable::{Observable, SubscriptionId};

/// Shape of an `execution-error` payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionError {
    pub item_name: String,
    pub error: String,
    pub timestamp: String,
    #[serde(default)]
    pub item_id: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("malformed execution error payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
}

/// Latest-value mirror of the host's execution channels
#[derive(Debug, Default)]
pub struct EventRelay {
    execution_state: Observable<String>,
    error_state: Observable<String>,
}

impl EventRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a notification by channel name
    pub fn dispatch(&mut self, notification: &HostNotification) {
        match notification.channel.as_str() {
            EXECUTION_STARTED => {
                self.execution_state.set(notification.payload.clone());
                self.on_execution_started();
            }
            EXECUTION_ERROR => {
                if let Err(e) = self.on_execution_error(&notification.payload) {
                    tracing::warn!(target: "relay", error = %e, "payload_dropped");
                }
            }
            other => {
                tracing::debug!(target: "relay", channel = other, "unhandled_channel");
            }
        }
    }

    /// A script started; any previous error is stale
    pub fn on_execution_started(&mut self) {
        self.error_state.set(String::new());
    }

    /// Store a serialized error payload, replacing the previous one.
    /// Malformed payloads leave the current state untouched.
    pub fn on_execution_error(&mut self, payload: &str) -> Result<(), RelayError> {
        let parsed: ExecutionError = serde_json::from_str(payload)?;
        tracing::info!(target: "relay", item = %parsed.item_name, "execution_error");
        self.error_state.set(payload.to_string());
        Ok(())
    }

    /// Latest serialized error payload, or an empty string
    pub fn error_state(&self) -> &Observable<String> {
        &self.error_state
    }

    pub fn error_state_mut(&mut self) -> &mut Observable<String> {
        &mut self.error_state
    }

    /// Latest serialized `execution-started` payload
    pub fn execution_state(&self) -> &Observable<String> {
        &self.execution_state
    }

    /// Parsed view of [`error_state`](Self::error_state)
    pub fn latest_error(&self) -> Option<ExecutionError> {
        let payload = self.error_state.get();
        if payload.is_empty() {
            return None;
        }
        serde_json::from_str(payload).ok()
    }

    pub fn clear_error(&mut self) {
        self.on_execution_started();
    }
}
