//! # Notification Service
//!
//! This module forwards push notification requests to the notification
//! service. The service trait allows for easy testing and switching between
//! the real HTTP client and a logging stand-in.
//!
//! ## Implementations
//!
//! - [`LogNotifier`] - Development/testing implementation that only logs
//! - [`HttpNotifier`] - Production implementation posting to the notification service
//!
//! Chat handlers never await a notification: they hand it to
//! [`dispatch_detached`], which runs it on its own task with a timeout and
//! only logs the outcome.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{Instrument, debug, error, info, info_span, instrument, warn};

use crate::utils::constant::NOTIFICATION_TIMEOUT;

/// Errors that can occur while dispatching a notification
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Failed to send notification: {0}")]
    SendFailed(String),
    #[error("Notification timed out after {0:?}")]
    Timeout(Duration),
}

/// Kinds of push notification understood by the notification service.
/// The service owns the title/body templates for each kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewMessage,
    MatchCreated,
    MeetingCreated,
    MeetingReminder,
    ConsultationConfirmed,
    ConsultationReminder,
    PhotoApproved,
    PhotoRejected,
}

/// Body of `POST {NOTIFICATION_SERVICE_URL}/send`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub user_id: i64,
    pub notification_type: NotificationKind,
    /// Template variables, e.g. `sender_name` and `preview` for [`NotificationKind::NewMessage`]
    pub data: Value,
}

/// Trait for push notification dispatchers
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Asks for `request` to be delivered to the user's devices.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::SendFailed`] if the request cannot be delivered
    /// to the notification service.
    async fn send(&self, request: &NotificationRequest) -> Result<(), NotifyError>;
}

/// Mock notifier for development and testing
pub struct LogNotifier;

#[async_trait]
impl NotificationService for LogNotifier {
    #[instrument(skip_all, fields(user_id = request.user_id, kind = ?request.notification_type))]
    async fn send(&self, request: &NotificationRequest) -> Result<(), NotifyError> {
        info!(data = %request.data, "Mock notification dispatched");
        Ok(())
    }
}

/// Notifier backed by the notification service's HTTP API
///
/// # Configuration
///
/// - `NOTIFICATION_SERVICE_URL` - Base URL of the notification service
pub struct HttpNotifier {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpNotifier {
    pub fn new(base_url: String) -> Self {
        info!(base_url = %base_url, "Initializing notification service client");

        let http_client = reqwest::Client::builder()
            .timeout(NOTIFICATION_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to build HTTP client with timeout, using defaults");
                reqwest::Client::new()
            });

        Self {
            base_url,
            http_client,
        }
    }
}

#[async_trait]
impl NotificationService for HttpNotifier {
    #[instrument(skip_all, fields(user_id = request.user_id, kind = ?request.notification_type))]
    async fn send(&self, request: &NotificationRequest) -> Result<(), NotifyError> {
        debug!("Sending HTTP request to notification service");

        let response = self
            .http_client
            .post(format!("{}/send", self.base_url.trim_end_matches('/')))
            .json(request)
            .send()
            .await;

        match response {
            Ok(res) if res.status().is_success() => {
                debug!("Notification accepted");
                Ok(())
            }
            Ok(res) => {
                let status = res.status();
                let error_body = res
                    .text()
                    .await
                    .unwrap_or_else(|_| "Failed to read error response body".to_string());

                error!(
                    status = %status,
                    error_body = %error_body,
                    "Notification service returned error"
                );

                Err(NotifyError::SendFailed(format!(
                    "Notification service error {status}: {error_body}"
                )))
            }
            Err(e) => {
                error!(error = %e, "Network request to notification service failed");
                Err(NotifyError::SendFailed(format!(
                    "Network request error: {e}"
                )))
            }
        }
    }
}

/// Sends `request` on a background task bounded by [`NOTIFICATION_TIMEOUT`].
///
/// The caller's response path never observes the outcome: failures and
/// timeouts are logged and dropped, nothing is retried.
pub fn dispatch_detached(notifier: Arc<dyn NotificationService>, request: NotificationRequest) {
    let span = info_span!(
        "notification_dispatch",
        user_id = request.user_id,
        kind = ?request.notification_type
    );

    tokio::spawn(
        async move {
            let outcome = tokio::time::timeout(NOTIFICATION_TIMEOUT, notifier.send(&request))
                .await
                .unwrap_or(Err(NotifyError::Timeout(NOTIFICATION_TIMEOUT)));

            match outcome {
                Ok(()) => debug!("Notification dispatched"),
                Err(e) => warn!(error = %e, "Notification dispatch failed"),
            }
        }
        .instrument(span),
    );
}
