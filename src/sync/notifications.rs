use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::common::{Notification, ServerErrorResponse};
use crate::error::ApiError;
use crate::network::ApiClient;
use crate::state::ToastQueue;

use super::report_failure;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(40);

/// Message and non-message notifications, kept in separate lists.
pub struct NotificationStore {
    api: ApiClient,
    toasts: ToastQueue,
    message: Vec<Notification>,
    non_message: Vec<Notification>,
    is_loading: bool,
    error: Option<ServerErrorResponse>,
}

impl NotificationStore {
    pub fn new(api: ApiClient, toasts: ToastQueue) -> Self {
        Self {
            api,
            toasts,
            message: Vec::new(),
            non_message: Vec::new(),
            is_loading: false,
            error: None,
        }
    }

    pub fn message_notifications(&self) -> &[Notification] {
        &self.message
    }

    pub fn other_notifications(&self) -> &[Notification] {
        &self.non_message
    }

    pub fn unread_count(&self) -> usize {
        self.message
            .iter()
            .chain(&self.non_message)
            .filter(|notification| !notification.is_read)
            .count()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&ServerErrorResponse> {
        self.error.as_ref()
    }

    /// Fetches both lists concurrently. A failing list keeps its previous
    /// contents; the first error is returned.
    pub async fn fetch_all(&mut self) -> Result<(), ApiError> {
        self.is_loading = true;
        let (message, non_message) = tokio::join!(
            self.api.get::<Vec<Notification>>("notifications/messages"),
            self.api.get::<Vec<Notification>>("notifications/non-messages"),
        );
        self.is_loading = false;

        let mut first_error = None;
        let lists = [
            (message, &mut self.message),
            (non_message, &mut self.non_message),
        ];
        for (result, target) in lists {
            match result {
                Ok(fetched) => *target = fetched,
                Err(err) => {
                    log::error!("Error fetching notifications: {err}");
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }

        match first_error {
            Some(err) => {
                self.error = err.payload().cloned();
                Err(err)
            }
            None => {
                self.error = None;
                Ok(())
            }
        }
    }

    pub async fn mark_as_read(&mut self, notification_id: i64) -> Result<(), ApiError> {
        let path = format!("notifications/mark-read/{notification_id}");
        match self.api.post_empty(&path).await {
            Ok(()) => {
                self.message.retain(|n| n.id != notification_id);
                self.non_message.retain(|n| n.id != notification_id);
                self.toasts.success("Notification marked as read");
                Ok(())
            }
            Err(err) => {
                self.error = report_failure(
                    &self.toasts,
                    "marking notification read",
                    &err,
                    "Failed to mark notification as read",
                );
                Err(err)
            }
        }
    }

    pub async fn mark_all_as_read(&mut self) -> Result<(), ApiError> {
        match self.api.post_empty("notifications/mark-all-non-message-read").await {
            Ok(()) => {
                self.non_message.clear();
                self.toasts
                    .success("All non-message notifications marked as read");
                Ok(())
            }
            Err(err) => {
                self.error = report_failure(
                    &self.toasts,
                    "marking notifications read",
                    &err,
                    "Failed to mark all non-message notifications as read",
                );
                Err(err)
            }
        }
    }

    /// Re-fetches every `period` (first fetch immediately) until cancelled.
    pub async fn run_refresh(&mut self, period: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    // Failures are logged by fetch_all; the next tick retries.
                    let _ = self.fetch_all().await;
                }
            }
        }
    }
}
