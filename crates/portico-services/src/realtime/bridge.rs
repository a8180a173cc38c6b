//! Per-session notification bridge.
//!
//! The subscription lifecycle is a typed state machine owned by the bridge
//! value rather than an ambient guard flag, so callers (and tests) drive
//! transitions explicitly: `Idle` -> `Authorizing` while the channel token
//! is fetched, `Authorizing` -> `Subscribed` once the channel acknowledges,
//! and back to `Idle` on error or teardown. The bridge never reconnects on
//! its own; a new cycle starts only when the caller begins one.

use std::collections::HashSet;

use portico_core::models::{ExtractionStatus, RegistryEvent};
use portico_core::AppError;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Idle,
    Authorizing,
    Subscribed,
}

/// Where the notification should send the user next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Guidance {
    /// Extracted tenant data is ready to inspect.
    TenantData,
    /// The generic review page holds the new record.
    ReviewPage,
    /// Extraction failed; the file is in the error-document list.
    ErrorDocuments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub file_name: String,
    pub message: String,
    pub guidance: Guidance,
}

pub struct NotificationBridge {
    user_id: Uuid,
    state: SubscriptionState,
    seen: HashSet<(Uuid, String, ExtractionStatus)>,
}

impl NotificationBridge {
    pub fn new(user_id: Uuid) -> Self {
        NotificationBridge {
            user_id,
            state: SubscriptionState::Idle,
            seen: HashSet::new(),
        }
    }

    pub fn state(&self) -> SubscriptionState {
        self.state
    }

    /// Start a subscription cycle. At most one attempt may be in flight;
    /// beginning again while not `Idle` is rejected.
    pub fn begin_authorizing(&mut self) -> Result<(), AppError> {
        if self.state != SubscriptionState::Idle {
            return Err(AppError::InvalidInput(
                "A realtime subscription is already in progress".to_string(),
            ));
        }
        self.state = SubscriptionState::Authorizing;
        Ok(())
    }

    /// The live channel acknowledged the subscription.
    pub fn subscribed(&mut self) -> Result<(), AppError> {
        if self.state != SubscriptionState::Authorizing {
            return Err(AppError::InvalidInput(
                "Subscription acknowledged without an authorization in flight".to_string(),
            ));
        }
        self.state = SubscriptionState::Subscribed;
        Ok(())
    }

    /// Channel error or timeout. The bridge returns to `Idle` and does not
    /// reconnect; the caller decides whether to start a new cycle.
    pub fn channel_error(&mut self) {
        self.state = SubscriptionState::Idle;
    }

    /// Explicit teardown on navigation or logout.
    pub fn teardown(&mut self) {
        self.state = SubscriptionState::Idle;
    }

    /// Map one delivered event to at most one notification.
    ///
    /// Events for other users are discarded here as a second check behind
    /// the server-side filter, and each (user, file, status) triple fires
    /// once per session.
    pub fn on_event(&mut self, event: &RegistryEvent) -> Option<Notification> {
        if self.state != SubscriptionState::Subscribed {
            return None;
        }
        if event.user_id != self.user_id {
            tracing::debug!(
                event_user = %event.user_id,
                "Discarding registry event for another user"
            );
            return None;
        }

        let key = (
            event.user_id,
            event.file_name.clone(),
            event.extraction_status,
        );
        if !self.seen.insert(key) {
            return None;
        }

        match event.extraction_status {
            ExtractionStatus::Passed => {
                let guidance = classify_guidance(event.document_type.as_deref());
                let message = match guidance {
                    Guidance::TenantData => format!(
                        "'{}' was processed. The extracted tenant data is ready for review.",
                        event.file_name
                    ),
                    _ => format!(
                        "'{}' was processed. Review the new record on the review page.",
                        event.file_name
                    ),
                };
                Some(Notification {
                    kind: NotificationKind::Success,
                    file_name: event.file_name.clone(),
                    message,
                    guidance,
                })
            }
            ExtractionStatus::Failed => Some(Notification {
                kind: NotificationKind::Error,
                file_name: event.file_name.clone(),
                message: format!(
                    "Extraction failed for '{}'. See the error documents list.",
                    event.file_name
                ),
                guidance: Guidance::ErrorDocuments,
            }),
            ExtractionStatus::Pending => None,
        }
    }
}

/// Normalize the document-type tag to pick the guidance text.
fn classify_guidance(document_type: Option<&str>) -> Guidance {
    match document_type {
        Some(tag) if tag.trim().to_lowercase().contains("tenant") => Guidance::TenantData,
        _ => Guidance::ReviewPage,
    }
}
