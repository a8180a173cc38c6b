//! Realtime notification endpoints: channel token issuance and the SSE
//! stream.
//!
//! The stream is authenticated by the channel token alone (the browser's
//! EventSource cannot set custom headers), so the route lives outside the
//! identity-header middleware. The token is the capability: it binds the
//! subscription to one user id and expires after an hour with no renewal.

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use futures::Stream;
use portico_services::NotificationBridge;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast;
use utoipa::{IntoParams, ToSchema};

use crate::auth::models::SessionContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct ChannelTokenResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issue a channel token for the realtime notification stream.
///
/// Fetched fresh per subscription attempt; a new token is only issued when
/// the caller starts another cycle.
#[utoipa::path(
    post,
    path = "/api/v1/realtime/token",
    tag = "realtime",
    responses(
        (status = 200, description = "Channel token bound to the caller", body = ChannelTokenResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn issue_channel_token(
    session: SessionContext,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ChannelTokenResponse>, HttpAppError> {
    let issued = state.channel_tokens.issue(session.identity.user_id)?;
    Ok(Json(ChannelTokenResponse {
        token: issued.token,
        expires_at: issued.expires_at,
    }))
}

#[derive(Deserialize, IntoParams)]
pub struct StreamQuery {
    pub token: String,
}

/// Subscribe to registry insert notifications.
///
/// Events for other users are dropped server-side by the user filter and
/// again by the bridge; each (user, file, status) triple is delivered once.
/// The stream ends silently when the token expires.
#[utoipa::path(
    get,
    path = "/api/v1/realtime/stream",
    tag = "realtime",
    params(StreamQuery),
    responses(
        (status = 200, description = "SSE stream of extraction notifications"),
        (status = 401, description = "Invalid or expired channel token", body = ErrorResponse)
    )
)]
pub async fn stream_notifications(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StreamQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let claims = state.channel_tokens.verify(&query.token)?;

    let mut bridge = NotificationBridge::new(claims.sub);
    bridge.begin_authorizing()?;
    let receiver = state.feed.subscribe();
    bridge.subscribed()?;

    tracing::debug!(user_id = %claims.sub, "Realtime subscription established");

    let expires_at = claims.exp;
    let stream = notification_stream(receiver, bridge, expires_at);
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn notification_stream(
    receiver: broadcast::Receiver<portico_core::models::RegistryEvent>,
    bridge: NotificationBridge,
    expires_at: i64,
) -> impl Stream<Item = Result<Event, Infallible>> {
    futures::stream::unfold(
        (receiver, bridge),
        move |(mut receiver, mut bridge)| async move {
            loop {
                // Token lifetime bounds the subscription: once past expiry
                // the stream just ends, matching the no-renewal policy.
                if Utc::now().timestamp() >= expires_at {
                    tracing::debug!("Channel token expired, closing stream");
                    return None;
                }
                match receiver.recv().await {
                    Ok(event) => {
                        if let Some(notification) = bridge.on_event(&event) {
                            match Event::default().event("notification").json_data(&notification)
                            {
                                Ok(sse_event) => {
                                    return Some((
                                        Ok::<_, Infallible>(sse_event),
                                        (receiver, bridge),
                                    ));
                                }
                                Err(e) => {
                                    tracing::warn!(error = %e, "Failed to encode notification");
                                }
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Realtime subscriber lagged behind the feed");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use portico_core::models::{ExtractionStatus, RegistryEvent};
    use portico_services::RegistryFeed;
    use uuid::Uuid;

    fn subscribed_bridge(user_id: Uuid) -> NotificationBridge {
        let mut bridge = NotificationBridge::new(user_id);
        bridge.begin_authorizing().unwrap();
        bridge.subscribed().unwrap();
        bridge
    }

    #[tokio::test]
    async fn test_stream_emits_only_matching_user_events() {
        let feed = RegistryFeed::new(16);
        let user_id = Uuid::new_v4();
        let receiver = feed.subscribe();
        let far_future = Utc::now().timestamp() + 3600;
        let mut stream =
            Box::pin(notification_stream(receiver, subscribed_bridge(user_id), far_future));

        feed.publish(RegistryEvent {
            user_id: Uuid::new_v4(),
            file_name: "other.pdf".to_string(),
            extraction_status: ExtractionStatus::Passed,
            document_type: None,
        });
        feed.publish(RegistryEvent {
            user_id,
            file_name: "lease.pdf".to_string(),
            extraction_status: ExtractionStatus::Passed,
            document_type: Some("Rent Roll".to_string()),
        });

        // The foreign event is skipped; the first yielded item is ours.
        let event = stream.next().await.unwrap().unwrap();
        let rendered = format!("{:?}", event);
        assert!(rendered.contains("lease.pdf"));
    }

    #[tokio::test]
    async fn test_stream_ends_when_token_already_expired() {
        let feed = RegistryFeed::new(16);
        let user_id = Uuid::new_v4();
        let receiver = feed.subscribe();
        let past = Utc::now().timestamp() - 10;
        let mut stream =
            Box::pin(notification_stream(receiver, subscribed_bridge(user_id), past));
        assert!(stream.next().await.is_none());
    }
}
