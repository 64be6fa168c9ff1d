//! WebSocket endpoint that registers live-reload subscribers.
//!
//! A browser page opens a WebSocket to the reload path; the connection is
//! registered before the upgrade handler returns control to the runtime, so
//! any broadcast that happens afterwards reaches it. Inbound frames are read
//! only to notice the peer going away.

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use futures_util::{SinkExt, StreamExt};

use crate::registry::{Subscriber, SubscriberRegistry};

/// Builds a router exposing the reload endpoint at `path`.
///
/// The router carries its own state and can be merged into any other.
///
/// # Examples
///
/// ```
/// use sack_reload::{SubscriberRegistry, notification_router};
///
/// let registry = SubscriberRegistry::new();
/// let router: axum::Router = notification_router(registry, "/ws");
/// ```
pub fn notification_router<S>(registry: SubscriberRegistry, path: &str) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route(path, get(upgrade_handler))
        .with_state(registry)
}

async fn upgrade_handler(
    ws: WebSocketUpgrade,
    State(registry): State<SubscriberRegistry>,
) -> impl IntoResponse {
    ws.on_failed_upgrade(|err| {
        tracing::warn!(error = %err, "WebSocket upgrade failed");
    })
    .on_upgrade(move |socket| serve_subscriber(socket, registry))
}

/// Drives one subscriber connection until either side ends it.
async fn serve_subscriber(socket: WebSocket, registry: SubscriberRegistry) {
    let (subscriber, mut inbox) = Subscriber::channel();
    let id = subscriber.id();
    registry.register(subscriber);

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            outgoing = inbox.recv() => {
                let Some(payload) = outgoing else {
                    // Removed from the registry.
                    break;
                };
                if let Err(err) = sink.send(Message::Text(payload.into())).await {
                    tracing::debug!(subscriber = %id, error = %err, "Send failed, dropping client");
                    break;
                }
            }
            incoming = stream.next() => match incoming {
                None | Some(Ok(Message::Close(_))) => break,
                Some(Err(err)) => {
                    tracing::debug!(subscriber = %id, error = %err, "Read failed, dropping client");
                    break;
                }
                Some(Ok(_)) => {}
            },
        }
    }

    registry.remove(id);
    let _ = sink.close().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_plain_get_is_rejected() {
        let app: Router = notification_router(SubscriberRegistry::new(), "/ws");

        let response = app
            .oneshot(Request::get("/ws").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_other_paths_are_not_routed() {
        let app: Router = notification_router(SubscriberRegistry::new(), "/live");

        let response = app
            .oneshot(Request::get("/ws").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
