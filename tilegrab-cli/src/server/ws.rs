//! WebSocket control channel.
//!
//! Clients send `{"type": ..., "data": ...}` text frames to start or cancel
//! downloads and receive every [`DownloadEvent`] of the sessions they start,
//! encoded the same way.
//!
//! [`DownloadEvent`]: tilegrab::DownloadEvent

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tilegrab::download::{AreaDownloadRequest, EventEmitter, WorldDownloadRequest};
use tilegrab::{DownloadEvent, DownloadService};
use tracing::{debug, info, warn};

use super::AppState;

/// Inbound control messages.
///
/// Payloads stay raw until dispatch so a malformed request can be answered
/// with an `error` event instead of being dropped with the frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    StartDownload(Value),
    StartWorldDownload(Value),
    CancelDownload,
}

/// `GET /ws`
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    info!("Control client connected");

    let (mut sink, mut stream) = socket.split();
    let (events, mut rx) = EventEmitter::channel(state.service.config().event_buffer);

    let forwarder = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "Failed to encode event");
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => dispatch(&state.service, &text, &events).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "Control socket read failed");
                break;
            }
        }
    }

    // A running session keeps downloading; its events are dropped from here on
    forwarder.abort();
    info!("Control client disconnected");
}

/// Decodes one text frame and acts on it.
///
/// Unparseable frames are logged and ignored. Requests whose payload does
/// not decode are answered with an `error` event.
pub(crate) async fn dispatch(service: &DownloadService, text: &str, events: &EventEmitter) {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            warn!(error = %e, "Ignoring unparseable control message");
            return;
        }
    };

    match message {
        ClientMessage::StartDownload(data) => {
            match serde_json::from_value::<AreaDownloadRequest>(data) {
                Ok(request) => {
                    // Rejections are reported on `events` by the service
                    let _ = service.start_area(request, events.clone());
                }
                Err(e) => {
                    warn!(error = %e, "Invalid area download request");
                    events
                        .emit(DownloadEvent::error("Invalid download request"))
                        .await;
                }
            }
        }
        ClientMessage::StartWorldDownload(data) => {
            match serde_json::from_value::<WorldDownloadRequest>(data) {
                Ok(request) => {
                    let _ = service.start_world(request, events.clone());
                }
                Err(e) => {
                    warn!(error = %e, "Invalid world download request");
                    events
                        .emit(DownloadEvent::error("Invalid world download request"))
                        .await;
                }
            }
        }
        ClientMessage::CancelDownload => {
            if !service.cancel() {
                debug!("Cancel requested with no download running");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tilegrab::cache::MemoryTileStore;
    use tokio::sync::mpsc::error::TryRecvError;
    use tokio::sync::mpsc::Receiver;

    use super::*;
    use crate::server::test_support::{service, TEMPLATE};

    async fn next_terminal(rx: &mut Receiver<DownloadEvent>) -> Vec<DownloadEvent> {
        let mut seen = Vec::new();
        while let Some(event) = rx.recv().await {
            let done = event.is_terminal();
            seen.push(event);
            if done {
                break;
            }
        }
        seen
    }

    #[test]
    fn test_decode_client_messages() {
        let start: ClientMessage =
            serde_json::from_str(r#"{"type":"start_download","data":{"map_style":"x"}}"#)
                .unwrap();
        assert_eq!(
            start,
            ClientMessage::StartDownload(serde_json::json!({ "map_style": "x" }))
        );

        let cancel: ClientMessage = serde_json::from_str(r#"{"type":"cancel_download"}"#).unwrap();
        assert_eq!(cancel, ClientMessage::CancelDownload);

        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"reboot"}"#).is_err());
    }

    #[tokio::test]
    async fn test_malformed_payload_reports_error() {
        let service = service(Arc::new(MemoryTileStore::new()));
        let (events, mut rx) = EventEmitter::channel(8);

        dispatch(
            &service,
            r#"{"type":"start_download","data":{"polygons":"nope"}}"#,
            &events,
        )
        .await;
        dispatch(
            &service,
            r#"{"type":"start_world_download","data":[1,2]}"#,
            &events,
        )
        .await;

        assert_eq!(
            rx.recv().await,
            Some(DownloadEvent::error("Invalid download request"))
        );
        assert_eq!(
            rx.recv().await,
            Some(DownloadEvent::error("Invalid world download request"))
        );
        assert!(!service.is_running());
    }

    #[tokio::test]
    async fn test_unparseable_frame_is_ignored() {
        let service = service(Arc::new(MemoryTileStore::new()));
        let (events, mut rx) = EventEmitter::channel(8);

        dispatch(&service, "not json", &events).await;
        dispatch(&service, r#"{"type":"cancel_download"}"#, &events).await;

        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn test_area_download_over_control_messages() {
        let store = Arc::new(MemoryTileStore::new());
        let service = service(store.clone());
        let (events, mut rx) = EventEmitter::channel(256);

        let frame = serde_json::json!({
            "type": "start_download",
            "data": {
                "polygons": [[
                    { "lat": 48.86, "lng": 2.34 },
                    { "lat": 48.86, "lng": 2.36 },
                    { "lat": 48.85, "lng": 2.36 },
                    { "lat": 48.85, "lng": 2.34 }
                ]],
                "min_zoom": 10,
                "max_zoom": 12,
                "map_style": TEMPLATE
            }
        });
        dispatch(&service, &frame.to_string(), &events).await;

        let seen = next_terminal(&mut rx).await;
        let Some(DownloadEvent::DownloadStarted { total_tiles }) = seen.first().cloned() else {
            panic!("unexpected first event: {:?}", seen.first());
        };
        assert!(total_tiles > 0);
        assert_eq!(seen.last(), Some(&DownloadEvent::DownloadComplete));
        assert_eq!(store.len(), total_tiles);
    }

    #[tokio::test(start_paused = true)]
    async fn test_world_download_can_be_cancelled() {
        let service = service(Arc::new(MemoryTileStore::new()));
        let (events, mut rx) = EventEmitter::channel(1024);

        let start = serde_json::json!({
            "type": "start_world_download",
            "data": { "map_style": TEMPLATE, "convert_to_8bit": false }
        });
        dispatch(&service, &start.to_string(), &events).await;

        assert_eq!(
            rx.recv().await,
            Some(DownloadEvent::DownloadStarted { total_tiles: 21845 })
        );
        assert!(service.is_running());

        dispatch(&service, r#"{"type":"cancel_download"}"#, &events).await;

        let seen = next_terminal(&mut rx).await;
        assert_eq!(seen.last(), Some(&DownloadEvent::DownloadCancelled));
    }
}
