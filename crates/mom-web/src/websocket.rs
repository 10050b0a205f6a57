//! WebSocket handler streaming analysis progress for one scan.

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocketUpgrade},
        Path, State,
    },
    response::{IntoResponse, Response},
};
use futures::{sink::SinkExt, stream::StreamExt, Sink, Stream};
use mom_core::analysis::model::AnalysisState;
use mom_core::MomError;
use tokio::sync::watch;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// WebSocket upgrade handler for `/ws/scans/{id}`.
///
/// An unknown scan is a 404 whether or not the request is a valid upgrade.
pub async fn scan_progress(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let entry = match Uuid::parse_str(&id) {
        Ok(uuid) => state.scan(&uuid).await,
        Err(_) => None,
    };
    let Some(entry) = entry else {
        return ApiError::Core(MomError::UnknownScan(id)).into_response();
    };
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    // Only the receiver is kept, so removing the scan ends the stream.
    let rx = entry.simulator.subscribe();
    let scan_id = entry.id;
    drop(entry);

    ws.on_upgrade(move |socket| async move {
        info!(scan_id = %scan_id, "WebSocket client connected");
        let (sender, receiver) = socket.split();
        forward_states(sender, receiver, scan_id, rx).await;
        info!(scan_id = %scan_id, "WebSocket client disconnected");
    })
}

/// Forward every state change until the run is terminal, torn down, or the
/// client goes away. A close frame is sent on the way out.
async fn forward_states<S, R, E>(
    mut sender: S,
    mut receiver: R,
    scan_id: Uuid,
    mut rx: watch::Receiver<AnalysisState>,
) where
    S: Sink<Message> + Unpin,
    R: Stream<Item = Result<Message, E>> + Unpin,
{
    loop {
        let current = rx.borrow_and_update().clone();
        let json = match serde_json::to_string(&current) {
            Ok(json) => json,
            Err(e) => {
                debug!(error = %e, "Failed to serialize analysis state");
                break;
            }
        };
        debug!(scan_id = %scan_id, progress = current.progress(), "Sending analysis state");
        if sender.send(Message::Text(json.into())).await.is_err() {
            debug!("WebSocket send failed, client disconnected");
            break;
        }
        if current.is_terminal() {
            break;
        }

        if !wait_for_change(&mut rx, &mut receiver, scan_id).await {
            break;
        }
    }

    let _ = sender.send(Message::Close(None)).await;
}

/// Wait for the next state change, skipping client chatter.
/// Returns `false` once the scan is dismissed or the client disconnects.
async fn wait_for_change<R, E>(
    rx: &mut watch::Receiver<AnalysisState>,
    receiver: &mut R,
    scan_id: Uuid,
) -> bool
where
    R: Stream<Item = Result<Message, E>> + Unpin,
{
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    debug!(scan_id = %scan_id, "Scan dismissed");
                    return false;
                }
                return true;
            }
            msg = receiver.next() => match msg {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => {
                    debug!("WebSocket client sent close frame");
                    return false;
                }
                Some(Ok(_)) => {}
            },
        }
    }
}
