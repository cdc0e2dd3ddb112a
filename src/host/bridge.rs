//! # Host Bridge
//!
//! Turns [`HostRequest`]s from the editor into host calls.
//!
//! Requests are sorted into ordered lanes. Everything aimed at one item
//! (saves, renames, deletes and runs) shares that item's lane and reaches the
//! host in the order it was issued, so a run always sees the content saved
//! just before it. Selection changes share one lane, as do key assignments.
//! Lanes run concurrently with each other, so a slow save on one item never
//! holds up a selection notify or work on another item.
//!
//! Host calls are bounded by the configured timeout. Script runs are not:
//! a run leaves its lane once the writes before it are done and lasts as long
//! as the script does. Failures come back to the view as [`HostReply::Failed`].

use super::{Host, HostError, HostReply, HostRequest};
use crate::item::ItemId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::{JoinHandle, JoinSet};

/// Ordering domain of a request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Lane {
    Item(ItemId),
    Selection,
    Keys,
}

impl Lane {
    /// `None` for requests that can run alongside anything
    fn of(request: &HostRequest) -> Option<Self> {
        match request {
            HostRequest::UpdateItemContent { id, .. }
            | HostRequest::RenameItem { id, .. }
            | HostRequest::DeleteItem { id }
            | HostRequest::RunItem { id } => Some(Lane::Item(id.clone())),
            HostRequest::SelectItem { .. } => Some(Lane::Selection),
            HostRequest::AssignKey { .. } => Some(Lane::Keys),
            HostRequest::AddItem => None,
        }
    }
}

/// Start serving requests until the request channel closes.
///
/// The returned handle completes once the channel is closed and every
/// queued or running call has finished, so awaiting it on shutdown keeps the
/// last save from being dropped.
pub fn spawn_bridge<H: Host>(
    host: Arc<H>,
    mut requests: UnboundedReceiver<HostRequest>,
    replies: UnboundedSender<HostReply>,
    timeout: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut in_flight = JoinSet::new();
        let mut lanes: HashMap<Lane, UnboundedSender<HostRequest>> = HashMap::new();

        loop {
            tokio::select! {
                request = requests.recv() => {
                    let Some(request) = request else { break };
                    match Lane::of(&request) {
                        Some(lane) => {
                            // A deleted item gets no further requests
                            let closes_lane = matches!(request, HostRequest::DeleteItem { .. });
                            let queue = lanes.entry(lane.clone()).or_insert_with(|| {
                                let (queue_tx, queue_rx) = mpsc::unbounded_channel();
                                in_flight.spawn(serve_lane(
                                    Arc::clone(&host),
                                    queue_rx,
                                    replies.clone(),
                                    timeout,
                                ));
                                queue_tx
                            });
                            if let Err(e) = queue.send(request) {
                                tracing::error!(target: "host.bridge", ?lane, request = ?e.0, "lane_closed");
                                lanes.remove(&lane);
                            } else if closes_lane {
                                lanes.remove(&lane);
                            }
                        }
                        None => {
                            let host = Arc::clone(&host);
                            let replies = replies.clone();
                            in_flight.spawn(async move {
                                handle_request(host.as_ref(), request, &replies, Some(timeout)).await;
                            });
                        }
                    }
                }
                Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
            }
        }

        drop(lanes);
        while in_flight.join_next().await.is_some() {}
        tracing::debug!(target: "host.bridge", "closed");
    })
}

/// Handle one lane's requests in order until its queue closes
async fn serve_lane<H: Host>(
    host: Arc<H>,
    mut queue: UnboundedReceiver<HostRequest>,
    replies: UnboundedSender<HostReply>,
    timeout: Duration,
) {
    let mut runs = JoinSet::new();

    while let Some(request) = queue.recv().await {
        if matches!(request, HostRequest::RunItem { .. }) {
            let host = Arc::clone(&host);
            let replies = replies.clone();
            runs.spawn(async move {
                handle_request(host.as_ref(), request, &replies, None).await;
            });
        } else {
            handle_request(host.as_ref(), request, &replies, Some(timeout)).await;
        }
        while runs.try_join_next().is_some() {}
    }

    while runs.join_next().await.is_some() {}
}

async fn handle_request<H: Host>(
    host: &H,
    request: HostRequest,
    replies: &UnboundedSender<HostReply>,
    timeout: Option<Duration>,
) {
    let context = request.context();
    tracing::debug!(target: "host.bridge", ?request, "dispatch");

    let result = match timeout {
        Some(timeout) => match tokio::time::timeout(timeout, call(host, request)).await {
            Ok(result) => result,
            Err(_) => Err(HostError::Timeout(timeout)),
        },
        None => call(host, request).await,
    };

    let reply = match result {
        Ok(Some(reply)) => reply,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!(target: "host.bridge", context, error = %e, "request_failed");
            HostReply::Failed {
                context,
                error: e.to_string(),
            }
        }
    };

    if replies.send(reply).is_err() {
        tracing::debug!(target: "host.bridge", context, "reply_dropped");
    }
}

async fn call<H: Host>(host: &H, request: HostRequest) -> Result<Option<HostReply>, HostError> {
    match request {
        HostRequest::UpdateItemContent { id, content } => {
            host.update_item_content(id, content).await?;
        }
        HostRequest::SelectItem { id } => host.select_item(id).await?,
        HostRequest::AddItem => {
            let item = host.add_item().await?;
            return Ok(Some(HostReply::ItemAdded(item)));
        }
        HostRequest::RenameItem { id, name } => host.rename_item(id, name).await?,
        HostRequest::DeleteItem { id } => host.delete_item(id).await?,
        HostRequest::AssignKey { id, key } => host.assign_key(id, key).await?,
        HostRequest::RunItem { id } => host.run_item(id).await?,
    }
    Ok(None)
}
