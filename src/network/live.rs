//! Live chat feed: one WebSocket at a time, reconnected with backoff until
//! the owner shuts it down.

use futures::StreamExt;
use reqwest::Url;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as Frame;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;

use crate::common::{ChatId, LiveEvent, Message, UserId};
use crate::error::ApiError;

use super::backoff::{BackoffConfig, ConnectionState, Reconnector};

const EVENT_BUFFER: usize = 256;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Where and how chat sessions open their live feed.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveSettings {
    pub ws_base: String,
    pub backoff: BackoffConfig,
}

/// `<ws_base>/chat?userId=..&chatId=..&token=..`
pub fn chat_feed_url(
    ws_base: &str,
    user_id: UserId,
    chat_id: ChatId,
    token: &str,
) -> Result<Url, ApiError> {
    let raw = format!("{}/chat", ws_base.trim_end_matches('/'));
    let mut url = Url::parse(&raw).map_err(|_| ApiError::InvalidUrl(raw.clone()))?;
    url.query_pairs_mut()
        .append_pair("userId", &user_id.to_string())
        .append_pair("chatId", &chat_id.to_string())
        .append_pair("token", token);
    Ok(url)
}

/// Handle to a running feed task. Dropping it shuts the task down.
pub struct LiveFeed {
    events: mpsc::Receiver<LiveEvent>,
    state: watch::Receiver<ConnectionState>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl LiveFeed {
    /// Must be called from within a Tokio runtime.
    pub fn spawn(url: Url, backoff: BackoffConfig) -> Self {
        let (event_tx, events) = mpsc::channel(EVENT_BUFFER);
        let (state_tx, state) = watch::channel(ConnectionState::Connecting);
        let cancel = CancellationToken::new();

        let worker = FeedWorker {
            url,
            reconnector: Reconnector::new(backoff),
            events: event_tx,
            state: state_tx,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(worker.run());

        Self {
            events,
            state,
            cancel,
            task,
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Next event; `None` once the feed has shut down and drained.
    pub async fn recv(&mut self) -> Option<LiveEvent> {
        self.events.recv().await
    }

    pub fn try_recv(&mut self) -> Option<LiveEvent> {
        self.events.try_recv().ok()
    }

    /// Safe to call repeatedly.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

enum PumpExit {
    /// Socket closed or failed; reconnect.
    Dropped,
    /// Shutdown requested or nobody is listening anymore.
    Stopped,
}

struct FeedWorker {
    url: Url,
    reconnector: Reconnector,
    events: mpsc::Sender<LiveEvent>,
    state: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
}

impl FeedWorker {
    async fn run(mut self) {
        log::info!("Live feed started for {}", self.url.path());

        loop {
            self.publish_state();
            let attempt = tokio::select! {
                _ = self.cancel.cancelled() => break,
                result = connect_async(self.url.as_str()) => result,
            };

            match attempt {
                Ok((socket, _)) => {
                    self.reconnector.opened();
                    self.publish_state();
                    log::info!("Live feed connected");
                    if self.events.send(LiveEvent::Connected).await.is_err() {
                        break;
                    }
                    if let PumpExit::Stopped = self.pump(socket).await {
                        break;
                    }
                }
                Err(err) => log::debug!("Live feed connect failed: {err}"),
            }

            let Some(delay) = self.reconnector.dropped() else {
                break;
            };
            self.publish_state();
            log::warn!("Live feed disconnected, reconnecting in {delay:?}");
            if self
                .events
                .send(LiveEvent::Disconnected { retry_in: delay })
                .await
                .is_err()
            {
                break;
            }

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
            self.reconnector.retry();
        }

        self.reconnector.close();
        self.publish_state();
        log::info!("Live feed closed");
    }

    async fn pump(&mut self, mut socket: Socket) -> PumpExit {
        loop {
            let frame = tokio::select! {
                _ = self.cancel.cancelled() => {
                    if let Err(err) = socket.close(None).await {
                        log::debug!("Live feed close handshake failed: {err}");
                    }
                    return PumpExit::Stopped;
                }
                frame = socket.next() => frame,
            };

            let parsed = match frame {
                Some(Ok(Frame::Text(text))) => serde_json::from_str::<Message>(&text),
                Some(Ok(Frame::Binary(bytes))) => serde_json::from_slice::<Message>(&bytes),
                Some(Ok(Frame::Close(reason))) => {
                    log::debug!("Live feed closed by server: {reason:?}");
                    return PumpExit::Dropped;
                }
                Some(Ok(_)) => continue,
                Some(Err(err)) => {
                    log::debug!("Live feed socket error: {err}");
                    return PumpExit::Dropped;
                }
                None => return PumpExit::Dropped,
            };

            match parsed {
                Ok(message) => {
                    if self.events.send(LiveEvent::Message(message)).await.is_err() {
                        return PumpExit::Stopped;
                    }
                }
                Err(err) => log::warn!("Dropping unreadable live frame: {err}"),
            }
        }
    }

    fn publish_state(&self) {
        self.state.send_replace(self.reconnector.state());
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::time::Duration;

    use futures::SinkExt;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;
    use tokio_tungstenite::tungstenite::Message as Frame;

    use crate::common::Message;

    /// Local WebSocket server. Each accepted connection receives the next
    /// batch of messages and is then closed by the server.
    pub async fn serve_batches(batches: Vec<Vec<Message>>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            for batch in batches {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let mut socket = accept_async(stream).await.unwrap();
                for message in batch {
                    let text = serde_json::to_string(&message).unwrap();
                    socket.send(Frame::Text(text)).await.unwrap();
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
                let _ = socket.close(None).await;
            }
            // Late reconnects are accepted and dropped straight away.
            loop {
                if listener.accept().await.is_err() {
                    return;
                }
            }
        });

        format!("ws://{addr}")
    }

    pub fn fast_backoff() -> super::BackoffConfig {
        super::BackoffConfig {
            min_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
            growth: 1.3,
        }
    }
}
