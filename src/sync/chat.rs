//! Chat synchronization: paginated history plus the live feed, merged by
//! message id.

use std::time::Duration;

use crate::common::{
    ChatId, CreateMessage, LiveEvent, Message, MessageId, NewMessage, Page, ServerErrorResponse,
    UserId,
};
use crate::error::ApiError;
use crate::network::live::{LiveFeed, LiveSettings, chat_feed_url};
use crate::network::{ApiClient, ConnectionState};
use crate::state::ToastQueue;

use super::dedup::dedup_by_key;
use super::report_failure;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Appended,
    /// Already present; dropped without touching the sequence.
    Duplicate,
}

/// What applying one live event did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveUpdate {
    Appended(MessageId),
    Duplicate(MessageId),
    Connected,
    Disconnected { retry_in: Duration },
}

/// Client-side view of one chat, owned by the chat screen for its lifetime.
///
/// Callers check [`ChatSession::is_loading`] before asking for another page;
/// loads are not coalesced.
pub struct ChatSession {
    api: ApiClient,
    toasts: ToastQueue,
    live_settings: LiveSettings,
    user_id: UserId,
    chat_id: Option<ChatId>,
    messages: Vec<Message>,
    current_page: u32,
    history_loaded: bool,
    has_more: bool,
    is_loading: bool,
    is_submitting: bool,
    first_time: bool,
    error: Option<ServerErrorResponse>,
    live: Option<LiveFeed>,
}

impl ChatSession {
    /// `first_time` marks a chat that has no messages on the server yet.
    pub fn new(
        api: ApiClient,
        toasts: ToastQueue,
        live_settings: LiveSettings,
        user_id: UserId,
        chat_id: Option<ChatId>,
        first_time: bool,
    ) -> Self {
        Self {
            api,
            toasts,
            live_settings,
            user_id,
            chat_id,
            messages: Vec::new(),
            current_page: 0,
            history_loaded: false,
            has_more: true,
            is_loading: false,
            is_submitting: false,
            first_time,
            error: None,
            live: None,
        }
    }

    pub fn chat_id(&self) -> Option<ChatId> {
        self.chat_id
    }

    /// Attach the session to a chat created after it was opened.
    pub fn set_chat_id(&mut self, chat_id: ChatId) {
        if self.chat_id != Some(chat_id) {
            self.teardown();
            self.chat_id = Some(chat_id);
            self.messages.clear();
            self.current_page = 0;
            self.history_loaded = false;
            self.has_more = true;
        }
    }

    /// Oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn is_first_time(&self) -> bool {
        self.first_time
    }

    pub fn error(&self) -> Option<&ServerErrorResponse> {
        self.error.as_ref()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.live
            .as_ref()
            .map_or(ConnectionState::Closed, LiveFeed::state)
    }

    /// Fetches history page `page` (0 = newest) and merges it.
    pub async fn load_page(&mut self, page: u32) -> Result<(), ApiError> {
        let Some(chat_id) = self.chat_id else {
            return Ok(());
        };

        self.is_loading = true;
        let result = self
            .api
            .get_page::<Message>(&format!("chats/{chat_id}"), page)
            .await;
        self.is_loading = false;

        match result {
            Ok(fetched) => {
                self.error = None;
                self.merge_page(page, fetched);
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                log::info!("Chat {chat_id} has no history yet");
                if page == 0 {
                    self.messages.clear();
                }
                self.current_page = page;
                self.history_loaded = true;
                self.has_more = false;
                Ok(())
            }
            Err(err) => {
                self.error = report_failure(
                    &self.toasts,
                    "fetching messages",
                    &err,
                    "Something went wrong, please try again later",
                );
                Err(err)
            }
        }
    }

    /// Loads the page after the last one merged, or page 0 when no history
    /// has been merged yet (sent or live messages don't count).
    pub async fn load_older(&mut self) -> Result<(), ApiError> {
        if !self.has_more {
            return Ok(());
        }
        let next = if self.history_loaded {
            self.current_page + 1
        } else {
            0
        };
        self.load_page(next).await
    }

    /// Merges one history page. The server sends pages newest-first; page 0
    /// replaces the sequence and older pages go in front of it.
    pub fn merge_page(&mut self, page_index: u32, page: Page<Message>) {
        let exhausted = page.is_exhausted();
        let mut batch = page.content;
        batch.reverse();

        self.messages = if page_index == 0 {
            dedup_by_key(batch)
        } else {
            let existing = std::mem::take(&mut self.messages);
            dedup_by_key(batch.into_iter().chain(existing))
        };
        self.current_page = page_index;
        self.history_loaded = true;
        self.has_more = !exhausted;
    }

    /// Appends a message unless its id is already present.
    pub fn apply_message(&mut self, message: Message) -> MergeOutcome {
        if self.messages.iter().any(|existing| existing.id == message.id) {
            log::debug!("Dropping duplicate message {}", message.id);
            return MergeOutcome::Duplicate;
        }
        self.messages.push(message);
        MergeOutcome::Appended
    }

    /// Opens the live feed. Returns false when one is already running, the
    /// chat is not known yet, or there is no runtime to drive a socket.
    pub fn connect_live_feed(&mut self) -> bool {
        if self.live.is_some() {
            return false;
        }
        let Some(chat_id) = self.chat_id else {
            return false;
        };
        if tokio::runtime::Handle::try_current().is_err() {
            log::debug!("No async runtime, live feed for chat {chat_id} not started");
            return false;
        }
        let Some(token) = self.api.session().access_token() else {
            log::warn!("Not signed in, live feed for chat {chat_id} not started");
            return false;
        };

        let url = match chat_feed_url(&self.live_settings.ws_base, self.user_id, chat_id, &token) {
            Ok(url) => url,
            Err(err) => {
                log::error!("Cannot open live feed for chat {chat_id}: {err}");
                return false;
            }
        };

        self.live = Some(LiveFeed::spawn(url, self.live_settings.backoff));
        true
    }

    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }

    /// Waits for the next live event and applies it. `None` without a feed.
    pub async fn next_live_event(&mut self) -> Option<LiveUpdate> {
        let event = self.live.as_mut()?.recv().await?;
        Some(self.apply_event(event))
    }

    /// Applies every live event already queued, without waiting.
    pub fn drain_live(&mut self) -> Vec<LiveUpdate> {
        let mut updates = Vec::new();
        while let Some(event) = self.live.as_mut().and_then(LiveFeed::try_recv) {
            updates.push(self.apply_event(event));
        }
        updates
    }

    fn apply_event(&mut self, event: LiveEvent) -> LiveUpdate {
        match event {
            LiveEvent::Message(message) => {
                let id = message.id;
                match self.apply_message(message) {
                    MergeOutcome::Appended => LiveUpdate::Appended(id),
                    MergeOutcome::Duplicate => LiveUpdate::Duplicate(id),
                }
            }
            LiveEvent::Connected => LiveUpdate::Connected,
            LiveEvent::Disconnected { retry_in } => LiveUpdate::Disconnected { retry_in },
        }
    }

    /// Sends a message and merges the server's copy right away; a later
    /// echo on the live feed is then dropped as a duplicate.
    pub async fn send_message(&mut self, message: NewMessage) -> Result<Message, ApiError> {
        self.is_submitting = true;
        let body = CreateMessage::new(message, self.first_time);
        let result = self.api.post::<_, Message>("chats/message", &body).await;
        self.is_submitting = false;

        match result {
            Ok(sent) => {
                self.first_time = false;
                self.error = None;
                if self.chat_id.is_none() {
                    self.chat_id = Some(sent.chat_id);
                }
                self.apply_message(sent.clone());
                Ok(sent)
            }
            Err(err) => {
                self.error = report_failure(
                    &self.toasts,
                    "sending message",
                    &err,
                    "Failed to send message. Please try again.",
                );
                Err(err)
            }
        }
    }

    /// Closes the live feed. Safe to call at any time, any number of times.
    pub fn teardown(&mut self) {
        if let Some(feed) = self.live.take() {
            feed.shutdown();
            log::info!("Live feed for chat {:?} torn down", self.chat_id);
        }
    }
}
