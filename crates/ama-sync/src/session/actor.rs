//! Session actor
//!
//! Single owner of the store and overlay. Commands from the handle, completions from
//! spawned network tasks and notices from the live channel are applied one at a time;
//! every visible change is published as a fresh [`RoomView`].

use std::collections::HashMap;
use std::sync::Arc;

use ama_core::{
    ApiResult, Message, MessageId, ReactionDirection, ReactionOutcome, RoomApi, RoomEvent, RoomId,
    SyncError, SyncResult,
};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::view::{ReactionReceipt, RoomView, SessionNotice, SessionNoticeKind};
use crate::channel::{ChannelNotice, ChannelState, LiveEventChannel};
use crate::overlay::{ReactionOverlay, ReactionTicket};
use crate::store::{CountAuthority, MessageStore};

/// Requests from the [`RoomSession`](super::RoomSession) handle
#[derive(Debug)]
pub(crate) enum Command {
    Load {
        reply: oneshot::Sender<SyncResult<usize>>,
    },
    React {
        message_id: MessageId,
        /// `None` toggles
        direction: Option<ReactionDirection>,
        reply: oneshot::Sender<SyncResult<ReactionReceipt>>,
    },
    Close {
        reply: oneshot::Sender<()>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchPurpose {
    Seed,
    Resync,
}

/// Results posted back by spawned network tasks
#[derive(Debug)]
enum Completion {
    Fetched {
        purpose: FetchPurpose,
        result: ApiResult<Vec<Message>>,
    },
    Reacted {
        ticket: ReactionTicket,
        result: ApiResult<u64>,
    },
}

pub(crate) struct SessionActor {
    room_id: RoomId,
    api: Arc<dyn RoomApi>,
    resync_on_reconnect: bool,

    store: MessageStore,
    overlay: ReactionOverlay,
    connection: ChannelState,

    channel: LiveEventChannel,
    channel_rx: mpsc::Receiver<ChannelNotice>,
    commands: mpsc::Receiver<Command>,
    completions_tx: mpsc::Sender<Completion>,
    completions_rx: mpsc::Receiver<Completion>,

    view_tx: watch::Sender<RoomView>,
    notice_tx: broadcast::Sender<SessionNotice>,

    fetch_in_flight: Option<FetchPurpose>,
    resync_requested: bool,
    load_waiters: Vec<oneshot::Sender<SyncResult<usize>>>,
    reaction_waiters: HashMap<MessageId, oneshot::Sender<SyncResult<ReactionReceipt>>>,
    tasks: Vec<JoinHandle<()>>,
}

pub(crate) struct ActorParts {
    pub room_id: RoomId,
    pub api: Arc<dyn RoomApi>,
    pub resync_on_reconnect: bool,
    pub buffer: usize,
    pub channel: LiveEventChannel,
    pub channel_rx: mpsc::Receiver<ChannelNotice>,
    pub commands: mpsc::Receiver<Command>,
    pub view_tx: watch::Sender<RoomView>,
    pub notice_tx: broadcast::Sender<SessionNotice>,
}

impl SessionActor {
    pub(crate) fn new(parts: ActorParts) -> Self {
        let (completions_tx, completions_rx) = mpsc::channel(parts.buffer);
        Self {
            room_id: parts.room_id,
            api: parts.api,
            resync_on_reconnect: parts.resync_on_reconnect,
            store: MessageStore::new(),
            overlay: ReactionOverlay::new(),
            connection: ChannelState::Idle,
            channel: parts.channel,
            channel_rx: parts.channel_rx,
            commands: parts.commands,
            completions_tx,
            completions_rx,
            view_tx: parts.view_tx,
            notice_tx: parts.notice_tx,
            fetch_in_flight: None,
            resync_requested: false,
            load_waiters: Vec::new(),
            reaction_waiters: HashMap::new(),
            tasks: Vec::new(),
        }
    }

    pub(crate) async fn run(mut self) {
        let mut channel_done = false;
        let mut close_reply = None;

        loop {
            tokio::select! {
                biased;

                cmd = self.commands.recv() => match cmd {
                    Some(Command::Close { reply }) => {
                        close_reply = Some(reply);
                        break;
                    }
                    Some(Command::Load { reply }) => self.load(reply),
                    Some(Command::React { message_id, direction, reply }) => {
                        self.react(message_id, direction, reply);
                    }
                    // Handle dropped
                    None => break,
                },

                Some(done) = self.completions_rx.recv() => self.handle_completion(done),

                notice = self.channel_rx.recv(), if !channel_done => match notice {
                    Some(notice) => self.handle_channel(notice),
                    None => {
                        channel_done = true;
                        self.set_connection(ChannelState::Closed);
                    }
                },
            }
        }

        self.teardown().await;
        if let Some(reply) = close_reply {
            let _ = reply.send(());
        }
    }

    // =========================================================================
    // Commands
    // =========================================================================

    fn load(&mut self, reply: oneshot::Sender<SyncResult<usize>>) {
        if self.store.is_seeded() {
            let _ = reply.send(Ok(self.store.len()));
            return;
        }
        self.load_waiters.push(reply);
        if self.fetch_in_flight != Some(FetchPurpose::Seed) {
            self.start_fetch(FetchPurpose::Seed);
        }
    }

    fn react(
        &mut self,
        message_id: MessageId,
        direction: Option<ReactionDirection>,
        reply: oneshot::Sender<SyncResult<ReactionReceipt>>,
    ) {
        if !self.store.contains(&message_id) {
            warn!(message_id = %message_id, "Reaction for unknown message");
            let _ = reply.send(Err(SyncError::UnknownMessage(message_id)));
            return;
        }

        let direction = direction.unwrap_or_else(|| self.overlay.toggle_direction(&message_id));
        let ticket = match self.overlay.begin_reaction(&message_id, direction) {
            Ok(ticket) => ticket,
            Err(e) => {
                let _ = reply.send(Err(e));
                return;
            }
        };
        self.reaction_waiters.insert(message_id.clone(), reply);
        self.publish();

        debug!(message_id = %message_id, %direction, "Sending reaction");
        let api = Arc::clone(&self.api);
        let room_id = self.room_id.clone();
        let tx = self.completions_tx.clone();
        self.spawn(async move {
            let result = api
                .react(&room_id, ticket.message_id(), ticket.direction())
                .await;
            // Nowhere to land after teardown
            let _ = tx.send(Completion::Reacted { ticket, result }).await;
        });
    }

    // =========================================================================
    // Completions
    // =========================================================================

    fn handle_completion(&mut self, done: Completion) {
        match done {
            Completion::Fetched { purpose, result } => self.fetched(purpose, result),
            Completion::Reacted { ticket, result } => self.reacted(ticket, result),
        }
    }

    fn fetched(&mut self, purpose: FetchPurpose, result: ApiResult<Vec<Message>>) {
        self.fetch_in_flight = None;

        match (purpose, result) {
            (FetchPurpose::Seed, Ok(messages)) => {
                let fetched = messages.len();
                self.store.seed(messages);
                info!(fetched, total = self.store.len(), "Room loaded");
                for waiter in self.load_waiters.drain(..) {
                    let _ = waiter.send(Ok(self.store.len()));
                }
                self.publish();
            }
            (FetchPurpose::Seed, Err(e)) => {
                warn!(error = %e, "Bulk read failed");
                for waiter in self.load_waiters.drain(..) {
                    let _ = waiter.send(Err(e.clone()));
                }
                self.notify(SessionNoticeKind::LoadFailed(e));
            }
            (FetchPurpose::Resync, Ok(messages)) => {
                let before = self.store.len();
                let mut changed = false;
                for message in messages {
                    let id = message.id.clone();
                    let authority = self.authority_for(&id);
                    if self.store.upsert(message, authority) {
                        changed = true;
                        if let Some(count) = self.store.get(&id).map(|m| m.reaction_count) {
                            self.overlay.observe_count(&id, count);
                        }
                    }
                }
                info!(added = self.store.len() - before, "Room resynced");
                if changed {
                    self.publish();
                }
            }
            (FetchPurpose::Resync, Err(e)) => {
                warn!(error = %e, "Resync after reconnect failed");
            }
        }

        if self.resync_requested && self.store.is_seeded() {
            self.resync_requested = false;
            self.start_fetch(FetchPurpose::Resync);
        }
    }

    fn reacted(&mut self, ticket: ReactionTicket, result: ApiResult<u64>) {
        let outcome = match &result {
            Ok(count) => ReactionOutcome::Confirmed(*count),
            Err(_) => ReactionOutcome::Failed,
        };

        if let Err(e) = self
            .overlay
            .resolve_reaction(&ticket, outcome, &mut self.store)
        {
            debug!(error = %e, "Dropping reaction completion");
            return;
        }
        self.publish();

        let waiter = self.reaction_waiters.remove(ticket.message_id());
        let reply = match result {
            Ok(count) => Ok(ReactionReceipt {
                message_id: ticket.message_id().clone(),
                direction: ticket.direction(),
                count,
            }),
            Err(e) => {
                warn!(message_id = %ticket.message_id(), error = %e, "Reaction failed");
                self.notify(SessionNoticeKind::ReactionFailed {
                    message_id: ticket.message_id().clone(),
                    error: e.clone(),
                });
                Err(e)
            }
        };
        if let Some(waiter) = waiter {
            let _ = waiter.send(reply);
        }
    }

    // =========================================================================
    // Live channel
    // =========================================================================

    fn handle_channel(&mut self, notice: ChannelNotice) {
        match notice {
            ChannelNotice::Event(event) => self.apply_event(event),
            ChannelNotice::StateChanged(state) => self.set_connection(state),
            ChannelNotice::Reconnected { attempts } => {
                self.notify(SessionNoticeKind::Recovered { attempts });
                if self.resync_on_reconnect {
                    self.request_resync();
                }
            }
            ChannelNotice::Degraded { attempts } => {
                self.notify(SessionNoticeKind::Degraded { attempts });
            }
        }
    }

    fn apply_event(&mut self, event: RoomEvent) {
        let changed = match event {
            // The event's count only holds at creation; a known message keeps its newer one
            RoomEvent::MessageCreated(message) => {
                self.store.upsert(message, CountAuthority::Preserve)
            }
            RoomEvent::ReactionCountChanged { id, count } => {
                let patched = self.store.patch_reaction_count(&id, count).unwrap_or(false);
                self.overlay.observe_count(&id, count) || patched
            }
            RoomEvent::MessageAnswered { id } => self.store.mark_answered(&id).unwrap_or(false),
        };
        if changed {
            self.publish();
        }
    }

    fn request_resync(&mut self) {
        if self.fetch_in_flight.is_some() {
            // The read in flight may predate the gap
            self.resync_requested = true;
        } else if self.store.is_seeded() {
            self.start_fetch(FetchPurpose::Resync);
        } else {
            debug!("Skipping resync, room not loaded yet");
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Counts are server truth, except while this client's own request is in flight
    fn authority_for(&self, id: &MessageId) -> CountAuthority {
        if self.overlay.is_pending(id) {
            CountAuthority::Preserve
        } else {
            CountAuthority::Authoritative
        }
    }

    fn start_fetch(&mut self, purpose: FetchPurpose) {
        self.fetch_in_flight = Some(purpose);
        debug!(?purpose, "Issuing bulk read");

        let api = Arc::clone(&self.api);
        let room_id = self.room_id.clone();
        let tx = self.completions_tx.clone();
        self.spawn(async move {
            let result = api.fetch_messages(&room_id).await;
            let _ = tx.send(Completion::Fetched { purpose, result }).await;
        });
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.tasks.retain(|task| !task.is_finished());
        self.tasks.push(tokio::spawn(task));
    }

    fn set_connection(&mut self, state: ChannelState) {
        if self.connection != state {
            self.connection = state;
            self.publish();
        }
    }

    fn publish(&self) {
        let view = RoomView {
            messages: self.store.snapshot(),
            reactions: self.overlay.snapshot(),
            connection: self.connection,
            loaded: self.store.is_seeded(),
        };
        self.view_tx.send_replace(view);
    }

    fn notify(&self, kind: SessionNoticeKind) {
        // No subscribers is fine
        let _ = self.notice_tx.send(SessionNotice::now(kind));
    }

    async fn teardown(&mut self) {
        // Unblocks a channel task waiting on a full queue
        self.channel_rx.close();
        self.channel.close().await;
        for task in self.tasks.drain(..) {
            task.abort();
        }
        // Dropping the waiters resolves their callers with SessionClosed
        self.load_waiters.clear();
        self.reaction_waiters.clear();

        self.connection = ChannelState::Closed;
        self.publish();
        info!(room_id = %self.room_id, "Room session closed");
    }
}
