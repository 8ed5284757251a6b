//! In-memory fakes of the network ports
//!
//! Replies are scripted per call. A deferred reply hands the test a `oneshot::Sender`
//! so it decides exactly when the "server" answers.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use ama_core::{
    ApiResult, EventStream, EventTransport, Message, MessageId, RoomApi, RoomId, SyncError,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

enum Reply<T> {
    Ready(T),
    Deferred(oneshot::Receiver<T>),
}

impl<T> Reply<T> {
    async fn resolve(self) -> ApiResult<T>
    where
        T: Send,
    {
        match self {
            Self::Ready(value) => Ok(value),
            Self::Deferred(rx) => rx
                .await
                .map_err(|_| SyncError::network("scripted reply dropped")),
        }
    }
}

/// Scripted [`RoomApi`]
///
/// An unscripted fetch never completes; an unscripted reaction fails.
#[derive(Default)]
pub(crate) struct FakeApi {
    fetches: Mutex<VecDeque<Reply<ApiResult<Vec<Message>>>>>,
    reactions: Mutex<VecDeque<Reply<ApiResult<u64>>>>,
    fetch_calls: AtomicUsize,
    reaction_calls: AtomicUsize,
}

impl FakeApi {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn push_fetch(&self, result: ApiResult<Vec<Message>>) {
        self.fetches.lock().push_back(Reply::Ready(result));
    }

    pub(crate) fn defer_fetch(&self) -> oneshot::Sender<ApiResult<Vec<Message>>> {
        let (tx, rx) = oneshot::channel();
        self.fetches.lock().push_back(Reply::Deferred(rx));
        tx
    }

    pub(crate) fn push_reaction(&self, result: ApiResult<u64>) {
        self.reactions.lock().push_back(Reply::Ready(result));
    }

    pub(crate) fn defer_reaction(&self) -> oneshot::Sender<ApiResult<u64>> {
        let (tx, rx) = oneshot::channel();
        self.reactions.lock().push_back(Reply::Deferred(rx));
        tx
    }

    pub(crate) fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn reaction_calls(&self) -> usize {
        self.reaction_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoomApi for FakeApi {
    async fn fetch_messages(&self, _room_id: &RoomId) -> ApiResult<Vec<Message>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.fetches.lock().pop_front();
        match reply {
            Some(reply) => reply.resolve().await?,
            None => std::future::pending().await,
        }
    }

    async fn add_reaction(&self, _room_id: &RoomId, _message_id: &MessageId) -> ApiResult<u64> {
        self.next_reaction().await
    }

    async fn remove_reaction(&self, _room_id: &RoomId, _message_id: &MessageId) -> ApiResult<u64> {
        self.next_reaction().await
    }
}

impl FakeApi {
    async fn next_reaction(&self) -> ApiResult<u64> {
        self.reaction_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.reactions.lock().pop_front();
        match reply {
            Some(reply) => reply.resolve().await?,
            None => Err(SyncError::network("no scripted reaction reply")),
        }
    }
}

enum Frame {
    Text(String),
    Fail,
}

/// One scripted websocket connection
#[derive(Clone)]
pub(crate) struct StreamScript {
    tx: mpsc::UnboundedSender<Frame>,
    rx: Arc<Mutex<Option<mpsc::UnboundedReceiver<Frame>>>>,
    closed: Arc<AtomicBool>,
}

impl StreamScript {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Arc::new(Mutex::new(Some(rx))),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn send(&self, text: &str) {
        let _ = self.tx.send(Frame::Text(text.to_string()));
    }

    /// Simulate a network error on this connection
    pub(crate) fn drop_connection(&self) {
        let _ = self.tx.send(Frame::Fail);
    }

    pub(crate) fn was_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

struct FakeStream {
    rx: mpsc::UnboundedReceiver<Frame>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl EventStream for FakeStream {
    async fn next_frame(&mut self) -> Option<Result<String, SyncError>> {
        match self.rx.recv().await? {
            Frame::Text(text) => Some(Ok(text)),
            Frame::Fail => Some(Err(SyncError::ChannelDrop("connection reset".into()))),
        }
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

enum Connect {
    Stream(StreamScript),
    Fail,
}

/// Scripted [`EventTransport`]
///
/// Each connect consumes the next scripted outcome; with none left it never completes,
/// or fails at once after [`refuse_all`](Self::refuse_all).
#[derive(Default)]
pub(crate) struct FakeTransport {
    outcomes: Mutex<VecDeque<Connect>>,
    connects: AtomicUsize,
    refusing: AtomicBool,
}

impl FakeTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn push_stream(&self, script: StreamScript) {
        self.outcomes.lock().push_back(Connect::Stream(script));
    }

    pub(crate) fn push_failure(&self) {
        self.outcomes.lock().push_back(Connect::Fail);
    }

    pub(crate) fn refuse_all(&self) {
        self.refusing.store(true, Ordering::SeqCst);
    }

    pub(crate) fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventTransport for FakeTransport {
    async fn connect(&self, _room_id: &RoomId) -> Result<Box<dyn EventStream>, SyncError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let outcome = self.outcomes.lock().pop_front();
        match outcome {
            Some(Connect::Stream(script)) => {
                let rx = script
                    .rx
                    .lock()
                    .take()
                    .ok_or_else(|| SyncError::ChannelDrop("script already used".into()))?;
                Ok(Box::new(FakeStream {
                    rx,
                    closed: script.closed,
                }))
            }
            Some(Connect::Fail) => Err(SyncError::ChannelDrop("connection refused".into())),
            None if self.refusing.load(Ordering::SeqCst) => {
                Err(SyncError::ChannelDrop("connection refused".into()))
            }
            None => std::future::pending().await,
        }
    }
}
