//! Scripted upstream for testing without a board
//!
//! [`MockUpstream`] answers GET requests from per-path scripts and
//! [`MockConnector`] hands out scripted event stream sessions. Both are cheap
//! to clone; clones share their scripts and counters so a test can keep a
//! handle for assertions after moving the mock into the code under test.

use crate::error::{BridgeError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::client::{HttpReply, UpstreamApi};
use super::events::{MessageStream, StreamConnector};

#[derive(Debug, Clone)]
enum Scripted {
    Reply(HttpReply),
    Fail,
}

/// [`UpstreamApi`] answering from per-path scripts
///
/// Each path replays its script in order and then keeps repeating the last
/// entry. Unscripted paths answer 404.
#[derive(Debug, Clone, Default)]
pub struct MockUpstream {
    scripts: Arc<Mutex<HashMap<String, VecDeque<Scripted>>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a reply to a path's script
    pub fn with_reply(self, path: &str, reply: HttpReply) -> Self {
        self.push(path, Scripted::Reply(reply));
        self
    }

    /// Append a transport failure to a path's script
    pub fn with_error(self, path: &str) -> Self {
        self.push(path, Scripted::Fail);
        self
    }

    /// Replace a path's script with a single reply
    pub fn set_reply(&self, path: &str, reply: HttpReply) {
        self.lock_scripts()
            .insert(path.to_string(), VecDeque::from([Scripted::Reply(reply)]));
    }

    /// Replace a path's script with a single transport failure
    pub fn set_error(&self, path: &str) {
        self.lock_scripts()
            .insert(path.to_string(), VecDeque::from([Scripted::Fail]));
    }

    /// Paths requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn push(&self, path: &str, entry: Scripted) {
        self.lock_scripts()
            .entry(path.to_string())
            .or_default()
            .push_back(entry);
    }

    fn lock_scripts(&self) -> std::sync::MutexGuard<'_, HashMap<String, VecDeque<Scripted>>> {
        self.scripts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_for(&self, path: &str) -> Option<Scripted> {
        let mut scripts = self.lock_scripts();
        let script = scripts.get_mut(path)?;
        if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        }
    }
}

#[async_trait]
impl UpstreamApi for MockUpstream {
    async fn get(&self, path: &str, _timeout: Duration) -> Result<HttpReply> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(path.to_string());

        match self.next_for(path) {
            Some(Scripted::Reply(reply)) => Ok(reply),
            Some(Scripted::Fail) => Err(BridgeError::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("scripted failure for {}", path),
            ))),
            None => Ok(HttpReply::new(404, "")),
        }
    }
}

// ==================== Event Stream ====================

/// How a scripted session ends once its messages are consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The peer closes the stream
    Close,
    /// The stream fails with an error
    Error,
    /// The stream stays open without further messages
    Hang,
}

/// One scripted connection
#[derive(Debug, Clone)]
pub struct MockSession {
    messages: VecDeque<String>,
    end: SessionEnd,
}

impl MockSession {
    pub fn new(messages: Vec<String>, end: SessionEnd) -> Self {
        Self {
            messages: messages.into(),
            end,
        }
    }

    /// Deliver `messages`, then close
    pub fn closing(messages: Vec<String>) -> Self {
        Self::new(messages, SessionEnd::Close)
    }

    /// Deliver `messages`, then stay open
    pub fn hanging(messages: Vec<String>) -> Self {
        Self::new(messages, SessionEnd::Hang)
    }
}

/// [`StreamConnector`] handing out scripted sessions
///
/// Once the script is exhausted every connect yields an idle open stream.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    sessions: Arc<Mutex<VecDeque<Option<MockSession>>>>,
    attempts: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a session for the next successful connect
    pub fn with_session(self, session: MockSession) -> Self {
        self.queue(Some(session));
        self
    }

    /// Queue a refused connection attempt
    pub fn refuse_once(self) -> Self {
        self.queue(None);
        self
    }

    /// Connection attempts so far
    pub fn connect_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Streams closed from our side
    pub fn closed_streams(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    fn queue(&self, entry: Option<MockSession>) {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(entry);
    }
}

#[async_trait]
impl StreamConnector for MockConnector {
    async fn connect(&self) -> Result<Box<dyn MessageStream>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let next = self
            .sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();

        match next {
            Some(None) => Err(BridgeError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "scripted refusal",
            ))),
            Some(Some(session)) => Ok(Box::new(MockStream {
                session,
                closed: self.closed.clone(),
            })),
            None => Ok(Box::new(MockStream {
                session: MockSession::hanging(Vec::new()),
                closed: self.closed.clone(),
            })),
        }
    }

    fn endpoint(&self) -> String {
        "mock://events".to_string()
    }
}

struct MockStream {
    session: MockSession,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl MessageStream for MockStream {
    async fn next_text(&mut self) -> Option<Result<String>> {
        if let Some(message) = self.session.messages.pop_front() {
            return Some(Ok(message));
        }
        match self.session.end {
            SessionEnd::Close => None,
            SessionEnd::Error => Some(Err(BridgeError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "scripted reset",
            )))),
            SessionEnd::Hang => std::future::pending().await,
        }
    }

    async fn close(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}
