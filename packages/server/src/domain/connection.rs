//! Live connection model: the outbound handle shared with the registry and the
//! per-connection session state.

use tokio::sync::mpsc::{self, error::TrySendError};

use super::{
    error::ConnectionError,
    value_object::{ConnectionId, Timestamp, UserId},
};

/// Close code sent to a connection replaced under the single-session policy.
pub const CLOSE_SUPERSEDED: u16 = 4000;

/// Close code sent when the authentication handshake deadline elapses.
pub const CLOSE_AUTH_TIMEOUT: u16 = 4001;

/// Frames a connection may have queued before further writes to it fail.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// How many simultaneous connections a user may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPolicy {
    /// Every device/tab keeps its own connection
    #[default]
    MultiDevice,
    /// A new connection closes and replaces the user's previous ones
    SingleSession,
}

/// Command consumed by a connection's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// A serialized JSON frame
    Text(String),
    /// Send a close frame and stop writing
    Close { code: u16, reason: String },
}

/// Cloneable handle to one live connection.
///
/// All writes go through a bounded queue drained by a single writer task, so
/// frames enqueued concurrently (replies from the connection's own task, pushes
/// from the dispatcher) are never interleaved on the transport. Writes never
/// wait: a peer that stops reading fills its queue and further writes fail.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sender: mpsc::Sender<Outbound>,
    connected_at: Timestamp,
}

impl ConnectionHandle {
    /// Create a new handle around the connection's outbound queue.
    pub fn new(
        id: ConnectionId,
        sender: mpsc::Sender<Outbound>,
        connected_at: Timestamp,
    ) -> Self {
        Self {
            id,
            sender,
            connected_at,
        }
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Milliseconds between connecting and `now`.
    pub fn connected_for_ms(&self, now: Timestamp) -> i64 {
        now.value() - self.connected_at.value()
    }

    /// Enqueue a text frame.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::QueueFull` when the peer has fallen
    /// `OUTBOUND_QUEUE_CAPACITY` frames behind, and `ConnectionError::Closed` when
    /// the writer task has already stopped.
    pub fn send_text(&self, text: String) -> Result<(), ConnectionError> {
        self.enqueue(Outbound::Text(text))
    }

    /// Enqueue a close frame. Closing an already closed connection is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::QueueFull` when the close frame could not be
    /// queued behind pending writes.
    pub fn close(&self, code: u16, reason: impl Into<String>) -> Result<(), ConnectionError> {
        match self.enqueue(Outbound::Close {
            code,
            reason: reason.into(),
        }) {
            Err(ConnectionError::Closed(_)) => Ok(()),
            other => other,
        }
    }

    fn enqueue(&self, outbound: Outbound) -> Result<(), ConnectionError> {
        self.sender.try_send(outbound).map_err(|e| match e {
            TrySendError::Full(_) => ConnectionError::QueueFull(self.id.to_string()),
            TrySendError::Closed(_) => ConnectionError::Closed(self.id.to_string()),
        })
    }

    /// Whether the writer side has gone away.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Authentication state of one connection.
///
/// `Connected` → `Authenticated` happens at most once; any state may move to
/// `Closed`, which is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Connected,
    Authenticated(UserId),
    Closed,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// The resolved user, once authenticated.
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Self::Authenticated(user_id) => Some(user_id),
            _ => None,
        }
    }

    /// Bind the verified user to this connection.
    ///
    /// # Errors
    ///
    /// Fails unless the connection is still `Connected`.
    pub fn authenticate(&mut self, user_id: UserId) -> Result<(), ConnectionError> {
        match self {
            Self::Connected => {
                *self = Self::Authenticated(user_id);
                Ok(())
            }
            Self::Authenticated(_) => Err(ConnectionError::AlreadyAuthenticated),
            Self::Closed => Err(ConnectionError::SessionClosed),
        }
    }

    /// Handshake deadline elapsed. Closes the session only if it is still
    /// unauthenticated and reports whether it did.
    pub fn expire(&mut self) -> bool {
        if matches!(self, Self::Connected) {
            *self = Self::Closed;
            true
        } else {
            false
        }
    }

    /// Move to `Closed`, returning the previous state the first time only.
    pub fn close(&mut self) -> Option<SessionState> {
        match std::mem::replace(self, Self::Closed) {
            Self::Closed => None,
            previous => Some(previous),
        }
    }
}
