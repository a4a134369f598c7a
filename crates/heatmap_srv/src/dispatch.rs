//! Fan-out of server messages to connected clients.

use crate::*;
use std::collections::HashMap;
use std::sync::Arc;

/// How many encoded frames may wait for one websocket before that
/// client is considered too slow and is dropped.
pub const OUTBOUND_QUEUE_DEPTH: usize = 256;

/// Queue of encoded text frames headed to one websocket.
pub type Outbound = tokio::sync::mpsc::Sender<Arc<str>>;

/// Receiving end of an [Outbound] queue.
pub type OutboundRecv = tokio::sync::mpsc::Receiver<Arc<str>>;

/// A new outbound queue of [OUTBOUND_QUEUE_DEPTH].
pub fn outbound_queue() -> (Outbound, OutboundRecv) {
    tokio::sync::mpsc::channel(OUTBOUND_QUEUE_DEPTH)
}

/// Registry of outbound queues keyed by connection id.
///
/// Messages are pushed in the order they are dispatched, so each
/// client sees broadcasts in processing order. A queue that is full
/// or closed is unregistered. Dropping the sender ends that socket's
/// writer, which closes the websocket.
#[derive(Default)]
pub struct Dispatcher {
    clients: HashMap<Id, Outbound>,
}

impl Dispatcher {
    /// Start delivering to a connection.
    pub fn register(&mut self, conn: Id, outbound: Outbound) {
        self.clients.insert(conn, outbound);
    }

    /// Stop delivering to a connection.
    pub fn unregister(&mut self, conn: &Id) {
        self.clients.remove(conn);
    }

    /// Count of registered connections.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// True if nobody is connected.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Send to every connection, originator included.
    pub fn broadcast(&mut self, msg: &ServerMsg) {
        let enc: Arc<str> = msg.encode().into();
        tracing::trace!(clients = self.clients.len(), %enc, "broadcast");
        self.clients
            .retain(|conn, out| deliver(conn, out, enc.clone()));
    }

    /// Send to a single connection.
    pub fn send_to(&mut self, conn: &Id, msg: &ServerMsg) {
        let Some(out) = self.clients.get(conn) else {
            return;
        };
        if !deliver(conn, out, msg.encode().into()) {
            self.clients.remove(conn);
        }
    }
}

/// Push one frame, returning false if the queue should be dropped.
fn deliver(conn: &Id, out: &Outbound, enc: Arc<str>) -> bool {
    use tokio::sync::mpsc::error::TrySendError;

    match out.try_send(enc) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            tracing::debug!(%conn, "outbound queue full, dropping client");
            false
        }
        Err(TrySendError::Closed(_)) => {
            tracing::debug!(%conn, "outbound queue closed");
            false
        }
    }
}
