//! Per-connection session state.

use crate::*;
use std::collections::HashMap;

/// Ephemeral per-connection state.
#[derive(Debug)]
pub struct Session {
    /// Submission rate limiting.
    pub bucket: RateBucket,

    /// This connection's own undo history.
    pub undo: UndoStack,
}

/// Sessions keyed by connection id.
///
/// Entries are created on connect and removed on disconnect, so
/// memory does not grow with connection churn.
#[derive(Debug, Default)]
pub struct SessionMap(HashMap<Id, Session>);

impl SessionMap {
    /// Create a fresh session: full bucket, empty undo stack.
    ///
    /// Replaces any existing session under the same id.
    pub fn open(
        &mut self,
        conn: Id,
        limit: &RateLimit,
        undo_depth: usize,
        now: Timestamp,
    ) {
        self.0.insert(
            conn,
            Session {
                bucket: RateBucket::new(limit, now),
                undo: UndoStack::new(undo_depth),
            },
        );
    }

    /// Drop a session.
    pub fn close(&mut self, conn: &Id) -> Option<Session> {
        self.0.remove(conn)
    }

    /// Access a session.
    pub fn get_mut(&mut self, conn: &Id) -> Option<&mut Session> {
        self.0.get_mut(conn)
    }

    /// Count of open sessions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no sessions are open.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
