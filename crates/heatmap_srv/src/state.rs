//! The aggregate state owned by the worker thread.
//!
//! Every mutation of pins, sessions or the dispatcher registry goes
//! through a `&mut PinState` method, and exactly one thread holds the
//! `PinState`. Each method runs to completion before the next event
//! is looked at, which is what keeps merges, undos and broadcasts
//! consistent across connections.

use crate::*;

/// Result of a pin submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Submitted {
    /// The candidate was merged or added.
    Resolved(MergeOutcome),

    /// The connection's bucket was empty.
    RateLimited,
}

/// Result of an undo request.
#[derive(Debug, Clone, PartialEq)]
pub enum Undone {
    /// Nothing recorded, or the target pin is already gone.
    Nothing,

    /// A pin created by this connection was removed.
    Removed(Pin),

    /// A merge was reverted, this is the pin afterwards.
    Restored(Pin),
}

/// Pin store, sessions and dispatcher behind one owner.
pub struct PinState {
    rate_limit: RateLimit,
    merge_radius_m: f64,
    undo_depth: usize,
    reset_secret: String,
    store: PinStore,
    sessions: SessionMap,
    dispatch: Dispatcher,
}

impl PinState {
    /// Construct an empty state from server config.
    pub fn new(config: &Config) -> Self {
        Self {
            rate_limit: config.rate_limit(),
            merge_radius_m: config.merge_radius_m,
            undo_depth: config.undo_depth,
            reset_secret: config.reset_secret.clone(),
            store: PinStore::default(),
            sessions: SessionMap::default(),
            dispatch: Dispatcher::default(),
        }
    }

    /// Read access to the pin store.
    pub fn store(&self) -> &PinStore {
        &self.store
    }

    /// Count of connected clients.
    pub fn connection_count(&self) -> usize {
        self.sessions.len()
    }

    /// A new connection: open its session, register its outbound
    /// queue, and send it (only it) the current snapshot.
    pub fn connect(&mut self, conn: Id, outbound: Outbound, now: Timestamp) {
        tracing::debug!(%conn, "connect");
        self.sessions
            .open(conn.clone(), &self.rate_limit, self.undo_depth, now);
        self.dispatch.register(conn.clone(), outbound);
        self.dispatch.send_to(
            &conn,
            &ServerMsg::Init {
                pins: self.store.list().to_vec(),
            },
        );
    }

    /// A closed connection: forget its session and queue.
    pub fn disconnect(&mut self, conn: &Id) {
        tracing::debug!(%conn, "disconnect");
        self.sessions.close(conn);
        self.dispatch.unregister(conn);
    }

    /// Dispatch a decoded client message.
    pub fn handle_client_msg(
        &mut self,
        conn: &Id,
        msg: ClientMsg,
        now: Timestamp,
    ) -> PinResult<()> {
        match msg {
            ClientMsg::SubmitPin { lat, lon, size } => {
                self.submit(conn, lat.0, lon.0, size.map(|s| s.0), now)?;
            }
            ClientMsg::Undo => {
                self.undo(conn, now)?;
            }
        }
        Ok(())
    }

    /// Validate, rate limit, resolve, record and announce a submission.
    ///
    /// Invalid coordinates are reported as an error here, but nothing
    /// is sent to any client and no token is spent.
    pub fn submit(
        &mut self,
        conn: &Id,
        lat: f64,
        lon: f64,
        size: Option<f64>,
        now: Timestamp,
    ) -> PinResult<Submitted> {
        let candidate = Candidate::new(lat, lon, size)?;

        let session = self
            .sessions
            .get_mut(conn)
            .ok_or_else(|| PinError::UnknownConnection(conn.clone()))?;

        if !session.bucket.try_take(&self.rate_limit, now) {
            tracing::debug!(%conn, "rate limited");
            self.dispatch.send_to(
                conn,
                &ServerMsg::PinRejected {
                    reason: RejectReason::RateLimit,
                },
            );
            return Ok(Submitted::RateLimited);
        }

        let outcome = merge::resolve(
            &mut self.store,
            candidate,
            self.merge_radius_m,
            conn,
            now,
        );

        session.undo.push(outcome.undo_entry());
        self.dispatch.broadcast(&outcome.server_msg());

        Ok(Submitted::Resolved(outcome))
    }

    /// Reverse the connection's most recent action, if it still applies.
    pub fn undo(&mut self, conn: &Id, now: Timestamp) -> PinResult<Undone> {
        let entry = self
            .sessions
            .get_mut(conn)
            .ok_or_else(|| PinError::UnknownConnection(conn.clone()))?
            .undo
            .pop();

        let out = match entry {
            None => Undone::Nothing,
            Some(UndoEntry::Add { pin_id }) => {
                match self.store.remove_by_id(&pin_id) {
                    None => Undone::Nothing,
                    Some(pin) => {
                        self.dispatch.broadcast(&ServerMsg::PinRemoved {
                            id: pin.id.clone(),
                        });
                        Undone::Removed(pin)
                    }
                }
            }
            Some(UndoEntry::Merge {
                pin_id,
                previous_size,
            }) => match self.store.update_size(&pin_id, previous_size, now) {
                None => Undone::Nothing,
                Some(pin) => {
                    let pin = pin.clone();
                    self.dispatch
                        .broadcast(&ServerMsg::PinUpdated { pin: pin.clone() });
                    Undone::Restored(pin)
                }
            },
        };

        tracing::trace!(%conn, ?out, "undo");

        Ok(out)
    }

    /// Clear every pin and tell everyone, if the secret matches.
    ///
    /// On a mismatch nothing is touched.
    pub fn reset(&mut self, secret: &str) -> PinResult<()> {
        if secret != self.reset_secret {
            return Err(PinError::Unauthorized);
        }

        tracing::info!(cleared = self.store.len(), "reset");
        self.store.clear();
        self.dispatch.broadcast(&ServerMsg::Reset);

        Ok(())
    }

    /// Render the current pins in an export format.
    pub fn export(&self, format: ExportFormat) -> String {
        format.render(self.store.list())
    }
}
