#![deny(missing_docs)]
//! heatmap_srv is a realtime shared heatmap server.
//!
//! Any number of clients connect over a websocket and drop geolocated
//! pins. Nearby pins merge, each connection is rate limited, every
//! change is broadcast to everyone, and each connection can undo its
//! own recent actions.
//!
//! For the wire format, please see [wire].

/// This is a documentation module describing the heatmap_srv wire format.
///
/// #### 1. Realtime Channel
///
/// Clients open a websocket at `GET /ws`. Every message in either
/// direction is a JSON text frame with a `type` property.
///
/// ```text
/// Pin = {
///   "id": string,
///   "lat": number,
///   "lon": number,
///   "size": 1 | 2 | 3 | 4 | 5,
///   "ts": number,        // milliseconds since the unix epoch
///   "createdBy": string  // connection id of the creator
/// }
/// ```
///
/// Client to server:
///
/// - `{ "type": "submitPin", "lat": number, "lon": number, "size": number }`
///   - Numeric strings are accepted for any of the three numbers.
///     A blank string counts as `0`.
///   - `size` may be omitted. A size outside `1..=5` becomes `2`.
///   - A non-finite `lat` or `lon` is dropped without any response.
/// - `{ "type": "undo" }`
///   - Reverts this connection's most recent add or merge.
///   - Does nothing if there is nothing to undo, or if the pin
///     involved has since been removed.
///
/// Server to client:
///
/// - `{ "type": "init", "pins": [Pin, ..] }` - once, on connect.
/// - `{ "type": "pinAdded", "pin": Pin }` - to everyone.
/// - `{ "type": "pinUpdated", "pin": Pin }` - to everyone.
/// - `{ "type": "pinRemoved", "id": string }` - to everyone.
/// - `{ "type": "reset" }` - to everyone.
/// - `{ "type": "pinRejected", "reason": "rate_limit" }` - to the sender.
///
/// Every client receives broadcasts in the order the server processed
/// the events that caused them.
///
/// #### 2. Merging
///
/// - A submission within 10 meters (haversine) of an existing pin is
///   merged into the FIRST such pin in creation order, not the nearest.
/// - The merged pin keeps its coordinates and takes the larger size.
/// - Otherwise a new pin is created.
///
/// #### 3. Rate Limiting
///
/// - Each connection holds up to 3 tokens, starting full.
/// - Each submission spends one token, or is rejected if none remain.
/// - One token is credited per full 1500ms elapsed since the last credit.
///   Crediting discards any partial interval.
///
/// #### 4. Undo
///
/// - Each connection keeps its 50 most recent actions.
/// - Undoing an add removes the pin. Undoing a merge restores the size
///   the pin had before the merge.
/// - Connections cannot undo each other's actions.
///
/// #### 5. REST API
///
/// ```text
/// ErrResponse = { "error": string }
/// ```
///
/// - `POST /reset` with body `{ "password": string }`
///   - `{ "ok": true }` on success, after which all pins are gone and
///     every client has been sent `reset`.
///   - `403 ErrResponse` on a wrong password. Nothing is changed.
/// - `GET /pins.geojson`, `GET /pins.csv`, `GET /pins.kml`,
///   `GET /pins.gpx`
///   - The current pins in the respective format.
/// - `GET /health`
///   - `{}`
#[cfg(doc)]
pub mod wire {}

mod config;
pub use config::*;

mod timestamp;
pub use timestamp::*;

mod error;
pub use error::*;

mod id;
pub use id::*;

pub mod geo;

mod rate;
pub use rate::*;

mod store;
pub use store::*;

mod undo;
pub use undo::*;

mod protocol;
pub use protocol::*;

pub mod merge;
pub use merge::{Candidate, MergeOutcome, DEFAULT_MERGE_RADIUS_M};

mod dispatch;
pub use dispatch::*;

mod session;
pub use session::*;

mod export;
pub use export::*;

mod state;
pub use state::*;

mod http;
use http::*;

mod server;
pub use server::*;
