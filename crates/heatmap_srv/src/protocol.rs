//! Websocket message types: [crate::wire#1-realtime-channel].

use crate::*;

/// A number, or a string holding one.
///
/// Clients have historically sent form values straight through, so
/// `"52.1"` is accepted alongside `52.1`. A blank string is zero.
/// Strings that do not parse become NaN and are handled by validation
/// like any non-finite input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Num(pub f64);

impl<'de> serde::Deserialize<'de> for Num {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(f64),
            Str(String),
        }

        Ok(Num(match Raw::deserialize(deserializer)? {
            Raw::Num(n) => n,
            Raw::Str(s) => match s.trim() {
                "" => 0.0,
                s => s.parse().unwrap_or(f64::NAN),
            },
        }))
    }
}

/// Client to server messages.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Drop a pin.
    SubmitPin {
        /// Latitude in degrees.
        lat: Num,

        /// Longitude in degrees.
        lon: Num,

        /// Requested size.
        #[serde(default)]
        size: Option<Num>,
    },

    /// Reverse this connection's last action.
    Undo,
}

impl ClientMsg {
    /// Decode a text frame.
    pub fn parse(text: &str) -> PinResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Why a submission was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The connection's token bucket is empty.
    RateLimit,
}

/// Server to client messages.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMsg {
    /// Full snapshot, sent once to a newly connected client.
    Init {
        /// Every pin in insertion order.
        pins: Vec<Pin>,
    },

    /// A new pin.
    PinAdded {
        /// The pin.
        pin: Pin,
    },

    /// A changed pin.
    PinUpdated {
        /// The pin.
        pin: Pin,
    },

    /// A removed pin.
    PinRemoved {
        /// Id of the removed pin.
        id: Id,
    },

    /// All pins were cleared.
    Reset,

    /// The sender's submission was refused.
    PinRejected {
        /// Why.
        reason: RejectReason,
    },
}

impl ServerMsg {
    /// Encode as a text frame.
    pub fn encode(&self) -> String {
        // these types contain nothing that can fail to serialize
        serde_json::to_string(self).unwrap_or_default()
    }
}
