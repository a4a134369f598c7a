//! Heatmap error types.

/// Reasons an inbound request is dropped or refused.
#[derive(Debug, thiserror::Error)]
pub enum PinError {
    /// A submission whose coordinates are not finite numbers.
    #[error("non-finite coordinate (lat: {lat}, lon: {lon})")]
    NonFiniteCoordinate {
        /// The submitted latitude.
        lat: f64,

        /// The submitted longitude.
        lon: f64,
    },

    /// A client message that could not be decoded.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// An event from a connection with no open session.
    #[error("unknown connection: {0}")]
    UnknownConnection(crate::Id),

    /// A reset attempted with the wrong secret.
    #[error("invalid password")]
    Unauthorized,
}

/// Heatmap result type.
pub type PinResult<T> = std::result::Result<T, PinError>;
