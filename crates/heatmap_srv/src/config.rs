//! config types.

/// Configuration for running a HeatmapSrv.
#[derive(Debug, Clone)]
pub struct Config {
    /// The address(es) at which to listen.
    ///
    /// Defaults:
    /// - `testing = "[127.0.0.1:0]"`
    /// - `production = "[0.0.0.0:3000]"`
    pub listen_address_list: Vec<std::net::SocketAddr>,

    /// The shared secret that must accompany a reset request.
    ///
    /// Defaults:
    /// - `testing = "test-secret"`
    /// - `production = "geheim123"`
    pub reset_secret: String,

    /// How many submissions a connection may make in a burst.
    ///
    /// Defaults:
    /// - `testing = 3`
    /// - `production = 3`
    pub rate_burst: u32,

    /// A connection is credited one submission per full interval.
    /// Partial intervals are not carried over once a credit is made.
    ///
    /// Defaults:
    /// - `testing = 1500ms`
    /// - `production = 1500ms`
    pub rate_interval: std::time::Duration,

    /// A submission within this many meters of an existing pin is
    /// merged into it rather than creating a new pin.
    ///
    /// Defaults:
    /// - `testing = 10.0`
    /// - `production = 10.0`
    pub merge_radius_m: f64,

    /// How many actions each connection can undo.
    ///
    /// Defaults:
    /// - `testing = 50`
    /// - `production = 50`
    pub undo_depth: usize,

    /// If set, unmatched GET requests are served from this directory.
    ///
    /// Default:
    /// - `None`
    pub static_dir: Option<std::path::PathBuf>,

    /// How long an http request will wait on the pin worker before
    /// responding with an error.
    ///
    /// Defaults:
    /// - `testing = 10s`
    /// - `production = 10s`
    pub request_timeout: std::time::Duration,
}

impl Config {
    /// Get a heatmap_srv config suitable for testing.
    pub fn testing() -> Self {
        Self {
            listen_address_list: vec![(std::net::Ipv4Addr::LOCALHOST, 0).into()],
            reset_secret: "test-secret".to_string(),
            rate_burst: 3,
            rate_interval: std::time::Duration::from_millis(1500),
            merge_radius_m: crate::DEFAULT_MERGE_RADIUS_M,
            undo_depth: crate::DEFAULT_UNDO_DEPTH,
            static_dir: None,
            request_timeout: std::time::Duration::from_secs(10),
        }
    }

    /// Get a heatmap_srv config suitable for production.
    pub fn production() -> Self {
        Self {
            listen_address_list: vec![
                (std::net::Ipv4Addr::UNSPECIFIED, 3000).into(),
            ],
            reset_secret: "geheim123".to_string(),
            ..Self::testing()
        }
    }

    /// The token bucket parameters described by this config.
    pub fn rate_limit(&self) -> crate::RateLimit {
        crate::RateLimit {
            burst: self.rate_burst,
            interval: self.rate_interval,
        }
    }
}
