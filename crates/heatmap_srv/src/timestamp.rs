/// Heatmap timestamp.
///
/// Internally i64 milliseconds from unix epoch, which is also the
/// resolution clients and the export formats work with.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Construct a new timestamp of "now".
    pub fn now() -> Self {
        std::time::SystemTime::now().into()
    }

    /// Construct a timestamp from i64 milliseconds since unix epoch.
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Get the i64 milliseconds since unix epoch.
    pub fn as_millis(&self) -> i64 {
        self.0
    }

    /// Milliseconds elapsed between `earlier` and self.
    ///
    /// Negative if the clock went backwards.
    pub fn millis_since(&self, earlier: Timestamp) -> i64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl From<std::time::SystemTime> for Timestamp {
    fn from(t: std::time::SystemTime) -> Self {
        Self(
            t.duration_since(std::time::SystemTime::UNIX_EPOCH)
                .map(|d| d.as_millis() as i64)
                .unwrap_or(0),
        )
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
