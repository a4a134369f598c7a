//! The in-memory pin store.
//!
//! ### Rationale
//!
//! - Nothing is persisted beyond a single process invocation.
//! - The store is owned by the single worker thread, so it needs no
//!   interior locking. See [crate::PinState].
//! - Insertion order is significant: it is the order the merge
//!   resolver scans in, and the order snapshots are sent in.

use crate::{Id, Timestamp};

/// Smallest pin size.
pub const MIN_SIZE: u8 = 1;

/// Largest pin size.
pub const MAX_SIZE: u8 = 5;

/// Size used when a submission carries an out-of-range size.
pub const DEFAULT_SIZE: u8 = 2;

/// One aggregated point of interest.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pin {
    /// Opaque unique id.
    pub id: Id,

    /// Latitude in degrees.
    pub lat: f64,

    /// Longitude in degrees.
    pub lon: f64,

    /// Intensity, within `MIN_SIZE..=MAX_SIZE`.
    pub size: u8,

    /// Last touched.
    pub ts: Timestamp,

    /// The connection that first created this pin.
    pub created_by: Id,
}

/// Insertion-ordered pin collection.
#[derive(Debug, Default)]
pub struct PinStore {
    pins: Vec<Pin>,
}

impl PinStore {
    /// All pins in insertion order.
    pub fn list(&self) -> &[Pin] {
        &self.pins
    }

    /// Count of pins held.
    pub fn len(&self) -> usize {
        self.pins.len()
    }

    /// True if no pins are held.
    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    /// Get a pin by id.
    pub fn get(&self, id: &Id) -> Option<&Pin> {
        self.pins.iter().find(|p| &p.id == id)
    }

    /// Append a pin. No uniqueness check is made.
    pub fn append(&mut self, pin: Pin) {
        self.pins.push(pin);
    }

    /// Remove a pin by id, preserving the order of the rest.
    pub fn remove_by_id(&mut self, id: &Id) -> Option<Pin> {
        let idx = self.pins.iter().position(|p| &p.id == id)?;
        Some(self.pins.remove(idx))
    }

    /// Set the size and touch time of a pin, returning the updated pin.
    pub fn update_size(
        &mut self,
        id: &Id,
        size: u8,
        now: Timestamp,
    ) -> Option<&Pin> {
        let pin = self.pins.iter_mut().find(|p| &p.id == id)?;
        pin.size = size;
        pin.ts = now;
        Some(pin)
    }

    /// Mutable access to the pins, in order, for the merge resolver.
    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, Pin> {
        self.pins.iter_mut()
    }

    /// Remove every pin.
    pub fn clear(&mut self) {
        self.pins.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn pin(id: &str, lat: f64) -> Pin {
        Pin {
            id: id.into(),
            lat,
            lon: 0.0,
            size: 1,
            ts: Timestamp::from_millis(0),
            created_by: "c".into(),
        }
    }

    #[test]
    fn happy_sanity() {
        let mut s = PinStore::default();
        s.append(pin("a", 1.0));
        s.append(pin("b", 2.0));
        s.append(pin("c", 3.0));

        let removed = s.remove_by_id(&"b".into()).unwrap();
        assert_eq!(2.0, removed.lat);
        assert!(s.remove_by_id(&"b".into()).is_none());

        let ids = s.list().iter().map(|p| p.id.as_str()).collect::<Vec<_>>();
        assert_eq!(vec!["a", "c"], ids);
    }

    #[test]
    fn update_size_touches() {
        let mut s = PinStore::default();
        s.append(pin("a", 1.0));

        let p = s
            .update_size(&"a".into(), 4, Timestamp::from_millis(99))
            .unwrap();
        assert_eq!(4, p.size);
        assert_eq!(99, p.ts.as_millis());

        assert!(s
            .update_size(&"zz".into(), 4, Timestamp::from_millis(99))
            .is_none());
    }

    #[test]
    fn clear_empties() {
        let mut s = PinStore::default();
        s.append(pin("a", 1.0));
        s.clear();
        assert!(s.is_empty());
        assert_eq!(0, s.len());
    }

    #[test]
    fn pin_json_shape() {
        let json = serde_json::to_value(pin("a", 1.5)).unwrap();
        assert_eq!(
            serde_json::json!({
                "id": "a",
                "lat": 1.5,
                "lon": 0.0,
                "size": 1,
                "ts": 0,
                "createdBy": "c",
            }),
            json,
        );
    }
}
