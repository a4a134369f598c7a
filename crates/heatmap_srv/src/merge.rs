//! Fold a submission into an existing pin or create a new one.

use crate::*;

/// Default merge radius in meters.
pub const DEFAULT_MERGE_RADIUS_M: f64 = 10.0;

/// A validated pin submission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    lat: f64,
    lon: f64,
    size: u8,
}

impl Candidate {
    /// Validate raw submission values.
    ///
    /// Non-finite coordinates are an error. A missing, non-finite or
    /// out-of-range size is not: it becomes [DEFAULT_SIZE].
    /// In-range fractional sizes are rounded.
    pub fn new(lat: f64, lon: f64, size: Option<f64>) -> PinResult<Self> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(PinError::NonFiniteCoordinate { lat, lon });
        }

        let size = match size {
            Some(s) if (MIN_SIZE as f64..=MAX_SIZE as f64).contains(&s) => {
                s.round() as u8
            }
            _ => DEFAULT_SIZE,
        };

        Ok(Self { lat, lon, size })
    }

    /// Latitude.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude.
    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Clamped size.
    pub fn size(&self) -> u8 {
        self.size
    }
}

/// What the resolver did with a candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// Folded into an existing pin.
    Merged {
        /// The target pin after the merge.
        pin: Pin,

        /// The target's size before the merge.
        previous_size: u8,
    },

    /// A new pin was appended.
    Added {
        /// The new pin.
        pin: Pin,
    },
}

impl MergeOutcome {
    /// The entry that reverses this outcome.
    pub fn undo_entry(&self) -> UndoEntry {
        match self {
            Self::Merged { pin, previous_size } => UndoEntry::Merge {
                pin_id: pin.id.clone(),
                previous_size: *previous_size,
            },
            Self::Added { pin } => UndoEntry::Add {
                pin_id: pin.id.clone(),
            },
        }
    }

    /// The broadcast announcing this outcome.
    pub fn server_msg(&self) -> ServerMsg {
        match self {
            Self::Merged { pin, .. } => ServerMsg::PinUpdated { pin: pin.clone() },
            Self::Added { pin } => ServerMsg::PinAdded { pin: pin.clone() },
        }
    }
}

/// Resolve a candidate against the store.
///
/// The first pin in insertion order within `radius_m` is the merge
/// target, even if a later pin is nearer. The target keeps its own
/// coordinates, takes the larger size, and is touched.
pub fn resolve(
    store: &mut PinStore,
    candidate: Candidate,
    radius_m: f64,
    submitter: &Id,
    now: Timestamp,
) -> MergeOutcome {
    let here = (candidate.lat(), candidate.lon());

    if let Some(target) = store
        .iter_mut()
        .find(|p| geo::haversine_m(here, (p.lat, p.lon)) <= radius_m)
    {
        let previous_size = target.size;
        target.size = target.size.max(candidate.size());
        target.ts = now;
        return MergeOutcome::Merged {
            pin: target.clone(),
            previous_size,
        };
    }

    let pin = Pin {
        id: Id::generate(),
        lat: candidate.lat(),
        lon: candidate.lon(),
        size: candidate.size(),
        ts: now,
        created_by: submitter.clone(),
    };
    store.append(pin.clone());

    MergeOutcome::Added { pin }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ts(ms: i64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    fn c(lat: f64, lon: f64, size: f64) -> Candidate {
        Candidate::new(lat, lon, Some(size)).unwrap()
    }

    #[test]
    fn size_clamping() {
        assert_eq!(2, Candidate::new(0.0, 0.0, None).unwrap().size());
        assert_eq!(2, Candidate::new(0.0, 0.0, Some(0.0)).unwrap().size());
        assert_eq!(2, Candidate::new(0.0, 0.0, Some(6.0)).unwrap().size());
        assert_eq!(2, Candidate::new(0.0, 0.0, Some(-3.0)).unwrap().size());
        assert_eq!(
            2,
            Candidate::new(0.0, 0.0, Some(f64::NAN)).unwrap().size()
        );
        assert_eq!(1, Candidate::new(0.0, 0.0, Some(1.0)).unwrap().size());
        assert_eq!(5, Candidate::new(0.0, 0.0, Some(5.0)).unwrap().size());
        assert_eq!(5, Candidate::new(0.0, 0.0, Some(4.6)).unwrap().size());
    }

    #[test]
    fn non_finite_rejected() {
        assert!(matches!(
            Candidate::new(f64::NAN, 0.0, Some(3.0)),
            Err(PinError::NonFiniteCoordinate { .. })
        ));
        assert!(matches!(
            Candidate::new(0.0, f64::INFINITY, Some(3.0)),
            Err(PinError::NonFiniteCoordinate { .. })
        ));
    }

    #[test]
    fn add_then_merge() {
        let mut store = PinStore::default();
        let me: Id = "me".into();

        let out = resolve(
            &mut store,
            c(52.0, 13.0, 3.0),
            DEFAULT_MERGE_RADIUS_M,
            &me,
            ts(1),
        );
        let p1 = match out {
            MergeOutcome::Added { pin } => pin,
            oth => panic!("expected add, got {oth:?}"),
        };
        assert_eq!(me, p1.created_by);
        assert_eq!(3, p1.size);

        let out = resolve(
            &mut store,
            c(52.00005, 13.00003, 4.0),
            DEFAULT_MERGE_RADIUS_M,
            &"other".into(),
            ts(2),
        );
        match out {
            MergeOutcome::Merged { pin, previous_size } => {
                assert_eq!(p1.id, pin.id);
                assert_eq!(3, previous_size);
                assert_eq!(4, pin.size);
                assert_eq!(ts(2), pin.ts);
                // position retained
                assert_eq!(52.0, pin.lat);
                assert_eq!(13.0, pin.lon);
                // creator retained
                assert_eq!(me, pin.created_by);
            }
            oth => panic!("expected merge, got {oth:?}"),
        }
        assert_eq!(1, store.len());
    }

    #[test]
    fn merge_keeps_larger_size() {
        let mut store = PinStore::default();
        let me: Id = "me".into();
        resolve(&mut store, c(0.0, 0.0, 5.0), 10.0, &me, ts(0));
        let out = resolve(&mut store, c(0.0, 0.0, 1.0), 10.0, &me, ts(1));
        match out {
            MergeOutcome::Merged { pin, previous_size } => {
                assert_eq!(5, previous_size);
                assert_eq!(5, pin.size);
            }
            oth => panic!("expected merge, got {oth:?}"),
        }
    }

    #[test]
    fn first_match_not_nearest() {
        let mut store = PinStore::default();
        let me: Id = "me".into();

        // the two pins are ~13.3m apart
        let first = match resolve(&mut store, c(0.0, 0.0, 1.0), 10.0, &me, ts(0))
        {
            MergeOutcome::Added { pin } => pin,
            oth => panic!("{oth:?}"),
        };
        let second =
            match resolve(&mut store, c(0.00012, 0.0, 1.0), 10.0, &me, ts(0)) {
                MergeOutcome::Added { pin } => pin,
                oth => panic!("{oth:?}"),
            };
        assert_ne!(first.id, second.id);

        // ~7.2m from the first, ~6.1m from the second
        let out = resolve(&mut store, c(0.000065, 0.0, 2.0), 10.0, &me, ts(1));
        match out {
            MergeOutcome::Merged { pin, .. } => assert_eq!(first.id, pin.id),
            oth => panic!("expected merge, got {oth:?}"),
        }
    }

    #[test]
    fn radius_is_inclusive() {
        let mut store = PinStore::default();
        let me: Id = "me".into();
        resolve(&mut store, c(52.0, 13.0, 1.0), 10.0, &me, ts(0));

        let at = (52.00005, 13.0);
        let d = geo::haversine_m(at, (52.0, 13.0));
        let out = resolve(&mut store, c(at.0, at.1, 3.0), d, &me, ts(1));
        assert!(matches!(out, MergeOutcome::Merged { .. }), "{out:?}");

        // a radius just short of the distance adds instead
        let out = resolve(&mut store, c(at.0, at.1, 3.0), d * 0.999, &me, ts(2));
        assert!(matches!(out, MergeOutcome::Added { .. }), "{out:?}");
    }

    #[test]
    fn outside_radius_adds() {
        let mut store = PinStore::default();
        let me: Id = "me".into();
        resolve(&mut store, c(0.0, 0.0, 1.0), 10.0, &me, ts(0));
        // ~11m away
        let out = resolve(&mut store, c(0.0001, 0.0, 1.0), 10.0, &me, ts(0));
        assert!(matches!(out, MergeOutcome::Added { .. }));
        assert_eq!(2, store.len());
    }

    #[test]
    fn undo_entries() {
        let mut store = PinStore::default();
        let me: Id = "me".into();
        let out = resolve(&mut store, c(0.0, 0.0, 2.0), 10.0, &me, ts(0));
        let id = store.list()[0].id.clone();
        assert_eq!(UndoEntry::Add { pin_id: id.clone() }, out.undo_entry());

        let out = resolve(&mut store, c(0.0, 0.0, 4.0), 10.0, &me, ts(0));
        assert_eq!(
            UndoEntry::Merge {
                pin_id: id,
                previous_size: 2
            },
            out.undo_entry()
        );
    }
}
