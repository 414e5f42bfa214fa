use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, PoisonError};

use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// Raw counters a keeper increments directly.
///
/// The string forms are part of the wire format and must not change.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
pub enum Primitive {
    #[strum(serialize = "PtsSimple")]
    PtsSimple,
    /// Missed three point attempt
    #[strum(serialize = "3PtA")]
    ThreePtA,
    #[strum(serialize = "3PtM")]
    ThreePtM,
    /// Missed two point attempt
    #[strum(serialize = "2PtA")]
    TwoPtA,
    #[strum(serialize = "2PtM")]
    TwoPtM,
    /// Missed free throw
    #[strum(serialize = "FTA")]
    FreeThrowA,
    #[strum(serialize = "FTM")]
    FreeThrowM,
    #[strum(serialize = "Ast")]
    Assist,
    #[strum(serialize = "Blk")]
    Block,
    #[strum(serialize = "Stl")]
    Steal,
    #[strum(serialize = "OReb")]
    OffensiveRebound,
    #[strum(serialize = "DReb")]
    DefensiveRebound,
    /// Rebound recorded without an offensive/defensive split
    #[strum(serialize = "Reb")]
    Rebound,
    #[strum(serialize = "To")]
    Turnover,
    #[strum(serialize = "Fl")]
    Foul,
}

/// A consistent copy of one player's counters, taken under a single lock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrimitiveValues(HashMap<Primitive, u32>);

impl PrimitiveValues {
    pub fn get(&self, primitive: Primitive) -> i64 {
        self.0.get(&primitive).copied().unwrap_or_default() as i64
    }
}

/// Per-player counters. The set of primitives is fixed when the statline is built.
#[derive(Debug)]
pub struct PrimitiveStatline {
    counters: Mutex<HashMap<Primitive, u32>>,
}

impl PrimitiveStatline {
    pub fn new(primitives: &BTreeSet<Primitive>) -> Self {
        Self {
            counters: Mutex::new(primitives.iter().map(|p| (*p, 0)).collect()),
        }
    }

    /// Returns 0 for primitives this statline does not track.
    pub fn get(&self, primitive: Primitive) -> u32 {
        let counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        counters.get(&primitive).copied().unwrap_or_default()
    }

    /// Applies `delta` and returns the new value.
    ///
    /// A delta that would take the counter below zero leaves it untouched and
    /// returns the current value. Untracked primitives are a no-op returning 0.
    pub fn add(&self, primitive: Primitive, delta: i32) -> u32 {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(current) = counters.get_mut(&primitive) else {
            return 0;
        };

        let next = *current as i64 + delta as i64;
        if next < 0 {
            return *current;
        }
        *current = u32::try_from(next).unwrap_or(u32::MAX);
        *current
    }

    pub fn values(&self) -> PrimitiveValues {
        let counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        PrimitiveValues(counters.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;
    use std::sync::Arc;
    use strum::IntoEnumIterator;

    fn statline(primitives: &[Primitive]) -> PrimitiveStatline {
        PrimitiveStatline::new(&primitives.iter().copied().collect())
    }

    #[rstest]
    #[case("PtsSimple", Primitive::PtsSimple)]
    #[case("3PtA", Primitive::ThreePtA)]
    #[case("2PtM", Primitive::TwoPtM)]
    #[case("FTM", Primitive::FreeThrowM)]
    #[case("OReb", Primitive::OffensiveRebound)]
    #[case("Fl", Primitive::Foul)]
    fn parses_wire_names(#[case] name: &str, #[case] expected: Primitive) {
        assert_eq!(Primitive::from_str(name).unwrap(), expected);
        assert_eq!(expected.to_string(), name);
    }

    #[test]
    fn rejects_unknown_names() {
        assert!(Primitive::from_str("Dunk").is_err());
        assert!(Primitive::from_str("pts").is_err());
    }

    #[test]
    fn registry_has_fifteen_stable_names() {
        let names: Vec<&'static str> = Primitive::iter().map(Into::into).collect();
        assert_eq!(
            names,
            vec![
                "PtsSimple", "3PtA", "3PtM", "2PtA", "2PtM", "FTA", "FTM", "Ast", "Blk", "Stl",
                "OReb", "DReb", "Reb", "To", "Fl"
            ]
        );
    }

    #[test]
    fn unknown_primitive_reads_zero_and_ignores_writes() {
        let line = statline(&[Primitive::PtsSimple]);
        assert_eq!(line.get(Primitive::Block), 0);
        assert_eq!(line.add(Primitive::Block, 3), 0);
        assert_eq!(line.get(Primitive::Block), 0);
    }

    #[test]
    fn add_returns_new_value() {
        let line = statline(&[Primitive::TwoPtM]);
        assert_eq!(line.add(Primitive::TwoPtM, 1), 1);
        assert_eq!(line.add(Primitive::TwoPtM, 2), 3);
        assert_eq!(line.get(Primitive::TwoPtM), 3);
    }

    #[test]
    fn subtracting_below_zero_is_a_no_op() {
        let line = statline(&[Primitive::Foul]);
        line.add(Primitive::Foul, 1);
        assert_eq!(line.add(Primitive::Foul, -2), 1);
        assert_eq!(line.add(Primitive::Foul, -1), 0);
        assert_eq!(line.add(Primitive::Foul, -1), 0);
    }

    #[rstest]
    #[case(vec![1, 1, -1, 1], 2)]
    #[case(vec![-1, -1, 1], 1)]
    #[case(vec![1, -1, -1, -1, 1, 1], 2)]
    #[case(vec![], 0)]
    fn counter_tracks_clamped_running_sum(#[case] deltas: Vec<i32>, #[case] expected: u32) {
        let line = statline(&[Primitive::Assist]);
        for delta in deltas {
            line.add(Primitive::Assist, delta);
        }
        assert_eq!(line.get(Primitive::Assist), expected);
    }

    #[test]
    fn concurrent_writers_never_lose_updates() {
        let line = Arc::new(statline(&[Primitive::Steal]));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let line = Arc::clone(&line);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        line.add(Primitive::Steal, 1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(line.get(Primitive::Steal), 8000);
    }
}
