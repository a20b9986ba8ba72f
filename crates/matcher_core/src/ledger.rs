//! crates/matcher_core/src/ledger.rs
//!
//! Swipe ledgers and the reconciliation that derives the match set from them.

use crate::domain::CandidateId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One participant's like/dislike decisions within a session.
///
/// Iteration follows first-insertion order. Recording a decision for a
/// candidate already present overwrites it in place; no history is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwipeLedger {
    entries: Vec<(CandidateId, bool)>,
}

impl SwipeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts a decision for `candidate`.
    pub fn record(&mut self, candidate: CandidateId, liked: bool) {
        match self.entries.iter_mut().find(|(id, _)| *id == candidate) {
            Some(entry) => entry.1 = liked,
            None => self.entries.push((candidate, liked)),
        }
    }

    /// The recorded decision, or `None` while the candidate is unseen.
    pub fn decision(&self, candidate: CandidateId) -> Option<bool> {
        self.entries
            .iter()
            .find(|(id, _)| *id == candidate)
            .map(|(_, liked)| *liked)
    }

    pub fn likes(&self, candidate: CandidateId) -> bool {
        self.decision(candidate).unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CandidateId, bool)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// A sorted map view, used for wire payloads.
    pub fn to_map(&self) -> BTreeMap<CandidateId, bool> {
        self.iter().collect()
    }
}

impl FromIterator<(CandidateId, bool)> for SwipeLedger {
    fn from_iter<I: IntoIterator<Item = (CandidateId, bool)>>(iter: I) -> Self {
        let mut ledger = SwipeLedger::new();
        for (candidate, liked) in iter {
            ledger.record(candidate, liked);
        }
        ledger
    }
}

impl Serialize for SwipeLedger {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(id, liked)| (id, liked)))
    }
}

impl<'de> Deserialize<'de> for SwipeLedger {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = BTreeMap::<CandidateId, bool>::deserialize(deserializer)?;
        Ok(map.into_iter().collect())
    }
}

/// Candidates liked on both sides, in the local ledger's order.
///
/// Always computed from scratch; there is no incremental match state.
pub fn reconcile(local: &SwipeLedger, counterpart: &SwipeLedger) -> Vec<CandidateId> {
    local
        .iter()
        .filter(|&(id, liked)| liked && counterpart.likes(id))
        .map(|(id, _)| id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::{HashMap, HashSet};
    use uuid::Uuid;

    #[test]
    fn record_overwrites_in_place() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut ledger = SwipeLedger::new();
        ledger.record(a, true);
        ledger.record(b, true);
        ledger.record(a, false);

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.iter().collect::<Vec<_>>(), vec![(a, false), (b, true)]);
        assert_eq!(ledger.decision(a), Some(false));
        assert_eq!(ledger.decision(Uuid::new_v4()), None);
    }

    #[test]
    fn match_requires_both_likes_regardless_of_arrival_order() {
        let (r1, r2, r3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let local: SwipeLedger = [(r1, true), (r2, false)].into_iter().collect();
        let counterpart: SwipeLedger = [(r3, true), (r1, true)].into_iter().collect();

        assert_eq!(reconcile(&local, &counterpart), vec![r1]);
        assert_eq!(reconcile(&counterpart, &local), vec![r1]);
    }

    #[test]
    fn matches_follow_local_insertion_order() {
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let local: SwipeLedger = ids.iter().rev().map(|id| (*id, true)).collect();
        let counterpart: SwipeLedger = ids.iter().map(|id| (*id, true)).collect();

        let expected: Vec<Uuid> = ids.iter().rev().copied().collect();
        assert_eq!(reconcile(&local, &counterpart), expected);
    }

    #[test]
    fn ledger_serializes_as_a_map() {
        let id = Uuid::new_v4();
        let ledger: SwipeLedger = [(id, true)].into_iter().collect();
        let json = serde_json::to_value(&ledger).unwrap();
        assert_eq!(json.as_object().map(|o| o.len()), Some(1));
        assert_eq!(json[id.to_string()], serde_json::Value::Bool(true));

        let back: SwipeLedger = serde_json::from_value(json).unwrap();
        assert_eq!(back, ledger);
    }

    fn ledger_strategy() -> impl Strategy<Value = Vec<(u8, bool)>> {
        proptest::collection::vec((0u8..12, any::<bool>()), 0..24)
    }

    proptest! {
        #[test]
        fn reconcile_is_exactly_the_intersection_of_likes(
            left in ledger_strategy(),
            right in ledger_strategy(),
        ) {
            let pool: Vec<Uuid> = (0..12).map(|_| Uuid::new_v4()).collect();
            let local: SwipeLedger =
                left.iter().map(|(i, l)| (pool[*i as usize], *l)).collect();
            let counterpart: SwipeLedger =
                right.iter().map(|(i, l)| (pool[*i as usize], *l)).collect();

            // Last write wins per key, like the ledger itself.
            let l_map: HashMap<Uuid, bool> =
                left.iter().map(|(i, l)| (pool[*i as usize], *l)).collect();
            let r_map: HashMap<Uuid, bool> =
                right.iter().map(|(i, l)| (pool[*i as usize], *l)).collect();
            let expected: HashSet<Uuid> = l_map
                .iter()
                .filter(|(id, liked)| **liked && r_map.get(*id) == Some(&true))
                .map(|(id, _)| *id)
                .collect();

            let first = reconcile(&local, &counterpart);
            let actual: HashSet<Uuid> = first.iter().copied().collect();
            prop_assert_eq!(actual.len(), first.len());
            prop_assert_eq!(actual, expected);

            let second = reconcile(&local, &counterpart);
            prop_assert_eq!(first, second);
        }
    }
}
