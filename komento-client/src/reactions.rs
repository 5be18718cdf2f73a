//! Per-comment reaction bookkeeping: at most one reaction per actor, with
//! toggle-off semantics. Pure functions over the reaction map; the store is
//! the one applying them against its latest state.

use std::collections::BTreeMap;

use crate::api::{ReactionKind, UserId};

/// Applies one actor's toggle. Pressing the reaction the actor already has
/// removes it; anything else (no prior reaction, or a different kind)
/// switches to `kind`. Returns whether the actor ends up with `kind` set.
pub fn toggle(map: &mut BTreeMap<UserId, ReactionKind>, actor: UserId, kind: ReactionKind) -> bool {
    match map.get(&actor) {
        Some(current) if *current == kind => {
            map.remove(&actor);
            false
        }
        _ => {
            map.insert(actor, kind);
            true
        }
    }
}

/// Number of distinct actors currently reacting with `kind`. Recomputed from
/// the map on every read; there is no counter to drift out of sync.
pub fn count(map: &BTreeMap<UserId, ReactionKind>, kind: ReactionKind) -> usize {
    map.values().filter(|k| **k == kind).count()
}
