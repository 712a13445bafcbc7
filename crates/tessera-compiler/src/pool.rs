//! Temporary-value pool.
//!
//! Call outputs and intermediate results of multi-step constructs need named
//! storage cells because the target machine has no expression stack. The
//! pool hands out slots per `(temp root, type)` bucket and reuses released
//! slots, lowest index first, so the number of cells stays small while no two
//! live values ever share a slot.
//!
//! ## Scopes
//!
//! Each temp root owns a stack of snapshots. [`TempPool::push_scope`] copies
//! the top snapshot; [`TempPool::pop_scope`] discards it, restoring the
//! enclosing region exactly. A parent that must keep a child's result alive
//! past the child's scope calls [`TempPool::force_retain`].

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashMap;
use tracing::trace;

use tessera_core::{InternalError, QualifierId, TypeId};

/// An addressable temporary slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutValue {
    /// The function body or module the slot belongs to.
    pub root: QualifierId,
    /// Slot type.
    pub ty: TypeId,
    /// Index within the `(root, ty)` bucket.
    pub slot: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Bucket {
    retained: BTreeSet<u32>,
    released: BTreeSet<u32>,
    next: u32,
}

type Snapshot = FxHashMap<TypeId, Bucket>;

/// Scope-lifetime allocator of [`OutValue`]s.
#[derive(Debug, Default)]
pub struct TempPool {
    scopes: FxHashMap<QualifierId, Vec<Snapshot>>,
    high_water: BTreeMap<(QualifierId, TypeId), u32>,
}

impl TempPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    fn stack(&mut self, root: QualifierId) -> &mut Vec<Snapshot> {
        let stack = self.scopes.entry(root).or_default();
        if stack.is_empty() {
            stack.push(Snapshot::default());
        }
        stack
    }

    fn bucket(&mut self, root: QualifierId, ty: TypeId) -> &mut Bucket {
        let stack = self.stack(root);
        let top = stack.len() - 1;
        stack[top].entry(ty).or_default()
    }

    /// Enter a region whose slot mutations are discarded on exit.
    pub fn push_scope(&mut self, root: QualifierId) {
        let stack = self.stack(root);
        let copy = stack[stack.len() - 1].clone();
        stack.push(copy);
        trace!(?root, depth = stack.len(), "pool push");
    }

    /// Leave a region, restoring the state before the matching push.
    pub fn pop_scope(&mut self, root: QualifierId) -> Result<(), InternalError> {
        let stack = self.stack(root);
        if stack.len() < 2 {
            return Err(InternalError::ScopeUnderflow {
                context: "temporary pool region",
            });
        }
        stack.pop();
        trace!(?root, depth = stack.len(), "pool pop");
        Ok(())
    }

    /// Take the lowest released slot of `ty`, or mint the next one.
    pub fn retain(&mut self, root: QualifierId, ty: TypeId) -> OutValue {
        let bucket = self.bucket(root, ty);
        let slot = match bucket.released.pop_first() {
            Some(slot) => slot,
            None => {
                let slot = bucket.next;
                bucket.next += 1;
                slot
            }
        };
        bucket.retained.insert(slot);
        let count = bucket.next;

        let high = self.high_water.entry((root, ty)).or_insert(0);
        *high = (*high).max(count);
        trace!(?root, ?ty, slot, "retain");
        OutValue { root, ty, slot }
    }

    /// Mark a retained slot free in the current region.
    pub fn release(&mut self, value: OutValue) -> Result<(), InternalError> {
        let bucket = self.bucket(value.root, value.ty);
        if !bucket.retained.remove(&value.slot) {
            return Err(InternalError::pool(format!(
                "release of slot {} that is not retained",
                value.slot
            )));
        }
        bucket.released.insert(value.slot);
        trace!(root = ?value.root, ty = ?value.ty, slot = value.slot, "release");
        Ok(())
    }

    /// Keep a slot produced in an inner region live in the current one.
    ///
    /// Indices skipped over while advancing the bucket counter become free.
    pub fn force_retain(&mut self, value: OutValue) {
        let bucket = self.bucket(value.root, value.ty);
        bucket.released.remove(&value.slot);
        bucket.retained.insert(value.slot);
        if value.slot >= bucket.next {
            bucket.released.extend(bucket.next..value.slot);
            bucket.next = value.slot + 1;
        }
        let count = bucket.next;

        let high = self.high_water.entry((value.root, value.ty)).or_insert(0);
        *high = (*high).max(count);
        trace!(root = ?value.root, ty = ?value.ty, slot = value.slot, "force retain");
    }

    /// Slots of `ty` currently live in the top region of `root`.
    pub fn live(&self, root: QualifierId, ty: TypeId) -> Vec<u32> {
        self.scopes
            .get(&root)
            .and_then(|stack| stack.last())
            .and_then(|snapshot| snapshot.get(&ty))
            .map(|bucket| bucket.retained.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of live slots of every type in the top region of `root`.
    pub fn live_count(&self, root: QualifierId) -> usize {
        self.scopes
            .get(&root)
            .and_then(|stack| stack.last())
            .map(|snapshot| snapshot.values().map(|b| b.retained.len()).sum())
            .unwrap_or(0)
    }

    /// Number of cells each `(root, type)` bucket ever needed.
    pub fn high_water(&self) -> impl Iterator<Item = (QualifierId, TypeId, u32)> + '_ {
        self.high_water
            .iter()
            .map(|(&(root, ty), &count)| (root, ty, count))
    }

    /// Depth of the region stack of `root` (1 when untouched).
    pub fn depth(&self, root: QualifierId) -> usize {
        self.scopes.get(&root).map_or(1, Vec::len)
    }

    #[cfg(test)]
    fn top(&self, root: QualifierId) -> Option<&Snapshot> {
        self.scopes.get(&root).and_then(|stack| stack.last())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::TypeTable;

    const ROOT: QualifierId = QualifierId(1);
    const INT: TypeId = TypeTable::INT;
    const BOOL: TypeId = TypeTable::BOOL;

    #[test]
    fn retain_reuses_lowest_released_slot() {
        let mut pool = TempPool::new();
        let a = pool.retain(ROOT, INT);
        let b = pool.retain(ROOT, INT);
        let c = pool.retain(ROOT, INT);
        assert_eq!((a.slot, b.slot, c.slot), (0, 1, 2));

        pool.release(c).unwrap();
        pool.release(a).unwrap();
        assert_eq!(pool.retain(ROOT, INT).slot, 0);
        assert_eq!(pool.retain(ROOT, INT).slot, 2);
        assert_eq!(pool.retain(ROOT, INT).slot, 3);
    }

    #[test]
    fn buckets_are_per_type() {
        let mut pool = TempPool::new();
        assert_eq!(pool.retain(ROOT, INT).slot, 0);
        assert_eq!(pool.retain(ROOT, BOOL).slot, 0);
        assert_eq!(pool.retain(QualifierId(2), INT).slot, 0);
    }

    #[test]
    fn live_slots_never_alias() {
        let mut pool = TempPool::new();
        let mut live = Vec::new();
        for step in 0..40u32 {
            if step % 3 == 2 {
                let victim = live.remove((step as usize * 7) % live.len());
                pool.release(victim).unwrap();
            } else {
                let expected = {
                    let taken: BTreeSet<u32> = live.iter().map(|v: &OutValue| v.slot).collect();
                    (0..).find(|i| !taken.contains(i)).unwrap()
                };
                let slot = pool.retain(ROOT, INT);
                assert_eq!(slot.slot, expected);
                live.push(slot);
            }
        }
    }

    #[test]
    fn push_then_pop_is_identity() {
        let mut pool = TempPool::new();
        let a = pool.retain(ROOT, INT);
        pool.retain(ROOT, INT);
        pool.release(a).unwrap();
        let before = pool.top(ROOT).cloned();

        pool.push_scope(ROOT);
        pool.pop_scope(ROOT).unwrap();
        assert_eq!(pool.top(ROOT).cloned(), before);
    }

    #[test]
    fn inner_mutations_are_discarded() {
        let mut pool = TempPool::new();
        pool.push_scope(ROOT);
        let inner = pool.retain(ROOT, INT);
        assert_eq!(inner.slot, 0);
        pool.pop_scope(ROOT).unwrap();

        assert!(pool.live(ROOT, INT).is_empty());
        assert_eq!(pool.retain(ROOT, INT).slot, 0);
    }

    #[test]
    fn force_retain_keeps_inner_result_alive() {
        let mut pool = TempPool::new();
        pool.push_scope(ROOT);
        pool.retain(ROOT, INT);
        let result = pool.retain(ROOT, INT);
        pool.pop_scope(ROOT).unwrap();

        pool.force_retain(result);
        assert_eq!(pool.live(ROOT, INT), vec![1]);
        // Slot 0 was skipped over and is free.
        assert_eq!(pool.retain(ROOT, INT).slot, 0);
        assert_eq!(pool.retain(ROOT, INT).slot, 2);
    }

    #[test]
    fn release_of_free_slot_is_internal_error() {
        let mut pool = TempPool::new();
        let a = pool.retain(ROOT, INT);
        pool.release(a).unwrap();
        assert!(matches!(pool.release(a), Err(InternalError::Pool { .. })));
    }

    #[test]
    fn pop_without_push_underflows() {
        let mut pool = TempPool::new();
        assert_eq!(
            pool.pop_scope(ROOT),
            Err(InternalError::ScopeUnderflow {
                context: "temporary pool region"
            })
        );
    }

    #[test]
    fn high_water_tracks_cells_needed() {
        let mut pool = TempPool::new();
        pool.push_scope(ROOT);
        pool.retain(ROOT, INT);
        pool.retain(ROOT, INT);
        pool.pop_scope(ROOT).unwrap();
        pool.retain(ROOT, INT);

        let counts: Vec<_> = pool.high_water().collect();
        assert_eq!(counts, vec![(ROOT, INT, 2)]);
    }
}
