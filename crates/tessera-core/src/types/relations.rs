//! Assignability, logical equality and fixation.

use super::{GenericRoot, TypeId, TypeKind, TypeTable};
use crate::QualifierId;

/// The key under which a type's methods are grouped.
///
/// Two types are logically equal when they were declared in the same
/// qualifier and belong to the same family: the root name for generic
/// specializations, the declared name otherwise. The backing runtime type is
/// not part of the key, so `array<int>` and `array<string>` share one method
/// group and instance candidates are narrowed by their receiver parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LogicalKey {
    /// Declaration qualifier.
    pub qualifier: QualifierId,
    /// Family name.
    pub family: String,
}

impl TypeTable {
    /// Whether `target` accepts a value of type `source` (`target ⊇ source`).
    ///
    /// Unknown accepts and is accepted by everything. Specializations of the
    /// same root accept each other when their arguments pairwise do; a `func`
    /// additionally accepts a `detfunc` under the same rule. Everything else
    /// requires exact equality.
    pub fn accepts(&self, target: TypeId, source: TypeId) -> bool {
        if target == source || target == Self::UNKNOWN || source == Self::UNKNOWN {
            return true;
        }

        let (TypeKind::Instance(t_root), TypeKind::Instance(s_root)) =
            (self.get(target).kind, self.get(source).kind)
        else {
            return false;
        };

        let family_ok = t_root == s_root
            || (t_root == GenericRoot::Func && s_root == GenericRoot::DetFunc);
        if !family_ok {
            return false;
        }

        let t_args = &self.get(target).args;
        let s_args = &self.get(source).args;
        t_args.len() == s_args.len()
            && t_args
                .iter()
                .zip(s_args.iter())
                .all(|(&t, &s)| self.accepts(t, s))
    }

    /// Whether the placeholder occurs anywhere in `id`.
    pub fn contains_unknown(&self, id: TypeId) -> bool {
        id == Self::UNKNOWN || self.get(id).args.iter().any(|&a| self.contains_unknown(a))
    }

    /// The logical grouping key of a type.
    pub fn logical_key(&self, id: TypeId) -> LogicalKey {
        let ty = self.get(id);
        LogicalKey {
            qualifier: ty.qualifier,
            family: ty.logical.clone(),
        }
    }

    /// Logical equality; see [`LogicalKey`].
    pub fn logically_equal(&self, a: TypeId, b: TypeId) -> bool {
        let (ta, tb) = (self.get(a), self.get(b));
        ta.qualifier == tb.qualifier && ta.logical == tb.logical
    }

    /// Whether a node typed `current` may be fixed to `supplied`.
    ///
    /// Fixation applies only while `current` still contains the placeholder,
    /// never with a `supplied` type that itself contains it, and only toward a
    /// type compatible with what is already known.
    pub fn can_fixate(&self, current: TypeId, supplied: TypeId) -> bool {
        self.contains_unknown(current)
            && !self.contains_unknown(supplied)
            && self.accepts(current, supplied)
    }

    /// Whether applying a value of this type may be non-deterministic.
    pub fn is_nondeterministic_function(&self, id: TypeId) -> bool {
        self.instance_root(id) == Some(GenericRoot::Func)
    }
}
