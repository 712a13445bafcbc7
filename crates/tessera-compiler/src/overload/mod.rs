//! Overload resolution for host method calls.
//!
//! ## Algorithm
//!
//! 1. Filter candidates by parameter count
//! 2. Check each argument against its parameter, honoring direction:
//!    `in` needs the parameter to accept the argument, `out` the argument to
//!    accept the parameter, `inout` both
//! 3. Count exact parameter matches per viable candidate (its just-count)
//! 4. Keep the group with the highest just-count; more than one member is
//!    ambiguous

mod ranking;

pub use ranking::{find_best_match, most_compatible};

use tessera_core::{TypeId, TypeTable};
use tessera_registry::{MethodId, MethodRegistry, ParamDirection};

/// A viable candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverloadMatch {
    /// The candidate.
    pub method: MethodId,
    /// Number of parameters whose type exactly equals the argument type.
    pub just_count: usize,
}

/// Why resolution produced no single method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverloadError {
    /// Candidates exist but none accepts the arguments.
    NoViable,
    /// The winning group has several members.
    Ambiguous(Vec<MethodId>),
}

/// Resolve a call with argument types `args` among `candidates`.
///
/// For instance methods `args[0]` is the receiver type.
pub fn resolve_overload(
    types: &TypeTable,
    methods: &MethodRegistry,
    candidates: &[MethodId],
    args: &[TypeId],
) -> Result<OverloadMatch, OverloadError> {
    let viable: Vec<OverloadMatch> = candidates
        .iter()
        .filter_map(|&id| check_candidate(types, methods, id, args))
        .collect();

    if viable.is_empty() {
        return Err(OverloadError::NoViable);
    }
    find_best_match(&viable)
}

/// Check one candidate, returning its match if every argument fits.
fn check_candidate(
    types: &TypeTable,
    methods: &MethodRegistry,
    id: MethodId,
    args: &[TypeId],
) -> Option<OverloadMatch> {
    let method = methods.get(id);
    if method.params.len() != args.len() {
        return None;
    }

    let mut just_count = 0;
    for ((&param, &dir), &arg) in method.params.iter().zip(&method.directions).zip(args) {
        let fits = match dir {
            ParamDirection::In => types.accepts(param, arg),
            ParamDirection::Out => types.accepts(arg, param),
            ParamDirection::InOut => types.accepts(param, arg) && types.accepts(arg, param),
        };
        if !fits {
            return None;
        }
        if param == arg {
            just_count += 1;
        }
    }

    Some(OverloadMatch {
        method: id,
        just_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_registry::{CatalogBuilder, MethodCatalog, StandardCatalog};
    use tessera_core::QualifierId;

    fn standard() -> (TypeTable, MethodRegistry) {
        let mut types = TypeTable::new();
        let mut methods = MethodRegistry::new();
        StandardCatalog
            .register(&mut CatalogBuilder::new(&mut types, &mut methods))
            .unwrap();
        (types, methods)
    }

    #[test]
    fn exact_match_wins() {
        let (types, methods) = standard();
        let candidates = methods.candidates(&types, TypeTable::INT, "op_Addition");
        let m = resolve_overload(&types, &methods, candidates, &[TypeTable::INT, TypeTable::INT])
            .unwrap();
        assert_eq!(m.just_count, 2);
    }

    #[test]
    fn mismatched_arguments_are_not_viable() {
        let (types, methods) = standard();
        let candidates = methods.candidates(&types, TypeTable::INT, "op_Addition");
        assert_eq!(
            resolve_overload(&types, &methods, candidates, &[TypeTable::INT, TypeTable::STRING]),
            Err(OverloadError::NoViable)
        );
    }

    #[test]
    fn unknown_argument_is_ambiguous_between_equal_overloads() {
        let (types, methods) = standard();
        let debug = types.lookup(QualifierId::ROOT, "Debug").unwrap();
        let candidates = methods.candidates(&types, debug, "Log");
        match resolve_overload(&types, &methods, candidates, &[TypeTable::UNKNOWN]) {
            Err(OverloadError::Ambiguous(ids)) => assert_eq!(ids.len(), 5),
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn receiver_narrows_family_group() {
        let (mut types, methods) = standard();
        let arr = types.array_of(TypeTable::STRING);
        let candidates = methods.candidates(&types, arr, "Get");
        let m = resolve_overload(&types, &methods, candidates, &[arr, TypeTable::INT]).unwrap();
        assert_eq!(methods.get(m.method).outputs, vec![TypeTable::STRING]);
    }

    #[test]
    fn out_parameter_direction() {
        let (types, methods) = standard();
        let candidates = methods.candidates(&types, TypeTable::INT, "TryParse");
        assert!(
            resolve_overload(&types, &methods, candidates, &[TypeTable::STRING, TypeTable::INT])
                .is_ok()
        );
        assert_eq!(
            resolve_overload(&types, &methods, candidates, &[TypeTable::STRING, TypeTable::BOOL]),
            Err(OverloadError::NoViable)
        );
    }
}
