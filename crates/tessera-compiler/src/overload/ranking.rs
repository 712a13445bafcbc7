//! Just-count ranking of viable candidates.

use super::{OverloadError, OverloadMatch};

/// The group of viable candidates with the highest just-count.
pub fn most_compatible(viable: &[OverloadMatch]) -> Vec<OverloadMatch> {
    let Some(best) = viable.iter().map(|m| m.just_count).max() else {
        return Vec::new();
    };
    viable
        .iter()
        .filter(|m| m.just_count == best)
        .copied()
        .collect()
}

/// Pick the single most compatible candidate.
///
/// A tie in the winning group is an ambiguity, never an arbitrary pick.
pub fn find_best_match(viable: &[OverloadMatch]) -> Result<OverloadMatch, OverloadError> {
    match most_compatible(viable).as_slice() {
        [] => Err(OverloadError::NoViable),
        [single] => Ok(*single),
        group => Err(OverloadError::Ambiguous(
            group.iter().map(|m| m.method).collect(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_registry::MethodId;

    fn make_match(id: u32, just_count: usize) -> OverloadMatch {
        OverloadMatch {
            method: MethodId(id),
            just_count,
        }
    }

    #[test]
    fn single_candidate_is_selected() {
        let viable = vec![make_match(1, 0)];
        assert_eq!(find_best_match(&viable), Ok(make_match(1, 0)));
    }

    #[test]
    fn highest_just_count_wins() {
        let viable = vec![make_match(1, 1), make_match(2, 2), make_match(3, 0)];
        assert_eq!(find_best_match(&viable).unwrap().method, MethodId(2));
    }

    #[test]
    fn tie_in_winning_group_is_ambiguous() {
        let viable = vec![make_match(1, 1), make_match(2, 1), make_match(3, 0)];
        assert_eq!(
            find_best_match(&viable),
            Err(OverloadError::Ambiguous(vec![MethodId(1), MethodId(2)]))
        );
    }

    #[test]
    fn tie_outside_winning_group_is_fine() {
        let viable = vec![make_match(1, 0), make_match(2, 0), make_match(3, 2)];
        assert_eq!(most_compatible(&viable), vec![make_match(3, 2)]);
    }

    #[test]
    fn empty_input_has_no_group() {
        assert!(most_compatible(&[]).is_empty());
        assert_eq!(find_best_match(&[]), Err(OverloadError::NoViable));
    }
}
