//! Deterministic signature hashing.
//!
//! [`SignatureHash`] identifies a callable by owner, name and ordered parameter
//! types. The method table uses it to reject duplicate catalog entries and the
//! function table uses it to detect conflicting declarations.

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants.
pub mod hash_constants {
    /// Separator constant for path components.
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for host methods.
    pub const METHOD: u64 = 0x7d3c8b4a92e15f6d;

    /// Domain marker for script functions.
    pub const FUNCTION: u64 = 0x5ea77ffbcdf5f302;

    /// Parameter position mixing constants; order of parameters matters.
    pub const PARAM_MARKERS: [u64; 8] = [
        0x9e3779b97f4a7c15,
        0xbf58476d1ce4e5b9,
        0x94d049bb133111eb,
        0xd6e8feb86659fd93,
        0xe7037ed1a0b428db,
        0xc6a4a7935bd1e995,
        0x8648dbbc94d49b8d,
        0xa2b48b2c69e0d657,
    ];
}

/// A deterministic 64-bit hash of a callable signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct SignatureHash(pub u64);

impl SignatureHash {
    /// Hash a host method: owner family, name and parameter identities.
    ///
    /// `params` are any stable per-type integers (interned type ids).
    pub fn from_method(owner: &str, name: &str, params: &[u32]) -> Self {
        let seed = hash_constants::METHOD
            ^ xxh64(owner.as_bytes(), 0)
            ^ xxh64(name.as_bytes(), hash_constants::SEP);
        SignatureHash(mix_params(seed, params))
    }

    /// Hash a script function declared in a scope.
    ///
    /// `scope` is the rendered qualifier path of the declaration site.
    pub fn from_function(scope: &str, name: &str, params: &[u32]) -> Self {
        let seed = hash_constants::FUNCTION
            ^ xxh64(scope.as_bytes(), 0)
            ^ xxh64(name.as_bytes(), hash_constants::SEP);
        SignatureHash(mix_params(seed, params))
    }

    /// Get the underlying value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

fn mix_params(mut hash: u64, params: &[u32]) -> u64 {
    for (i, param) in params.iter().enumerate() {
        let marker = hash_constants::PARAM_MARKERS
            .get(i)
            .copied()
            .unwrap_or_else(|| hash_constants::PARAM_MARKERS[0].wrapping_add(i as u64));
        // wrapping_mul keeps the fold non-commutative
        hash = hash
            .wrapping_mul(hash_constants::SEP)
            .wrapping_add(marker ^ u64::from(*param));
    }
    hash
}

impl fmt::Debug for SignatureHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignatureHash({:#018x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_input_same_hash() {
        let a = SignatureHash::from_method("int", "op_Addition", &[1, 1]);
        let b = SignatureHash::from_method("int", "op_Addition", &[1, 1]);
        assert_eq!(a, b);
    }

    #[test]
    fn parameter_order_matters() {
        let a = SignatureHash::from_method("Mathf", "Max", &[1, 2]);
        let b = SignatureHash::from_method("Mathf", "Max", &[2, 1]);
        assert_ne!(a, b);
    }

    #[test]
    fn functions_and_methods_do_not_collide() {
        let a = SignatureHash::from_method("m0", "foo", &[1]);
        let b = SignatureHash::from_function("m0", "foo", &[1]);
        assert_ne!(a, b);
    }
}
