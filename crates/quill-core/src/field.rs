//! Pasta curve constants used by field-oriented links.
//!
//! Only the moduli and reduction live here. Poseidon, point arithmetic and
//! signing are supplied by the proof system through the collaborator traits.

use num_bigint::BigUint;
use num_traits::Num;
use std::sync::OnceLock;

const PALLAS_BASE_MODULUS_HEX: &str =
    "40000000000000000000000000000000224698fc094cf91b992d30ed00000001";
const PALLAS_SCALAR_MODULUS_HEX: &str =
    "40000000000000000000000000000000224698fc0994a8dd8c46eb2100000001";

fn parse_modulus(hex: &str) -> BigUint {
    // Constants above are valid hex; a parse failure would be a typo caught by the tests.
    BigUint::from_str_radix(hex, 16).unwrap_or_default()
}

/// Modulus `p` of the Pallas base field (the Mina native field).
pub fn pallas_base_modulus() -> &'static BigUint {
    static P: OnceLock<BigUint> = OnceLock::new();
    P.get_or_init(|| parse_modulus(PALLAS_BASE_MODULUS_HEX))
}

/// Modulus `q` of the Pallas scalar field.
pub fn pallas_scalar_modulus() -> &'static BigUint {
    static Q: OnceLock<BigUint> = OnceLock::new();
    Q.get_or_init(|| parse_modulus(PALLAS_SCALAR_MODULUS_HEX))
}

/// Reduce an arbitrary unsigned integer into the Pallas base field.
pub fn reduce_to_field(value: &BigUint) -> BigUint {
    value % pallas_base_modulus()
}

/// True if `value` is already a canonical base field element.
pub fn is_canonical_field(value: &BigUint) -> bool {
    value < pallas_base_modulus()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moduli_decimal() {
        assert_eq!(
            pallas_base_modulus().to_str_radix(10),
            "28948022309329048855892746252171976963363056481941560715954676764349967630337"
        );
        assert_eq!(
            pallas_scalar_modulus().to_str_radix(10),
            "28948022309329048855892746252171976963363056481941647379679742748393362948097"
        );
    }

    #[test]
    fn test_scalar_modulus_exceeds_base() {
        assert!(pallas_scalar_modulus() > pallas_base_modulus());
    }

    #[test]
    fn test_reduce_wraps_modulus() {
        let p = pallas_base_modulus();
        assert_eq!(reduce_to_field(p), BigUint::from(0u8));
        assert_eq!(reduce_to_field(&(p + 5u8)), BigUint::from(5u8));
        assert_eq!(reduce_to_field(&BigUint::from(42u8)), BigUint::from(42u8));
    }

    #[test]
    fn test_is_canonical() {
        let p = pallas_base_modulus();
        assert!(is_canonical_field(&(p - 1u8)));
        assert!(!is_canonical_field(p));
    }
}
