//! Mock valuation generator
//!
//! Development stand-in for the Zillow lookup. The value is a pure function
//! of the address (a 31x rolling hash over UTF-16 code units, wrapping at
//! 32 bits); only the confidence score is random.

use chrono::Utc;
use rand::Rng;

use super::{PropertyEstimate, RentEstimate};

pub const MOCK_VALUE_SOURCE: &str = "zillow_mock";
pub const MOCK_RENT_SOURCE: &str = "zillow_rent_mock";

const VALUE_BASE: i64 = 300_000;
const VALUE_SPREAD: i64 = 400_000;
const RENT_BASE: i64 = 1_500;
const RENT_SPREAD: i64 = 2_000;

/// Rolling hash `h = (h << 5) - h + c` over the address, as a signed 32-bit value
pub fn address_hash(address: &str) -> i32 {
    address.encode_utf16().fold(0i32, |h, c| {
        h.wrapping_shl(5).wrapping_sub(h).wrapping_add(i32::from(c))
    })
}

fn hash_magnitude(address: &str) -> i64 {
    i64::from(address_hash(address)).abs()
}

/// Deterministic value in `[300_000, 700_000)`
pub fn mock_value_amount(address: &str) -> f64 {
    (VALUE_BASE + hash_magnitude(address) % VALUE_SPREAD) as f64
}

/// Deterministic monthly rent in `[1_500, 3_500)`
pub fn mock_rent_amount(address: &str) -> f64 {
    (RENT_BASE + hash_magnitude(address) % RENT_SPREAD) as f64
}

/// Mock property value with confidence drawn from `[0.70, 0.95)`
pub fn mock_property_value<R: Rng + ?Sized>(address: &str, rng: &mut R) -> PropertyEstimate {
    PropertyEstimate {
        value: mock_value_amount(address),
        confidence: rng.gen_range(0.70..0.95),
        source: MOCK_VALUE_SOURCE.to_string(),
        last_updated: Utc::now(),
    }
}

/// Mock rental estimate with confidence drawn from `[0.60, 0.90)`
pub fn mock_rental_estimate<R: Rng + ?Sized>(address: &str, rng: &mut R) -> RentEstimate {
    RentEstimate {
        rent: mock_rent_amount(address),
        confidence: rng.gen_range(0.60..0.90),
        source: MOCK_RENT_SOURCE.to_string(),
        last_updated: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_address_hash_known_values() {
        assert_eq!(address_hash(""), 0);
        assert_eq!(address_hash("a"), 97);
        assert_eq!(address_hash("ab"), 97 * 31 + 98);
        assert_eq!(address_hash("abc"), (97 * 31 + 98) * 31 + 99);
    }

    #[test]
    fn test_address_hash_wraps() {
        // Long inputs overflow 32 bits; the hash must wrap rather than panic
        let long = "123 Main Street, Springfield, IL 62701".repeat(10);
        let h = address_hash(&long);
        assert_eq!(h, address_hash(&long));
    }

    #[test]
    fn test_mock_value_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = mock_property_value("123 Main St", &mut rng);
        let b = mock_property_value("123 Main St", &mut rng);

        assert_eq!(a.value, b.value);
        assert_eq!(a.source, MOCK_VALUE_SOURCE);
        assert_eq!(mock_value_amount("a"), 300_097.0);
    }

    #[test]
    fn test_mock_value_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for address in ["1 Elm St", "742 Evergreen Terrace", "Ünïcödé Straße 5", ""] {
            let estimate = mock_property_value(address, &mut rng);
            assert!(estimate.value >= 300_000.0 && estimate.value < 700_000.0);
            assert!(estimate.confidence >= 0.70 && estimate.confidence < 0.95);
        }
    }

    #[test]
    fn test_mock_confidence_varies() {
        let mut rng = StdRng::seed_from_u64(1);
        let confidences: Vec<f64> = (0..20)
            .map(|_| mock_property_value("123 Main St", &mut rng).confidence)
            .collect();

        assert!(confidences.iter().any(|c| (c - confidences[0]).abs() > f64::EPSILON));
    }

    #[test]
    fn test_mock_rent_range() {
        let mut rng = StdRng::seed_from_u64(3);
        let estimate = mock_rental_estimate("456 Oak Ave", &mut rng);

        assert!(estimate.rent >= 1_500.0 && estimate.rent < 3_500.0);
        assert!(estimate.confidence >= 0.60 && estimate.confidence < 0.90);
        assert_eq!(estimate.source, MOCK_RENT_SOURCE);
        assert_eq!(mock_rent_amount("a"), 1_597.0);
    }
}
