//! UUID value generator.

use rand::Rng;
use uuid::Uuid;

/// Generate a random UUID v4 using the provided RNG.
pub fn random_uuid_v4<R: Rng + ?Sized>(rng: &mut R) -> Uuid {
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes);

    // Version 4, RFC 4122 variant
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    Uuid::from_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_uuid_v4_is_unique() {
        let mut rng = StdRng::seed_from_u64(42);
        let first = random_uuid_v4(&mut rng);
        let second = random_uuid_v4(&mut rng);
        assert_ne!(first, second);
    }

    #[test]
    fn test_uuid_version() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(random_uuid_v4(&mut rng).get_version_num(), 4);
    }
}
