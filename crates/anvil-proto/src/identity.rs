//! Offline-mode player identity.

use uuid::Uuid;

/// Derive the stable id for an offline-mode player.
///
/// Matches Java's `UUID.nameUUIDFromBytes("OfflinePlayer:" + name)`: the MD5
/// of the input with the version nibble forced to 3 (name-based) and the
/// variant bits to the IETF `10` pattern.
pub fn offline_uuid(name: &str) -> Uuid {
    let digest = md5::compute(format!("OfflinePlayer:{name}"));
    let mut bytes = digest.0;
    bytes[6] = (bytes[6] & 0x0F) | 0x30;
    bytes[8] = (bytes[8] & 0x3F) | 0x80;
    Uuid::from_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector() {
        // The vanilla-compatible id for the name "Notch".
        assert_eq!(
            offline_uuid("Notch").to_string(),
            "069a79f4-44e9-4726-a5be-fca90e38aaf5"
        );
    }

    #[test]
    fn version_and_variant_bits() {
        for name in ["Alex", "Steve", "a", ""] {
            let id = offline_uuid(name);
            let bytes = id.as_bytes();
            assert_eq!(bytes[6] >> 4, 3, "version nibble for {name}");
            assert_eq!(bytes[8] >> 6, 0b10, "variant bits for {name}");
        }
    }

    #[test]
    fn deterministic_and_name_sensitive() {
        assert_eq!(offline_uuid("Herobrine"), offline_uuid("Herobrine"));
        assert_ne!(offline_uuid("Herobrine"), offline_uuid("herobrine"));
    }
}
