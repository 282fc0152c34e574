//! Byte-size values with optional `B`, `K`, `KB`, `M`, `MB` suffixes.

use crate::error::StressError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A size in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ByteSize(pub u64);

impl ByteSize {
    pub const KIB: u64 = 1024;
    pub const MIB: u64 = 1024 * 1024;

    pub fn bytes(&self) -> u64 {
        self.0
    }
}

/// Parse a size such as `500`, `10B`, `2K`, `2kb` or `1M`.
///
/// Suffixes are case-insensitive. A single trailing `B` is dropped first, then
/// `K` or `M` scale the remaining integer.
pub fn parse_size(value: &str) -> Result<ByteSize, StressError> {
    let invalid = || StressError::InvalidArgument(format!("invalid size: '{}'", value));

    let upper = value.trim().to_ascii_uppercase();
    let digits = upper.strip_suffix('B').unwrap_or(&upper);
    let (digits, scale) = if let Some(rest) = digits.strip_suffix('K') {
        (rest, ByteSize::KIB)
    } else if let Some(rest) = digits.strip_suffix('M') {
        (rest, ByteSize::MIB)
    } else {
        (digits, 1)
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let amount: u64 = digits.parse().map_err(|_| invalid())?;
    amount.checked_mul(scale).map(ByteSize).ok_or_else(invalid)
}

impl FromStr for ByteSize {
    type Err = StressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_size(s)
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0;
        if bytes >= Self::MIB && bytes % Self::MIB == 0 {
            write!(f, "{}M", bytes / Self::MIB)
        } else if bytes >= Self::KIB && bytes % Self::KIB == 0 {
            write!(f, "{}K", bytes / Self::KIB)
        } else {
            write!(f, "{}B", bytes)
        }
    }
}

impl Serialize for ByteSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSize {
    Bytes(u64),
    Text(String),
}

impl<'de> Deserialize<'de> for ByteSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawSize::deserialize(deserializer)? {
            RawSize::Bytes(bytes) => Ok(ByteSize(bytes)),
            RawSize::Text(text) => parse_size(&text).map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_size_suffixes() {
        assert_eq!(parse_size("10B").unwrap(), ByteSize(10));
        assert_eq!(parse_size("2K").unwrap(), ByteSize(2048));
        assert_eq!(parse_size("2kb").unwrap(), ByteSize(2048));
        assert_eq!(parse_size("1M").unwrap(), ByteSize(1_048_576));
        assert_eq!(parse_size("1mB").unwrap(), ByteSize(1_048_576));
        assert_eq!(parse_size("500").unwrap(), ByteSize(500));
    }

    #[test]
    fn test_parse_size_rejects_garbage() {
        for value in ["x", "", "B", "KB", "1BB", "-5", "1G", "1.5M", "K1"] {
            assert!(parse_size(value).is_err(), "expected '{}' to be rejected", value);
        }
    }

    #[test]
    fn test_parse_size_rejects_overflow() {
        assert!(parse_size("18446744073709551615M").is_err());
    }

    #[test]
    fn test_display_picks_largest_unit() {
        assert_eq!(ByteSize(50 * ByteSize::MIB).to_string(), "50M");
        assert_eq!(ByteSize(2048).to_string(), "2K");
        assert_eq!(ByteSize(1000).to_string(), "1000B");
    }

    #[test]
    fn test_deserialize_number_or_string() {
        let from_int: ByteSize = serde_json::from_str("4096").unwrap();
        assert_eq!(from_int, ByteSize(4096));
        let from_str: ByteSize = serde_json::from_str("\"4K\"").unwrap();
        assert_eq!(from_str, ByteSize(4096));
        assert!(serde_json::from_str::<ByteSize>("\"4X\"").is_err());
    }

    proptest! {
        #[test]
        fn prop_display_parses_back(bytes in 0u64..(1u64 << 40)) {
            let size = ByteSize(bytes);
            prop_assert_eq!(parse_size(&size.to_string()).unwrap(), size);
        }

        #[test]
        fn prop_kilobyte_suffix_scales(n in 0u64..1_000_000) {
            prop_assert_eq!(parse_size(&format!("{}k", n)).unwrap(), ByteSize(n * 1024));
            prop_assert_eq!(parse_size(&format!("{}KB", n)).unwrap(), ByteSize(n * 1024));
        }
    }
}
