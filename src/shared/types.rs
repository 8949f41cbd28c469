//! Common types used across the engine

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Wrapped SOL mint, the default settlement token
pub const WSOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// Lamports per SOL
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Largest decimals whose whole unit (10^decimals) fits in a u128
pub const MAX_TOKEN_DECIMALS: u8 = 38;

/// Token representation. Two tokens are the same token when their mints match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    pub mint: String,
    pub symbol: String,
    pub decimals: u8,
}

impl TokenInfo {
    pub fn new(mint: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            mint: mint.into(),
            symbol: symbol.into(),
            decimals,
        }
    }
}

impl PartialEq for TokenInfo {
    fn eq(&self, other: &Self) -> bool {
        self.mint == other.mint
    }
}

impl Eq for TokenInfo {}

impl Hash for TokenInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.mint.hash(state);
    }
}

/// Serde adapter for `u128` amounts.
///
/// Snapshot producers written against BigInt emit reserves as decimal strings,
/// others emit plain JSON numbers; both are accepted. Amounts are always
/// written back as strings so downstream consumers never lose precision.
pub mod amount_serde {
    use serde::{de, Deserializer, Serializer};
    use std::fmt;

    struct AmountVisitor;

    impl<'de> de::Visitor<'de> for AmountVisitor {
        type Value = u128;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a non-negative integer or a decimal string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
            Ok(u128::from(v))
        }

        fn visit_u128<E: de::Error>(self, v: u128) -> Result<u128, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u128, E> {
            u128::try_from(v).map_err(|_| E::custom(format!("negative amount {}", v)))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
            v.trim()
                .parse::<u128>()
                .map_err(|e| E::custom(format!("invalid amount '{}': {}", v, e)))
        }
    }

    pub fn serialize<S>(value: &u128, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u128, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AmountVisitor)
    }
}
