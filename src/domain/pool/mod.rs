//! Pool domain - liquidity pool snapshots and the pair graph built from them

mod pool_graph;

pub use pool_graph::{GraphStats, PairGraph, PairGroup, PoolEdge, PoolIndex, SwapDirection, TokenIndex};

use serde::{Deserialize, Serialize};

use crate::math::{price_from_reserves, BPS_DENOMINATOR};
use crate::shared::errors::PoolError;
use crate::shared::types::{amount_serde, TokenInfo, MAX_TOKEN_DECIMALS};

/// Pool reserves in native (smallest) units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolReserves {
    #[serde(alias = "tokenA", with = "amount_serde")]
    pub token_a: u128,
    #[serde(alias = "tokenB", with = "amount_serde")]
    pub token_b: u128,
}

/// Snapshot of one liquidity pool. Pools are read-only once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolData {
    pub id: String,
    /// Exchange name, e.g. "raydium" or "orca"
    pub dex: String,
    /// On-chain pool account; absent or empty means unknown
    #[serde(default)]
    pub address: Option<String>,
    #[serde(alias = "tokenA")]
    pub token_a: TokenInfo,
    #[serde(alias = "tokenB")]
    pub token_b: TokenInfo,
    pub reserves: PoolReserves,
    #[serde(alias = "fee", alias = "feeBps")]
    pub fee_bps: u32,
}

impl PoolData {
    pub fn has_address(&self) -> bool {
        self.address.as_deref().map_or(false, |a| !a.trim().is_empty())
    }

    /// Check the pool can serve as a trading venue
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.reserves.token_a == 0 || self.reserves.token_b == 0 {
            return Err(PoolError::ZeroReserve(self.id.clone()));
        }
        if !self.has_address() {
            return Err(PoolError::MissingAddress(self.id.clone()));
        }
        if u128::from(self.fee_bps) > BPS_DENOMINATOR {
            return Err(PoolError::FeeOutOfRange(self.id.clone(), self.fee_bps));
        }
        if self.token_a == self.token_b {
            return Err(PoolError::SelfPair(self.id.clone()));
        }
        let decimals = self.token_a.decimals.max(self.token_b.decimals);
        if decimals > MAX_TOKEN_DECIMALS {
            return Err(PoolError::UnsupportedDecimals(self.id.clone(), decimals));
        }
        Ok(())
    }

    /// Mid price: token B per token A, decimal adjusted
    pub fn mid_price(&self) -> f64 {
        price_from_reserves(
            self.reserves.token_a,
            self.token_a.decimals,
            self.reserves.token_b,
            self.token_b.decimals,
        )
    }

    /// Raw reserve held for `mint`
    pub fn reserve_of(&self, mint: &str) -> Option<u128> {
        if self.token_a.mint == mint {
            Some(self.reserves.token_a)
        } else if self.token_b.mint == mint {
            Some(self.reserves.token_b)
        } else {
            None
        }
    }

    /// (reserve_in, reserve_out) for a swap selling `mint_in`
    pub fn reserves_for(&self, mint_in: &str) -> Option<(u128, u128)> {
        if self.token_a.mint == mint_in {
            Some((self.reserves.token_a, self.reserves.token_b))
        } else if self.token_b.mint == mint_in {
            Some((self.reserves.token_b, self.reserves.token_a))
        } else {
            None
        }
    }

    /// Spot price of one UI unit of `mint_in` in the other token
    pub fn price_for(&self, mint_in: &str) -> Option<f64> {
        let mid = self.mid_price();
        if mid <= 0.0 {
            return None;
        }
        if self.token_a.mint == mint_in {
            Some(mid)
        } else if self.token_b.mint == mint_in {
            Some(1.0 / mid)
        } else {
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod test_pools {
    use super::*;

    pub const SOL: &str = "So11111111111111111111111111111111111111112";
    pub const USDC: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
    pub const BONK: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";

    pub fn token(mint: &str) -> TokenInfo {
        match mint {
            SOL => TokenInfo::new(SOL, "SOL", 9),
            USDC => TokenInfo::new(USDC, "USDC", 6),
            BONK => TokenInfo::new(BONK, "BONK", 5),
            other => TokenInfo::new(other, other, 6),
        }
    }

    /// Pool built from UI reserves
    pub fn pool(id: &str, dex: &str, a: &str, b: &str, ui_a: f64, ui_b: f64, fee_bps: u32) -> PoolData {
        let token_a = token(a);
        let token_b = token(b);
        let raw_a = (ui_a * 10f64.powi(i32::from(token_a.decimals))) as u128;
        let raw_b = (ui_b * 10f64.powi(i32::from(token_b.decimals))) as u128;
        PoolData {
            id: id.to_string(),
            dex: dex.to_string(),
            address: Some(format!("{}-address", id)),
            token_a,
            token_b,
            reserves: PoolReserves {
                token_a: raw_a,
                token_b: raw_b,
            },
            fee_bps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_pools::*;
    use super::*;

    #[test]
    fn test_validate() {
        let good = pool("p1", "raydium", SOL, USDC, 1000.0, 150_000.0, 25);
        assert!(good.validate().is_ok());

        let mut zero = good.clone();
        zero.reserves.token_b = 0;
        assert_eq!(zero.validate(), Err(PoolError::ZeroReserve("p1".into())));

        let mut blank = good.clone();
        blank.address = Some("  ".into());
        assert_eq!(blank.validate(), Err(PoolError::MissingAddress("p1".into())));

        let mut fee = good.clone();
        fee.fee_bps = 10_001;
        assert!(matches!(fee.validate(), Err(PoolError::FeeOutOfRange(_, 10_001))));

        let self_pair = pool("p2", "orca", SOL, SOL, 1.0, 1.0, 30);
        assert_eq!(self_pair.validate(), Err(PoolError::SelfPair("p2".into())));

        let mut odd = good.clone();
        odd.token_b.decimals = 39;
        assert_eq!(odd.validate(), Err(PoolError::UnsupportedDecimals("p1".into(), 39)));
        odd.token_b.decimals = 38;
        assert!(odd.validate().is_ok());
    }

    #[test]
    fn test_prices_and_sides() {
        let p = pool("p1", "raydium", SOL, USDC, 1000.0, 150_000.0, 25);
        assert!((p.mid_price() - 150.0).abs() < 1e-9);
        assert!((p.price_for(USDC).unwrap() - 1.0 / 150.0).abs() < 1e-12);
        assert_eq!(p.reserves_for(USDC), Some((150_000_000_000, 1_000_000_000_000)));
        assert!(p.reserve_of(BONK).is_none());
    }

    #[test]
    fn test_snapshot_deserialization() {
        let json = r#"{
            "id": "ray-1",
            "dex": "raydium",
            "address": "58oQChx4yWmvKdwLLZzBi4ChoCc2fqCUWBkwMihLYQo2",
            "tokenA": {"mint": "So11111111111111111111111111111111111111112", "symbol": "SOL", "decimals": 9},
            "tokenB": {"mint": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v", "symbol": "USDC", "decimals": 6},
            "reserves": {"tokenA": "1000000000000", "tokenB": 150000000000},
            "fee": 25
        }"#;
        let p: PoolData = serde_json::from_str(json).unwrap();
        assert_eq!(p.reserves.token_a, 1_000_000_000_000);
        assert_eq!(p.fee_bps, 25);
        assert!(p.validate().is_ok());

        let no_address = r#"{"id":"x","dex":"orca",
            "token_a":{"mint":"a","symbol":"A","decimals":6},
            "token_b":{"mint":"b","symbol":"B","decimals":6},
            "reserves":{"token_a":1,"token_b":1},"fee_bps":30}"#;
        let p: PoolData = serde_json::from_str(no_address).unwrap();
        assert!(!p.has_address());
    }
}
