//! Arbitrage domain - opportunity detection, profit accounting and ranking

pub mod arbitrage_engine;
pub mod deduplicator;
pub mod opportunity_detector;
pub mod profit_calculator;

pub use arbitrage_engine::{ArbitrageEngine, ScanResult, ScanStats};
pub use deduplicator::{apply_filters, deduplicate, sort_by_net_profit};
pub use opportunity_detector::OpportunityDetector;
pub use profit_calculator::{calculate_confidence_score, ProfitCalculator};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::errors::ArbitrageError;
use crate::shared::types::{amount_serde, TokenInfo};
use crate::shared::utils::to_ui_amount;

/// Kind of round trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArbitragePathType {
    Simple,
    MultiHop,
    CrossProtocol,
    WrapUnwrap,
}

impl ArbitragePathType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArbitragePathType::Simple => "simple",
            ArbitragePathType::MultiHop => "multi_hop",
            ArbitragePathType::CrossProtocol => "cross_protocol",
            ArbitragePathType::WrapUnwrap => "wrap_unwrap",
        }
    }
}

/// One swap in a path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrageStep {
    pub pool_id: String,
    pub dex: String,
    pub token_in: TokenInfo,
    pub token_out: TokenInfo,
    #[serde(with = "amount_serde")]
    pub amount_in: u128,
    #[serde(with = "amount_serde")]
    pub amount_out: u128,
    /// Output per input, UI units
    pub price: f64,
    pub fee_bps: u32,
}

impl ArbitrageStep {
    pub fn amount_in_ui(&self) -> f64 {
        to_ui_amount(self.amount_in, self.token_in.decimals)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitragePath {
    pub path_type: ArbitragePathType,
    pub steps: Vec<ArbitrageStep>,
    pub start_token: TokenInfo,
    pub end_token: TokenInfo,
    pub hops: usize,
}

impl ArbitragePath {
    /// Build a path from chained steps, checking token continuity
    pub fn new(path_type: ArbitragePathType, steps: Vec<ArbitrageStep>) -> Result<Self, ArbitrageError> {
        let (first, last) = match (steps.first(), steps.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(ArbitrageError::InvalidRoute("path has no steps".to_string())),
        };

        if let Some(broken) = steps.windows(2).find(|w| w[0].token_out != w[1].token_in) {
            return Err(ArbitrageError::InvalidRoute(format!(
                "step through {} outputs {} but next step sells {}",
                broken[0].pool_id, broken[0].token_out.symbol, broken[1].token_in.symbol
            )));
        }

        Ok(Self {
            path_type,
            start_token: first.token_in.clone(),
            end_token: last.token_out.clone(),
            hops: steps.len(),
            steps,
        })
    }

    pub fn is_cycle(&self) -> bool {
        self.start_token == self.end_token
    }
}

/// A detected round trip with its economics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrageOpportunity {
    pub id: String,
    pub path: ArbitragePath,
    /// Output minus input, start-token UI units
    pub gross_profit: f64,
    pub profit_percent: f64,
    #[serde(with = "amount_serde")]
    pub input_amount: u128,
    #[serde(with = "amount_serde")]
    pub output_amount: u128,
    /// Lamports
    pub gas_estimate: u64,
    /// Gas expressed in start-token UI units
    pub gas_cost: f64,
    /// Lamports per start-token UI unit
    pub settlement_rate: f64,
    pub net_profit: f64,
    pub confidence: f64,
    pub steps: Vec<ArbitrageStep>,
    pub detected_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl ArbitrageOpportunity {
    pub fn start_token(&self) -> &TokenInfo {
        &self.path.start_token
    }

    pub fn input_amount_ui(&self) -> f64 {
        to_ui_amount(self.input_amount, self.path.start_token.decimals)
    }

    pub fn output_amount_ui(&self) -> f64 {
        to_ui_amount(self.output_amount, self.path.end_token.decimals)
    }

    /// (first pool, last pool) identity used for deduplication
    pub fn endpoint_key(&self) -> Option<(&str, &str)> {
        let first = self.path.steps.first()?;
        let last = self.path.steps.last()?;
        Some((first.pool_id.as_str(), last.pool_id.as_str()))
    }

    /// Net profit converted to lamports
    pub fn net_profit_lamports(&self) -> f64 {
        self.net_profit * self.settlement_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(pool: &str, from: &TokenInfo, to: &TokenInfo) -> ArbitrageStep {
        ArbitrageStep {
            pool_id: pool.to_string(),
            dex: "raydium".to_string(),
            token_in: from.clone(),
            token_out: to.clone(),
            amount_in: 1_000_000,
            amount_out: 2_000_000,
            price: 2.0,
            fee_bps: 25,
        }
    }

    #[test]
    fn test_path_continuity() {
        let sol = TokenInfo::new("sol", "SOL", 9);
        let usdc = TokenInfo::new("usdc", "USDC", 6);
        let bonk = TokenInfo::new("bonk", "BONK", 5);

        let path = ArbitragePath::new(
            ArbitragePathType::Simple,
            vec![step("a", &sol, &usdc), step("b", &usdc, &sol)],
        )
        .unwrap();
        assert!(path.is_cycle());
        assert_eq!(path.hops, 2);

        let broken = ArbitragePath::new(
            ArbitragePathType::MultiHop,
            vec![step("a", &sol, &usdc), step("b", &bonk, &sol)],
        );
        assert!(matches!(broken, Err(ArbitrageError::InvalidRoute(_))));
        assert!(ArbitragePath::new(ArbitragePathType::Simple, vec![]).is_err());
    }

    #[test]
    fn test_path_type_serializes_snake_case() {
        let json = serde_json::to_string(&ArbitragePathType::CrossProtocol).unwrap();
        assert_eq!(json, "\"cross_protocol\"");
        assert_eq!(ArbitragePathType::MultiHop.as_str(), "multi_hop");
    }
}
