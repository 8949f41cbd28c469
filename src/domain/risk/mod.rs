//! Risk domain - execution probability and recommendations for detected opportunities

mod risk_analyzer;

pub use risk_analyzer::RiskAnalyzer;

use serde::{Deserialize, Serialize};

use crate::domain::arbitrage::ArbitrageOpportunity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidityLevel {
    Sufficient,
    Low,
    Insufficient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlippageLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GasLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitionLevel {
    Low,
    Medium,
    High,
}

impl CompetitionLevel {
    /// One level up, saturating at high
    pub fn raised(self) -> Self {
        match self {
            CompetitionLevel::Low => CompetitionLevel::Medium,
            CompetitionLevel::Medium | CompetitionLevel::High => CompetitionLevel::High,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    Wide,
    Narrow,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Execute,
    Caution,
    Skip,
}

/// Factor breakdown behind a risk analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskFactors {
    pub liquidity: LiquidityLevel,
    pub slippage: SlippageLevel,
    pub gas_cost: GasLevel,
    pub competition: CompetitionLevel,
    pub time_window: TimeWindow,
    /// Smallest pool TVL along the path, start-token UI units
    pub min_pool_tvl: f64,
    pub slippage_ratio: f64,
    pub gas_ratio: f64,
    pub age_ms: i64,
    pub remaining_ms: i64,
}

/// Live market conditions supplied by the caller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketContext {
    /// 0.0 (idle) - 1.0 (saturated)
    pub network_congestion: f64,
    /// 0.0 - 1.0; 0.7 and above raises the reported competition level
    pub competitor_activity: f64,
    /// Average recent gas price per instruction, lamports
    pub avg_gas_price: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAnalysis {
    pub opportunity: ArbitrageOpportunity,
    pub execution_probability: f64,
    pub risk_score: f64,
    pub competition_level: CompetitionLevel,
    pub factors: RiskFactors,
    pub recommendation: Recommendation,
    pub reasoning: String,
    /// Seconds
    pub estimated_execution_time: f64,
    /// Lamports; absent when the recommendation is skip
    pub priority_tip: Option<u64>,
}
