use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::shared::errors::AppError;
use crate::shared::types::WSOL_MINT;

/// Per-scan detection settings supplied by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Minimum net profit, in settlement-token UI units
    pub min_profit_threshold: f64,
    /// Minimum profit percent (1.0 = 1%)
    pub min_profit_percent: f64,
    /// Maximum edges in a multi-hop cycle
    pub max_hops: usize,
    /// Keep unprofitable opportunities for diagnostics
    pub show_unprofitable: bool,
    /// Exchanges allowed in the scan; empty means every exchange
    pub enabled_exchanges: HashSet<String>,
    /// Token round trips start and end in when a pair contains it
    pub settlement_mint: String,
    /// Candidate trade sizes for two-pool detection, in settlement UI units
    pub trade_ladder: Vec<f64>,
    /// Input size for multi-hop simulation, in start-token UI units
    pub nominal_cycle_input: f64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            min_profit_threshold: 0.0,
            min_profit_percent: 0.1,
            max_hops: 4,
            show_unprofitable: false,
            enabled_exchanges: HashSet::new(),
            settlement_mint: WSOL_MINT.to_string(),
            trade_ladder: vec![0.1, 0.5, 1.0, 5.0, 10.0],
            nominal_cycle_input: 1.0,
        }
    }
}

impl ScannerConfig {
    pub fn is_exchange_enabled(&self, dex: &str) -> bool {
        self.enabled_exchanges.is_empty() || self.enabled_exchanges.contains(dex)
    }
}

/// Transaction cost model, all figures in lamports
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    pub base_fee_lamports: u64,
    pub per_swap_fee_lamports: u64,
    /// Applied to two-pool trades to outbid MEV searchers (> 1.0)
    pub priority_multiplier: f64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            base_fee_lamports: 5_000,
            per_swap_fee_lamports: 10_000,
            priority_multiplier: 1.5,
        }
    }
}

/// Bounds on the multi-hop cycle search.
///
/// Full cycle enumeration is exponential in the branching factor, so only the
/// first `max_start_tokens` tokens (in snapshot order) seed a search, and each
/// seed's search stops after `max_search_nodes` expanded nodes. Cycles made only
/// of later tokens are not reported.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchLimits {
    pub max_start_tokens: usize,
    pub max_search_nodes: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_start_tokens: 10,
            max_search_nodes: 200_000,
        }
    }
}

/// Probability multipliers applied for each unfavorable factor level
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskPenalties {
    pub liquidity_low: f64,
    pub liquidity_insufficient: f64,
    pub slippage_medium: f64,
    pub slippage_high: f64,
    pub gas_medium: f64,
    pub gas_high: f64,
    pub competition_medium: f64,
    pub competition_high: f64,
    pub time_narrow: f64,
    pub time_critical: f64,
}

impl Default for RiskPenalties {
    fn default() -> Self {
        Self {
            liquidity_low: 0.8,
            liquidity_insufficient: 0.3,
            slippage_medium: 0.9,
            slippage_high: 0.6,
            gas_medium: 0.9,
            gas_high: 0.7,
            competition_medium: 0.85,
            competition_high: 0.6,
            time_narrow: 0.85,
            time_critical: 0.5,
        }
    }
}

/// Additive risk-score weights
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    pub liquidity_low: f64,
    pub liquidity_insufficient: f64,
    pub slippage_medium: f64,
    pub slippage_high: f64,
    pub gas_medium: f64,
    pub gas_high: f64,
    pub competition_medium: f64,
    pub competition_high: f64,
    pub time_narrow: f64,
    pub time_critical: f64,
    /// Multiplied by (1 - confidence)
    pub uncertainty: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            liquidity_low: 0.2,
            liquidity_insufficient: 0.4,
            slippage_medium: 0.15,
            slippage_high: 0.3,
            gas_medium: 0.1,
            gas_high: 0.2,
            competition_medium: 0.15,
            competition_high: 0.3,
            time_narrow: 0.15,
            time_critical: 0.3,
            uncertainty: 0.2,
        }
    }
}

/// Thresholds and policies of the risk analyzer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub liquidity_sufficient: f64,
    pub liquidity_low: f64,
    pub slippage_low: f64,
    pub slippage_medium: f64,
    pub gas_low: f64,
    pub gas_medium: f64,
    pub competition_high_age_ms: i64,
    pub competition_medium_age_ms: i64,
    pub competition_high_profit_percent: f64,
    pub time_wide_ms: i64,
    pub time_narrow_ms: i64,
    pub default_window_ms: i64,
    pub execute_min_probability: f64,
    pub execute_max_risk: f64,
    pub skip_max_probability: f64,
    pub skip_min_risk: f64,
    pub base_priority_tip_lamports: u64,
    pub tip_profit_share: f64,
    pub seconds_per_hop: f64,
    pub penalties: RiskPenalties,
    pub weights: RiskWeights,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            liquidity_sufficient: 1000.0,
            liquidity_low: 100.0,
            slippage_low: 0.01,
            slippage_medium: 0.05,
            gas_low: 0.1,
            gas_medium: 0.3,
            competition_high_age_ms: 5_000,
            competition_medium_age_ms: 10_000,
            competition_high_profit_percent: 2.0,
            time_wide_ms: 30_000,
            time_narrow_ms: 10_000,
            default_window_ms: 60_000,
            execute_min_probability: 0.7,
            execute_max_risk: 0.3,
            skip_max_probability: 0.3,
            skip_min_risk: 0.7,
            base_priority_tip_lamports: 10_000,
            tip_profit_share: 0.1,
            seconds_per_hop: 0.4,
            penalties: RiskPenalties::default(),
            weights: RiskWeights::default(),
        }
    }
}

/// Engine configuration as stored in Config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scanner: ScannerConfig,
    pub fees: FeeSchedule,
    pub search: SearchLimits,
    pub risk: RiskConfig,
}

impl EngineConfig {
    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<(), AppError> {
        if self.scanner.max_hops < 2 {
            return Err(AppError::ConfigError(format!(
                "max_hops must be at least 2, got {}",
                self.scanner.max_hops
            )));
        }
        if self.scanner.trade_ladder.is_empty()
            || self.scanner.trade_ladder.iter().any(|a| !a.is_finite() || *a <= 0.0)
        {
            return Err(AppError::ConfigError(
                "trade_ladder must hold positive amounts".to_string(),
            ));
        }
        if !(self.scanner.nominal_cycle_input.is_finite() && self.scanner.nominal_cycle_input > 0.0) {
            return Err(AppError::ConfigError(
                "nominal_cycle_input must be positive".to_string(),
            ));
        }
        if self.fees.priority_multiplier < 1.0 {
            return Err(AppError::ConfigError(format!(
                "priority_multiplier must be >= 1.0, got {}",
                self.fees.priority_multiplier
            )));
        }
        Ok(())
    }
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from Config.toml in the working directory
    pub fn load_config() -> Result<EngineConfig, AppError> {
        Self::load_from("Config.toml")
    }

    /// Load configuration from an explicit path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<EngineConfig, AppError> {
        let config_content = fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config = Self::parse(&config_content)?;
        info!("Loaded engine configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Parse and validate a TOML document
    pub fn parse(content: &str) -> Result<EngineConfig, AppError> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| AppError::ConfigError(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}
