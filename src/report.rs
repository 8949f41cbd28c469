// src/report.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::arbitrage::{ArbitrageOpportunity, ScanStats};
use crate::domain::risk::RiskAnalysis;
use crate::shared::utils::format_amount;

/// JSON report of one scan
#[derive(Debug, Serialize, Deserialize)]
pub struct ScanReport {
    /// Snapshot file the pools were read from
    pub source: Option<String>,
    pub stats: ScanStats,
    pub opportunities: Vec<ArbitrageOpportunity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub risk: Vec<RiskAnalysis>,
    pub timestamp: DateTime<Utc>,
}

impl ScanReport {
    pub fn new(stats: ScanStats, opportunities: Vec<ArbitrageOpportunity>) -> Self {
        Self {
            source: None,
            stats,
            opportunities,
            risk: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_risk(mut self, risk: Vec<RiskAnalysis>) -> Self {
        self.risk = risk;
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// One line per opportunity, for terminal output
    pub fn summary_lines(&self) -> Vec<String> {
        self.opportunities
            .iter()
            .enumerate()
            .map(|(i, opp)| {
                let route: Vec<&str> = opp.steps.iter().map(|s| s.pool_id.as_str()).collect();
                let token = opp.start_token();
                format!(
                    "{}. [{}] {} -> {:.6} {} net {:.9} ({:.4}%, gas {} lamports, confidence {:.2}) via {}",
                    i + 1,
                    opp.path.path_type.as_str(),
                    format_amount(opp.input_amount, token.decimals),
                    opp.output_amount_ui(),
                    token.symbol,
                    opp.net_profit,
                    opp.profit_percent,
                    opp.gas_estimate,
                    opp.confidence,
                    route.join(" -> ")
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::arbitrage::ArbitrageEngine;
    use crate::domain::pool::test_pools::*;

    #[test]
    fn test_scan_report_json() {
        let pools = vec![
            pool("p1", "raydium", SOL, USDC, 1000.0, 150_000.0, 25),
            pool("p2", "orca", SOL, USDC, 1000.0, 151_500.0, 25),
        ];
        let result = ArbitrageEngine::default().scan(&pools).unwrap();
        let report = ScanReport::new(result.stats, result.opportunities).with_source("pools.json");

        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["source"], "pools.json");
        assert_eq!(value["stats"]["pools"], 2);
        assert_eq!(value["opportunities"][0]["path"]["path_type"], "simple");
        assert_eq!(value["opportunities"][0]["input_amount"], "1000000000");
        assert!(value.get("risk").is_none());

        let lines = report.summary_lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("1. [simple] 1.000000 -> 1.00"));
        assert!(lines[0].contains(" SOL net "));
        assert!(lines[0].ends_with("p2 -> p1"));
    }
}
