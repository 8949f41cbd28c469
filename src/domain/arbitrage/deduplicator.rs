//! Deduplication, threshold filtering and ranking of detected opportunities

use std::collections::HashSet;

use tracing::debug;

use super::ArbitrageOpportunity;
use crate::shared::config::ScannerConfig;

/// Drop opportunities whose (first pool, last pool) endpoints were already
/// seen, keeping the first occurrence. Empty paths are dropped as well.
pub fn deduplicate(opportunities: Vec<ArbitrageOpportunity>) -> Vec<ArbitrageOpportunity> {
    let mut seen: HashSet<(String, String)> = HashSet::new();

    opportunities
        .into_iter()
        .filter(|opp| match opp.endpoint_key() {
            Some((first, last)) => seen.insert((first.to_string(), last.to_string())),
            None => {
                debug!("Dropping opportunity {} with an empty path", opp.id);
                false
            }
        })
        .collect()
}

/// Keep opportunities meeting both profit thresholds, unless the scanner is
/// configured to show unprofitable ones
pub fn apply_filters(
    opportunities: Vec<ArbitrageOpportunity>,
    config: &ScannerConfig,
) -> Vec<ArbitrageOpportunity> {
    if config.show_unprofitable {
        return opportunities;
    }

    opportunities
        .into_iter()
        .filter(|opp| {
            let keep = opp.net_profit >= config.min_profit_threshold
                && opp.profit_percent >= config.min_profit_percent;
            if !keep {
                debug!(
                    "🚫 Opportunity {} filtered: net {:.9} (min {}), {:.4}% (min {}%)",
                    opp.id, opp.net_profit, config.min_profit_threshold,
                    opp.profit_percent, config.min_profit_percent
                );
            }
            keep
        })
        .collect()
}

/// Stable sort by net profit, best first
pub fn sort_by_net_profit(opportunities: &mut [ArbitrageOpportunity]) {
    opportunities.sort_by(|a, b| b.net_profit.total_cmp(&a.net_profit));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::arbitrage::{ArbitragePath, ArbitragePathType, ArbitrageStep};
    use crate::shared::types::TokenInfo;
    use chrono::Utc;

    fn opportunity(id: &str, first: &str, last: &str, net: f64, pct: f64) -> ArbitrageOpportunity {
        let sol = TokenInfo::new("sol", "SOL", 9);
        let usdc = TokenInfo::new("usdc", "USDC", 6);
        let leg = |pool: &str, from: &TokenInfo, to: &TokenInfo| ArbitrageStep {
            pool_id: pool.to_string(),
            dex: "orca".to_string(),
            token_in: from.clone(),
            token_out: to.clone(),
            amount_in: 1,
            amount_out: 1,
            price: 1.0,
            fee_bps: 30,
        };
        let path = ArbitragePath::new(
            ArbitragePathType::Simple,
            vec![leg(first, &sol, &usdc), leg(last, &usdc, &sol)],
        )
        .unwrap();
        ArbitrageOpportunity {
            id: id.to_string(),
            steps: path.steps.clone(),
            path,
            gross_profit: net,
            profit_percent: pct,
            input_amount: 1,
            output_amount: 1,
            gas_estimate: 0,
            gas_cost: 0.0,
            settlement_rate: 1e9,
            net_profit: net,
            confidence: 0.5,
            detected_at: Utc::now(),
            expires_at: None,
        }
    }

    fn ids(opportunities: &[ArbitrageOpportunity]) -> Vec<&str> {
        opportunities.iter().map(|o| o.id.as_str()).collect()
    }

    #[test]
    fn test_deduplicate_keeps_first() {
        let input = vec![
            opportunity("a", "x", "y", 1.0, 1.0),
            opportunity("b", "x", "y", 5.0, 5.0),
            opportunity("c", "y", "x", 2.0, 2.0),
        ];
        let once = deduplicate(input);
        assert_eq!(ids(&once), vec!["a", "c"]);

        let twice = deduplicate(once.clone());
        assert_eq!(ids(&twice), ids(&once));
    }

    #[test]
    fn test_deduplicate_drops_empty_paths() {
        let mut empty = opportunity("e", "x", "y", 1.0, 1.0);
        empty.path.steps.clear();
        assert!(deduplicate(vec![empty]).is_empty());
    }

    #[test]
    fn test_filter_thresholds() {
        let config = ScannerConfig {
            min_profit_threshold: 0.01,
            min_profit_percent: 0.5,
            ..ScannerConfig::default()
        };
        let input = vec![
            opportunity("keep", "a", "b", 0.02, 0.6),
            opportunity("low-net", "c", "d", 0.001, 0.6),
            opportunity("low-pct", "e", "f", 0.02, 0.4),
            opportunity("edge", "g", "h", 0.01, 0.5),
        ];
        assert_eq!(ids(&apply_filters(input.clone(), &config)), vec!["keep", "edge"]);

        let show_all = ScannerConfig {
            show_unprofitable: true,
            ..config
        };
        assert_eq!(apply_filters(input, &show_all).len(), 4);
    }

    #[test]
    fn test_sort_is_stable_descending() {
        let mut list = vec![
            opportunity("small", "a", "b", 0.1, 1.0),
            opportunity("big", "c", "d", 3.0, 1.0),
            opportunity("tie-1", "e", "f", 1.0, 1.0),
            opportunity("negative", "g", "h", -1.0, 1.0),
            opportunity("tie-2", "i", "j", 1.0, 1.0),
        ];
        sort_by_net_profit(&mut list);
        assert_eq!(ids(&list), vec!["big", "tie-1", "tie-2", "small", "negative"]);
    }
}
