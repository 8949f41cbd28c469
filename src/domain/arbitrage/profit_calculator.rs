//! Profit calculation and gas accounting for arbitrage opportunities

use chrono::Utc;

use super::{ArbitrageOpportunity, ArbitragePath};
use crate::shared::config::FeeSchedule;
use crate::shared::errors::ArbitrageError;
use crate::shared::types::LAMPORTS_PER_SOL;
use crate::shared::utils::{generate_id, to_ui_amount};

/// Confidence in a detected opportunity (0.0 - 1.0).
///
/// Larger margins survive price movement better; shorter paths have fewer
/// legs that can fail.
pub fn calculate_confidence_score(profit_percent: f64, hops: usize) -> f64 {
    let mut confidence: f64 = 0.5;

    if profit_percent > 1.0 {
        confidence += 0.3;
    } else if profit_percent > 0.5 {
        confidence += 0.2;
    } else if profit_percent > 0.1 {
        confidence += 0.1;
    }

    if hops <= 2 {
        confidence += 0.2;
    } else if hops <= 3 {
        confidence += 0.1;
    } else {
        confidence -= 0.1;
    }

    confidence.clamp(0.0, 1.0)
}

/// Turns simulated swap sequences into priced opportunities
#[derive(Debug, Clone)]
pub struct ProfitCalculator {
    fees: FeeSchedule,
}

impl ProfitCalculator {
    pub fn new(fees: FeeSchedule) -> Self {
        Self { fees }
    }

    /// Gas for a two-pool trade, priority multiplier included
    pub fn two_pool_gas(&self) -> Result<u64, ArbitrageError> {
        let raw = self.swap_gas(2)?;
        let multiplier_bps = (self.fees.priority_multiplier.max(0.0) * 10_000.0).round() as u64;
        raw.checked_mul(multiplier_bps)
            .map(|scaled| scaled / 10_000)
            .ok_or(ArbitrageError::ArithmeticOverflow("priority gas"))
    }

    /// Gas for a multi-hop cycle
    pub fn cycle_gas(&self, hops: usize) -> Result<u64, ArbitrageError> {
        self.swap_gas(hops)
    }

    fn swap_gas(&self, swaps: usize) -> Result<u64, ArbitrageError> {
        let swaps = u64::try_from(swaps).map_err(|_| ArbitrageError::ArithmeticOverflow("swap count"))?;
        self.fees
            .per_swap_fee_lamports
            .checked_mul(swaps)
            .and_then(|per_swap| per_swap.checked_add(self.fees.base_fee_lamports))
            .ok_or(ArbitrageError::ArithmeticOverflow("swap gas"))
    }

    /// Price an executed-in-simulation path.
    ///
    /// `sol_value` is the SOL value of one start-token UI unit; gas is netted
    /// out in start-token units through it.
    pub fn build_opportunity(
        &self,
        path: ArbitragePath,
        input_amount: u128,
        output_amount: u128,
        gas_estimate: u64,
        sol_value: f64,
    ) -> ArbitrageOpportunity {
        let decimals = path.start_token.decimals;
        let input_ui = to_ui_amount(input_amount, decimals);
        let gross_profit = if output_amount >= input_amount {
            to_ui_amount(output_amount - input_amount, decimals)
        } else {
            -to_ui_amount(input_amount - output_amount, decimals)
        };
        let profit_percent = if input_ui > 0.0 {
            gross_profit / input_ui * 100.0
        } else {
            0.0
        };

        let settlement_rate = sol_value * LAMPORTS_PER_SOL as f64;
        let gas_cost = if settlement_rate > 0.0 {
            gas_estimate as f64 / settlement_rate
        } else {
            f64::INFINITY
        };
        let confidence = calculate_confidence_score(profit_percent, path.hops);

        ArbitrageOpportunity {
            id: generate_id(),
            steps: path.steps.clone(),
            path,
            gross_profit,
            profit_percent,
            input_amount,
            output_amount,
            gas_estimate,
            gas_cost,
            settlement_rate,
            net_profit: gross_profit - gas_cost,
            confidence,
            detected_at: Utc::now(),
            expires_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::arbitrage::{ArbitragePathType, ArbitrageStep};
    use crate::shared::types::TokenInfo;
    use assert_approx_eq::assert_approx_eq;

    fn sol_round_trip(amount_in: u128, amount_out: u128) -> ArbitragePath {
        let sol = TokenInfo::new("So11111111111111111111111111111111111111112", "SOL", 9);
        let usdc = TokenInfo::new("usdc", "USDC", 6);
        let leg = |pool: &str, from: &TokenInfo, to: &TokenInfo, a_in: u128, a_out: u128| ArbitrageStep {
            pool_id: pool.to_string(),
            dex: "raydium".to_string(),
            token_in: from.clone(),
            token_out: to.clone(),
            amount_in: a_in,
            amount_out: a_out,
            price: 150.0,
            fee_bps: 25,
        };
        ArbitragePath::new(
            ArbitragePathType::Simple,
            vec![
                leg("x", &sol, &usdc, amount_in, 150_000_000),
                leg("y", &usdc, &sol, 150_000_000, amount_out),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_gas_estimates() {
        let calculator = ProfitCalculator::new(FeeSchedule::default());
        assert_eq!(calculator.two_pool_gas().unwrap(), 37_500);
        assert_eq!(calculator.cycle_gas(3).unwrap(), 35_000);

        let greedy = ProfitCalculator::new(FeeSchedule {
            base_fee_lamports: u64::MAX,
            per_swap_fee_lamports: 1,
            priority_multiplier: 1.0,
        });
        assert!(greedy.cycle_gas(2).is_err());
    }

    #[test]
    fn test_confidence_score() {
        assert_approx_eq!(calculate_confidence_score(2.0, 2), 1.0);
        assert_approx_eq!(calculate_confidence_score(0.6, 3), 0.8);
        assert_approx_eq!(calculate_confidence_score(0.2, 5), 0.5);
        assert_approx_eq!(calculate_confidence_score(0.05, 4), 0.4);
        assert_approx_eq!(calculate_confidence_score(-3.0, 2), 0.7);
    }

    #[test]
    fn test_build_opportunity_nets_gas() {
        let calculator = ProfitCalculator::new(FeeSchedule::default());
        let path = sol_round_trip(1_000_000_000, 1_010_000_000);
        let opp = calculator.build_opportunity(path, 1_000_000_000, 1_010_000_000, 37_500, 1.0);

        assert_approx_eq!(opp.gross_profit, 0.01);
        assert_approx_eq!(opp.profit_percent, 1.0);
        assert_approx_eq!(opp.gas_cost, 0.0000375);
        assert_approx_eq!(opp.net_profit, 0.01 - 0.0000375);
        assert_approx_eq!(opp.settlement_rate, 1e9);
        assert_eq!(opp.steps.len(), 2);
        assert!(opp.expires_at.is_none());
    }

    #[test]
    fn test_losing_trip_has_negative_profit() {
        let calculator = ProfitCalculator::new(FeeSchedule::default());
        let path = sol_round_trip(1_000_000_000, 990_000_000);
        let opp = calculator.build_opportunity(path, 1_000_000_000, 990_000_000, 37_500, 1.0);
        assert_approx_eq!(opp.gross_profit, -0.01);
        assert!(opp.net_profit < opp.gross_profit);
    }
}
