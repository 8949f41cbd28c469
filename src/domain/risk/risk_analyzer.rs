use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::{
    CompetitionLevel, GasLevel, LiquidityLevel, MarketContext, Recommendation, RiskAnalysis, RiskFactors,
    SlippageLevel, TimeWindow,
};
use crate::domain::arbitrage::ArbitrageOpportunity;
use crate::domain::pool::PoolData;
use crate::shared::config::RiskConfig;
use crate::shared::utils::to_ui_amount;

/// Scores how likely an opportunity is to survive until execution
#[derive(Debug, Clone, Default)]
pub struct RiskAnalyzer {
    config: RiskConfig,
}

impl RiskAnalyzer {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// Analyze against the current wall clock
    pub fn analyze(
        &self,
        opportunity: &ArbitrageOpportunity,
        pools: &[PoolData],
        context: &MarketContext,
    ) -> RiskAnalysis {
        self.analyze_at(opportunity, pools, context, Utc::now())
    }

    /// Analyze as of `now`. `pools` is the snapshot the opportunity came from;
    /// hops through pools missing from it count as having no liquidity.
    pub fn analyze_at(
        &self,
        opportunity: &ArbitrageOpportunity,
        pools: &[PoolData],
        context: &MarketContext,
        now: DateTime<Utc>,
    ) -> RiskAnalysis {
        let cfg = &self.config;
        let congestion = context.network_congestion.clamp(0.0, 1.0);
        let confidence = opportunity.confidence.clamp(0.0, 1.0);

        let min_pool_tvl = self.min_pool_tvl(opportunity, pools);
        let liquidity = if min_pool_tvl >= cfg.liquidity_sufficient {
            LiquidityLevel::Sufficient
        } else if min_pool_tvl >= cfg.liquidity_low {
            LiquidityLevel::Low
        } else {
            LiquidityLevel::Insufficient
        };

        let slippage_ratio = if min_pool_tvl > 0.0 {
            opportunity.input_amount_ui() / min_pool_tvl
        } else {
            f64::INFINITY
        };
        let slippage = if slippage_ratio < cfg.slippage_low {
            SlippageLevel::Low
        } else if slippage_ratio < cfg.slippage_medium {
            SlippageLevel::Medium
        } else {
            SlippageLevel::High
        };

        let gas_ratio = self.gas_ratio(opportunity, context);
        let gas_cost = if opportunity.gross_profit <= 0.0 {
            GasLevel::High
        } else if gas_ratio < cfg.gas_low {
            GasLevel::Low
        } else if gas_ratio < cfg.gas_medium {
            GasLevel::Medium
        } else {
            GasLevel::High
        };

        let age_ms = (now - opportunity.detected_at).num_milliseconds();
        let competition = if age_ms < cfg.competition_high_age_ms
            && opportunity.profit_percent > cfg.competition_high_profit_percent
        {
            CompetitionLevel::High
        } else if age_ms < cfg.competition_medium_age_ms {
            CompetitionLevel::Medium
        } else {
            CompetitionLevel::Low
        };

        let expires_at = opportunity
            .expires_at
            .unwrap_or(opportunity.detected_at + Duration::milliseconds(cfg.default_window_ms));
        let remaining_ms = (expires_at - now).num_milliseconds();
        let time_window = if remaining_ms > cfg.time_wide_ms {
            TimeWindow::Wide
        } else if remaining_ms > cfg.time_narrow_ms {
            TimeWindow::Narrow
        } else {
            TimeWindow::Critical
        };

        let factors = RiskFactors {
            liquidity,
            slippage,
            gas_cost,
            competition,
            time_window,
            min_pool_tvl,
            slippage_ratio,
            gas_ratio,
            age_ms,
            remaining_ms,
        };

        let execution_probability = (self.survival(&factors) * confidence).clamp(0.0, 1.0);
        let risk_score = (self.exposure(&factors) + (1.0 - confidence) * cfg.weights.uncertainty).clamp(0.0, 1.0);

        let competition_level = if context.competitor_activity >= 0.7 {
            competition.raised()
        } else {
            competition
        };

        let recommendation = if execution_probability > cfg.execute_min_probability && risk_score < cfg.execute_max_risk {
            Recommendation::Execute
        } else if execution_probability < cfg.skip_max_probability || risk_score > cfg.skip_min_risk {
            Recommendation::Skip
        } else {
            Recommendation::Caution
        };

        let priority_tip = match recommendation {
            Recommendation::Skip => None,
            _ => {
                let profit_lamports = opportunity.net_profit_lamports().max(0.0);
                let tip = (cfg.base_priority_tip_lamports as f64 + cfg.tip_profit_share * profit_lamports)
                    * (1.0 + congestion);
                Some(tip.floor() as u64)
            }
        };

        let estimated_execution_time = cfg.seconds_per_hop * opportunity.path.hops as f64 * (1.0 + congestion);
        let reasoning = describe(&factors, competition_level, recommendation, execution_probability, risk_score);

        debug!(
            "Risk for {}: p={:.3}, risk={:.3}, {:?}",
            opportunity.id, execution_probability, risk_score, recommendation
        );

        RiskAnalysis {
            opportunity: opportunity.clone(),
            execution_probability,
            risk_score,
            competition_level,
            factors,
            recommendation,
            reasoning,
            estimated_execution_time,
            priority_tip,
        }
    }

    /// Smallest 2x input-side reserve along the path, valued in start-token units
    fn min_pool_tvl(&self, opportunity: &ArbitrageOpportunity, pools: &[PoolData]) -> f64 {
        let input_ui = opportunity.input_amount_ui();

        opportunity
            .path
            .steps
            .iter()
            .map(|step| {
                let pool = match pools.iter().find(|p| p.id == step.pool_id) {
                    Some(pool) => pool,
                    None => return 0.0,
                };
                let reserve = match pool.reserve_of(&step.token_in.mint) {
                    Some(r) => to_ui_amount(r, step.token_in.decimals),
                    None => return 0.0,
                };
                let step_in = step.amount_in_ui();
                if step_in <= 0.0 {
                    return 0.0;
                }
                2.0 * reserve * (input_ui / step_in)
            })
            .fold(f64::INFINITY, f64::min)
            .min(f64::MAX)
    }

    /// Gas over gross profit, with gas raised to the market average if given
    fn gas_ratio(&self, opportunity: &ArbitrageOpportunity, context: &MarketContext) -> f64 {
        let mut gas_lamports = opportunity.gas_estimate;
        if let Some(avg) = context.avg_gas_price {
            let hops = opportunity.path.hops as u64;
            gas_lamports = gas_lamports.max(avg.saturating_mul(hops + 1));
        }

        let gas_cost = if opportunity.settlement_rate > 0.0 {
            gas_lamports as f64 / opportunity.settlement_rate
        } else {
            f64::INFINITY
        };

        if opportunity.gross_profit > 0.0 {
            gas_cost / opportunity.gross_profit
        } else {
            f64::INFINITY
        }
    }

    fn survival(&self, f: &RiskFactors) -> f64 {
        let p = &self.config.penalties;
        let mut probability: f64 = 1.0;

        probability *= match f.liquidity {
            LiquidityLevel::Sufficient => 1.0,
            LiquidityLevel::Low => p.liquidity_low,
            LiquidityLevel::Insufficient => p.liquidity_insufficient,
        };
        probability *= match f.slippage {
            SlippageLevel::Low => 1.0,
            SlippageLevel::Medium => p.slippage_medium,
            SlippageLevel::High => p.slippage_high,
        };
        probability *= match f.gas_cost {
            GasLevel::Low => 1.0,
            GasLevel::Medium => p.gas_medium,
            GasLevel::High => p.gas_high,
        };
        probability *= match f.competition {
            CompetitionLevel::Low => 1.0,
            CompetitionLevel::Medium => p.competition_medium,
            CompetitionLevel::High => p.competition_high,
        };
        probability *= match f.time_window {
            TimeWindow::Wide => 1.0,
            TimeWindow::Narrow => p.time_narrow,
            TimeWindow::Critical => p.time_critical,
        };
        probability
    }

    fn exposure(&self, f: &RiskFactors) -> f64 {
        let w = &self.config.weights;

        let liquidity = match f.liquidity {
            LiquidityLevel::Sufficient => 0.0,
            LiquidityLevel::Low => w.liquidity_low,
            LiquidityLevel::Insufficient => w.liquidity_insufficient,
        };
        let slippage = match f.slippage {
            SlippageLevel::Low => 0.0,
            SlippageLevel::Medium => w.slippage_medium,
            SlippageLevel::High => w.slippage_high,
        };
        let gas = match f.gas_cost {
            GasLevel::Low => 0.0,
            GasLevel::Medium => w.gas_medium,
            GasLevel::High => w.gas_high,
        };
        let competition = match f.competition {
            CompetitionLevel::Low => 0.0,
            CompetitionLevel::Medium => w.competition_medium,
            CompetitionLevel::High => w.competition_high,
        };
        let time = match f.time_window {
            TimeWindow::Wide => 0.0,
            TimeWindow::Narrow => w.time_narrow,
            TimeWindow::Critical => w.time_critical,
        };

        liquidity + slippage + gas + competition + time
    }
}

fn describe(
    f: &RiskFactors,
    competition: CompetitionLevel,
    recommendation: Recommendation,
    probability: f64,
    risk: f64,
) -> String {
    format!(
        "liquidity {:?} (min TVL {:.2}); slippage {:?} ({:.4}% of TVL); gas {:?} ({:.1}% of gross); \
         competition {:?} (age {} ms); window {:?} ({} ms left) => {:?} at p={:.2}, risk={:.2}",
        f.liquidity,
        f.min_pool_tvl,
        f.slippage,
        f.slippage_ratio * 100.0,
        f.gas_cost,
        f.gas_ratio * 100.0,
        competition,
        f.age_ms,
        f.time_window,
        f.remaining_ms,
        recommendation,
        probability,
        risk
    )
    .to_lowercase()
}
