use rayon::prelude::*;
use tracing::{debug, warn};

use super::{ArbitrageOpportunity, ArbitragePath, ArbitragePathType, ArbitrageStep, ProfitCalculator};
use crate::domain::pool::{PairGraph, PairGroup, PoolData, PoolEdge, PoolIndex, SwapDirection, TokenIndex};
use crate::math::slippage_adjusted_output;
use crate::shared::config::{EngineConfig, ScannerConfig, SearchLimits};
use crate::shared::errors::ArbitrageError;
use crate::shared::types::TokenInfo;
use crate::shared::utils::{calculate_percentage_change, to_raw_amount};

/// Outcome of the multi-hop cycle search
#[derive(Debug, Default)]
pub struct CycleSearch {
    pub opportunities: Vec<ArbitrageOpportunity>,
    pub nodes_expanded: usize,
    /// Start tokens whose search hit the node budget
    pub exhausted_starts: usize,
}

struct StartSearch {
    opportunities: Vec<ArbitrageOpportunity>,
    nodes_expanded: usize,
    exhausted: bool,
}

/// DFS frame: a token on the current path and the next edge to try from it
struct Frame {
    token: TokenIndex,
    cursor: usize,
}

/// Detector of arbitrage opportunities over one pair graph
pub struct OpportunityDetector<'g, 'a> {
    graph: &'g PairGraph<'a>,
    scanner: &'g ScannerConfig,
    limits: &'g SearchLimits,
    calculator: ProfitCalculator,
}

impl<'g, 'a> OpportunityDetector<'g, 'a> {
    pub fn new(graph: &'g PairGraph<'a>, config: &'g EngineConfig) -> Self {
        Self {
            graph,
            scanner: &config.scanner,
            limits: &config.search,
            calculator: ProfitCalculator::new(config.fees.clone()),
        }
    }

    /// Two-pool round trips between pools quoting the same pair
    pub fn detect_simple(&self) -> Result<Vec<ArbitrageOpportunity>, ArbitrageError> {
        let per_group = self
            .graph
            .pair_groups()
            .par_iter()
            .map(|group| self.scan_pair_group(group))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(per_group.into_iter().flatten().collect())
    }

    fn scan_pair_group(&self, group: &PairGroup) -> Result<Vec<ArbitrageOpportunity>, ArbitrageError> {
        let pools = &group.pools;
        if pools.len() < 2 {
            return Ok(Vec::new());
        }

        let mut pairs: Vec<(PoolIndex, PoolIndex)> = Vec::new();
        for i in 0..pools.len() {
            for j in (i + 1)..pools.len() {
                pairs.push((pools[i], pools[j]));
            }
        }
        // with three or more venues prefer pairs across exchanges, if any exist
        if pools.len() >= 3 {
            let crossing: Vec<_> = pairs
                .iter()
                .copied()
                .filter(|&(p, q)| self.graph.pool(p).dex != self.graph.pool(q).dex)
                .collect();
            if !crossing.is_empty() {
                pairs = crossing;
            }
        }

        let (settle, other) = self.settlement_side(group);
        let mut found = Vec::new();
        for (p, q) in pairs {
            let (p, q) = (self.graph.pool(p), self.graph.pool(q));
            if let Some(opp) = self.evaluate_pool_pair(p, q, settle, other, ArbitragePathType::Simple)? {
                found.push(opp);
            }
        }
        Ok(found)
    }

    /// Round trips between exchanges quoting the same pair, one venue per
    /// exchange (its deepest pool on the settlement side)
    pub fn detect_cross_exchange(&self) -> Result<Vec<ArbitrageOpportunity>, ArbitrageError> {
        let per_group = self
            .graph
            .pair_groups()
            .par_iter()
            .map(|group| self.scan_exchange_venues(group))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(per_group.into_iter().flatten().collect())
    }

    fn scan_exchange_venues(&self, group: &PairGroup) -> Result<Vec<ArbitrageOpportunity>, ArbitrageError> {
        let (settle, other) = self.settlement_side(group);

        let mut venues: Vec<(&str, PoolIndex)> = Vec::new();
        for &index in &group.pools {
            let pool = self.graph.pool(index);
            match venues.iter_mut().find(|(dex, _)| *dex == pool.dex) {
                Some(venue) => {
                    let current = self.graph.pool(venue.1).reserve_of(&settle.mint).unwrap_or(0);
                    if pool.reserve_of(&settle.mint).unwrap_or(0) > current {
                        venue.1 = index;
                    }
                }
                None => venues.push((pool.dex.as_str(), index)),
            }
        }

        let mut found = Vec::new();
        for i in 0..venues.len() {
            for j in (i + 1)..venues.len() {
                let p = self.graph.pool(venues[i].1);
                let q = self.graph.pool(venues[j].1);
                if let Some(opp) = self.evaluate_pool_pair(p, q, settle, other, ArbitragePathType::CrossProtocol)? {
                    found.push(opp);
                }
            }
        }
        Ok(found)
    }

    /// (settlement token, other token) for a pair
    fn settlement_side(&self, group: &PairGroup) -> (&'a TokenInfo, &'a TokenInfo) {
        let first = self.graph.token(group.first);
        let second = self.graph.token(group.second);
        if second.mint == self.scanner.settlement_mint {
            (second, first)
        } else {
            (first, second)
        }
    }

    /// Buy `other` on the pool quoting it cheaper in settlement units and
    /// sell it on the richer one
    fn evaluate_pool_pair(
        &self,
        p: &'a PoolData,
        q: &'a PoolData,
        settle: &'a TokenInfo,
        other: &'a TokenInfo,
        path_type: ArbitragePathType,
    ) -> Result<Option<ArbitrageOpportunity>, ArbitrageError> {
        let (price_p, price_q) = match (p.price_for(&other.mint), q.price_for(&other.mint)) {
            (Some(a), Some(b)) => (a, b),
            _ => return Ok(None),
        };
        let (source, destination, low, high) = if price_p <= price_q {
            (p, q, price_p, price_q)
        } else {
            (q, p, price_q, price_p)
        };

        let difference = calculate_percentage_change(low, high);
        if difference <= self.scanner.min_profit_percent {
            return Ok(None);
        }

        let (input, middle, output) = match self.best_trade_size(source, destination, settle, other)? {
            Some(sizes) => sizes,
            None => return Ok(None),
        };

        let steps = vec![
            self.step(source, settle, other, input, middle, low.recip()),
            self.step(destination, other, settle, middle, output, high),
        ];
        let path = ArbitragePath::new(path_type, steps)?;
        let gas = self.calculator.two_pool_gas()?;

        let opportunity = match self.price_opportunity(path, input, output, gas) {
            Some(opp) => opp,
            None => return Ok(None),
        };
        if opportunity.net_profit > 0.0 || self.scanner.show_unprofitable {
            debug!(
                "Two-pool {} {} -> {}: {:.4}% spread, net {:.9} {}",
                path_type.as_str(), source.id, destination.id, difference,
                opportunity.net_profit, settle.symbol
            );
            Ok(Some(opportunity))
        } else {
            Ok(None)
        }
    }

    /// Ladder search over trade sizes; returns (input, intermediate, output)
    /// for the size with the largest output minus input, first size on ties
    fn best_trade_size(
        &self,
        source: &PoolData,
        destination: &PoolData,
        settle: &TokenInfo,
        other: &TokenInfo,
    ) -> Result<Option<(u128, u128, u128)>, ArbitrageError> {
        let (source_in, source_out) = match source.reserves_for(&settle.mint) {
            Some(r) => r,
            None => return Ok(None),
        };
        let (dest_in, dest_out) = match destination.reserves_for(&other.mint) {
            Some(r) => r,
            None => return Ok(None),
        };

        let mut best: Option<(i128, (u128, u128, u128))> = None;
        for &size in &self.scanner.trade_ladder {
            let input = to_raw_amount(size, settle.decimals);
            if input == 0 {
                continue;
            }
            let middle = slippage_adjusted_output(input, source_in, source_out, source.fee_bps)?;
            let output = slippage_adjusted_output(middle, dest_in, dest_out, destination.fee_bps)?;

            let gain = signed(output)? - signed(input)?;
            if best.map_or(true, |(best_gain, _)| gain > best_gain) {
                best = Some((gain, (input, middle, output)));
            }
        }
        Ok(best.map(|(_, sizes)| sizes))
    }

    /// Simple cycles of 3..=max_hops swaps, searched from the first
    /// `max_start_tokens` tokens in parallel.
    ///
    /// Two-swap round trips through two pools of one pair belong to the
    /// two-pool detectors, which size them over the trade ladder; they are
    /// not enumerated here.
    pub fn detect_multi_hop(&self) -> Result<CycleSearch, ArbitrageError> {
        if self.scanner.max_hops < 3 {
            debug!("Multi-hop search skipped: max_hops {} < 3", self.scanner.max_hops);
            return Ok(CycleSearch::default());
        }

        let start_count = self.limits.max_start_tokens.min(self.graph.token_count());
        let searches = (0..start_count)
            .into_par_iter()
            .map(|start| self.search_cycles_from(TokenIndex(start)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut result = CycleSearch::default();
        for search in searches {
            result.nodes_expanded += search.nodes_expanded;
            if search.exhausted {
                result.exhausted_starts += 1;
            }
            result.opportunities.extend(search.opportunities);
        }

        if result.exhausted_starts > 0 {
            warn!(
                "⚠️ Cycle search hit the node budget ({}) for {} start token(s); results are partial",
                self.limits.max_search_nodes, result.exhausted_starts
            );
        }
        Ok(result)
    }

    /// Explicit-stack DFS for cycles whose lowest-index token is `start`,
    /// so each cycle is reported once per direction
    fn search_cycles_from(&self, start: TokenIndex) -> Result<StartSearch, ArbitrageError> {
        let mut search = StartSearch {
            opportunities: Vec::new(),
            nodes_expanded: 0,
            exhausted: false,
        };

        let input = to_raw_amount(self.scanner.nominal_cycle_input, self.graph.token(start).decimals);
        if input == 0 {
            return Ok(search);
        }

        let max_hops = self.scanner.max_hops;
        let mut stack = vec![Frame { token: start, cursor: 0 }];
        let mut path: Vec<PoolEdge> = Vec::new();
        let mut amounts: Vec<u128> = vec![input];
        let mut on_path = vec![false; self.graph.token_count()];
        on_path[start.0] = true;

        loop {
            let (token, cursor) = match stack.last_mut() {
                Some(frame) => {
                    let cursor = frame.cursor;
                    frame.cursor += 1;
                    (frame.token, cursor)
                }
                None => break,
            };

            let edge = match self.graph.edges(token).get(cursor) {
                Some(edge) => *edge,
                None => {
                    stack.pop();
                    if !stack.is_empty() {
                        on_path[token.0] = false;
                        path.pop();
                        amounts.pop();
                    }
                    continue;
                }
            };

            let hops = path.len() + 1;
            let amount_in = amounts.last().copied().unwrap_or(0);

            if edge.to == start {
                if hops >= 3 && hops <= max_hops {
                    let output = self.simulate_edge(&edge, amount_in)?;
                    if output > input || self.scanner.show_unprofitable {
                        let mut cycle = path.clone();
                        cycle.push(edge);
                        let mut cycle_amounts = amounts.clone();
                        cycle_amounts.push(output);
                        if let Some(opp) = self.cycle_opportunity(start, &cycle, &cycle_amounts)? {
                            search.opportunities.push(opp);
                        }
                    }
                }
                continue;
            }

            if hops >= max_hops || on_path[edge.to.0] || edge.to < start {
                continue;
            }
            if search.nodes_expanded >= self.limits.max_search_nodes {
                search.exhausted = true;
                break;
            }
            search.nodes_expanded += 1;

            let output = self.simulate_edge(&edge, amount_in)?;
            if output == 0 {
                continue;
            }
            on_path[edge.to.0] = true;
            path.push(edge);
            amounts.push(output);
            stack.push(Frame { token: edge.to, cursor: 0 });
        }

        Ok(search)
    }

    fn simulate_edge(&self, edge: &PoolEdge, amount_in: u128) -> Result<u128, ArbitrageError> {
        let pool = self.graph.pool(edge.pool);
        let (reserve_in, reserve_out) = match edge.direction {
            SwapDirection::AToB => (pool.reserves.token_a, pool.reserves.token_b),
            SwapDirection::BToA => (pool.reserves.token_b, pool.reserves.token_a),
        };
        slippage_adjusted_output(amount_in, reserve_in, reserve_out, pool.fee_bps)
    }

    fn cycle_opportunity(
        &self,
        start: TokenIndex,
        cycle: &[PoolEdge],
        amounts: &[u128],
    ) -> Result<Option<ArbitrageOpportunity>, ArbitrageError> {
        let mut current = start;
        let mut steps = Vec::with_capacity(cycle.len());
        for (i, edge) in cycle.iter().enumerate() {
            let pool = self.graph.pool(edge.pool);
            steps.push(self.step(
                pool,
                self.graph.token(current),
                self.graph.token(edge.to),
                amounts[i],
                amounts[i + 1],
                edge.price,
            ));
            current = edge.to;
        }

        let hops = cycle.len();
        let path_type = if hops > 3 {
            ArbitragePathType::CrossProtocol
        } else {
            ArbitragePathType::MultiHop
        };
        let path = ArbitragePath::new(path_type, steps)?;
        let gas = self.calculator.cycle_gas(hops)?;
        let input = amounts.first().copied().unwrap_or(0);
        let output = amounts.last().copied().unwrap_or(0);
        Ok(self.price_opportunity(path, input, output, gas))
    }

    /// Wrap/unwrap round trips (SOL <-> wSOL) are value-neutral at the pool
    /// level, so this hook never reports anything
    pub fn detect_wrap_unwrap(&self) -> Vec<ArbitrageOpportunity> {
        Vec::new()
    }

    fn step(
        &self,
        pool: &PoolData,
        token_in: &TokenInfo,
        token_out: &TokenInfo,
        amount_in: u128,
        amount_out: u128,
        price: f64,
    ) -> ArbitrageStep {
        ArbitrageStep {
            pool_id: pool.id.clone(),
            dex: pool.dex.clone(),
            token_in: token_in.clone(),
            token_out: token_out.clone(),
            amount_in,
            amount_out,
            price,
            fee_bps: pool.fee_bps,
        }
    }

    /// Net gas into the path's start token; `None` when the start token has
    /// no pool pricing it in SOL
    fn price_opportunity(
        &self,
        path: ArbitragePath,
        input: u128,
        output: u128,
        gas: u64,
    ) -> Option<ArbitrageOpportunity> {
        let sol_value = self
            .graph
            .token_index(&path.start_token.mint)
            .and_then(|token| self.graph.sol_value(token));

        match sol_value {
            Some(value) => Some(self.calculator.build_opportunity(path, input, output, gas, value)),
            None => {
                debug!(
                    "Dropping {} path from {}: no SOL pool prices the gas",
                    path.path_type.as_str(),
                    path.start_token.symbol
                );
                None
            }
        }
    }
}

fn signed(amount: u128) -> Result<i128, ArbitrageError> {
    i128::try_from(amount).map_err(|_| ArbitrageError::ArithmeticOverflow("trade size comparison"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pool::test_pools::*;
    use assert_approx_eq::assert_approx_eq;

    fn engine_config() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn test_simple_buys_on_cheaper_pool() {
        let pools = vec![
            pool("p1", "raydium", SOL, USDC, 1000.0, 150_000.0, 25),
            pool("p2", "orca", SOL, USDC, 1000.0, 151_500.0, 25),
        ];
        let config = engine_config();
        let graph = PairGraph::build(&pools, &config.scanner);
        let detector = OpportunityDetector::new(&graph, &config);

        let found = detector.detect_simple().unwrap();
        assert_eq!(found.len(), 1);
        let opp = &found[0];
        assert_eq!(opp.path.path_type, ArbitragePathType::Simple);
        assert_eq!(opp.steps.len(), 2);
        assert_eq!(opp.steps[0].pool_id, "p2");
        assert_eq!(opp.steps[1].pool_id, "p1");
        assert_eq!(opp.path.start_token.mint, SOL);
        assert!(opp.path.is_cycle());
        // impact on 5+ SOL outweighs the 1% spread
        assert_eq!(opp.input_amount, 1_000_000_000);
        assert_eq!(opp.gas_estimate, 37_500);
        assert!(opp.net_profit > 0.0);
    }

    #[test]
    fn test_simple_skips_same_exchange_when_crowded() {
        let pools = vec![
            pool("a", "orca", SOL, USDC, 1000.0, 150_000.0, 25),
            pool("b", "orca", SOL, USDC, 1000.0, 153_000.0, 25),
            pool("c", "raydium", SOL, USDC, 1000.0, 150_000.0, 25),
        ];
        let config = engine_config();
        let graph = PairGraph::build(&pools, &config.scanner);
        let found = OpportunityDetector::new(&graph, &config).detect_simple().unwrap();

        assert_eq!(found.len(), 1);
        let endpoints: Vec<&str> = found[0].steps.iter().map(|s| s.pool_id.as_str()).collect();
        assert_eq!(endpoints, vec!["b", "c"]);
    }

    #[test]
    fn test_simple_falls_back_to_same_exchange() {
        let mut pools = vec![
            pool("a", "orca", SOL, USDC, 1000.0, 150_000.0, 25),
            pool("b", "orca", SOL, USDC, 1000.0, 153_000.0, 25),
        ];
        let config = engine_config();
        let graph = PairGraph::build(&pools, &config.scanner);
        assert_eq!(OpportunityDetector::new(&graph, &config).detect_simple().unwrap().len(), 1);

        pools.push(pool("c", "orca", SOL, USDC, 1000.0, 150_000.0, 25));
        let graph = PairGraph::build(&pools, &config.scanner);
        let found = OpportunityDetector::new(&graph, &config).detect_simple().unwrap();

        assert_eq!(found.len(), 2);
        let routes: Vec<Vec<&str>> = found
            .iter()
            .map(|o| o.steps.iter().map(|s| s.pool_id.as_str()).collect())
            .collect();
        assert_eq!(routes, vec![vec!["b", "a"], vec!["b", "c"]]);
    }

    #[test]
    fn test_cross_exchange_uses_deepest_venue() {
        let pools = vec![
            pool("orca-small", "orca", SOL, USDC, 10.0, 1_530.0, 25),
            pool("orca-deep", "orca", SOL, USDC, 1000.0, 153_000.0, 25),
            pool("ray", "raydium", SOL, USDC, 1000.0, 150_000.0, 25),
        ];
        let config = engine_config();
        let graph = PairGraph::build(&pools, &config.scanner);
        let found = OpportunityDetector::new(&graph, &config)
            .detect_cross_exchange()
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path.path_type, ArbitragePathType::CrossProtocol);
        assert_eq!(found[0].steps[0].pool_id, "orca-deep");
        assert_eq!(found[0].steps[1].pool_id, "ray");
    }

    #[test]
    fn test_gas_converted_for_non_sol_start() {
        let mut pools = vec![
            pool("q1", "orca", USDC, BONK, 150_000.0, 7_500_000_000.0, 25),
            pool("q2", "raydium", USDC, BONK, 150_000.0, 7_600_000_000.0, 25),
        ];
        let config = engine_config();

        // no SOL pool: gas cannot be priced in USDC
        let graph = PairGraph::build(&pools, &config.scanner);
        assert!(OpportunityDetector::new(&graph, &config).detect_simple().unwrap().is_empty());

        pools.push(pool("sol", "raydium", SOL, USDC, 1000.0, 150_000.0, 25));
        let graph = PairGraph::build(&pools, &config.scanner);
        let found = OpportunityDetector::new(&graph, &config).detect_simple().unwrap();
        assert_eq!(found.len(), 1);
        let opp = &found[0];
        assert_eq!(opp.path.start_token.mint, USDC);
        assert_eq!(opp.steps[0].pool_id, "q2");
        assert_eq!(opp.input_amount, 10_000_000);
        assert_approx_eq!(opp.gas_cost, 0.005625, 1e-9);
        assert_approx_eq!(opp.net_profit, opp.gross_profit - opp.gas_cost);
    }

    fn triangle() -> Vec<PoolData> {
        vec![
            pool("sol-usdc", "raydium", SOL, USDC, 1000.0, 150_000.0, 25),
            pool("usdc-bonk", "orca", USDC, BONK, 150_000.0, 7_500_000_000.0, 25),
            // BONK is 10% cheaper here than through USDC
            pool("bonk-sol", "meteora", BONK, SOL, 8_250_000_000.0, 1000.0, 25),
        ]
    }

    #[test]
    fn test_multi_hop_finds_profitable_direction() {
        let pools = triangle();
        let mut config = engine_config();
        config.scanner.max_hops = 3;
        let graph = PairGraph::build(&pools, &config.scanner);
        let search = OpportunityDetector::new(&graph, &config).detect_multi_hop().unwrap();

        assert_eq!(search.exhausted_starts, 0);
        assert_eq!(search.opportunities.len(), 1);
        let opp = &search.opportunities[0];
        assert_eq!(opp.path.path_type, ArbitragePathType::MultiHop);
        assert_eq!(opp.path.hops, 3);
        let route: Vec<&str> = opp.steps.iter().map(|s| s.pool_id.as_str()).collect();
        assert_eq!(route, vec!["bonk-sol", "usdc-bonk", "sol-usdc"]);
        assert_eq!(opp.gas_estimate, 35_000);
        assert_eq!(opp.input_amount, 1_000_000_000);
        assert!(opp.net_profit > 0.05);
    }

    #[test]
    fn test_multi_hop_reports_both_directions_when_unprofitable_shown() {
        let pools = triangle();
        let mut config = engine_config();
        config.scanner.show_unprofitable = true;
        let graph = PairGraph::build(&pools, &config.scanner);
        let search = OpportunityDetector::new(&graph, &config).detect_multi_hop().unwrap();

        assert_eq!(search.opportunities.len(), 2);
        assert!(search.opportunities.iter().any(|o| o.net_profit < 0.0));
    }

    #[test]
    fn test_multi_hop_respects_hop_limit_and_budget() {
        let pools = triangle();
        let mut config = engine_config();
        config.scanner.max_hops = 2;
        let graph = PairGraph::build(&pools, &config.scanner);
        let search = OpportunityDetector::new(&graph, &config).detect_multi_hop().unwrap();
        assert!(search.opportunities.is_empty());

        config.scanner.max_hops = 3;
        config.search.max_search_nodes = 1;
        let search = OpportunityDetector::new(&graph, &config).detect_multi_hop().unwrap();
        assert!(search.opportunities.is_empty());
        assert!(search.exhausted_starts >= 1);
    }

    #[test]
    fn test_two_pool_round_trips_left_to_simple_detector() {
        let pools = vec![
            pool("p1", "raydium", SOL, USDC, 1000.0, 150_000.0, 25),
            pool("p2", "orca", SOL, USDC, 1000.0, 153_000.0, 25),
        ];
        let mut config = engine_config();
        config.scanner.show_unprofitable = true;
        for max_hops in [2, 4] {
            config.scanner.max_hops = max_hops;
            let graph = PairGraph::build(&pools, &config.scanner);
            let detector = OpportunityDetector::new(&graph, &config);
            assert!(detector.detect_multi_hop().unwrap().opportunities.is_empty());
            assert!(!detector.detect_simple().unwrap().is_empty());
        }
    }

    #[test]
    fn test_wrap_unwrap_reports_nothing() {
        let pools = triangle();
        let config = engine_config();
        let graph = PairGraph::build(&pools, &config.scanner);
        assert!(OpportunityDetector::new(&graph, &config).detect_wrap_unwrap().is_empty());
    }
}
