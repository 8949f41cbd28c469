use std::collections::HashMap;

use tracing::debug;

use super::PoolData;
use crate::shared::config::ScannerConfig;
use crate::shared::types::{TokenInfo, WSOL_MINT};

/// Token index in the graph (first-seen order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenIndex(pub usize);

/// Pool index in the graph (input order among valid pools)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolIndex(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapDirection {
    AToB,
    BToA,
}

/// Directed edge: selling `from` into `pool` yields `to`
#[derive(Debug, Clone, Copy)]
pub struct PoolEdge {
    pub pool: PoolIndex,
    pub to: TokenIndex,
    pub direction: SwapDirection,
    /// Spot price, `to` per `from` in UI units
    pub price: f64,
}

/// Pools quoting the same unordered token pair
#[derive(Debug, Clone)]
pub struct PairGroup {
    /// Token A of the first pool seen for the pair
    pub first: TokenIndex,
    pub second: TokenIndex,
    pub pools: Vec<PoolIndex>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphStats {
    pub tokens: usize,
    pub pools: usize,
    pub edges: usize,
    pub excluded: usize,
}

/// Token/pool adjacency over a borrowed pool snapshot
#[derive(Debug)]
pub struct PairGraph<'a> {
    tokens: Vec<&'a TokenInfo>,
    token_index: HashMap<&'a str, TokenIndex>,
    pools: Vec<&'a PoolData>,
    adjacency: Vec<Vec<PoolEdge>>,
    pair_pools: HashMap<(TokenIndex, TokenIndex), Vec<PoolIndex>>,
    pair_groups: Vec<PairGroup>,
    stats: GraphStats,
}

impl<'a> PairGraph<'a> {
    /// Build the graph from every valid pool on an enabled exchange
    pub fn build(pools: &'a [PoolData], config: &ScannerConfig) -> Self {
        let mut graph = Self {
            tokens: Vec::new(),
            token_index: HashMap::new(),
            pools: Vec::new(),
            adjacency: Vec::new(),
            pair_pools: HashMap::new(),
            pair_groups: Vec::new(),
            stats: GraphStats::default(),
        };
        let mut group_of_pair: HashMap<(TokenIndex, TokenIndex), usize> = HashMap::new();

        for pool in pools {
            if let Err(e) = pool.validate() {
                debug!("Excluding pool: {}", e);
                graph.stats.excluded += 1;
                continue;
            }
            if !config.is_exchange_enabled(&pool.dex) {
                debug!("Excluding pool {}: exchange {} disabled", pool.id, pool.dex);
                graph.stats.excluded += 1;
                continue;
            }

            let a = graph.intern(&pool.token_a);
            let b = graph.intern(&pool.token_b);
            let index = PoolIndex(graph.pools.len());
            graph.pools.push(pool);

            let price = pool.mid_price();
            graph.adjacency[a.0].push(PoolEdge {
                pool: index,
                to: b,
                direction: SwapDirection::AToB,
                price,
            });
            graph.adjacency[b.0].push(PoolEdge {
                pool: index,
                to: a,
                direction: SwapDirection::BToA,
                price: 1.0 / price,
            });
            graph.stats.edges += 2;

            graph.pair_pools.entry((a, b)).or_default().push(index);
            graph.pair_pools.entry((b, a)).or_default().push(index);

            let key = if a < b { (a, b) } else { (b, a) };
            match group_of_pair.get(&key) {
                Some(&group) => graph.pair_groups[group].pools.push(index),
                None => {
                    group_of_pair.insert(key, graph.pair_groups.len());
                    graph.pair_groups.push(PairGroup {
                        first: a,
                        second: b,
                        pools: vec![index],
                    });
                }
            }
        }

        graph.stats.tokens = graph.tokens.len();
        graph.stats.pools = graph.pools.len();
        debug!(
            "Pair graph: {} tokens, {} pools, {} edges, {} excluded",
            graph.stats.tokens, graph.stats.pools, graph.stats.edges, graph.stats.excluded
        );
        graph
    }

    fn intern(&mut self, token: &'a TokenInfo) -> TokenIndex {
        if let Some(&index) = self.token_index.get(token.mint.as_str()) {
            return index;
        }
        let index = TokenIndex(self.tokens.len());
        self.tokens.push(token);
        self.token_index.insert(token.mint.as_str(), index);
        self.adjacency.push(Vec::new());
        index
    }

    pub fn token(&self, index: TokenIndex) -> &'a TokenInfo {
        self.tokens[index.0]
    }

    pub fn pool(&self, index: PoolIndex) -> &'a PoolData {
        self.pools[index.0]
    }

    pub fn token_index(&self, mint: &str) -> Option<TokenIndex> {
        self.token_index.get(mint).copied()
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Outgoing edges of a token, in pool input order
    pub fn edges(&self, token: TokenIndex) -> &[PoolEdge] {
        &self.adjacency[token.0]
    }

    /// Pools trading `from` against `to`
    pub fn pools_between(&self, from: TokenIndex, to: TokenIndex) -> &[PoolIndex] {
        self.pair_pools
            .get(&(from, to))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Unordered pair groups in first-seen order
    pub fn pair_groups(&self) -> &[PairGroup] {
        &self.pair_groups
    }

    pub fn stats(&self) -> GraphStats {
        self.stats
    }

    /// Value of one UI unit of `token` in SOL.
    ///
    /// Priced from the direct pool against wrapped SOL holding the largest
    /// SOL reserve, first seen on ties; `None` when no such pool exists.
    pub fn sol_value(&self, token: TokenIndex) -> Option<f64> {
        let mint = self.token(token).mint.as_str();
        if mint == WSOL_MINT {
            return Some(1.0);
        }
        let sol = self.token_index(WSOL_MINT)?;
        self.pools_between(token, sol)
            .iter()
            .rev()
            .map(|&index| self.pool(index))
            .max_by_key(|pool| pool.reserve_of(WSOL_MINT).unwrap_or(0))
            .and_then(|pool| pool.price_for(mint))
            .filter(|price| price.is_finite() && *price > 0.0)
    }
}
