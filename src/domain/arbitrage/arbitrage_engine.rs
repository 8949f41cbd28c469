//! Arbitrage engine - runs every detector over one pool snapshot

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::deduplicator::{apply_filters, deduplicate, sort_by_net_profit};
use super::opportunity_detector::OpportunityDetector;
use super::ArbitrageOpportunity;
use crate::domain::pool::{PairGraph, PoolData};
use crate::shared::config::EngineConfig;
use crate::shared::errors::ArbitrageError;

/// Counters describing one scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub tokens: usize,
    pub pools: usize,
    pub edges: usize,
    pub excluded_pools: usize,
    pub simple_found: usize,
    pub cross_exchange_found: usize,
    pub multi_hop_found: usize,
    pub duplicates_removed: usize,
    pub filtered_out: usize,
    pub nodes_expanded: usize,
    pub exhausted_starts: usize,
    pub duration_ms: u64,
}

/// Ranked opportunities plus scan statistics
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub opportunities: Vec<ArbitrageOpportunity>,
    pub stats: ScanStats,
}

/// Main arbitrage engine that coordinates detection over pool snapshots
#[derive(Debug, Clone, Default)]
pub struct ArbitrageEngine {
    config: EngineConfig,
}

impl ArbitrageEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Opportunities ordered by net profit, best first
    pub fn find_opportunities(&self, pools: &[PoolData]) -> Result<Vec<ArbitrageOpportunity>, ArbitrageError> {
        Ok(self.scan(pools)?.opportunities)
    }

    /// Scan one snapshot for arbitrage across all enabled exchanges
    pub fn scan(&self, pools: &[PoolData]) -> Result<ScanResult, ArbitrageError> {
        let started = Instant::now();
        info!("🔍 Scanning {} pools for arbitrage...", pools.len());

        let graph = PairGraph::build(pools, &self.config.scanner);
        let graph_stats = graph.stats();
        let mut stats = ScanStats {
            tokens: graph_stats.tokens,
            pools: graph_stats.pools,
            edges: graph_stats.edges,
            excluded_pools: graph_stats.excluded,
            ..ScanStats::default()
        };

        if graph_stats.pools == 0 {
            info!("⚠️ No valid pools in snapshot, skipping detection");
            stats.duration_ms = elapsed_ms(started);
            return Ok(ScanResult {
                opportunities: Vec::new(),
                stats,
            });
        }

        let detector = OpportunityDetector::new(&graph, &self.config);
        let simple = detector.detect_simple()?;
        let cross = detector.detect_cross_exchange()?;
        let cycles = detector.detect_multi_hop()?;
        let wrap = detector.detect_wrap_unwrap();

        stats.simple_found = simple.len();
        stats.cross_exchange_found = cross.len();
        stats.multi_hop_found = cycles.opportunities.len();
        stats.nodes_expanded = cycles.nodes_expanded;
        stats.exhausted_starts = cycles.exhausted_starts;
        debug!(
            "Detectors: {} simple, {} cross-exchange, {} multi-hop, {} wrap/unwrap",
            simple.len(), cross.len(), cycles.opportunities.len(), wrap.len()
        );

        let mut all = simple;
        all.extend(cross);
        all.extend(cycles.opportunities);
        all.extend(wrap);

        let detected = all.len();
        let unique = deduplicate(all);
        stats.duplicates_removed = detected - unique.len();

        let before_filter = unique.len();
        let mut opportunities = apply_filters(unique, &self.config.scanner);
        stats.filtered_out = before_filter - opportunities.len();
        sort_by_net_profit(&mut opportunities);

        stats.duration_ms = elapsed_ms(started);
        info!("📊 Scan statistics:");
        info!("   Tokens in graph: {}", stats.tokens);
        info!("   Pools used: {} (excluded: {})", stats.pools, stats.excluded_pools);
        info!("   Detected: {} (duplicates: {}, filtered: {})", detected, stats.duplicates_removed, stats.filtered_out);
        info!("✅ Found {} arbitrage opportunities in {} ms", opportunities.len(), stats.duration_ms);

        Ok(ScanResult { opportunities, stats })
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
