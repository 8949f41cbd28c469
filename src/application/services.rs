//! Application services and use cases

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::domain::arbitrage::{ArbitrageEngine, ScanResult};
use crate::domain::pool::PoolData;
use crate::domain::risk::{MarketContext, RiskAnalysis, RiskAnalyzer};
use crate::report::ScanReport;
use crate::shared::config::EngineConfig;
use crate::shared::errors::AppError;

/// Application service for one-shot snapshot scans
pub struct ScanService {
    engine: ArbitrageEngine,
    analyzer: RiskAnalyzer,
}

impl ScanService {
    pub fn new(config: EngineConfig) -> Result<Self, AppError> {
        config.validate()?;
        Ok(Self {
            analyzer: RiskAnalyzer::new(config.risk.clone()),
            engine: ArbitrageEngine::new(config),
        })
    }

    /// Read a JSON array of pool snapshots
    pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<Vec<PoolData>, AppError> {
        let content = fs::read_to_string(path.as_ref())?;
        let pools: Vec<PoolData> = serde_json::from_str(&content).map_err(|e| {
            AppError::SnapshotError(format!("{}: {}", path.as_ref().display(), e))
        })?;

        if pools.is_empty() {
            warn!("⚠️ Snapshot {} holds no pools", path.as_ref().display());
        } else {
            info!("📥 Loaded {} pools from {}", pools.len(), path.as_ref().display());
        }
        Ok(pools)
    }

    pub fn scan(&self, pools: &[PoolData]) -> Result<ScanResult, AppError> {
        Ok(self.engine.scan(pools)?)
    }

    /// Risk analysis for the best `limit` opportunities
    pub fn analyze(
        &self,
        result: &ScanResult,
        pools: &[PoolData],
        context: &MarketContext,
        limit: usize,
    ) -> Vec<RiskAnalysis> {
        result
            .opportunities
            .iter()
            .take(limit)
            .map(|opp| self.analyzer.analyze(opp, pools, context))
            .collect()
    }

    /// Load, scan and optionally analyze a snapshot file into a report
    pub fn run<P: AsRef<Path>>(
        &self,
        snapshot: P,
        context: Option<&MarketContext>,
        limit: usize,
    ) -> Result<ScanReport, AppError> {
        let pools = Self::load_snapshot(snapshot.as_ref())?;
        let result = self.scan(&pools)?;

        let risk = match context {
            Some(context) => self.analyze(&result, &pools, context, limit),
            None => Vec::new(),
        };

        let mut opportunities = result.opportunities;
        opportunities.truncate(limit);
        Ok(ScanReport::new(result.stats, opportunities)
            .with_source(snapshot.as_ref().display().to_string())
            .with_risk(risk))
    }
}
