//! CLI commands and handlers
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::application::services::ScanService;
use crate::domain::risk::MarketContext;
use crate::report::ScanReport;
use crate::shared::config::{ConfigLoader, EngineConfig};

#[derive(Parser)]
#[command(name = "poolarb")]
#[command(version, about = "Multi-DEX arbitrage detection over Solana pool snapshots")]
pub struct Cli {
    /// Path to config file (defaults to ./Config.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a pool snapshot for arbitrage opportunities
    Scan {
        #[command(flatten)]
        scan: ScanArgs,
    },

    /// Scan, then score the best opportunities for execution risk
    Analyze {
        #[command(flatten)]
        scan: ScanArgs,

        /// Network congestion (0.0 - 1.0)
        #[arg(long, default_value_t = 0.0)]
        congestion: f64,

        /// Competitor activity (0.0 - 1.0)
        #[arg(long, default_value_t = 0.0)]
        competitor_activity: f64,

        /// Average recent gas price in lamports
        #[arg(long)]
        avg_gas_price: Option<u64>,
    },

    /// Print the effective configuration as TOML
    ShowConfig,
}

/// Snapshot and scanner overrides shared by scan-type commands
#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// JSON file with an array of pool snapshots
    #[arg(short, long)]
    pub pools: PathBuf,

    /// Keep unprofitable opportunities
    #[arg(long)]
    pub show_unprofitable: bool,

    /// Maximum hops for cycle search
    #[arg(long)]
    pub max_hops: Option<usize>,

    /// Minimum net profit in start-token units
    #[arg(long)]
    pub min_profit: Option<f64>,

    /// Minimum profit percent
    #[arg(long)]
    pub min_profit_percent: Option<f64>,

    /// Restrict to these exchanges (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub exchanges: Vec<String>,

    /// Number of opportunities to report
    #[arg(short, long, default_value_t = 20)]
    pub limit: usize,

    /// Print the full JSON report
    #[arg(long)]
    pub json: bool,

    /// Write the JSON report to a file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl ScanArgs {
    fn apply(&self, config: &mut EngineConfig) {
        let scanner = &mut config.scanner;
        scanner.show_unprofitable |= self.show_unprofitable;
        if let Some(max_hops) = self.max_hops {
            scanner.max_hops = max_hops;
        }
        if let Some(min_profit) = self.min_profit {
            scanner.min_profit_threshold = min_profit;
        }
        if let Some(min_profit_percent) = self.min_profit_percent {
            scanner.min_profit_percent = min_profit_percent;
        }
        if !self.exchanges.is_empty() {
            scanner.enabled_exchanges = self.exchanges.iter().map(|e| e.trim().to_string()).collect();
        }
    }
}

pub struct CommandExecutor;

impl CommandExecutor {
    /// Execute the selected command
    pub fn execute(cli: Cli) -> Result<()> {
        let mut config = Self::load_config(cli.config.as_deref())?;

        match cli.command {
            Commands::Scan { scan } => {
                scan.apply(&mut config);
                Self::execute_scan_command(&scan, config, None)
            }
            Commands::Analyze {
                scan,
                congestion,
                competitor_activity,
                avg_gas_price,
            } => {
                scan.apply(&mut config);
                let context = MarketContext {
                    network_congestion: congestion,
                    competitor_activity,
                    avg_gas_price,
                };
                Self::execute_scan_command(&scan, config, Some(context))
            }
            Commands::ShowConfig => {
                let rendered = toml::to_string_pretty(&config).context("Failed to render configuration")?;
                println!("{}", rendered);
                Ok(())
            }
        }
    }

    fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
        match path {
            Some(path) => ConfigLoader::load_from(path)
                .with_context(|| format!("Failed to load config from {}", path.display())),
            None if Path::new("Config.toml").exists() => {
                ConfigLoader::load_config().context("Failed to load Config.toml")
            }
            None => {
                info!("No config file, using defaults");
                Ok(EngineConfig::default())
            }
        }
    }

    fn execute_scan_command(scan: &ScanArgs, config: EngineConfig, context: Option<MarketContext>) -> Result<()> {
        let service = ScanService::new(config).context("Invalid configuration")?;
        let report = service
            .run(&scan.pools, context.as_ref(), scan.limit)
            .with_context(|| format!("Scan of {} failed", scan.pools.display()))?;

        if let Some(output) = &scan.output {
            fs::write(output, report.to_json()?)
                .with_context(|| format!("Failed to write report to {}", output.display()))?;
            info!("💾 Report written to {}", output.display());
        }

        if scan.json {
            println!("{}", report.to_json()?);
        } else {
            Self::print_summary(&report);
        }
        Ok(())
    }

    fn print_summary(report: &ScanReport) {
        info!(
            "📊 {} tokens, {} pools ({} excluded), {} opportunities",
            report.stats.tokens,
            report.stats.pools,
            report.stats.excluded_pools,
            report.opportunities.len()
        );
        for line in report.summary_lines() {
            println!("{}", line);
        }
        for analysis in &report.risk {
            println!(
                "   {} -> {:?}: p={:.2}, risk={:.2}, tip={}, ~{:.1}s",
                analysis.opportunity.id,
                analysis.recommendation,
                analysis.execution_probability,
                analysis.risk_score,
                analysis
                    .priority_tip
                    .map_or_else(|| "-".to_string(), |tip| tip.to_string()),
                analysis.estimated_execution_time
            );
        }
    }
}
