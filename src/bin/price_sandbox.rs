//! Offline sandbox for the customization engine.
//!
//! Runs pricing, availability and prompt synthesis against JSON fixtures
//! without any AI provider:
//! - `price`: price a design against a rule table
//! - `classify`: fulfilment tier of a design
//! - `prompt`: edit prompt between a baseline and a live state
//! - `generate-config`: write a sample engine config

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use cake_customizer::config::EngineConfig;
use cake_customizer::customization::{AnalysisPass, EditingSession};
use cake_customizer::logging::init_logging;
use cake_customizer::pricing::{PricingRule, StaticRuleStore};
use cake_customizer::prompt::render_prompt;
use cake_customizer::types::{BaselineAnalysis, DesignState};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser)]
#[command(name = "price_sandbox")]
#[command(version, about = "Cake customization pricing and prompt sandbox", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, default_value = "cake_customizer.toml")]
    config: PathBuf,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Where the design comes from.
#[derive(clap::Args)]
#[group(required = true, multiple = false)]
struct DesignSource {
    /// Live design state (JSON)
    #[arg(long)]
    state: Option<PathBuf>,

    /// Analysis result (JSON), turned into a fresh design
    #[arg(long)]
    analysis: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a design against a rule table
    Price {
        /// Rule table (JSON array of pricing rules)
        #[arg(long)]
        rules: PathBuf,

        /// Override the merchant from config
        #[arg(long, env = "CAKE_MERCHANT_ID")]
        merchant: Option<String>,

        #[command(flatten)]
        source: DesignSource,
    },
    /// Classify a design's fulfilment tier
    Classify {
        #[command(flatten)]
        source: DesignSource,
    },
    /// Print the edit prompt between a baseline and a live state
    Prompt {
        /// Baseline analysis (JSON)
        #[arg(long)]
        baseline: PathBuf,

        /// Live design state (JSON)
        #[arg(long)]
        state: PathBuf,
    },
    /// Generate a sample config file
    GenerateConfig {
        /// Output file path
        #[arg(default_value = "cake_customizer.toml")]
        output: PathBuf,
    },
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

// ============================================================================
// Helpers
// ============================================================================

fn read_json<T: DeserializeOwned>(path: &Path) -> CliResult<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let value = serde_json::from_str(&content)
        .map_err(|e| format!("failed to parse {}: {e}", path.display()))?;
    Ok(value)
}

fn load_design(source: &DesignSource) -> CliResult<DesignState> {
    if let Some(path) = &source.state {
        return read_json(path);
    }
    match &source.analysis {
        Some(path) => {
            let analysis: BaselineAnalysis = read_json(path)?;
            let mut session = EditingSession::new();
            session.apply_analysis(analysis, AnalysisPass::Full);
            Ok(session.state().clone())
        }
        None => Err("either --state or --analysis is required".into()),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Top-level keys must precede the first table, so the merchant hint goes first.
fn sample_config_text() -> CliResult<String> {
    let content = toml::to_string_pretty(&EngineConfig::default())?;
    Ok(format!(
        r#"# Cake Customizer Engine Configuration
# See: price_sandbox --help

# Uncomment to price with a merchant's rule overrides:
# merchant_id = "your-merchant-id"

{content}"#
    ))
}

fn generate_sample_config(path: &Path) -> CliResult<()> {
    std::fs::write(path, sample_config_text()?)?;
    println!("Sample config written to: {}", path.display());
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();

    if let Commands::GenerateConfig { output } = &cli.command {
        return generate_sample_config(output);
    }

    let mut config = EngineConfig::load(&cli.config)?;
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    init_logging(&config.logging)?;

    match cli.command {
        Commands::Price {
            rules,
            merchant,
            source,
        } => {
            let rules: Vec<PricingRule> = read_json(&rules)?;
            let merchant = merchant.or_else(|| config.merchant_id.clone());
            let mut cache = config.rule_cache(StaticRuleStore::new(rules));
            let rule_set = cache.get(merchant.as_deref()).await?;
            info!(rules = rule_set.len(), merchant = ?merchant, "Rule table loaded");

            let design = load_design(&source)?;
            let breakdown = cake_customizer::pricing::compute_price(&design, &rule_set);
            for gap in &breakdown.data_gaps {
                warn!(item_type = %gap.item_type, size = ?gap.size, "No pricing rule");
            }
            print_json(&breakdown)?;
        }
        Commands::Classify { source } => {
            let design = load_design(&source)?;
            println!("{}", cake_customizer::availability::classify(&design));
        }
        Commands::Prompt { baseline, state } => {
            let baseline: BaselineAnalysis = read_json(&baseline)?;
            let state: DesignState = read_json(&state)?;
            let instructions = cake_customizer::prompt::synthesize_prompt(&baseline, &state)?;
            print!("{}", render_prompt(&instructions));
        }
        Commands::GenerateConfig { .. } => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_config_merchant_hint_is_top_level() {
        let text = sample_config_text().unwrap();
        assert!(text.find("# merchant_id").unwrap() < text.find("[logging]").unwrap());

        let uncommented = text.replace("# merchant_id", "merchant_id");
        let config: EngineConfig = toml::from_str(&uncommented).unwrap();
        assert_eq!(config.merchant_id.as_deref(), Some("your-merchant-id"));
        assert!(config.validate().is_ok());
    }
}
