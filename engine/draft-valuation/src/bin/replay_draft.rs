//! # Replay Draft
//!
//! Developer harness: loads a JSON draft context, runs the valuation engine
//! and prints the current recommendations.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use draft_valuation::{draft_math, DraftContext, EngineConfig, ValuationEngine};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "replay-draft")]
#[command(about = "Score a saved draft state with the valuation engine")]
struct Cli {
    /// TOML tuning file; defaults plus environment overrides when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recompute a draft context and print the top players
    Score {
        /// JSON-encoded draft context
        context: PathBuf,
        #[arg(long, default_value = "15")]
        top: usize,
        /// Print the full engine output as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Write the default tuning configuration to a TOML file
    InitConfig {
        #[arg(default_value = "draft-valuation.toml")]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EngineConfig::from_env()?,
    };

    match cli.command {
        Commands::Score { context, top, json } => score(config, &context, top, json),
        Commands::InitConfig { path } => {
            config.to_file(&path)?;
            info!("Wrote configuration to {}", path.display());
            Ok(())
        }
    }
}

fn score(config: EngineConfig, path: &Path, top: usize, json: bool) -> Result<()> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let ctx: DraftContext = serde_json::from_str(&raw).context("parsing draft context")?;
    ctx.league.validate()?;
    draft_valuation::config::validate_weights(&ctx.weights)?;

    let mut engine = ValuationEngine::new(config)?;
    let output = engine.recompute(&ctx);
    let current = output.horizon.current_overall;
    info!(
        "Pick {} with {} players remaining; {} picks until the user, scoring against pick {}",
        draft_math::format_pick(current, ctx.league.teams),
        ctx.remaining.len(),
        draft_math::picks_until_user(current, ctx.league.slot, ctx.league.teams),
        draft_math::format_pick(output.horizon.horizon_pick, ctx.league.teams)
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("\nTop {} by priority score:", top);
    println!("Rank Name                      Pos  Tier  PPS    Risk   Back");
    println!("--------------------------------------------------------------");
    for (i, (player, pps)) in output.top(top).into_iter().enumerate() {
        let pos = player.position.map_or("-", |p| p.as_str());
        let tier = player.tier.map_or_else(|| "-".to_string(), |t| t.to_string());
        let avail = output.availability.get(&player.name);
        let risk = avail.map_or(0.5, |a| a.risk);
        let back = avail.and_then(|a| a.make_it_back).map_or_else(|| "-".to_string(), |b| format!("{b:.2}"));
        println!(
            "{:4} {:25} {:4} {:>4}  {:.3}  {:.3}  {:>5}",
            i + 1,
            player.name,
            pos,
            tier,
            pps,
            risk,
            back
        );
    }

    println!("\nPositional value index:");
    for (pos, value) in &output.pvi {
        println!("  {:4} {:.3}", pos, value);
    }
    Ok(())
}
