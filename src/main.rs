//! Roulette Advisor entry point.
//!
//! Loads `.env` and configuration, initialises structured logging, then
//! either serves the JSON API or replays a recorded spin log:
//!
//! ```text
//! roulette-advisor                      # serve on [server] host:port
//! roulette-advisor replay spins.txt     # replay with every strategy
//! roulette-advisor replay spins.txt --bankroll 200 --strategies COR,DUZIA
//! roulette-advisor replay spins.txt --json
//! ```

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::info;

use roulette_advisor::api;
use roulette_advisor::backtest::runner::{parse_tokens, Replay};
use roulette_advisor::config::AppConfig;
use roulette_advisor::types::StrategyId;

const DEFAULT_CONFIG: &str = "config.toml";
const DEFAULT_REPLAY_BANKROLL: &str = "100";

const BANNER: &str = r#"
  ____             _      _   _
 |  _ \ ___  _   _| | ___| |_| |_ ___
 | |_) / _ \| | | | |/ _ \ __| __/ _ \
 |  _ < (_) | |_| | |  __/ |_| ||  __/
 |_| \_\___/ \__,_|_|\___|\__|\__\___|

  Roulette Advisor: staking signals, not predictions
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Initialise structured logging
    init_logging();

    let config_path =
        std::env::var("ROULETTE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG.to_string());
    let cfg = AppConfig::load_or_default(&config_path)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("replay") => run_replay(&cfg, &args[1..]),
        Some(other) => bail!("Unknown command: {other} (expected `replay <file>` or nothing)"),
        None => {
            println!("{BANNER}");
            info!(
                config = %config_path,
                wheel = %cfg.engine.roulette_type,
                initial_bet = %cfg.engine.initial_bet,
                martingale_factor = %cfg.engine.martingale_factor,
                max_losses = cfg.engine.max_consecutive_losses,
                la_partage = cfg.engine.la_partage_enabled,
                "Roulette Advisor starting up"
            );
            api::serve(&cfg).await
        }
    }
}

/// `replay <file> [--bankroll N] [--strategies A,B,...] [--json]`
fn run_replay(cfg: &AppConfig, args: &[String]) -> Result<()> {
    let Some(path) = args.first() else {
        bail!("Usage: roulette-advisor replay <file> [--bankroll N] [--strategies A,B] [--json]");
    };

    let mut bankroll = DEFAULT_REPLAY_BANKROLL.to_string();
    let mut strategies: Vec<StrategyId> = StrategyId::ALL.to_vec();
    let mut as_json = false;
    let mut rest = args[1..].iter();
    while let Some(flag) = rest.next() {
        if flag == "--json" {
            as_json = true;
            continue;
        }
        let value = rest
            .next()
            .with_context(|| format!("Missing value for {flag}"))?;
        match flag.as_str() {
            "--bankroll" => bankroll = value.clone(),
            "--strategies" => {
                strategies = value
                    .split(',')
                    .map(StrategyId::from_str)
                    .collect::<Result<_>>()?;
            }
            other => bail!("Unknown option: {other}"),
        }
    }
    let bankroll = Decimal::from_str(&bankroll)
        .with_context(|| format!("Invalid bankroll: {bankroll}"))?;

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read spin log: {path}"))?;
    let tokens = parse_tokens(&text);
    info!(path = %path, spins = tokens.len(), strategies = ?strategies, "Replaying spin log");

    let report = Replay::new(cfg.engine.clone(), bankroll, strategies)
        .run(&tokens)
        .with_context(|| format!("Replay of {path} failed"))?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
    }
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("roulette_advisor=info"));

    let json_logging = std::env::var("ROULETTE_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
