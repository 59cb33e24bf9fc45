use clap::Parser;
use tradewatch::cli::{Cli, Commands};
use tradewatch::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
            eprintln!("Using default configuration");
            toml::from_str(include_str!("../config.toml.example"))?
        }
    };

    // Initialize telemetry
    let _telemetry = tradewatch::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => args.execute(config).await?,
        Commands::Watch(args) => args.execute(config).await?,
        Commands::Price(args) => args.execute(config).await?,
        Commands::Analyze(args) => args.execute(config).await?,
        Commands::Config => {
            println!("Current configuration:");
            println!("  Symbol: {}", config.feed.symbol);
            println!("  Venue: {:?} ({})", config.venue.mode, config.venue.base_url);
            println!(
                "  Auto-sell: {} samples every {} ms, hold margin {}",
                config.watch.sample_count,
                config.watch.sample_interval_ms,
                config.watch.hold_margin
            );
            match config.watch.sell_quantity {
                Some(q) => println!("  Sell quantity: {} {}", q, config.venue.base_asset),
                None => println!("  Sell quantity: none (decision only)"),
            }
            println!(
                "  Alerts: {} ({} candles, drop {}%)",
                if config.alerts.enabled { "on" } else { "off" },
                config.alerts.interval,
                config.alerts.drop_threshold_pct
            );
            println!(
                "  Journal: {}",
                if config.journal.enabled {
                    config.journal.path.display().to_string()
                } else {
                    "off".to_string()
                }
            );
        }
    }

    Ok(())
}
