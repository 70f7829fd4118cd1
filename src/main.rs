use clap::Parser;
use polybet::cli::{describe_config, explain, Cli, Commands};
use polybet::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
            eprintln!("Using default configuration");
            Config::from_toml_str(include_str!("../config.toml.example"))?
        }
    };

    // Initialize telemetry
    let _telemetry = polybet::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Analyze(args) => {
            tracing::info!(text = %args.text.join(" "), "Starting analysis");
            if let Err(e) = args.execute(&config).await {
                eprintln!("{}", explain(&e));
                std::process::exit(1);
            }
        }
        Commands::Chat(args) => {
            tracing::info!("Starting chat session");
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("{}", describe_config(&config));
        }
    }

    Ok(())
}
