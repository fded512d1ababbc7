use anyhow::Result;
use clap::{Parser, Subcommand};

use tombola::{commands, config};

#[derive(Parser)]
#[command(name = "tombola")]
#[command(about = "Raffle signup service with weighted winner drawings", long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.tombola/config.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new raffle campaign
    Init,

    /// Register a raffle entry
    Signup {
        /// Contact phone number
        phone: String,

        /// Instagram handle
        instagram: String,

        /// Entrant name (optional)
        #[arg(long)]
        name: Option<String>,

        /// Referral code of the entrant who shared the campaign
        #[arg(long)]
        referred_by: Option<String>,
    },

    /// Show campaign status
    Status,

    /// Draw winners and persist the result
    Draw {
        /// Number of winners (default: from config)
        #[arg(long)]
        winners: Option<usize>,
    },

    /// Show the winners of the last draw
    Winners,

    /// Set the campaign end time (stored as-is)
    SetEnd {
        /// End timestamp, e.g. 2025-12-31T23:59:59+00:00
        end_time: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize simple logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    let config_path = cli
        .config
        .map(std::path::PathBuf::from)
        .unwrap_or_else(config::default_config_path);

    match cli.command {
        Commands::Init => commands::init::run(&config_path),
        Commands::Signup {
            phone,
            instagram,
            name,
            referred_by,
        } => commands::signup::run(
            &config_path,
            &phone,
            &instagram,
            name.as_deref(),
            referred_by.as_deref(),
        ),
        Commands::Status => commands::status::run(&config_path),
        Commands::Draw { winners } => commands::draw::run(&config_path, winners),
        Commands::Winners => commands::winners::run(&config_path),
        Commands::SetEnd { end_time } => commands::set_end::run(&config_path, &end_time),
    }
}
