use anyhow::Result;
use clap::{Parser, Subcommand};
use pzb_config::load_layered_yaml;

mod commands;

#[derive(Parser)]
#[command(name = "pzb")]
#[command(about = "Pizza split bot CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> overrides...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Price one order and print the breakdown
    Split {
        /// Total cost of the order (currency marker optional, e.g. 24.50 or $24.50)
        #[arg(long)]
        cost: String,

        /// Override the configured fairness policy
        #[arg(long)]
        policy: Option<String>,

        /// Override the configured slices per pizza
        #[arg(long)]
        package_size: Option<u64>,

        /// Layered config paths in merge order
        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// Print the allocation as JSON instead of the chat reply
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Requests as NAME=SLICES
        #[arg(required = true)]
        requests: Vec<String>,
    },

    /// Interactive session: each stdin line is `<requester> <argument>`
    Session {
        /// Layered config paths in merge order
        #[arg(long = "config")]
        config_paths: Vec<String>,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = load_layered_yaml(&refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Split {
            cost,
            policy,
            package_size,
            config_paths,
            json,
            requests,
        } => {
            let settings =
                commands::resolve_settings(&config_paths, policy.as_deref(), package_size)?;
            let out = commands::split::run_split(&settings, &requests, &cost, json)?;
            println!("{out}");
        }

        Commands::Session { config_paths } => {
            let settings = commands::resolve_settings(&config_paths, None, None)?;
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            commands::session::run_session(&settings, stdin.lock(), stdout.lock())?;
        }
    }

    Ok(())
}

/// Diagnostics go to stderr so stdout stays the bot's reply.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();
}
