use clap::{Parser, Subcommand};
use recipeshare::admin::{self, AdminCommands};
use recipeshare::config::Config;
use recipeshare::error::AppResult;
use recipeshare::server;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// recipeshare - Recipe sharing backend
#[derive(Parser, Debug)]
#[command(name = "recipeshare")]
#[command(version = "1.0.0")]
#[command(about = "Recipe sharing backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the web server
    Server {
        /// Host to bind to (overrides SERVER_HOST env var)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides PORT env var)
        #[arg(long)]
        port: Option<u16>,

        /// Run store migrations on startup
        #[arg(long, default_value_t = true)]
        migrate: bool,
    },

    /// Administrative commands
    Admin {
        #[command(subcommand)]
        admin_command: AdminCommands,
    },
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string())),
        )
        .init();

    // Load configuration
    let mut config = Config::from_env()?;

    match cli.command {
        Commands::Server {
            host,
            port,
            migrate,
        } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let addr = format!("{}:{}", host, port);

            // An explicit PUBLIC_URL wins over the bind address
            if std::env::var("PUBLIC_URL").is_err() {
                config.server.public_url = format!("http://{}:{}", host, port);
            }

            server::run_server(config, addr, migrate).await
        }
        Commands::Admin { admin_command } => admin::run(config, admin_command).await,
    }
}
