//! vpn-dashboard CLI - administration for an OpenVPN/WireGuard gateway
//!
//! Run `vpn-dashboard --help` for usage information.

use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vpn_dashboard::config::{validate_base_url, Config, LogFormat};
use vpn_dashboard::registry::Mutation;
use vpn_dashboard::session::AuthError;
use vpn_dashboard::web::WebServer;
use vpn_dashboard::{
    Credentials, HttpApi, Secret, SessionController, SystemStats, UserRegistry, Username, VpnApi,
};

/// Environment variable holding the admin username
const ENV_USERNAME: &str = "VPN_DASHBOARD_USERNAME";
/// Environment variable holding the admin password
const ENV_PASSWORD: &str = "VPN_DASHBOARD_PASSWORD";

#[derive(Parser)]
#[command(
    name = "vpn-dashboard",
    about = "Administration dashboard for an OpenVPN/WireGuard gateway",
    version
)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Gateway admin API base URL (overrides the configuration)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web dashboard
    Web {
        /// Address to bind to (overrides the configuration)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Show which VPN the gateway runs
    Flavor,

    /// Log in and show the gateway's system load
    Status {
        #[command(flatten)]
        admin: AdminArgs,
    },

    /// Manage VPN users
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// List VPN users
    List {
        #[command(flatten)]
        admin: AdminArgs,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Create a VPN user (letters only)
    Create {
        /// User name
        name: String,

        #[command(flatten)]
        admin: AdminArgs,
    },

    /// Revoke a VPN user
    Remove {
        /// User name
        name: String,

        #[command(flatten)]
        admin: AdminArgs,
    },

    /// Download a user's client config
    Config {
        /// User name
        name: String,

        /// Output file (defaults to <name>.ovpn or <name>.conf)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        admin: AdminArgs,
    },
}

#[derive(clap::Args)]
struct AdminArgs {
    /// Admin username
    #[arg(short, long, env = ENV_USERNAME, default_value = "admin")]
    username: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // `init` must work before any configuration exists
    if let Commands::Init { force } = &cli.command {
        return init_config(cli.config.clone(), *force).await;
    }

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => Config::load(path).await?,
        None => Config::load_or_default(Config::default_path()).await?,
    };
    config.apply_env_overrides()?;
    if let Some(url) = &cli.api_url {
        config.api.base_url = validate_base_url(url)?;
    }

    init_logging(&config, cli.verbose);

    match cli.command {
        Commands::Web { bind } => {
            if let Some(bind) = bind {
                config.web.bind = bind;
            }
            run_web_server(config).await?;
        }
        Commands::Flavor => {
            let api = HttpApi::new(&config.api)?;
            let flavor = api.vpn_type().await?;
            println!("{}", flavor);
        }
        Commands::Status { admin } => {
            show_status(&config, admin).await?;
        }
        Commands::Users { command } => match command {
            UserCommands::List { admin, format } => {
                list_users(&config, admin, format).await?;
            }
            UserCommands::Create { name, admin } => {
                let name = Username::parse(&name)?;
                mutate(&config, admin, Mutation::Create(name)).await?;
            }
            UserCommands::Remove { name, admin } => {
                mutate(&config, admin, Mutation::Remove(name)).await?;
            }
            UserCommands::Config {
                name,
                output,
                admin,
            } => {
                download_config(&config, admin, name, output).await?;
            }
        },
        Commands::Init { .. } => {}
    }

    Ok(())
}

fn init_logging(config: &Config, verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        1 => EnvFilter::from_default_env().add_directive(Level::DEBUG.into()),
        _ => EnvFilter::from_default_env().add_directive(Level::TRACE.into()),
    };

    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Json => registry.with(fmt::layer().json().with_writer(io::stderr)).init(),
        LogFormat::Pretty => registry.with(fmt::layer().with_writer(io::stderr)).init(),
    }
}

fn get_admin_password() -> Result<Secret, Box<dyn std::error::Error>> {
    // Check environment variable first
    if let Ok(password) = std::env::var(ENV_PASSWORD) {
        return Ok(Secret::new(password));
    }

    eprint!("Admin password: ");
    io::stderr().flush()?;

    let password = rpassword::read_password()?;
    Ok(Secret::new(password))
}

/// Log in once and hand back the verified credentials and load snapshot
async fn admin_login(
    api: &HttpApi,
    admin: AdminArgs,
) -> Result<(Credentials, SystemStats), Box<dyn std::error::Error>> {
    let credentials = Credentials::new(admin.username, get_admin_password()?);
    let session = SessionController::new();

    match session.login(api, credentials.clone()).await {
        Ok(stats) => Ok((credentials, stats)),
        Err(AuthError::Rejected) => Err("Incorrect admin credentials".into()),
        Err(e) => Err(e.into()),
    }
}

async fn run_web_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let api = HttpApi::new(&config.api)?;
    info!(api = %api.base_url(), "Using gateway admin API");

    let server = WebServer::new(config.web.clone(), Arc::new(api));
    println!("VPN dashboard listening on http://{}", server.bind_address());

    server.run().await.map_err(|e| e.to_string())?;
    Ok(())
}

async fn show_status(config: &Config, admin: AdminArgs) -> Result<(), Box<dyn std::error::Error>> {
    let api = HttpApi::new(&config.api)?;
    let flavor = api.vpn_type().await.unwrap_or_default();
    let (credentials, stats) = admin_login(&api, admin).await?;

    println!("{} Admin ({})", flavor, credentials.username());
    println!("CPU:    {}", bar(stats.cpu_bar()));
    println!("Memory: {}", bar(stats.memory_bar()));

    Ok(())
}

fn bar(value: u8) -> String {
    let filled = usize::from(value) / 5;
    format!("[{:<20}] {:>3}%", "#".repeat(filled), value)
}

async fn list_users(
    config: &Config,
    admin: AdminArgs,
    format: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let api = HttpApi::new(&config.api)?;
    let (credentials, _) = admin_login(&api, admin).await?;

    let registry = UserRegistry::new();
    let users = registry.refresh(&api, &credentials).await?;

    match format.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&users)?;
            println!("{}", json);
        }
        _ => {
            if users.is_empty() {
                println!("No VPN users");
                return Ok(());
            }
            println!("{:<4} {}", "#", "USER");
            println!("{}", "-".repeat(30));
            for (i, user) in users.iter().enumerate() {
                println!("{:<4} {}", i + 1, user);
            }
        }
    }

    Ok(())
}

async fn mutate(
    config: &Config,
    admin: AdminArgs,
    mutation: Mutation,
) -> Result<(), Box<dyn std::error::Error>> {
    let api = HttpApi::new(&config.api)?;
    let (credentials, _) = admin_login(&api, admin).await?;

    let registry = UserRegistry::new();
    let description = mutation.to_string();
    let users = registry
        .mutate_then_refresh(&api, &credentials, mutation)
        .await?;

    println!("Done: {}", description);
    println!("{} VPN user(s) now registered", users.len());

    Ok(())
}

async fn download_config(
    config: &Config,
    admin: AdminArgs,
    name: String,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let api = HttpApi::new(&config.api)?;
    let flavor = api.vpn_type().await.unwrap_or_default();
    let (credentials, _) = admin_login(&api, admin).await?;

    let contents = api.download_config(&credentials, &name).await?;
    let path = output.unwrap_or_else(|| PathBuf::from(flavor.config_file_name(&name)));
    tokio::fs::write(&path, contents).await?;

    println!("Saved {} config for '{}' to {}", flavor, name, path.display());
    Ok(())
}

async fn init_config(path: Option<PathBuf>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = path.unwrap_or_else(Config::default_path);

    if config_path.exists() && !force {
        return Err(format!(
            "Configuration already exists at {}. Use --force to overwrite.",
            config_path.display()
        )
        .into());
    }

    // Create config directory
    if let Some(parent) = config_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    tokio::fs::write(&config_path, Config::template()).await?;

    println!("Configuration initialized at {}", config_path.display());
    println!("\nNext steps:");
    println!("1. Point api.base_url at your gateway admin API");
    println!("2. Set {} or you'll be prompted for the admin password", ENV_PASSWORD);
    println!("3. Start the dashboard: vpn-dashboard web");

    Ok(())
}
