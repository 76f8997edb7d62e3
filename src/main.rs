use anyhow::Result;
use clap::Parser;
use cloudadmin::{
    admin::CloudApiClient,
    commands::{self, ClientsCommand, FieldsCommand, Format, WhatsAppUsersCommand},
    config::{Config, Overrides},
    runtime::RealRuntime,
};

/// cloudadmin - Cloud API administration
///
/// Manage clients, irrigation fields and WhatsApp users through the Cloud API.
///
/// The API location comes from CLOUD_API_URL (or --api-url) and the admin bearer
/// token from CLOUD_API_ADMIN_TOKEN.
///
/// Examples:
///   cloudadmin clients list
///   cloudadmin fields agent-config CLI001 F1 -o agent.env
#[derive(Parser, Debug)]
#[command(author, version = env!("CLOUDADMIN_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Cloud API base URL (overrides CLOUD_API_URL)
    #[arg(long = "api-url", value_name = "URL", global = true)]
    api_url: Option<String>,

    /// Per-attempt timeout in seconds (overrides CLOUD_API_TIMEOUT)
    #[arg(long, value_name = "SECS", global = true)]
    timeout: Option<u64>,

    /// Extra attempts for reads on timeout or connection failure (overrides CLOUD_API_MAX_RETRIES)
    #[arg(long = "max-retries", value_name = "N", global = true)]
    max_retries: Option<usize>,

    /// Print the full result as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Manage clients
    #[command(subcommand)]
    Clients(ClientsCommand),

    /// Manage fields (irrigation sites)
    #[command(subcommand)]
    Fields(FieldsCommand),

    /// Manage WhatsApp users
    #[command(subcommand)]
    WhatsappUsers(WhatsAppUsersCommand),

    /// Check that list and detail responses carry the keys the admin views need
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = RealRuntime;

    let config = Config::load(
        &runtime,
        Overrides {
            api_url: cli.api_url,
            timeout_secs: cli.timeout,
            max_retries: cli.max_retries,
        },
    )?;
    let api = CloudApiClient::new(config.client)?;
    let format = if cli.json { Format::Json } else { Format::Text };

    let report = match cli.command {
        Commands::Clients(command) => commands::clients(&api, &runtime, command, format).await?,
        Commands::Fields(command) => commands::fields(&api, &runtime, command, format).await?,
        Commands::WhatsappUsers(command) => {
            commands::whatsapp_users(&api, command, format).await?
        }
        Commands::Check => commands::check(&api).await,
    };

    report.print();
    if !report.ok {
        std::process::exit(1);
    }
    Ok(())
}
