use anyhow::Result;
use clap::{Parser, Subcommand};

use zk_settings::cli::{commands, init_logging};
use zk_settings::config;
use zk_settings::session::zookeeper::ZookeeperFactory;
use zk_settings::SettingsClient;

#[derive(Parser)]
#[command(name = "zk-settings")]
#[command(version, about = "Load and store JSON settings in a ZooKeeper ensemble", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path (YAML); environment variables are used otherwise
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Per-endpoint connect timeout in milliseconds
    #[arg(long, global = true)]
    connect_timeout_ms: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the settings stored at a locator
    Get {
        /// Locator (zk://host:port[,host:port...]/path)
        locator: Option<String>,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Store a JSON document at a locator
    Put {
        /// JSON file to store, or - for stdin
        source: String,

        /// Locator (zk://host:port[,host:port...]/path)
        locator: Option<String>,
    },

    /// Show the endpoints and path of a locator
    Parse {
        /// Locator to split
        locator: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    // One call per process and no parallelism, so a current_thread runtime is enough.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    let mut config = config::load_config(cli.config.as_deref())?;
    if let Some(ms) = cli.connect_timeout_ms {
        config.connect_timeout_ms = ms;
        config.validate()?;
    }

    let client = SettingsClient::with_config(ZookeeperFactory::new(), &config);
    let mut stdout = std::io::stdout();

    match cli.command {
        Commands::Get { locator, pretty } => {
            let locator = config.resolve_locator(locator.as_deref())?;
            commands::cmd_get(&client, &locator, pretty || config.pretty, &mut stdout).await?;
        }
        Commands::Put { source, locator } => {
            let locator = config.resolve_locator(locator.as_deref())?;
            let payload = commands::read_payload(&source)?;
            commands::cmd_put(&client, &locator, &payload, &mut stdout).await?;
        }
        Commands::Parse { locator } => {
            commands::cmd_parse(&locator, &mut stdout)?;
        }
    }

    Ok(())
}
