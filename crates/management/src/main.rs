use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use process_management::{
    config::Config,
    engine::create_repository,
    management::{deployments_server, ObjectName},
    metrics,
};

#[derive(Parser, Debug)]
#[command(name = "process-mgmt", about = "Manage process engine deployments")]
struct Cli {
    /// Object name to address instead of the configured one
    #[arg(long)]
    object_name: Option<String>,

    /// Print call metrics to stderr when done
    #[arg(long)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Describe attributes and operations of the bean
    Info,
    /// List registered object names
    Names,
    /// Read an attribute, e.g. `get Deployments`
    Get { attribute: String },
    /// Invoke an operation, e.g. `invoke deleteDeployment <id>`
    Invoke {
        operation: String,
        args: Vec<String>,
    },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load().context("loading configuration")?;

    // Initialize logging; stdout is reserved for results
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    debug!("Loaded configuration: {:?}", config);

    let repository = create_repository(&config.engine)
        .await
        .context("opening process repository")?;
    let (server, registered) = deployments_server(repository, &config.management.object_name).await?;

    let target: ObjectName = match &cli.object_name {
        Some(name) => name.parse()?,
        None => registered,
    };
    info!("Addressing {}", target);

    match cli.command {
        Command::Info => print_json(&server.get_info(&target).await?)?,
        Command::Names => {
            let names: Vec<String> = server
                .query_names()
                .await
                .iter()
                .map(ToString::to_string)
                .collect();
            print_json(&names)?
        }
        Command::Get { attribute } => print_json(&server.get_attribute(&target, &attribute).await?)?,
        Command::Invoke { operation, args } => {
            print_json(&server.invoke(&target, &operation, &args).await?)?
        }
    }

    if cli.metrics {
        eprint!("{}", metrics::gather_metrics()?);
    }

    Ok(())
}
