use clap::Parser;
use httpdns_server::{CliOverrides, Config, HttpResolver, Server};
use log::info;

#[derive(Parser)]
#[command(name = "httpdns-server")]
#[command(version)]
#[command(about = "Answers DNS A queries from an HTTP lookup endpoint")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// UDP port to listen on
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Address to bind, repeatable
    #[arg(short = 'b', long = "bind")]
    bind: Vec<String>,

    /// Lookup URL containing {domain}
    #[arg(short = 'e', long)]
    endpoint: Option<String>,

    /// Separator between addresses in a lookup result
    #[arg(short = 'd', long)]
    delimiter: Option<String>,

    /// TTL of synthesized answers
    #[arg(long)]
    ttl: Option<u32>,

    /// Datagrams handled concurrently, 0 for no limit
    #[arg(long)]
    max_in_flight: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        bind_addresses: (!cli.bind.is_empty()).then_some(cli.bind),
        port: cli.port,
        endpoint: cli.endpoint,
        delimiter: cli.delimiter,
        ttl: cli.ttl,
        max_in_flight: cli.max_in_flight,
        log_level: cli.log_level,
    };

    let config = Config::load(cli.config.as_deref(), overrides)?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    info!(
        "resolving through {} (delimiter {:?})",
        config.resolver.endpoint, config.resolver.delimiter
    );

    let resolver = HttpResolver::new(
        config.resolver.endpoint.clone(),
        config.resolver.delimiter.clone(),
    );
    let server = Server::bind(&config, resolver).await?;

    tokio::select! {
        _ = server.run() => {}
        _ = tokio::signal::ctrl_c() => info!("interrupted, shutting down"),
    }

    Ok(())
}
