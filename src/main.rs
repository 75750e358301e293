use clap::Parser;
use dotenvy::dotenv;
use relgraph::{config, repl};

/// Relgraph - schema relationship graph and join-path planner
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// MariaDB/MySQL connection URL (defaults to RELGRAPH_DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,

    /// Graph engine HTTP endpoint; omit to use the embedded graph
    #[arg(long)]
    graph_url: Option<String>,

    /// Graph engine user
    #[arg(long)]
    graph_user: Option<String>,

    /// Graph engine password
    #[arg(long)]
    graph_password: Option<String>,

    /// Maximum hop count for shortest-path queries
    #[arg(long)]
    max_hops: Option<u32>,

    /// Hop limit for structural (FK/naming) neighborhood expansion
    #[arg(long)]
    structural_hops: Option<u32>,

    /// Hop limit for semantic neighborhood expansion
    #[arg(long)]
    semantic_hops: Option<u32>,

    /// Graph query timeout in milliseconds
    #[arg(long)]
    query_timeout_ms: Option<u64>,
}

impl From<Cli> for config::CliConfig {
    fn from(cli: Cli) -> Self {
        config::CliConfig {
            database_url: cli.database_url,
            graph_url: cli.graph_url,
            graph_user: cli.graph_user,
            graph_password: cli.graph_password,
            max_hops: cli.max_hops,
            structural_hops: cli.structural_hops,
            semantic_hops: cli.semantic_hops,
            query_timeout_ms: cli.query_timeout_ms,
        }
    }
}

#[tokio::main]
async fn main() {
    // .env first so RELGRAPH_* variables are visible to config loading
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    println!("\nRelgraph v{}\n", env!("CARGO_PKG_VERSION"));

    let config = match config::AppConfig::from_cli(cli.into()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = repl::run(config).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
