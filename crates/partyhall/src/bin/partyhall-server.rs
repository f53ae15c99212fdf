use std::time::Duration;

use clap::Parser;
use partyhall::logging::setup_logger;
use partyhall::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "partyhall-server")]
#[command(about = "Real-time party-game room server", long_about = None)]
struct Args {
    /// Address of the game WebSocket listener
    #[arg(short = 'b', long, default_value = "127.0.0.1:3001")]
    bind: String,

    /// Address of the operational HTTP listener
    #[arg(long, default_value = "127.0.0.1:3002")]
    admin_bind: String,

    /// Run without the operational HTTP listener
    #[arg(long)]
    no_admin: bool,

    /// Seconds of silence before a client is dropped
    #[arg(long, default_value_t = 60)]
    idle_timeout_secs: u64,

    /// Bearer token required by POST /reset
    #[arg(long, env = "PARTYHALL_ADMIN_TOKEN")]
    admin_token: Option<String>,

    /// Seed for reproducible room codes and games
    #[arg(long)]
    seed: Option<u64>,

    /// Log level for Partyhall crates when RUST_LOG is unset
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let mut builder = PartyhallServer::<GuestAuthenticator, _>::builder()
        .bind(&args.bind)
        .admin_bind(&args.admin_bind)
        .idle_timeout(Duration::from_secs(args.idle_timeout_secs));
    if args.no_admin {
        builder = builder.no_admin();
    }
    if let Some(token) = args.admin_token {
        builder = builder.admin_token(token);
    }
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }

    let server = match builder.build(GuestAuthenticator).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "failed to start server");
            std::process::exit(1);
        }
    };
    if let Some(addr) = server.admin_addr() {
        tracing::info!(%addr, "admin endpoints: /health /rooms /reset");
    }

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "server error");
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }
}
