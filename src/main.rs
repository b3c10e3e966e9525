//! Git Query Service - a read-only HTTP API over hosted git repositories
//!
//! # Usage
//! ```bash
//! git-query /srv/git              # Serve the repositories under /srv/git
//! git-query /srv/git --port 8080  # Use a custom port
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use git_query::git::RepositoryManager;
use git_query::routes;

/// Git Query Service - serve commit history, diffs and blob content
#[derive(Parser)]
#[command(name = "git-query")]
#[command(about = "A read-only query service for hosted git repositories", long_about = None)]
struct Cli {
    /// Directory containing the hosted repositories
    #[arg(value_name = "STORAGE_ROOT")]
    root: PathBuf,

    /// Port to run the server on
    #[arg(short, long, default_value = "3001")]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let root = match std::fs::canonicalize(&cli.root) {
        Ok(path) if path.is_dir() => path,
        Ok(path) => {
            eprintln!("✗ Storage root is not a directory: {}", path.display());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("✗ Cannot access storage root {}: {}", cli.root.display(), e);
            std::process::exit(1);
        }
    };

    let repositories = Arc::new(RepositoryManager::new(root.clone()));

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::create_router(repositories)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Bind to the port
    let addr = format!("127.0.0.1:{}", cli.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("✗ Failed to bind to port {}: {}", cli.port, e);
            eprintln!("  Try a different port with --port <PORT>");
            std::process::exit(1);
        }
    };

    println!();
    println!("  Storage root: {}", root.display());
    println!("  Server:       http://{}", addr);
    println!();
    println!("  Press Ctrl+C to stop");
    println!();

    // Set up graceful shutdown
    let shutdown = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        println!("\n  Shutting down...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
