//! pgrest-ast server CLI
//!
//! A thin wrapper around the pgrest-ast-server library.

use std::sync::Arc;

use clap::Parser;
use pgrest_ast::{DEFAULT_BASE_PATH, Translator};
use pgrest_ast_server::{AppState, DEFAULT_MAX_BODY_BYTES, build_router};

#[derive(Parser)]
#[command(name = "pgrest-ast-server")]
#[command(about = "Translate PostgREST-style requests into query ASTs")]
#[command(after_help = "\
EXAMPLES:
    # Serve on the default port
    pgrest-ast-server

    # Then:
    curl 'http://127.0.0.1:3000/rest/v1/products?select=id,name&price=gt.100'

    # Custom base path
    pgrest-ast-server --base-path /api/v2 -p 8080
")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Path prefix stripped before routing
    #[arg(long, default_value = DEFAULT_BASE_PATH)]
    base_path: String,

    /// Maximum request body size in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_BODY_BYTES)]
    max_body_bytes: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    log::info!(
        "Base path: {}, max body: {} bytes",
        args.base_path,
        args.max_body_bytes
    );
    let state = Arc::new(AppState::new(
        Translator::with_base_path(args.base_path.clone()),
        args.max_body_bytes,
    ));
    let router = build_router(state);

    let addr = format!("{}:{}", args.host, args.port);
    println!("Starting server on {}", addr);
    println!("  *    {}/<table>    - Query/mutation AST", args.base_path);
    println!("  *    {}/rpc/<fn>   - RPC AST", args.base_path);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
