use std::path::PathBuf;

use clap::Parser;
use tower_lsp::{LspService, Server};

mod capabilities;
mod config;
mod document;
mod handlers;
mod server;
mod signatures;
mod syntax;
mod workspace;

use signatures::SignatureCatalog;

#[derive(Parser)]
#[command(name = "kestrel-lsp")]
#[command(about = "Language Server for Kestrel workspaces")]
struct Cli {
    /// Use stdio for communication (required)
    #[arg(long)]
    stdio: bool,

    /// Enable debug mode
    #[arg(long)]
    debug: bool,

    /// JSON file with additional function signatures
    #[arg(long, value_name = "PATH")]
    signatures: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the protocol, so logs go to stderr
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let args = Cli::parse();

    if !args.stdio {
        eprintln!("Error: --stdio flag is required");
        std::process::exit(1);
    }

    let catalog = match &args.signatures {
        Some(path) => SignatureCatalog::load(path)?,
        None => SignatureCatalog::default(),
    };
    log::info!("Loaded {} catalog signatures", catalog.len());

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let debug = args.debug;
    let (service, socket) =
        LspService::build(move |client| server::Backend::new(client, debug, catalog))
            .custom_method("kestrel/buildWorkspace", server::Backend::build_workspace)
            .finish();

    Server::new(stdin, stdout, socket).serve(service).await;
    Ok(())
}
