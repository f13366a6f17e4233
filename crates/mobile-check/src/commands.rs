//! CLI command implementations.

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

use clap::Args;
use color_eyre::eyre::{eyre, Result, WrapErr};

use mobile_check_server::{Server, ServerConfig};
use mobile_check_store::StoreBackend;

use crate::config::Config;

/// Options for `mobile-check serve`. Unset options fall back to the config.
#[derive(Debug, Default, Args)]
pub struct ServeArgs {
    /// Host to bind to
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Store backend (memory or file)
    #[arg(short, long)]
    pub store: Option<StoreBackend>,

    /// Directory for the file store
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Directory of static files served at /
    #[arg(long)]
    pub public_dir: Option<PathBuf>,

    /// Base URL used in upload links
    #[arg(long)]
    pub public_url: Option<String>,

    /// Recipient of checklist reports
    #[arg(long)]
    pub report_email: Option<String>,

    /// Delete entries once their page has been viewed
    #[arg(long)]
    pub consume_on_view: bool,

    /// Reject multipart uploads that carry no file
    #[arg(long)]
    pub require_file: bool,

    /// Disable CORS headers
    #[arg(long)]
    pub no_cors: bool,
}

/// Start the checklist server.
pub async fn serve(args: ServeArgs, cfg: Config) -> Result<()> {
    let cfg = apply_serve_args(args, cfg);
    let server_config = server_config(&cfg)?;
    let store_config = cfg.store_config();

    tracing::info!(
        addr = %server_config.addr,
        store = %store_config.backend,
        "Starting Mobile Check server..."
    );

    let server = Server::with_store_config(server_config, &store_config)
        .await
        .wrap_err("Failed to open payload store")?;
    server.run().await?;

    Ok(())
}

/// Layers command-line options over the loaded configuration.
fn apply_serve_args(args: ServeArgs, mut cfg: Config) -> Config {
    if let Some(host) = args.host {
        cfg.server_host = host;
    }
    if let Some(port) = args.port {
        cfg.server_port = port;
    }
    if let Some(store) = args.store {
        cfg.store_backend = store;
    }
    if let Some(dir) = args.data_dir {
        cfg.data_dir = dir;
    }
    if let Some(dir) = args.public_dir {
        cfg.public_dir = dir;
    }
    if let Some(url) = args.public_url {
        cfg.public_url = Some(url);
    }
    if let Some(email) = args.report_email {
        cfg.report_email = email;
    }
    cfg.consume_on_view |= args.consume_on_view;
    cfg.require_upload_file |= args.require_file;
    cfg.cors &= !args.no_cors;
    cfg
}

/// Builds the server settings from the merged configuration.
fn server_config(cfg: &Config) -> Result<ServerConfig> {
    let addr = resolve_addr(&cfg.server_host, cfg.server_port)?;

    let mut builder = ServerConfig::builder()
        .addr(addr)
        .cors(cfg.cors)
        .public_dir(&cfg.public_dir)
        .report_email(&cfg.report_email)
        .require_upload_file(cfg.require_upload_file)
        .consume_on_view(cfg.consume_on_view);

    if let Some(url) = cfg.resolved_public_url() {
        builder = builder.public_url(url);
    }

    Ok(builder.build())
}

fn resolve_addr(host: &str, port: u16) -> Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()
        .wrap_err_with(|| format!("Invalid listen address {host}:{port}"))?
        .next()
        .ok_or_else(|| eyre!("No address found for {host}:{port}"))
}

/// Display version and build info.
pub fn version() {
    println!("mobile-check {}", env!("CARGO_PKG_VERSION"));
    println!("  {}", env!("CARGO_PKG_DESCRIPTION"));
}
