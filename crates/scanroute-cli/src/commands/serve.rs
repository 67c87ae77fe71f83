//! Serve command - run the watch loop and HTTP API.

use clap::Args;

use scanroute_core::ScanrouteConfig;
use scanroute_server::ServeOptions;

use super::process::pipeline_extractor;

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Do not watch the scan folder (HTTP and manual triggers only)
    #[arg(long)]
    no_watch: bool,

    /// Skip the sweep of files already in the scan folder
    #[arg(long)]
    no_sweep: bool,

    /// Listen address (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Listen port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,
}

pub async fn run(args: ServeArgs, mut config: ScanrouteConfig) -> anyhow::Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let options = ServeOptions {
        watch: !args.no_watch,
        startup_sweep: !args.no_sweep,
    };
    let extractor = pipeline_extractor(&config);
    scanroute_server::serve(config, extractor, options).await?;
    Ok(())
}
