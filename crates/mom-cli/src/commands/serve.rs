//! Web server command.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use mom_core::config::MomConfig;

#[derive(Args)]
pub struct ServeArgs {
    /// Port to listen on (defaults to [web] port)
    #[arg(long)]
    pub port: Option<u16>,

    /// Host to bind to (defaults to [web] host)
    #[arg(long)]
    pub host: Option<String>,
}

pub async fn execute(args: ServeArgs, mut config: MomConfig) -> Result<()> {
    if let Some(port) = args.port {
        config.web.port = port;
    }
    if let Some(host) = args.host {
        config.web.host = host;
    }
    let host = config.web.host.clone();
    let port = config.web.port;

    println!();
    println!("  {} {}", "MOM".magenta().bold(), "Web Server".bold());
    println!();
    println!("  {}  http://{}:{}", "Dashboard".green(), host, port);
    println!("  {}       http://{}:{}/api", "API".green(), host, port);
    println!("  {}  ws://{}:{}/ws/scans/{{id}}", "WebSocket".green(), host, port);
    if config.places.credential().is_none() {
        println!(
            "  {}",
            "No places API key configured; clients must send their own.".yellow()
        );
    }
    println!();
    println!("  {}", "Ctrl+C to stop".dimmed());
    println!();

    mom_web::run_server(config).await?;

    Ok(())
}
