use std::path::Path;

use anyhow::anyhow;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use snippetbox::config::{Config, LogFormat};

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to the configuration file
    #[arg(long, env = "SNIPPETBOX_CONFIG", default_value = "config.toml")]
    config: String,

    /// HTTP network address, overrides the config file
    #[arg(long, env = "SNIPPETBOX_ADDR")]
    addr: Option<String>,

    /// Database data source name, overrides the config file
    #[arg(long, env = "SNIPPETBOX_DSN")]
    dsn: Option<String>,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut cfg = if Path::new(&args.config).exists() {
        Config::from_file(&args.config).map_err(|e| anyhow!("{}: {e}", args.config))?
    } else {
        Config::default()
    };
    if let Some(addr) = args.addr {
        cfg.addr = addr;
    }
    if let Some(dsn) = args.dsn {
        cfg.db_path = dsn;
    }

    init_tracing(cfg.log_format);
    snippetbox::server::run(cfg).await
}
