mod config;
mod dev;
mod server;

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use viel_index::notmuch::NotmuchProvider;
use viel_index::ArcIndexProvider;

use config::{read_config, Config};
use server::Server;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// A special mode dedicated to developers, serves a demo mailbox from memory
    #[clap(long)]
    dev: bool,

    #[clap(short, long, env = "NETVIEL_CONFIG")]
    /// Path to the netviel configuration file
    config: Option<PathBuf>,

    #[clap(short, long)]
    /// Port of the web server [default: 5000]
    port: Option<u16>,

    #[clap(long)]
    /// Address the web server binds to [default: 127.0.0.1]
    bind: Option<IpAddr>,

    #[clap(long, env = "NOTMUCH_PATH")]
    /// Root of the notmuch mail store
    notmuch_path: Option<PathBuf>,

    #[clap(long, env = "NETVIEL_STATIC_DIR")]
    /// Directory of the prebuilt web frontend
    static_dir: Option<PathBuf>,
}

impl Args {
    /// Flags and environment take precedence over the file
    fn apply(&self, mut config: Config) -> Config {
        let ip = self.bind.unwrap_or_else(|| config.web.bind_addr.ip());
        let port = self.port.unwrap_or_else(|| config.web.bind_addr.port());
        config.web.bind_addr = SocketAddr::new(ip, port);
        if let Some(dir) = self.static_dir.as_ref() {
            config.web.static_dir = Some(dir.clone());
        }
        if let Some(path) = self.notmuch_path.as_ref() {
            config.notmuch.database_path = Some(path.clone());
        }
        config
    }
}

#[cfg(tokio_unstable)]
fn tracer() {
    console_subscriber::init();
}

#[cfg(not(tokio_unstable))]
fn tracer() {
    tracing_subscriber::fmt::init();
}

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "netviel=info,viel_proto=info,viel_index=info")
    }

    // Abort on panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("{}", panic_info);
        eprintln!("{:?}", backtrace::Backtrace::new());
        std::process::abort();
    }));

    tracer();

    let args = Args::parse();
    let (config, index): (Config, ArcIndexProvider) = if args.dev {
        tracing::warn!("developer mode, serving a demo mailbox");
        (args.apply(Config::default()), Arc::new(dev::demo_index()?))
    } else {
        let config = match args.config.as_ref() {
            Some(path) => read_config(path.clone())?,
            None => Config::default(),
        };
        let config = args.apply(config);
        let index = Arc::new(NotmuchProvider::new(config.notmuch.clone()));
        (config, index)
    };
    tracing::debug!(?config, "configuration loaded");

    Server::new(config.web, index)?.run().await
}
