use anyhow::Result;
use tokio::sync::watch;

use viel_index::ArcIndexProvider;
use viel_proto::config::WebConfig;

pub struct Server {
    web: viel_proto::http::Server,
}

impl Server {
    pub fn new(web: WebConfig, index: ArcIndexProvider) -> Result<Self> {
        Ok(Self {
            web: viel_proto::http::new(web, index)?,
        })
    }

    pub async fn run(self) -> Result<()> {
        tracing::info!("Starting netviel...");

        let exit_signal = watch_ctrl_c();
        if let Err(e) = self.web.run(exit_signal).await {
            tracing::error!(err=?e, "web server stopped");
            return Err(e);
        }
        Ok(())
    }
}

pub fn watch_ctrl_c() -> watch::Receiver<bool> {
    let (send_cancel, watch_cancel) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(err=?e, "failed to install CTRL+C signal handler");
            // keep the sender alive, the server runs until killed
            std::future::pending::<()>().await;
        }
        tracing::info!("Received CTRL+C, shutting down.");
        let _ = send_cancel.send(true);
    });
    watch_cancel
}
