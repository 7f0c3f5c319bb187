use tokio::sync::OnceCell;

use viel_index::{ArcDatabase, ArcIndexProvider, Result};

/// Lives as long as a single HTTP request.
/// The index is opened on first use and the handle is reused
/// until the request is answered.
pub(crate) struct RequestContext {
    provider: ArcIndexProvider,
    db: OnceCell<ArcDatabase>,
}

impl RequestContext {
    pub(crate) fn new(provider: ArcIndexProvider) -> Self {
        Self {
            provider,
            db: OnceCell::new(),
        }
    }

    pub(crate) async fn db(&self) -> Result<&ArcDatabase> {
        self.db
            .get_or_try_init(|| async {
                tracing::debug!("opening index");
                self.provider.open().await
            })
            .await
    }
}
