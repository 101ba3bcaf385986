use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{SourceCatalog, SourceDescriptor};

/// A fixed source list, typically loaded from the config file.
///
/// Every call hands out a fresh clone, so a cycle never shares state with the
/// catalog or with other cycles.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    sources: Vec<SourceDescriptor>,
}

impl StaticCatalog {
    pub fn new(sources: Vec<SourceDescriptor>) -> Self {
        Self { sources }
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[async_trait]
impl SourceCatalog for StaticCatalog {
    async fn sources(&self, cancel: &CancellationToken) -> Result<Vec<SourceDescriptor>> {
        if cancel.is_cancelled() {
            anyhow::bail!("source listing cancelled");
        }
        Ok(self.sources.clone())
    }
}
