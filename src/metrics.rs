use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::Path;

use crate::snapshot::write_atomic;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the process-wide Prometheus recorder.
    /// Fails if another recorder is already installed.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        Ok(Self { handle })
    }

    /// Prometheus exposition text.
    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Dump the exposition text next to the snapshot (textfile-collector style).
    pub async fn write_to(&self, path: &Path) -> Result<()> {
        write_atomic(path, self.render().as_bytes())
            .await
            .with_context(|| format!("writing metrics to {}", path.display()))
    }
}
