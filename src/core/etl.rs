use crate::core::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        let started = Instant::now();
        tracing::info!("🚀 Starting survey run");

        // Extract
        let documents = self.pipeline.extract().await?;
        let cached = documents.iter().filter(|d| d.from_cache).count();
        tracing::info!(
            "📥 Collected {} search documents ({} cached, {} fetched)",
            documents.len(),
            cached,
            documents.len() - cached
        );

        // Transform
        let result = self.pipeline.transform(documents).await?;
        tracing::info!(
            "🔧 Classified {} organisms, {} included in the table",
            result.verdicts.len(),
            result.included_count()
        );

        // Load
        let output_path = self.pipeline.load(result).await?;
        tracing::info!("💾 Output saved to: {} ({:?})", output_path, started.elapsed());

        Ok(output_path)
    }
}
