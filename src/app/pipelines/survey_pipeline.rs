use crate::adapters::blast_xml::parse_blast_xml;
use crate::config::toml_config::ScanConfig;
use crate::core::aggregator::AggregationState;
use crate::core::classifier::EvidenceClassifier;
use crate::core::resolver::ProductionTypeResolver;
use crate::core::table::TableBuilder;
use crate::core::{Pipeline, ResultCache, SearchClient, SearchDocument, Storage, SurveyResult};
use crate::domain::model::Marker;
use crate::domain::ports::{CacheKey, SearchQuery};
use crate::utils::error::{Result, ScanError};
use crate::utils::retry::{RetryPolicy, Sleeper, TokioSleeper};
use std::sync::Arc;

/// One (organism filter, marker) combination and whether its result is cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedSearch {
    pub key: CacheKey,
    pub cached: bool,
}

/// 對每個目標物種逐一搜尋 8 個標記，彙整後輸出產生型別表
pub struct SurveyPipeline<S: Storage, K: ResultCache, C: SearchClient> {
    storage: S,
    cache: K,
    client: C,
    config: ScanConfig,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl<S: Storage, K: ResultCache, C: SearchClient> SurveyPipeline<S, K, C> {
    pub fn new(storage: S, cache: K, client: C, config: ScanConfig) -> Self {
        let retry = config.search.retry_policy();
        Self {
            storage,
            cache,
            client,
            config,
            retry,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replaces the sleeper used for the pre-request delay and retry backoff.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.retry = self.retry.with_sleeper(sleeper.clone());
        self.sleeper = sleeper;
        self
    }

    /// 讀取目標物種清單，一行一個，忽略空白行
    pub async fn organism_filters(&self) -> Result<Vec<String>> {
        let raw = self
            .storage
            .read_file(&self.config.input.organisms_file)
            .await?;
        let text = String::from_utf8(raw).map_err(|e| ScanError::ProcessingError {
            message: format!("organism list is not valid UTF-8: {}", e),
        })?;

        Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    pub async fn plan(&self) -> Result<Vec<PlannedSearch>> {
        let mut planned = Vec::new();
        for filter in self.organism_filters().await? {
            for marker in Marker::ALL {
                let key = CacheKey::new(&filter, marker);
                let cached = self.cache.lookup(&key).await?.is_some();
                planned.push(PlannedSearch { key, cached });
            }
        }
        Ok(planned)
    }

    async fn fetch_document(&self, filter: &str, marker: Marker) -> Result<SearchDocument> {
        let key = CacheKey::new(filter, marker);

        if let Some(body) = self.cache.lookup(&key).await? {
            tracing::debug!("📂 Cache hit for {}", key.file_stem());
            return Ok(SearchDocument {
                organism_filter: filter.to_string(),
                marker,
                body,
                from_cache: true,
            });
        }

        self.sleeper.sleep(self.config.search.request_delay()).await;

        let query = SearchQuery::for_marker(marker, filter);
        let label = format!("{} search for '{}'", marker, filter);
        let body = self
            .retry
            .run(&label, || self.client.search(&query))
            .await?;

        self.cache.store(&key, &body).await?;
        tracing::info!("💾 Cached {}", key.file_stem());

        Ok(SearchDocument {
            organism_filter: filter.to_string(),
            marker,
            body,
            from_cache: false,
        })
    }
}

#[async_trait::async_trait]
impl<S: Storage, K: ResultCache, C: SearchClient> Pipeline for SurveyPipeline<S, K, C> {
    async fn extract(&self) -> Result<Vec<SearchDocument>> {
        let filters = self.organism_filters().await?;
        tracing::info!("📋 {} organism filters to survey", filters.len());

        let mut documents = Vec::with_capacity(filters.len() * Marker::ALL.len());
        for filter in &filters {
            for marker in Marker::ALL {
                tracing::debug!("Start collecting {} for '{}'", marker, filter);
                documents.push(self.fetch_document(filter, marker).await?);
            }
        }

        Ok(documents)
    }

    async fn transform(&self, documents: Vec<SearchDocument>) -> Result<SurveyResult> {
        let classifier = EvidenceClassifier::new(self.config.classifier.clone());
        let mut state = AggregationState::new(self.config.classifier.best_hit);

        for document in &documents {
            let hits = parse_blast_xml(&document.body).map_err(|e| ScanError::XmlError {
                message: format!(
                    "{}: {}",
                    CacheKey::new(&document.organism_filter, document.marker).file_stem(),
                    e
                ),
            })?;
            state.absorb(classifier.classify(document.marker, &document.organism_filter, &hits));
        }

        tracing::info!(
            "🧮 Aggregated {} batches into {} organisms",
            state.absorbed_batches(),
            state.organism_count()
        );

        let rows = state.finalize();
        let resolver = ProductionTypeResolver::new();
        let verdicts: Vec<_> = rows.iter().map(|row| resolver.resolve(row)).collect();
        let table = TableBuilder::build(&verdicts);
        let tsv_output = TableBuilder::render_tsv(&table)?;

        Ok(SurveyResult {
            verdicts,
            rows,
            tsv_output,
        })
    }

    async fn load(&self, result: SurveyResult) -> Result<String> {
        let filename = &self.config.output.filename;
        self.storage
            .write_file(filename, result.tsv_output.as_bytes())
            .await?;

        if let Some(report) = &self.config.output.evidence_report {
            let json_data = serde_json::to_string_pretty(&result.rows)?;
            self.storage.write_file(report, json_data.as_bytes()).await?;
            tracing::info!("📝 Evidence report saved: {}", report);
        }

        Ok(filename.clone())
    }
}
