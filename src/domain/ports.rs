use crate::domain::model::{Marker, SearchDocument, SurveyResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Identifies one persisted search result: one organism filter against one marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub organism_filter: String,
    pub marker: Marker,
}

impl CacheKey {
    pub fn new(organism_filter: &str, marker: Marker) -> Self {
        Self {
            organism_filter: organism_filter.to_string(),
            marker,
        }
    }

    /// `<filter_with_spaces_as_underscores>-<marker>`
    pub fn file_stem(&self) -> String {
        format!(
            "{}-{}",
            self.organism_filter.split(' ').collect::<Vec<_>>().join("_"),
            self.marker.name()
        )
    }
}

pub trait ResultCache: Send + Sync {
    fn lookup(
        &self,
        key: &CacheKey,
    ) -> impl std::future::Future<Output = Result<Option<String>>> + Send;
    fn store(
        &self,
        key: &CacheKey,
        document: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub marker: Marker,
    pub accession: String,
    pub organism_filter: String,
}

impl SearchQuery {
    pub fn for_marker(marker: Marker, organism_filter: &str) -> Self {
        Self {
            marker,
            accession: marker.reference_id().to_string(),
            organism_filter: organism_filter.to_string(),
        }
    }
}

/// Remote homology search. Returns the raw BLAST XML document.
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<String>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<SearchDocument>>;
    async fn transform(&self, documents: Vec<SearchDocument>) -> Result<SurveyResult>;
    async fn load(&self, result: SurveyResult) -> Result<String>;
}
