use anyhow::Result;
use async_trait::async_trait;
use mamscan::config::toml_config::ScanConfig;
use mamscan::domain::model::Marker;
use mamscan::domain::ports::{CacheKey, Pipeline, ResultCache, SearchClient, SearchQuery, Storage};
use mamscan::utils::retry::Sleeper;
use mamscan::{EtlEngine, ScanError, SurveyPipeline};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const EMPTY_RESULT: &str = r#"<?xml version="1.0"?>
<BlastOutput>
  <BlastOutput_iterations>
    <Iteration>
      <Iteration_hits>
      </Iteration_hits>
    </Iteration>
  </BlastOutput_iterations>
</BlastOutput>
"#;

#[derive(Clone, Default)]
struct MemoryStorage {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    fn with_organisms(list: &str) -> Self {
        let storage = Self::default();
        storage
            .files
            .lock()
            .unwrap()
            .insert("organisms".to_string(), list.as_bytes().to_vec());
        storage
    }

    fn text(&self, path: &str) -> Option<String> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .map(|data| String::from_utf8_lossy(data).into_owned())
    }
}

impl Storage for MemoryStorage {
    async fn read_file(&self, path: &str) -> mamscan::Result<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| {
                ScanError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    path.to_string(),
                ))
            })
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> mamscan::Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), data.to_vec());
        Ok(())
    }
}

#[derive(Clone, Default)]
struct MemoryCache {
    documents: Arc<Mutex<HashMap<CacheKey, String>>>,
}

impl MemoryCache {
    fn len(&self) -> usize {
        self.documents.lock().unwrap().len()
    }
}

impl ResultCache for MemoryCache {
    async fn lookup(&self, key: &CacheKey) -> mamscan::Result<Option<String>> {
        Ok(self.documents.lock().unwrap().get(key).cloned())
    }

    async fn store(&self, key: &CacheKey, document: &str) -> mamscan::Result<()> {
        self.documents
            .lock()
            .unwrap()
            .insert(key.clone(), document.to_string());
        Ok(())
    }
}

/// 前 `failures` 次呼叫回傳暫時性錯誤，之後一律成功
#[derive(Clone, Default)]
struct FlakyClient {
    failures: u32,
    calls: Arc<AtomicU32>,
    queries: Arc<Mutex<Vec<SearchQuery>>>,
}

impl FlakyClient {
    fn failing(failures: u32) -> Self {
        Self {
            failures,
            ..Self::default()
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchClient for FlakyClient {
    async fn search(&self, query: &SearchQuery) -> mamscan::Result<String> {
        self.queries.lock().unwrap().push(query.clone());
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
            return Err(ScanError::SearchError {
                message: "Status=UNKNOWN".to_string(),
            });
        }
        Ok(EMPTY_RESULT.to_string())
    }
}

#[derive(Default)]
struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

impl RecordingSleeper {
    fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

#[tokio::test]
async fn test_transient_failures_are_retried_without_waiting() -> Result<()> {
    let storage = MemoryStorage::with_organisms("Magnetospirillum\n");
    let cache = MemoryCache::default();
    let client = FlakyClient::failing(2);
    let sleeper = Arc::new(RecordingSleeper::default());

    let pipeline = SurveyPipeline::new(storage.clone(), cache.clone(), client.clone(), ScanConfig::default())
        .with_sleeper(sleeper.clone());
    EtlEngine::new(pipeline).run().await?;

    // 8 個標記成功，另加 2 次失敗
    assert_eq!(client.calls(), 10);
    assert_eq!(cache.len(), 8);

    let slept = sleeper.slept();
    let request_delays = slept.iter().filter(|d| **d == Duration::from_secs(5)).count();
    let retry_delays = slept.iter().filter(|d| **d == Duration::from_secs(10)).count();
    assert_eq!(request_delays, 8);
    assert_eq!(retry_delays, 2);

    let table = storage.text("result.tsv").unwrap();
    assert_eq!(table.lines().count(), 1, "only the header: {:?}", table);

    Ok(())
}

#[tokio::test]
async fn test_queries_follow_marker_order() -> Result<()> {
    let storage = MemoryStorage::with_organisms("Magnetococcus marinus\n");
    let client = FlakyClient::default();

    let pipeline = SurveyPipeline::new(storage, MemoryCache::default(), client.clone(), ScanConfig::default())
        .with_sleeper(Arc::new(RecordingSleeper::default()));
    pipeline.extract().await?;

    let queries = client.queries.lock().unwrap().clone();
    let markers: Vec<Marker> = queries.iter().map(|q| q.marker).collect();
    assert_eq!(markers, Marker::ALL.to_vec());
    assert_eq!(queries[0].accession, "AAL09996.1");
    assert!(queries.iter().all(|q| q.organism_filter == "Magnetococcus marinus"));

    Ok(())
}

#[tokio::test]
async fn test_cached_rerun_makes_no_requests() -> Result<()> {
    let storage = MemoryStorage::with_organisms("Magnetospirillum\n");
    let cache = MemoryCache::default();
    let sleeper = Arc::new(RecordingSleeper::default());

    let first_client = FlakyClient::default();
    let first = SurveyPipeline::new(storage.clone(), cache.clone(), first_client.clone(), ScanConfig::default())
        .with_sleeper(sleeper.clone());
    let first_documents = first.extract().await?;
    assert_eq!(first_client.calls(), 8);
    assert!(first_documents.iter().all(|d| !d.from_cache));

    let second_client = FlakyClient::default();
    let second = SurveyPipeline::new(storage, cache, second_client.clone(), ScanConfig::default())
        .with_sleeper(sleeper.clone());
    let planned = second.plan().await?;
    assert!(planned.iter().all(|p| p.cached));

    let second_documents = second.extract().await?;
    assert_eq!(second_client.calls(), 0);
    assert!(second_documents.iter().all(|d| d.from_cache));
    // 快取命中不需要等待
    assert_eq!(sleeper.slept().len(), 8);

    Ok(())
}

#[tokio::test]
async fn test_attempt_cap_aborts_the_run() -> Result<()> {
    let storage = MemoryStorage::with_organisms("Magnetospirillum\n");
    let mut config = ScanConfig::default();
    config.search.max_attempts = Some(3);

    let pipeline = SurveyPipeline::new(storage.clone(), MemoryCache::default(), FlakyClient::failing(u32::MAX), config)
        .with_sleeper(Arc::new(RecordingSleeper::default()));
    let result = EtlEngine::new(pipeline).run().await;

    assert!(matches!(result, Err(ScanError::RetryExhausted { attempts: 3, .. })));
    assert!(storage.text("result.tsv").is_none());

    Ok(())
}

#[tokio::test]
async fn test_organism_list_ignores_blank_lines() -> Result<()> {
    let storage = MemoryStorage::with_organisms("\nMagnetospirillum magneticum\n   \n  Magnetococcus  \n\n");
    let pipeline = SurveyPipeline::new(storage, MemoryCache::default(), FlakyClient::default(), ScanConfig::default());

    assert_eq!(
        pipeline.organism_filters().await?,
        vec!["Magnetospirillum magneticum".to_string(), "Magnetococcus".to_string()]
    );

    let planned = pipeline.plan().await?;
    assert_eq!(planned.len(), 16);
    assert_eq!(planned[0].key.file_stem(), "Magnetospirillum_magneticum-MamA");
    assert_eq!(planned[15].key.file_stem(), "Magnetococcus-MamH");

    Ok(())
}

#[tokio::test]
async fn test_missing_organism_list_is_an_error() {
    let pipeline = SurveyPipeline::new(
        MemoryStorage::default(),
        MemoryCache::default(),
        FlakyClient::default(),
        ScanConfig::default(),
    );

    assert!(matches!(pipeline.plan().await, Err(ScanError::IoError(_))));
}
