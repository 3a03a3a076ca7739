use crate::config::toml_config::SearchSettings;
use crate::domain::ports::{SearchClient, SearchQuery};
use crate::utils::error::{Result, ScanError};
use crate::utils::retry::{Sleeper, TokioSleeper};
use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, Response};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

static RID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"RID = (\S+)").expect("RID pattern is valid"));
static RTOE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"RTOE = (\d+)").expect("RTOE pattern is valid"));
static STATUS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Status=(\w+)").expect("status pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub rid: String,
    /// Server's estimate of seconds until the result is ready.
    pub rtoe: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    Waiting,
    Ready,
    Failed,
    Unknown,
}

/// NCBI BLAST URL API client: `CMD=Put` 送出查詢，輪詢 SearchInfo，完成後取回 XML
pub struct NcbiBlastClient {
    client: Client,
    settings: SearchSettings,
    sleeper: Arc<dyn Sleeper>,
}

impl NcbiBlastClient {
    pub fn new(settings: SearchSettings) -> Result<Self> {
        let mut builder = Client::builder().user_agent(concat!("mamscan/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = settings.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        Ok(Self {
            client: builder.build()?,
            settings,
            sleeper: Arc::new(TokioSleeper),
        })
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub async fn submit(&self, query: &SearchQuery) -> Result<Submission> {
        let hitlist_size = self.settings.hitlist_size.to_string();
        let expect = self.settings.expect.to_string();
        let form = [
            ("CMD", "Put"),
            ("PROGRAM", self.settings.program.as_str()),
            ("DATABASE", self.settings.database.as_str()),
            ("QUERY", query.accession.as_str()),
            ("ENTREZ_QUERY", query.organism_filter.as_str()),
            ("HITLIST_SIZE", hitlist_size.as_str()),
            ("EXPECT", expect.as_str()),
            ("FORMAT_TYPE", "XML"),
        ];

        tracing::debug!(
            "Submitting {} ({}) restricted to '{}'",
            query.marker,
            query.accession,
            query.organism_filter
        );
        let response = self
            .client
            .post(&self.settings.endpoint)
            .form(&form)
            .send()
            .await?;
        let body = Self::success_body(response, "submission").await?;

        parse_submission(&body)
    }

    pub async fn status(&self, rid: &str) -> Result<SearchStatus> {
        let response = self
            .client
            .get(&self.settings.endpoint)
            .query(&[("CMD", "Get"), ("FORMAT_OBJECT", "SearchInfo"), ("RID", rid)])
            .send()
            .await?;
        let body = Self::success_body(response, "status poll").await?;

        Ok(parse_status(&body))
    }

    pub async fn fetch_xml(&self, rid: &str) -> Result<String> {
        let response = self
            .client
            .get(&self.settings.endpoint)
            .query(&[("CMD", "Get"), ("FORMAT_TYPE", "XML"), ("RID", rid)])
            .send()
            .await?;
        let body = Self::success_body(response, "result fetch").await?;

        if !body.contains("<BlastOutput") {
            return Err(ScanError::SearchError {
                message: format!("RID {} did not return BLAST XML", rid),
            });
        }
        Ok(body)
    }

    async fn wait_until_ready(&self, submission: &Submission) -> Result<()> {
        let interval = Duration::from_secs(self.settings.poll_interval_seconds);
        let mut polls: u32 = 0;

        loop {
            self.sleeper.sleep(interval).await;
            polls += 1;

            match self.status(&submission.rid).await? {
                SearchStatus::Ready => return Ok(()),
                SearchStatus::Waiting => {
                    tracing::debug!("⏳ RID {} still running (poll {})", submission.rid, polls);
                }
                status => {
                    return Err(ScanError::SearchError {
                        message: format!("RID {} ended with status {:?}", submission.rid, status),
                    });
                }
            }

            if self.settings.max_polls.is_some_and(|max| polls >= max) {
                return Err(ScanError::SearchError {
                    message: format!("RID {} not ready after {} polls", submission.rid, polls),
                });
            }
        }
    }

    async fn success_body(response: Response, stage: &str) -> Result<String> {
        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::SearchError {
                message: format!("{} returned HTTP {}", stage, status),
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl SearchClient for NcbiBlastClient {
    async fn search(&self, query: &SearchQuery) -> Result<String> {
        let submission = self.submit(query).await?;
        tracing::info!(
            "🧬 {} x '{}' submitted as RID {} (estimated {}s)",
            query.marker,
            query.organism_filter,
            submission.rid,
            submission.rtoe.unwrap_or(0)
        );

        self.wait_until_ready(&submission).await?;
        self.fetch_xml(&submission.rid).await
    }
}

pub fn parse_submission(body: &str) -> Result<Submission> {
    let rid = RID_PATTERN
        .captures(body)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| ScanError::SearchError {
            message: "submission response carried no RID".to_string(),
        })?;
    let rtoe = RTOE_PATTERN
        .captures(body)
        .and_then(|caps| caps[1].parse().ok());

    Ok(Submission { rid, rtoe })
}

pub fn parse_status(body: &str) -> SearchStatus {
    match STATUS_PATTERN.captures(body).map(|caps| caps[1].to_string()) {
        Some(status) => match status.as_str() {
            "WAITING" => SearchStatus::Waiting,
            "READY" => SearchStatus::Ready,
            "FAILED" => SearchStatus::Failed,
            _ => SearchStatus::Unknown,
        },
        None => SearchStatus::Unknown,
    }
}
