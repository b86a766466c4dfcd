use anyhow::Result;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::{ApiCall, FailureReport, GatewayError, classify};
use crate::http_client::http_client;
use crate::state::{AnalysisResult, MatchSet, Stats};

/// The three calls the client makes against the matchmaker backend.
pub trait MatchmakerApi: Send {
    fn fetch_stats(&self) -> Result<Stats, GatewayError>;
    fn analyze(&self, text: &str) -> Result<AnalysisResult, GatewayError>;
    fn find_matches(&self, skills: &[String]) -> Result<MatchSet, GatewayError>;
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct MatchRequest<'a> {
    skills: &'a [String],
}

#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = http_client(settings.request_timeout)?.clone();
        Ok(Self::with_client(client, &settings.api_base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn post_json<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        let url = self.url(path);
        debug!(%url, "POST");
        classify(
            self.client
                .post(&url)
                .header(CONTENT_TYPE, "application/json")
                .json(body)
                .send(),
        )
    }
}

impl MatchmakerApi for HttpGateway {
    fn fetch_stats(&self) -> Result<Stats, GatewayError> {
        let url = self.url("stats");
        debug!(%url, "GET");
        classify(
            self.client
                .get(&url)
                .header(CONTENT_TYPE, "application/json")
                .send(),
        )
    }

    fn analyze(&self, text: &str) -> Result<AnalysisResult, GatewayError> {
        self.post_json("analyze", &AnalyzeRequest { text })
    }

    fn find_matches(&self, skills: &[String]) -> Result<MatchSet, GatewayError> {
        self.post_json("match", &MatchRequest { skills })
    }
}

/// Stats for the landing screen; any failure yields [`Stats::fallback`] along
/// with a report for the diagnostics log.
pub fn fetch_stats_or_fallback(api: &dyn MatchmakerApi) -> (Stats, Option<FailureReport>) {
    match api.fetch_stats() {
        Ok(stats) => (stats, None),
        Err(err) => {
            warn!(kind = err.kind().label(), error = %err, "stats unavailable, using fallback");
            (Stats::fallback(), Some(FailureReport::new(ApiCall::Stats, &err)))
        }
    }
}
