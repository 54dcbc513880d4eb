/// Last.fm tag-chart source
///
/// Legacy catalog used as a fallback when the primary catalog comes up short.
/// `tag.gettoptracks` when a tag is known, `chart.gettoptracks` otherwise.
use crate::{
    error::{AppError, AppResult},
    models::{
        lastfm::{LastFmErrorResponse, LastFmTrack, LastFmTracksResponse},
        CandidateTrack,
    },
    services::providers::{TrackQuery, TrackSource},
};
use reqwest::Client as HttpClient;

#[derive(Clone)]
pub struct LastFmProvider {
    http_client: HttpClient,
    api_url: String,
    api_key: String,
}

impl LastFmProvider {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
            api_key,
        }
    }

    /// Top tracks for a tag, or the global chart when `tag` is `None`
    pub async fn top_tracks(&self, tag: Option<&str>, limit: usize) -> AppResult<Vec<CandidateTrack>> {
        if self.api_key.is_empty() {
            return Err(AppError::UpstreamUnavailable(
                "Last.fm API key not configured".to_string(),
            ));
        }

        let limit_param = limit.max(1).to_string();
        let mut params = vec![
            ("api_key", self.api_key.as_str()),
            ("format", "json"),
            ("limit", limit_param.as_str()),
        ];
        match tag {
            Some(tag) => {
                params.push(("method", "tag.gettoptracks"));
                params.push(("tag", tag));
            }
            None => params.push(("method", "chart.gettoptracks")),
        }

        let response = self
            .http_client
            .get(&self.api_url)
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamUnavailable(format!(
                "Last.fm API returned status {}: {}",
                status, body
            )));
        }

        let body: serde_json::Value = response.json().await?;

        if let Ok(err) = serde_json::from_value::<LastFmErrorResponse>(body.clone()) {
            return Err(AppError::UpstreamUnavailable(format!(
                "Last.fm error {}: {}",
                err.error, err.message
            )));
        }

        let parsed: LastFmTracksResponse = serde_json::from_value(body).map_err(|e| {
            AppError::UpstreamUnavailable(format!("Failed to parse Last.fm response: {}", e))
        })?;

        let Some(list) = parsed.tracks else {
            return Err(AppError::UpstreamUnavailable(
                "Unexpected Last.fm response structure".to_string(),
            ));
        };

        let tracks: Vec<CandidateTrack> = list
            .track
            .into_iter()
            .filter_map(LastFmTrack::into_candidate)
            .take(limit)
            .collect();

        tracing::info!(
            tag = tag.unwrap_or("global"),
            results = tracks.len(),
            provider = "lastfm",
            "Tag chart fetched"
        );

        Ok(tracks)
    }
}

#[async_trait::async_trait]
impl TrackSource for LastFmProvider {
    fn supports(&self, query: &TrackQuery) -> bool {
        matches!(query, TrackQuery::TagChart { .. })
    }

    async fn fetch(&self, query: &TrackQuery, limit: usize) -> Vec<CandidateTrack> {
        let TrackQuery::TagChart { tag } = query else {
            return Vec::new();
        };

        match self.top_tracks(tag.as_deref(), limit).await {
            Ok(tracks) => tracks,
            Err(e) => {
                tracing::warn!(query = %query, error = %e, provider = "lastfm", "Last.fm fetch failed");
                Vec::new()
            }
        }
    }

    fn name(&self) -> &'static str {
        "lastfm"
    }
}
