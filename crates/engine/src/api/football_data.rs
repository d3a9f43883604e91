//! football-data.co.uk season files (public, no authentication)

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::config::Country;
use crate::error::{EngineError, EngineResult};
use crate::source::{decode_feed, parse_feed, MatchSource, NameCorrections};
use crate::types::Match;

pub const DEFAULT_BASE_URL: &str = "https://www.football-data.co.uk";

/// Season CSV client for football-data.co.uk
#[derive(Clone)]
pub struct FootballDataClient {
    client: Client,
    base_url: String,
    corrections: NameCorrections,
}

impl Default for FootballDataClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FootballDataClient {
    /// Create a client against the public site
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a client against a mirror of the site
    pub fn with_base_url(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            corrections: NameCorrections::default(),
        }
    }

    pub fn with_corrections(mut self, corrections: NameCorrections) -> Self {
        self.corrections = corrections;
        self
    }

    /// `{base}/mmz4281/{period}/{code}.csv`
    pub fn season_url(&self, code: &str, period: &str) -> String {
        format!("{}/mmz4281/{}/{}.csv", self.base_url, period, code)
    }

    /// Download one season file as text
    pub async fn fetch_season(&self, code: &str, period: &str) -> EngineResult<String> {
        let url = self.season_url(code, period);
        debug!(url = %url, "Fetching season file");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(EngineError::Data(format!(
                "football-data returned {status} for {code} {period}"
            )));
        }

        let bytes = response.bytes().await?;
        Ok(decode_feed(&bytes))
    }
}

#[async_trait]
impl MatchSource for FootballDataClient {
    fn name(&self) -> &str {
        "football-data"
    }

    async fn load_period(&self, country: &Country, period: &str) -> EngineResult<Vec<Match>> {
        let text = self.fetch_season(&country.code, period).await?;
        let feed = parse_feed(&text, period, &self.corrections)?;
        info!(
            country = %country.name,
            period,
            matches = feed.matches.len(),
            skipped = feed.skipped,
            "Season fetched"
        );
        Ok(feed.matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_url() {
        let client = FootballDataClient::with_base_url("http://mirror.local/");
        assert_eq!(
            client.season_url("G1", "2324"),
            "http://mirror.local/mmz4281/2324/G1.csv"
        );
        assert_eq!(
            FootballDataClient::new().season_url("E0", "1920"),
            "https://www.football-data.co.uk/mmz4281/1920/E0.csv"
        );
    }
}
