//! Match data sources
//!
//! Feed files follow the football-data.co.uk layout: one CSV per league and
//! season with `Date, HomeTeam, AwayTeam, FTR, FTHG, FTAG, B365D` among many
//! other columns. The loader attaches the period label; the file itself
//! does not carry one.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Country;
use crate::error::{EngineError, EngineResult};
use crate::synthetic::{generate_league, LeagueSpec};
use crate::types::{FullTimeResult, Match};

// ============================================================================
// Name corrections
// ============================================================================

/// Team names rewritten on load so one club keeps one name across seasons
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameCorrections(HashMap<String, String>);

impl Default for NameCorrections {
    fn default() -> Self {
        Self(
            [
                ("Olympiacos Piraeus", "Olympiakos"),
                ("Volos", "Volos NFC"),
            ]
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect(),
        )
    }
}

impl NameCorrections {
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    pub fn with(mut self, from: &str, to: &str) -> Self {
        self.0.insert(from.to_string(), to.to_string());
        self
    }

    pub fn apply(&self, name: &str) -> String {
        let name = name.trim();
        self.0
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

// ============================================================================
// CSV parsing
// ============================================================================

/// Matches parsed from one feed file plus the count of rows dropped
#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    pub matches: Vec<Match>,
    pub skipped: usize,
}

/// Feed dates are `dd/mm/yyyy`, older files use `dd/mm/yy`
pub fn parse_feed_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let format = if raw.len() > 8 { "%d/%m/%Y" } else { "%d/%m/%y" };
    NaiveDate::parse_from_str(raw, format).ok()
}

fn parse_goals(raw: Option<&str>) -> u32 {
    raw.and_then(|g| g.trim().parse::<f64>().ok())
        .map(|g| g.max(0.0) as u32)
        .unwrap_or(0)
}

fn parse_quote(raw: Option<&str>) -> Option<Decimal> {
    raw.map(str::trim)
        .filter(|q| !q.is_empty())
        .and_then(|q| Decimal::from_str(q).ok())
}

struct Columns {
    date: usize,
    home: usize,
    away: usize,
    result: usize,
    home_goals: Option<usize>,
    away_goals: Option<usize>,
    draw_odds: Option<usize>,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> EngineResult<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().trim_start_matches('\u{feff}') == name)
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| EngineError::Data(format!("feed is missing column {name}")))
        };
        Ok(Self {
            date: require("Date")?,
            home: require("HomeTeam")?,
            away: require("AwayTeam")?,
            result: require("FTR")?,
            home_goals: find("FTHG"),
            away_goals: find("FTAG"),
            draw_odds: find("B365D"),
        })
    }
}

/// Parse one feed file into matches labelled with `period`.
///
/// Rows without a recognised result or date are skipped and counted.
pub fn parse_feed(
    text: &str,
    period: &str,
    corrections: &NameCorrections,
) -> EngineResult<ParsedFeed> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| EngineError::Data(format!("unreadable feed header: {e}")))?
        .clone();
    let cols = Columns::locate(&headers)?;

    let mut feed = ParsedFeed::default();
    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                debug!(error = %e, "Skipping malformed feed row");
                feed.skipped += 1;
                continue;
            }
        };

        let result = record.get(cols.result).and_then(FullTimeResult::from_code);
        let date = record.get(cols.date).and_then(parse_feed_date);
        let home = record.get(cols.home).map(str::trim).unwrap_or_default();
        let away = record.get(cols.away).map(str::trim).unwrap_or_default();

        let (Some(result), Some(date)) = (result, date) else {
            feed.skipped += 1;
            continue;
        };
        if home.is_empty() || away.is_empty() {
            feed.skipped += 1;
            continue;
        }

        feed.matches.push(Match {
            date,
            home_team: corrections.apply(home),
            away_team: corrections.apply(away),
            result,
            home_goals: parse_goals(cols.home_goals.and_then(|i| record.get(i))),
            away_goals: parse_goals(cols.away_goals.and_then(|i| record.get(i))),
            draw_odds: parse_quote(cols.draw_odds.and_then(|i| record.get(i))),
            period: period.to_string(),
        });
    }

    Ok(feed)
}

// ============================================================================
// Sources
// ============================================================================

/// Anything that can supply a league's matches for a set of periods
#[async_trait]
pub trait MatchSource: Send + Sync {
    fn name(&self) -> &str;

    async fn load_period(&self, country: &Country, period: &str) -> EngineResult<Vec<Match>>;

    /// Load every period. A period that fails is logged and left out; the
    /// load only fails when nothing at all could be read.
    async fn load(&self, country: &Country, periods: &[String]) -> EngineResult<Vec<Match>> {
        let mut dataset = Vec::new();
        let mut last_error = None;

        for period in periods {
            match self.load_period(country, period).await {
                Ok(matches) => {
                    debug!(country = %country.name, period = %period, matches = matches.len(), "Period loaded");
                    dataset.extend(matches);
                }
                Err(e) => {
                    warn!(country = %country.name, period = %period, error = %e, "Period unavailable");
                    last_error = Some(e);
                }
            }
        }

        if dataset.is_empty() {
            return Err(last_error.unwrap_or_else(|| {
                EngineError::Data(format!("no matches for {}", country.name))
            }));
        }

        info!(
            source = self.name(),
            country = %country.name,
            matches = dataset.len(),
            "Dataset loaded"
        );
        Ok(dataset)
    }
}

pub(crate) fn decode_feed(bytes: &[u8]) -> String {
    // older season files are not always valid UTF-8
    String::from_utf8_lossy(bytes).into_owned()
}

/// Reads `{dir}/{period}/{code}.csv`
pub struct CsvDirectorySource {
    dir: PathBuf,
    corrections: NameCorrections,
}

impl CsvDirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            corrections: NameCorrections::default(),
        }
    }

    pub fn with_corrections(mut self, corrections: NameCorrections) -> Self {
        self.corrections = corrections;
        self
    }

    pub fn path_for(&self, country: &Country, period: &str) -> PathBuf {
        self.dir.join(period).join(format!("{}.csv", country.code))
    }
}

#[async_trait]
impl MatchSource for CsvDirectorySource {
    fn name(&self) -> &str {
        "csv-directory"
    }

    async fn load_period(&self, country: &Country, period: &str) -> EngineResult<Vec<Match>> {
        let path = self.path_for(country, period);
        let bytes = tokio::fs::read(&path).await?;
        let feed = parse_feed(&decode_feed(&bytes), period, &self.corrections)?;
        if feed.skipped > 0 {
            debug!(path = %path.display(), skipped = feed.skipped, "Rows skipped");
        }
        Ok(feed.matches)
    }
}

/// Seeded synthetic leagues, one per country
pub struct SyntheticSource {
    spec: LeagueSpec,
}

impl SyntheticSource {
    pub fn new(spec: LeagueSpec) -> Self {
        Self { spec }
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new(LeagueSpec::default())
    }
}

#[async_trait]
impl MatchSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    async fn load_period(&self, country: &Country, period: &str) -> EngineResult<Vec<Match>> {
        self.load(country, &[period.to_string()]).await
    }

    async fn load(&self, country: &Country, periods: &[String]) -> EngineResult<Vec<Match>> {
        // each league gets its own stream, stable across runs
        let salt = country
            .code
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let spec = LeagueSpec {
            periods: periods.to_vec(),
            seed: self.spec.seed ^ salt,
            ..self.spec.clone()
        };
        Ok(generate_league(&spec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const FEED: &str = "\
Div,Date,Time,HomeTeam,AwayTeam,FTHG,FTAG,FTR,B365H,B365D,B365A
G1,19/08/2023,17:30,Olympiacos Piraeus,Volos,3,0,H,1.2,6.5,13
G1,20/08/2023,19:00,Aris,PAOK,1,1,D,2.6,3.1,2.8
G1,21/08/2023,20:00,Lamia,Panserraikos,,,,,3.3,
G1,22/08/2023,20:00,Atromitos,OFI,0,2,A,2.1,,3.6
";

    fn greece() -> Country {
        Country::from_name("greece").unwrap()
    }

    #[test]
    fn test_parse_feed_applies_corrections() {
        let feed = parse_feed(FEED, "2324", &NameCorrections::default()).unwrap();
        assert_eq!(feed.matches.len(), 3);
        assert_eq!(feed.skipped, 1);

        let first = &feed.matches[0];
        assert_eq!(first.home_team, "Olympiakos");
        assert_eq!(first.away_team, "Volos NFC");
        assert_eq!(first.result, FullTimeResult::HomeWin);
        assert_eq!((first.home_goals, first.away_goals), (3, 0));
        assert_eq!(first.draw_odds, Some(dec!(6.5)));
        assert_eq!(first.period, "2324");

        assert!(feed.matches[1].result.is_draw());
        assert_eq!(feed.matches[2].draw_odds, None);
    }

    #[test]
    fn test_both_date_formats() {
        assert_eq!(
            parse_feed_date("19/08/2023"),
            NaiveDate::from_ymd_opt(2023, 8, 19)
        );
        assert_eq!(
            parse_feed_date("19/08/19"),
            NaiveDate::from_ymd_opt(2019, 8, 19)
        );
        assert_eq!(parse_feed_date("2023-08-19"), None);
    }

    #[test]
    fn test_missing_required_column_is_data_error() {
        let err = parse_feed("Date,HomeTeam,AwayTeam\n01/01/20,A,B\n", "1920", &NameCorrections::empty())
            .unwrap_err();
        assert!(matches!(err, EngineError::Data(_)));
    }

    #[test]
    fn test_custom_corrections() {
        let corrections = NameCorrections::empty().with("Aris", "Aris Thessaloniki");
        let feed = parse_feed(FEED, "2324", &corrections).unwrap();
        assert_eq!(feed.matches[0].home_team, "Olympiacos Piraeus");
        assert_eq!(feed.matches[1].home_team, "Aris Thessaloniki");
    }

    #[tokio::test]
    async fn test_directory_source_skips_missing_periods() {
        let dir = tempfile::tempdir().unwrap();
        let season = dir.path().join("2324");
        std::fs::create_dir_all(&season).unwrap();
        std::fs::write(season.join("G1.csv"), FEED).unwrap();

        let source = CsvDirectorySource::new(dir.path());
        let periods = vec!["2223".to_string(), "2324".to_string()];
        let data = source.load(&greece(), &periods).await.unwrap();
        assert_eq!(data.len(), 3);
        assert!(data.iter().all(|m| m.period == "2324"));

        let nothing = source.load(&greece(), &["2122".to_string()]).await;
        assert!(matches!(nothing, Err(EngineError::Io(_))));
    }

    #[tokio::test]
    async fn test_synthetic_source_differs_per_country() {
        let source = SyntheticSource::default();
        let periods = vec!["2324".to_string()];
        let greece = source.load(&greece(), &periods).await.unwrap();
        let england = source
            .load(&Country::from_name("england").unwrap(), &periods)
            .await
            .unwrap();
        assert_eq!(greece.len(), england.len());
        assert_ne!(greece, england);
        assert_eq!(source.load_period(&Country::from_name("england").unwrap(), "2324").await.unwrap(), england);
    }
}
