use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;

const DEFAULT_BASE_URL: &str = "https://site.api.espn.com/apis/site/v2/sports/football/nfl";

// ── scoreboard structures ────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ScoreboardResponse {
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Debug, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub competitions: Vec<Competition>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventStatus {
    #[serde(rename = "type", default)]
    pub kind: StatusType,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusType {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct Competition {
    #[serde(default)]
    pub competitors: Vec<Competitor>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competitor {
    #[serde(default)]
    pub home_away: String,
    #[serde(default)]
    pub winner: Option<bool>,
    #[serde(default)]
    pub score: Option<String>,
    pub team: TeamRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamRef {
    #[serde(default)]
    pub abbreviation: String,
}

impl Event {
    /// The (home, away) competitor pair of the first competition, when both
    /// sides are present.
    pub fn competitors(&self) -> Option<(&Competitor, &Competitor)> {
        let competition = self.competitions.first()?;
        let home = competition
            .competitors
            .iter()
            .find(|c| c.home_away == "home")?;
        let away = competition
            .competitors
            .iter()
            .find(|c| c.home_away == "away")?;
        Some((home, away))
    }

    pub fn is_final(&self) -> bool {
        self.status.kind.completed || self.status.kind.name == "STATUS_FINAL"
    }
}

// ── game summary structures ──────────────────────────────────────────────────

/// Boxscore/summary document for one game. `header` and `boxscore` are
/// required: a document without them cannot be ingested at all.
#[derive(Debug, Deserialize)]
pub struct SummaryResponse {
    pub header: SummaryHeader,
    pub boxscore: Boxscore,
}

#[derive(Debug, Deserialize)]
pub struct SummaryHeader {
    #[serde(default)]
    pub competitions: Vec<Competition>,
}

#[derive(Debug, Deserialize)]
pub struct Boxscore {
    #[serde(default)]
    pub teams: Vec<BoxscoreTeam>,
}

#[derive(Debug, Deserialize)]
pub struct BoxscoreTeam {
    pub team: TeamRef,
    #[serde(default)]
    pub statistics: Vec<StatLine>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatLine {
    pub name: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub display_value: Option<String>,
}

// ── teams endpoint structures (logos) ────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TeamsResponse {
    #[serde(default)]
    sports: Vec<SportEntry>,
}

#[derive(Debug, Deserialize)]
struct SportEntry {
    #[serde(default)]
    leagues: Vec<LeagueEntry>,
}

#[derive(Debug, Deserialize)]
struct LeagueEntry {
    #[serde(default)]
    teams: Vec<TeamEntry>,
}

#[derive(Debug, Deserialize)]
struct TeamEntry {
    team: TeamDetails,
}

#[derive(Debug, Deserialize)]
struct TeamDetails {
    #[serde(default)]
    abbreviation: Option<String>,
    #[serde(default)]
    logos: Vec<Logo>,
}

#[derive(Debug, Deserialize)]
struct Logo {
    href: String,
}

// ── EspnClient ───────────────────────────────────────────────────────────────

pub struct EspnClient {
    client: Client,
    base_url: String,
}

impl EspnClient {
    pub fn new() -> Self {
        let base_url = env::var("ESPN_API_BASE").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::with_base_url(base_url)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T> {
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("ESPN API error {} for {}: {}", status, url, body));
        }

        Ok(response.json().await?)
    }

    /// Full schedule for one week of a season segment.
    pub async fn weekly_schedule(
        &self,
        year: i32,
        seasontype: u8,
        week: u32,
    ) -> Result<ScoreboardResponse> {
        let url = format!(
            "{}/scoreboard?limit=1000&seasontype={}&dates={}&week={}",
            self.base_url, seasontype, year, week
        );
        tracing::debug!("Fetching schedule: {}", url);
        self.get_json(url).await
    }

    /// Boxscore/summary for a specific game id.
    pub async fn game_summary(&self, game_id: &str) -> Result<SummaryResponse> {
        let url = format!("{}/summary?event={}", self.base_url, game_id);
        tracing::debug!("Fetching boxscore: {}", url);
        self.get_json(url).await
    }

    /// Logo URL per team abbreviation from the all-teams endpoint.
    pub async fn team_logos(&self) -> Result<HashMap<String, String>> {
        let url = format!("{}/teams", self.base_url);
        let data: TeamsResponse = self.get_json(url).await?;

        let mut logos = HashMap::new();
        for sport in data.sports {
            for league in sport.leagues {
                for entry in league.teams {
                    let abv = match entry.team.abbreviation {
                        Some(a) => a,
                        None => continue,
                    };
                    if let Some(logo) = entry.team.logos.first() {
                        logos.insert(abv, logo.href.clone());
                    }
                }
            }
        }
        Ok(logos)
    }
}

impl Default for EspnClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_weekly_schedule_parses_events() {
        let server = MockServer::start().await;
        let body = json!({
            "events": [{
                "id": "401547401",
                "date": "2024-09-08T17:00Z",
                "name": "Buffalo Bills at Baltimore Ravens",
                "status": {"type": {"name": "STATUS_FINAL", "detail": "Final", "completed": true}},
                "competitions": [{
                    "competitors": [
                        {"homeAway": "home", "winner": true, "score": "27", "team": {"abbreviation": "BAL"}},
                        {"homeAway": "away", "winner": false, "score": "24", "team": {"abbreviation": "BUF"}}
                    ]
                }]
            }]
        });

        Mock::given(method("GET"))
            .and(path("/scoreboard"))
            .and(query_param("seasontype", "2"))
            .and(query_param("week", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = EspnClient::with_base_url(server.uri());
        let schedule = client.weekly_schedule(2024, 2, 1).await.unwrap();

        assert_eq!(schedule.events.len(), 1);
        let event = &schedule.events[0];
        assert!(event.is_final());

        let (home, away) = event.competitors().unwrap();
        assert_eq!(home.team.abbreviation, "BAL");
        assert_eq!(home.winner, Some(true));
        assert_eq!(away.team.abbreviation, "BUF");
        assert_eq!(away.score.as_deref(), Some("24"));
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/scoreboard"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let client = EspnClient::with_base_url(server.uri());
        let err = client.weekly_schedule(2024, 2, 1).await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_team_logos_indexed_by_abbreviation() {
        let server = MockServer::start().await;
        let body = json!({
            "sports": [{"leagues": [{"teams": [
                {"team": {"abbreviation": "KC", "logos": [{"href": "https://cdn.example/kc.png"}]}},
                {"team": {"abbreviation": "DET", "logos": []}}
            ]}]}]
        });

        Mock::given(method("GET"))
            .and(path("/teams"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = EspnClient::with_base_url(server.uri());
        let logos = client.team_logos().await.unwrap();

        assert_eq!(logos.get("KC").map(String::as_str), Some("https://cdn.example/kc.png"));
        assert!(!logos.contains_key("DET"));
    }

    #[test]
    fn test_missing_competitors_yields_none() {
        let event = Event {
            id: "1".to_string(),
            date: String::new(),
            name: String::new(),
            status: EventStatus::default(),
            competitions: vec![Competition {
                competitors: vec![],
            }],
        };
        assert!(event.competitors().is_none());
    }
}
