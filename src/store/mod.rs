//! CSV persistence: team stat accumulators and the prediction ledger.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::env;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::models::{Accuracy, PredictionRecord, StandingsRow, TeamRecord};

pub const SEASONTYPE_REGULAR: u8 = 2;
pub const SEASONTYPE_POSTSEASON: u8 = 3;

pub fn history_path() -> PathBuf {
    env::var("HISTORY_FILE")
        .unwrap_or_else(|_| "data/prediction_history.csv".to_string())
        .into()
}

/// Finalized stats of the most recently completed season ("old" records).
pub fn base_stats_path() -> PathBuf {
    env::var("BASE_STATS_FILE")
        .unwrap_or_else(|_| "data/final_team_stats.csv".to_string())
        .into()
}

/// Accumulating stats of the in-progress season ("new" records).
pub fn current_stats_path() -> PathBuf {
    env::var("CURRENT_STATS_FILE")
        .unwrap_or_else(|_| "data/current_season_stats.csv".to_string())
        .into()
}

// ── team stats CSV ───────────────────────────────────────────────────────────

/// On-disk row shape. Column names predate this implementation and are kept
/// for compatibility with existing stat files.
#[derive(Debug, Serialize, Deserialize)]
struct TeamStatsRow {
    #[serde(rename = "Team_Abv")]
    team_abv: String,
    #[serde(rename = "Total_GamesPlayed")]
    games: f64,
    #[serde(rename = "Total_PassingYardsFor")]
    pass_yards_for: f64,
    #[serde(rename = "Total_PassingYardsAgainst")]
    pass_yards_against: f64,
    #[serde(rename = "Total_RushingYardsFor")]
    rush_yards_for: f64,
    #[serde(rename = "Total_RushingYardsAgainst")]
    rush_yards_against: f64,
    #[serde(rename = "Total_Takeaways")]
    takeaways: f64,
    #[serde(rename = "Total_Giveaways")]
    giveaways: f64,
    #[serde(rename = "Total_PointsFor")]
    points_for: f64,
    #[serde(rename = "Total_PointsAgainst")]
    points_against: f64,
    #[serde(rename = "Total_PassAttempts")]
    pass_attempts: f64,
    #[serde(rename = "Total_RushAttempts")]
    rush_attempts: f64,
}

impl From<&TeamStatsRow> for TeamRecord {
    fn from(row: &TeamStatsRow) -> Self {
        TeamRecord {
            pass_yards_for: row.pass_yards_for,
            pass_yards_against: row.pass_yards_against,
            rush_yards_for: row.rush_yards_for,
            rush_yards_against: row.rush_yards_against,
            takeaways: row.takeaways,
            giveaways: row.giveaways,
            points_for: row.points_for,
            points_against: row.points_against,
            pass_attempts: row.pass_attempts,
            rush_attempts: row.rush_attempts,
            games: row.games as u32,
        }
    }
}

fn stats_row(abv: &str, record: &TeamRecord) -> TeamStatsRow {
    TeamStatsRow {
        team_abv: abv.to_string(),
        games: record.games as f64,
        pass_yards_for: record.pass_yards_for,
        pass_yards_against: record.pass_yards_against,
        rush_yards_for: record.rush_yards_for,
        rush_yards_against: record.rush_yards_against,
        takeaways: record.takeaways,
        giveaways: record.giveaways,
        points_for: record.points_for,
        points_against: record.points_against,
        pass_attempts: record.pass_attempts,
        rush_attempts: record.rush_attempts,
    }
}

pub fn load_team_records(path: &Path) -> Result<HashMap<String, TeamRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening team stats file {}", path.display()))?;

    let mut records = HashMap::new();
    for row in reader.deserialize() {
        let row: TeamStatsRow =
            row.with_context(|| format!("parsing team stats row in {}", path.display()))?;
        records.insert(row.team_abv.clone(), TeamRecord::from(&row));
    }
    Ok(records)
}

/// Write all records, sorted by abbreviation so diffs stay stable.
pub fn save_team_records(path: &Path, records: &HashMap<String, TeamRecord>) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let sorted: BTreeMap<_, _> = records.iter().collect();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("writing team stats file {}", path.display()))?;
    for (abv, record) in sorted {
        writer.serialize(stats_row(abv, record))?;
    }
    writer.flush()?;
    Ok(())
}

// ── prediction ledger ────────────────────────────────────────────────────────

/// Append-only CSV ledger of predictions, de-duplicated by game id.
pub struct Ledger {
    path: PathBuf,
    rows: Vec<PredictionRecord>,
}

impl Ledger {
    /// A missing file is an empty ledger, not an error.
    pub fn load(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No prediction history at {}, starting empty", path.display());
            return Ok(Self {
                path,
                rows: Vec::new(),
            });
        }

        let mut reader = csv::Reader::from_path(&path)
            .with_context(|| format!("opening prediction history {}", path.display()))?;
        let mut rows = Vec::new();
        for row in reader.deserialize() {
            let row: PredictionRecord =
                row.with_context(|| format!("parsing prediction row in {}", path.display()))?;
            rows.push(row);
        }
        tracing::info!("Loaded {} prediction history rows", rows.len());
        Ok(Self { path, rows })
    }

    pub fn contains(&self, game_id: &str) -> bool {
        self.rows.iter().any(|r| r.game_id == game_id)
    }

    pub fn get(&self, game_id: &str) -> Option<&PredictionRecord> {
        self.rows.iter().find(|r| r.game_id == game_id)
    }

    /// Append one row to memory and disk. A game id already on the ledger is
    /// left untouched; the first recorded outcome stands.
    pub fn append(&mut self, record: PredictionRecord) -> Result<bool> {
        if self.contains(&record.game_id) {
            return Ok(false);
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let write_header = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("appending to {}", self.path.display()))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);
        writer.serialize(&record)?;
        writer.flush()?;

        self.rows.push(record);
        Ok(true)
    }

    pub fn rows_for_week(&self, year: i32, seasontype: u8, week: u32) -> Vec<&PredictionRecord> {
        self.rows
            .iter()
            .filter(|r| r.year == year && r.seasontype == seasontype && r.week == week)
            .collect()
    }

    /// Hit rate over rows whose outcome is known.
    pub fn accuracy(rows: &[&PredictionRecord]) -> Accuracy {
        let mut correct = 0;
        let mut total = 0;
        for row in rows {
            if row.actual_winner.is_some() {
                total += 1;
                if row.is_correct == Some(true) {
                    correct += 1;
                }
            }
        }
        let percentage = if total > 0 {
            correct as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        Accuracy {
            correct,
            total,
            percentage,
        }
    }

    /// Per-team actual vs predicted records over one season slice, sorted by
    /// actual wins.
    pub fn standings(&self, year: i32, seasontype: u8) -> Vec<StandingsRow> {
        let games: Vec<&PredictionRecord> = self
            .rows
            .iter()
            .filter(|r| {
                r.year == year
                    && r.seasontype == seasontype
                    && r.actual_winner.as_deref().is_some_and(|w| !w.is_empty())
            })
            .collect();

        let mut by_team: BTreeMap<String, StandingsRow> = BTreeMap::new();
        for game in &games {
            for (team, opponent) in [
                (&game.home_team, &game.away_team),
                (&game.away_team, &game.home_team),
            ] {
                let row = by_team.entry(team.clone()).or_insert_with(|| StandingsRow {
                    team: team.clone(),
                    ..Default::default()
                });

                match game.actual_winner.as_deref() {
                    Some(w) if w == team => row.actual_wins += 1,
                    Some(w) if w == opponent.as_str() => row.actual_losses += 1,
                    _ => row.actual_ties += 1,
                }
                if game.predicted_winner == *team {
                    row.predicted_wins += 1;
                } else if game.predicted_winner == *opponent {
                    row.predicted_losses += 1;
                }
            }
        }

        let mut rows: Vec<StandingsRow> = by_team.into_values().collect();
        for row in &mut rows {
            row.difference = row.actual_wins as i32 - row.predicted_wins as i32;
            row.actual_record = if row.actual_ties > 0 {
                format!("{}-{}-{}", row.actual_wins, row.actual_losses, row.actual_ties)
            } else {
                format!("{}-{}", row.actual_wins, row.actual_losses)
            };
            row.predicted_record = format!("{}-{}", row.predicted_wins, row.predicted_losses);
        }
        rows.sort_by(|a, b| {
            b.actual_wins
                .cmp(&a.actual_wins)
                .then_with(|| a.team.cmp(&b.team))
        });
        rows
    }
}
