use std::collections::HashMap;
use thiserror::Error;

use crate::models::{GameDelta, TeamRecord};
use crate::services::espn::{StatLine, SummaryResponse};

#[derive(Debug, Error, PartialEq)]
pub enum IngestError {
    #[error("boxscore lists {0} teams, expected exactly 2")]
    WrongTeamCount(usize),
    #[error("no record on file for team '{0}'")]
    UnknownTeam(String),
    #[error("no final score in game header for team '{0}'")]
    MissingScore(String),
    #[error("unparsable value '{raw}' for statistic '{name}'")]
    BadStatValue { name: String, raw: String },
}

/// The boxscore statistics the accumulator tracks, by upstream name.
/// Anything else in the statistics block is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatKey {
    NetPassingYards,
    RushingYards,
    Turnovers,
    RushingAttempts,
    CompletionAttempts,
}

impl StatKey {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "netPassingYards" => Some(Self::NetPassingYards),
            "rushingYards" => Some(Self::RushingYards),
            "turnovers" => Some(Self::Turnovers),
            "rushingAttempts" => Some(Self::RushingAttempts),
            "completionAttempts" => Some(Self::CompletionAttempts),
            _ => None,
        }
    }
}

/// One team's share of a parsed boxscore, before it is paired with the
/// opponent's to form the two deltas.
#[derive(Debug, Default)]
struct TeamBoxStats {
    abbreviation: String,
    net_passing_yards: f64,
    rushing_yards: f64,
    turnovers: f64,
    rushing_attempts: f64,
    pass_attempts: f64,
    points: f64,
}

/// Fold one completed game's boxscore into both participating teams'
/// records. Either both records are updated or neither: all parsing and
/// team lookups happen before the first mutation.
pub fn ingest(
    summary: &SummaryResponse,
    records: &mut HashMap<String, TeamRecord>,
) -> Result<(), IngestError> {
    let teams = &summary.boxscore.teams;
    if teams.len() != 2 {
        return Err(IngestError::WrongTeamCount(teams.len()));
    }

    let mut sides = Vec::with_capacity(2);
    for team in teams {
        let mut side = parse_team_stats(&team.team.abbreviation, &team.statistics)?;
        side.points = final_score(summary, &side.abbreviation)?;
        if !records.contains_key(&side.abbreviation) {
            return Err(IngestError::UnknownTeam(side.abbreviation));
        }
        sides.push(side);
    }

    let delta_a = delta_for(&sides[0], &sides[1]);
    let delta_b = delta_for(&sides[1], &sides[0]);

    if let Some(record) = records.get_mut(&sides[0].abbreviation) {
        record.record_game(&delta_a);
    }
    if let Some(record) = records.get_mut(&sides[1].abbreviation) {
        record.record_game(&delta_b);
    }
    Ok(())
}

/// A side's delta: its own production "for", the opponent's "against".
/// Takeaways are the opponent's giveaways; turnovers are symmetric.
fn delta_for(side: &TeamBoxStats, opponent: &TeamBoxStats) -> GameDelta {
    GameDelta {
        pass_yards_for: side.net_passing_yards,
        pass_yards_against: opponent.net_passing_yards,
        rush_yards_for: side.rushing_yards,
        rush_yards_against: opponent.rushing_yards,
        takeaways: opponent.turnovers,
        giveaways: side.turnovers,
        points_for: side.points,
        points_against: opponent.points,
        pass_attempts: side.pass_attempts,
        rush_attempts: side.rushing_attempts,
    }
}

fn parse_team_stats(abbreviation: &str, lines: &[StatLine]) -> Result<TeamBoxStats, IngestError> {
    let mut side = TeamBoxStats {
        abbreviation: abbreviation.to_string(),
        ..Default::default()
    };

    // A tracked stat absent from the block reads as zero; a tracked stat
    // present but unparsable is a hard failure.
    for line in lines {
        let key = match StatKey::from_name(&line.name) {
            Some(k) => k,
            None => continue,
        };
        match key {
            StatKey::NetPassingYards => side.net_passing_yards = numeric_value(line)?,
            StatKey::RushingYards => side.rushing_yards = numeric_value(line)?,
            StatKey::Turnovers => side.turnovers = numeric_value(line)?,
            StatKey::RushingAttempts => side.rushing_attempts = numeric_value(line)?,
            StatKey::CompletionAttempts => side.pass_attempts = attempts_value(line)?,
        }
    }
    Ok(side)
}

fn numeric_value(line: &StatLine) -> Result<f64, IngestError> {
    if let Some(v) = line.value {
        return Ok(v);
    }
    match &line.display_value {
        Some(raw) => raw.trim().parse().map_err(|_| IngestError::BadStatValue {
            name: line.name.clone(),
            raw: raw.clone(),
        }),
        None => Ok(0.0),
    }
}

/// Pass attempts are the denominator of a "completions/attempts" display
/// string, e.g. "24/38" -> 38.
fn attempts_value(line: &StatLine) -> Result<f64, IngestError> {
    let raw = match &line.display_value {
        Some(raw) => raw,
        None => return Ok(0.0),
    };
    raw.split('/')
        .nth(1)
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| IngestError::BadStatValue {
            name: line.name.clone(),
            raw: raw.clone(),
        })
}

fn final_score(summary: &SummaryResponse, abbreviation: &str) -> Result<f64, IngestError> {
    summary
        .header
        .competitions
        .first()
        .and_then(|c| {
            c.competitors
                .iter()
                .find(|comp| comp.team.abbreviation == abbreviation)
        })
        .and_then(|comp| comp.score.as_deref())
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| IngestError::MissingScore(abbreviation.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn summary(
        x_stats: serde_json::Value,
        y_stats: serde_json::Value,
        x_score: &str,
        y_score: &str,
    ) -> SummaryResponse {
        serde_json::from_value(json!({
            "header": {"competitions": [{"competitors": [
                {"homeAway": "home", "score": x_score, "team": {"abbreviation": "X"}},
                {"homeAway": "away", "score": y_score, "team": {"abbreviation": "Y"}}
            ]}]},
            "boxscore": {"teams": [
                {"team": {"abbreviation": "X"}, "statistics": x_stats},
                {"team": {"abbreviation": "Y"}, "statistics": y_stats}
            ]}
        }))
        .unwrap()
    }

    fn two_team_records() -> HashMap<String, TeamRecord> {
        let mut records = HashMap::new();
        records.insert("X".to_string(), TeamRecord::default());
        records.insert("Y".to_string(), TeamRecord::default());
        records
    }

    #[test]
    fn test_ingest_updates_both_teams() {
        let doc = summary(
            json!([
                {"name": "netPassingYards", "displayValue": "250"},
                {"name": "rushingYards", "displayValue": "100"},
                {"name": "turnovers", "displayValue": "1"},
                {"name": "rushingAttempts", "displayValue": "25"},
                {"name": "completionAttempts", "displayValue": "22/35"}
            ]),
            json!([
                {"name": "netPassingYards", "displayValue": "180"},
                {"name": "rushingYards", "displayValue": "140"},
                {"name": "turnovers", "displayValue": "2"},
                {"name": "rushingAttempts", "displayValue": "32"},
                {"name": "completionAttempts", "displayValue": "18/28"}
            ]),
            "24",
            "17",
        );

        let mut records = two_team_records();
        ingest(&doc, &mut records).unwrap();

        let x = &records["X"];
        assert_eq!(x.games, 1);
        assert_eq!(x.pass_yards_for, 250.0);
        assert_eq!(x.pass_yards_against, 180.0);
        assert_eq!(x.rush_yards_for, 100.0);
        assert_eq!(x.rush_yards_against, 140.0);
        assert_eq!(x.takeaways, 2.0);
        assert_eq!(x.giveaways, 1.0);
        assert_eq!(x.points_for, 24.0);
        assert_eq!(x.points_against, 17.0);
        assert_eq!(x.pass_attempts, 35.0);
        assert_eq!(x.rush_attempts, 25.0);

        let y = &records["Y"];
        assert_eq!(y.games, 1);
        assert_eq!(y.takeaways, 1.0);
        assert_eq!(y.giveaways, 2.0);
        assert_eq!(y.points_for, 17.0);
        assert_eq!(y.pass_attempts, 28.0);
    }

    #[test]
    fn test_missing_leaf_stat_reads_as_zero() {
        let doc = summary(
            json!([{"name": "netPassingYards", "displayValue": "250"}]),
            json!([]),
            "10",
            "3",
        );

        let mut records = two_team_records();
        ingest(&doc, &mut records).unwrap();
        assert_eq!(records["X"].rush_yards_for, 0.0);
        assert_eq!(records["Y"].pass_yards_for, 0.0);
        assert_eq!(records["Y"].games, 1);
    }

    #[test]
    fn test_unknown_team_leaves_no_partial_update() {
        let doc = summary(json!([]), json!([]), "10", "3");

        let mut records = HashMap::new();
        records.insert("X".to_string(), TeamRecord::default());

        let err = ingest(&doc, &mut records).unwrap_err();
        assert_eq!(err, IngestError::UnknownTeam("Y".to_string()));
        assert_eq!(records["X"].games, 0);
    }

    #[test]
    fn test_wrong_team_count_is_rejected() {
        let doc: SummaryResponse = serde_json::from_value(json!({
            "header": {"competitions": []},
            "boxscore": {"teams": [{"team": {"abbreviation": "X"}, "statistics": []}]}
        }))
        .unwrap();

        let mut records = two_team_records();
        let err = ingest(&doc, &mut records).unwrap_err();
        assert_eq!(err, IngestError::WrongTeamCount(1));
    }

    #[test]
    fn test_missing_score_is_rejected_before_any_update() {
        let doc: SummaryResponse = serde_json::from_value(json!({
            "header": {"competitions": [{"competitors": [
                {"homeAway": "home", "score": "24", "team": {"abbreviation": "X"}}
            ]}]},
            "boxscore": {"teams": [
                {"team": {"abbreviation": "X"}, "statistics": []},
                {"team": {"abbreviation": "Y"}, "statistics": []}
            ]}
        }))
        .unwrap();

        let mut records = two_team_records();
        let err = ingest(&doc, &mut records).unwrap_err();
        assert_eq!(err, IngestError::MissingScore("Y".to_string()));
        assert_eq!(records["X"].games, 0);
        assert_eq!(records["Y"].games, 0);
    }

    #[test]
    fn test_bad_stat_value_fails_loudly() {
        let doc = summary(
            json!([{"name": "turnovers", "displayValue": "n/a"}]),
            json!([]),
            "10",
            "3",
        );

        let mut records = two_team_records();
        let err = ingest(&doc, &mut records).unwrap_err();
        assert!(matches!(err, IngestError::BadStatValue { .. }));
        assert_eq!(records["X"].games, 0);
    }
}
