use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cumulative statistics for one team over one tracked season.
///
/// Counters only ever grow through [`TeamRecord::record_game`]; averages are
/// derived on read so a freshly created record reads 0.0 everywhere instead
/// of dividing by zero. Two records typically coexist per team: a frozen
/// prior-season snapshot and an accumulating current-season one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub pass_yards_for: f64,
    pub pass_yards_against: f64,
    pub rush_yards_for: f64,
    pub rush_yards_against: f64,
    pub takeaways: f64,
    pub giveaways: f64,
    pub points_for: f64,
    pub points_against: f64,
    pub pass_attempts: f64,
    pub rush_attempts: f64,
    pub games: u32,
}

/// One completed game's raw (non-averaged) contribution to a [`TeamRecord`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameDelta {
    pub pass_yards_for: f64,
    pub pass_yards_against: f64,
    pub rush_yards_for: f64,
    pub rush_yards_against: f64,
    pub takeaways: f64,
    pub giveaways: f64,
    pub points_for: f64,
    pub points_against: f64,
    pub pass_attempts: f64,
    pub rush_attempts: f64,
}

/// Per-game averages derived from a [`TeamRecord`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TeamAverages {
    pub pass_yards_for: f64,
    pub pass_yards_against: f64,
    pub rush_yards_for: f64,
    pub rush_yards_against: f64,
    pub takeaways: f64,
    pub giveaways: f64,
    pub points_for: f64,
    pub points_against: f64,
    pub pass_attempts: f64,
    pub rush_attempts: f64,
}

/// Identifies one cumulative counter on a [`TeamRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    PassYardsFor,
    PassYardsAgainst,
    RushYardsFor,
    RushYardsAgainst,
    Takeaways,
    Giveaways,
    PointsFor,
    PointsAgainst,
    PassAttempts,
    RushAttempts,
}

impl TeamRecord {
    /// Fold one completed game into the cumulative counters. Every counter
    /// and the game count move together; there is no partial update.
    pub fn record_game(&mut self, delta: &GameDelta) {
        self.pass_yards_for += delta.pass_yards_for;
        self.pass_yards_against += delta.pass_yards_against;
        self.rush_yards_for += delta.rush_yards_for;
        self.rush_yards_against += delta.rush_yards_against;
        self.takeaways += delta.takeaways;
        self.giveaways += delta.giveaways;
        self.points_for += delta.points_for;
        self.points_against += delta.points_against;
        self.pass_attempts += delta.pass_attempts;
        self.rush_attempts += delta.rush_attempts;
        self.games += 1;
    }

    fn total(&self, stat: Stat) -> f64 {
        match stat {
            Stat::PassYardsFor => self.pass_yards_for,
            Stat::PassYardsAgainst => self.pass_yards_against,
            Stat::RushYardsFor => self.rush_yards_for,
            Stat::RushYardsAgainst => self.rush_yards_against,
            Stat::Takeaways => self.takeaways,
            Stat::Giveaways => self.giveaways,
            Stat::PointsFor => self.points_for,
            Stat::PointsAgainst => self.points_against,
            Stat::PassAttempts => self.pass_attempts,
            Stat::RushAttempts => self.rush_attempts,
        }
    }

    /// Per-game average for one counter; 0.0 when no games are recorded.
    pub fn average(&self, stat: Stat) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.total(stat) / self.games as f64
        }
    }

    /// All per-game averages at once.
    pub fn averages(&self) -> TeamAverages {
        TeamAverages {
            pass_yards_for: self.average(Stat::PassYardsFor),
            pass_yards_against: self.average(Stat::PassYardsAgainst),
            rush_yards_for: self.average(Stat::RushYardsFor),
            rush_yards_against: self.average(Stat::RushYardsAgainst),
            takeaways: self.average(Stat::Takeaways),
            giveaways: self.average(Stat::Giveaways),
            points_for: self.average(Stat::PointsFor),
            points_against: self.average(Stat::PointsAgainst),
            pass_attempts: self.average(Stat::PassAttempts),
            rush_attempts: self.average(Stat::RushAttempts),
        }
    }
}

/// One entry of the prediction history ledger, keyed uniquely by `game_id`.
///
/// `actual_winner` and `is_correct` stay empty until the game reaches a
/// final state; once written the row is never overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub year: i32,
    pub seasontype: u8,
    pub week: u32,
    pub game_id: String,
    pub home_team: String,
    pub away_team: String,
    pub predicted_winner: String,
    pub actual_winner: Option<String>,
    pub home_win_prob: f64,
    pub away_win_prob: f64,
    pub is_correct: Option<bool>,
}

// ── API view types ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct SideView {
    pub abbreviation: String,
    pub logo: String,
    pub score: String,
    pub win_probability: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameView {
    pub id: String,
    pub date: String,
    pub name: String,
    pub status: String,
    pub home_team: SideView,
    pub away_team: SideView,
    pub predicted_winner: Option<String>,
    pub actual_winner: Option<String>,
    pub is_correct: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Accuracy {
    pub correct: u32,
    pub total: u32,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekPredictions {
    pub games: Vec<GameView>,
    pub accuracy: Accuracy,
}

/// Actual vs predicted record for one team over a season slice.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct StandingsRow {
    pub team: String,
    pub actual_wins: u32,
    pub actual_losses: u32,
    pub actual_ties: u32,
    pub predicted_wins: u32,
    pub predicted_losses: u32,
    /// actual wins minus predicted wins
    pub difference: i32,
    pub actual_record: String,
    pub predicted_record: String,
}

// API Response envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_delta(x: f64) -> GameDelta {
        GameDelta {
            pass_yards_for: x,
            pass_yards_against: x,
            rush_yards_for: x,
            rush_yards_against: x,
            takeaways: x,
            giveaways: x,
            points_for: x,
            points_against: x,
            pass_attempts: x,
            rush_attempts: x,
        }
    }

    const ALL_STATS: [Stat; 10] = [
        Stat::PassYardsFor,
        Stat::PassYardsAgainst,
        Stat::RushYardsFor,
        Stat::RushYardsAgainst,
        Stat::Takeaways,
        Stat::Giveaways,
        Stat::PointsFor,
        Stat::PointsAgainst,
        Stat::PassAttempts,
        Stat::RushAttempts,
    ];

    #[test]
    fn test_zero_games_every_average_is_zero() {
        let record = TeamRecord::default();
        for stat in ALL_STATS {
            assert_eq!(record.average(stat), 0.0);
        }
    }

    #[test]
    fn test_single_game_average_equals_delta() {
        let mut record = TeamRecord::default();
        record.record_game(&uniform_delta(42.0));
        assert_eq!(record.games, 1);
        for stat in ALL_STATS {
            assert_eq!(record.average(stat), 42.0);
        }
    }

    #[test]
    fn test_averages_divide_by_game_count() {
        let mut record = TeamRecord::default();
        record.record_game(&uniform_delta(10.0));
        record.record_game(&uniform_delta(30.0));
        assert_eq!(record.games, 2);
        assert_eq!(record.average(Stat::PassYardsFor), 20.0);
        assert_eq!(record.averages().points_against, 20.0);
    }
}
