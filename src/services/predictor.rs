use rand::Rng;
use std::collections::HashMap;
use thiserror::Error;

use crate::config::ModelConfig;
use crate::models::TeamRecord;
use crate::services::aggregator::{expected_stat, pythagorean_win, weighted_stat};

#[derive(Debug, Error, PartialEq)]
pub enum PredictError {
    #[error("unknown team abbreviation '{0}'")]
    UnknownTeam(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchupPrediction {
    pub winner: String,
    pub home_win_prob: f64,
    pub away_win_prob: f64,
}

/// Season-blended, opponent-facing averages for one side of a matchup.
#[derive(Debug, Clone, Copy)]
struct WeightedSide {
    pass_yards_for: f64,
    pass_yards_against: f64,
    rush_yards_for: f64,
    rush_yards_against: f64,
    takeaways: f64,
    giveaways: f64,
    points_for: f64,
    points_against: f64,
    pass_tendency: f64,
}

/// Expected value per stat category for one side, after boosts and the
/// home-field bonus. Never persisted; rebuilt on every prediction.
#[derive(Debug, Clone, Copy)]
struct ExpectedStats {
    pass_yards: f64,
    rush_yards: f64,
    takeaways: f64,
    points: f64,
}

pub struct MatchupPredictor {
    config: ModelConfig,
}

impl MatchupPredictor {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Predict the winner of home vs away for a given week.
    ///
    /// `old` holds frozen prior-season records, `new` the accumulating
    /// current-season ones; both must contain both abbreviations. The random
    /// source is only consulted on an exact probability tie.
    pub fn predict<R: Rng>(
        &self,
        home_abv: &str,
        away_abv: &str,
        old: &HashMap<String, TeamRecord>,
        new: &HashMap<String, TeamRecord>,
        week: u32,
        rng: &mut R,
    ) -> Result<MatchupPrediction, PredictError> {
        let mut home = self.weighted_side(
            lookup(old, home_abv)?,
            lookup(new, home_abv)?,
            week,
        );
        let mut away = self.weighted_side(
            lookup(old, away_abv)?,
            lookup(new, away_abv)?,
            week,
        );

        self.apply_matchup_boosts(&mut home, &away);
        self.apply_matchup_boosts(&mut away, &home);

        let home_expected = expected_vs(&home, &away);
        let away_expected = expected_vs(&away, &home);

        // Home team only, exactly once.
        let home_expected = ExpectedStats {
            points: home_expected.points + self.config.home_field_points,
            ..home_expected
        };

        let home_win_prob = self.aggregate_win_prob(&home_expected, &away_expected);
        let away_win_prob = 1.0 - home_win_prob;

        let winner = if home_win_prob > away_win_prob {
            home_abv
        } else if away_win_prob > home_win_prob {
            away_abv
        } else if rng.random_bool(0.5) {
            home_abv
        } else {
            away_abv
        };

        Ok(MatchupPrediction {
            winner: winner.to_string(),
            home_win_prob,
            away_win_prob,
        })
    }

    fn weighted_side(&self, old: &TeamRecord, new: &TeamRecord, week: u32) -> WeightedSide {
        let cfg = &self.config;
        let old_avg = old.averages();
        let new_avg = new.averages();

        // Play-calling tendency comes from the current season only; with no
        // attempts on record there is no information either way.
        let attempts = new_avg.pass_attempts + new_avg.rush_attempts;
        let pass_tendency = if attempts == 0.0 {
            0.5
        } else {
            new_avg.pass_attempts / attempts
        };

        WeightedSide {
            pass_yards_for: weighted_stat(cfg, old_avg.pass_yards_for, new_avg.pass_yards_for, week),
            pass_yards_against: weighted_stat(
                cfg,
                old_avg.pass_yards_against,
                new_avg.pass_yards_against,
                week,
            ),
            rush_yards_for: weighted_stat(cfg, old_avg.rush_yards_for, new_avg.rush_yards_for, week),
            rush_yards_against: weighted_stat(
                cfg,
                old_avg.rush_yards_against,
                new_avg.rush_yards_against,
                week,
            ),
            takeaways: weighted_stat(cfg, old_avg.takeaways, new_avg.takeaways, week),
            giveaways: weighted_stat(cfg, old_avg.giveaways, new_avg.giveaways, week),
            points_for: weighted_stat(cfg, old_avg.points_for, new_avg.points_for, week),
            points_against: weighted_stat(cfg, old_avg.points_against, new_avg.points_against, week),
            pass_tendency,
        }
    }

    /// Boost a side's expected yardage where its play-calling strength meets
    /// a leaky opposing defense.
    fn apply_matchup_boosts(&self, side: &mut WeightedSide, opponent: &WeightedSide) {
        let cfg = &self.config;
        if side.pass_tendency > cfg.pass_heavy_threshold
            && opponent.pass_yards_against > cfg.leaky_pass_defense_yards
        {
            side.pass_yards_for *= cfg.matchup_boost;
        }
        if side.pass_tendency < cfg.run_heavy_threshold
            && opponent.rush_yards_against > cfg.leaky_rush_defense_yards
        {
            side.rush_yards_for *= cfg.matchup_boost;
        }
    }

    /// Mean of the four per-category Pythagorean expectations for `us`;
    /// the opponent's aggregate is defined as the complement.
    fn aggregate_win_prob(&self, us: &ExpectedStats, them: &ExpectedStats) -> f64 {
        let cfg = &self.config;
        let total = pythagorean_win(cfg, us.pass_yards, them.pass_yards)
            + pythagorean_win(cfg, us.rush_yards, them.rush_yards)
            + pythagorean_win(cfg, us.takeaways, them.takeaways)
            + pythagorean_win(cfg, us.points, them.points);
        total / 4.0
    }
}

/// Pair one side's offense against the opponent's defense per category.
/// Turnovers pair our takeaways against the balls the opponent gives away.
fn expected_vs(side: &WeightedSide, opponent: &WeightedSide) -> ExpectedStats {
    ExpectedStats {
        pass_yards: expected_stat(side.pass_yards_for, opponent.pass_yards_against),
        rush_yards: expected_stat(side.rush_yards_for, opponent.rush_yards_against),
        takeaways: expected_stat(side.takeaways, opponent.giveaways),
        points: expected_stat(side.points_for, opponent.points_against),
    }
}

fn lookup<'a>(
    records: &'a HashMap<String, TeamRecord>,
    abv: &str,
) -> Result<&'a TeamRecord, PredictError> {
    records
        .get(abv)
        .ok_or_else(|| PredictError::UnknownTeam(abv.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn maps(
        pairs: &[(&str, TeamRecord, TeamRecord)],
    ) -> (HashMap<String, TeamRecord>, HashMap<String, TeamRecord>) {
        let mut old = HashMap::new();
        let mut new = HashMap::new();
        for (abv, o, n) in pairs {
            old.insert(abv.to_string(), o.clone());
            new.insert(abv.to_string(), n.clone());
        }
        (old, new)
    }

    fn points_record(points_for: f64, points_against: f64) -> TeamRecord {
        TeamRecord {
            points_for,
            points_against,
            games: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_stronger_team_at_home_is_favored() {
        let (old, new) = maps(&[
            (
                "BAL",
                points_record(24.0, 20.0),
                points_record(28.0, 18.0),
            ),
            (
                "CLE",
                points_record(20.0, 24.0),
                points_record(17.0, 25.0),
            ),
        ]);

        let cfg = ModelConfig::default();
        let predictor = MatchupPredictor::new(cfg.clone());
        let mut rng = StdRng::seed_from_u64(7);
        let p = predictor
            .predict("BAL", "CLE", &old, &new, 9, &mut rng)
            .unwrap();

        // The blended points-for category already favors the home team
        // before the home-field bonus is applied.
        let home_points = weighted_stat(&cfg, 24.0, 28.0, 9);
        let away_points = weighted_stat(&cfg, 20.0, 17.0, 9);
        assert!(home_points > away_points);

        assert_eq!(p.winner, "BAL");
        assert!(p.home_win_prob > 0.5);
        assert!((p.home_win_prob + p.away_win_prob - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_identical_teams_no_home_bonus_split_evenly() {
        let team = TeamRecord {
            pass_yards_for: 240.0,
            pass_yards_against: 220.0,
            rush_yards_for: 110.0,
            rush_yards_against: 115.0,
            takeaways: 1.5,
            giveaways: 1.2,
            points_for: 23.0,
            points_against: 21.0,
            pass_attempts: 33.0,
            rush_attempts: 27.0,
            games: 1,
        };
        let (old, new) = maps(&[
            ("SF", team.clone(), team.clone()),
            ("SEA", team.clone(), team.clone()),
        ]);

        let cfg = ModelConfig {
            home_field_points: 0.0,
            ..ModelConfig::default()
        };
        let predictor = MatchupPredictor::new(cfg);
        let mut rng = StdRng::seed_from_u64(42);
        let p = predictor
            .predict("SF", "SEA", &old, &new, 5, &mut rng)
            .unwrap();

        assert!((p.home_win_prob - 0.5).abs() < 1e-12);
        assert!(p.winner == "SF" || p.winner == "SEA");

        // Same seed, same coin flip.
        let mut rng2 = StdRng::seed_from_u64(42);
        let p2 = predictor
            .predict("SF", "SEA", &old, &new, 5, &mut rng2)
            .unwrap();
        assert_eq!(p.winner, p2.winner);
    }

    #[test]
    fn test_home_field_bonus_breaks_symmetry() {
        let team = points_record(21.0, 21.0);
        let (old, new) = maps(&[
            ("KC", team.clone(), team.clone()),
            ("DEN", team.clone(), team.clone()),
        ]);

        let predictor = MatchupPredictor::new(ModelConfig::default());
        let mut rng = StdRng::seed_from_u64(0);
        let p = predictor
            .predict("KC", "DEN", &old, &new, 5, &mut rng)
            .unwrap();

        assert_eq!(p.winner, "KC");
        assert!(p.home_win_prob > 0.5);
    }

    #[test]
    fn test_unknown_team_fails_fast() {
        let (old, new) = maps(&[("NE", points_record(20.0, 20.0), points_record(20.0, 20.0))]);
        let predictor = MatchupPredictor::new(ModelConfig::default());
        let mut rng = StdRng::seed_from_u64(0);

        let err = predictor
            .predict("NE", "XYZ", &old, &new, 3, &mut rng)
            .unwrap_err();
        assert_eq!(err, PredictError::UnknownTeam("XYZ".to_string()));
    }

    #[test]
    fn test_pass_heavy_offense_boosted_against_leaky_defense() {
        // Home is pass-heavy against a leaky pass defense; away is run-heavy
        // but meets a stout run defense. Stat lines are otherwise symmetric,
        // so only the home boost can move the matchup off 0.5.
        let home = TeamRecord {
            pass_yards_for: 250.0,
            pass_yards_against: 250.0,
            rush_yards_for: 110.0,
            rush_yards_against: 100.0,
            takeaways: 1.0,
            giveaways: 1.0,
            points_for: 22.0,
            points_against: 22.0,
            pass_attempts: 40.0,
            rush_attempts: 20.0,
            games: 1,
        };
        let away = TeamRecord {
            pass_attempts: 20.0,
            rush_attempts: 40.0,
            ..home.clone()
        };
        let (old, new) = maps(&[
            ("MIA", home.clone(), home),
            ("NYJ", away.clone(), away),
        ]);

        let boosted = MatchupPredictor::new(ModelConfig {
            home_field_points: 0.0,
            ..ModelConfig::default()
        });
        let flat = MatchupPredictor::new(ModelConfig {
            home_field_points: 0.0,
            matchup_boost: 1.0,
            ..ModelConfig::default()
        });

        let mut rng = StdRng::seed_from_u64(1);
        let without = flat.predict("MIA", "NYJ", &old, &new, 8, &mut rng).unwrap();
        let with = boosted.predict("MIA", "NYJ", &old, &new, 8, &mut rng).unwrap();

        assert!((without.home_win_prob - 0.5).abs() < 1e-12);
        assert!(with.home_win_prob > 0.5);
    }
}
