use std::env;

/// Tunable constants of the prediction model.
///
/// The exponent and season-blend cap have shifted over the model's history,
/// so they are configuration rather than hard-wired literals. Defaults match
/// the current production values; any field can be overridden through the
/// environment (see [`ModelConfig::from_env`]).
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Pythagorean exponent applied to each stat category.
    pub exponent: f64,
    /// Upper bound on the current-season share of the old/new blend.
    pub weight_cap: f64,
    /// Fixed point bonus added to the home team's expected points.
    pub home_field_points: f64,
    /// Pass share above which an offense counts as pass-heavy.
    pub pass_heavy_threshold: f64,
    /// Weighted pass yards allowed above which a defense counts as leaky.
    pub leaky_pass_defense_yards: f64,
    /// Pass share below which an offense counts as run-heavy.
    pub run_heavy_threshold: f64,
    /// Weighted rush yards allowed above which a defense counts as leaky.
    pub leaky_rush_defense_yards: f64,
    /// Multiplier applied to expected yards when a strength meets a leak.
    pub matchup_boost: f64,
    /// Regular-season length; postseason rounds are numbered past this.
    pub regular_season_weeks: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            exponent: 2.37,
            weight_cap: 0.85,
            home_field_points: 2.5,
            pass_heavy_threshold: 0.55,
            leaky_pass_defense_yards: 235.0,
            run_heavy_threshold: 0.45,
            leaky_rush_defense_yards: 125.0,
            matchup_boost: 1.05,
            regular_season_weeks: 18,
        }
    }
}

impl ModelConfig {
    /// Defaults overridden by environment variables where set.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(v) = env_f64("PYTH_EXPONENT") {
            cfg.exponent = v;
        }
        if let Some(v) = env_f64("STAT_WEIGHT_CAP") {
            cfg.weight_cap = v;
        }
        if let Some(v) = env_f64("HOME_FIELD_POINTS") {
            cfg.home_field_points = v;
        }
        if let Some(v) = env_f64("PASS_HEAVY_THRESHOLD") {
            cfg.pass_heavy_threshold = v;
        }
        if let Some(v) = env_f64("LEAKY_PASS_DEFENSE_YARDS") {
            cfg.leaky_pass_defense_yards = v;
        }
        if let Some(v) = env_f64("RUN_HEAVY_THRESHOLD") {
            cfg.run_heavy_threshold = v;
        }
        if let Some(v) = env_f64("LEAKY_RUSH_DEFENSE_YARDS") {
            cfg.leaky_rush_defense_yards = v;
        }
        if let Some(v) = env_f64("MATCHUP_BOOST") {
            cfg.matchup_boost = v;
        }
        if let Some(v) = env_u32("REGULAR_SEASON_WEEKS") {
            cfg.regular_season_weeks = v;
        }
        cfg
    }

    /// Week number used for stat weighting: regular-season weeks pass
    /// through, postseason rounds land past the regular-season length so
    /// playoff predictions lean almost entirely on current-season stats.
    pub fn prediction_week(&self, seasontype: u8, week: u32) -> u32 {
        if seasontype == crate::store::SEASONTYPE_POSTSEASON {
            self.regular_season_weeks + week
        } else {
            week
        }
    }
}

fn env_f64(key: &str) -> Option<f64> {
    let raw = env::var(key).ok()?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring non-numeric {}='{}'", key, raw);
            None
        }
    }
}

fn env_u32(key: &str) -> Option<u32> {
    let raw = env::var(key).ok()?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring non-numeric {}='{}'", key, raw);
            None
        }
    }
}
