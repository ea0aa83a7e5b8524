//! Pure stat-blending functions underneath the matchup predictor.

use crate::config::ModelConfig;

/// Pythagorean win expectation: `for^k / (for^k + against^k)`.
///
/// A zero denominator means neither side brings any signal, which reads as a
/// coin flip rather than a division error.
pub fn pythagorean_win(cfg: &ModelConfig, stat_for: f64, stat_against: f64) -> f64 {
    let numerator = stat_for.powf(cfg.exponent);
    let denominator = numerator + stat_against.powf(cfg.exponent);
    if denominator == 0.0 {
        0.5
    } else {
        numerator / denominator
    }
}

/// Expected outcome of a stat category when an offense meets a defense:
/// the plain mean of the offensive and the opposing defensive average.
pub fn expected_stat(offense_avg: f64, defense_avg: f64) -> f64 {
    (offense_avg + defense_avg) / 2.0
}

/// Blend a prior-season average with a current-season average.
///
/// Week 1 (or an empty current season) carries the prior season over
/// unchanged so a real signal is not diluted with zeros. From week 2 on the
/// current-season share grows linearly, capped so the prior season always
/// retains some influence.
pub fn weighted_stat(cfg: &ModelConfig, old_avg: f64, new_avg: f64, week: u32) -> f64 {
    if week <= 1 || new_avg == 0.0 {
        return old_avg;
    }
    let new_weight = (((week - 1) as f64) / 17.0).min(cfg.weight_cap);
    old_avg * (1.0 - new_weight) + new_avg * new_weight
}
