use anyhow::Result;
use std::collections::HashMap;

use crate::config::ModelConfig;
use crate::models::{PredictionRecord, TeamRecord};
use crate::services::{ingestor, EspnClient, MatchupPredictor};
use crate::store::{self, Ledger, SEASONTYPE_POSTSEASON, SEASONTYPE_REGULAR};

/// Print one week's predictions without touching the ledger.
pub async fn predict_week(year: i32, seasontype: u8, week: u32) -> Result<()> {
    let espn = EspnClient::new();
    let predictor = MatchupPredictor::new(ModelConfig::from_env());

    let old = store::load_team_records(&store::base_stats_path())?;
    let new = store::load_team_records(&store::current_stats_path())
        .unwrap_or_else(|_| zeroed_records(&old));

    println!("🏈 Predictions for {} ST{} week {}:\n", year, seasontype, week);

    let schedule = espn.weekly_schedule(year, seasontype, week).await?;
    if schedule.events.is_empty() {
        println!("📭 No games scheduled.");
        return Ok(());
    }

    let prediction_week = predictor.config().prediction_week(seasontype, week);
    for event in &schedule.events {
        let Some((home, away)) = event.competitors() else {
            continue;
        };
        let prediction = predictor.predict(
            &home.team.abbreviation,
            &away.team.abbreviation,
            &old,
            &new,
            prediction_week,
            &mut rand::rng(),
        )?;

        println!(
            "{} {:.2}% | {} {:.2}% → {}",
            home.team.abbreviation,
            prediction.home_win_prob * 100.0,
            away.team.abbreviation,
            prediction.away_win_prob * 100.0,
            prediction.winner
        );
    }

    Ok(())
}

/// Rebuild the prediction ledger by replaying past seasons in order.
///
/// For each season: predict every game with the records as they stood at
/// that point, record outcomes of completed games, fold their boxscores
/// into the running records, then roll the finished season into the "old"
/// slot before starting the next.
pub async fn backfill(from_year: i32, to_year: i32) -> Result<()> {
    let espn = EspnClient::new();
    let predictor = MatchupPredictor::new(ModelConfig::from_env());
    let mut ledger = Ledger::load(store::history_path())?;

    let mut old = store::load_team_records(&store::base_stats_path())?;
    let mut new = zeroed_records(&old);

    for year in from_year..=to_year {
        println!("📅 Processing year {}...", year);

        for seasontype in [SEASONTYPE_REGULAR, SEASONTYPE_POSTSEASON] {
            let max_week = if seasontype == SEASONTYPE_REGULAR { 18 } else { 5 };

            'weeks: for week in 1..=max_week {
                // Round 4 of the postseason is the Pro Bowl.
                if seasontype == SEASONTYPE_POSTSEASON && week == 4 {
                    continue;
                }

                let schedule = match espn.weekly_schedule(year, seasontype, week).await {
                    Ok(s) => s,
                    Err(e) => {
                        tracing::warn!("Schedule fetch failed for {} ST{} wk{}: {}", year, seasontype, week, e);
                        if seasontype == SEASONTYPE_POSTSEASON {
                            break 'weeks;
                        }
                        continue;
                    }
                };
                if schedule.events.is_empty() {
                    if seasontype == SEASONTYPE_POSTSEASON {
                        break 'weeks;
                    }
                    continue;
                }

                println!("   Week {} ST{}: {} games", week, seasontype, schedule.events.len());
                let prediction_week = predictor.config().prediction_week(seasontype, week);

                // Phase 1: predict every game with the records as of now.
                for event in &schedule.events {
                    let Some((home, away)) = event.competitors() else {
                        continue;
                    };
                    let home_abv = &home.team.abbreviation;
                    let away_abv = &away.team.abbreviation;

                    let prediction = match predictor.predict(
                        home_abv,
                        away_abv,
                        &old,
                        &new,
                        prediction_week,
                        &mut rand::rng(),
                    ) {
                        Ok(p) => p,
                        Err(e) => {
                            tracing::warn!("Skipping event {}: {}", event.id, e);
                            continue;
                        }
                    };

                    let actual_winner = if event.is_final() {
                        if home.winner == Some(true) {
                            Some(home_abv.clone())
                        } else if away.winner == Some(true) {
                            Some(away_abv.clone())
                        } else {
                            None
                        }
                    } else {
                        None
                    };
                    let is_correct = actual_winner.as_ref().map(|w| *w == prediction.winner);

                    ledger.append(PredictionRecord {
                        year,
                        seasontype,
                        week,
                        game_id: event.id.clone(),
                        home_team: home_abv.clone(),
                        away_team: away_abv.clone(),
                        predicted_winner: prediction.winner,
                        actual_winner,
                        home_win_prob: prediction.home_win_prob,
                        away_win_prob: prediction.away_win_prob,
                        is_correct,
                    })?;
                }

                // Phase 2: fold completed boxscores into the running records.
                for event in &schedule.events {
                    if !event.is_final() {
                        continue;
                    }
                    match espn.game_summary(&event.id).await {
                        Ok(summary) => {
                            if let Err(e) = ingestor::ingest(&summary, &mut new) {
                                tracing::warn!("Boxscore for {} not ingested: {}", event.id, e);
                            }
                        }
                        Err(e) => {
                            tracing::warn!("Could not fetch boxscore for {}: {}", event.id, e)
                        }
                    }
                }
            }
        }

        // The finished season becomes next year's prior-season baseline.
        old = new;
        new = zeroed_records(&old);
    }

    store::save_team_records(&store::base_stats_path(), &old)?;
    println!("✅ Backfill complete through {}.", to_year);
    Ok(())
}

fn zeroed_records(template: &HashMap<String, TeamRecord>) -> HashMap<String, TeamRecord> {
    template
        .keys()
        .map(|abv| (abv.clone(), TeamRecord::default()))
        .collect()
}
