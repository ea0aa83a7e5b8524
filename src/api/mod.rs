use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::ModelConfig;
use crate::models::{
    ApiResponse, GameView, PredictionRecord, SideView, StandingsRow, TeamRecord, WeekPredictions,
};
use crate::services::espn::{Event, ScoreboardResponse};
use crate::services::ingestor;
use crate::services::{EspnClient, MatchupPredictor};
use crate::store::{self, Ledger};
use crate::utils::{current_nfl_week, SeasonWeek};

const PLACEHOLDER_LOGO: &str = "https://placehold.co/40x40/cccccc/ffffff?text=?";

pub struct AppState {
    predictor: MatchupPredictor,
    espn: EspnClient,
    /// Frozen prior-season records; never mutated after startup.
    old_records: HashMap<String, TeamRecord>,
    /// Accumulating current-season records. The lock serializes writers so
    /// concurrent ingests of games sharing a team cannot lose updates.
    new_records: Mutex<HashMap<String, TeamRecord>>,
    ledger: Mutex<Ledger>,
    logos: HashMap<String, String>,
    current_stats_path: PathBuf,
}

impl AppState {
    pub async fn load() -> anyhow::Result<Self> {
        let espn = EspnClient::new();

        let old_records = store::load_team_records(&store::base_stats_path())?;

        // A missing current-season file just means the season has not
        // started: every known team begins at zero.
        let current_stats_path = store::current_stats_path();
        let new_records = match store::load_team_records(&current_stats_path) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    "No current season stats ({}); initializing empty records",
                    e
                );
                old_records
                    .keys()
                    .map(|abv| (abv.clone(), TeamRecord::default()))
                    .collect()
            }
        };

        let ledger = Ledger::load(store::history_path())?;

        let logos = match espn.team_logos().await {
            Ok(logos) => logos,
            Err(e) => {
                tracing::warn!("Could not fetch team logos: {}", e);
                HashMap::new()
            }
        };

        Ok(Self {
            predictor: MatchupPredictor::new(ModelConfig::from_env()),
            espn,
            old_records,
            new_records: Mutex::new(new_records),
            ledger: Mutex::new(ledger),
            logos,
            current_stats_path,
        })
    }

    fn logo(&self, abv: &str) -> String {
        self.logos
            .get(abv)
            .cloned()
            .unwrap_or_else(|| PLACEHOLDER_LOGO.to_string())
    }
}

pub async fn serve(port: u16) -> anyhow::Result<()> {
    let state = Arc::new(AppState::load().await?);
    let app = create_router().with_state(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    tracing::info!("Gridiron API server listening on port {}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/predict/{year}/{seasontype}/{week}", get(predict_week_handler))
        .route("/api/nfl_week", get(nfl_week_handler))
        .route("/api/standings/{year}/{seasontype}", get(standings_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

// Health check endpoint
async fn health_check() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("Gridiron API is running"))
}

// GET /api/nfl_week - current season year and week
async fn nfl_week_handler() -> Json<ApiResponse<SeasonWeek>> {
    let today = chrono::Utc::now().date_naive();
    Json(ApiResponse::success(current_nfl_week(today)))
}

// GET /api/standings/{year}/{seasontype} - actual vs predicted records
async fn standings_handler(
    State(state): State<Arc<AppState>>,
    Path((year, seasontype)): Path<(i32, u8)>,
) -> Json<ApiResponse<Vec<StandingsRow>>> {
    let ledger = state.ledger.lock().await;
    Json(ApiResponse::success(ledger.standings(year, seasontype)))
}

type WeekResult = Result<
    Json<ApiResponse<WeekPredictions>>,
    (StatusCode, Json<ApiResponse<WeekPredictions>>),
>;

// GET /api/predict/{year}/{seasontype}/{week} - predictions for a week,
// served from the ledger when present, computed fresh otherwise.
async fn predict_week_handler(
    State(state): State<Arc<AppState>>,
    Path((year, seasontype, week)): Path<(i32, u8, u32)>,
) -> WeekResult {
    let history: Vec<PredictionRecord> = {
        let ledger = state.ledger.lock().await;
        ledger
            .rows_for_week(year, seasontype, week)
            .into_iter()
            .cloned()
            .collect()
    };

    if !history.is_empty() {
        tracing::info!(
            "Serving {} historical predictions for {} ST{} week {}",
            history.len(),
            year,
            seasontype,
            week
        );
        return Ok(Json(ApiResponse::success(
            historical_week(&state, year, seasontype, week, &history).await,
        )));
    }

    predict_future_week(&state, year, seasontype, week)
        .await
        .map(|data| Json(ApiResponse::success(data)))
}

/// Ledger-backed view of an already-recorded week, enriched with live
/// scores and status when the schedule is reachable.
async fn historical_week(
    state: &AppState,
    year: i32,
    seasontype: u8,
    week: u32,
    history: &[PredictionRecord],
) -> WeekPredictions {
    let live_events: HashMap<String, Event> = match state
        .espn
        .weekly_schedule(year, seasontype, week)
        .await
    {
        Ok(schedule) => schedule
            .events
            .into_iter()
            .map(|e| (e.id.clone(), e))
            .collect(),
        Err(e) => {
            tracing::warn!("Live schedule unavailable, serving ledger only: {}", e);
            HashMap::new()
        }
    };

    let games = history
        .iter()
        .map(|row| {
            let live = live_events.get(&row.game_id);
            let (home_score, away_score) = live
                .and_then(|e| e.competitors())
                .map(|(home, away)| {
                    (
                        home.score.clone().unwrap_or_else(|| "0".to_string()),
                        away.score.clone().unwrap_or_else(|| "0".to_string()),
                    )
                })
                .unwrap_or_else(|| ("0".to_string(), "0".to_string()));

            GameView {
                id: row.game_id.clone(),
                date: live.map(|e| e.date.clone()).unwrap_or_default(),
                name: live.map(|e| e.name.clone()).unwrap_or_default(),
                status: live
                    .map(|e| e.status.kind.detail.clone())
                    .unwrap_or_else(|| "Unavailable".to_string()),
                home_team: SideView {
                    abbreviation: row.home_team.clone(),
                    logo: state.logo(&row.home_team),
                    score: home_score,
                    win_probability: row.home_win_prob,
                },
                away_team: SideView {
                    abbreviation: row.away_team.clone(),
                    logo: state.logo(&row.away_team),
                    score: away_score,
                    win_probability: row.away_win_prob,
                },
                predicted_winner: Some(row.predicted_winner.clone()),
                actual_winner: row.actual_winner.clone(),
                is_correct: row.is_correct,
            }
        })
        .collect();

    let refs: Vec<&PredictionRecord> = history.iter().collect();
    WeekPredictions {
        games,
        accuracy: Ledger::accuracy(&refs),
    }
}

/// Predict every game of a week that has no ledger rows yet. Games that
/// already reached a final state get their outcome recorded and their
/// boxscore folded into the current-season records.
async fn predict_future_week(
    state: &AppState,
    year: i32,
    seasontype: u8,
    week: u32,
) -> Result<WeekPredictions, (StatusCode, Json<ApiResponse<WeekPredictions>>)> {
    let schedule: ScoreboardResponse = state
        .espn
        .weekly_schedule(year, seasontype, week)
        .await
        .map_err(|e| {
            tracing::error!("Could not fetch live schedule: {}", e);
            error_response(
                StatusCode::BAD_GATEWAY,
                format!("Could not fetch live schedule: {}", e),
            )
        })?;

    let prediction_week = state.predictor.config().prediction_week(seasontype, week);

    let mut new_records = state.new_records.lock().await;
    let mut ledger = state.ledger.lock().await;

    let mut games = Vec::new();
    let mut stats_updated = false;

    for event in &schedule.events {
        let Some((home, away)) = event.competitors() else {
            continue;
        };
        let home_abv = home.team.abbreviation.clone();
        let away_abv = away.team.abbreviation.clone();

        let prediction = state
            .predictor
            .predict(
                &home_abv,
                &away_abv,
                &state.old_records,
                &new_records,
                prediction_week,
                &mut rand::rng(),
            )
            .map_err(|e| {
                tracing::warn!("Prediction failed for event {}: {}", event.id, e);
                error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
            })?;

        let mut view = GameView {
            id: event.id.clone(),
            date: event.date.clone(),
            name: event.name.clone(),
            status: event.status.kind.detail.clone(),
            home_team: SideView {
                abbreviation: home_abv.clone(),
                logo: state.logo(&home_abv),
                score: home.score.clone().unwrap_or_else(|| "0".to_string()),
                win_probability: prediction.home_win_prob,
            },
            away_team: SideView {
                abbreviation: away_abv.clone(),
                logo: state.logo(&away_abv),
                score: away.score.clone().unwrap_or_else(|| "0".to_string()),
                win_probability: prediction.away_win_prob,
            },
            predicted_winner: Some(prediction.winner.clone()),
            actual_winner: None,
            is_correct: None,
        };

        if event.is_final() && !ledger.contains(&event.id) {
            let actual_winner = if home.winner == Some(true) {
                Some(home_abv.clone())
            } else if away.winner == Some(true) {
                Some(away_abv.clone())
            } else {
                None
            };
            let is_correct = actual_winner.as_ref().map(|w| *w == prediction.winner);

            view.actual_winner = actual_winner.clone();
            view.is_correct = is_correct;

            ledger
                .append(PredictionRecord {
                    year,
                    seasontype,
                    week,
                    game_id: event.id.clone(),
                    home_team: home_abv.clone(),
                    away_team: away_abv.clone(),
                    predicted_winner: prediction.winner.clone(),
                    actual_winner,
                    home_win_prob: prediction.home_win_prob,
                    away_win_prob: prediction.away_win_prob,
                    is_correct,
                })
                .map_err(|e| {
                    tracing::error!("Failed to append prediction history: {}", e);
                    error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
                })?;

            match state.espn.game_summary(&event.id).await {
                Ok(summary) => match ingestor::ingest(&summary, &mut new_records) {
                    Ok(()) => stats_updated = true,
                    Err(e) => {
                        tracing::warn!("Skipping boxscore for event {}: {}", event.id, e)
                    }
                },
                Err(e) => tracing::warn!("Could not fetch boxscore for {}: {}", event.id, e),
            }
        }

        games.push(view);
    }

    if stats_updated {
        tracing::info!(
            "Saving updated season stats to {}",
            state.current_stats_path.display()
        );
        if let Err(e) = store::save_team_records(&state.current_stats_path, &new_records) {
            tracing::error!("Failed to save season stats: {}", e);
        }
    }

    Ok(WeekPredictions {
        games,
        accuracy: Default::default(),
    })
}

fn error_response(
    status: StatusCode,
    message: String,
) -> (StatusCode, Json<ApiResponse<WeekPredictions>>) {
    (status, Json(ApiResponse::error(message)))
}
