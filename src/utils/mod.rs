use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

/// A season lasts about 22 weeks: 18 regular plus postseason.
const SEASON_LENGTH_DAYS: i64 = 22 * 7;
const MAX_REGULAR_WEEK: i64 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeasonWeek {
    pub year: i32,
    pub week: u32,
}

/// The NFL season opens on the first Thursday of September.
pub fn season_start(year: i32) -> NaiveDate {
    let first = NaiveDate::from_ymd_opt(year, 9, 1)
        .expect("September 1st is always a valid date");
    // Thursday is weekday index 3 counting from Monday.
    let offset = (3 + 7 - first.weekday().num_days_from_monday() as i64) % 7;
    first + Duration::days(offset)
}

/// Which season and week a calendar date falls in.
///
/// Dates before this year's opener may still belong to last season's tail
/// (January playoffs); the true offseason maps to week 1 of the upcoming
/// season. Regular-season weeks cap at 18.
pub fn current_nfl_week(today: NaiveDate) -> SeasonWeek {
    let year = today.year();
    let start = season_start(year);

    if today < start {
        let last_start = season_start(year - 1);
        let days = (today - last_start).num_days();
        if (0..SEASON_LENGTH_DAYS).contains(&days) {
            return SeasonWeek {
                year: year - 1,
                week: ((days / 7) + 1).min(MAX_REGULAR_WEEK) as u32,
            };
        }
        return SeasonWeek { year, week: 1 };
    }

    let days = (today - start).num_days();
    SeasonWeek {
        year,
        week: ((days / 7) + 1).min(MAX_REGULAR_WEEK) as u32,
    }
}
