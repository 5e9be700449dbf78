use crate::models::{date_key, parse_date_key, DayEntry};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

const STREAK_HORIZON_DAYS: i64 = 365;
const RECENT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Consistency {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_days: usize,
    pub consistency: f64,
}

/// Consecutive days with a completed task, walking back from `today`.
///
/// An open `today` does not break the streak; any earlier gap does.
pub fn current_streak(progress: &BTreeMap<String, DayEntry>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    for offset in 0..STREAK_HORIZON_DAYS {
        let date = today - Duration::days(offset);
        let completed = progress
            .get(&date_key(date))
            .is_some_and(|entry| entry.task_completed);
        if completed {
            streak += 1;
        } else if offset > 0 {
            break;
        }
    }
    streak
}

/// Journey-level consistency over completed reflections.
///
/// Dates are compared against a contiguous run starting at the earliest
/// recorded date, so any gap in the history breaks every later streak.
/// This deliberately differs from [`current_streak`].
pub fn analyze_consistency(progress: &BTreeMap<String, DayEntry>, today: NaiveDate) -> Consistency {
    let mut dated: Vec<(NaiveDate, &DayEntry)> = progress
        .iter()
        .filter_map(|(key, entry)| parse_date_key(key).map(|date| (date, entry)))
        .collect();
    dated.sort_by_key(|(date, _)| *date);

    let Some(&(first, _)) = dated.first() else {
        return Consistency {
            current_streak: 0,
            longest_streak: 0,
            total_days: 0,
            consistency: 0.0,
        };
    };

    let mut current_streak = 0;
    let mut longest_streak = 0;
    let mut run = 0;

    for (index, (date, entry)) in dated.iter().enumerate() {
        let expected = first + Duration::days(index as i64);
        if *date == expected && entry.reflection_completed {
            run += 1;
            longest_streak = longest_streak.max(run);
        } else {
            run = 0;
        }

        if (today - *date).num_days() < RECENT_WINDOW_DAYS {
            current_streak = run;
        }
    }

    let total_days = dated.len();
    Consistency {
        current_streak,
        longest_streak,
        total_days,
        consistency: f64::from(longest_streak) / total_days as f64 * 100.0,
    }
}
