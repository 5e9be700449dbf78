//! End-of-journey summary built from the whole progress history.

use crate::models::{DayEntry, Mood, UserRecord};
use crate::stats::{analyze_consistency, Consistency};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

const DEEP_REFLECTION: &str = "Deep self-reflection and thoughtful analysis";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MoodDistribution {
    pub low: usize,
    pub okay: usize,
    pub good: usize,
}

impl MoodDistribution {
    fn count(&self, mood: Mood) -> usize {
        match mood {
            Mood::Low => self.low,
            Mood::Okay => self.okay,
            Mood::Good => self.good,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodPatterns {
    pub dominant_mood: Mood,
    pub distribution: MoodDistribution,
    pub positivity: f64,
    pub resilience: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallTone {
    Accomplished,
    Progressing,
}

impl OverallTone {
    pub fn as_str(self) -> &'static str {
        match self {
            OverallTone::Accomplished => "accomplished",
            OverallTone::Progressing => "progressing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalFeedback {
    pub journey_summary: String,
    pub emotional_changes: MoodPatterns,
    pub strengths_observed: Vec<String>,
    pub clarity_gained: Vec<String>,
    pub suggested_next_step: String,
    pub overall_tone: OverallTone,
    pub consistency: Consistency,
}

pub fn final_feedback(record: &UserRecord, journey_days: u32, today: NaiveDate) -> FinalFeedback {
    let progress = &record.daily_progress;
    let completed_days = record.completed_reflections();
    let moods = mood_patterns(progress);
    let strengths = growth_patterns(progress);
    let next_step = next_step(&moods, &strengths);

    FinalFeedback {
        journey_summary: journey_summary(journey_days, completed_days),
        suggested_next_step: next_step,
        clarity_gained: clarity_gained(progress),
        overall_tone: overall_tone(journey_days, completed_days),
        consistency: analyze_consistency(progress, today),
        emotional_changes: moods,
        strengths_observed: strengths,
    }
}

pub fn journey_summary(journey_days: u32, completed_days: usize) -> String {
    let completion = if journey_days == 0 {
        0.0
    } else {
        (completed_days as f64 / f64::from(journey_days) * 100.0).round()
    };
    format!("You completed {completed_days} out of {journey_days} days ({completion}% completion rate)")
}

pub fn overall_tone(journey_days: u32, completed_days: usize) -> OverallTone {
    if completed_days as f64 >= f64::from(journey_days) * 0.8 {
        OverallTone::Accomplished
    } else {
        OverallTone::Progressing
    }
}

/// Ties go to the later of low, okay, good.
pub fn mood_patterns(progress: &BTreeMap<String, DayEntry>) -> MoodPatterns {
    let mut distribution = MoodDistribution::default();
    for mood in progress.values().filter_map(|entry| entry.mood) {
        match mood {
            Mood::Low => distribution.low += 1,
            Mood::Okay => distribution.okay += 1,
            Mood::Good => distribution.good += 1,
        }
    }

    let dominant_mood = [Mood::Okay, Mood::Good]
        .into_iter()
        .fold(Mood::Low, |best, candidate| {
            if distribution.count(best) > distribution.count(candidate) {
                best
            } else {
                candidate
            }
        });

    let total = (distribution.low + distribution.okay + distribution.good).max(1);
    let resilience = if distribution.low > 0 {
        "You showed resilience on challenging days"
    } else {
        "Consistently positive mindset"
    };

    MoodPatterns {
        dominant_mood,
        distribution,
        positivity: distribution.good as f64 / total as f64 * 100.0,
        resilience: resilience.to_string(),
    }
}

pub fn growth_patterns(progress: &BTreeMap<String, DayEntry>) -> Vec<String> {
    let reflections: Vec<_> = progress
        .values()
        .filter_map(|entry| entry.reflection.as_ref())
        .collect();
    let total_length: usize = reflections.iter().map(|reflection| reflection.char_len()).sum();
    let average_length = total_length as f64 / reflections.len().max(1) as f64;

    let mut strengths = Vec::new();
    if average_length > 200.0 {
        strengths.push(DEEP_REFLECTION.to_string());
    }

    let completed = progress.values().filter(|entry| entry.reflection_completed).count();
    if completed > 10 {
        strengths.push("Strong commitment and consistency".to_string());
    }

    if strengths.is_empty() {
        strengths.push("Building self-awareness through regular practice".to_string());
    }
    strengths
}

pub fn clarity_gained(progress: &BTreeMap<String, DayEntry>) -> Vec<String> {
    const THEMES: &[(&[&str], &str)] = &[
        (&["understand", "clear"], "Better understanding of personal learning patterns"),
        (&["time", "schedule"], "Improved time management awareness"),
        (&["motivation", "energy"], "Deeper insight into personal motivation"),
    ];

    let mut areas: Vec<String> = Vec::new();
    for reflection in progress.values().filter_map(|entry| entry.reflection.as_ref()) {
        let text = format!("{} {}", reflection.learning, reflection.improvement).to_lowercase();
        for (keywords, area) in THEMES {
            if keywords.iter().any(|keyword| text.contains(keyword)) && !areas.iter().any(|a| a.as_str() == *area) {
                areas.push(area.to_string());
            }
        }
    }

    if areas.is_empty() {
        areas.push("Developing self-awareness through regular reflection".to_string());
    }
    areas
}

/// Low positivity wins; otherwise a deep-reflection strength (matched as the
/// whole strength string) moves the user on to applying their insights.
pub fn next_step(moods: &MoodPatterns, strengths: &[String]) -> String {
    let step = if moods.positivity < 40.0 {
        "Focus on building positive routines and self-compassion"
    } else if strengths.iter().any(|strength| strength == DEEP_REFLECTION) {
        "Apply your insights to new learning challenges"
    } else {
        "Continue your reflection practice with new topics or goals"
    };
    step.to_string()
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

impl fmt::Display for FinalFeedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Journey Complete: {}\n\n\
             Emotional & Mental Changes:\n\
             - Dominant mood pattern: {}\n\
             - Positivity rate: {}%\n\
             - {}\n\n\
             Strengths Observed:\n{}\n\n\
             Clarity Gained:\n{}\n\n\
             Suggested Next Step:\n{}\n\n\
             Your journey shows {} growth. Keep building on this foundation.",
            self.journey_summary,
            self.emotional_changes.dominant_mood.as_str(),
            self.emotional_changes.positivity.round(),
            self.emotional_changes.resilience,
            bullet_list(&self.strengths_observed),
            bullet_list(&self.clarity_gained),
            self.suggested_next_step,
            self.overall_tone.as_str(),
        )
    }
}
