use crate::models::{Mood, Profile, UserRecord};
use crate::templates::pick;
use chrono::{DateTime, NaiveDate};
use rand::Rng;
use serde::Serialize;

const DEFAULT_JOURNEY_DAYS: u32 = 30;
const TIME_LIMIT: &str = "30-45 minutes";
const DEEP_SUFFIX: &str =
    " Additionally, consider how this connects to your broader learning goals and future aspirations.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Deep,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Deep => "Deep",
        }
    }

    pub fn task_types(self) -> &'static [&'static str] {
        match self {
            Difficulty::Easy => &["Reflection", "Writing", "Observation"],
            Difficulty::Medium => &["Analysis", "Planning", "Application"],
            Difficulty::Deep => &["Synthesis", "Creation", "Evaluation"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Early,
    Mid,
    Late,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JourneyProgress {
    pub day_number: i64,
    pub total_days: u32,
    pub percent: f64,
    pub stage: Stage,
}

pub fn journey_progress(day_number: i64, journey_duration: Option<u32>) -> JourneyProgress {
    let total_days = journey_duration
        .filter(|days| *days > 0)
        .unwrap_or(DEFAULT_JOURNEY_DAYS);
    let stage = match day_number {
        i64::MIN..=7 => Stage::Early,
        8..=21 => Stage::Mid,
        _ => Stage::Late,
    };
    JourneyProgress {
        day_number,
        total_days,
        percent: day_number as f64 / f64::from(total_days) * 100.0,
        stage,
    }
}

/// A low mood always means an easy day; otherwise struggle type, then stage.
pub fn determine_difficulty(profile: &Profile, progress: &JourneyProgress, mood: Option<Mood>) -> Difficulty {
    if mood == Some(Mood::Low) {
        return Difficulty::Easy;
    }
    if profile.struggle_contains("motivation") || profile.struggle_contains("overwhelmed") {
        return Difficulty::Easy;
    }

    let good = mood == Some(Mood::Good);
    match progress.stage {
        Stage::Early if good => Difficulty::Medium,
        Stage::Early => Difficulty::Easy,
        Stage::Mid if good => Difficulty::Medium,
        Stage::Mid if profile.struggle_contains("time") => Difficulty::Easy,
        Stage::Mid => Difficulty::Medium,
        Stage::Late if good && profile.confusion_contains("advanced") => Difficulty::Deep,
        Stage::Late => Difficulty::Medium,
    }
}

fn base_instructions(task_type: &str) -> &'static [&'static str] {
    match task_type {
        "Writing" => &[
            "Spend 20 minutes writing about your current learning journey.",
            "Focus on your thoughts and feelings about the process.",
            "End with 3 key takeaways from this writing exercise.",
        ],
        "Planning" => &[
            "Review your learning goals for the next 7 days.",
            "Break down one goal into small, actionable steps.",
            "Create a realistic timeline for completing these steps.",
        ],
        _ => &[
            "Take 15 minutes to reflect on your recent learning experiences.",
            "Write about what worked well and what challenges you faced.",
            "Consider how you can apply these insights going forward.",
        ],
    }
}

/// Unknown task types use the reflection steps.
pub fn instructions(task_type: &str, difficulty: Difficulty) -> String {
    let steps = base_instructions(task_type);
    match difficulty {
        Difficulty::Easy => steps[..2].join(" "),
        Difficulty::Medium => steps.join(" "),
        Difficulty::Deep => steps.join(" ") + DEEP_SUFFIX,
    }
}

fn mood_encouragement(mood: Mood) -> &'static [&'static str] {
    match mood {
        Mood::Low => &[
            "It's okay to have difficult days. Be gentle with yourself today.",
            "You're showing up, and that's what matters most. Take it one step at a time.",
            "Even small progress is progress. You've got this, at your own pace.",
        ],
        Mood::Okay => &[
            "You're building consistency, and that's a real achievement.",
            "Every day you engage with your learning, you're growing stronger.",
            "Your steady approach is creating lasting change.",
        ],
        Mood::Good => &[
            "Your energy today is perfect for tackling meaningful challenges!",
            "You're in a great mindset to make significant progress today.",
            "Your positive attitude will help you achieve great things today!",
        ],
    }
}

fn stage_encouragement(stage: Stage) -> &'static [&'static str] {
    match stage {
        Stage::Early => &[
            "You're building a strong foundation for your learning journey.",
            "Every small step counts toward your growth.",
            "Trust the process - you're doing great!",
        ],
        Stage::Mid => &[
            "You're making meaningful progress on your journey.",
            "Your consistency is paying off in ways you might not see yet.",
            "Keep showing up - that's what matters most.",
        ],
        Stage::Late => &[
            "You've come so far - look at how much you've grown!",
            "Your dedication to learning is truly inspiring.",
            "You're developing skills that will serve you for life.",
        ],
    }
}

/// Coin flip between a mood line and a journey-stage line.
pub fn encouragement<R: Rng + ?Sized>(progress: &JourneyProgress, mood: Option<Mood>, rng: &mut R) -> String {
    let mood = mood.unwrap_or(Mood::Okay);
    if rng.gen_bool(0.5) {
        pick(rng, mood_encouragement(mood)).to_string()
    } else {
        pick(rng, stage_encouragement(progress.stage)).to_string()
    }
}

pub fn tone(mood: Option<Mood>) -> &'static str {
    match mood {
        Some(Mood::Low) => "gentle, reassuring",
        Some(Mood::Good) => "slightly challenging",
        Some(Mood::Okay) | None => "neutral",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub day_number: i64,
    pub difficulty: Difficulty,
    pub task_type: String,
    pub time_limit: String,
    pub focus: String,
    pub instructions: String,
    pub encouragement: String,
    pub tone: String,
}

impl Task {
    pub fn render(&self) -> String {
        format!(
            "Day {} - {} Task ({})\n\nTime: {}\nFocus: {}\nTone: {}\n\nToday's task: {}\n\n{}\n\n\
             Remember: This is about understanding yourself better, not perfection. \
             Take your time and be gentle with yourself.",
            self.day_number,
            self.task_type,
            self.difficulty.as_str(),
            self.time_limit,
            self.focus,
            self.tone,
            self.instructions,
            self.encouragement,
        )
    }
}

pub fn generate_task<R: Rng + ?Sized>(
    record: &UserRecord,
    day_number: i64,
    mood: Option<Mood>,
    rng: &mut R,
) -> Task {
    let profile = &record.profile;
    let progress = journey_progress(day_number, record.journey_duration);
    let difficulty = determine_difficulty(profile, &progress, mood);
    let task_type = pick(rng, difficulty.task_types());

    Task {
        day_number,
        difficulty,
        task_type: task_type.to_string(),
        time_limit: TIME_LIMIT.to_string(),
        focus: profile
            .confusion_type
            .clone()
            .filter(|focus| !focus.is_empty())
            .unwrap_or_else(|| "Personal Growth".to_string()),
        instructions: instructions(task_type, difficulty),
        encouragement: encouragement(&progress, mood, rng),
        tone: tone(mood).to_string(),
    }
}

/// Cached text for `day_number`, or a freshly generated one stored on the record.
pub fn task_for_day<R: Rng + ?Sized>(
    mut record: UserRecord,
    day_number: i64,
    mood: Option<Mood>,
    rng: &mut R,
) -> (UserRecord, String) {
    if let Some(existing) = record.daily_tasks.get(&day_number) {
        let existing = existing.clone();
        return (record, existing);
    }
    let text = generate_task(&record, day_number, mood, rng).render();
    record.daily_tasks.insert(day_number, text.clone());
    (record, text)
}

/// Day 1 is the journey start date; no start date means today is day 1.
pub fn day_number(record: &UserRecord, today: NaiveDate) -> i64 {
    let start = record
        .journey_start_date
        .as_deref()
        .and_then(parse_start_date)
        .unwrap_or(today);
    (today - start).num_days() + 1
}

fn parse_start_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|moment| moment.date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
}
