use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Low,
    Okay,
    Good,
}

impl Mood {
    /// Case-insensitive; anything other than low/okay/good is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "low" => Some(Mood::Low),
            "okay" => Some(Mood::Okay),
            "good" => Some(Mood::Good),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Low => "low",
            Mood::Okay => "okay",
            Mood::Good => "good",
        }
    }
}

fn lenient_mood<'de, D>(deserializer: D) -> Result<Option<Mood>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(Value::as_str).and_then(Mood::parse))
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(text)) => text,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    })
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Bool(flag)) => flag,
        Some(Value::String(text)) => text.trim().eq_ignore_ascii_case("true"),
        _ => false,
    })
}

/// Accepts `21` or `"21"`; anything else is absent.
fn lenient_days<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Number(number)) => number.as_u64().and_then(|days| u32::try_from(days).ok()),
        Some(Value::String(text)) => text.trim().parse().ok(),
        _ => None,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub struggle_type: Option<String>,
    pub confusion_type: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "notification", alias = "notificationTime")]
    pub notification_time: Option<String>,
}

impl Profile {
    pub fn struggle_contains(&self, needle: &str) -> bool {
        contains_lower(self.struggle_type.as_deref(), needle)
    }

    pub fn confusion_contains(&self, needle: &str) -> bool {
        contains_lower(self.confusion_type.as_deref(), needle)
    }

    pub fn status_contains(&self, needle: &str) -> bool {
        contains_lower(self.status.as_deref(), needle)
    }
}

fn contains_lower(value: Option<&str>, needle: &str) -> bool {
    value.is_some_and(|value| value.to_lowercase().contains(needle))
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Reflection {
    #[serde(deserialize_with = "null_as_empty")]
    pub learning: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub feeling: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub improvement: String,
}

impl Reflection {
    pub fn char_len(&self) -> usize {
        self.learning.chars().count() + self.feeling.chars().count() + self.improvement.chars().count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DayEntry {
    #[serde(deserialize_with = "lenient_mood", skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
    #[serde(deserialize_with = "null_as_false")]
    pub task_completed: bool,
    #[serde(deserialize_with = "null_as_false")]
    pub reflection_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reflection: Option<Reflection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Daily,
    Missed,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Daily => "daily",
            NotificationKind::Missed => "missed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserRecord {
    pub profile: Profile,
    pub daily_progress: BTreeMap<String, DayEntry>,
    pub last_notification_date: Option<String>,
    pub last_notification_type: Option<NotificationKind>,
    pub daily_tasks: BTreeMap<i64, String>,
    pub journey_start_date: Option<String>,
    #[serde(deserialize_with = "lenient_days")]
    pub journey_duration: Option<u32>,
}

impl UserRecord {
    pub fn entry(&self, date: NaiveDate) -> Option<&DayEntry> {
        self.daily_progress.get(&date_key(date))
    }

    pub fn reflection_completed_on(&self, date: NaiveDate) -> bool {
        self.entry(date).is_some_and(|entry| entry.reflection_completed)
    }

    pub fn mood_on(&self, date: NaiveDate) -> Option<Mood> {
        self.entry(date).and_then(|entry| entry.mood)
    }

    pub fn completed_reflections(&self) -> usize {
        self.daily_progress
            .values()
            .filter(|entry| entry.reflection_completed)
            .count()
    }
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key.trim(), "%Y-%m-%d").ok()
}
