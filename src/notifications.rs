use crate::errors::StoreError;
use crate::models::{date_key, Mood, NotificationKind, Profile, UserRecord};
use crate::stats::current_streak;
use crate::storage::{load_user, save_user, ProfileStore};
use crate::templates::pick;
use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

const DEFAULT_NOTIFICATION_TIME: &str = "9:00 AM";
const NOTIFICATION_TOLERANCE_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Gentle,
    Focused,
    Encouraging,
}

const GENTLE: &[&str] = &[
    "Time for today's gentle reflection",
    "Your learning moment awaits",
    "A quiet moment for growth today",
    "Today's thoughtful task is ready",
    "Your journey continues softly",
];

const FOCUSED: &[&str] = &[
    "Today's learning task is ready",
    "Complete your reflection now",
    "Your growth task awaits",
    "Today's 30-minute challenge",
    "Time for meaningful progress",
];

const ENCOURAGING: &[&str] = &[
    "You've got this today!",
    "Another step forward awaits",
    "Your consistency builds success",
    "Today's task will help you grow",
    "Keep your momentum going",
];

const MISSED_DAY: &[&str] = &[
    "Yesterday was missed, but today is a new start",
    "No pressure - just begin again today",
    "Every day is a fresh opportunity",
    "Yesterday doesn't define today",
    "Ready to try again? Today awaits",
    "Missed days happen. Today matters",
    "New day, fresh start, you've got this",
    "Let's make today count together",
];

impl Tone {
    pub fn templates(self) -> &'static [&'static str] {
        match self {
            Tone::Gentle => GENTLE,
            Tone::Focused => FOCUSED,
            Tone::Encouraging => ENCOURAGING,
        }
    }
}

/// Struggle type wins over status, status over mood.
pub fn select_tone(profile: &Profile, mood: Option<Mood>) -> Tone {
    if profile.struggle_contains("motivation") {
        Tone::Encouraging
    } else if profile.status_contains("professional") {
        Tone::Focused
    } else if mood == Some(Mood::Good) {
        Tone::Focused
    } else {
        Tone::Gentle
    }
}

/// `None` once today's reflection is done.
pub fn daily_notification<R: Rng + ?Sized>(
    record: &UserRecord,
    today: NaiveDate,
    mood: Option<Mood>,
    rng: &mut R,
) -> Option<String> {
    if record.reflection_completed_on(today) {
        return None;
    }
    let tone = select_tone(&record.profile, mood);
    Some(pick(rng, tone.templates()).to_string())
}

/// Looks only at yesterday; today's state is irrelevant here.
pub fn missed_day_notification<R: Rng + ?Sized>(
    record: &UserRecord,
    today: NaiveDate,
    rng: &mut R,
) -> Option<String> {
    if record.reflection_completed_on(today - Duration::days(1)) {
        return None;
    }
    Some(pick(rng, MISSED_DAY).to_string())
}

pub fn generate<R: Rng + ?Sized>(
    kind: NotificationKind,
    record: &UserRecord,
    today: NaiveDate,
    mood: Option<Mood>,
    rng: &mut R,
) -> Option<String> {
    match kind {
        NotificationKind::Daily => daily_notification(record, today, mood, rng),
        NotificationKind::Missed => missed_day_notification(record, today, rng),
    }
}

/// At most one notification per day.
pub fn should_send(record: &UserRecord, kind: NotificationKind, today: NaiveDate) -> bool {
    if record.last_notification_date.as_deref() == Some(date_key(today).as_str()) {
        return false;
    }
    match kind {
        NotificationKind::Daily => !record.reflection_completed_on(today),
        NotificationKind::Missed => !record.reflection_completed_on(today - Duration::days(1)),
    }
}

pub fn mark_sent(mut record: UserRecord, kind: NotificationKind, today: NaiveDate) -> UserRecord {
    record.last_notification_date = Some(date_key(today));
    record.last_notification_type = Some(kind);
    record
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Normal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmartNotification {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    pub priority: Priority,
}

/// Missed-day first, then the daily reminder using today's recorded mood.
/// The returned record is marked when something is produced.
pub fn smart_notification<R: Rng + ?Sized>(
    record: UserRecord,
    today: NaiveDate,
    rng: &mut R,
) -> (UserRecord, Option<SmartNotification>) {
    if should_send(&record, NotificationKind::Missed, today) {
        if let Some(message) = missed_day_notification(&record, today, rng) {
            let record = mark_sent(record, NotificationKind::Missed, today);
            return (
                record,
                Some(SmartNotification {
                    kind: NotificationKind::Missed,
                    message,
                    priority: Priority::High,
                }),
            );
        }
    }

    if should_send(&record, NotificationKind::Daily, today) {
        let mood = record.mood_on(today);
        if let Some(message) = daily_notification(&record, today, mood, rng) {
            let record = mark_sent(record, NotificationKind::Daily, today);
            return (
                record,
                Some(SmartNotification {
                    kind: NotificationKind::Daily,
                    message,
                    priority: Priority::Normal,
                }),
            );
        }
    }

    (record, None)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserNotification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub tag: String,
    pub require_interaction: bool,
    pub actions: Vec<NotificationAction>,
}

fn action(action: &str, title: &str) -> NotificationAction {
    NotificationAction {
        action: action.to_string(),
        title: title.to_string(),
    }
}

pub fn browser_notification(kind: NotificationKind, message: &str) -> BrowserNotification {
    let (title, icon, actions) = match kind {
        NotificationKind::Daily => (
            "📚 CLEARNEXT - Daily Reminder",
            "📝",
            vec![action("start", "Start Task"), action("dismiss", "Later")],
        ),
        NotificationKind::Missed => ("🌅 CLEARNEXT - New Day", "🌱", Vec::new()),
    };
    BrowserNotification {
        title: title.to_string(),
        body: message.to_string(),
        icon: icon.to_string(),
        tag: format!("clearnext-{}", kind.as_str()),
        require_interaction: false,
        actions,
    }
}

pub fn streak_message(record: &UserRecord, today: NaiveDate) -> String {
    let streak = current_streak(&record.daily_progress, today);

    if let Some(entry) = record.entry(today) {
        if entry.mood.is_some() && !entry.task_completed {
            return format!(
                "You've checked in today! Complete your task to maintain your {streak}-day streak 🔥"
            );
        }
    }

    match streak {
        0 => "Ready to start your learning journey? Your first task awaits! 🌟".to_string(),
        1 => "Great start yesterday! Keep the momentum going today 💪".to_string(),
        2..=6 => format!("{streak}-day streak! You're building a powerful habit 🎯"),
        7..=29 => format!("Amazing {streak}-day streak! Your consistency is paying off 🏆"),
        _ => format!("{streak} days of learning! You're absolutely incredible 🌟"),
    }
}

/// "9:00 AM" style. A missing period reads the hour as 24-hour.
pub fn parse_notification_time(raw: &str) -> Option<NaiveTime> {
    let mut parts = raw.split_whitespace();
    let clock = parts.next()?;
    let period = parts.next().map(str::to_uppercase);
    let (hours, minutes) = clock.split_once(':')?;
    let mut hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;

    match period.as_deref() {
        Some("PM") if hours != 12 => hours += 12,
        Some("AM") if hours == 12 => hours = 0,
        _ => {}
    }

    NaiveTime::from_hms_opt(hours, minutes, 0)
}

pub fn notification_time(profile: &Profile) -> NaiveTime {
    let raw = profile
        .notification_time
        .as_deref()
        .unwrap_or(DEFAULT_NOTIFICATION_TIME);
    parse_notification_time(raw)
        .or_else(|| parse_notification_time(DEFAULT_NOTIFICATION_TIME))
        .unwrap_or(NaiveTime::MIN)
}

pub fn is_notification_time(profile: &Profile, now: NaiveDateTime) -> bool {
    let target = now.date().and_time(notification_time(profile));
    (now - target).num_seconds().abs() <= NOTIFICATION_TOLERANCE_MINUTES * 60
}

/// Today's slot, or tomorrow's once today's has passed.
pub fn next_fire_at(profile: &Profile, now: NaiveDateTime) -> NaiveDateTime {
    let target = now.date().and_time(notification_time(profile));
    if target <= now {
        target + Duration::days(1)
    } else {
        target
    }
}

/// Platform capability that actually shows a notification.
pub trait Notifier: Send + Sync {
    fn permission_granted(&self) -> bool {
        true
    }

    fn show(&self, notification: &BrowserNotification);
}

/// Writes notifications to the log instead of a desktop.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show(&self, notification: &BrowserNotification) {
        info!(tag = %notification.tag, "{}: {}", notification.title, notification.body);
    }
}

pub struct NotificationService {
    store: Arc<dyn ProfileStore>,
    notifier: Arc<dyn Notifier>,
    rng: Mutex<StdRng>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn ProfileStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_rng(store, notifier, StdRng::from_entropy())
    }

    pub fn with_rng(store: Arc<dyn ProfileStore>, notifier: Arc<dyn Notifier>, rng: StdRng) -> Self {
        Self {
            store,
            notifier,
            rng: Mutex::new(rng),
        }
    }

    /// Sends today's reminder if its time has come and nothing blocks it.
    pub async fn check_and_send(&self, now: NaiveDateTime) -> Result<bool, StoreError> {
        if !self.notifier.permission_granted() {
            return Ok(false);
        }

        let record = load_user(self.store.as_ref()).await?;
        let today = now.date();
        if record.entry(today).is_some_and(|entry| entry.task_completed) {
            return Ok(false);
        }
        if record.last_notification_date.as_deref() == Some(date_key(today).as_str()) {
            return Ok(false);
        }
        if now < today.and_time(notification_time(&record.profile)) {
            return Ok(false);
        }

        self.send_daily(now).await
    }

    pub async fn send_daily(&self, now: NaiveDateTime) -> Result<bool, StoreError> {
        let record = load_user(self.store.as_ref()).await?;
        let today = now.date();
        if record.last_notification_date.as_deref() == Some(date_key(today).as_str()) {
            return Ok(false);
        }
        if record.reflection_completed_on(today) {
            return Ok(false);
        }

        let (record, smart) = {
            let mut rng = self.rng.lock().await;
            smart_notification(record, today, &mut *rng)
        };

        // past the checks above a daily message is always due
        let Some(smart) = smart else {
            return Ok(false);
        };

        self.notifier.show(&browser_notification(smart.kind, &smart.message));
        save_user(self.store.as_ref(), &record).await?;
        Ok(true)
    }

    /// Fires once per day at the profile's notification time, forever.
    pub async fn run(self) {
        match self.check_and_send(Local::now().naive_local()).await {
            Ok(sent) => debug!(sent, "initial notification check"),
            Err(err) => error!("notification check failed: {err}"),
        }

        loop {
            let profile = match load_user(self.store.as_ref()).await {
                Ok(record) => record.profile,
                Err(err) => {
                    error!("failed to load profile for scheduling: {err}");
                    Profile::default()
                }
            };
            let now = Local::now().naive_local();
            let next = next_fire_at(&profile, now);
            info!("next notification scheduled for {next}");

            let wait = (next - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            if let Err(err) = self.send_daily(Local::now().naive_local()).await {
                error!("failed to send daily notification: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DayEntry;
    use crate::storage::MemoryProfileStore;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(11)
    }

    fn record_with(date: NaiveDate, entry: DayEntry) -> UserRecord {
        let mut record = UserRecord::default();
        record.daily_progress.insert(date_key(date), entry);
        record
    }

    #[test]
    fn tone_decision_tree() {
        let mut profile = Profile::default();
        assert_eq!(select_tone(&profile, None), Tone::Gentle);
        assert_eq!(select_tone(&profile, Some(Mood::Good)), Tone::Focused);
        assert_eq!(select_tone(&profile, Some(Mood::Low)), Tone::Gentle);

        profile.status = Some("Working Professional".into());
        assert_eq!(select_tone(&profile, Some(Mood::Low)), Tone::Focused);

        profile.struggle_type = Some("Lack of MOTIVATION".into());
        assert_eq!(select_tone(&profile, Some(Mood::Good)), Tone::Encouraging);
    }

    #[test]
    fn completed_reflection_silences_daily_notification() {
        let record = record_with(
            today(),
            DayEntry {
                reflection_completed: true,
                mood: Some(Mood::Good),
                ..DayEntry::default()
            },
        );
        for mood in [None, Some(Mood::Low), Some(Mood::Okay), Some(Mood::Good)] {
            assert_eq!(daily_notification(&record, today(), mood, &mut rng()), None);
        }
    }

    #[test]
    fn daily_notification_uses_tone_templates() {
        let record = UserRecord::default();
        let message = daily_notification(&record, today(), Some(Mood::Good), &mut rng()).unwrap();
        assert!(FOCUSED.contains(&message.as_str()));
    }

    #[test]
    fn missed_day_only_checks_yesterday() {
        let yesterday = today() - Duration::days(1);
        let done_yesterday = record_with(
            yesterday,
            DayEntry {
                reflection_completed: true,
                ..DayEntry::default()
            },
        );
        assert_eq!(missed_day_notification(&done_yesterday, today(), &mut rng()), None);

        let done_today = record_with(
            today(),
            DayEntry {
                reflection_completed: true,
                ..DayEntry::default()
            },
        );
        let message = missed_day_notification(&done_today, today(), &mut rng()).unwrap();
        assert!(MISSED_DAY.contains(&message.as_str()));
    }

    #[test]
    fn one_notification_per_day() {
        let record = mark_sent(UserRecord::default(), NotificationKind::Daily, today());
        assert!(!should_send(&record, NotificationKind::Daily, today()));
        assert!(!should_send(&record, NotificationKind::Missed, today()));
        assert!(should_send(&record, NotificationKind::Daily, today() + Duration::days(1)));
    }

    #[test]
    fn smart_notification_prefers_missed_day() {
        let (record, smart) = smart_notification(UserRecord::default(), today(), &mut rng());
        let smart = smart.unwrap();
        assert_eq!(smart.kind, NotificationKind::Missed);
        assert_eq!(smart.priority, Priority::High);
        assert_eq!(record.last_notification_type, Some(NotificationKind::Missed));
        assert_eq!(record.last_notification_date, Some(date_key(today())));

        let (_, again) = smart_notification(record, today(), &mut rng());
        assert!(again.is_none());
    }

    #[test]
    fn smart_notification_falls_through_to_daily() {
        let yesterday = today() - Duration::days(1);
        let record = record_with(
            yesterday,
            DayEntry {
                reflection_completed: true,
                ..DayEntry::default()
            },
        );
        let (_, smart) = smart_notification(record, today(), &mut rng());
        let smart = smart.unwrap();
        assert_eq!(smart.kind, NotificationKind::Daily);
        assert_eq!(smart.priority, Priority::Normal);
    }

    #[test]
    fn browser_payload_shape() {
        let daily = browser_notification(NotificationKind::Daily, "hi");
        assert_eq!(daily.tag, "clearnext-daily");
        assert_eq!(daily.actions.len(), 2);
        let missed = browser_notification(NotificationKind::Missed, "hi");
        assert_eq!(missed.title, "🌅 CLEARNEXT - New Day");
        assert!(missed.actions.is_empty());
    }

    #[test]
    fn streak_message_bands() {
        let mut record = UserRecord::default();
        assert!(streak_message(&record, today()).starts_with("Ready to start"));

        for offset in 1..=3 {
            record.daily_progress.insert(
                date_key(today() - Duration::days(offset)),
                DayEntry {
                    task_completed: true,
                    ..DayEntry::default()
                },
            );
        }
        assert_eq!(
            streak_message(&record, today()),
            "3-day streak! You're building a powerful habit 🎯"
        );

        record.daily_progress.insert(
            date_key(today()),
            DayEntry {
                mood: Some(Mood::Okay),
                ..DayEntry::default()
            },
        );
        assert_eq!(
            streak_message(&record, today()),
            "You've checked in today! Complete your task to maintain your 3-day streak 🔥"
        );
    }

    #[test]
    fn parses_twelve_hour_times() {
        assert_eq!(parse_notification_time("9:00 AM"), NaiveTime::from_hms_opt(9, 0, 0));
        assert_eq!(parse_notification_time("12:15 AM"), NaiveTime::from_hms_opt(0, 15, 0));
        assert_eq!(parse_notification_time("12:30 PM"), NaiveTime::from_hms_opt(12, 30, 0));
        assert_eq!(parse_notification_time("7:45 pm"), NaiveTime::from_hms_opt(19, 45, 0));
        assert_eq!(parse_notification_time("later"), None);
    }

    #[test]
    fn notification_window_and_next_fire() {
        let profile = Profile {
            notification_time: Some("8:00 PM".into()),
            ..Profile::default()
        };
        let at = |h, m| today().and_hms_opt(h, m, 0).unwrap();

        assert!(is_notification_time(&profile, at(19, 30)));
        assert!(is_notification_time(&profile, at(20, 30)));
        assert!(!is_notification_time(&profile, at(20, 31)));

        assert_eq!(next_fire_at(&profile, at(9, 0)), at(20, 0));
        assert_eq!(next_fire_at(&profile, at(20, 0)), at(20, 0) + Duration::days(1));
    }

    #[derive(Default)]
    struct RecordingNotifier {
        shown: std::sync::Mutex<Vec<BrowserNotification>>,
    }

    impl Notifier for RecordingNotifier {
        fn show(&self, notification: &BrowserNotification) {
            self.shown.lock().unwrap().push(notification.clone());
        }
    }

    #[tokio::test]
    async fn service_sends_once_after_notification_time() {
        let store = Arc::new(MemoryProfileStore::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let service = NotificationService::with_rng(store.clone(), notifier.clone(), rng());

        let morning = today().and_hms_opt(8, 0, 0).unwrap();
        assert!(!service.check_and_send(morning).await.unwrap());

        let late = today().and_hms_opt(9, 5, 0).unwrap();
        assert!(service.check_and_send(late).await.unwrap());
        assert!(!service.check_and_send(late).await.unwrap());

        assert_eq!(notifier.shown.lock().unwrap().len(), 1);
        let record = load_user(store.as_ref()).await.unwrap();
        assert_eq!(record.last_notification_date, Some(date_key(today())));
    }

    #[tokio::test]
    async fn service_skips_completed_task_days() {
        let store = Arc::new(MemoryProfileStore::default());
        let record = record_with(
            today(),
            DayEntry {
                task_completed: true,
                ..DayEntry::default()
            },
        );
        save_user(store.as_ref(), &record).await.unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let service = NotificationService::with_rng(store, notifier.clone(), rng());

        let late = today().and_hms_opt(22, 0, 0).unwrap();
        assert!(!service.check_and_send(late).await.unwrap());
        assert!(notifier.shown.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreadable_record_is_never_overwritten() {
        let store = Arc::new(MemoryProfileStore::default());
        let blob = serde_json::json!({ "dailyProgress": "not a map" });
        store.set(crate::storage::USER_KEY, blob.clone()).await.unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let service = NotificationService::with_rng(store.clone(), notifier.clone(), rng());

        let late = today().and_hms_opt(21, 0, 0).unwrap();
        assert!(service.send_daily(late).await.is_err());
        assert!(notifier.shown.lock().unwrap().is_empty());
        assert_eq!(store.get(crate::storage::USER_KEY).await.unwrap(), Some(blob));
    }
}
