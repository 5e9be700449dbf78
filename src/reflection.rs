use crate::models::Mood;
use crate::templates::pick;
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use serde::Serialize;

const MIN_CHARACTERS: usize = 20;
const MIN_MEANINGFUL_SIGNALS: usize = 2;

static TERSE_ENDING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(ok|good|fine|bad|alright)\s*$").expect("valid regex"));
static UNCERTAIN_OPENER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(idk|dunno|no idea|not sure)").expect("valid regex"));
static LETTERS_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^[a-z\s]+$").expect("valid regex"));
static REFLECTIVE_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(because|since|as|due to|feel|think|believe|realize|understand|learn)\b")
        .expect("valid regex")
});
static EVALUATIVE_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(challenge|difficult|easy|helpful|useful|confusing|clear|interesting)\b")
        .expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReflectionAnalysis {
    pub is_rushed: bool,
    pub is_empty: bool,
    pub is_meaningful: bool,
    pub word_count: usize,
    pub character_count: usize,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReflectionFeedback {
    pub can_continue: bool,
    pub message: String,
    pub kind: FeedbackKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Success,
    Warning,
}

/// Text plus the counts the rules look at.
pub struct Sample<'a> {
    pub text: &'a str,
    pub word_count: usize,
    pub character_count: usize,
}

impl<'a> Sample<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            word_count: text.split_whitespace().count(),
            character_count: text.chars().count(),
        }
    }
}

/// A named predicate over a sample.
pub struct Rule {
    pub name: &'static str,
    pub matches: fn(&Sample<'_>) -> bool,
}

/// Evaluated in order; the first hit marks the text as rushed.
pub static RUSHED_RULES: &[Rule] = &[
    Rule {
        name: "terse_ending",
        matches: |s| TERSE_ENDING.is_match(s.text),
    },
    Rule {
        name: "uncertain_opener",
        matches: |s| UNCERTAIN_OPENER.is_match(s.text),
    },
    Rule {
        name: "repeated_characters",
        matches: |s| has_repeated_run(s.text, 5),
    },
    Rule {
        name: "letters_only",
        matches: |s| LETTERS_ONLY.is_match(s.text),
    },
    Rule {
        name: "too_few_words",
        matches: |s| s.word_count < 10,
    },
];

pub static MEANINGFUL_RULES: &[Rule] = &[
    Rule {
        name: "reflective_vocabulary",
        matches: |s| REFLECTIVE_WORDS.is_match(s.text),
    },
    Rule {
        name: "evaluative_vocabulary",
        matches: |s| EVALUATIVE_WORDS.is_match(s.text),
    },
    Rule {
        name: "enough_words",
        matches: |s| s.word_count >= 15,
    },
    Rule {
        name: "enough_characters",
        matches: |s| s.character_count >= 50,
    },
];

/// First rushed rule that fires, if any.
pub fn rushed_rule(sample: &Sample<'_>) -> Option<&'static str> {
    RUSHED_RULES
        .iter()
        .find(|rule| (rule.matches)(sample))
        .map(|rule| rule.name)
}

pub fn meaningful_signals(sample: &Sample<'_>) -> usize {
    MEANINGFUL_RULES
        .iter()
        .filter(|rule| (rule.matches)(sample))
        .count()
}

pub fn analyze(text: &str) -> ReflectionAnalysis {
    let sample = Sample::new(text);
    let mut analysis = ReflectionAnalysis {
        is_rushed: false,
        is_empty: false,
        is_meaningful: false,
        word_count: sample.word_count,
        character_count: sample.character_count,
        issues: Vec::new(),
        recommendations: Vec::new(),
    };

    if sample.character_count < MIN_CHARACTERS {
        analysis.is_empty = true;
        analysis.issues.push("Reflection is too short to be meaningful".to_string());
        analysis
            .recommendations
            .push("Please share more detailed thoughts about your experience".to_string());
    }

    if rushed_rule(&sample).is_some() {
        analysis.is_rushed = true;
        analysis.issues.push("Reflection appears rushed or lacks depth".to_string());
        analysis
            .recommendations
            .push("Take time to honestly reflect on your experience".to_string());
    }

    analysis.is_meaningful = meaningful_signals(&sample) >= MIN_MEANINGFUL_SIGNALS;

    if !analysis.is_meaningful && !analysis.is_empty && !analysis.is_rushed {
        analysis.issues.push("Reflection could be more detailed".to_string());
        analysis
            .recommendations
            .push("Consider sharing specific examples or feelings".to_string());
    }

    analysis
}

/// Local submission gate. Advisory only: the backend validates again.
pub fn feedback(analysis: &ReflectionAnalysis) -> ReflectionFeedback {
    if analysis.is_meaningful {
        return ReflectionFeedback {
            can_continue: true,
            message: "Thank you for your thoughtful reflection.".to_string(),
            kind: FeedbackKind::Success,
        };
    }

    let mut message = String::from("Please provide a more honest reflection: ");
    if !analysis.issues.is_empty() {
        message.push_str(&analysis.issues.join(". "));
        message.push_str(". ");
    }
    if !analysis.recommendations.is_empty() {
        message.push_str("Suggestions: ");
        message.push_str(&analysis.recommendations.join(". "));
    }

    ReflectionFeedback {
        can_continue: false,
        message,
        kind: FeedbackKind::Warning,
    }
}

const APPRECIATION_LOW: &[&str] = &[
    "You showed up today. That matters.",
    "Taking time for yourself is wisdom.",
    "Small steps create real change.",
    "Your consistency builds strength.",
    "Being here is enough today.",
];

const APPRECIATION_OKAY: &[&str] = &[
    "Your steady effort is impressive.",
    "You're building real momentum.",
    "Consistency is your superpower.",
    "Your dedication shows character.",
    "Keep going, you're doing well.",
];

const APPRECIATION_GOOD: &[&str] = &[
    "Your energy today is inspiring!",
    "Fantastic focus and commitment.",
    "You're making real progress.",
    "Your positive approach works.",
    "Excellent work today!",
];

pub fn appreciation_templates(mood: Option<Mood>) -> &'static [&'static str] {
    match mood.unwrap_or(Mood::Okay) {
        Mood::Low => APPRECIATION_LOW,
        Mood::Okay => APPRECIATION_OKAY,
        Mood::Good => APPRECIATION_GOOD,
    }
}

/// One-line appreciation after a completed day.
pub fn micro_appreciation<R: Rng + ?Sized>(mood: Option<Mood>, rng: &mut R) -> String {
    pick(rng, appreciation_templates(mood)).to_string()
}

fn has_repeated_run(text: &str, run: usize) -> bool {
    let mut previous = None;
    let mut length = 0;
    for ch in text.chars() {
        if ch == '\n' || ch == '\r' {
            previous = None;
            length = 0;
            continue;
        }
        if Some(ch) == previous {
            length += 1;
        } else {
            previous = Some(ch);
            length = 1;
        }
        if length >= run {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    const THOUGHTFUL: &str = "Today I realized that planning my study blocks matters because I feel \
        calmer when the next step is already written down in my notebook.";

    #[test]
    fn short_text_is_empty_and_not_meaningful() {
        let analysis = analyze("too short");
        assert!(analysis.is_empty);
        assert!(!analysis.is_meaningful);
        assert_eq!(analysis.character_count, 9);
    }

    #[test]
    fn bare_ok_is_rushed() {
        let analysis = analyze("ok");
        assert!(analysis.is_rushed);
        assert!(analysis.is_empty);
        assert_eq!(analysis.word_count, 1);
    }

    #[test]
    fn thoughtful_text_passes_the_gate() {
        let analysis = analyze(THOUGHTFUL);
        assert!(analysis.word_count >= 15);
        assert!(analysis.is_meaningful);
        assert!(!analysis.is_empty);
        assert!(feedback(&analysis).can_continue);
    }

    #[test]
    fn rushed_rules_short_circuit_in_order() {
        assert_eq!(rushed_rule(&Sample::new("idk, it went fine i guess.")), Some("uncertain_opener"));
        assert_eq!(
            rushed_rule(&Sample::new("Today was sooooo long, but I still finished the chapter.")),
            Some("repeated_characters")
        );
        assert_eq!(rushed_rule(&Sample::new("The day went ok")), Some("terse_ending"));
        assert_eq!(
            rushed_rule(&Sample::new("i read two chapters and wrote notes on both of them today")),
            Some("letters_only")
        );
        assert_eq!(rushed_rule(&Sample::new(THOUGHTFUL)), None);
    }

    #[test]
    fn middling_text_asks_for_detail() {
        let text = "Read chapter 4, then 5. Took notes; reviewed them at 9pm. Slept early.";
        let analysis = analyze(text);
        assert!(!analysis.is_empty);
        assert!(!analysis.is_rushed);
        assert!(!analysis.is_meaningful);
        assert_eq!(analysis.issues, vec!["Reflection could be more detailed".to_string()]);
    }

    #[test]
    fn blocked_feedback_lists_issues_and_suggestions() {
        let result = feedback(&analyze("ok"));
        assert!(!result.can_continue);
        assert_eq!(result.kind, FeedbackKind::Warning);
        assert_eq!(
            result.message,
            "Please provide a more honest reflection: Reflection is too short to be meaningful. \
             Reflection appears rushed or lacks depth. Suggestions: Please share more detailed \
             thoughts about your experience. Take time to honestly reflect on your experience"
        );
    }

    #[test]
    fn appreciation_follows_mood() {
        let mut rng = StdRng::seed_from_u64(3);
        let low = micro_appreciation(Some(Mood::Low), &mut rng);
        assert!(APPRECIATION_LOW.contains(&low.as_str()));
        let default = micro_appreciation(None, &mut rng);
        assert!(APPRECIATION_OKAY.contains(&default.as_str()));
    }
}
