//! Rolling summaries that keep older context alive after messages are evicted.
//!
//! The default [`PatternSummaryStrategy`] is deterministic and offline: it pulls
//! weight-loss facts, achievements and goals out of recent user messages with
//! regular expressions and falls back to a list of recent topics.

use buddy_core::Message;
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::conversation::{UserConversation, NO_HISTORY_SUMMARY};

/// How many of the most recent user messages are mined for key phrases.
pub const SUMMARY_WINDOW: usize = 10;
pub const MAX_KEY_PHRASES: usize = 5;
pub const TOPIC_COUNT: usize = 3;
pub const TOPIC_PREVIEW_CHARS: usize = 50;
/// Also summarize whenever the log length is a multiple of this.
pub const SUMMARY_MESSAGE_INTERVAL: usize = 10;

/// Produces a summary string from a conversation's message log.
pub trait SummaryStrategy: Send + Sync {
    fn summarize(&self, messages: &[Message]) -> String;
}

// "5 kg afgevallen", "3,5 kilo kwijt", "2 kg lost"
static WEIGHT_AFTER_AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d+(?:[.,]\d+)?)\s*(?:kg|kilo(?:gram)?(?:'s)?)\s+(?:\w+\s+)?(?:afgevallen|kwijt|verloren|lost)\b")
        .expect("Invalid regex pattern")
});

// "lost 5 kg", "verloren: 2 kilo"
static WEIGHT_BEFORE_AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:afgevallen|verloren|lost)\b[:\s]+(\d+(?:[.,]\d+)?)\s*(?:kg|kilo)")
        .expect("Invalid regex pattern")
});

static ACHIEVEMENT_CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:ik heb|ik ben|i have|i've)\s+([^.!?\n]{10,99})")
        .expect("Invalid regex pattern")
});

// An "ik heb ..." clause only counts when it reports something done.
static ACHIEVEMENT_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:gehaald|bereikt|volgehouden|gesport|getraind|gelopen|gewandeld|gefietst|gezwommen|afgevallen|gestopt|gelukt|achieved|reached|completed|managed|lost)\b")
        .expect("Invalid regex pattern")
});

static GOAL_CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:mijn doel is|my goal is)\s+(?:om\s+|to\s+)?([^.!?\n]{10,99})")
        .expect("Invalid regex pattern")
});

/// Key phrases found in one message, in the order they appear by category.
pub fn extract_key_phrases(text: &str) -> Vec<String> {
    let mut phrases = Vec::new();

    for re in [&*WEIGHT_AFTER_AMOUNT, &*WEIGHT_BEFORE_AMOUNT] {
        for cap in re.captures_iter(text) {
            phrases.push(format!("Lost {} kg", &cap[1]));
        }
    }

    for cap in ACHIEVEMENT_CLAUSE.captures_iter(text) {
        let clause = cap[1].trim();
        // Weight losses are already reported as "Lost N kg"
        let is_weight = WEIGHT_AFTER_AMOUNT.is_match(clause) || WEIGHT_BEFORE_AMOUNT.is_match(clause);
        if ACHIEVEMENT_WORDS.is_match(clause) && !is_weight {
            phrases.push(clause.to_string());
        }
    }

    for cap in GOAL_CLAUSE.captures_iter(text) {
        phrases.push(format!("Goal: {}", cap[1].trim()));
    }

    phrases
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PatternSummaryStrategy;

impl PatternSummaryStrategy {
    fn key_information(user_messages: &[&Message]) -> Option<String> {
        let start = user_messages.len().saturating_sub(SUMMARY_WINDOW);
        let mut phrases: Vec<String> = Vec::new();

        for message in &user_messages[start..] {
            for phrase in extract_key_phrases(&message.content) {
                if !phrases.contains(&phrase) {
                    phrases.push(phrase);
                }
            }
        }
        phrases.truncate(MAX_KEY_PHRASES);

        if phrases.is_empty() {
            None
        } else {
            Some(format!("Key information: {}", phrases.join(", ")))
        }
    }

    fn recent_topics(user_messages: &[&Message]) -> String {
        let start = user_messages.len().saturating_sub(TOPIC_COUNT);
        let topics: Vec<String> = user_messages[start..]
            .iter()
            .map(|m| preview(&m.content, TOPIC_PREVIEW_CHARS))
            .collect();

        format!("Recent topics: {}", topics.join(", "))
    }
}

impl SummaryStrategy for PatternSummaryStrategy {
    fn summarize(&self, messages: &[Message]) -> String {
        let user_messages: Vec<&Message> = messages.iter().filter(|m| m.is_user()).collect();
        if user_messages.is_empty() {
            return NO_HISTORY_SUMMARY.to_string();
        }

        Self::key_information(&user_messages).unwrap_or_else(|| Self::recent_topics(&user_messages))
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Whether `conversation` is due for a fresh summary at `now`.
pub fn should_update_conversation_summary(conversation: &UserConversation, now: DateTime<Utc>) -> bool {
    let count = conversation.messages.len();
    if count == 0 {
        return false;
    }

    let stale = now - conversation.last_summary_update >= Duration::hours(24);
    stale || count % SUMMARY_MESSAGE_INTERVAL == 0
}
