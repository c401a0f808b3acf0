//! Keyword classification: reminder patterns and news categories.
//!
//! Plain pattern matching — no provider call. The reminder parser produces
//! the instant a reminder should fire; the news table maps Chinese keywords
//! to feed category slugs.

use chrono::{DateTime, Duration, LocalResult, NaiveTime, TimeZone};

/// "等等通知我 <訊息>" fires this many minutes from now.
const SOON_DELAY_MINUTES: i64 = 5;

/// Prefix for "notify me in a bit".
const SOON_PREFIX: &str = "等等通知我";
/// Prefix for "remind me at HH:MM".
const AT_PREFIX: &str = "提醒我";

/// Corrective hint returned when a reminder request doesn't parse.
pub const REMINDER_USAGE_HINT: &str =
    "提醒用法：「等等通知我 訊息」或「提醒我 HH:MM 訊息」";

/// Result of reminder-pattern matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderParse<Tz: TimeZone> {
    /// Not a reminder request at all.
    NotReminder,
    /// A reminder scheduled at `due_at` carrying `message`.
    Scheduled {
        due_at: DateTime<Tz>,
        message: String,
    },
    /// Looked like a reminder but the time or message was missing/invalid.
    Invalid,
}

/// Match reminder patterns against `text`, relative to `now`.
pub fn parse_reminder<Tz: TimeZone>(text: &str, now: DateTime<Tz>) -> ReminderParse<Tz> {
    let text = text.trim();

    if let Some(rest) = text.strip_prefix(SOON_PREFIX) {
        let message = rest.trim();
        if message.is_empty() {
            return ReminderParse::Invalid;
        }
        return ReminderParse::Scheduled {
            due_at: now + Duration::minutes(SOON_DELAY_MINUTES),
            message: message.to_string(),
        };
    }

    if let Some(rest) = text.strip_prefix(AT_PREFIX) {
        let rest = rest.trim();
        let Some((time_part, message)) = rest.split_once(char::is_whitespace) else {
            return ReminderParse::Invalid;
        };
        let message = message.trim();
        if message.is_empty() {
            return ReminderParse::Invalid;
        }
        match NaiveTime::parse_from_str(time_part, "%H:%M") {
            Ok(time) => ReminderParse::Scheduled {
                due_at: next_occurrence(now, time),
                message: message.to_string(),
            },
            Err(_) => ReminderParse::Invalid,
        }
    } else {
        ReminderParse::NotReminder
    }
}

/// The next instant the wall clock reads `time`: later today, else tomorrow.
fn next_occurrence<Tz: TimeZone>(now: DateTime<Tz>, time: NaiveTime) -> DateTime<Tz> {
    let mut target = now.date_naive().and_time(time);
    if target <= now.naive_local() {
        target = target + Duration::days(1);
    }
    match now.timezone().from_local_datetime(&target) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(dt, _) => dt,
        // DST gap: fall back to the raw delay past the gap.
        LocalResult::None => now + Duration::days(1),
    }
}

/// News request kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewsQuery {
    /// Bare "新聞": general top headlines.
    Top,
    /// A recognized category keyword, mapped to a feed category slug.
    Category(&'static str),
    /// Free-text topic search.
    Keyword(String),
}

/// Chinese category keywords → feed category slugs.
const NEWS_CATEGORIES: &[(&str, &str)] = &[
    ("科技", "technology"),
    ("體育", "sports"),
    ("運動", "sports"),
    ("娛樂", "entertainment"),
    ("商業", "business"),
    ("財經", "business"),
    ("健康", "health"),
    ("科學", "science"),
    ("國際", "world"),
];

/// Match news request patterns: "新聞", "<類別>新聞", "新聞 <關鍵字>".
pub fn parse_news(text: &str) -> Option<NewsQuery> {
    let text = text.trim();
    if text == "新聞" {
        return Some(NewsQuery::Top);
    }

    if let Some(prefix) = text.strip_suffix("新聞") {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Some(NewsQuery::Top);
        }
        if let Some((_, slug)) = NEWS_CATEGORIES.iter().find(|(kw, _)| *kw == prefix) {
            return Some(NewsQuery::Category(slug));
        }
        return None;
    }

    if let Some(rest) = text.strip_prefix("新聞") {
        let rest = rest.trim();
        if rest.is_empty() {
            return Some(NewsQuery::Top);
        }
        return Some(NewsQuery::Keyword(rest.to_string()));
    }

    None
}
