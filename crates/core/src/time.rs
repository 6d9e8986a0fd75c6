//! Spanish time expression parsing
//!
//! Turns phrases like "mañana a las 3 de la tarde" into an hour, minute and
//! day offset, renders spoken confirmations, and resolves parsed times
//! against a clock.

use std::sync::LazyLock;

use chrono::{Duration, Local, NaiveDateTime};
use regex::Regex;

use crate::types::{ReminderDateTime, ReminderErrorKind, TimeParseResult};

// ============================================================================
// Patterns
// ============================================================================

/// Named times that short-circuit the hour cascade
const SPECIAL_TIMES: &[(&str, u32, u32)] = &[
    ("mediodía", 12, 0),
    ("medio día", 12, 0),
    ("medianoche", 0, 0),
    ("media noche", 0, 0),
];

/// Part-of-day qualifiers that must not be read as "tomorrow"
const MORNING_QUALIFIERS: &[&str] = &["por la mañana", "de la mañana"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HourTemplate {
    /// "a las 4 y 45 de la tarde"
    SpokenMinutesWithPeriod,
    /// "a las 4:45 de la tarde"
    ClockMinutesWithPeriod,
    /// "a las 3 de la tarde"
    HourWithPeriod,
    /// "a las 15:30"
    Clock24,
    /// "a las 7" at the end of the utterance
    BareHour,
}

static HOUR_TEMPLATES: LazyLock<Vec<(HourTemplate, Regex)>> = LazyLock::new(|| {
    [
        (
            HourTemplate::SpokenMinutesWithPeriod,
            r"a las ([0-9]{1,2})\s*y\s*([0-9]{1,2})\s*(?:de la|por la)?\s*(mañana|tarde|noche)",
        ),
        (
            HourTemplate::ClockMinutesWithPeriod,
            r"a las ([0-9]{1,2}):([0-9]{1,2})\s*(?:de la|por la)?\s*(mañana|tarde|noche)",
        ),
        (
            HourTemplate::HourWithPeriod,
            r"a las ([0-9]{1,2})\s*(?:de la|por la)?\s*(mañana|tarde|noche)",
        ),
        (HourTemplate::Clock24, r"a las ([0-9]{1,2}):([0-9]{2})"),
        (HourTemplate::BareHour, r"a las ([0-9]{1,2})\s*(?:horas?)?$"),
    ]
    .into_iter()
    .map(|(template, pattern)| (template, Regex::new(pattern).expect("Invalid regex")))
    .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Period {
    Morning,
    Afternoon,
    Night,
}

impl Period {
    fn parse(word: &str) -> Option<Self> {
        match word {
            "mañana" => Some(Period::Morning),
            "tarde" => Some(Period::Afternoon),
            "noche" => Some(Period::Night),
            _ => None,
        }
    }

    /// 12-hour clock reading to 24-hour, Spanish conventions
    fn to_24h(self, hour: u32) -> u32 {
        match self {
            Period::Morning if hour == 12 => 0,
            Period::Morning => hour,
            Period::Afternoon if hour == 12 => 12,
            Period::Afternoon => hour + 12,
            Period::Night if hour == 12 => 0,
            Period::Night if hour <= 11 => hour + 12,
            Period::Night => hour,
        }
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse a time phrase out of `text`
///
/// Returns `success = false` when no hour is recognised or the hour/minute
/// fall outside the 24-hour clock.
pub fn parse(text: &str) -> TimeParseResult {
    let text = text
        .to_lowercase()
        .trim()
        .trim_end_matches(['.', '!', '?'])
        .trim_end()
        .to_string();
    tracing::debug!(text = %text, "Parsing time expression");

    let mut result = TimeParseResult {
        day_offset: day_offset(&text),
        ..TimeParseResult::default()
    };

    for (phrase, hour, minute) in SPECIAL_TIMES {
        if text.contains(phrase) {
            result.hour = Some(*hour);
            result.minute = *minute;
            result.success = true;
            tracing::debug!(phrase = %phrase, "Special time detected");
            return result;
        }
    }

    for (template, re) in HOUR_TEMPLATES.iter() {
        let Some(caps) = re.captures(&text) else {
            continue;
        };
        let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
        let period = |i: usize| caps.get(i).and_then(|m| Period::parse(m.as_str()));

        let parsed = match template {
            HourTemplate::SpokenMinutesWithPeriod | HourTemplate::ClockMinutesWithPeriod => {
                match (number(1), number(2), period(3)) {
                    (Some(h), Some(m), Some(p)) => Some((p.to_24h(h), m)),
                    _ => None,
                }
            }
            HourTemplate::HourWithPeriod => match (number(1), period(2)) {
                (Some(h), Some(p)) => Some((p.to_24h(h), 0)),
                _ => None,
            },
            HourTemplate::Clock24 => number(1).zip(number(2)),
            HourTemplate::BareHour => number(1).map(|h| (bare_hour(h), 0)),
        };

        if let Some((hour, minute)) = parsed {
            tracing::debug!(?template, hour, minute, "Hour template matched");
            result.hour = Some(hour);
            result.minute = minute;
            result.success = hour <= 23 && minute <= 59;
            if !result.success {
                tracing::warn!(hour, minute, "Parsed time out of range");
            }
        }
        break;
    }

    if !result.success {
        tracing::debug!(text = %text, "No time recognised");
    }
    result
}

/// "pasado mañana" first, then "mañana" unless it only qualifies the hour
fn day_offset(text: &str) -> u32 {
    if text.contains("pasado mañana") {
        return 2;
    }
    let mut rest = text.to_string();
    for qualifier in MORNING_QUALIFIERS {
        rest = rest.replace(qualifier, " ");
    }
    if rest.contains("mañana") {
        1
    } else {
        0
    }
}

/// Without a period, 1-7 are read as afternoon hours
fn bare_hour(hour: u32) -> u32 {
    if (1..=7).contains(&hour) {
        tracing::debug!(hour, "Ambiguous hour, assuming afternoon");
        hour + 12
    } else {
        hour
    }
}

// ============================================================================
// Confirmation
// ============================================================================

/// Spoken confirmation, e.g. "mañana a las 3 de la tarde"
pub fn format_confirmation(hour: u32, minute: u32, day_offset: u32) -> String {
    let (display_hour, period) = match hour {
        0 => (12, "medianoche"),
        h if h < 12 => (h, "de la mañana"),
        12 => (12, "del mediodía"),
        h if h < 19 => (h - 12, "de la tarde"),
        h => (h - 12, "de la noche"),
    };

    let time = if minute == 0 {
        format!("las {} {}", display_hour, period)
    } else {
        format!("las {}:{:02} {}", display_hour, minute, period)
    };

    let day = match day_offset {
        0 => "hoy".to_string(),
        1 => "mañana".to_string(),
        2 => "pasado mañana".to_string(),
        n => format!("en {} días", n),
    };

    format!("{} a {}", day, time)
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve against the local wall clock
pub fn resolve_datetime(hour: u32, minute: u32, day_offset: u32) -> ReminderDateTime {
    resolve_datetime_at(Local::now().naive_local(), hour, minute, day_offset)
}

/// Resolve a parsed time relative to `now`
///
/// A same-day time that is not strictly in the future is rejected rather
/// than rolled over to tomorrow.
pub fn resolve_datetime_at(
    now: NaiveDateTime,
    hour: u32,
    minute: u32,
    day_offset: u32,
) -> ReminderDateTime {
    let Some(base) = now.date().and_hms_opt(hour, minute, 0) else {
        tracing::warn!(hour, minute, "Reminder time out of range");
        return ReminderDateTime::failed(
            ReminderErrorKind::TimeOutOfRange,
            format!("La hora {:02}:{:02} no es válida.", hour, minute),
        );
    };

    if day_offset == 0 && base <= now {
        tracing::warn!(hour, minute, "Reminder time already passed today");
        return ReminderDateTime::failed(
            ReminderErrorKind::TimePassed,
            format!(
                "Esa hora ya pasó. Di 'mañana a las {:02}:{:02}' si quieres el recordatorio para mañana.",
                hour, minute
            ),
        );
    }

    match base.checked_add_signed(Duration::days(i64::from(day_offset))) {
        Some(datetime) => ReminderDateTime::resolved(datetime),
        None => {
            tracing::warn!(day_offset, "Reminder date out of range");
            ReminderDateTime::failed(
                ReminderErrorKind::TimeOutOfRange,
                format!("La fecha dentro de {} días no es válida.", day_offset),
            )
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn hm(text: &str) -> (Option<u32>, u32, u32, bool) {
        let r = parse(text);
        (r.hour, r.minute, r.day_offset, r.success)
    }

    #[test]
    fn test_afternoon() {
        assert_eq!(hm("a las 3 de la tarde"), (Some(15), 0, 0, true));
    }

    #[test]
    fn test_morning_is_not_tomorrow() {
        assert_eq!(hm("a las 8 de la mañana"), (Some(8), 0, 0, true));
        assert_eq!(hm("a las 9 por la mañana"), (Some(9), 0, 0, true));
    }

    #[test]
    fn test_night() {
        assert_eq!(hm("a las 10 de la noche"), (Some(22), 0, 0, true));
        assert_eq!(hm("a las 12 de la noche"), (Some(0), 0, 0, true));
    }

    #[test]
    fn test_spoken_minutes() {
        assert_eq!(hm("a las 4 y 45 de la tarde"), (Some(16), 45, 0, true));
    }

    #[test]
    fn test_clock_minutes_with_period() {
        assert_eq!(hm("a las 4:30 de la tarde"), (Some(16), 30, 0, true));
    }

    #[test]
    fn test_clock_24h() {
        assert_eq!(hm("a las 15:30"), (Some(15), 30, 0, true));
    }

    #[test]
    fn test_bare_hour_heuristic() {
        assert_eq!(hm("a las 7"), (Some(19), 0, 0, true));
        assert_eq!(hm("a las 9"), (Some(9), 0, 0, true));
        assert_eq!(hm("a las 12"), (Some(12), 0, 0, true));
        assert_eq!(hm("a las 18 horas"), (Some(18), 0, 0, true));
    }

    #[test]
    fn test_trailing_punctuation_ignored() {
        assert_eq!(hm("a las 7."), (Some(19), 0, 0, true));
    }

    #[test]
    fn test_special_times() {
        assert_eq!(hm("al mediodía"), (Some(12), 0, 0, true));
        assert_eq!(hm("a medianoche"), (Some(0), 0, 0, true));
        assert_eq!(hm("mañana al medio día"), (Some(12), 0, 1, true));
    }

    #[test]
    fn test_day_offsets() {
        assert_eq!(hm("mañana a las 2 de la tarde"), (Some(14), 0, 1, true));
        assert_eq!(hm("pasado mañana a las 2 de la tarde"), (Some(14), 0, 2, true));
        assert_eq!(hm("mañana a las 8 de la mañana"), (Some(8), 0, 1, true));
    }

    #[test]
    fn test_out_of_range_is_failure() {
        let r = parse("a las 15 de la tarde");
        assert_eq!(r.hour, Some(27));
        assert!(!r.success);
        assert!(!parse("a las 25:00").success);
    }

    #[test]
    fn test_no_time() {
        let r = parse("llamar al doctor");
        assert_eq!(r.hour, None);
        assert!(!r.success);
    }

    #[test]
    fn test_format_confirmation() {
        assert_eq!(format_confirmation(15, 0, 0), "hoy a las 3 de la tarde");
        assert_eq!(format_confirmation(8, 30, 1), "mañana a las 8:30 de la mañana");
        assert_eq!(format_confirmation(0, 0, 2), "pasado mañana a las 12 medianoche");
        assert_eq!(format_confirmation(12, 0, 0), "hoy a las 12 del mediodía");
        assert_eq!(format_confirmation(21, 5, 4), "en 4 días a las 9:05 de la noche");
    }

    #[test]
    fn test_confirmation_round_trip() {
        let spoken = format_confirmation(15, 0, 0);
        let r = parse(&spoken);
        assert_eq!((r.hour, r.minute, r.day_offset), (Some(15), 0, 0));
    }

    #[test]
    fn test_parse_is_idempotent() {
        let text = "mañana a las 4 y 45 de la tarde";
        assert_eq!(parse(text), parse(text));
    }

    #[test]
    fn test_resolve_future_today() {
        let r = resolve_datetime_at(at(10, 0), 15, 0, 0);
        assert!(r.success);
        assert_eq!(r.datetime, Some(at(15, 0)));
    }

    #[test]
    fn test_resolve_passed_today() {
        let r = resolve_datetime_at(at(16, 0), 15, 0, 0);
        assert!(!r.success);
        assert_eq!(r.error, Some(ReminderErrorKind::TimePassed));
        assert_eq!(
            r.user_message.as_deref(),
            Some("Esa hora ya pasó. Di 'mañana a las 15:00' si quieres el recordatorio para mañana.")
        );
    }

    #[test]
    fn test_resolve_now_counts_as_passed() {
        let r = resolve_datetime_at(at(15, 0), 15, 0, 0);
        assert_eq!(r.error, Some(ReminderErrorKind::TimePassed));
    }

    #[test]
    fn test_resolve_tomorrow() {
        let r = resolve_datetime_at(at(16, 0), 15, 0, 1);
        let expected = NaiveDate::from_ymd_opt(2024, 5, 11)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap();
        assert_eq!(r.datetime, Some(expected));
    }

    #[test]
    fn test_resolve_out_of_range() {
        let r = resolve_datetime_at(at(10, 0), 27, 0, 0);
        assert_eq!(r.error, Some(ReminderErrorKind::TimeOutOfRange));
        assert_eq!(r.user_message.as_deref(), Some("La hora 27:00 no es válida."));
    }

    #[test]
    fn test_resolve_day_offset_overflow() {
        let r = resolve_datetime_at(at(10, 0), 15, 0, u32::MAX);
        assert!(!r.success);
        assert_eq!(r.error, Some(ReminderErrorKind::TimeOutOfRange));
        assert_eq!(r.datetime, None);
    }
}
