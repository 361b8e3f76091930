//! Display formatting shared by the views.

use chrono::{DateTime, Local, TimeZone, Utc};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::model::{Clock, GameState, PeriodDescriptor};

pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// `1st`, `2nd`, `3rd`, `OT`, `2OT`, `SO`.
pub fn period_label(period: &PeriodDescriptor) -> String {
    match period.period_type.as_str() {
        "SO" => "SO".to_string(),
        "OT" if period.number > 4 => format!("{}OT", period.number - 3),
        "OT" => "OT".to_string(),
        _ if period.number == 0 => "-".to_string(),
        _ => ordinal(period.number),
    }
}

/// One-line status for a game: start time, running clock or final marker.
pub fn status_label(
    state: &GameState,
    period: Option<&PeriodDescriptor>,
    clock: Option<&Clock>,
) -> String {
    match state {
        GameState::Fut => "Scheduled".to_string(),
        GameState::Pre => "Pre-game".to_string(),
        GameState::Live | GameState::Crit => {
            let Some(period) = period else {
                return "Live".to_string();
            };
            let label = period_label(period);
            match clock {
                Some(c) if c.in_intermission => format!("{label} INT"),
                Some(c) if !c.time_remaining.is_empty() => {
                    format!("{label} {}", c.time_remaining)
                }
                _ => label,
            }
        }
        GameState::Final | GameState::Off => match period.map(|p| p.period_type.as_str()) {
            Some("OT") => "Final/OT".to_string(),
            Some("SO") => "Final/SO".to_string(),
            _ => "Final".to_string(),
        },
        GameState::Unknown(raw) => raw.clone(),
    }
}

/// Single-cell marker for a play-by-play row.
pub fn event_icon(type_desc_key: &str) -> &'static str {
    match type_desc_key {
        "goal" => "●",
        "shot-on-goal" => "◎",
        "missed-shot" => "○",
        "blocked-shot" => "◌",
        "hit" => "✕",
        "penalty" => "▲",
        "faceoff" => "◆",
        "giveaway" | "takeaway" => "↔",
        "period-start" | "period-end" | "game-end" => "│",
        _ => "·",
    }
}

/// Cut `text` to at most `width` terminal columns, ending with `…` when cut.
pub fn truncate_text(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// Truncate then right-pad with spaces to exactly `width` columns.
pub fn pad_text(text: &str, width: usize) -> String {
    let mut out = truncate_text(text, width);
    let fill = width.saturating_sub(out.width());
    out.extend(std::iter::repeat(' ').take(fill));
    out
}

/// Puck-drop time in the local zone, `TBD` when unknown.
pub fn start_time_label(start: Option<DateTime<Utc>>) -> String {
    start_time_in(start, &Local)
}

pub fn start_time_in<Tz: TimeZone>(start: Option<DateTime<Utc>>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match start {
        Some(t) => t.with_timezone(tz).format("%H:%M").to_string(),
        None => "TBD".to_string(),
    }
}
