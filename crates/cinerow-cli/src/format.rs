//! Plain-text rendering of catalog values.

use cinerow_core::history::HistoryEntry;
use cinerow_core::models::{CastMember, Episode, Title};

/// One-line summary: name, year, kind, match and rating.
pub fn title_line(title: &Title) -> String {
    format!(
        "[{}] {} ({}) · {} · {}% match · {} · {}",
        title.id,
        title.name,
        title.year,
        title.kind(),
        title.match_score,
        title.rating,
        title.duration,
    )
}

pub fn cast_line(member: &CastMember) -> String {
    if member.character.is_empty() {
        member.name.clone()
    } else {
        format!("{} as {}", member.name, member.character)
    }
}

pub fn episode_line(ep: &Episode) -> String {
    let mut line = format!("E{:02} {}", ep.episode_number, ep.name);
    if let Some(mins) = ep.runtime {
        line.push_str(&format!(" ({mins}m)"));
    }
    if !ep.air_date.is_empty() {
        line.push_str(&format!(" · {}", ep.air_date));
    }
    line
}

pub fn history_line(entry: &HistoryEntry) -> String {
    format!(
        "{} · {:.0}% · {}",
        title_line(&entry.item),
        entry.progress,
        relative_time(&entry.watched_at)
    )
}

/// Format a UTC timestamp as a human-readable relative time string.
pub fn relative_time(dt: &chrono::DateTime<chrono::Utc>) -> String {
    let secs = (chrono::Utc::now() - *dt).num_seconds().max(0);

    if secs < 60 {
        "just now".into()
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86400 {
        format!("{}h ago", secs / 3600)
    } else {
        format!("{}d ago", secs / 86400)
    }
}

/// Cut `text` to at most `max` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
