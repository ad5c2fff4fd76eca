//! Display attributes for the queue board.
//!
//! Everything here is a pure function of queue entry fields; unknown
//! stations and statuses map to a neutral gray badge.

use chrono::{DateTime, Local};
use shared::{
    domain::{QueueEntryId, QueueStatus, Station},
    protocol::{QueueEntry, QueueStats},
};

use crate::queue::QueueSnapshot;

const WAIT_WARNING_MINUTES: i64 = 15;
const WAIT_CRITICAL_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeColor {
    Blue,
    Purple,
    Green,
    Amber,
    Red,
    Gray,
}

impl BadgeColor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Purple => "purple",
            Self::Green => "green",
            Self::Amber => "amber",
            Self::Red => "red",
            Self::Gray => "gray",
        }
    }

    pub fn hex(self) -> &'static str {
        match self {
            Self::Blue => "#3b82f6",
            Self::Purple => "#8b5cf6",
            Self::Green => "#22c55e",
            Self::Amber => "#f59e0b",
            Self::Red => "#ef4444",
            Self::Gray => "#6b7280",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub color: BadgeColor,
    pub label: String,
}

impl Badge {
    fn new(color: BadgeColor, label: impl Into<String>) -> Self {
        Self {
            color,
            label: label.into(),
        }
    }
}

pub fn station_badge(station: &Station) -> Badge {
    match station {
        Station::Vitals => Badge::new(BadgeColor::Blue, "Vitals"),
        Station::Consultation => Badge::new(BadgeColor::Purple, "Consultation"),
        Station::Dispensary => Badge::new(BadgeColor::Green, "Dispensary"),
        Station::Other(raw) => Badge::new(BadgeColor::Gray, humanize_or(raw, "Unassigned")),
    }
}

pub fn status_badge(status: &QueueStatus) -> Badge {
    match status {
        QueueStatus::Waiting => Badge::new(BadgeColor::Amber, "Waiting"),
        QueueStatus::InVitals => Badge::new(BadgeColor::Blue, "In Vitals"),
        QueueStatus::InConsultation => Badge::new(BadgeColor::Purple, "In Consultation"),
        QueueStatus::InDispensary => Badge::new(BadgeColor::Green, "In Dispensary"),
        QueueStatus::Other(raw) => Badge::new(BadgeColor::Gray, humanize_or(raw, "Unknown")),
    }
}

pub fn wait_time_badge(minutes: i64) -> Badge {
    let color = if minutes < WAIT_WARNING_MINUTES {
        BadgeColor::Green
    } else if minutes < WAIT_CRITICAL_MINUTES {
        BadgeColor::Amber
    } else {
        BadgeColor::Red
    };
    Badge::new(color, format_wait_time(minutes))
}

pub fn format_wait_time(minutes: i64) -> String {
    match minutes {
        m if m <= 0 => "Just arrived".to_string(),
        m if m < 60 => format!("{m} min"),
        m => format!("{}h {}m", m / 60, m % 60),
    }
}

/// `in_consultation` -> `In Consultation`; blank input yields `fallback`.
fn humanize_or(raw: &str, fallback: &str) -> String {
    let words = raw
        .split(['_', '-', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>();

    if words.is_empty() {
        fallback.to_string()
    } else {
        words.join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueRow {
    pub id: QueueEntryId,
    pub queue_number: String,
    pub patient_name: String,
    pub reason_for_visit: String,
    pub station: Badge,
    pub status: Badge,
    pub wait: Badge,
}

pub fn queue_row(entry: &QueueEntry) -> QueueRow {
    QueueRow {
        id: entry.id.clone(),
        queue_number: entry
            .queue_number
            .as_deref()
            .map(|number| format!("#{number}"))
            .unwrap_or_else(|| "-".to_string()),
        patient_name: entry.patient_name.clone(),
        reason_for_visit: entry
            .reason_for_visit
            .clone()
            .filter(|reason| !reason.trim().is_empty())
            .unwrap_or_else(|| "-".to_string()),
        station: station_badge(&entry.station),
        status: status_badge(&entry.status),
        wait: wait_time_badge(entry.wait_time_minutes),
    }
}

/// Render model for the queue screen.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueBoard {
    /// First entries in server order, never re-sorted.
    pub rows: Vec<QueueRow>,
    pub hidden_count: usize,
    pub stats: QueueStats,
    pub clock: String,
    pub date: String,
    pub last_refreshed: Option<String>,
}

pub fn build_board(snapshot: &QueueSnapshot, now: DateTime<Local>, limit: usize) -> QueueBoard {
    let rows = snapshot
        .entries
        .iter()
        .take(limit)
        .map(queue_row)
        .collect::<Vec<_>>();

    QueueBoard {
        hidden_count: snapshot.entries.len().saturating_sub(rows.len()),
        rows,
        stats: snapshot.stats.clone(),
        clock: now.format("%H:%M:%S").to_string(),
        date: now.format("%A, %d %B %Y").to_string(),
        last_refreshed: snapshot
            .refreshed_at
            .map(|at| at.format("%H:%M:%S").to_string()),
    }
}

#[cfg(test)]
#[path = "tests/presentation_tests.rs"]
mod tests;
