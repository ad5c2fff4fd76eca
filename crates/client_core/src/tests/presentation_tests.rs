use super::*;
use chrono::TimeZone;

fn entry(id: i64, station: Station, status: QueueStatus, wait: i64) -> QueueEntry {
    QueueEntry {
        id: QueueEntryId::new(id.to_string()),
        patient_name: format!("Patient {id}"),
        station,
        status,
        queue_number: Some(id.to_string()),
        reason_for_visit: Some("Check-up".to_string()),
        wait_time_minutes: wait,
    }
}

#[test]
fn known_stations_have_distinct_colors() {
    assert_eq!(station_badge(&Station::Vitals).color, BadgeColor::Blue);
    assert_eq!(station_badge(&Station::Consultation).color, BadgeColor::Purple);
    assert_eq!(station_badge(&Station::Dispensary).color, BadgeColor::Green);
    assert_eq!(station_badge(&Station::Dispensary).label, "Dispensary");
}

#[test]
fn unknown_station_and_status_fall_back_to_gray() {
    let station = station_badge(&Station::Other("x_ray_room".to_string()));
    assert_eq!(station.color, BadgeColor::Gray);
    assert_eq!(station.label, "X Ray Room");

    let blank = station_badge(&Station::Other(String::new()));
    assert_eq!(blank.label, "Unassigned");

    let status = status_badge(&QueueStatus::Other("on_hold".to_string()));
    assert_eq!(status.color, BadgeColor::Gray);
    assert_eq!(status.label, "On Hold");

    assert_eq!(status_badge(&QueueStatus::default()).label, "Unknown");
}

#[test]
fn status_labels_are_human_readable() {
    assert_eq!(status_badge(&QueueStatus::Waiting).label, "Waiting");
    assert_eq!(status_badge(&QueueStatus::InVitals).label, "In Vitals");
    assert_eq!(
        status_badge(&QueueStatus::InConsultation).label,
        "In Consultation"
    );
    assert_eq!(status_badge(&QueueStatus::InDispensary).color, BadgeColor::Green);
}

#[test]
fn wait_time_thresholds() {
    assert_eq!(wait_time_badge(0).color, BadgeColor::Green);
    assert_eq!(wait_time_badge(14).color, BadgeColor::Green);
    assert_eq!(wait_time_badge(15).color, BadgeColor::Amber);
    assert_eq!(wait_time_badge(29).color, BadgeColor::Amber);
    assert_eq!(wait_time_badge(30).color, BadgeColor::Red);
}

#[test]
fn formats_wait_time() {
    assert_eq!(format_wait_time(-3), "Just arrived");
    assert_eq!(format_wait_time(0), "Just arrived");
    assert_eq!(format_wait_time(7), "7 min");
    assert_eq!(format_wait_time(60), "1h 0m");
    assert_eq!(format_wait_time(135), "2h 15m");
}

#[test]
fn row_defaults_missing_fields() {
    let mut sparse = entry(4, Station::Vitals, QueueStatus::Waiting, 3);
    sparse.queue_number = None;
    sparse.reason_for_visit = Some("   ".to_string());

    let row = queue_row(&sparse);

    assert_eq!(row.queue_number, "-");
    assert_eq!(row.reason_for_visit, "-");
    assert_eq!(row.wait.label, "3 min");
}

#[test]
fn board_renders_first_ten_in_server_order() {
    let entries = (1..=12)
        .rev()
        .map(|id| entry(id, Station::Consultation, QueueStatus::Waiting, id))
        .collect::<Vec<_>>();
    let snapshot = QueueSnapshot {
        entries,
        stats: QueueStats {
            total_checked_in: 12,
            waiting: 12,
            in_progress: 0,
            average_wait_time_minutes: 6.5,
        },
        refreshed_at: None,
    };
    let now = Local
        .with_ymd_and_hms(2026, 3, 2, 9, 5, 7)
        .single()
        .expect("valid local time");

    let board = build_board(&snapshot, now, 10);

    assert_eq!(board.rows.len(), 10);
    assert_eq!(board.hidden_count, 2);
    let ids = board
        .rows
        .iter()
        .map(|row| row.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["12", "11", "10", "9", "8", "7", "6", "5", "4", "3"]);
    assert_eq!(board.clock, "09:05:07");
    assert_eq!(board.date, "Monday, 02 March 2026");
    assert_eq!(board.stats.total_checked_in, 12);
    assert_eq!(board.last_refreshed, None);
}

#[test]
fn board_with_fewer_entries_hides_nothing() {
    let snapshot = QueueSnapshot {
        entries: vec![entry(1, Station::Vitals, QueueStatus::InVitals, 2)],
        ..QueueSnapshot::default()
    };

    let board = build_board(&snapshot, Local::now(), 10);

    assert_eq!(board.rows.len(), 1);
    assert_eq!(board.hidden_count, 0);
    assert_eq!(board.rows[0].queue_number, "#1");
}
