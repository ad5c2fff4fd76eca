//! Plain-text rendering of the board and the document view.

use client_core::{QueueBoard, ViewMode, WorkflowView};

pub fn render_board(board: &QueueBoard) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}  {}\n", board.date, board.clock));
    out.push_str(&format!(
        "checked in {} | waiting {} | in progress {} | avg wait {:.0} min\n",
        board.stats.total_checked_in,
        board.stats.waiting,
        board.stats.in_progress,
        board.stats.average_wait_time_minutes
    ));
    out.push_str(&format!(
        "{:<6} {:<24} {:<14} {:<16} {:<12} {}\n",
        "No.", "Patient", "Station", "Status", "Wait", "Reason"
    ));
    for row in &board.rows {
        out.push_str(&format!(
            "{:<6} {:<24} {:<14} {:<16} {:<12} {}\n",
            row.queue_number,
            row.patient_name,
            row.station.label,
            row.status.label,
            row.wait.label,
            row.reason_for_visit
        ));
    }
    if board.rows.is_empty() {
        out.push_str("No patients in queue\n");
    }
    if board.hidden_count > 0 {
        out.push_str(&format!("... and {} more\n", board.hidden_count));
    }
    if let Some(at) = &board.last_refreshed {
        out.push_str(&format!("last updated {at}\n"));
    }
    out
}

pub fn render_view(view: &WorkflowView) -> String {
    let document = view
        .document_id
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string());
    let mut out = format!("document {document}: {}\n", mode_label(&view.mode));

    if let Some(status) = &view.status {
        out.push_str(&format!("status: {}\n", status.as_str()));
    }
    if let Some(path) = &view.file_path {
        out.push_str(&format!("file: {path}\n"));
    }
    if let ViewMode::Error { message } = &view.mode {
        out.push_str(&format!("error: {message}\n"));
    }
    if let Some(data) = &view.data {
        out.push_str(&format!(
            "parsed doc {} | scanned doc {} | session {} | {} chunks\n",
            data.parsed_doc_id,
            data.scanned_doc_id.as_deref().unwrap_or("-"),
            data.validation_session_id.as_deref().unwrap_or("-"),
            data.chunks.len()
        ));
        for (field, value) in &data.extracted_data {
            out.push_str(&format!("  {field}: {value}\n"));
        }
    }

    let actions = [
        ("extract", view.actions.extract),
        ("approve", view.actions.approve),
        ("back", view.actions.back),
    ]
    .iter()
    .filter(|(_, allowed)| *allowed)
    .map(|(name, _)| *name)
    .collect::<Vec<_>>();
    out.push_str(&format!("actions: {}\n", actions.join(", ")));
    out
}

fn mode_label(mode: &ViewMode) -> &'static str {
    match mode {
        ViewMode::Idle => "idle",
        ViewMode::Loading => "loading",
        ViewMode::Error { .. } => "error",
        ViewMode::AwaitingExtraction => "awaiting extraction",
        ViewMode::Extracting => "extracting",
        ViewMode::Validating => "ready for validation",
        ViewMode::Approved => "approved",
    }
}
