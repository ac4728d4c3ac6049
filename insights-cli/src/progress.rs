//! Redrawable progress page on stderr.
//!
//! Each partial result redraws a preview of the rows received so far (head
//! and tail when there are many) above a status line.

use std::io::{self, Write};

use colored::*;
use insights_core::serde_utils::to_json_line;
use insights_engine::{ProgressCallback, Record};
use insights_protocol::results::QueryStatistics;
use parking_lot::Mutex;

const CLEAR_LINE: &str = "\r\x1b[2K";
const CURSOR_UP: &str = "\x1b[1A";
const PREVIEW_EDGE: usize = 10;
const ELLIPSIS: &str = "...";

pub struct ProgressLine {
    limit: u32,
    enabled: bool,
    width: usize,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    statistics: Option<QueryStatistics>,
    drawn_lines: usize,
}

impl ProgressLine {
    pub fn new(limit: u32, enabled: bool, width: usize) -> Self {
        Self {
            limit,
            enabled,
            width,
            state: Mutex::new(State::default()),
        }
    }

    /// Erases whatever was drawn last.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        if state.drawn_lines > 0 {
            let mut stderr = io::stderr().lock();
            let _ = write!(stderr, "{}", erase(state.drawn_lines));
            let _ = stderr.flush();
            state.drawn_lines = 0;
        }
    }

    fn render(&self, partial: &[Record], statistics: Option<&QueryStatistics>) -> Vec<String> {
        let mut lines = Vec::new();

        if partial.len() > 2 * PREVIEW_EDGE {
            lines.extend(partial[..PREVIEW_EDGE].iter().map(|r| self.preview(r)));
            lines.push(ELLIPSIS.to_string());
            let tail = &partial[partial.len() - PREVIEW_EDGE..];
            lines.extend(tail.iter().map(|r| self.preview(r)));
        } else {
            lines.extend(partial.iter().map(|r| self.preview(r)));
        }
        if !lines.is_empty() {
            lines.push(String::new());
        }

        let mut status = format!(
            "{} {} / {} records",
            "querying".cyan(),
            partial.len(),
            self.limit
        );
        if let Some(stats) = statistics {
            status.push_str(&format!(
                " ({} matched, {} scanned, {})",
                stats.records_matched as u64,
                stats.records_scanned as u64,
                human_bytes(stats.bytes_scanned)
            ));
        }
        lines.push(status);
        lines
    }

    fn preview(&self, record: &Record) -> String {
        let line = to_json_line(record).unwrap_or_default();
        truncate(&line, self.width)
    }
}

impl ProgressCallback for ProgressLine {
    fn on_progress(&self, partial: &[Record]) {
        if !self.enabled {
            return;
        }
        let mut state = self.state.lock();
        let lines = self.render(partial, state.statistics.as_ref());

        let mut stderr = io::stderr().lock();
        let _ = write!(
            stderr,
            "{}{}",
            erase(state.drawn_lines.max(1)),
            lines.join("\n")
        );
        let _ = stderr.flush();
        state.drawn_lines = lines.len();
    }

    fn on_statistics(&self, statistics: &QueryStatistics) {
        self.state.lock().statistics = Some(*statistics);
    }
}

/// Clears `lines` lines ending at the cursor, leaving it at the start of the first.
fn erase(lines: usize) -> String {
    let mut out = CLEAR_LINE.to_string();
    for _ in 1..lines {
        out.push_str(CURSOR_UP);
        out.push_str(CLEAR_LINE);
    }
    out
}

/// Cuts `line` to fit `width` columns, marking the cut with an ellipsis.
fn truncate(line: &str, width: usize) -> String {
    if line.chars().count() + 2 <= width {
        return line.to_string();
    }
    let keep = width.saturating_sub(2 + ELLIPSIS.len());
    let mut cut: String = line.chars().take(keep).collect();
    cut.push_str(ELLIPSIS);
    cut
}

fn human_bytes(bytes: f64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes.max(0.0);
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", value as u64, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
