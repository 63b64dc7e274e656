//! Console view: presentation glue over the log store.
//!
//! Formats entries into display lines and owns the scroll position in row
//! units (`line_height` is always `1.0` here). Hosts with pixel geometry
//! can drive the follow controller directly and skip this type.

use super::follow::{LineMetrics, ScrollGeometry};
use crate::feed::TelemetryEntry;
use crate::store::LogStore;
use unicode_width::UnicodeWidthChar;

/// Fixed-width console view over the log store.
#[derive(Debug)]
pub struct ConsoleView {
    /// View width in display columns.
    width: usize,
    /// Visible rows.
    viewport_rows: usize,
    /// Scroll offset from the top, in rows.
    scroll_top: f64,
}

impl ConsoleView {
    /// Create a view `width` columns wide showing `viewport_rows` rows.
    pub const fn new(width: usize, viewport_rows: usize) -> Self {
        Self {
            width,
            viewport_rows,
            scroll_top: 0.0,
        }
    }

    /// Format one entry as `timestamp hostname: brief`, truncated to the
    /// view width by display columns.
    pub fn format_entry(&self, entry: &TelemetryEntry) -> String {
        let line = format!("{} {}: {}", entry.timestamp, entry.hostname, entry.brief);
        truncate_columns(&line, self.width)
    }

    /// All display lines, oldest first.
    pub fn lines(&self, store: &LogStore) -> Vec<String> {
        store.iter().map(|e| self.format_entry(e)).collect()
    }

    /// Lines currently inside the viewport.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn visible_lines(&self, store: &LogStore) -> Vec<String> {
        let first = self.scroll_top.floor() as usize;
        store
            .iter()
            .skip(first)
            .take(self.viewport_rows)
            .map(|e| self.format_entry(e))
            .collect()
    }

    /// Scroll geometry in row units, one entry per line.
    #[allow(clippy::cast_precision_loss)]
    pub fn geometry(&self, store: &LogStore) -> ScrollGeometry {
        ScrollGeometry {
            scroll_top: self.scroll_top,
            scroll_height: store.len() as f64,
            client_height: self.viewport_rows as f64,
            line_height: 1.0,
        }
    }

    /// Current scroll offset in rows.
    pub const fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    /// Apply a scroll position, clamped to the content.
    #[allow(clippy::cast_precision_loss)]
    pub fn set_scroll_top(&mut self, store: &LogStore, top: f64) {
        let max = (store.len() as f64 - self.viewport_rows as f64).max(0.0);
        self.scroll_top = top.clamp(0.0, max);
    }

    /// Scroll by `delta` rows (negative = up).
    pub fn scroll_by(&mut self, store: &LogStore, delta: f64) {
        self.set_scroll_top(store, self.scroll_top + delta);
    }

    /// Update the view dimensions (terminal resize).
    pub const fn resize(&mut self, width: usize, viewport_rows: usize) {
        self.width = width;
        self.viewport_rows = viewport_rows;
    }

    /// The `[current/total]` readout, or `[-/-]` when metrics are
    /// unavailable.
    pub fn position_readout(metrics: Option<LineMetrics>) -> String {
        metrics.map_or_else(
            || "[-/-]".to_string(),
            |m| format!("[{}/{}]", m.current_line, m.total_lines),
        )
    }
}

/// Truncate `text` to at most `max_columns` display columns.
fn truncate_columns(text: &str, max_columns: usize) -> String {
    let mut used = 0;
    let mut out = String::new();
    for ch in text.chars() {
        let width = ch.width().unwrap_or(0);
        if used + width > max_columns {
            break;
        }
        used += width;
        out.push(ch);
    }
    out
}
