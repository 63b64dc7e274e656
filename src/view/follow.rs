//! Follow/position controller.
//!
//! A state machine over two modes:
//!
//! - `Following` (initial): every merge pins the viewport to the bottom.
//! - `Manual`: the user scrolled above the last programmatic anchor;
//!   merges no longer move the viewport.
//!
//! The transition to `Manual` is a one-way latch. Re-entry into
//! `Following` when the user scrolls back to the bottom is available as
//! an opt-in configuration, off by default to match the observed
//! behavior.
//!
//! Line metrics are recomputed on every scroll event, independent of the
//! mode; they feed the position readout and nothing else.

/// Snapshot of the scroll container, in whatever unit the presentation
/// layer uses (pixels in a browser-like host, rows in a terminal).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollGeometry {
    /// Offset of the viewport top from the top of the content.
    pub scroll_top: f64,
    /// Total content height.
    pub scroll_height: f64,
    /// Visible viewport height.
    pub client_height: f64,
    /// Height of one rendered line.
    pub line_height: f64,
}

/// Derived position readout, shown as `[current/total]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMetrics {
    /// 1-based line at the top of the viewport.
    pub current_line: usize,
    /// Total rendered lines.
    pub total_lines: usize,
}

/// Follow mode of the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowMode {
    /// Auto-scroll to the newest entry on every merge.
    Following,
    /// The user scrolled away; merges leave the viewport alone.
    Manual,
}

/// Configuration for the follow controller.
#[derive(Debug, Clone, Copy, Default)]
pub struct FollowConfig {
    /// Re-enter `Following` when a scroll event lands at the bottom.
    ///
    /// Off by default: without it the latch is one-way and only
    /// remounting restores auto-follow.
    pub resume_at_bottom: bool,
}

/// State machine deciding when to pin the viewport to the newest entry.
#[derive(Debug)]
pub struct FollowController {
    /// Current mode.
    mode: FollowMode,
    /// Scroll position written by the last programmatic pin.
    anchor: f64,
    /// Metrics from the most recent scroll event, if computable.
    metrics: Option<LineMetrics>,
    /// Configuration.
    config: FollowConfig,
}

impl Default for FollowController {
    fn default() -> Self {
        Self::new()
    }
}

impl FollowController {
    /// Create a controller with default configuration.
    pub fn new() -> Self {
        Self::with_config(FollowConfig::default())
    }

    /// Create a controller with custom configuration.
    pub const fn with_config(config: FollowConfig) -> Self {
        Self {
            mode: FollowMode::Following,
            anchor: 0.0,
            metrics: None,
            config,
        }
    }

    /// Current follow mode.
    pub const fn mode(&self) -> FollowMode {
        self.mode
    }

    /// Whether merges currently pin the viewport to the bottom.
    pub fn is_following(&self) -> bool {
        self.mode == FollowMode::Following
    }

    /// Metrics from the most recent scroll event.
    ///
    /// `None` until the first scroll event, or when the reported line
    /// height was unusable.
    pub const fn metrics(&self) -> Option<LineMetrics> {
        self.metrics
    }

    /// Handle a user scroll event.
    ///
    /// Scrolling above the last programmatic anchor latches `Manual`.
    /// Line metrics are recomputed on every call, regardless of mode.
    pub fn on_scroll(&mut self, geometry: ScrollGeometry) {
        if geometry.scroll_top < self.anchor {
            self.mode = FollowMode::Manual;
        } else if self.config.resume_at_bottom && Self::at_bottom(geometry) {
            self.mode = FollowMode::Following;
            self.anchor = geometry.scroll_top;
        }

        self.metrics = Self::compute_metrics(geometry);
    }

    /// Decide the scroll effect of a merge.
    ///
    /// When following, returns the pin-to-bottom target
    /// (`scroll_height - client_height`) and records it as the new
    /// anchor; the caller applies the returned position. When in manual
    /// mode, returns `None` and leaves the anchor untouched.
    pub fn after_append(&mut self, geometry: ScrollGeometry) -> Option<f64> {
        if !self.is_following() {
            return None;
        }

        let target = (geometry.scroll_height - geometry.client_height).max(0.0);
        self.anchor = target;
        Some(target)
    }

    fn at_bottom(geometry: ScrollGeometry) -> bool {
        geometry.scroll_top >= geometry.scroll_height - geometry.client_height
    }

    /// Derive `[current/total]` from the geometry.
    ///
    /// An unusable line height (zero, negative, NaN, infinite) yields
    /// `None` instead of propagating NaN into the readout.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn compute_metrics(geometry: ScrollGeometry) -> Option<LineMetrics> {
        let line_height = geometry.line_height;
        if !line_height.is_finite() || line_height <= 0.0 {
            return None;
        }

        Some(LineMetrics {
            current_line: (geometry.scroll_top / line_height).floor() as usize + 1,
            total_lines: (geometry.scroll_height / line_height).floor() as usize,
        })
    }
}
