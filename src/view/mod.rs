//! Viewport behavior: follow mode, line accounting, and console glue.
//!
//! The follow controller is the only component with real state here: a
//! one-way `Following`-to-`Manual` latch driven by user scroll events, plus
//! derived line metrics for the `[current/total]` readout. The console
//! view is thin presentation glue that formats entries into display lines
//! and owns the scroll position in row units.

mod console;
mod follow;

pub use console::ConsoleView;
pub use follow::{FollowConfig, FollowController, FollowMode, LineMetrics, ScrollGeometry};
