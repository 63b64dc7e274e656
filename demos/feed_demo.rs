//! Feed Demo: an auto-following telemetry console in the terminal.
//!
//! Runs the viewer against a synthetic in-process feed so it works
//! without a server. Scroll with Up/Down or PageUp/PageDown; scrolling up
//! detaches the view from the bottom. Press 'q' or Escape to quit.

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use telelog::{
    ConsoleView, FeedError, FeedResponse, TelemetryEntry, Transport, Viewer, ViewerConfig,
    ViewerEvent,
};

/// Produces a few synthetic entries per poll.
struct SyntheticFeed {
    next_id: AtomicU64,
}

impl Transport for SyntheticFeed {
    fn fetch_feed(&self, _cursor: Option<&str>) -> Result<FeedResponse, FeedError> {
        let base = self.next_id.fetch_add(3, Ordering::Relaxed);
        let entries = (base..base + 3)
            .map(|id| TelemetryEntry {
                id: id.to_string(),
                timestamp: format!("2026-08-27T10:{:02}:{:02}", (id / 60) % 60, id % 60),
                hostname: format!("host-{}", id % 4),
                brief: format!("telemetry event #{id}"),
            })
            .collect();

        Ok(FeedResponse {
            telemetries: Some(entries),
            timestamp: Some(base.to_string()),
        })
    }
}

fn main() -> io::Result<()> {
    let transport = SyntheticFeed {
        next_id: AtomicU64::new(0),
    };
    let mut viewer = Viewer::mount(
        Box::new(transport),
        ViewerConfig {
            update_period: Duration::from_millis(1000),
            ..ViewerConfig::default()
        },
    );
    let status_rx = viewer.take_status_receiver().expect("fresh viewer");

    let (cols, rows) = terminal::size()?;
    let mut console = ConsoleView::new(cols as usize, rows.saturating_sub(2) as usize);

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let result = run(&mut viewer, &mut console, &status_rx, &mut stdout);

    execute!(stdout, cursor::Show, LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    viewer.unmount();
    result
}

fn run(
    viewer: &mut Viewer,
    console: &mut ConsoleView,
    status_rx: &crossbeam_channel::Receiver<telelog::StatusChange>,
    stdout: &mut io::Stdout,
) -> io::Result<()> {
    let mut merges = 0u64;

    loop {
        for viewer_event in viewer.process_pending() {
            if let ViewerEvent::Appended { .. } = viewer_event {
                if let Some(top) = viewer.auto_scroll_target(console.geometry(viewer.store())) {
                    let store = viewer.store();
                    console.set_scroll_top(store, top);
                }
                viewer.handle_scroll(console.geometry(viewer.store()));
            }
        }
        while status_rx.try_recv().is_ok() {
            merges += 1;
        }

        draw(viewer, console, merges, stdout)?;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Up => scroll(viewer, console, -1.0),
                    KeyCode::Down => scroll(viewer, console, 1.0),
                    KeyCode::PageUp => scroll(viewer, console, -10.0),
                    KeyCode::PageDown => scroll(viewer, console, 10.0),
                    _ => {}
                },
                Event::Resize(cols, rows) => {
                    console.resize(cols as usize, rows.saturating_sub(2) as usize);
                }
                _ => {}
            }
        }
    }
}

fn scroll(viewer: &mut Viewer, console: &mut ConsoleView, delta: f64) {
    console.scroll_by(viewer.store(), delta);
    viewer.handle_scroll(console.geometry(viewer.store()));
}

fn draw(
    viewer: &Viewer,
    console: &ConsoleView,
    merges: u64,
    stdout: &mut io::Stdout,
) -> io::Result<()> {
    execute!(stdout, cursor::MoveTo(0, 0), Clear(ClearType::All))?;

    let mode = if viewer.is_following() {
        "following"
    } else {
        "manual"
    };
    let readout = ConsoleView::position_readout(viewer.line_metrics());
    let loading = if viewer.is_loading() { " loading..." } else { "" };
    write!(
        stdout,
        "telemetry feed {readout} [{mode}] merges: {merges}{loading}\r\n\r\n"
    )?;

    for line in console.visible_lines(viewer.store()) {
        write!(stdout, "{line}\r\n")?;
    }

    stdout.flush()
}
