//! Main TUI application state and logic
//!
//! [`App`] is the visualization consumer: it pulls a fresh snapshot from the
//! tracer on every tick (unless paused), reconstructs live ranges from it,
//! and renders the ledger and live-map panes. It never mutates the snapshot
//! and never blocks the producers beyond the log's own copy lock.

use crate::provider::HeapSource;
use crate::trace::{live_ranges, Address, AllocationEvent, TraceAllocator};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Ledger,
    LiveMap,
}

impl FocusedPane {
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Ledger => FocusedPane::LiveMap,
            FocusedPane::LiveMap => FocusedPane::Ledger,
        }
    }
}

/// Rows scrolled by PageUp/PageDown.
const PAGE: usize = 10;

/// The main application state
pub struct App<S: HeapSource> {
    /// The tracer being observed; producers keep their own clones
    tracer: Arc<TraceAllocator<S>>,

    /// Currently focused pane
    pub focused_pane: FocusedPane,

    /// Ledger scroll offset (first visible event index)
    pub ledger_scroll: usize,

    /// Whether the ledger is pinned to the newest events
    pub ledger_follow: bool,

    /// Live-map scroll offset in grid rows below the base address
    pub map_scroll: usize,

    /// First address of the live map grid
    pub map_base: Address,

    /// When paused, the snapshot rendering is frozen on
    frozen: Option<Vec<AllocationEvent>>,

    /// Whether the app should quit
    pub should_quit: bool,
}

impl<S: HeapSource> App<S> {
    /// Create an app observing `tracer`, with the live map anchored at
    /// `map_base` (normally the provider's base address).
    pub fn new(tracer: Arc<TraceAllocator<S>>, map_base: Address) -> Self {
        App {
            tracer,
            focused_pane: FocusedPane::Ledger,
            ledger_scroll: 0,
            ledger_follow: true,
            map_scroll: 0,
            map_base,
            frozen: None,
            should_quit: false,
        }
    }

    /// Run the TUI event loop: redraw every tick, poll for keys with a
    /// 50 ms timeout so the display follows the producers.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        // Two panes side by side, status bar at the bottom.
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(main_chunks[0]);

        let snapshot = match &self.frozen {
            Some(events) => events.clone(),
            None => self.tracer.snapshot(),
        };
        let ranges = live_ranges(&snapshot);

        let mut ledger_scroll = if self.ledger_follow {
            usize::MAX
        } else {
            self.ledger_scroll
        };
        super::panes::render_ledger_pane(
            frame,
            columns[0],
            &snapshot,
            self.focused_pane == FocusedPane::Ledger,
            &mut ledger_scroll,
        );
        self.ledger_scroll = ledger_scroll;

        super::panes::render_live_map_pane(
            frame,
            columns[1],
            &ranges,
            self.map_base,
            self.focused_pane == FocusedPane::LiveMap,
            self.map_scroll,
        );

        super::panes::render_status_bar(
            frame,
            main_chunks[1],
            snapshot.len(),
            ranges.len(),
            self.tracer.dropped_events(),
            self.frozen.is_some(),
        );
    }

    /// Handle keyboard events
    fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::Char('p') | KeyCode::Char(' ') => {
                // Toggle pause: freeze the current snapshot or drop it.
                self.frozen = match self.frozen {
                    Some(_) => None,
                    None => Some(self.tracer.snapshot()),
                };
            }
            KeyCode::Up => self.scroll_up(1),
            KeyCode::Down => self.scroll_down(1),
            KeyCode::PageUp => self.scroll_up(PAGE),
            KeyCode::PageDown => self.scroll_down(PAGE),
            KeyCode::Home => match self.focused_pane {
                FocusedPane::Ledger => {
                    self.ledger_follow = false;
                    self.ledger_scroll = 0;
                }
                FocusedPane::LiveMap => self.map_scroll = 0,
            },
            KeyCode::End => {
                if self.focused_pane == FocusedPane::Ledger {
                    self.ledger_follow = true;
                }
            }
            _ => {}
        }
    }

    fn scroll_up(&mut self, n: usize) {
        match self.focused_pane {
            FocusedPane::Ledger => {
                self.ledger_follow = false;
                self.ledger_scroll = self.ledger_scroll.saturating_sub(n);
            }
            FocusedPane::LiveMap => self.map_scroll = self.map_scroll.saturating_sub(n),
        }
    }

    fn scroll_down(&mut self, n: usize) {
        match self.focused_pane {
            // The render pass clamps the ledger offset to the last page.
            FocusedPane::Ledger => {
                self.ledger_follow = false;
                self.ledger_scroll = self.ledger_scroll.saturating_add(n);
            }
            FocusedPane::LiveMap => self.map_scroll = self.map_scroll.saturating_add(n),
        }
    }
}
