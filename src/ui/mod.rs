//! Terminal user interface built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The UI is organized into three layers:
//!
//! - **[`app`]** — application state, keyboard event loop, pane focus, pause
//! - **[`panes`]** — stateless render functions for the ledger, the live-map
//!   grid, and the status bar
//! - **[`theme`]** — centralized color palette used by all panes
//!
//! The entry point for consumers is [`App`]: construct it with an
//! `Arc<TraceAllocator>` and call [`App::run`] to start the event loop. The
//! UI is a pull-based consumer — it snapshots the event log on its own
//! cadence and never mutates anything it reads.
//!
//! [`App::run`]: app::App::run

pub mod app;
pub mod panes;
pub mod theme;

pub use app::App;
