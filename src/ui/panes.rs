//! Stateless render functions for the ledger, live-map, and status panes
//!
//! Each function takes the data it renders by reference and a mutable scroll
//! offset; nothing here owns state between frames. The ledger renders one
//! row per event in chronological order. The live map projects the
//! reconstructed ranges onto a fixed-width byte grid keyed by address.

use crate::trace::{live_bytes, Address, AllocationEvent, LiveRange};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

/// Byte shown as one grid cell in the live map.
const LIVE_CELL: &str = "█";
const FREE_CELL: &str = "·";

/// Width of the live map's address gutter: "0x00000000 │ ".
const GUTTER_WIDTH: usize = 13;

fn border_style(is_focused: bool) -> Style {
    if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    }
}

/// Render the event ledger: one row per event, oldest first.
///
/// `scroll` is the index of the first visible row; `usize::MAX` means
/// follow-the-tail, which stays pinned as new events arrive.
pub fn render_ledger_pane(
    frame: &mut Frame,
    area: Rect,
    events: &[AllocationEvent],
    is_focused: bool,
    scroll: &mut usize,
) {
    let block = Block::default()
        .title(format!(" Ledger ({} events) ", events.len()))
        .borders(Borders::ALL)
        .border_style(border_style(is_focused));

    let visible = area.height.saturating_sub(2) as usize;
    let max_scroll = events.len().saturating_sub(visible);
    if *scroll > max_scroll {
        *scroll = max_scroll;
    }
    let offset = *scroll;

    let mut items: Vec<ListItem> = Vec::new();

    if events.is_empty() {
        items.push(
            ListItem::new("(no events yet)").style(Style::default().fg(DEFAULT_THEME.comment)),
        );
    }

    for (i, event) in events.iter().enumerate().skip(offset).take(visible) {
        let (kind_style, size_text) = match event {
            AllocationEvent::Alloc { size, .. } => (
                Style::default().fg(DEFAULT_THEME.success),
                format!("{:>6} B", size),
            ),
            AllocationEvent::Free { .. } => (
                Style::default().fg(DEFAULT_THEME.error),
                format!("{:>8}", "—"),
            ),
        };

        items.push(ListItem::new(Line::from(vec![
            Span::styled(
                format!("{:>6} ", i),
                Style::default().fg(DEFAULT_THEME.comment),
            ),
            Span::styled(format!("{:<6}", event.kind()), kind_style),
            Span::styled(
                format!("0x{:08x} ", event.address()),
                Style::default().fg(DEFAULT_THEME.primary),
            ),
            Span::styled(size_text, Style::default().fg(DEFAULT_THEME.secondary)),
        ])));
    }

    frame.render_widget(List::new(items).block(block), area);
}

/// Render the live map: a byte-per-cell grid starting at `base`, one
/// address row per terminal row, live bytes filled and free bytes dotted.
///
/// `row_scroll` counts grid rows above the viewport. `ranges` must come from
/// a single snapshot; the function only reads them.
pub fn render_live_map_pane(
    frame: &mut Frame,
    area: Rect,
    ranges: &[LiveRange],
    base: Address,
    is_focused: bool,
    row_scroll: usize,
) {
    let bytes_per_row = bytes_per_row(area);
    let block = Block::default()
        .title(format!(
            " Live map ({} ranges, {} bytes live) ",
            ranges.len(),
            live_bytes(ranges)
        ))
        .borders(Borders::ALL)
        .border_style(border_style(is_focused));

    let rows = area.height.saturating_sub(2) as usize;
    // The scroll offset is unclamped; saturate so a runaway scroll pins the
    // view to the top of the address space instead of overflowing.
    let start = base.saturating_add((row_scroll as Address).saturating_mul(bytes_per_row as Address));

    // Sort once so per-byte liveness is a binary search instead of a scan.
    let mut sorted: Vec<LiveRange> = ranges.to_vec();
    sorted.sort_by_key(|r| r.start);

    let mut lines: Vec<Line> = Vec::with_capacity(rows);
    for row in 0..rows {
        let row_base = start.saturating_add((row * bytes_per_row) as Address);
        let mut spans = vec![Span::styled(
            format!("0x{:08x} │ ", row_base),
            Style::default().fg(DEFAULT_THEME.comment),
        )];

        // Coalesce runs of identical cells into single spans.
        let mut run_live = false;
        let mut run = String::new();
        for i in 0..bytes_per_row {
            let live = is_live(&sorted, row_base.saturating_add(i as Address));
            if live != run_live && !run.is_empty() {
                spans.push(cell_span(std::mem::take(&mut run), run_live));
            }
            run_live = live;
            run.push_str(if live { LIVE_CELL } else { FREE_CELL });
        }
        if !run.is_empty() {
            spans.push(cell_span(run, run_live));
        }

        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Whether `addr` falls in any of the sorted, possibly-overlapping ranges.
fn is_live(sorted: &[LiveRange], addr: Address) -> bool {
    // First range starting after addr; everything before it could cover addr.
    let idx = sorted.partition_point(|r| r.start <= addr);
    sorted[..idx].iter().rev().any(|r| r.contains(addr))
}

fn cell_span(run: String, live: bool) -> Span<'static> {
    let color = if live {
        DEFAULT_THEME.live_cell
    } else {
        DEFAULT_THEME.free_cell
    };
    Span::styled(run, Style::default().fg(color))
}

/// How many byte cells fit on one live-map row.
pub fn bytes_per_row(area: Rect) -> usize {
    (area.width.saturating_sub(2) as usize)
        .saturating_sub(GUTTER_WIDTH)
        .max(1)
}

/// Render the bottom status bar: counts on the left, keybinds on the right.
pub fn render_status_bar(
    frame: &mut Frame,
    area: Rect,
    event_count: usize,
    live_range_count: usize,
    dropped_events: usize,
    is_paused: bool,
) {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let mut left_spans = vec![
        Span::styled(
            format!(" {} events ", event_count),
            Style::default()
                .bg(DEFAULT_THEME.primary)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" {} live ranges ", live_range_count),
            Style::default()
                .bg(DEFAULT_THEME.status_bg)
                .fg(DEFAULT_THEME.fg),
        ),
    ];

    if dropped_events > 0 {
        left_spans.push(Span::styled(
            format!(" {} events dropped (log full) ", dropped_events),
            Style::default()
                .bg(DEFAULT_THEME.error)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ));
    }

    if is_paused {
        left_spans.push(Span::styled(
            " PAUSED ",
            Style::default()
                .bg(DEFAULT_THEME.secondary)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ));
    }

    let left = Paragraph::new(Line::from(left_spans))
        .style(Style::default().bg(DEFAULT_THEME.status_bg))
        .alignment(Alignment::Left);
    frame.render_widget(left, layout[0]);

    let key_style = Style::default().bg(DEFAULT_THEME.comment).fg(Color::Black);
    let desc_style = Style::default()
        .bg(DEFAULT_THEME.status_bg)
        .fg(DEFAULT_THEME.fg);

    let right_spans = vec![
        Span::styled(" Tab ", key_style),
        Span::styled(" focus ", desc_style),
        Span::styled(" ↑/↓ ", key_style),
        Span::styled(" scroll ", desc_style),
        Span::styled(" p ", key_style),
        Span::styled(" pause ", desc_style),
        Span::styled(" q ", key_style),
        Span::styled(" quit ", desc_style),
    ];

    let right = Paragraph::new(Line::from(right_spans))
        .style(Style::default().bg(DEFAULT_THEME.status_bg))
        .alignment(Alignment::Right);
    frame.render_widget(right, layout[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn live_map_tolerates_runaway_scroll() {
        // Scrolling the map arbitrarily far must pin the view, not overflow
        // the row-base arithmetic.
        let ranges = vec![LiveRange { start: 0x1000_0000, end: 0x1000_0040 }];
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();

        terminal
            .draw(|f| {
                let area = f.area();
                render_live_map_pane(f, area, &ranges, 0x1000_0000, false, usize::MAX);
            })
            .unwrap();
    }

    #[test]
    fn live_map_renders_ranges_at_top_of_address_space() {
        let ranges = vec![LiveRange { start: Address::MAX - 16, end: Address::MAX }];
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();

        terminal
            .draw(|f| {
                let area = f.area();
                render_live_map_pane(f, area, &ranges, Address::MAX - 64, false, 3);
            })
            .unwrap();
    }

    #[test]
    fn ledger_clamps_scroll_past_the_end() {
        let events = vec![
            AllocationEvent::Alloc { address: 0x100, size: 32 },
            AllocationEvent::Free { address: 0x100 },
        ];
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();

        let mut scroll = usize::MAX;
        terminal
            .draw(|f| {
                let area = f.area();
                render_ledger_pane(f, area, &events, true, &mut scroll);
            })
            .unwrap();
        assert_eq!(scroll, 0);
    }
}
