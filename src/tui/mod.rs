//! Ratatui-based terminal UI.
//!
//! Left: panel list and the focused panel's columns (multi-select).
//! Right: the panel chart, an optional data table, and the source footer.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};
use tracing::info;

use crate::app::pipeline::{PanelOutcome, Selection, build_dashboard};
use crate::config::DashboardConfig;
use crate::data::{CachedSource, OnsClient};
use crate::domain::{SeriesTable, date_ordinal, ordinal_month};
use crate::error::AppError;
use crate::report::format_table;

mod plotters_chart;

use plotters_chart::{ChartLine, PanelChart, palette_color, palette_rgb};

/// Start the TUI.
pub fn run(config: DashboardConfig) -> Result<(), AppError> {
    let source = CachedSource::new(OnsClient::from_config(&config)?);

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(config, source);
    terminal
        .draw(|f| app.draw(f))
        .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
    app.refresh();
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Panels,
    Columns,
}

struct App {
    config: DashboardConfig,
    source: CachedSource<OnsClient>,
    outcomes: Vec<PanelOutcome>,
    selection: Selection,
    show_table: Vec<bool>,
    selected_panel: usize,
    selected_column: usize,
    focus: Focus,
    status: String,
}

impl App {
    fn new(config: DashboardConfig, source: CachedSource<OnsClient>) -> Self {
        let show_table = config.panels.iter().map(|p| p.show_table).collect();
        Self {
            config,
            source,
            outcomes: Vec::new(),
            selection: Selection::default(),
            show_table,
            selected_panel: 0,
            selected_column: 0,
            focus: Focus::Panels,
            status: "Fetching ONS data...".to_string(),
        }
    }

    /// Rebuild every panel through the cache.
    fn refresh(&mut self) {
        self.outcomes = build_dashboard(&self.source, &self.config);
        let failed = self.outcomes.iter().filter(|o| !o.is_ok()).count();
        info!(panels = self.outcomes.len(), failed, cached = self.source.len(), "dashboard refreshed");
        self.status = if failed == 0 {
            format!("Loaded {} panels.", self.outcomes.len())
        } else {
            format!("Loaded {} panels, {failed} failed.", self.outcomes.len())
        };
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Panels => Focus::Columns,
                    Focus::Columns => Focus::Panels,
                };
            }
            KeyCode::Up => match self.focus {
                Focus::Panels => {
                    self.selected_panel = self.selected_panel.saturating_sub(1);
                    self.selected_column = 0;
                }
                Focus::Columns => self.selected_column = self.selected_column.saturating_sub(1),
            },
            KeyCode::Down => match self.focus {
                Focus::Panels => {
                    if self.selected_panel + 1 < self.config.panels.len() {
                        self.selected_panel += 1;
                        self.selected_column = 0;
                    }
                }
                Focus::Columns => {
                    if self.selected_column + 1 < self.current_labels().len() {
                        self.selected_column += 1;
                    }
                }
            },
            KeyCode::Char(' ') => self.toggle_current_column(),
            KeyCode::Char('a') => {
                if let Some(panel) = self.config.panels.get(self.selected_panel) {
                    self.selection.clear(&panel.id);
                    self.status = format!("{}: all columns", panel.id);
                }
            }
            KeyCode::Char('t') => {
                if let Some(flag) = self.show_table.get_mut(self.selected_panel) {
                    *flag = !*flag;
                }
            }
            KeyCode::Char('r') => {
                self.source.clear();
                self.refresh();
            }
            KeyCode::Char('d') => self.write_debug(),
            _ => {}
        }
        false
    }

    fn current_labels(&self) -> Vec<String> {
        self.config
            .panels
            .get(self.selected_panel)
            .map(|p| p.labels().into_iter().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn toggle_current_column(&mut self) {
        let Some(panel) = self.config.panels.get(self.selected_panel) else {
            return;
        };
        let labels = self.current_labels();
        let Some(label) = labels.get(self.selected_column) else {
            return;
        };
        let next = toggle_label(&labels, self.selection.get(&panel.id), label);
        self.status = format!("{}: {} of {} columns", panel.id, next.len(), labels.len());
        self.selection.set(&panel.id, next);
    }

    fn write_debug(&mut self) {
        let (Some(panel), Some(outcome)) = (
            self.config.panels.get(self.selected_panel),
            self.outcomes.get(self.selected_panel),
        ) else {
            self.status = "No panel data available.".to_string();
            return;
        };
        self.status = match crate::debug::write_debug_bundle(outcome, panel, self.source.inner().api_root()) {
            Ok(path) => format!("Wrote debug bundle: {}", path.display()),
            Err(err) => format!("Debug write failed: {err}"),
        };
    }

    fn is_selected(&self, panel_id: &str, label: &str) -> bool {
        self.selection
            .get(panel_id)
            .is_none_or(|labels| labels.iter().any(|l| l == label))
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(size);
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(30), Constraint::Min(0)])
            .split(rows[0]);
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(self.config.panels.len() as u16 + 2), Constraint::Min(0)])
            .split(cols[0]);

        self.draw_panel_list(frame, left[0]);
        self.draw_column_list(frame, left[1]);
        self.draw_panel(frame, cols[1]);
        self.draw_footer(frame, rows[1]);
    }

    fn focus_style(&self, focus: Focus) -> Style {
        if self.focus == focus {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        }
    }

    fn draw_panel_list(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = self
            .config
            .panels
            .iter()
            .enumerate()
            .map(|(i, panel)| {
                let failed = self.outcomes.get(i).is_some_and(|o| !o.is_ok());
                let title = self
                    .outcomes
                    .get(i)
                    .map(|o| o.title.clone())
                    .unwrap_or_else(|| panel.provisional_title());
                let style = if failed { Style::default().fg(Color::Red) } else { Style::default() };
                ListItem::new(Line::from(Span::styled(title, style)))
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .title("Panels")
                    .borders(Borders::ALL)
                    .border_style(self.focus_style(Focus::Panels)),
            )
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected_panel));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_column_list(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let Some(panel) = self.config.panels.get(self.selected_panel) else {
            return;
        };
        let items: Vec<ListItem> = panel
            .labels()
            .into_iter()
            .enumerate()
            .map(|(i, label)| {
                let mark = if self.is_selected(&panel.id, label) { "[x]" } else { "[ ]" };
                ListItem::new(Line::from(vec![
                    Span::raw(format!("{mark} ")),
                    Span::styled(label.to_string(), Style::default().fg(palette_color(i))),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .title("Columns")
                    .borders(Borders::ALL)
                    .border_style(self.focus_style(Focus::Columns)),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

        let mut state = ListState::default();
        if self.focus == Focus::Columns {
            state.select(Some(self.selected_column));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_panel(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let title = self
            .outcomes
            .get(self.selected_panel)
            .map(|o| o.title.clone())
            .unwrap_or_default();
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(outcome) = self.outcomes.get(self.selected_panel) else {
            let msg = Paragraph::new("Waiting for data...").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        let data = match &outcome.result {
            Ok(data) => data,
            Err(err) => {
                let msg = Paragraph::new(format!("error: {err}")).style(Style::default().fg(Color::Red));
                frame.render_widget(msg, inner);
                return;
            }
        };
        let table = match self.selection.apply(data) {
            Ok(table) => table,
            Err(err) => {
                let msg = Paragraph::new(format!("error: {err}")).style(Style::default().fg(Color::Red));
                frame.render_widget(msg, inner);
                return;
            }
        };

        let show_table = self.show_table.get(self.selected_panel).copied().unwrap_or(false);
        let constraints = if show_table {
            [Constraint::Percentage(55), Constraint::Min(0), Constraint::Length(2)]
        } else {
            [Constraint::Min(0), Constraint::Length(0), Constraint::Length(2)]
        };
        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);

        self.draw_chart(frame, parts[0], data, &table);
        if show_table {
            // Newest rows are the interesting ones.
            let text = format_table(&table);
            let lines: Vec<&str> = text.lines().collect();
            let visible = parts[1].height as usize;
            let body_rows = visible.saturating_sub(2);
            let mut shown: Vec<Line> = lines.iter().take(2).map(|l| Line::raw(*l)).collect();
            let skip = lines.len().saturating_sub(body_rows).max(2).min(lines.len());
            shown.extend(lines[skip..].iter().map(|l| Line::raw(*l)));
            frame.render_widget(Paragraph::new(shown), parts[1]);
        }

        let footer = Paragraph::new(vec![
            Line::from(Span::styled(
                format!("Source: {}", data.meta.source_text()),
                Style::default().fg(Color::Gray),
            )),
            Line::from(Span::styled(
                format!("Last updated: {}", data.meta.last_updated_text()),
                Style::default().fg(Color::Gray),
            )),
        ]);
        frame.render_widget(footer, parts[2]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect, data: &crate::domain::PanelData, table: &SeriesTable) {
        let Some((lines, x_bounds, y_bounds)) = chart_lines(data, table) else {
            let msg = Paragraph::new("(no data)").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, area);
            return;
        };

        let widget = PanelChart {
            lines: &lines,
            x_bounds,
            y_bounds,
            y_label: data.unit.clone().unwrap_or_default(),
            fmt_x: fmt_axis_date,
            fmt_y: fmt_axis_value,
        };
        frame.render_widget(widget, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ move  Tab focus  Space toggle  a all  t table  r refetch  d debug  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Flip `label` in the selection, keeping the panel's column order.
///
/// No current selection means every column is shown.
fn toggle_label(all: &[String], current: Option<&[String]>, label: &str) -> Vec<String> {
    let selected = |l: &str| current.is_none_or(|cur| cur.iter().any(|c| c == l));
    let turn_on = !selected(label);
    all.iter()
        .filter(|l| if l.as_str() == label { turn_on } else { selected(l) })
        .cloned()
        .collect()
}

/// Split a column into runs of present values, in chart coordinates.
fn line_segments(xs: &[f64], values: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut segments = Vec::new();
    let mut current = Vec::new();
    for (x, value) in xs.iter().zip(values) {
        match value {
            Some(y) => current.push((*x, *y)),
            None => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Build chart lines and bounds. Colors follow the panel's full column order so
/// toggling a column never recolors the others.
fn chart_lines(data: &crate::domain::PanelData, table: &SeriesTable) -> Option<(Vec<ChartLine>, [f64; 2], [f64; 2])> {
    let (first, last) = (table.dates.first()?, table.dates.last()?);
    let (y_min, y_max) = table.value_bounds()?;

    let xs: Vec<f64> = table.dates.iter().map(|d| date_ordinal(*d)).collect();
    let all_labels = data.table.labels();
    let lines = table
        .columns
        .iter()
        .map(|c| {
            let index = all_labels.iter().position(|l| *l == c.label).unwrap_or(0);
            ChartLine {
                color: palette_rgb(index),
                segments: line_segments(&xs, &c.values),
            }
        })
        .collect();

    let (mut x0, mut x1) = (date_ordinal(*first), date_ordinal(*last));
    if x1 <= x0 {
        x0 -= 1.0;
        x1 += 1.0;
    }
    let (y0, y1) = if y_max > y_min {
        let pad = ((y_max - y_min) * 0.05).max(1e-12);
        (y_min - pad, y_max + pad)
    } else {
        (y_min - 1.0, y_max + 1.0)
    };

    Some((lines, [x0, x1], [y0, y1]))
}

fn fmt_axis_date(v: f64) -> String {
    ordinal_month(v)
        .map(|d| d.format("%b %Y").to_string())
        .unwrap_or_default()
}

fn fmt_axis_value(v: f64) -> String {
    format!("{v:.1}")
}
