//! Ratatui-based terminal UI.
//!
//! The TUI provides a filter panel for narrowing the view (project, group,
//! level, cluster, country, psychography, stage, market, driver set), then
//! renders the surviving drivers as a horizontal bar chart with the model-fit
//! panel alongside.

use std::io;
use std::time::Duration;

use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span, Text},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, List, ListItem, Paragraph},
    Terminal,
};

use crate::app::pipeline::{build_view, load_data, LoadedData, ViewOutput};
use crate::cli::DataArgs;
use crate::domain::{
    psychography_color, DataGroup, FilterCriteria, Level, Selection,
};
use crate::error::AppError;

mod journey;

/// Start the TUI.
pub fn run(args: DataArgs) -> Result<(), AppError> {
    // Load before touching the terminal so picker prompts and load errors use
    // the normal screen.
    let loaded = load_data(&args)?;

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::terminal(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(args, loaded);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::terminal(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::terminal(format!("Failed to enter alternate screen: {e}")));
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

/// Filter panel rows, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Project,
    Group,
    Level,
    Cluster,
    Country,
    Psychography,
    Stage,
    Market,
    DriverSet,
}

const FIELDS: [Field; 9] = [
    Field::Project,
    Field::Group,
    Field::Level,
    Field::Cluster,
    Field::Country,
    Field::Psychography,
    Field::Stage,
    Field::Market,
    Field::DriverSet,
];

struct App {
    args: DataArgs,
    loaded: LoadedData,
    criteria: FilterCriteria,
    view: ViewOutput,
    selected_field: usize,
    status: String,
}

impl App {
    fn new(args: DataArgs, loaded: LoadedData) -> Self {
        let criteria = initial_criteria(&loaded);
        let view = build_view(&loaded.report.records, &criteria);
        let status = format!(
            "Loaded {} record(s) from {} file(s).",
            loaded.report.records.len(),
            loaded.report.files_parsed
        );
        Self {
            args,
            loaded,
            criteria,
            view,
            selected_field: 0,
            status,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::terminal(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::terminal(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::terminal(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code)? {
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

    fn handle_key(&mut self, code: KeyCode) -> Result<bool, AppError> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Up => {
                if self.selected_field > 0 {
                    self.selected_field -= 1;
                }
            }
            KeyCode::Down => {
                if self.selected_field < FIELDS.len() - 1 {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Char('r') => self.reload()?,
            KeyCode::Char('e') => self.export(),
            _ => {}
        }

        Ok(false)
    }

    fn adjust_field(&mut self, delta: i32) {
        match FIELDS[self.selected_field] {
            Field::Project => {
                let options = self.view.options.projects.clone();
                if options.is_empty() {
                    return;
                }
                let current = self
                    .criteria
                    .project
                    .as_deref()
                    .and_then(|p| options.iter().position(|o| o == p))
                    .unwrap_or(0);
                let next = step(current, options.len(), delta);
                self.criteria.project = Some(options[next].clone());
                self.status = format!("project: {}", options[next]);
            }
            Field::Group => {
                let group = match self.criteria.data_group {
                    Some(DataGroup::Detail) => DataGroup::Cluster,
                    _ => DataGroup::Detail,
                };
                self.criteria.data_group = Some(group);
                self.criteria.cluster_info = Selection::All;
                self.criteria.driver_set = Selection::All;
                self.status = format!("group: {group}");
            }
            Field::Level => {
                self.criteria.general_factor = !self.criteria.general_factor;
                self.criteria.stage = Selection::All;
                self.status = format!("level: {}", self.criteria.level());
            }
            Field::Cluster => {
                if self.criteria.data_group != Some(DataGroup::Cluster) {
                    self.status = "Cluster applies to the Cluster group only.".to_string();
                    return;
                }
                let options = self.view.options.clusters.clone();
                self.criteria.cluster_info =
                    cycle(&self.criteria.cluster_info, &options, delta);
                self.status = format!("cluster: {}", self.criteria.cluster_info);
            }
            Field::Country => {
                let options = self.view.options.countries.clone();
                self.criteria.country = cycle(&self.criteria.country, &options, delta);
                self.status = format!("country: {}", self.criteria.country);
            }
            Field::Psychography => {
                let options = self.view.options.psychographies.clone();
                self.criteria.psychography =
                    cycle(&self.criteria.psychography, &options, delta);
                self.status = format!("psychography: {}", self.criteria.psychography);
            }
            Field::Stage => {
                if self.criteria.general_factor {
                    self.status = "GFactor views have no stage dimension.".to_string();
                    return;
                }
                let options = self.view.options.stages.clone();
                self.criteria.stage = cycle(&self.criteria.stage, &options, delta);
                self.status = format!("stage: {}", self.criteria.stage);
            }
            Field::Market => {
                let options = self.view.options.markets.clone();
                self.criteria.market = cycle(&self.criteria.market, &options, delta);
                self.status = format!("market: {}", self.criteria.market);
            }
            Field::DriverSet => {
                let options = self.view.options.driver_sets.clone();
                self.criteria.driver_set = cycle(&self.criteria.driver_set, &options, delta);
                self.status = format!("driver set: {}", self.criteria.driver_set);
            }
        }
        self.rebuild_view();
    }

    fn rebuild_view(&mut self) {
        self.view = build_view(&self.loaded.report.records, &self.criteria);
    }

    fn reload(&mut self) -> Result<(), AppError> {
        match load_data(&self.args) {
            Ok(loaded) => {
                self.loaded = loaded;
                self.rebuild_view();
                self.status = format!(
                    "Reloaded: {} record(s), {} warning(s).",
                    self.loaded.report.records.len(),
                    self.loaded.report.warnings.len()
                );
            }
            Err(err) => {
                // Keep the previous table; a transient filesystem problem
                // should not kill the session.
                self.status = format!("Reload failed: {err}");
            }
        }
        Ok(())
    }

    fn export(&mut self) {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let csv_path = std::path::PathBuf::from(format!("tad_view_{stamp}.csv"));
        let json_path = std::path::PathBuf::from(format!("tad_view_{stamp}.json"));

        let snapshot = crate::io::export::Snapshot::new(
            &self.criteria,
            self.view.model_fit.as_ref(),
            &self.view.dropped_drivers,
            &self.view.records,
        );
        let result = crate::io::export::write_view_csv(&csv_path, &self.view.records)
            .and_then(|()| crate::io::export::write_snapshot_json(&json_path, &snapshot));

        self.status = match result {
            Ok(()) => format!(
                "Exported {} record(s) to {} / {}",
                self.view.records.len(),
                csv_path.display(),
                json_path.display()
            ),
            Err(err) => format!("Export failed: {err}"),
        };
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("tad", Style::default().fg(Color::Cyan)),
            Span::raw(" — driver analysis dashboard"),
        ]));
        lines.push(Line::from(Span::styled(
            format!(
                "root: {} | files: {}/{} | records: {} | view: {}",
                self.loaded.config.root.display(),
                self.loaded.report.files_parsed,
                self.loaded.report.files_seen,
                self.loaded.report.records.len(),
                self.view.records.len(),
            ),
            Style::default().fg(Color::Gray),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(34), Constraint::Min(0)])
            .split(area);

        self.draw_filters(frame, chunks[0]);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(4),
            ])
            .split(chunks[1]);

        self.draw_journey(frame, right[0]);
        self.draw_chart(frame, right[1]);
        self.draw_fit(frame, right[2]);
    }

    fn draw_filters(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = FIELDS
            .iter()
            .map(|field| ListItem::new(self.field_label(*field)))
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Filters").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn field_label(&self, field: Field) -> String {
        match field {
            Field::Project => format!(
                "Project: {}",
                self.criteria.project.as_deref().unwrap_or("-")
            ),
            Field::Group => format!(
                "Group: {}",
                self.criteria
                    .data_group
                    .map(|g| g.folder_name())
                    .unwrap_or("-")
            ),
            Field::Level => format!("Level: {}", self.criteria.level()),
            Field::Cluster => {
                if self.criteria.data_group == Some(DataGroup::Cluster) {
                    format!("Cluster: {}", self.criteria.cluster_info)
                } else {
                    "Cluster: n/a".to_string()
                }
            }
            Field::Country => format!("Country: {}", self.criteria.country),
            Field::Psychography => format!("Psychography: {}", self.criteria.psychography),
            Field::Stage => {
                if self.criteria.general_factor {
                    "Stage: n/a".to_string()
                } else {
                    format!("Stage: {}", self.criteria.stage)
                }
            }
            Field::Market => format!("Market: {}", self.criteria.market),
            Field::DriverSet => format!("Driver set: {}", self.criteria.driver_set),
        }
    }

    fn draw_journey(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        if self.criteria.level() == Level::GFactor {
            let p = Paragraph::new(Span::styled(
                "General factor (no journey stages)",
                Style::default().fg(Color::DarkGray),
            ));
            frame.render_widget(p, area);
            return;
        }
        let highlight = match self.criteria.psychography.pinned() {
            Some(psy) => {
                let (red, green, blue) = psychography_color(psy);
                Color::Rgb(red, green, blue)
            }
            None => Color::Yellow,
        };
        frame.render_widget(
            Paragraph::new(journey::journey_line(&self.criteria.stage, highlight)),
            area,
        );
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Drivers").borders(Borders::ALL);
        if self.view.records.is_empty() {
            let msg = Paragraph::new("No records match the current filters.")
                .style(Style::default().fg(Color::Yellow))
                .block(block);
            frame.render_widget(msg, area);
            return;
        }

        let mut records = self.view.records.clone();
        records.sort_by(|a, b| {
            b.value
                .partial_cmp(&a.value)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let visible = area.height.saturating_sub(2) as usize;
        records.truncate(visible.max(1));

        // Bar values are integers; keep three decimals of resolution and show
        // the real value as the text label.
        let bars: Vec<Bar> = records
            .iter()
            .map(|r| {
                let (red, green, blue) = psychography_color(&r.psychography);
                Bar::default()
                    .label(Line::from(r.entity.clone()))
                    .value((r.value.max(0.0) * 1000.0).round() as u64)
                    .text_value(format!("{:.3}", r.value))
                    .style(Style::default().fg(Color::Rgb(red, green, blue)))
            })
            .collect();

        let chart = BarChart::default()
            .block(block)
            .direction(Direction::Horizontal)
            .bar_width(1)
            .bar_gap(0)
            .data(BarGroup::default().bars(&bars));
        frame.render_widget(chart, area);
    }

    fn draw_fit(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Model fit").borders(Borders::ALL);
        let text = match &self.view.model_fit {
            Some(fit) => {
                let dropped = if self.view.dropped_drivers.is_empty() {
                    "none".to_string()
                } else {
                    self.view.dropped_drivers.join(", ")
                };
                Text::from(vec![
                    Line::from(format!("Adjusted R²: {:.2} | N: {}", fit.adjusted_r2, fit.n)),
                    Line::from(format!("Dropped drivers: {dropped}")),
                ])
            }
            None => Text::from(Span::styled(
                "Pin every filter to a single value to see the model fit.",
                Style::default().fg(Color::DarkGray),
            )),
        };
        frame.render_widget(Paragraph::new(text).block(block), area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ adjust  e export  r reload  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn initial_criteria(loaded: &LoadedData) -> FilterCriteria {
    let mut projects: Vec<&str> = loaded
        .report
        .records
        .iter()
        .map(|r| r.project.as_str())
        .collect();
    projects.sort();

    FilterCriteria {
        project: projects.first().map(|p| p.to_string()),
        data_group: Some(DataGroup::Detail),
        ..FilterCriteria::default()
    }
}

/// Cycle a selection through `All` plus the offered options.
fn cycle(current: &Selection, options: &[String], delta: i32) -> Selection {
    // Position 0 is All, positions 1.. are the options.
    let len = options.len() + 1;
    let pos = match current.pinned() {
        None => 0,
        Some(v) => options.iter().position(|o| o == v).map(|i| i + 1).unwrap_or(0),
    };
    let next = step(pos, len, delta);
    if next == 0 {
        Selection::All
    } else {
        Selection::one(options[next - 1].clone())
    }
}

fn step(current: usize, len: usize, delta: i32) -> usize {
    if len == 0 {
        return 0;
    }
    let len = len as i64;
    (((current as i64 + delta as i64) % len + len) % len) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_wraps_through_all_and_options() {
        let options = vec!["US".to_string(), "DE".to_string()];

        let s = cycle(&Selection::All, &options, 1);
        assert_eq!(s.pinned(), Some("US"));
        let s = cycle(&s, &options, 1);
        assert_eq!(s.pinned(), Some("DE"));
        let s = cycle(&s, &options, 1);
        assert!(s.is_all());

        let s = cycle(&Selection::All, &options, -1);
        assert_eq!(s.pinned(), Some("DE"));
    }

    #[test]
    fn cycle_resets_to_all_when_the_pin_is_stale() {
        let options = vec!["US".to_string()];
        // A value narrowed away by an upstream filter falls back to position 0.
        let s = cycle(&Selection::one("FR"), &options, 1);
        assert_eq!(s.pinned(), Some("US"));
    }

    #[test]
    fn cycle_with_no_options_stays_on_all() {
        let s = cycle(&Selection::All, &[], 1);
        assert!(s.is_all());
        assert!(cycle(&s, &[], -1).is_all());
    }
}
