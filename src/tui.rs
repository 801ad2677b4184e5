use std::io;
use std::time::Duration;

use chrono::{Datelike, Months, NaiveDate};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset as Series, GraphType, Paragraph, Wrap,
};
use ratatui::Terminal;
use tracing::info;

use crate::config::DashboardConfig;
use crate::loader::Dataset;
use crate::selection::{detail_for, ChartKind, ClickEvent, DetailPanel, HeadlineDetail, PriceDirection, Selection};
use crate::types::{SentimentKind, ViewQuery, ALL_KINDS};
use crate::views::{snapshot, Snapshot};

const THRESHOLD_STEP: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    PriceLine,
    Monthly,
}

struct App<'a> {
    dataset: &'a Dataset,
    symbols: Vec<String>,
    stock_idx: usize,
    query: ViewQuery,
    snapshot: Snapshot,
    selection: Selection,
    detail: DetailPanel,
    focus: Focus,
    cursor: usize,
    should_quit: bool,
}

impl<'a> App<'a> {
    fn new(dataset: &'a Dataset, query: ViewQuery) -> Self {
        let symbols: Vec<String> = dataset.symbols().into_iter().map(str::to_string).collect();
        let stock_idx = symbols.iter().position(|s| *s == query.stock).unwrap_or(0);
        let snapshot = snapshot(dataset, &query);
        let selection = Selection::default();
        let detail = detail_for(dataset, &query.stock, &snapshot.monthly, selection);
        Self {
            dataset,
            symbols,
            stock_idx,
            query,
            snapshot,
            selection,
            detail,
            focus: Focus::Monthly,
            cursor: 0,
            should_quit: false,
        }
    }

    /// Recompute every view after a widget change.
    fn refresh(&mut self) {
        self.snapshot = snapshot(self.dataset, &self.query);
        self.cursor = self.cursor.min(self.point_count().saturating_sub(1));
        self.detail = detail_for(self.dataset, &self.query.stock, &self.snapshot.monthly, self.selection);
    }

    fn point_count(&self) -> usize {
        match self.focus {
            Focus::PriceLine => self.snapshot.line.prices.len(),
            Focus::Monthly => self.snapshot.monthly.len(),
        }
    }

    fn cursor_date(&self) -> Option<NaiveDate> {
        match self.focus {
            Focus::PriceLine => self.snapshot.line.prices.get(self.cursor).map(|p| p.date),
            Focus::Monthly => self.snapshot.monthly.get(self.cursor).map(|b| b.month_end),
        }
    }

    fn cycle_stock(&mut self, forward: bool) {
        if self.symbols.is_empty() {
            return;
        }
        let n = self.symbols.len();
        self.stock_idx = if forward { (self.stock_idx + 1) % n } else { (self.stock_idx + n - 1) % n };
        self.query.stock = self.symbols[self.stock_idx].clone();
        self.refresh();
    }

    fn click(&mut self) {
        let Some(x) = self.cursor_date() else { return };
        let chart = match self.focus {
            Focus::PriceLine => ChartKind::PriceLine,
            Focus::Monthly => ChartKind::MonthlyCompound,
        };
        self.selection = self.selection.click(ClickEvent { chart, x });
        self.detail = detail_for(self.dataset, &self.query.stock, &self.snapshot.monthly, self.selection);
    }

    fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Left => self.cycle_stock(false),
            KeyCode::Right => self.cycle_stock(true),
            KeyCode::Char('s') => {
                self.query.selector = self.query.selector.next();
                self.refresh();
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.query.threshold = (self.query.threshold + THRESHOLD_STEP).min(1.0);
                self.refresh();
            }
            KeyCode::Char('-') => {
                self.query.threshold = (self.query.threshold - THRESHOLD_STEP).max(0.0);
                self.refresh();
            }
            KeyCode::Char('[') => self.shift_start(false),
            KeyCode::Char(']') => self.shift_start(true),
            KeyCode::Char('{') => self.shift_end(false),
            KeyCode::Char('}') => self.shift_end(true),
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::PriceLine => Focus::Monthly,
                    Focus::Monthly => Focus::PriceLine,
                };
                self.cursor = 0;
            }
            KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down => {
                if self.cursor + 1 < self.point_count() {
                    self.cursor += 1;
                }
            }
            KeyCode::Enter => self.click(),
            _ => {}
        }
    }

    fn shift_start(&mut self, later: bool) {
        if let Some(d) = shift_month(self.query.start, later) {
            self.query.start = d;
            self.refresh();
        }
    }

    fn shift_end(&mut self, later: bool) {
        if let Some(d) = shift_month(self.query.end, later) {
            self.query.end = d;
            self.refresh();
        }
    }
}

fn shift_month(date: NaiveDate, later: bool) -> Option<NaiveDate> {
    if later {
        date.checked_add_months(Months::new(1))
    } else {
        date.checked_sub_months(Months::new(1))
    }
}

pub fn run(config: &DashboardConfig, dataset: &Dataset) -> Result<(), Box<dyn std::error::Error>> {
    let Some(query) = config.view.resolve(dataset) else {
        return Err("dataset is empty, nothing to show".into());
    };
    info!(stock = %query.stock, "starting terminal dashboard");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, App::new(dataset, query));

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App<'_>,
) -> Result<(), Box<dyn std::error::Error>> {
    while !app.should_quit {
        terminal.draw(|f| draw(f, &app))?;

        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key.code);
                }
            }
        }
    }
    Ok(())
}

fn kind_color(kind: SentimentKind) -> Color {
    match kind {
        SentimentKind::Positive => Color::Green,
        SentimentKind::Neutral => Color::Blue,
        SentimentKind::Negative => Color::Red,
    }
}

fn direction_color(direction: Option<PriceDirection>) -> Color {
    match direction {
        Some(PriceDirection::Gain) => Color::Green,
        Some(PriceDirection::Loss) => Color::Red,
        None => Color::DarkGray,
    }
}

fn day_x(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn draw(f: &mut ratatui::Frame, app: &App) {
    let size = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),      // header
            Constraint::Percentage(40), // price line
            Constraint::Min(10),        // monthly + composition
            Constraint::Length(5),      // detail
        ])
        .split(size);

    draw_header(f, app, chunks[0]);
    draw_price_line(f, app, chunks[1]);

    let lower = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[2]);
    draw_monthly(f, app, lower[0]);
    draw_composition(f, app, lower[1]);

    draw_detail(f, app, chunks[3]);
}

fn draw_header(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let q = &app.query;
    let header = vec![
        Span::styled(format!(" {} ", q.stock), Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::raw(" | "),
        Span::styled(format!("Sentiment: {}", q.selector.label()), Style::default().fg(Color::Yellow)),
        Span::raw(" | "),
        Span::styled(format!("Threshold: {:.2}", q.threshold), Style::default().fg(Color::Green)),
        Span::raw(" | "),
        Span::raw(format!("{} .. {}", q.start, q.end)),
        Span::raw(" | "),
        Span::styled(
            "q=quit  </>=stock  s=sentiment  +/-=threshold  [ ] { }=dates  Tab/Up/Down/Enter=select",
            Style::default().fg(Color::DarkGray),
        ),
    ];
    let p = Paragraph::new(Line::from(header))
        .block(Block::default().borders(Borders::ALL).title(" Stock Prices and Sentiment "));
    f.render_widget(p, area);
}

fn focus_title(app: &App, focus: Focus, title: &str) -> Block<'static> {
    let style = if app.focus == focus {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Block::default().borders(Borders::ALL).title(Span::styled(format!(" {title} "), style))
}

fn draw_price_line(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let block = focus_title(app, Focus::PriceLine, "Stock Prices and Sentiment Over Time");
    let line = &app.snapshot.line;
    if line.prices.is_empty() {
        f.render_widget(Paragraph::new("No data for this stock and date range.").block(block), area);
        return;
    }

    let prices: Vec<(f64, f64)> = line.prices.iter().map(|p| (day_x(p.date), p.price)).collect();
    let markers: Vec<(SentimentKind, Vec<(f64, f64)>)> = ALL_KINDS
        .iter()
        .map(|kind| {
            let pts = line
                .markers
                .iter()
                .filter(|m| m.label == *kind)
                .map(|m| (day_x(m.date), m.price))
                .collect();
            (*kind, pts)
        })
        .collect();
    let cursor: Vec<(f64, f64)> = match app.focus {
        Focus::PriceLine => prices.get(app.cursor).copied().into_iter().collect(),
        Focus::Monthly => Vec::new(),
    };

    let mut series = vec![Series::default()
        .name("Stock Price")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::White))
        .data(&prices)];
    for (kind, pts) in &markers {
        series.push(
            Series::default()
                .name(kind.label())
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(kind_color(*kind)))
                .data(pts),
        );
    }
    series.push(
        Series::default()
            .marker(symbols::Marker::Block)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Yellow))
            .data(&cursor),
    );

    let (x0, x1) = (day_x(app.query.start), day_x(app.query.end).max(day_x(app.query.start) + 1.0));
    let (lo, hi) = bounds(prices.iter().map(|p| p.1));
    let chart = Chart::new(series)
        .block(block)
        .x_axis(
            Axis::default()
                .title("Date")
                .bounds([x0, x1])
                .labels(vec![app.query.start.to_string(), app.query.end.to_string()]),
        )
        .y_axis(
            Axis::default()
                .title("Stock Price")
                .bounds([lo, hi])
                .labels(vec![format!("{lo:.2}"), format!("{hi:.2}")]),
        );
    f.render_widget(chart, area);
}

fn draw_monthly(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let block = focus_title(app, Focus::Monthly, "Compound Sentiment and Scaled Open Price % Change By Month");
    let buckets = &app.snapshot.monthly;
    if buckets.is_empty() {
        f.render_widget(Paragraph::new("No monthly data.").block(block), area);
        return;
    }

    let compound: Vec<(f64, f64)> = buckets.iter().map(|b| (day_x(b.month_end), b.compound)).collect();
    let scaled: Vec<(f64, f64)> = buckets
        .iter()
        .filter_map(|b| b.scaled_pct_change.map(|s| (day_x(b.month_end), s)))
        .collect();
    let cursor: Vec<(f64, f64)> = match app.focus {
        Focus::Monthly => compound.get(app.cursor).copied().into_iter().collect(),
        Focus::PriceLine => Vec::new(),
    };

    let first = buckets[0].month_end;
    let last = buckets[buckets.len() - 1].month_end;
    let (x0, x1) = (day_x(first) - 15.0, day_x(last) + 15.0);
    let (lo, hi) = bounds(compound.iter().chain(scaled.iter()).map(|p| p.1));

    let series = vec![
        Series::default()
            .name("Compound Sentiment")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Magenta))
            .data(&compound),
        Series::default()
            .name("Scaled Open Price % Change")
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&scaled),
        Series::default()
            .marker(symbols::Marker::Block)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Yellow))
            .data(&cursor),
    ];

    let chart = Chart::new(series)
        .block(block)
        .x_axis(
            Axis::default()
                .title("Month")
                .bounds([x0, x1])
                .labels(vec![first.format("%Y-%m").to_string(), last.format("%Y-%m").to_string()]),
        )
        .y_axis(
            Axis::default()
                .bounds([lo, hi])
                .labels(vec![format!("{lo:.2}"), format!("{hi:.2}")]),
        );
    f.render_widget(chart, area);
}

fn draw_composition(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Sentiment Composition ");
    let Some(comp) = &app.snapshot.composition else {
        f.render_widget(Paragraph::new("No data.").block(block), area);
        return;
    };

    let bars: Vec<Bar> = ALL_KINDS
        .iter()
        .map(|kind| {
            let value = comp.get(*kind);
            Bar::default()
                .value((value * 100.0).round() as u64)
                .text_value(format!("{value:.2}"))
                .label(Line::from(kind.label()))
                .style(Style::default().fg(kind_color(*kind)))
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .bar_width(9)
        .bar_gap(2)
        .max(100)
        .data(BarGroup::default().bars(&bars));
    f.render_widget(chart, area);
}

fn draw_detail(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let lines = match &app.detail {
        DetailPanel::Empty { prompt } => vec![Line::from(Span::styled(*prompt, Style::default().fg(Color::DarkGray)))],
        DetailPanel::Price { info: None } => {
            vec![Line::from(Span::styled("No price data for the selected month.", Style::default().fg(Color::Red)))]
        }
        DetailPanel::Price { info: Some(info) } => {
            let color = direction_color(info.direction);
            vec![
                Line::from(Span::styled(
                    format!("Price Information ({})", info.month_end.format("%Y-%m")),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(format!("Price: {}", info.price_text())),
                Line::from(vec![
                    Span::raw("Percent Change: "),
                    Span::styled(info.pct_change_text(), Style::default().fg(color).add_modifier(Modifier::BOLD)),
                ]),
            ]
        }
        DetailPanel::Headline { detail } => {
            let style = match detail {
                HeadlineDetail::Found { .. } => Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                HeadlineDetail::NotAvailable => Style::default().fg(Color::Red),
            };
            vec![Line::from(Span::styled(detail.message(), style))]
        }
    };
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Detail "));
    f.render_widget(p, area);
}

/// Padded (min, max) of `values`, never a zero-height range.
fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((hi - lo) * 0.05).max(0.01);
    (lo - pad, hi + pad)
}
