use std::io;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use miette::IntoDiagnostic;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

use crate::api::{CatalogClient, CatalogHttpClient, RawBook};
use crate::domain::PublisherFilter;
use crate::error::ShelfError;
use crate::session::{CatalogSession, LoadPhase};
use crate::supplement::SupplementIndex;

const TICK_MS: u64 = 120;
const HINTS: &[&str] = &[
    "Tip: / starts a title search, Enter commits it",
    "Tip: p cycles the publisher filter, c clears the search",
    "Tip: y sets a year range like 1974-1987",
    "Tip: r refreshes the catalog, q quits",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Browse,
    Search,
    Years,
}

/// Interactive catalog browser. The session keeps serving the previously
/// computed view while a fetch runs on the worker thread.
pub struct Tui {
    client: CatalogHttpClient,
    session: CatalogSession,
    input_mode: InputMode,
    input: String,
    selected: usize,
    publisher_index: Option<usize>,
    pending: Option<mpsc::Receiver<Result<Vec<RawBook>, ShelfError>>>,
    message: Option<String>,
    started: Instant,
}

impl Tui {
    pub fn new(client: CatalogHttpClient, supplement: SupplementIndex) -> Self {
        Self {
            client,
            session: CatalogSession::new(supplement),
            input_mode: InputMode::Browse,
            input: String::new(),
            selected: 0,
            publisher_index: None,
            pending: None,
            message: None,
            started: Instant::now(),
        }
    }

    pub fn run(&mut self) -> miette::Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().into_diagnostic()?;
        stdout.execute(EnterAlternateScreen).into_diagnostic()?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).into_diagnostic()?;
        terminal.clear().into_diagnostic()?;

        if self.session.take_load_request() {
            self.spawn_fetch();
        }

        let result = self.event_loop(&mut terminal);

        disable_raw_mode().into_diagnostic()?;
        let mut stdout = io::stdout();
        stdout.execute(LeaveAlternateScreen).into_diagnostic()?;
        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> miette::Result<()> {
        loop {
            self.poll_pending();
            terminal
                .draw(|frame| draw_ui(frame, self))
                .into_diagnostic()?;

            if event::poll(Duration::from_millis(TICK_MS)).into_diagnostic()? {
                if let Event::Key(key) = event::read().into_diagnostic()? {
                    if self.handle_key(key) {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Fetch on a worker thread so the draw loop keeps rendering the
    /// previous view. `begin_load` makes a second refresh while one is
    /// pending a no-op, so overlapping fetches cannot interleave.
    fn spawn_fetch(&mut self) {
        if !self.session.begin_load() {
            return;
        }
        let (tx, rx) = mpsc::channel();
        let client = self.client.clone();
        thread::spawn(move || {
            let _ = tx.send(client.fetch_books());
        });
        self.pending = Some(rx);
    }

    fn poll_pending(&mut self) {
        let Some(rx) = &self.pending else {
            return;
        };
        if let Ok(outcome) = rx.try_recv() {
            self.pending = None;
            self.session.complete_load(outcome);
            self.publisher_index = match &self.session.filter().publisher {
                PublisherFilter::Any => None,
                PublisherFilter::Named(name) => self
                    .session
                    .domain()
                    .publishers
                    .iter()
                    .position(|publisher| publisher == name),
            };
            self.clamp_selection();
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        match self.input_mode {
            InputMode::Browse => self.handle_browse_key(key),
            InputMode::Search | InputMode::Years => {
                self.handle_input_key(key);
                false
            }
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = self.selected.saturating_add(1);
                self.clamp_selection();
            }
            KeyCode::Char('/') => {
                self.input_mode = InputMode::Search;
                self.input = self.session.filter().search.clone();
            }
            KeyCode::Char('c') => {
                self.session.clear_search();
                self.clamp_selection();
            }
            KeyCode::Char('p') => self.cycle_publisher(),
            KeyCode::Char('y') => {
                self.input_mode = InputMode::Years;
                self.input = self
                    .session
                    .filter()
                    .year_range
                    .map(|range| range.to_string())
                    .unwrap_or_default();
            }
            KeyCode::Char('r') => {
                self.session.request_load();
                if self.session.take_load_request() {
                    self.spawn_fetch();
                }
            }
            _ => {}
        }
        false
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.input_mode = InputMode::Browse;
                self.input.clear();
            }
            KeyCode::Enter => {
                self.commit_input();
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(ch) => {
                self.input.push(ch);
            }
            _ => {}
        }
    }

    fn commit_input(&mut self) {
        match self.input_mode {
            InputMode::Search => {
                self.session.set_search(self.input.clone());
                self.message = None;
            }
            InputMode::Years => match parse_year_input(&self.input) {
                Some((a, b)) => {
                    self.session.set_year_range(a, b);
                    self.message = None;
                }
                None => {
                    self.message = Some("year range must look like 1974-1987".to_string());
                }
            },
            InputMode::Browse => {}
        }
        self.input_mode = InputMode::Browse;
        self.input.clear();
        self.clamp_selection();
    }

    fn cycle_publisher(&mut self) {
        let publishers = self.session.domain().publishers.clone();
        if publishers.is_empty() {
            return;
        }
        let next = match self.publisher_index {
            None => Some(0),
            Some(index) if index + 1 < publishers.len() => Some(index + 1),
            Some(_) => None,
        };
        let selector = match next {
            Some(index) => PublisherFilter::Named(publishers[index].clone()),
            None => PublisherFilter::Any,
        };
        if self.session.set_publisher(selector).is_ok() {
            self.publisher_index = next;
            self.clamp_selection();
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.session.view().len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    fn hint(&self) -> &'static str {
        let index = (self.started.elapsed().as_secs() / 5) as usize % HINTS.len();
        HINTS[index]
    }
}

/// "1974-1987" or a single year; endpoints may arrive inverted, the
/// session normalizes them.
fn parse_year_input(input: &str) -> Option<(i32, i32)> {
    let trimmed = input.trim();
    if let Some((a, b)) = trimmed.split_once('-') {
        let low = a.trim().parse::<i32>().ok()?;
        let high = b.trim().parse::<i32>().ok()?;
        return Some((low, high));
    }
    let year = trimmed.parse::<i32>().ok()?;
    Some((year, year))
}

fn draw_ui(frame: &mut ratatui::Frame, tui: &Tui) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(frame.area());

    draw_header(frame, tui, rows[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[1]);

    draw_list(frame, tui, body[0]);
    draw_detail(frame, tui, body[1]);
    draw_footer(frame, tui, rows[2]);
}

fn draw_header(frame: &mut ratatui::Frame, tui: &Tui, area: Rect) {
    let status = tui.session.status();
    let phase = match status.phase {
        LoadPhase::Idle => Span::styled("idle", Style::default().fg(Color::DarkGray)),
        LoadPhase::Loading => Span::styled("loading…", Style::default().fg(Color::Yellow)),
        LoadPhase::Ready => Span::styled("ready", Style::default().fg(Color::Green)),
        LoadPhase::Failed => Span::styled("failed", Style::default().fg(Color::Red)),
    };
    let mut spans = vec![
        phase,
        Span::raw(format!(
            "  {} books, {} shown",
            status.total,
            tui.session.view().len()
        )),
    ];
    if status.rejected > 0 {
        spans.push(Span::styled(
            format!("  {} rejected", status.rejected),
            Style::default().fg(Color::Yellow),
        ));
    }
    if let Some(fetched_at) = &status.fetched_at {
        spans.push(Span::styled(
            format!("  fetched {fetched_at}"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if let Some(error) = &status.error {
        spans.push(Span::styled(
            format!("  {error}"),
            Style::default().fg(Color::Red),
        ));
    }
    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title("kingshelf - Stephen King catalog"),
    );
    frame.render_widget(header, area);
}

fn draw_list(frame: &mut ratatui::Frame, tui: &Tui, area: Rect) {
    let items: Vec<ListItem> = tui
        .session
        .view()
        .iter()
        .map(|book| {
            let marker = if book.image.is_some() { "▣" } else { " " };
            ListItem::new(Line::from(vec![
                Span::raw(format!("{marker} ")),
                Span::styled(
                    book.title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("  {}", book.year),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Books"))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !tui.session.view().is_empty() {
        state.select(Some(tui.selected));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_detail(frame: &mut ratatui::Frame, tui: &Tui, area: Rect) {
    let lines = match tui.session.view().get(tui.selected) {
        Some(book) => {
            let mut lines = vec![
                Line::from(Span::styled(
                    book.title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(format!("Year: {}", book.year)),
                Line::from(format!("Publisher: {}", book.publisher)),
                Line::from(format!("ISBN: {}", book.isbn)),
                Line::from(format!("Pages: {}", book.pages)),
            ];
            match &book.image {
                Some(image) => lines.push(Line::from(format!("Cover: {image}"))),
                None => lines.push(Line::from(Span::styled(
                    "Cover: none",
                    Style::default().fg(Color::DarkGray),
                ))),
            }
            lines
        }
        None => vec![Line::from(Span::styled(
            "no books match the current filters",
            Style::default().fg(Color::DarkGray),
        ))],
    };

    let detail = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Detail"));
    frame.render_widget(detail, area);
}

fn draw_footer(frame: &mut ratatui::Frame, tui: &Tui, area: Rect) {
    let filter = tui.session.filter();
    let line = match tui.input_mode {
        InputMode::Search => Line::from(vec![
            Span::styled("search> ", Style::default().fg(Color::Cyan)),
            Span::raw(tui.input.clone()),
            Span::styled("▏", Style::default().fg(Color::Cyan)),
        ]),
        InputMode::Years => Line::from(vec![
            Span::styled("years> ", Style::default().fg(Color::Cyan)),
            Span::raw(tui.input.clone()),
            Span::styled("▏", Style::default().fg(Color::Cyan)),
        ]),
        InputMode::Browse => {
            let years = filter
                .year_range
                .map(|range| range.to_string())
                .unwrap_or_else(|| "all".to_string());
            let summary = format!(
                "search: {:?}  publisher: {}  years: {}",
                filter.search, filter.publisher, years
            );
            match &tui.message {
                Some(message) => Line::from(vec![
                    Span::raw(summary),
                    Span::styled(
                        format!("  {message}"),
                        Style::default().fg(Color::Yellow),
                    ),
                ]),
                None => Line::from(vec![
                    Span::raw(summary),
                    Span::styled(
                        format!("  {}", tui.hint()),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]),
            }
        }
    };
    let footer = Paragraph::new(line)
        .alignment(Alignment::Left)
        .block(Block::default().borders(Borders::ALL).title("Filters"));
    frame.render_widget(footer, area);
}
