use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

use transfer_ledger::{Account, AccountType, Ledger, MonthlyVolumeReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Balances,
    MonthlyVolume,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Balances => Page::MonthlyVolume,
            Page::MonthlyVolume => Page::Balances,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Balances => "Account Balances",
            Page::MonthlyVolume => "Monthly Volume",
        }
    }
}

/// Read-only dashboard over a copy of the ledger taken at startup
pub struct App {
    pub accounts: Vec<Account>,
    pub report: MonthlyVolumeReport,
    pub transfer_count: usize,
    pub filter: Option<AccountType>,
    pub current_page: Page,
    pub state: TableState,
}

impl App {
    pub fn new(ledger: &Ledger) -> Self {
        let accounts = ledger.accounts().all().to_vec();

        let mut state = TableState::default();
        if !accounts.is_empty() {
            state.select(Some(0));
        }

        Self {
            accounts,
            report: transfer_ledger::monthly_volume_by_recipient(
                ledger.transfers().as_slice(),
                ledger.accounts(),
            ),
            transfer_count: ledger.transfers().len(),
            filter: None,
            current_page: Page::Balances,
            state,
        }
    }

    pub fn visible_accounts(&self) -> Vec<&Account> {
        self.accounts
            .iter()
            .filter(|a| self.filter.map_or(true, |t| a.account_type == t))
            .collect()
    }

    /// all -> savings -> checking -> investment -> all
    pub fn cycle_filter(&mut self) {
        self.filter = match self.filter {
            None => Some(AccountType::Savings),
            Some(AccountType::Savings) => Some(AccountType::Checking),
            Some(AccountType::Checking) => Some(AccountType::Investment),
            Some(AccountType::Investment) => None,
        };
        let has_rows = !self.visible_accounts().is_empty();
        self.state.select(if has_rows { Some(0) } else { None });
    }

    fn row_count(&self) -> usize {
        match self.current_page {
            Page::Balances => self.visible_accounts().len(),
            Page::MonthlyVolume => self.report.series.len(),
        }
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
        let has_rows = self.row_count() > 0;
        self.state.select(if has_rows { Some(0) } else { None });
    }

    pub fn next(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.map_err(Into::into)
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Tab => app.next_page(),
                KeyCode::Char('f') if app.current_page == Page::Balances => app.cycle_filter(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Balances => render_balances(f, chunks[1], app),
        Page::MonthlyVolume => render_monthly_volume(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in [Page::Balances, Page::MonthlyVolume].iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    let total: f64 = app.accounts.iter().map(|a| a.balance()).sum();

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Accounts: {}", app.accounts.len()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Transfers: {}", app.transfer_count),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Total: {:.2}", total),
        Style::default().fg(balance_color(total)),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_balances(f: &mut Frame, area: Rect, app: &mut App) {
    let header = header_row(&["Name", "Type", "Balance"]);

    let accounts = app.visible_accounts();
    let title = format!(
        " Account Balances ({}) - {} ",
        accounts.len(),
        app.filter.map_or("all", |t| t.as_str())
    );

    let rows: Vec<Row> = accounts
        .iter()
        .map(|account| {
            Row::new(vec![
                Cell::from(account.name.clone()),
                Cell::from(account.account_type.as_str()),
                Cell::from(format!("{:.2}", account.balance()))
                    .style(Style::default().fg(balance_color(account.balance()))),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(32),
            Constraint::Length(12),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_monthly_volume(f: &mut Frame, area: Rect, app: &mut App) {
    if app.report.months.is_empty() {
        let empty = Paragraph::new("No transfers recorded yet").block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Monthly Volume by Recipient Account "),
        );
        f.render_widget(empty, area);
        return;
    }

    let mut headings = vec!["Account"];
    headings.extend(app.report.months.iter().map(String::as_str));
    let header = header_row(&headings);

    let rows: Vec<Row> = app
        .report
        .series
        .iter()
        .map(|series| {
            let mut cells = vec![Cell::from(series.name.clone())];
            cells.extend(series.data.iter().map(|v| Cell::from(format!("{:.2}", v))));
            Row::new(cells)
        })
        .collect();

    let mut widths = vec![Constraint::Length(26)];
    widths.extend(app.report.months.iter().map(|_| Constraint::Length(12)));

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Monthly Volume by Recipient Account "),
        )
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![
        Span::styled("Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" Page | "),
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" Nav | "),
    ];

    if app.current_page == Page::Balances {
        status_spans.push(Span::styled("f", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Filter type | "));
    }

    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn header_row<'a>(titles: &[&'a str]) -> Row<'a> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    Row::new(cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1)
}

fn balance_color(balance: f64) -> Color {
    if balance < 0.0 {
        Color::Red
    } else {
        Color::Green
    }
}
