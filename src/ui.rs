use anyhow::Result;
use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use expense_tracker::csv_codec::parse_amount;
use expense_tracker::filter::parse_date;
use expense_tracker::{
    format_amount, EntryType, FilterMode, KeyValueStore, RecordId, RecurringDraft, RecurringItem,
    Summary, Tracker, Transaction, TransactionDraft, ViewState,
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

const PAGE_JUMP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Transactions,
    Recurring,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Transactions => Page::Recurring,
            Page::Recurring => Page::Transactions,
        }
    }

    pub fn previous(&self) -> Self {
        // Two pages: same as next
        self.next()
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Transactions => "Transactions",
            Page::Recurring => "Recurring",
        }
    }
}

/// Delete waiting for a y/n answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingDelete {
    pub page: Page,
    pub id: RecordId,
}

// ============================================================================
// EDIT FORM
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub label: &'static str,
    pub value: String,
}

/// Text fields for the record being edited. Which record is tracked by the
/// edit markers in `ViewState`.
#[derive(Debug, Clone, PartialEq)]
pub struct EditForm {
    pub fields: Vec<FormField>,
    pub focus: usize,
}

impl EditForm {
    fn new(fields: Vec<(&'static str, String)>) -> Self {
        Self {
            fields: fields
                .into_iter()
                .map(|(label, value)| FormField { label, value })
                .collect(),
            focus: 0,
        }
    }

    pub fn for_transaction(tx: &Transaction) -> Self {
        Self::new(vec![
            ("Date", tx.date.clone()),
            ("Type", tx.entry_type.as_str().to_string()),
            ("Category", tx.category.clone()),
            ("Amount", tx.amount.to_string()),
        ])
    }

    pub fn for_recurring(item: &RecurringItem) -> Self {
        Self::new(vec![
            ("Name", item.name.clone()),
            ("Type", item.entry_type.as_str().to_string()),
            ("Amount", item.amount.to_string()),
        ])
    }

    pub fn next_field(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    pub fn previous_field(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }

    pub fn push(&mut self, c: char) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.value.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.value.pop();
        }
    }

    fn value(&self, index: usize) -> &str {
        self.fields.get(index).map_or("", |field| field.value.trim())
    }

    fn required(&self, index: usize) -> Result<String, String> {
        match self.value(index) {
            "" => Err(format!(
                "{} is required",
                self.fields.get(index).map_or("field", |field| field.label)
            )),
            value => Ok(value.to_string()),
        }
    }

    fn amount(&self, index: usize) -> Result<f64, String> {
        let raw = self.value(index);
        parse_amount(raw).ok_or_else(|| format!("amount `{}` is not a number", raw))
    }

    fn entry_type(&self, index: usize) -> EntryType {
        EntryType::from(self.value(index).to_lowercase().as_str())
    }

    pub fn transaction_draft(&self) -> Result<TransactionDraft, String> {
        let raw_date = self.value(0);
        let date = parse_date(raw_date)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .ok_or_else(|| format!("`{}` is not a YYYY-MM-DD date", raw_date))?;
        Ok(TransactionDraft {
            date,
            entry_type: self.entry_type(1),
            category: self.required(2)?,
            amount: self.amount(3)?,
        })
    }

    pub fn recurring_draft(&self) -> Result<RecurringDraft, String> {
        Ok(RecurringDraft {
            name: self.required(0)?,
            entry_type: self.entry_type(1),
            amount: self.amount(2)?,
        })
    }
}

pub struct App<S: KeyValueStore> {
    pub tracker: Tracker<S>,
    pub view: ViewState,
    pub today: NaiveDate,
    pub current_page: Page,
    pub transactions_state: TableState,
    pub recurring_state: TableState,
    pub show_detail: bool,
    pub pending_delete: Option<PendingDelete>,
    pub notification: Option<String>,
    pub transaction_form: Option<EditForm>,
    pub recurring_form: Option<EditForm>,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(tracker: Tracker<S>, today: NaiveDate) -> Self {
        let mut app = Self {
            tracker,
            view: ViewState::new(),
            today,
            current_page: Page::Transactions,
            transactions_state: TableState::default(),
            recurring_state: TableState::default(),
            show_detail: false,
            pending_delete: None,
            notification: None,
            transaction_form: None,
            recurring_form: None,
        };
        app.reset_selection();
        let recurring_len = app.tracker.records().recurring().len();
        app.recurring_state
            .select(if recurring_len > 0 { Some(0) } else { None });
        app
    }

    // ========================================================================
    // ROWS
    // ========================================================================

    /// Ids of the rows on the current page, in display order
    pub fn visible_ids(&self) -> Vec<RecordId> {
        match self.current_page {
            Page::Transactions => self
                .view
                .rows(self.tracker.records().transactions(), self.today)
                .iter()
                .map(|tx| tx.id)
                .collect(),
            Page::Recurring => self
                .tracker
                .records()
                .recurring()
                .iter()
                .map(|item| item.id)
                .collect(),
        }
    }

    pub fn summary(&self) -> Summary {
        self.tracker.snapshot(&self.view, self.today).summary
    }

    fn table_state(&mut self) -> &mut TableState {
        match self.current_page {
            Page::Transactions => &mut self.transactions_state,
            Page::Recurring => &mut self.recurring_state,
        }
    }

    pub fn selected_id(&self) -> Option<RecordId> {
        let state = match self.current_page {
            Page::Transactions => &self.transactions_state,
            Page::Recurring => &self.recurring_state,
        };
        state
            .selected()
            .and_then(|i| self.visible_ids().get(i).copied())
    }

    fn reset_selection(&mut self) {
        let len = self.visible_ids().len();
        self.table_state()
            .select(if len > 0 { Some(0) } else { None });
    }

    /// Keep the selection inside the row count after a delete
    fn clamp_selection(&mut self) {
        let len = self.visible_ids().len();
        let state = self.table_state();
        match state.selected() {
            _ if len == 0 => state.select(None),
            Some(i) if i >= len => state.select(Some(len - 1)),
            None => state.select(Some(0)),
            _ => {}
        }
    }

    // ========================================================================
    // NAVIGATION
    // ========================================================================

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
        self.clamp_selection();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
        self.clamp_selection();
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn next(&mut self) {
        let len = self.visible_ids().len();
        if len == 0 {
            return;
        }
        let state = self.table_state();
        let i = match state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.visible_ids().len();
        if len == 0 {
            return;
        }
        let state = self.table_state();
        let i = match state.selected() {
            Some(0) => len - 1,
            Some(i) => i - 1,
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.visible_ids().len();
        if len == 0 {
            return;
        }
        let state = self.table_state();
        let i = state
            .selected()
            .map_or(0, |i| (i + PAGE_JUMP).min(len - 1));
        state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        if self.visible_ids().is_empty() {
            return;
        }
        let state = self.table_state();
        let i = state.selected().map_or(0, |i| i.saturating_sub(PAGE_JUMP));
        state.select(Some(i));
    }

    // ========================================================================
    // FILTERS
    // ========================================================================

    pub fn cycle_filter(&mut self) {
        let mode = self.view.filter_mode.next();
        self.view.set_filter_mode(mode, self.today);
        self.reset_selection();
    }

    /// Move the reference date/year one period
    pub fn step_period(&mut self, forward: bool) {
        self.view.step(forward, self.today);
        self.reset_selection();
    }

    pub fn clear_filter(&mut self) {
        self.view.filter_mode = FilterMode::All;
        self.view.set_filter_date(None);
        self.view.set_filter_year(None);
        self.reset_selection();
    }

    // ========================================================================
    // EDIT
    // One transaction and one recurring item can be open at the same time.
    // ========================================================================

    /// Is an edit open on the current page
    pub fn editing(&self) -> bool {
        match self.current_page {
            Page::Transactions => self.view.editing_transaction().is_some(),
            Page::Recurring => self.view.editing_recurring().is_some(),
        }
    }

    pub fn form(&self) -> Option<&EditForm> {
        match self.current_page {
            Page::Transactions => self.transaction_form.as_ref(),
            Page::Recurring => self.recurring_form.as_ref(),
        }
    }

    fn form_mut(&mut self) -> Option<&mut EditForm> {
        match self.current_page {
            Page::Transactions => self.transaction_form.as_mut(),
            Page::Recurring => self.recurring_form.as_mut(),
        }
    }

    /// Open the selected record for editing
    pub fn begin_edit(&mut self) {
        if self.editing() {
            return;
        }
        let Some(id) = self.selected_id() else {
            return;
        };
        match self.current_page {
            Page::Transactions => {
                if let Some(tx) = self.tracker.records().transaction(id) {
                    self.transaction_form = Some(EditForm::for_transaction(tx));
                    self.view.begin_edit_transaction(id);
                }
            }
            Page::Recurring => {
                if let Some(item) = self.tracker.records().recurring_item(id) {
                    self.recurring_form = Some(EditForm::for_recurring(item));
                    self.view.begin_edit_recurring(id);
                }
            }
        }
    }

    pub fn edit_input(&mut self, c: char) {
        if let Some(form) = self.form_mut() {
            form.push(c);
        }
    }

    pub fn edit_backspace(&mut self) {
        if let Some(form) = self.form_mut() {
            form.backspace();
        }
    }

    pub fn edit_next_field(&mut self) {
        if let Some(form) = self.form_mut() {
            form.next_field();
        }
    }

    pub fn edit_previous_field(&mut self) {
        if let Some(form) = self.form_mut() {
            form.previous_field();
        }
    }

    /// Persist the open edit. On a bad field the edit stays open.
    pub fn save_edit(&mut self) {
        let outcome = match self.current_page {
            Page::Transactions => {
                let (Some(id), Some(form)) =
                    (self.view.editing_transaction(), &self.transaction_form)
                else {
                    return;
                };
                match form.transaction_draft() {
                    Ok(draft) => self
                        .tracker
                        .update_transaction(id, draft)
                        .map(|_| id)
                        .map_err(|e| e.to_string()),
                    Err(msg) => Err(msg),
                }
            }
            Page::Recurring => {
                let (Some(id), Some(form)) = (self.view.editing_recurring(), &self.recurring_form)
                else {
                    return;
                };
                match form.recurring_draft() {
                    Ok(draft) => self
                        .tracker
                        .update_recurring(id, draft)
                        .map(|_| id)
                        .map_err(|e| e.to_string()),
                    Err(msg) => Err(msg),
                }
            }
        };

        match outcome {
            Ok(id) => {
                self.close_edit();
                self.notification = Some(format!("Saved {}", id.short()));
                self.clamp_selection();
            }
            Err(msg) => {
                tracing::warn!(error = %msg, "edit not saved");
                self.notification = Some(format!("Not saved: {}", msg));
            }
        }
    }

    pub fn cancel_edit(&mut self) {
        if self.editing() {
            self.close_edit();
            self.notification = Some("Edit cancelled".to_string());
        }
    }

    fn close_edit(&mut self) {
        match self.current_page {
            Page::Transactions => {
                self.transaction_form = None;
                self.view.cancel_edit_transaction();
            }
            Page::Recurring => {
                self.recurring_form = None;
                self.view.cancel_edit_recurring();
            }
        }
    }

    // ========================================================================
    // DELETE
    // ========================================================================

    pub fn request_delete(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        let records = self.tracker.records();
        let label = match self.current_page {
            Page::Transactions => records
                .transaction(id)
                .map(|tx| format!("{} {} {}", tx.date, tx.category, format_amount(tx.amount))),
            Page::Recurring => records
                .recurring_item(id)
                .map(|item| format!("{} {}", item.name, format_amount(item.amount))),
        };
        if let Some(label) = label {
            self.notification = Some(format!("Delete {}? (y/n)", label));
            self.pending_delete = Some(PendingDelete {
                page: self.current_page,
                id,
            });
        }
    }

    pub fn confirm_delete(&mut self) {
        let Some(pending) = self.pending_delete.take() else {
            return;
        };
        let result = match pending.page {
            Page::Transactions => self.tracker.remove_transaction(pending.id).map(|_| ()),
            Page::Recurring => self.tracker.remove_recurring(pending.id).map(|_| ()),
        };
        self.notification = Some(match result {
            Ok(()) => format!("Deleted {}", pending.id.short()),
            Err(e) => {
                tracing::error!(error = %e, "delete failed");
                format!("Delete failed: {}", e)
            }
        });
        self.clamp_selection();
    }

    pub fn cancel_delete(&mut self) {
        if self.pending_delete.take().is_some() {
            self.notification = Some("Delete cancelled".to_string());
        }
    }
}

pub fn run_ui<S: KeyValueStore>(app: &mut App<S>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend, S: KeyValueStore>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if app.pending_delete.is_some() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete(),
                _ => app.cancel_delete(),
            }
            continue;
        }

        if app.editing() {
            match key.code {
                KeyCode::Enter => app.save_edit(),
                KeyCode::Esc => app.cancel_edit(),
                KeyCode::Tab | KeyCode::Down => app.edit_next_field(),
                KeyCode::BackTab | KeyCode::Up => app.edit_previous_field(),
                KeyCode::Backspace => app.edit_backspace(),
                KeyCode::F(2) => app.next_page(),
                KeyCode::Char(c) => app.edit_input(c),
                _ => {}
            }
            continue;
        }

        app.notification = None;
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
            KeyCode::Char('e') => app.begin_edit(),
            KeyCode::F(2) => app.next_page(),
            KeyCode::Enter => app.toggle_detail(),
            KeyCode::Tab => app.next_page(),
            KeyCode::BackTab => app.previous_page(),
            KeyCode::Char('f') => app.cycle_filter(),
            KeyCode::Char('c') => app.clear_filter(),
            KeyCode::Left | KeyCode::Char('h') => app.step_period(false),
            KeyCode::Right | KeyCode::Char('l') => app.step_period(true),
            KeyCode::Char('d') | KeyCode::Delete => app.request_delete(),
            KeyCode::Down | KeyCode::Char('j') => app.next(),
            KeyCode::Up | KeyCode::Char('k') => app.previous(),
            KeyCode::PageDown => app.page_down(),
            KeyCode::PageUp => app.page_up(),
            KeyCode::Home => app.reset_selection(),
            KeyCode::End => {
                let len = app.visible_ids().len();
                if len > 0 {
                    app.table_state().select(Some(len - 1));
                }
            }
            _ => {}
        }
    }
}

fn ui<S: KeyValueStore>(f: &mut Frame, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tabs + totals
            Constraint::Min(0),    // Table
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.editing() {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        match app.current_page {
            Page::Transactions => render_transactions(f, content_chunks[0], app),
            Page::Recurring => render_recurring(f, content_chunks[0], app),
        }
        render_edit_panel(f, content_chunks[1], app);
        render_status_bar(f, chunks[2], app);
        return;
    }

    match app.current_page {
        Page::Transactions if app.show_detail => {
            let content_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(chunks[1]);

            render_transactions(f, content_chunks[0], app);
            render_detail_panel(f, content_chunks[1], app);
        }
        Page::Transactions => render_transactions(f, chunks[1], app),
        Page::Recurring => render_recurring(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn type_color(entry_type: &EntryType) -> Color {
    match entry_type {
        EntryType::Income => Color::Green,
        EntryType::Expense => Color::Red,
        EntryType::Unrecognized(_) => Color::DarkGray,
    }
}

fn render_header<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let summary = app.summary();

    let mut tab_spans = vec![];
    for (i, page) in [Page::Transactions, Page::Recurring].iter().enumerate() {
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
        let open_edit = match page {
            Page::Transactions => app.view.editing_transaction().is_some(),
            Page::Recurring => app.view.editing_recurring().is_some(),
        };
        let title = if open_edit {
            format!("{} ✎", page.title())
        } else {
            page.title().to_string()
        };
        tab_spans.push(Span::styled(title, style));
    }

    let balance_color = if summary.is_deficit() {
        Color::Red
    } else {
        Color::Green
    };

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Income {}", format_amount(summary.total_income)),
        Style::default().fg(Color::Green),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("Expense {}", format_amount(summary.total_expense)),
        Style::default().fg(Color::Red),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("Balance {}", format_amount(summary.balance)),
        Style::default()
            .fg(balance_color)
            .add_modifier(Modifier::BOLD),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
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

fn render_transactions<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &mut App<S>) {
    let snapshot = app.tracker.snapshot(&app.view, app.today);

    let rows: Vec<Row> = snapshot
        .rows
        .iter()
        .map(|tx| {
            let color = type_color(&tx.entry_type);
            Row::new(vec![
                Cell::from(tx.date.clone()),
                Cell::from(tx.entry_type.label().to_string()).style(Style::default().fg(color)),
                Cell::from(truncate(&tx.category, 30)),
                Cell::from(format_amount(tx.amount)).style(Style::default().fg(color)),
                Cell::from(tx.id.short()).style(Style::default().fg(Color::DarkGray)),
            ])
            .height(1)
        })
        .collect();

    let title = format!(" Transactions - {} ({}) ", app.view.describe(), rows.len());

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(9),
            Constraint::Length(32),
            Constraint::Length(14),
            Constraint::Length(10),
        ],
    )
    .header(header_row(&["Date", "Type", "Category", "Amount", "Id"]))
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

    f.render_stateful_widget(table, area, &mut app.transactions_state);
}

fn render_recurring<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &mut App<S>) {
    let rows: Vec<Row> = app
        .tracker
        .records()
        .recurring()
        .iter()
        .map(|item| {
            let color = type_color(&item.entry_type);
            Row::new(vec![
                Cell::from(truncate(&item.name, 30)),
                Cell::from(item.entry_type.label().to_string()).style(Style::default().fg(color)),
                Cell::from(format_amount(item.amount)).style(Style::default().fg(color)),
                Cell::from(item.id.short()).style(Style::default().fg(Color::DarkGray)),
            ])
            .height(1)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(32),
            Constraint::Length(9),
            Constraint::Length(14),
            Constraint::Length(10),
        ],
    )
    .header(header_row(&["Name", "Type", "Amount", "Id"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Recurring - applied to every period "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.recurring_state);
}

fn render_detail_panel<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Transaction Details ");

    let tx = match app
        .selected_id()
        .and_then(|id| app.tracker.records().transaction(id))
    {
        Some(tx) => tx,
        None => {
            f.render_widget(Paragraph::new("No transaction selected").block(block), area);
            return;
        }
    };

    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let content = vec![
        Line::from(""),
        Line::from(vec![Span::styled("  Date: ", label), Span::raw(tx.date.clone())]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Type: ", label),
            Span::styled(
                tx.entry_type.label().to_string(),
                Style::default().fg(type_color(&tx.entry_type)),
            ),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled("  Category: ", label), Span::raw(tx.category.clone())]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Amount: ", label),
            Span::raw(format_amount(tx.amount)),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled("  Id: ", label), Span::raw(tx.id.to_string())]),
    ];

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn render_edit_panel<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let (kind, id) = match app.current_page {
        Page::Transactions => ("transaction", app.view.editing_transaction()),
        Page::Recurring => ("recurring item", app.view.editing_recurring()),
    };
    let title = match id {
        Some(id) => format!(" Edit {} {} ", kind, id.short()),
        None => format!(" Edit {} ", kind),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(title);

    let Some(form) = app.form() else {
        f.render_widget(Paragraph::new("Nothing to edit").block(block), area);
        return;
    };

    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let mut content = vec![Line::from("")];
    for (i, field) in form.fields.iter().enumerate() {
        let value = if i == form.focus {
            Span::styled(
                format!("{}▏", field.value),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )
        } else {
            Span::raw(field.value.clone())
        };
        content.push(Line::from(vec![
            Span::styled(format!("  {}: ", field.label), label),
            value,
        ]));
        content.push(Line::from(""));
    }

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn render_status_bar<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let status_spans = if let Some(message) = &app.notification {
        let color = if app.pending_delete.is_some() || app.editing() {
            Color::Yellow
        } else {
            Color::Green
        };
        vec![Span::styled(format!(" {} ", message), Style::default().fg(color))]
    } else if app.editing() {
        let key = Style::default().fg(Color::Yellow);
        vec![
            Span::styled("Enter", key),
            Span::raw(" Save | "),
            Span::styled("Esc", key),
            Span::raw(" Cancel | "),
            Span::styled("Tab/↑/↓", key),
            Span::raw(" Field | "),
            Span::styled("F2", key),
            Span::raw(" Other page"),
        ]
    } else {
        let selected = match app.current_page {
            Page::Transactions => app.transactions_state.selected(),
            Page::Recurring => app.recurring_state.selected(),
        }
        .map(|i| i + 1)
        .unwrap_or(0);
        let key = Style::default().fg(Color::Yellow);

        vec![
            Span::styled(
                format!(" Row: {}/{} ", selected, app.visible_ids().len()),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw(" | "),
            Span::styled("f", key),
            Span::raw(" Filter | "),
            Span::styled("←/→", key),
            Span::raw(" Period | "),
            Span::styled("c", key),
            Span::raw(" Clear | "),
            Span::styled("e", key),
            Span::raw(" Edit | "),
            Span::styled("d", key),
            Span::raw(" Delete | "),
            Span::styled("Tab", key),
            Span::raw(" Page | "),
            Span::styled("q", Style::default().fg(Color::Red)),
            Span::raw(" Quit"),
        ]
    };

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expense_tracker::filter::parse_date;
    use expense_tracker::{MemoryStore, RecurringDraft, TransactionDraft};

    fn create_test_app() -> App<MemoryStore> {
        let mut tracker = Tracker::open(MemoryStore::new()).unwrap();
        for (date, category, amount) in [
            ("2024-03-15", "Food", 12.0),
            ("2024-03-01", "Salary", 1000.0),
            ("2024-02-10", "Books", 30.0),
        ] {
            tracker
                .add_transaction(TransactionDraft {
                    date: date.to_string(),
                    entry_type: if category == "Salary" {
                        EntryType::Income
                    } else {
                        EntryType::Expense
                    },
                    category: category.to_string(),
                    amount,
                })
                .unwrap();
        }
        tracker
            .add_recurring(RecurringDraft {
                name: "Rent".to_string(),
                entry_type: EntryType::Expense,
                amount: 300.0,
            })
            .unwrap();

        App::new(tracker, parse_date("2024-03-15").unwrap())
    }

    #[test]
    fn test_filter_cycle_limits_rows() {
        let mut app = create_test_app();
        assert_eq!(app.visible_ids().len(), 3);

        app.cycle_filter(); // daily, today
        assert_eq!(app.view.filter_mode, FilterMode::Daily);
        assert_eq!(app.visible_ids().len(), 1);

        app.cycle_filter(); // weekly
        app.cycle_filter(); // monthly
        assert_eq!(app.visible_ids().len(), 2);

        app.step_period(false);
        assert_eq!(app.visible_ids().len(), 1);

        app.clear_filter();
        assert_eq!(app.visible_ids().len(), 3);
    }

    #[test]
    fn test_summary_includes_recurring() {
        let app = create_test_app();
        let summary = app.summary();
        assert_eq!(summary.total_income, 1000.0);
        assert_eq!(summary.total_expense, 342.0);
    }

    #[test]
    fn test_delete_needs_confirmation() {
        let mut app = create_test_app();
        app.next(); // second row, newest first: 2024-03-01 Salary
        let target = app.selected_id().unwrap();

        app.request_delete();
        assert!(app.pending_delete.is_some());
        app.cancel_delete();
        assert_eq!(app.tracker.records().transactions().len(), 3);

        app.request_delete();
        app.confirm_delete();
        assert!(app.tracker.records().transaction(target).is_none());
        assert_eq!(app.visible_ids().len(), 2);
        assert!(app.selected_id().is_some());
    }

    #[test]
    fn test_recurring_page_delete() {
        let mut app = create_test_app();
        app.next_page();
        assert_eq!(app.current_page, Page::Recurring);

        app.request_delete();
        app.confirm_delete();
        assert!(app.tracker.records().recurring().is_empty());
        assert_eq!(app.selected_id(), None);
    }

    #[test]
    fn test_navigation_wraps() {
        let mut app = create_test_app();
        app.previous();
        assert_eq!(app.transactions_state.selected(), Some(2));
        app.next();
        assert_eq!(app.transactions_state.selected(), Some(0));
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Café au lait, large", 8), "Café ...");
    }

    fn type_into(app: &mut App<MemoryStore>, text: &str) {
        for c in text.chars() {
            app.edit_input(c);
        }
    }

    #[test]
    fn test_edit_transaction_saves_and_closes() {
        let mut app = create_test_app();
        let id = app.selected_id().unwrap(); // Food, newest

        app.begin_edit();
        assert_eq!(app.view.editing_transaction(), Some(id));
        assert_eq!(app.form().unwrap().fields[3].value, "12");

        // Date -> Type -> Category -> Amount
        app.edit_next_field();
        app.edit_next_field();
        app.edit_next_field();
        app.edit_backspace();
        app.edit_backspace();
        type_into(&mut app, "45.5");
        app.save_edit();

        let tx = app.tracker.records().transaction(id).unwrap();
        assert_eq!(tx.amount, 45.5);
        assert_eq!(tx.category, "Food");
        assert_eq!(app.view.editing_transaction(), None);
        assert!(app.transaction_form.is_none());
        assert!(!app.editing());
    }

    #[test]
    fn test_bad_field_keeps_edit_open() {
        let mut app = create_test_app();
        let id = app.selected_id().unwrap();
        app.begin_edit();

        // Clear the date
        for _ in 0..10 {
            app.edit_backspace();
        }
        type_into(&mut app, "tomorrow");
        app.save_edit();

        assert_eq!(app.view.editing_transaction(), Some(id));
        assert!(app.notification.as_deref().unwrap().starts_with("Not saved"));
        assert_eq!(app.tracker.records().transaction(id).unwrap().date, "2024-03-15");
    }

    #[test]
    fn test_cancel_edit_leaves_record() {
        let mut app = create_test_app();
        let id = app.selected_id().unwrap();
        app.begin_edit();
        type_into(&mut app, "zzz");
        app.cancel_edit();

        assert_eq!(app.view.editing_transaction(), None);
        assert_eq!(app.tracker.records().transaction(id).unwrap().date, "2024-03-15");
    }

    #[test]
    fn test_transaction_and_recurring_edits_are_independent() {
        let mut app = create_test_app();
        app.begin_edit();
        let tx_id = app.view.editing_transaction().unwrap();

        app.next_page();
        assert!(!app.editing());
        app.begin_edit();
        let rec_id = app.view.editing_recurring().unwrap();

        // Rename the recurring item and raise the amount
        for _ in 0..4 {
            app.edit_backspace();
        }
        type_into(&mut app, "Mortgage");
        app.edit_previous_field(); // wraps to Amount
        app.edit_backspace();
        app.edit_backspace();
        app.edit_backspace();
        type_into(&mut app, "350");
        app.save_edit();

        let item = app.tracker.records().recurring_item(rec_id).unwrap();
        assert_eq!(item.name, "Mortgage");
        assert_eq!(item.amount, 350.0);
        assert_eq!(app.view.editing_recurring(), None);

        // The transaction edit is still open on its page
        assert_eq!(app.view.editing_transaction(), Some(tx_id));
        app.previous_page();
        assert!(app.editing());
    }

    #[test]
    fn test_type_field_is_case_insensitive() {
        let mut app = create_test_app();
        let id = app.selected_id().unwrap();
        app.begin_edit();
        app.edit_next_field();
        for _ in 0..7 {
            app.edit_backspace();
        }
        type_into(&mut app, "Income");
        app.save_edit();

        let tx = app.tracker.records().transaction(id).unwrap();
        assert_eq!(tx.entry_type, EntryType::Income);
    }
}
