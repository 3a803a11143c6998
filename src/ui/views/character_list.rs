use crate::api::{CachedApiClient, Character, CharactersKey, CharactersQuery, Page};
use crate::nav::NavState;
use crate::ui::components::{KeyResult, SearchEvent, SearchInput};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{status_color, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap};

/// Paginated, searchable table of characters
pub struct CharacterListView {
  query: CharactersQuery,
  nav: NavState,
  table_state: TableState,
  search: SearchInput,
}

impl CharacterListView {
  /// Create the view. Nothing is fetched until the first `sync()`.
  pub fn new(api: &CachedApiClient) -> Self {
    Self {
      query: api.characters_query(),
      nav: NavState::default(),
      table_state: TableState::default(),
      search: SearchInput::new(),
    }
  }

  fn page(&self) -> Option<&Page> {
    self.query.data()
  }

  fn selected_character(&self) -> Option<&Character> {
    let idx = self.table_state.selected()?;
    self.page()?.results.get(idx)
  }

  fn has_prev(&self) -> bool {
    self.page().is_some_and(|p| p.info.has_prev())
  }

  fn has_next(&self) -> bool {
    self.page().is_some_and(|p| p.info.has_next())
  }

  fn title(&self) -> String {
    match &self.nav.name {
      Some(name) => format!(" Characters matching \"{}\" ", name),
      None => " Characters ".to_string(),
    }
  }

  /// "Showing n of count characters" plus page position and paging hints
  fn summary_line(&self, page: &Page) -> Line<'static> {
    let enabled = Style::default().fg(Color::Cyan);
    let disabled = Style::default().fg(Color::DarkGray);

    Line::from(vec![
      Span::styled(
        if self.has_prev() { " ◀ h " } else { " ◀   " },
        if self.has_prev() { enabled } else { disabled },
      ),
      Span::raw(format!(
        " Showing {} of {} characters │ Page {} of {} ",
        page.results.len(),
        page.info.count,
        self.nav.page,
        page.info.pages
      )),
      Span::styled(
        if self.has_next() { " l ▶ " } else { "   ▶ " },
        if self.has_next() { enabled } else { disabled },
      ),
    ])
  }

  fn render_message(&self, frame: &mut Frame, area: Rect, block: Block, message: String, color: Color) {
    let paragraph = Paragraph::new(message)
      .block(block)
      .wrap(Wrap { trim: true })
      .style(Style::default().fg(color));
    frame.render_widget(paragraph, area);
  }

  fn render_table(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(self.title())
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if self.query.is_loading() {
      self.render_message(frame, area, block, "Loading characters...".to_string(), Color::DarkGray);
      return;
    }

    if let Some(error) = self.query.error() {
      let message = format!(
        "Error loading characters\n\n{}\n\nPress 'r' to try again.",
        error
      );
      self.render_message(frame, area, block.border_style(Style::default().fg(Color::Red)), message, Color::Red);
      return;
    }

    let Some(page) = self.query.data() else {
      return;
    };

    ensure_valid_selection(&mut self.table_state, page.results.len());

    // Rows from the previous key are dimmed until the new page arrives
    let row_style = if self.query.is_placeholder() {
      Style::default().fg(Color::DarkGray)
    } else {
      Style::default()
    };

    let header = Row::new(["Name", "Status", "Species", "Last known location"])
      .style(Style::default().fg(Color::Yellow).bold());

    let rows: Vec<Row> = page
      .results
      .iter()
      .map(|character| {
        Row::new(vec![
          Cell::from(truncate(&character.name, 32)),
          Cell::from(character.status.to_string())
            .style(Style::default().fg(status_color(&character.status))),
          Cell::from(truncate(&character.species, 16)),
          Cell::from(truncate(&character.location.name, 40)),
        ])
        .style(row_style)
      })
      .collect();

    let widths = [
      Constraint::Percentage(35),
      Constraint::Length(8),
      Constraint::Length(16),
      Constraint::Min(10),
    ];

    let table = Table::new(rows, widths)
      .header(header)
      .block(block.title_bottom(self.summary_line(page).centered()))
      .row_highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(table, area, &mut self.table_state);
  }
}

impl View for CharacterListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    // Let search component try to handle first
    let current = self.nav.name.clone().unwrap_or_default();
    match self.search.handle_key(key, &current) {
      KeyResult::Event(SearchEvent::Submitted(term)) => {
        return ViewAction::Navigate(self.nav.submit_search(&term));
      }
      KeyResult::Event(SearchEvent::Cancelled) | KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    // Normal mode key handling
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.table_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.table_state.select_previous(),
      KeyCode::Char('g') | KeyCode::Home => self.table_state.select_first(),
      KeyCode::Char('G') | KeyCode::End => self.table_state.select_last(),
      KeyCode::Char('h') | KeyCode::Left if self.has_prev() => {
        return ViewAction::Navigate(self.nav.change_page(self.nav.page.saturating_sub(1)));
      }
      KeyCode::Char('l') | KeyCode::Right if self.has_next() => {
        // The last representable page has no successor
        if let Some(next) = self.nav.page.checked_add(1) {
          return ViewAction::Navigate(self.nav.change_page(next));
        }
      }
      KeyCode::Char('r') => self.query.refetch(),
      KeyCode::Enter => {
        if let Some(character) = self.selected_character() {
          return ViewAction::Navigate(self.nav.select(character.id.to_string()));
        }
      }
      // Esc clears an active filter before it quits anything
      KeyCode::Esc if self.nav.name.is_some() => {
        return ViewAction::Navigate(self.nav.submit_search(""));
      }
      KeyCode::Char('q') => return ViewAction::Quit,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_table(frame, area);
    // Let search component render its overlay
    self.search.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    match &self.nav.name {
      Some(name) => format!("Characters [{}] p{}", name, self.nav.page),
      None => format!("Characters p{}", self.nav.page),
    }
  }

  fn sync(&mut self, state: &NavState) -> bool {
    if state.is_detail() {
      return false;
    }

    if state.page != self.nav.page || state.name != self.nav.name {
      self.table_state = TableState::default();
    }
    self.nav = state.clone();
    self
      .query
      .set_key(CharactersKey::new(state.page, state.name.as_deref()));
    true
  }

  fn tick(&mut self) -> bool {
    self.query.poll()
  }

  fn refresh(&mut self) {
    self.query.refetch();
  }

  fn is_fetching(&self) -> bool {
    self.query.is_fetching()
  }

  fn captures_input(&self) -> bool {
    self.search.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("/", "search").with_priority(20),
      ShortcutInfo::new("h/l", "page").with_priority(25),
      ShortcutInfo::new("enter", "details").with_priority(30),
      ShortcutInfo::new("r", "refresh").with_priority(40),
      ShortcutInfo::new("q", "quit").with_priority(50),
    ]
  }
}
