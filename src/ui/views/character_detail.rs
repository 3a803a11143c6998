use crate::api::{
  ApiError, CachedApiClient, Character, CharacterKey, CharacterQuery, EpisodesKey, EpisodesQuery,
};
use crate::nav::NavState;
use crate::ui::renderfns::{format_created, status_color};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

/// View for one character and the episodes they appear in
pub struct CharacterDetailView {
  id: String,
  character: CharacterQuery,
  episodes: EpisodesQuery,
  episode_state: ListState,
}

impl CharacterDetailView {
  pub fn new(api: &CachedApiClient, state: &NavState) -> Self {
    let mut view = Self {
      id: String::new(),
      character: api.character_query(),
      episodes: api.episodes_query(),
      episode_state: ListState::default(),
    };
    view.sync(state);
    view
  }

  /// Point the episodes query at the loaded character's episode list
  fn sync_episodes(&mut self) {
    let Some(urls) = self.character.data().map(|c| c.episodes.clone()) else {
      return;
    };
    self.episodes.set_key(EpisodesKey { urls });
    self.episodes.set_enabled(true);
  }

  fn render_detail(&mut self, frame: &mut Frame, area: Rect) {
    if self.character.is_loading() {
      let block = Block::default()
        .title(format!(" Character {} ", self.id))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));
      let paragraph = Paragraph::new("Loading character...")
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    if let Some(error) = self.character.error() {
      let title = match error {
        ApiError::InvalidId(_) => " Character Not Found ",
        _ if error.status() == Some(404) => " Character Not Found ",
        _ => " Error Loading Character ",
      };
      let block = Block::default()
        .title(title)
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));
      let paragraph = Paragraph::new(format!(
        "{}\n\nPress 'r' to try again or 'q' to go back.",
        error
      ))
      .block(block)
      .wrap(Wrap { trim: true })
      .style(Style::default().fg(Color::Red));
      frame.render_widget(paragraph, area);
      return;
    }

    let Some(character) = self.character.data() else {
      return;
    };

    let info = info_lines(character);
    let episode_count = character.episodes.len();

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(info.len() as u16 + 2), // Fields + borders
        Constraint::Min(3),                        // Episodes
      ])
      .split(area);

    let mut block = Block::default()
      .title(format!(" {} ", character.name))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    if let Some(fetched) = self.character.updated_at() {
      let fetched = fetched.with_timezone(&Local).format("%H:%M:%S");
      block = block.title_bottom(
        Line::styled(format!(" fetched {} ", fetched), Style::default().fg(Color::DarkGray)).right_aligned(),
      );
    }
    frame.render_widget(Paragraph::new(info).block(block), chunks[0]);

    self.render_episodes(frame, chunks[1], episode_count);
  }

  fn render_episodes(&mut self, frame: &mut Frame, area: Rect, count: usize) {
    let block = Block::default()
      .title(format!(" Episodes ({}) ", count))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if let Some(error) = self.episodes.error() {
      let paragraph = Paragraph::new(format!("Failed to load episodes: {}", error))
        .block(block)
        .style(Style::default().fg(Color::Red));
      frame.render_widget(paragraph, area);
      return;
    }

    let Some(episodes) = self.episodes.data() else {
      let paragraph = Paragraph::new("Loading episodes...")
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    };

    let items: Vec<ListItem> = episodes
      .iter()
      .map(|episode| {
        ListItem::new(Line::from(vec![
          Span::styled(
            format!("{:<8}", episode.code),
            Style::default().fg(Color::Cyan),
          ),
          Span::raw(format!("{:<40}", episode.name)),
          Span::styled(episode.air_date.clone(), Style::default().fg(Color::DarkGray)),
        ]))
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(Style::default().bg(Color::DarkGray));

    frame.render_stateful_widget(list, area, &mut self.episode_state);
  }
}

fn field(label: &'static str, value: impl Into<String>) -> Line<'static> {
  Line::from(vec![
    Span::styled(format!("{:<21}", label), Style::default().fg(Color::DarkGray)),
    Span::raw(value.into()),
  ])
}

fn info_lines(character: &Character) -> Vec<Line<'static>> {
  let mut lines = vec![
    Line::from(Span::styled(
      character.status.to_string(),
      Style::default().fg(status_color(&character.status)).bold(),
    )),
    field("Species:", character.species.clone()),
  ];
  if !character.kind.is_empty() {
    lines.push(field("Type:", character.kind.clone()));
  }
  lines.extend([
    field("Gender:", character.gender.to_string()),
    field("Origin:", character.origin.name.clone()),
    field("Last Known Location:", character.location.name.clone()),
    field("Created:", format_created(&character.created)),
    field("Image:", character.image.clone()),
  ]);
  lines
}

impl View for CharacterDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.episode_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.episode_state.select_previous(),
      KeyCode::Char('r') => self.refresh(),
      KeyCode::Char('q') | KeyCode::Char('h') | KeyCode::Esc | KeyCode::Backspace | KeyCode::Left => {
        return ViewAction::Back;
      }
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_detail(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    match self.character.data() {
      Some(character) => character.name.clone(),
      None => format!("Character {}", self.id),
    }
  }

  fn sync(&mut self, state: &NavState) -> bool {
    let Some(id) = &state.selected_id else {
      return false;
    };

    if *id != self.id {
      self.id = id.clone();
      self.episode_state = ListState::default();
    }
    self.character.set_enabled(!id.is_empty());
    self.character.set_key(CharacterKey { id: id.clone() });
    self.sync_episodes();
    true
  }

  fn tick(&mut self) -> bool {
    let character_changed = self.character.poll();
    if character_changed {
      self.sync_episodes();
    }
    let episodes_changed = self.episodes.poll();
    character_changed || episodes_changed
  }

  fn refresh(&mut self) {
    self.character.refetch();
    if self.episodes.key().is_some() {
      self.episodes.refetch();
    }
  }

  fn is_fetching(&self) -> bool {
    self.character.is_fetching() || self.episodes.is_fetching()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("j/k", "episodes").with_priority(20),
      ShortcutInfo::new("r", "refresh").with_priority(40),
      ShortcutInfo::new("q", "back").with_priority(50),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::cached_client::testing::cached_client_for;
  use crate::api::types::fixtures::{character_json, episode_json};
  use crate::ui::views::testing::settle_view;
  use crossterm::event::KeyModifiers;
  use ratatui::backend::TestBackend;
  use ratatui::Terminal;
  use serde_json::json;
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn screen(view: &mut CharacterDetailView) -> String {
    let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
    terminal.draw(|frame| view.render(frame, frame.area())).unwrap();
    terminal
      .backend()
      .buffer()
      .content()
      .iter()
      .map(|cell| cell.symbol())
      .collect()
  }

  async fn mount_rick(server: &MockServer) {
    Mock::given(method("GET"))
      .and(path("/api/character/1"))
      .respond_with(ResponseTemplate::new(200).set_body_json(character_json(1, "Rick Sanchez")))
      .expect(1)
      .mount(server)
      .await;
    Mock::given(method("GET"))
      .and(path("/api/episode/1,2"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([
        episode_json(1, "S01E01"),
        episode_json(2, "S01E02")
      ])))
      .expect(1)
      .mount(server)
      .await;
  }

  #[tokio::test]
  async fn test_loads_character_then_episodes() {
    let server = MockServer::start().await;
    mount_rick(&server).await;

    let api = cached_client_for(&server);
    let mut view = CharacterDetailView::new(&api, &NavState::character("1"));
    settle_view(&mut view).await;

    let screen = screen(&mut view);
    assert!(screen.contains("Rick Sanchez"));
    assert!(screen.contains("Earth (C-137)"));
    assert!(screen.contains("Citadel of Ricks"));
    assert!(screen.contains("November 4, 2017"));
    assert!(screen.contains("Episodes (2)"));
    assert!(screen.contains("S01E02"));
    assert_eq!(view.breadcrumb_label(), "Rick Sanchez");
  }

  #[tokio::test]
  async fn test_revisit_uses_cache() {
    let server = MockServer::start().await;
    mount_rick(&server).await;

    let api = cached_client_for(&server);
    let mut first = CharacterDetailView::new(&api, &NavState::character("1"));
    settle_view(&mut first).await;

    // A second visit is served from the cache; the mocks expect one call each
    let mut second = CharacterDetailView::new(&api, &NavState::character("1"));
    assert!(!second.is_fetching());
    assert!(screen(&mut second).contains("S01E01"));
  }

  #[tokio::test]
  async fn test_missing_character_shows_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/character/9999"))
      .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "Character not found" })))
      .mount(&server)
      .await;

    let api = cached_client_for(&server);
    let mut view = CharacterDetailView::new(&api, &NavState::character("9999"));
    settle_view(&mut view).await;

    let screen = screen(&mut view);
    assert!(screen.contains("Character Not Found"));
    assert!(screen.contains("HTTP error! status: 404 (Character not found)"));
  }

  #[tokio::test]
  async fn test_server_error_is_not_reported_as_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/character/1"))
      .respond_with(ResponseTemplate::new(500))
      .mount(&server)
      .await;

    let api = cached_client_for(&server);
    let mut view = CharacterDetailView::new(&api, &NavState::character("1"));
    settle_view(&mut view).await;

    let screen = screen(&mut view);
    assert!(screen.contains("Error Loading Character"));
    assert!(!screen.contains("Character Not Found"));
  }

  #[tokio::test]
  async fn test_back_keys() {
    let server = MockServer::start().await;
    let api = cached_client_for(&server);
    let mut view = CharacterDetailView::new(&api, &NavState::character("abc"));

    assert_eq!(view.handle_key(key(KeyCode::Char('q'))), ViewAction::Back);
    assert_eq!(view.handle_key(key(KeyCode::Esc)), ViewAction::Back);
    assert_eq!(view.handle_key(key(KeyCode::Char('x'))), ViewAction::None);
  }

  #[tokio::test]
  async fn test_sync_rejects_list_state() {
    let server = MockServer::start().await;
    let api = cached_client_for(&server);
    let mut view = CharacterDetailView::new(&api, &NavState::character("abc"));
    assert!(!view.sync(&NavState::default()));
    assert!(view.sync(&NavState::character("def")));
    assert_eq!(view.breadcrumb_label(), "Character def");
  }
}
