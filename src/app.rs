use crate::api::CachedApiClient;
use crate::commands::{self, CommandAction};
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::nav::{History, NavState};
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{CharacterDetailView, CharacterListView};
use color_eyre::{eyre::eyre, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tracing::{debug, info};

/// Main application state
pub struct App {
  /// Navigation stack - the character list is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// Visited locations; the current one is on top
  history: History,

  /// Command palette (after pressing :)
  command: CommandInput,

  api: CachedApiClient,

  title: String,

  /// One-shot message for the footer, cleared on the next key
  status_message: Option<String>,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: Config, start: NavState) -> Result<Self> {
    let api = CachedApiClient::new(&config)
      .map_err(|e| eyre!("Invalid API base URL {}: {}", config.api.base_url, e))?;
    info!(base_url = %api.base_url(), location = %start, "starting");

    let mut app = Self {
      view_stack: vec![Box::new(CharacterListView::new(&api))],
      history: History::new(start.clone()),
      command: CommandInput::new(),
      api,
      title: config.title().to_string(),
      status_message: None,
      should_quit: false,
    };
    app.route(&start);

    Ok(app)
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;

    let result = self.event_loop().await;

    // Cleanup terminal, even if the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(&mut self) -> Result<()> {
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    let mut events = EventHandler::new(Duration::from_millis(250));

    while !self.should_quit() {
      // Draw UI
      terminal.draw(|frame| ui::draw(frame, self))?;

      // Handle events
      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }

    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Resize => {}
      // Views under the top one still have requests to drain
      Event::Tick => {
        for view in self.view_stack.iter_mut() {
          view.tick();
        }
      }
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    self.status_message = None;

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // The palette only opens when the view is not taking text input
    let view_captures = self
      .view_stack
      .last()
      .is_some_and(|view| view.captures_input());
    if !view_captures {
      match self.command.handle_key(key) {
        KeyResult::Event(CommandEvent::Submitted(line)) => {
          self.execute_command(&line);
          return;
        }
        KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
        KeyResult::NotHandled => {}
      }
    }

    let action = match self.view_stack.last_mut() {
      Some(view) => view.handle_key(key),
      None => ViewAction::None,
    };
    self.apply(action);
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Navigate(state) => self.navigate(state),
      ViewAction::Back => self.go_back(),
      ViewAction::Quit => self.should_quit = true,
    }
  }

  fn execute_command(&mut self, line: &str) {
    if line.trim().is_empty() {
      return;
    }

    debug!(command = line, "executing command");
    match commands::parse(line) {
      Ok(CommandAction::Navigate(state)) => self.navigate(state),
      Ok(CommandAction::Page(page)) => {
        let state = self.history.current().change_page(page);
        self.navigate(state);
      }
      Ok(CommandAction::Search(term)) => {
        let state = self.history.current().submit_search(&term);
        self.navigate(state);
      }
      Ok(CommandAction::Back) => self.go_back(),
      Ok(CommandAction::Refresh) => {
        if let Some(view) = self.view_stack.last_mut() {
          view.refresh();
        }
      }
      Ok(CommandAction::Quit) => self.should_quit = true,
      Err(e) => self.status_message = Some(e.to_string()),
    }
  }

  /// Go to `state`, recording it in history
  pub fn navigate(&mut self, state: NavState) {
    if self.history.push(state.clone()) {
      info!(location = %state, "navigate");
    }
    self.route(&state);
  }

  /// Return to the previous location, or to the list root when there is
  /// no history left.
  pub fn go_back(&mut self) {
    let state = match self.history.back() {
      Some(previous) => previous.clone(),
      None => {
        let root = NavState::default();
        self.history.replace(root.clone());
        root
      }
    };
    info!(location = %state, "back");
    self.route(&state);
  }

  /// Make the view stack show `state`.
  ///
  /// The top view gets the first chance; views that cannot show it are
  /// popped, down to the list root. A detail state no view accepts gets a
  /// new detail view.
  fn route(&mut self, state: &NavState) {
    while let Some(view) = self.view_stack.last_mut() {
      if view.sync(state) {
        return;
      }
      if self.view_stack.len() == 1 {
        break;
      }
      self.view_stack.pop();
    }

    if state.is_detail() {
      self
        .view_stack
        .push(Box::new(CharacterDetailView::new(&self.api, state)));
    }
  }

  // Accessors for UI rendering
  pub fn current_view(&self) -> Option<&dyn View> {
    self.view_stack.last().map(|view| &**view)
  }

  /// Render the top view into `area`
  pub fn render_view(&mut self, frame: &mut Frame, area: Rect) {
    if let Some(view) = self.view_stack.last_mut() {
      view.render(frame, area);
    }
  }

  pub fn location(&self) -> &NavState {
    self.history.current()
  }

  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn is_fetching(&self) -> bool {
    self.view_stack.iter().any(|view| view.is_fetching())
  }

  pub fn command_input(&self) -> &CommandInput {
    &self.command
  }

  pub fn status_message(&self) -> Option<&str> {
    self.status_message.as_deref()
  }

  pub fn breadcrumb(&self) -> Vec<String> {
    self
      .view_stack
      .iter()
      .map(|v| v.breadcrumb_label())
      .collect()
  }

  pub fn should_quit(&self) -> bool {
    self.should_quit
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::types::fixtures::{character_json, episode_json, page_json};
  use crate::config::ApiConfig;
  use serde_json::json;
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
      app.handle_key(key(KeyCode::Char(c)));
    }
  }

  async fn app_at(server: &MockServer, start: &str) -> App {
    let config = Config {
      api: ApiConfig {
        base_url: format!("{}/api", server.uri()),
        timeout_secs: 5,
      },
      ..Config::default()
    };
    App::new(config, NavState::parse(start).unwrap()).unwrap()
  }

  #[tokio::test]
  async fn test_starts_at_given_location() {
    let server = MockServer::start().await;
    let app = app_at(&server, "/character/3").await;

    assert_eq!(app.location().to_string(), "/character/3");
    assert_eq!(app.breadcrumb().len(), 2);
  }

  #[tokio::test]
  async fn test_back_restores_previous_list() {
    let server = MockServer::start().await;
    let mut app = app_at(&server, "/?page=3&name=Rick").await;

    app.navigate(NavState::character("7"));
    assert_eq!(app.breadcrumb().len(), 2);

    app.go_back();
    assert_eq!(app.location().to_string(), "/?page=3&name=Rick");
    assert_eq!(app.breadcrumb(), vec!["Characters [Rick] p3".to_string()]);
  }

  #[tokio::test]
  async fn test_back_without_history_goes_to_root() {
    let server = MockServer::start().await;
    let mut app = app_at(&server, "/character/7").await;

    app.go_back();
    assert_eq!(app.location().to_string(), "/?page=1");
    assert_eq!(app.breadcrumb().len(), 1);
  }

  #[tokio::test]
  async fn test_detail_to_detail_reuses_view() {
    let server = MockServer::start().await;
    let mut app = app_at(&server, "/").await;

    app.navigate(NavState::character("1"));
    app.navigate(NavState::character("2"));
    assert_eq!(app.breadcrumb().len(), 2);

    app.go_back();
    assert_eq!(app.location().to_string(), "/character/1");
  }

  #[tokio::test]
  async fn test_command_palette_navigates() {
    let server = MockServer::start().await;
    let mut app = app_at(&server, "/?page=2&name=Morty").await;

    app.handle_key(key(KeyCode::Char(':')));
    type_text(&mut app, "page 5");
    app.handle_key(key(KeyCode::Enter));
    assert_eq!(app.location().to_string(), "/?page=5&name=Morty");

    app.handle_key(key(KeyCode::Char(':')));
    type_text(&mut app, "search Rick");
    app.handle_key(key(KeyCode::Enter));
    assert_eq!(app.location().to_string(), "/?page=1&name=Rick");

    app.handle_key(key(KeyCode::Char(':')));
    type_text(&mut app, "open /character/8");
    app.handle_key(key(KeyCode::Enter));
    assert_eq!(app.location().to_string(), "/character/8");
  }

  #[tokio::test]
  async fn test_bad_command_sets_status() {
    let server = MockServer::start().await;
    let mut app = app_at(&server, "/").await;

    app.handle_key(key(KeyCode::Char(':')));
    type_text(&mut app, "zzz");
    app.handle_key(key(KeyCode::Enter));

    assert_eq!(app.status_message(), Some("Unknown command: zzz"));
    assert!(!app.should_quit());

    // Cleared by the next key
    app.handle_key(key(KeyCode::Char('j')));
    assert_eq!(app.status_message(), None);
  }

  #[tokio::test]
  async fn test_search_prompt_keeps_colon() {
    let server = MockServer::start().await;
    let mut app = app_at(&server, "/").await;

    app.handle_key(key(KeyCode::Char('/')));
    type_text(&mut app, "a:b");
    app.handle_key(key(KeyCode::Enter));

    assert_eq!(app.location().to_string(), "/?page=1&name=a%3Ab");
  }

  #[tokio::test]
  async fn test_list_request_settles_while_detail_is_open() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/character"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(page_json(&["Rick Sanchez"], 1, 1, false))
          .set_delay(Duration::from_millis(50)),
      )
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/api/character/1"))
      .respond_with(ResponseTemplate::new(200).set_body_json(character_json(1, "Rick Sanchez")))
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/api/episode/1,2"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([
        episode_json(1, "S01E01"),
        episode_json(2, "S01E02")
      ])))
      .mount(&server)
      .await;

    let mut app = app_at(&server, "/").await;
    // Leave the list before its page arrives
    app.navigate(NavState::character("1"));
    assert!(app.is_fetching());

    for _ in 0..200 {
      tokio::time::sleep(Duration::from_millis(5)).await;
      app.handle_event(Event::Tick);
      if !app.is_fetching() {
        break;
      }
    }
    assert!(!app.is_fetching());
    assert_eq!(app.breadcrumb(), vec!["Characters p1".to_string(), "Rick Sanchez".to_string()]);
  }

  #[tokio::test]
  async fn test_quit() {
    let server = MockServer::start().await;
    let mut app = app_at(&server, "/").await;

    app.handle_key(key(KeyCode::Char('q')));
    assert!(app.should_quit());
  }
}
