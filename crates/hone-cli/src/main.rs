use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use hone_config::Config;
use hone_engine::{EditorSession, EditorSettings, MoveDirection};
use log::{error, info};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::{
    env,
    io::{Stdout, stdout},
    path::PathBuf,
    process,
    time::{Duration, Instant},
};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

enum Mode {
    Browse,
    /// Editing the inner markup of a region; the buffer is committed on Enter.
    Edit { region_id: String, buffer: String },
    /// Typing the path to save under.
    SaveAs { buffer: String },
}

struct App {
    session: EditorSession,
    region_state: ListState,
    mode: Mode,
    status: String,
}

impl App {
    fn new(session: EditorSession) -> Self {
        let mut region_state = ListState::default();
        if !session.regions().is_empty() {
            region_state.select(Some(0));
        }
        let status = format!("{} regions", session.regions().len());
        Self {
            session,
            region_state,
            mode: Mode::Browse,
            status,
        }
    }

    fn selected_region_id(&self) -> Option<String> {
        let index = self.region_state.selected()?;
        self.session.regions().get(index).map(|r| r.id.clone())
    }

    fn next_region(&mut self) {
        let len = self.session.regions().len();
        if len == 0 {
            return;
        }
        let i = match self.region_state.selected() {
            Some(i) => (i + 1) % len,
            None => 0,
        };
        self.region_state.select(Some(i));
    }

    fn previous_region(&mut self) {
        let len = self.session.regions().len();
        if len == 0 {
            return;
        }
        let i = match self.region_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.region_state.select(Some(i));
    }

    fn start_edit(&mut self) {
        let Some(region_id) = self.selected_region_id() else {
            return;
        };
        match self.session.region_content(&region_id) {
            Some(buffer) => self.mode = Mode::Edit { region_id, buffer },
            None => self.status = format!("{region_id} is no longer on the page"),
        }
    }

    fn commit_edit(&mut self, region_id: &str, buffer: &str) {
        if self
            .session
            .replace_region_content(region_id, buffer, Instant::now())
        {
            self.status = format!("edited {region_id}");
        }
    }

    fn undo(&mut self) {
        self.status = if self.session.undo() {
            "undone".to_string()
        } else {
            "nothing to undo".to_string()
        };
    }

    fn redo(&mut self) {
        self.status = if self.session.redo() {
            "redone".to_string()
        } else {
            "nothing to redo".to_string()
        };
    }

    fn move_selected(&mut self, direction: MoveDirection) {
        let Some(region_id) = self.selected_region_id() else {
            return;
        };
        self.status = if self.session.move_region(&region_id, direction) {
            format!("moved {region_id}")
        } else {
            format!("{region_id} cannot move further")
        };
    }

    fn save(&mut self) {
        match self.session.save() {
            Ok(()) => {
                self.status = format!("saved {}", self.session.title());
                info!("saved {}", self.session.title());
            }
            Err(e) => {
                self.status = format!("save failed: {e}");
                error!("save failed: {e}");
            }
        }
    }

    fn start_save_as(&mut self) {
        let buffer = self
            .session
            .path()
            .map(|path| path.display().to_string())
            .unwrap_or_default();
        self.mode = Mode::SaveAs { buffer };
    }

    fn save_as(&mut self, path: &str) {
        if path.trim().is_empty() {
            self.status = "save as needs a path".to_string();
            return;
        }
        match self.session.save_as(PathBuf::from(path)) {
            Ok(()) => {
                self.status = format!("saved as {path}");
                info!("saved as {path}");
            }
            Err(e) => {
                self.status = format!("save as failed: {e}");
                error!("save as {path} failed: {e}");
            }
        }
    }

    /// Returns false when the app should quit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if let Mode::SaveAs { buffer } = &mut self.mode {
            match key.code {
                KeyCode::Esc => self.mode = Mode::Browse,
                KeyCode::Enter => {
                    let path = buffer.clone();
                    self.mode = Mode::Browse;
                    self.save_as(&path);
                }
                KeyCode::Backspace => {
                    buffer.pop();
                }
                KeyCode::Char(c) => buffer.push(c),
                _ => {}
            }
            return true;
        }

        if let Mode::Edit { region_id, buffer } = &mut self.mode {
            match key.code {
                KeyCode::Esc => self.mode = Mode::Browse,
                KeyCode::Enter => {
                    let (region_id, buffer) = (region_id.clone(), buffer.clone());
                    self.mode = Mode::Browse;
                    self.commit_edit(&region_id, &buffer);
                }
                KeyCode::Backspace => {
                    buffer.pop();
                }
                KeyCode::Char(c) => buffer.push(c),
                _ => {}
            }
            return true;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Char('z') if ctrl => self.undo(),
            KeyCode::Char('y') if ctrl => self.redo(),
            // Many terminals cannot report ^⇧S, so `a` opens the prompt too.
            KeyCode::Char('S') if ctrl => self.start_save_as(),
            KeyCode::Char('s') if ctrl && shift => self.start_save_as(),
            KeyCode::Char('a') if !ctrl => self.start_save_as(),
            KeyCode::Char('s') if ctrl => self.save(),
            KeyCode::Up if alt => self.move_selected(MoveDirection::Up),
            KeyCode::Down if alt => self.move_selected(MoveDirection::Down),
            KeyCode::Down | KeyCode::Char('j') => self.next_region(),
            KeyCode::Up | KeyCode::Char('k') => self.previous_region(),
            KeyCode::Enter => self.start_edit(),
            _ => {}
        }
        true
    }
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {program} [--regions] <file>");
    process::exit(1);
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("hone-cli");
    let (list_only, file) = match args.get(1..).unwrap_or_default() {
        [flag, file] if flag == "--regions" => (true, file),
        [file] if !file.starts_with("--") => (false, file),
        _ => usage(program),
    };

    let config = match Config::load_or_default() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            eprintln!("Config file: {}", Config::config_path().display());
            process::exit(1);
        }
    };
    let settings = EditorSettings {
        history_capacity: config.history_capacity,
        debounce: config.debounce(),
    };

    let path = config.resolve_document(&PathBuf::from(file));
    let session = match EditorSession::open(&path, &settings) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: Cannot open '{}': {e}", path.display());
            process::exit(1);
        }
    };

    if list_only {
        for region in session.regions() {
            println!(
                "{}\t<{}>\t{}..{}\t{}",
                region.id,
                region.tag_name,
                region.start_offset,
                region.end_offset,
                region.original_content
            );
        }
        return Ok(());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session);
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }
    if app.session.is_dirty() {
        eprintln!("Unsaved changes in {} were discarded", app.session.title());
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(POLL_INTERVAL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && !app.handle_key(key)
        {
            return Ok(());
        }

        // Lets a quiet typing burst become one undo step.
        app.session.tick(Instant::now());
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(f.area());
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[0]);

    // Region list panel
    let region_items: Vec<ListItem> = app
        .session
        .regions()
        .iter()
        .map(|region| {
            let text = app
                .session
                .region_content(&region.id)
                .unwrap_or_else(|| "(removed)".to_string());
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<10} ", region.id),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("<{}> ", region.tag_name),
                    Style::default().fg(Color::Cyan),
                ),
                Span::raw(text),
            ]))
        })
        .collect();

    let dirty = if app.session.is_dirty() { " *" } else { "" };
    let regions = List::new(region_items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{}{}", app.session.title(), dirty)),
        )
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));

    f.render_stateful_widget(regions, chunks[0], &mut app.region_state);

    // Region detail panel
    let (title, body) = match &app.mode {
        Mode::Edit { region_id, buffer } => (format!("Editing {region_id}"), buffer.clone()),
        Mode::SaveAs { buffer } => (
            "Save as (Enter to write, Esc to cancel)".to_string(),
            buffer.clone(),
        ),
        Mode::Browse => {
            let body = app
                .selected_region_id()
                .and_then(|id| app.session.region_content(&id))
                .unwrap_or_default();
            ("Content".to_string(), body)
        }
    };
    let detail_style = match app.mode {
        Mode::Edit { .. } | Mode::SaveAs { .. } => Style::default().add_modifier(Modifier::BOLD),
        Mode::Browse => Style::default(),
    };
    let detail = Paragraph::new(body)
        .style(detail_style)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });

    f.render_widget(detail, chunks[1]);

    // Instructions
    let history = app.session.history().state();
    let help_text = Line::from(vec![
        Span::raw(format!("{} | ", app.status)),
        Span::raw("q: Quit | Enter: Edit | "),
        Span::raw(if history.can_undo { "^Z: Undo | " } else { "" }),
        Span::raw(if history.can_redo { "^Y: Redo | " } else { "" }),
        Span::raw("Alt-↑/↓: Move | ^S: Save | ^⇧S/a: Save as"),
    ]);

    let help = Paragraph::new(vec![help_text]).block(Block::default().borders(Borders::TOP));
    f.render_widget(help, rows[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn press(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> bool {
        app.handle_key(KeyEvent::new(code, modifiers))
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c), KeyModifiers::NONE);
        }
    }

    #[test]
    fn save_as_prompts_for_a_path_and_writes_there() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("copy.html");
        let mut app = App::new(EditorSession::from_html("<p>x</p>"));

        press(
            &mut app,
            KeyCode::Char('S'),
            KeyModifiers::CONTROL | KeyModifiers::SHIFT,
        );
        assert!(matches!(&app.mode, Mode::SaveAs { buffer } if buffer.is_empty()));
        type_str(&mut app, &target.display().to_string());
        assert!(press(&mut app, KeyCode::Enter, KeyModifiers::NONE));

        assert!(matches!(app.mode, Mode::Browse));
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "<p>x</p>");
        assert_eq!(app.session.path(), Some(target.as_path()));
    }

    #[test]
    fn save_as_prompt_starts_from_the_current_path_and_can_be_cancelled() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<p>x</p>").unwrap();
        let session = EditorSession::open(&path, &EditorSettings::default()).unwrap();
        let mut app = App::new(session);

        press(&mut app, KeyCode::Char('a'), KeyModifiers::NONE);
        let expected = path.display().to_string();
        assert!(matches!(&app.mode, Mode::SaveAs { buffer } if *buffer == expected));
        // `q` is text inside the prompt, not quit
        assert!(press(&mut app, KeyCode::Char('q'), KeyModifiers::NONE));
        press(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert!(matches!(app.mode, Mode::Browse));
        assert_eq!(app.session.path(), Some(path.as_path()));
    }
}
