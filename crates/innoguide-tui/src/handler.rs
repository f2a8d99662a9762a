use std::path::PathBuf;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use innoguide_core::analysis::AnalysisResult;
use innoguide_core::ViewState;
use tracing::warn;

use crate::app::{App, Focus, NoticeKind};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Shared line-editing keys. Returns false if the key was not an edit.
fn edit_text(text: &mut String, cursor: &mut usize, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Backspace => {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = text.chars().count();
            if *cursor < char_count {
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            *cursor = cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = text.chars().count();
            *cursor = (*cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            *cursor = 0;
        }
        KeyCode::End => {
            *cursor = text.chars().count();
        }
        // Chorded keys are bindings, not text
        KeyCode::Char(_)
            if key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            return false;
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(text, *cursor);
            text.insert(byte_pos, c);
            *cursor += 1;
        }
        _ => return false,
    }
    true
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key).await?,
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
        AppEvent::AnalysisFinished { generation, outcome } => {
            app.finish_analysis(generation, outcome);
        }
    }
    Ok(())
}

async fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return Ok(());
    }

    // Notices block until dismissed
    if app.notice.is_some() {
        app.notice = None;
        return Ok(());
    }

    if app.show_api_key_input {
        handle_api_key_input(app, key);
        return Ok(());
    }

    match app.session.state() {
        ViewState::Idle => handle_idle(app, key).await?,
        ViewState::Loading => handle_loading(app, key),
        ViewState::Error => handle_error(app, key),
        ViewState::Success => handle_success(app, key),
    }
    Ok(())
}

async fn handle_idle(app: &mut App, key: KeyEvent) -> Result<()> {
    match app.focus {
        Focus::Problem => handle_problem_editing(app, key),
        Focus::ImagePath => handle_image_path_editing(app, key).await,
        Focus::Techniques => handle_technique_list(app, key),
    }
    Ok(())
}

fn handle_problem_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Tab => {
            app.focus = Focus::Techniques;
        }
        KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => {
            let cursor = app.problem_cursor;
            let text = app.input.problem_text_mut();
            let byte_pos = char_to_byte_index(text, cursor);
            text.insert(byte_pos, '\n');
            app.problem_cursor += 1;
        }
        KeyCode::Enter => {
            app.focus = Focus::Techniques;
        }
        _ => {
            let mut cursor = app.problem_cursor;
            edit_text(app.input.problem_text_mut(), &mut cursor, key);
            app.problem_cursor = cursor;
        }
    }
}

async fn handle_image_path_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.focus = Focus::Techniques;
        }
        KeyCode::Tab => {
            app.focus = Focus::Techniques;
        }
        KeyCode::Enter => {
            let raw = app.image_path_input.trim().to_string();
            if raw.is_empty() {
                app.focus = Focus::Techniques;
                return;
            }
            app.attach_image(&expand_home(&raw)).await;
            if app.input.image().is_some() && app.image_path_input.is_empty() {
                app.focus = Focus::Techniques;
            }
        }
        _ => {
            edit_text(&mut app.image_path_input, &mut app.image_path_cursor, key);
        }
    }
}

/// `~/x.png` → `$HOME/x.png`
fn expand_home(raw: &str) -> PathBuf {
    match raw.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(raw)),
        None => PathBuf::from(raw),
    }
}

fn handle_technique_list(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('j') | KeyCode::Down => app.technique_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.technique_nav_up(),

        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => {
            if let Some(technique) = app.selected_technique() {
                app.select_technique(technique);
            }
        }

        // Edit the problem statement
        KeyCode::Char('i') | KeyCode::Char('/') => {
            app.focus = Focus::Problem;
            app.problem_cursor = app.input.problem_text().chars().count();
        }
        KeyCode::Tab => {
            app.focus = Focus::ImagePath;
        }

        // Image attachment
        KeyCode::Char('a') => {
            app.focus = Focus::ImagePath;
        }
        KeyCode::Char('x') => app.clear_image(),

        KeyCode::Char('K') => app.open_api_key_input(),

        _ => {}
    }
}

fn handle_loading(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        // Leave without waiting; the late result is ignored
        KeyCode::Esc | KeyCode::Char('b') => app.reset(),
        _ => {}
    }
}

fn handle_error(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('r') | KeyCode::Enter => app.retry(),
        KeyCode::Esc | KeyCode::Char('b') => app.reset(),
        _ => {}
    }
}

fn handle_success(app: &mut App, key: KeyEvent) {
    let showing_images = app.session.result().is_some_and(AnalysisResult::is_images);

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Esc | KeyCode::Char('b') => app.reset(),
        KeyCode::Char('r') => app.retry(),

        KeyCode::Char('j') | KeyCode::Down => {
            if showing_images {
                app.variation_nav_down();
            } else {
                app.scroll_down();
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            if showing_images {
                app.variation_nav_up();
            } else {
                app.scroll_up();
            }
        }
        KeyCode::Char('g') => app.result_scroll = 0,
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up();
        }

        KeyCode::Char('c') => {
            if let Some(text) = app.copyable_text() {
                match copy_to_clipboard(&text) {
                    Ok(()) => app.notify(NoticeKind::Info, "Analysis copied to clipboard!"),
                    Err(err) => {
                        warn!("clipboard unavailable: {:#}", err);
                        app.notify(NoticeKind::Warning, format!("Could not copy: {:#}", err));
                    }
                }
            }
        }
        KeyCode::Char('d') | KeyCode::Enter => app.download_selected(),
        KeyCode::Char('D') => app.download_all(),

        _ => {}
    }
}

fn handle_api_key_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.show_api_key_input = false;
            app.api_key_input.clear();
            app.api_key_input_cursor = 0;
        }
        KeyCode::Enter => app.apply_api_key(),
        _ => {
            edit_text(&mut app.api_key_input, &mut app.api_key_input_cursor, key);
        }
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.session.state() != ViewState::Success {
        return;
    }
    match mouse.kind {
        MouseEventKind::ScrollDown => {
            for _ in 0..3 {
                app.scroll_down();
            }
        }
        MouseEventKind::ScrollUp => {
            for _ in 0..3 {
                app.scroll_up();
            }
        }
        _ => {}
    }
}

fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new()?;
    clipboard.set_text(text.to_string())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use innoguide_core::Config;
    use tokio::sync::mpsc;

    fn press(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn app() -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        App::new(None, Config::new(), tx)
    }

    #[test]
    fn test_char_to_byte_index_handles_multibyte() {
        assert_eq!(char_to_byte_index("héllo", 2), 3);
        assert_eq!(char_to_byte_index("abc", 10), 3);
    }

    #[tokio::test]
    async fn test_typing_edits_problem_text() {
        let mut app = app();
        for c in "héat".chars() {
            handle_event(&mut app, press(KeyCode::Char(c))).await.unwrap();
        }
        handle_event(&mut app, press(KeyCode::Left)).await.unwrap();
        handle_event(&mut app, press(KeyCode::Backspace)).await.unwrap();
        assert_eq!(app.input.problem_text(), "hét");

        handle_event(&mut app, press(KeyCode::Enter)).await.unwrap();
        assert_eq!(app.focus, Focus::Techniques);
    }

    #[tokio::test]
    async fn test_any_key_dismisses_notice_first() {
        let mut app = app();
        app.focus = Focus::Techniques;
        app.notify(NoticeKind::Info, "hello");

        handle_event(&mut app, press(KeyCode::Char('q'))).await.unwrap();
        assert!(app.notice.is_none());
        assert!(!app.should_quit);

        handle_event(&mut app, press(KeyCode::Char('q'))).await.unwrap();
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_attaching_missing_file_reports_notice() {
        let mut app = app();
        app.focus = Focus::ImagePath;
        for c in "/definitely/not/here.png".chars() {
            handle_event(&mut app, press(KeyCode::Char(c))).await.unwrap();
        }
        handle_event(&mut app, press(KeyCode::Enter)).await.unwrap();

        assert!(app.input.image().is_none());
        assert_eq!(app.notice.as_ref().map(|n| n.kind), Some(NoticeKind::Warning));
        assert_eq!(app.focus, Focus::ImagePath);
    }

    #[tokio::test]
    async fn test_attaching_image_returns_to_technique_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shoe.png");
        std::fs::write(&path, b"png").unwrap();

        let mut app = app();
        app.focus = Focus::ImagePath;
        app.image_path_input = path.display().to_string();
        handle_event(&mut app, press(KeyCode::Enter)).await.unwrap();

        assert_eq!(app.input.image().map(|i| i.name.as_str()), Some("shoe.png"));
        assert_eq!(app.focus, Focus::Techniques);

        handle_event(&mut app, press(KeyCode::Char('x'))).await.unwrap();
        assert!(app.input.image().is_none());
    }

    #[test]
    fn test_expand_home_leaves_plain_paths_alone() {
        assert_eq!(expand_home("/tmp/a.png"), PathBuf::from("/tmp/a.png"));
    }

    #[tokio::test]
    async fn test_control_chords_do_not_type_letters() {
        let mut app = app();
        handle_event(&mut app, press(KeyCode::Char('h'))).await.unwrap();
        for c in ['a', 'u'] {
            let chord = AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL));
            handle_event(&mut app, chord).await.unwrap();
        }
        let alt = AppEvent::Key(KeyEvent::new(KeyCode::Char('b'), KeyModifiers::ALT));
        handle_event(&mut app, alt).await.unwrap();
        assert_eq!(app.input.problem_text(), "h");
        assert_eq!(app.problem_cursor, 1);

        app.open_api_key_input();
        let chord = AppEvent::Key(KeyEvent::new(KeyCode::Char('v'), KeyModifiers::CONTROL));
        handle_event(&mut app, chord).await.unwrap();
        assert!(app.api_key_input.is_empty());

        // Shifted letters are still text
        let shifted = AppEvent::Key(KeyEvent::new(KeyCode::Char('K'), KeyModifiers::SHIFT));
        handle_event(&mut app, shifted).await.unwrap();
        assert_eq!(app.api_key_input, "K");
    }

    #[tokio::test]
    async fn test_j_moves_variation_selection_on_image_results() {
        let mut app = app();
        let mut input = innoguide_core::InputCollector::new();
        input.set_image(Some(innoguide_core::UploadedImage::new(
            "a.png",
            innoguide_core::ImageMime::Png,
            vec![1],
        )));
        let ticket = app
            .session
            .start(innoguide_core::Technique::VisualPrototyping, &input)
            .unwrap();
        app.finish_analysis(
            ticket.generation,
            Ok(AnalysisResult::Images(vec![
                "data:image/png;base64,b25l".into(),
                "data:image/png;base64,dHdv".into(),
            ])),
        );

        handle_event(&mut app, press(KeyCode::Char('j'))).await.unwrap();
        assert_eq!(app.variation_state.selected(), Some(1));
        assert_eq!(app.result_scroll, 0);
    }
}
