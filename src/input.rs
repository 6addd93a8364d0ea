use anyhow::Result;
use arboard::Clipboard;
use crossterm::event::KeyCode;
use tracing::warn;

use crate::app::{App, Dispatcher};
use crate::models::FocusArea;
use crate::selection::GenreChoice;

/// Handles one key press. Returns `Ok(false)` when the app should quit.
pub fn handle_key(key: KeyCode, app: &mut App, dispatcher: &Dispatcher) -> Result<bool> {
    app.status = None;

    if app.detail.is_some() {
        match key {
            KeyCode::Char('q') => return Ok(false),
            KeyCode::Esc | KeyCode::Enter => app.close_detail(),
            KeyCode::Char('c') => copy_poster_url(app),
            _ => {}
        }
        return Ok(true);
    }

    let page = app.viewport.max(1) as isize;
    match key {
        KeyCode::Char('q') => return Ok(false),
        KeyCode::Tab | KeyCode::BackTab => app.switch_focus(),
        KeyCode::Left | KeyCode::Char('h') => app.move_genre_cursor(-1),
        KeyCode::Right | KeyCode::Char('l') => app.move_genre_cursor(1),
        KeyCode::Char('a') => dispatcher.dispatch_opt(app.toggle_genre(GenreChoice::All)),
        KeyCode::Char(' ') => dispatcher.dispatch_opt(app.toggle_focused_genre()),
        KeyCode::Enter => match app.focus {
            FocusArea::GenreBar => dispatcher.dispatch_opt(app.toggle_focused_genre()),
            FocusArea::MovieList => app.open_detail(),
        },
        KeyCode::Up | KeyCode::Char('k') => dispatcher.dispatch_opt(app.scroll_by(-1)),
        KeyCode::Down | KeyCode::Char('j') => dispatcher.dispatch_opt(app.scroll_by(1)),
        KeyCode::PageUp => dispatcher.dispatch_opt(app.scroll_by(-page)),
        KeyCode::PageDown => dispatcher.dispatch_opt(app.scroll_by(page)),
        KeyCode::Home | KeyCode::Char('g') => app.scroll_to_top(),
        KeyCode::End | KeyCode::Char('G') => dispatcher.dispatch_opt(app.scroll_to_bottom()),
        _ => {}
    }
    Ok(true)
}

fn copy_poster_url(app: &mut App) {
    let Some(url) = app.detail.as_ref().and_then(|d| d.poster_url.clone()) else {
        app.status = Some("No poster for this movie".to_string());
        return;
    };
    let copied = Clipboard::new().and_then(|mut cb| cb.set_text(url));
    app.status = Some(match copied {
        Ok(()) => "Poster URL copied".to_string(),
        Err(err) => {
            warn!(error = %err, "clipboard unavailable");
            "Clipboard unavailable".to_string()
        }
    });
}
