use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
    layout::{Constraint, Direction, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
};
use crate::app::{App, Row};
use crate::models::{DetailPopup, FocusArea};
use crate::selection::GenreChoice;
use crate::theme::Theme;
use crate::utils::{truncate_chars, FOOTER_HEIGHT, GENRE_BAR_HEIGHT};

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Renders the whole screen: genre bar, year-grouped movie list, footer and
/// the detail popup when open.
pub fn render(f: &mut Frame, app: &App, theme: &Theme) {
    let area = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(GENRE_BAR_HEIGHT),
            Constraint::Min(1),
            Constraint::Length(FOOTER_HEIGHT),
        ])
        .split(area);

    render_genre_bar(f, app, theme, chunks[0]);
    render_movie_list(f, app, theme, chunks[1]);
    render_footer(f, app, theme, chunks[2]);

    if let Some(detail) = &app.detail {
        render_detail(f, detail, theme);
    }
}

fn border_style(focused: bool, theme: &Theme) -> Style {
    if focused {
        Style::default().fg(theme.focus_border).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.blurred_border)
    }
}

fn render_genre_bar(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let focused = app.focus == FocusArea::GenreBar;
    let mut spans = Vec::new();
    for (i, choice) in app.genre_choices().into_iter().enumerate() {
        let label = match choice {
            GenreChoice::All => "All".to_string(),
            GenreChoice::Genre(id) => app
                .genres
                .iter()
                .find(|g| g.id == id)
                .map(|g| g.name.clone())
                .unwrap_or_else(|| id.to_string()),
        };
        let mut style = if app.selection.is_active(choice) {
            theme.genre_active
        } else {
            theme.genre_idle
        };
        if focused && i == app.genre_cursor {
            style = style.patch(theme.genre_focused);
        }
        spans.push(Span::styled(format!(" {} ", label), style));
        spans.push(Span::raw(" "));
    }
    if app.genres.is_empty() {
        spans.push(Span::styled("loading genres…", theme.empty_year));
    }

    let title = if app.selection.is_all() {
        "Genres [Tab]".to_string()
    } else {
        format!("Genres [Tab] – {} active", app.selection.len())
    };
    let bar = Paragraph::new(Line::from(spans))
        .wrap(Wrap { trim: false })
        .block(Block::default().title(title).borders(Borders::ALL).border_style(border_style(focused, theme)));
    f.render_widget(bar, area);
}

fn movie_line(app: &App, row: Row, width: usize, theme: &Theme) -> Line<'static> {
    match row {
        Row::Year(year) => Line::from(vec![Span::styled(format!("── {} ──", year), theme.year_heading)]),
        Row::Empty(_) => Line::from(vec![Span::styled("   no movies", theme.empty_year)]),
        Row::Busy => {
            let frame = SPINNER[app.tick % SPINNER.len()];
            Line::from(vec![Span::styled(format!(" {} Loading movies…", frame), theme.busy)])
        }
        Row::Movie { .. } => {
            let Some(movie) = app.movie_at(row) else {
                return Line::default();
            };
            let title = format!("   {}", movie.title);
            let popularity = format!("  ★ {:.1}", movie.popularity);
            let votes = format!("  {} votes  ", movie.vote_count);
            let used = title.chars().count() + popularity.chars().count() + votes.chars().count();
            let overview = truncate_chars(&movie.overview, width.saturating_sub(used));
            Line::from(vec![
                Span::styled(title, theme.movie_title),
                Span::styled(popularity, theme.movie_popularity),
                Span::styled(votes, theme.movie_votes),
                Span::styled(overview, theme.movie_overview),
            ])
        }
    }
}

fn render_movie_list(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(1)].as_ref())
        .split(area);

    let rows = app.rows();
    // borders + highlight symbol
    let width = layout[0].width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| ListItem::new(movie_line(app, *row, width, theme)))
        .collect();

    let header = match (app.loader.has_more(), app.loader.years().next()) {
        (true, _) => format!("Movies – {} years loaded, last requested {}", app.loader.year_count(), app.loader.cursor_year()),
        (false, Some(oldest)) => format!("Movies – all {} years loaded (back to {})", app.loader.year_count(), oldest),
        (false, None) => "Movies".to_string(),
    };
    let focused = app.focus == FocusArea::MovieList;
    let list = List::new(items)
        .block(Block::default().title(header).borders(Borders::ALL).border_style(border_style(focused, theme)))
        .style(Style::default().fg(theme.text))
        .highlight_style(Style::default().bg(theme.selection_bg))
        .highlight_symbol("→ ");
    let mut state = ListState::default()
        .with_offset(app.scroll)
        .with_selected(if rows.is_empty() { None } else { Some(app.selected_row) });
    f.render_stateful_widget(list, layout[0], &mut state);

    let mut sb = ScrollbarState::default().position(app.selected_row).content_length(rows.len());
    f.render_stateful_widget(Scrollbar::default().orientation(ScrollbarOrientation::VerticalRight), layout[1], &mut sb);
}

fn render_footer(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let mut text = String::from(
        "Tab Focus | ←/→ h/l Genre | Space/Enter Toggle | a All | ↑/↓ j/k PgUp/PgDn g/G Scroll | Enter Details | q Quit",
    );
    if let Some(status) = &app.status {
        text.push_str(" | ");
        text.push_str(status);
    }
    let footer = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL))
        .style(theme.footer);
    f.render_widget(footer, area);
}

fn render_detail(f: &mut Frame, detail: &DetailPopup, theme: &Theme) {
    let popup_area = centered_rect(60, 60, f.area());
    f.render_widget(Clear, popup_area);

    let movie = &detail.movie;
    let lines = vec![
        Line::from(Span::styled(movie.title.clone(), theme.popup_title)),
        Line::from(vec![
            Span::styled(format!("{}", detail.year), theme.year_heading),
            Span::raw("  "),
            Span::styled(format!("★ {:.1}", movie.popularity), theme.movie_popularity),
            Span::raw("  "),
            Span::styled(format!("{} votes", movie.vote_count), theme.movie_votes),
        ]),
        Line::default(),
        Line::from(if movie.overview.is_empty() { "No overview available.".to_string() } else { movie.overview.clone() }),
        Line::default(),
        Line::from(Span::styled(
            format!("Poster: {}", detail.poster_url.as_deref().unwrap_or("none")),
            Style::default().fg(theme.text_secondary),
        )),
    ];
    let para = Paragraph::new(lines)
        .block(Block::default().title("Details – c copy poster URL, Esc close").borders(Borders::ALL).style(theme.popup_border))
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Left)
        .style(theme.popup_text);
    f.render_widget(para, popup_area);
}

/// Centers a rectangle within another rectangle.
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default().direction(Direction::Vertical)
        .constraints([Constraint::Percentage((100-percent_y)/2), Constraint::Percentage(percent_y), Constraint::Percentage((100-percent_y)/2)]).split(r)[1];
    Layout::default().direction(Direction::Horizontal)
        .constraints([Constraint::Percentage((100-percent_x)/2), Constraint::Percentage(percent_x), Constraint::Percentage((100-percent_x)/2)]).split(vertical)[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppEvent;
    use crate::loader::YearWindowLoader;
    use crate::models::{Genre, Movie};
    use crate::network::ImageHost;
    use ratatui::backend::TestBackend;

    fn movie(id: i64, title: &str, popularity: f64) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            overview: format!("About {title}"),
            poster_path: None,
            popularity,
            vote_count: 321,
        }
    }

    fn app() -> App {
        App::new(
            YearWindowLoader::new(2012, 2024),
            0.9,
            ImageHost::new("https://image.tmdb.org/t/p", "w500"),
        )
    }

    fn screen(app: &App) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| render(f, app, &Theme::default())).unwrap();
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect()
    }

    fn line_of(screen: &[String], needle: &str) -> usize {
        screen
            .iter()
            .position(|l| l.contains(needle))
            .unwrap_or_else(|| panic!("{needle:?} not on screen"))
    }

    #[test]
    fn movies_render_under_year_by_popularity() {
        let mut app = app();
        let ticket = app.start();
        app.apply(AppEvent::MoviesLoaded {
            ticket,
            result: Ok(vec![
                movie(1, "Ten", 10.0),
                movie(2, "Ninety", 90.0),
                movie(3, "FortyFive", 45.0),
                movie(4, "Two", 2.0),
                movie(5, "SeventySeven", 77.0),
            ]),
        });

        let screen = screen(&app);
        let order: Vec<usize> = ["── 2012 ──", "Ninety", "SeventySeven", "FortyFive", "Ten", "Two"]
            .iter()
            .map(|n| line_of(&screen, n))
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]), "{order:?}");
        assert!(screen[line_of(&screen, "Ninety")].contains("321 votes"));
        assert!(!screen.iter().any(|l| l.contains("Loading movies")));
    }

    #[test]
    fn busy_line_and_empty_year_while_loading() {
        let mut app = app();
        app.start();
        let screen = screen(&app);
        assert!(line_of(&screen, "no movies") < line_of(&screen, "Loading movies"));
    }

    #[test]
    fn genre_bar_lists_all_then_genres() {
        let mut app = app();
        app.genres = vec![
            Genre { id: 28, name: "Action".into() },
            Genre { id: 35, name: "Comedy".into() },
        ];
        let screen = screen(&app);
        let bar = &screen[line_of(&screen, "Action")];
        let all = bar.find(" All ").expect("padded All button");
        let action = bar.find(" Action ").expect("padded Action button");
        let comedy = bar.find(" Comedy ").expect("padded Comedy button");
        assert!(all < action && action < comedy);
    }

    #[test]
    fn detail_popup_shows_overview_and_poster() {
        let mut app = app();
        let ticket = app.start();
        app.apply(AppEvent::MoviesLoaded {
            ticket,
            result: Ok(vec![movie(9, "Looper", 30.0)]),
        });
        app.selected_row = 1;
        app.open_detail();
        let screen = screen(&app);
        line_of(&screen, "About Looper");
        line_of(&screen, "Poster: none");
    }
}
