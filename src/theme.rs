use ratatui::style::{Color, Modifier, Style};

pub struct Theme {
    pub focus_border: Color,
    pub blurred_border: Color,
    pub text: Color,
    pub text_secondary: Color,
    pub selection_bg: Color,

    // Specific components
    pub genre_active: Style,
    pub genre_idle: Style,
    pub genre_focused: Style,
    pub year_heading: Style,
    pub movie_title: Style,
    pub movie_popularity: Style,
    pub movie_votes: Style,
    pub movie_overview: Style,
    pub empty_year: Style,
    pub busy: Style,
    pub footer: Style,
    pub popup_title: Style,
    pub popup_border: Style,
    pub popup_text: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            focus_border: Color::Cyan,
            blurred_border: Color::DarkGray,
            text: Color::White,
            text_secondary: Color::Gray,
            selection_bg: Color::DarkGray,

            genre_active: Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD),
            genre_idle: Style::default().fg(Color::White),
            genre_focused: Style::default().add_modifier(Modifier::UNDERLINED),
            year_heading: Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            movie_title: Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            movie_popularity: Style::default().fg(Color::Yellow),
            movie_votes: Style::default().fg(Color::Magenta),
            movie_overview: Style::default().fg(Color::Gray),
            empty_year: Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            busy: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            footer: Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
            popup_title: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            popup_border: Style::default().fg(Color::Magenta).bg(Color::Black),
            popup_text: Style::default().fg(Color::White),
        }
    }
}
