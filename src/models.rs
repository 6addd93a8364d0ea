use serde::Deserialize;

/// A TMDB movie genre. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// One movie as returned by a discover query for a single release year.
#[derive(Debug, Clone, PartialEq)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub popularity: f64,
    pub vote_count: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusArea {
    GenreBar,
    MovieList,
}

/// Movie detail overlay, opened from the list.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailPopup {
    pub year: i32,
    pub movie: Movie,
    pub poster_url: Option<String>,
}
