use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

use crate::loader::{Advance, FetchTicket, YearWindowLoader};
use crate::models::{DetailPopup, FocusArea, Genre, Movie};
use crate::network::{DiscoverQuery, FetchError, ImageHost, MovieSource};
use crate::selection::{GenreChoice, GenreSelection};
use crate::utils::crossed_scroll_threshold;

/// Results coming back from the runtime to the UI thread.
#[derive(Debug)]
pub enum AppEvent {
    GenresLoaded(Result<Vec<Genre>, FetchError>),
    MoviesLoaded {
        ticket: FetchTicket,
        result: Result<Vec<Movie>, FetchError>,
    },
}

/// One line of the movie list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row {
    Year(i32),
    Movie { year: i32, index: usize, id: i64 },
    Empty(i32),
    Busy,
}

impl Row {
    /// Same logical line, ignoring position inside a re-sorted bucket.
    fn same_place(&self, other: &Row) -> bool {
        match (self, other) {
            (Row::Movie { year: a, id: x, .. }, Row::Movie { year: b, id: y, .. }) => {
                a == b && x == y
            }
            _ => self == other,
        }
    }
}

/// Everything the screen shows. Owned by the event loop, mutated only there.
pub struct App {
    pub genres: Vec<Genre>,
    pub selection: GenreSelection,
    pub loader: YearWindowLoader,
    pub focus: FocusArea,
    pub genre_cursor: usize,
    pub selected_row: usize,
    pub scroll: usize,
    pub viewport: usize,
    pub detail: Option<DetailPopup>,
    pub status: Option<String>,
    pub tick: usize,
    scroll_threshold: f64,
    images: ImageHost,
}

impl App {
    pub fn new(loader: YearWindowLoader, scroll_threshold: f64, images: ImageHost) -> Self {
        Self {
            genres: Vec::new(),
            selection: GenreSelection::new(),
            loader,
            focus: FocusArea::MovieList,
            genre_cursor: 0,
            selected_row: 0,
            scroll: 0,
            viewport: 1,
            detail: None,
            status: None,
            tick: 0,
            scroll_threshold,
            images,
        }
    }

    /// First fetch, for the seed year with no filter.
    pub fn start(&mut self) -> FetchTicket {
        self.loader.refresh(&self.selection)
    }

    /// "All" followed by every fetched genre, in button order.
    pub fn genre_choices(&self) -> Vec<GenreChoice> {
        std::iter::once(GenreChoice::All)
            .chain(self.genres.iter().map(|g| GenreChoice::Genre(g.id)))
            .collect()
    }

    pub fn focused_choice(&self) -> GenreChoice {
        self.genre_choices()
            .get(self.genre_cursor)
            .copied()
            .unwrap_or(GenreChoice::All)
    }

    pub fn move_genre_cursor(&mut self, delta: isize) {
        let last = self.genres.len() as isize;
        self.genre_cursor = (self.genre_cursor as isize + delta).clamp(0, last) as usize;
    }

    /// Applies a genre button press. A real change re-fetches the cursor year.
    pub fn toggle_genre(&mut self, choice: GenreChoice) -> Option<FetchTicket> {
        if !self.selection.toggle(choice) {
            return None;
        }
        info!(genres = ?self.selection.filter_param(), "genre selection changed");
        Some(self.loader.refresh(&self.selection))
    }

    pub fn toggle_focused_genre(&mut self) -> Option<FetchTicket> {
        self.toggle_genre(self.focused_choice())
    }

    pub fn switch_focus(&mut self) {
        self.focus = match self.focus {
            FocusArea::GenreBar => FocusArea::MovieList,
            FocusArea::MovieList => FocusArea::GenreBar,
        };
    }

    /// Flattened list: a heading per year, its movies (or an empty marker),
    /// then a busy line while anything is loading.
    pub fn rows(&self) -> Vec<Row> {
        let mut rows = Vec::new();
        for year in self.loader.years() {
            rows.push(Row::Year(year));
            match self.loader.bucket(year) {
                Some(movies) if !movies.is_empty() => {
                    rows.extend(movies.iter().enumerate().map(|(index, m)| Row::Movie {
                        year,
                        index,
                        id: m.id,
                    }));
                }
                _ => rows.push(Row::Empty(year)),
            }
        }
        if self.loader.is_fetching() {
            rows.push(Row::Busy);
        }
        rows
    }

    pub fn movie_at(&self, row: Row) -> Option<&Movie> {
        match row {
            Row::Movie { year, index, .. } => self.loader.bucket(year)?.get(index),
            _ => None,
        }
    }

    /// Moves the selection; scrolling down past the threshold extends the
    /// year window.
    pub fn scroll_by(&mut self, delta: isize) -> Option<FetchTicket> {
        let total = self.rows().len();
        if total > 0 {
            let last = total as isize - 1;
            self.selected_row = (self.selected_row as isize + delta).clamp(0, last) as usize;
            self.follow_selection();
        }
        if delta > 0 { self.maybe_advance() } else { None }
    }

    pub fn scroll_to_top(&mut self) {
        self.selected_row = 0;
        self.scroll = 0;
    }

    pub fn scroll_to_bottom(&mut self) -> Option<FetchTicket> {
        let total = self.rows().len();
        self.scroll_by(total as isize)
    }

    fn follow_selection(&mut self) {
        let viewport = self.viewport.max(1);
        if self.selected_row < self.scroll {
            self.scroll = self.selected_row;
        } else if self.selected_row >= self.scroll + viewport {
            self.scroll = self.selected_row + 1 - viewport;
        }
    }

    fn maybe_advance(&mut self) -> Option<FetchTicket> {
        if !self.loader.has_more() {
            return None;
        }
        let content = self.rows().len();
        if !crossed_scroll_threshold(self.scroll, self.viewport, content, self.scroll_threshold) {
            return None;
        }
        self.keep_anchor(|app| match app.loader.advance(&app.selection) {
            Advance::Fetch(ticket) => Some(ticket),
            Advance::Ignored => None,
            Advance::Exhausted => {
                info!(years = app.loader.year_count(), "reached the oldest year");
                None
            }
        })
    }

    /// Runs `f`, then keeps the selected line (and the viewport with it) on
    /// the same logical row even if rows were inserted above it.
    fn keep_anchor<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let anchor = self.rows().get(self.selected_row).copied();
        let out = f(self);
        let rows = self.rows();
        if let Some(new_index) = anchor.and_then(|a| rows.iter().position(|r| r.same_place(&a))) {
            if new_index >= self.selected_row {
                self.scroll += new_index - self.selected_row;
            } else {
                self.scroll = self.scroll.saturating_sub(self.selected_row - new_index);
            }
            self.selected_row = new_index;
        }
        self.selected_row = self.selected_row.min(rows.len().saturating_sub(1));
        self.follow_selection();
        out
    }

    pub fn apply(&mut self, event: AppEvent) {
        match event {
            AppEvent::GenresLoaded(Ok(genres)) => {
                info!(count = genres.len(), "genres loaded");
                self.genres = genres;
                self.genre_cursor = self.genre_cursor.min(self.genres.len());
            }
            AppEvent::GenresLoaded(Err(err)) => {
                warn!(error = %err, "failed to fetch genres");
            }
            AppEvent::MoviesLoaded { ticket, result } => {
                self.keep_anchor(|app| app.loader.complete(&ticket, result));
            }
        }
    }

    pub fn open_detail(&mut self) {
        let Some(row) = self.rows().get(self.selected_row).copied() else {
            return;
        };
        let Row::Movie { year, .. } = row else {
            return;
        };
        self.detail = self.movie_at(row).map(|movie| DetailPopup {
            year,
            poster_url: self.images.poster_url(movie.poster_path.as_deref()),
            movie: movie.clone(),
        });
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    pub fn on_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }
}

/// Runs requests on the tokio runtime and posts results back as [`AppEvent`]s.
/// Requests are never cancelled.
#[derive(Clone)]
pub struct Dispatcher {
    handle: Handle,
    source: Arc<dyn MovieSource>,
    tx: UnboundedSender<AppEvent>,
    min_vote_count: u32,
}

impl Dispatcher {
    pub fn new(
        handle: Handle,
        source: Arc<dyn MovieSource>,
        tx: UnboundedSender<AppEvent>,
        min_vote_count: u32,
    ) -> Self {
        Self {
            handle,
            source,
            tx,
            min_vote_count,
        }
    }

    pub fn load_genres(&self) {
        let source = self.source.clone();
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            let result = source.genres().await;
            let _ = tx.send(AppEvent::GenresLoaded(result));
        });
    }

    pub fn dispatch(&self, ticket: FetchTicket) {
        let query = DiscoverQuery {
            year: ticket.year,
            min_vote_count: self.min_vote_count,
            genres: ticket.genres.clone(),
        };
        let source = self.source.clone();
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            let result = source.discover(&query).await;
            let _ = tx.send(AppEvent::MoviesLoaded { ticket, result });
        });
    }

    pub fn dispatch_opt(&self, ticket: Option<FetchTicket>) {
        if let Some(ticket) = ticket {
            self.dispatch(ticket);
        }
    }
}
