//! Year-window loader behind the infinite scroll.
//!
//! The window starts at a seed year, grows forward one year per advance until
//! the current calendar year, then grows backward until 1901, then stops for
//! good. Each year gets one discover request; the loader only hands out
//! [`FetchTicket`]s and commits results, the caller does the actual I/O.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, warn};

use crate::models::Movie;
use crate::network::FetchError;
use crate::selection::GenreSelection;

pub const MAX_MOVIES_PER_YEAR: usize = 20;
/// Years at or below this are never requested.
pub const OLDEST_YEAR_EXCLUSIVE: i32 = 1900;

/// One issued request. `generation` fences late completions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub year: i32,
    pub generation: u64,
    pub genres: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Advance {
    Fetch(FetchTicket),
    /// A fetch is still in flight; the request is dropped.
    Ignored,
    /// No years left in either direction.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    Stored,
    Failed,
    /// A newer request for the same year was issued after this one.
    Stale,
}

#[derive(Debug)]
pub struct YearWindowLoader {
    years: VecDeque<i32>,
    cursor_year: i32,
    latest_year: i32,
    has_more: bool,
    in_flight: usize,
    next_generation: u64,
    issued: HashMap<i32, u64>,
    buckets: HashMap<i32, Vec<Movie>>,
}

impl YearWindowLoader {
    /// `latest_year` is the current calendar year, the forward bound. A seed
    /// outside `1901..=latest_year` is pulled back to the nearest bound.
    pub fn new(seed_year: i32, latest_year: i32) -> Self {
        let seed_year = seed_year.min(latest_year).max(OLDEST_YEAR_EXCLUSIVE + 1);
        Self {
            years: VecDeque::from([seed_year]),
            cursor_year: seed_year,
            latest_year,
            has_more: true,
            in_flight: 0,
            next_generation: 0,
            issued: HashMap::new(),
            buckets: HashMap::new(),
        }
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.iter().copied()
    }

    pub fn year_count(&self) -> usize {
        self.years.len()
    }

    pub fn cursor_year(&self) -> i32 {
        self.cursor_year
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight > 0
    }

    /// Movies for `year`, most popular first. `None` until a fetch for that
    /// year has succeeded.
    pub fn bucket(&self, year: i32) -> Option<&[Movie]> {
        self.buckets.get(&year).map(Vec::as_slice)
    }

    /// Re-requests the cursor year under `selection`. Used on start and on
    /// every genre change; other fetched years keep what they have.
    pub fn refresh(&mut self, selection: &GenreSelection) -> FetchTicket {
        self.issue(self.cursor_year, selection)
    }

    /// Extends the window by one year: forward while the newest year is
    /// before `latest_year`, otherwise backward.
    pub fn advance(&mut self, selection: &GenreSelection) -> Advance {
        if !self.has_more {
            return Advance::Exhausted;
        }
        if self.is_fetching() {
            return Advance::Ignored;
        }

        let newest = self.years.back().copied().unwrap_or(self.cursor_year);
        let oldest = self.years.front().copied().unwrap_or(self.cursor_year);

        let next = newest + 1;
        if next <= self.latest_year {
            self.cursor_year = next;
            self.years.push_back(next);
            return Advance::Fetch(self.issue(next, selection));
        }

        let prev = oldest - 1;
        if prev > OLDEST_YEAR_EXCLUSIVE {
            self.cursor_year = prev;
            self.years.push_front(prev);
            return Advance::Fetch(self.issue(prev, selection));
        }

        debug!(years = self.years.len(), "year window exhausted");
        self.has_more = false;
        Advance::Exhausted
    }

    fn issue(&mut self, year: i32, selection: &GenreSelection) -> FetchTicket {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.issued.insert(year, generation);
        self.in_flight += 1;
        debug!(year, generation, genres = ?selection.filter_param(), "fetch issued");
        FetchTicket {
            year,
            generation,
            genres: selection.filter_param(),
        }
    }

    /// Applies a finished request. Only the latest generation for a year may
    /// write its bucket; failures leave the bucket as it was.
    pub fn complete(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Vec<Movie>, FetchError>,
    ) -> Commit {
        self.in_flight = self.in_flight.saturating_sub(1);

        if self.issued.get(&ticket.year) != Some(&ticket.generation) {
            debug!(
                year = ticket.year,
                generation = ticket.generation,
                "discarding superseded response"
            );
            return Commit::Stale;
        }

        match result {
            Ok(mut movies) => {
                movies.truncate(MAX_MOVIES_PER_YEAR);
                sort_by_popularity(&mut movies);
                self.buckets.insert(ticket.year, movies);
                Commit::Stored
            }
            Err(err) => {
                warn!(year = ticket.year, error = %err, "failed to fetch movies");
                Commit::Failed
            }
        }
    }
}

/// Most popular first; stable for equal scores.
pub fn sort_by_popularity(movies: &mut [Movie]) {
    movies.sort_by(|a, b| b.popularity.total_cmp(&a.popularity));
}
