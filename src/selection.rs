use std::collections::BTreeSet;

/// What a genre button stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenreChoice {
    All,
    Genre(i64),
}

/// The set of active genre filters. Empty means no filter.
///
/// Ids are not checked against the fetched genre list; an unknown id is kept
/// and simply never lights up a button.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenreSelection {
    ids: BTreeSet<i64>,
}

impl GenreSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a button press and reports whether the set changed.
    pub fn toggle(&mut self, choice: GenreChoice) -> bool {
        match choice {
            GenreChoice::All => {
                let changed = !self.ids.is_empty();
                self.ids.clear();
                changed
            }
            GenreChoice::Genre(id) => {
                if !self.ids.remove(&id) {
                    self.ids.insert(id);
                }
                true
            }
        }
    }

    pub fn is_all(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    /// Whether the button for `choice` should be drawn as active.
    pub fn is_active(&self, choice: GenreChoice) -> bool {
        match choice {
            GenreChoice::All => self.is_all(),
            GenreChoice::Genre(id) => self.contains(id),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Comma-joined ids for the `with_genres` query parameter, or `None`
    /// when no filter is active.
    pub fn filter_param(&self) -> Option<String> {
        if self.ids.is_empty() {
            return None;
        }
        let ids: Vec<String> = self.ids.iter().map(|id| id.to_string()).collect();
        Some(ids.join(","))
    }
}
