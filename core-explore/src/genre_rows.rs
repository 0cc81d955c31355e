//! Random genre rows for the explore screen.
//!
//! Independent of the genre feed kept in [`ExploreState`](crate::state::ExploreState):
//! rows are sampled fresh on every call, never stored, and may repeat
//! albums the feed already shows.

use crate::models::GenreRow;
use crate::pipeline::GenreFeedFetcher;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use tracing::debug;

pub struct GenreRowSampler {
    fetcher: GenreFeedFetcher,
}

impl GenreRowSampler {
    pub fn new(fetcher: GenreFeedFetcher) -> Self {
        Self { fetcher }
    }

    /// Pick up to `count` distinct genres at random and fetch a shuffled row
    /// of top albums for each. Genres whose fetch comes back empty are left
    /// out, so fewer than `count` rows may be returned.
    pub async fn sample(&self, genres: &[String], count: usize) -> Vec<GenreRow> {
        let mut seen = HashSet::new();
        let candidates: Vec<&str> = genres
            .iter()
            .map(|genre| genre.trim())
            .filter(|genre| !genre.is_empty() && seen.insert(genre.to_lowercase()))
            .collect();

        let picked: Vec<String> = candidates
            .choose_multiple(&mut rand::thread_rng(), count)
            .map(|genre| genre.to_string())
            .collect();

        let mut rows = Vec::with_capacity(picked.len());
        for genre in picked {
            let mut albums = self.fetcher.top_albums(&genre).await;
            if albums.is_empty() {
                debug!(genre = %genre, "Genre row has no albums, dropping it");
                continue;
            }
            albums.shuffle(&mut rand::thread_rng());
            rows.push(GenreRow { genre, albums });
        }

        rows
    }
}
