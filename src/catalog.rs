use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::info;

use crate::models::{Movie, SessionKey};
use crate::store::{CatalogStore, StoreError};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("movie '{0}' not found")]
    MovieNotFound(String),
    #[error("invalid showtime selection '{selection}' for movie {movie_id}: choose 1..={available}")]
    InvalidSelection {
        movie_id: String,
        selection: String,
        available: usize,
    },
    #[error("duplicate movie id '{0}' in catalog")]
    DuplicateMovie(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Movies of one genre, for listing.
#[derive(Debug, Serialize)]
pub struct GenreGroup<'a> {
    pub genre: &'a str,
    pub movies: Vec<&'a Movie>,
}

/// Read-only view over the movies on sale. Loaded once, shared freely.
#[derive(Debug, Default)]
pub struct Catalog {
    movies: Vec<Movie>,
    by_id: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(movies: Vec<Movie>) -> Result<Self, CatalogError> {
        let mut by_id = HashMap::with_capacity(movies.len());
        for (idx, movie) in movies.iter().enumerate() {
            if by_id.insert(movie.movie_id.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateMovie(movie.movie_id.clone()));
            }
        }
        Ok(Self { movies, by_id })
    }

    pub async fn load(store: &dyn CatalogStore) -> Result<Self, CatalogError> {
        let movies = store.load_movies().await?;
        info!("Loaded {} movies into catalog", movies.len());
        Self::new(movies)
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    /// Groups by genre in order of first appearance; movies keep store order.
    pub fn list_movies(&self) -> Vec<GenreGroup<'_>> {
        let mut groups: Vec<GenreGroup<'_>> = Vec::new();
        for movie in &self.movies {
            match groups.iter_mut().find(|g| g.genre == movie.genre) {
                Some(group) => group.movies.push(movie),
                None => groups.push(GenreGroup {
                    genre: &movie.genre,
                    movies: vec![movie],
                }),
            }
        }
        groups
    }

    pub fn find_movie(&self, movie_id: &str) -> Result<&Movie, CatalogError> {
        self.by_id
            .get(movie_id.trim())
            .map(|&idx| &self.movies[idx])
            .ok_or_else(|| CatalogError::MovieNotFound(movie_id.to_string()))
    }

    /// `selection` is 1-based.
    pub fn resolve_showtime<'m>(&self, movie: &'m Movie, selection: usize) -> Result<&'m str, CatalogError> {
        selection
            .checked_sub(1)
            .and_then(|idx| movie.showtimes.get(idx))
            .map(String::as_str)
            .ok_or_else(|| CatalogError::InvalidSelection {
                movie_id: movie.movie_id.clone(),
                selection: selection.to_string(),
                available: movie.showtimes.len(),
            })
    }

    /// Like [`Catalog::resolve_showtime`] for raw user input; anything
    /// that is not a plain decimal number is an invalid selection.
    pub fn resolve_selection<'m>(&self, movie: &'m Movie, raw: &str) -> Result<&'m str, CatalogError> {
        let trimmed = raw.trim();
        let selection = trimmed
            .parse::<usize>()
            .ok()
            .filter(|_| trimmed.bytes().all(|b| b.is_ascii_digit()))
            .ok_or_else(|| CatalogError::InvalidSelection {
                movie_id: movie.movie_id.clone(),
                selection: raw.to_string(),
                available: movie.showtimes.len(),
            })?;
        self.resolve_showtime(movie, selection)
    }

    pub fn session_key(&self, movie: &Movie, showtime: &str) -> SessionKey {
        SessionKey::new(movie.movie_id.as_str(), showtime)
    }

    pub fn price(&self, movie: &Movie) -> u32 {
        movie.price
    }
}
