use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::store::StoreError;

/// A film on sale. Immutable once the catalog is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Movie {
    pub movie_id: String,
    pub name: String,
    pub genre: String,
    pub screen: String,
    pub showtimes: Vec<String>,
    pub price: u32,
}

// Raw storage shape: showtimes comma-separated, price as stored integer
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MovieRecord {
    pub movie_id: String,
    pub movie_name: String,
    pub genre: String,
    pub screen: String,
    pub showtimes: String,
    pub price: i64,
}

impl TryFrom<MovieRecord> for Movie {
    type Error = StoreError;

    fn try_from(record: MovieRecord) -> Result<Self, Self::Error> {
        let movie_id = record.movie_id.trim().to_string();
        if movie_id.is_empty() {
            return Err(StoreError::Corrupt("movie record without movie_id".to_string()));
        }
        let price = u32::try_from(record.price).map_err(|_| {
            StoreError::Corrupt(format!("movie {} has invalid price {}", movie_id, record.price))
        })?;
        let showtimes = record
            .showtimes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Movie {
            movie_id,
            name: record.movie_name.trim().to_string(),
            genre: record.genre.trim().to_string(),
            screen: record.screen.trim().to_string(),
            showtimes,
            price,
        })
    }
}

impl From<&Movie> for MovieRecord {
    fn from(movie: &Movie) -> Self {
        MovieRecord {
            movie_id: movie.movie_id.clone(),
            movie_name: movie.name.clone(),
            genre: movie.genre.clone(),
            screen: movie.screen.clone(),
            showtimes: movie.showtimes.join(", "),
            price: i64::from(movie.price),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(showtimes: &str, price: i64) -> MovieRecord {
        MovieRecord {
            movie_id: " M1 ".to_string(),
            movie_name: "Arrival".to_string(),
            genre: "Sci-Fi".to_string(),
            screen: "2".to_string(),
            showtimes: showtimes.to_string(),
            price,
        }
    }

    #[test]
    fn splits_and_trims_showtimes() {
        let movie = Movie::try_from(record("10:00 AM, 2:00 PM,, 9:30 PM ", 200)).unwrap();
        assert_eq!(movie.movie_id, "M1");
        assert_eq!(movie.showtimes, vec!["10:00 AM", "2:00 PM", "9:30 PM"]);
        assert_eq!(movie.price, 200);
    }

    #[test]
    fn rejects_negative_price() {
        let err = Movie::try_from(record("10:00", -5)).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[test]
    fn rejects_blank_id() {
        let mut raw = record("10:00", 1);
        raw.movie_id = "  ".to_string();
        assert!(Movie::try_from(raw).is_err());
    }

    #[test]
    fn record_joins_showtimes_back() {
        let movie = Movie::try_from(record("10:00, 13:00", 150)).unwrap();
        let back = MovieRecord::from(&movie);
        assert_eq!(back.showtimes, "10:00, 13:00");
        assert_eq!(back.price, 150);
    }
}
