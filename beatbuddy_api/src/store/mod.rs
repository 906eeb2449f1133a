//! Persistence for genres, songs and user preferences.
//!
//! Handlers only see the [`Store`] trait. [`MySqlStore`] is the production
//! backend, [`MemoryStore`] has the same semantics without a database and
//! [`DisconnectedStore`] stands in when the database could not be reached at
//! startup.

use async_trait::async_trait;
use thiserror::Error;
use types::{InsertResult, TopSong};

mod memory;
mod mysql;

pub use memory::{MemoryStore, UserPreference};
pub use mysql::MySqlStore;

/// Maximum number of rows returned by [`Store::top_songs`].
pub const TOP_SONGS_LIMIT: usize = 5;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to connect to the database: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("database is unavailable")]
    Unavailable,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Increments the playlist counter of `genre`, creating it at 1 when it
    /// does not exist yet.
    async fn update_genre(&self, genre: &str) -> Result<(), PersistenceError>;

    /// Increments the playlist counter of the song identified by
    /// `(song_title, artist, genre_id)`, creating it at 1 when it does not
    /// exist yet.
    async fn update_song(
        &self,
        song_title: &str,
        artist: &str,
        genre_id: i64,
    ) -> Result<(), PersistenceError>;

    /// Appends a preference row. Identical rows are never merged.
    async fn add_preference(
        &self,
        user_id: &str,
        song: &str,
        genre: &str,
    ) -> Result<InsertResult, PersistenceError>;

    /// The most frequent `(song, genre)` pairs, most frequent first, at most
    /// [`TOP_SONGS_LIMIT`] of them.
    async fn top_songs(&self) -> Result<Vec<TopSong>, PersistenceError>;
}

/// Store used when the connection could not be established. Every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisconnectedStore;

#[async_trait]
impl Store for DisconnectedStore {
    async fn update_genre(&self, _genre: &str) -> Result<(), PersistenceError> {
        Err(PersistenceError::Unavailable)
    }

    async fn update_song(
        &self,
        _song_title: &str,
        _artist: &str,
        _genre_id: i64,
    ) -> Result<(), PersistenceError> {
        Err(PersistenceError::Unavailable)
    }

    async fn add_preference(
        &self,
        _user_id: &str,
        _song: &str,
        _genre: &str,
    ) -> Result<InsertResult, PersistenceError> {
        Err(PersistenceError::Unavailable)
    }

    async fn top_songs(&self) -> Result<Vec<TopSong>, PersistenceError> {
        Err(PersistenceError::Unavailable)
    }
}
