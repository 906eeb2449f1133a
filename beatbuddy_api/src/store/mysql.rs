use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use tracing::instrument;
use types::{InsertResult, TopSong};

use super::{PersistenceError, Store, TOP_SONGS_LIMIT};

const UPDATE_GENRE: &str = "INSERT INTO genres (genre_name, times_in_playlist) \
     VALUES (?, 1) \
     ON DUPLICATE KEY UPDATE times_in_playlist = times_in_playlist + 1";

const UPDATE_SONG: &str = "INSERT INTO songs \
     (song_title, artist, genre_id, times_in_playlist) \
     VALUES (?, ?, ?, 1) \
     ON DUPLICATE KEY UPDATE times_in_playlist = times_in_playlist + 1";

const ADD_PREFERENCE: &str = "INSERT INTO UserPreferences \
     (userID, song, genre) VALUES (?, ?, ?)";

const TOP_SONGS: &str = "SELECT song, genre, COUNT(*) AS frequency \
     FROM UserPreferences \
     GROUP BY song, genre \
     ORDER BY frequency DESC \
     LIMIT ?";

#[derive(sqlx::FromRow)]
struct TopSongRow {
    song: String,
    genre: String,
    frequency: i64,
}

impl From<TopSongRow> for TopSong {
    fn from(row: TopSongRow) -> Self {
        Self {
            song: row.song,
            genre: row.genre,
            frequency: row.frequency,
        }
    }
}

/// MySQL backed [`Store`].
#[derive(Debug, Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    /// Opens the connection(s) eagerly so that a bad URL or an unreachable
    /// server is reported at startup. Gives up after `connect_timeout`.
    #[instrument(skip(database_url))]
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        connect_timeout: Duration,
    ) -> Result<Self, PersistenceError> {
        tracing::info!("connecting to MySQL");

        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(connect_timeout)
            .connect(database_url)
            .await
            .map_err(PersistenceError::Connection)?;

        tracing::info!("connected to MySQL");

        Ok(Self { pool })
    }

    /// Creates the `genres`, `songs` and `UserPreferences` tables if needed.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), PersistenceError> {
        tracing::info!("running database migrations");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl Store for MySqlStore {
    #[instrument(skip(self))]
    async fn update_genre(&self, genre: &str) -> Result<(), PersistenceError> {
        let result = sqlx::query(UPDATE_GENRE)
            .bind(genre)
            .execute(&self.pool)
            .await?;

        tracing::info!(
            rows_affected = result.rows_affected(),
            "genre updated"
        );

        Ok(())
    }

    #[instrument(skip(self))]
    async fn update_song(
        &self,
        song_title: &str,
        artist: &str,
        genre_id: i64,
    ) -> Result<(), PersistenceError> {
        let result = sqlx::query(UPDATE_SONG)
            .bind(song_title)
            .bind(artist)
            .bind(genre_id)
            .execute(&self.pool)
            .await?;

        tracing::info!(rows_affected = result.rows_affected(), "song updated");

        Ok(())
    }

    #[instrument(skip(self))]
    async fn add_preference(
        &self,
        user_id: &str,
        song: &str,
        genre: &str,
    ) -> Result<InsertResult, PersistenceError> {
        let result = sqlx::query(ADD_PREFERENCE)
            .bind(user_id)
            .bind(song)
            .bind(genre)
            .execute(&self.pool)
            .await?;

        Ok(InsertResult {
            affected_rows: result.rows_affected(),
            insert_id: result.last_insert_id(),
        })
    }

    #[instrument(skip(self))]
    async fn top_songs(&self) -> Result<Vec<TopSong>, PersistenceError> {
        #[allow(clippy::cast_possible_wrap)]
        let rows = sqlx::query_as::<_, TopSongRow>(TOP_SONGS)
            .bind(TOP_SONGS_LIMIT as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(TopSong::from).collect())
    }
}
