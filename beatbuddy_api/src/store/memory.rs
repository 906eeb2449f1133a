use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use types::{InsertResult, TopSong};

use super::{PersistenceError, Store, TOP_SONGS_LIMIT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPreference {
    pub id: u64,
    pub user_id: String,
    pub song: String,
    pub genre: String,
}

#[derive(Debug, Default)]
struct Tables {
    genres: HashMap<String, i64>,
    songs: HashMap<(String, String, i64), i64>,
    preferences: Vec<UserPreference>,
}

/// In-process [`Store`] with the same semantics as the MySQL one.
///
/// Ties in [`Store::top_songs`] keep the order in which each pair was first
/// added.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspection helper: times `genre` has been counted, if at all.
    pub async fn genre_count(&self, genre: &str) -> Option<i64> {
        self.tables.lock().await.genres.get(genre).copied()
    }

    /// Inspection helper: number of distinct genres.
    pub async fn genre_rows(&self) -> usize {
        self.tables.lock().await.genres.len()
    }

    /// Inspection helper: times a song row has been counted, if at all.
    pub async fn song_count(
        &self,
        song_title: &str,
        artist: &str,
        genre_id: i64,
    ) -> Option<i64> {
        self.tables
            .lock()
            .await
            .songs
            .get(&(song_title.to_string(), artist.to_string(), genre_id))
            .copied()
    }

    /// Inspection helper: every preference row in insertion order.
    pub async fn preferences(&self) -> Vec<UserPreference> {
        self.tables.lock().await.preferences.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn update_genre(&self, genre: &str) -> Result<(), PersistenceError> {
        *self
            .tables
            .lock()
            .await
            .genres
            .entry(genre.to_string())
            .or_insert(0) += 1;

        Ok(())
    }

    async fn update_song(
        &self,
        song_title: &str,
        artist: &str,
        genre_id: i64,
    ) -> Result<(), PersistenceError> {
        *self
            .tables
            .lock()
            .await
            .songs
            .entry((song_title.to_string(), artist.to_string(), genre_id))
            .or_insert(0) += 1;

        Ok(())
    }

    async fn add_preference(
        &self,
        user_id: &str,
        song: &str,
        genre: &str,
    ) -> Result<InsertResult, PersistenceError> {
        let mut tables = self.tables.lock().await;

        let id = tables.preferences.len() as u64 + 1;
        tables.preferences.push(UserPreference {
            id,
            user_id: user_id.to_string(),
            song: song.to_string(),
            genre: genre.to_string(),
        });

        Ok(InsertResult {
            affected_rows: 1,
            insert_id: id,
        })
    }

    async fn top_songs(&self) -> Result<Vec<TopSong>, PersistenceError> {
        let tables = self.tables.lock().await;

        let mut songs: Vec<TopSong> = Vec::new();
        for preference in &tables.preferences {
            match songs.iter_mut().find(|s| {
                s.song == preference.song && s.genre == preference.genre
            }) {
                Some(existing) => existing.frequency += 1,
                None => songs.push(TopSong {
                    song: preference.song.clone(),
                    genre: preference.genre.clone(),
                    frequency: 1,
                }),
            }
        }

        // stable, so ties stay in first-seen order
        songs.sort_by(|a, b| b.frequency.cmp(&a.frequency));
        songs.truncate(TOP_SONGS_LIMIT);

        Ok(songs)
    }
}
