use serde::{Deserialize, Serialize};

/// A single turn of a conversation, in the shape the chat completions API
/// expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleChatMessage {
    pub content: String,

    pub role: Role,
}

impl SimpleChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            role: Role::User,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            role: Role::Assistant,
        }
    }
}

/// Roles a history turn may carry. Tool turns need a call id the simple
/// message shape has no room for, so they are not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Assistant,

    Developer,

    System,

    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub input: String,

    /// Missing history is treated as the start of a new conversation.
    #[serde(default)]
    pub conversation_history: Vec<SimpleChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub output: String,

    pub conversation_history: Vec<SimpleChatMessage>,
}

/// One aggregated row of the user preference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopSong {
    pub song: String,

    pub genre: String,

    pub frequency: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopSongsResponse {
    pub songs: Vec<TopSong>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddSongRequest {
    #[serde(rename = "userID")]
    pub user_id: String,

    pub song: String,

    pub genre: String,
}

/// Outcome of a single insert statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    pub affected_rows: u64,

    pub insert_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddSongResponse {
    pub status: String,

    pub data: InsertResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateGenreRequest {
    pub genre: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSongRequest {
    pub song_title: String,

    pub artist: String,

    pub genre_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
