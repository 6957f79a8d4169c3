use serde::Serialize;

/// Persistent command entry. `name` is unique across the store; usage fields
/// are only ever mutated through `CommandStore::record_used`.
#[derive(Debug, Clone, Serialize)]
pub struct CommandRecord {
    pub name: String,
    pub description: String,
    pub file_path: String,
    pub usage_count: i64,
    pub created_at: String,
    pub last_used: Option<String>,
}

/// Append-only resolution log record. References a command by name only;
/// the name may no longer resolve and that is not an integrity error.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub query: String,
    pub intent: serde_json::Value,
    pub command_name: Option<String>,
    pub executed: bool,
    pub timestamp: String,
}
