use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// One configured banner message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: String,
    pub message: String,
    /// "yellow" | "red" | "blue" ... purely a display hint.
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    "yellow".into()
}

impl Announcement {
    pub fn new(id: impl Into<String>, message: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
            color: color.into(),
        }
    }
}

/// Interprets the raw `ui.announcements` value of the console configuration.
///
/// Absent, `null`, non-array and empty values all mean "no announcements".
/// Entries that do not deserialize are skipped, and so are repeated ids.
pub fn announcements_from_value(value: Option<&Value>) -> Option<Vec<Announcement>> {
    let entries = value?.as_array()?;
    if entries.is_empty() {
        return None;
    }

    let parsed = entries
        .iter()
        .enumerate()
        .filter_map(|(idx, entry)| {
            match serde_json::from_value::<Announcement>(entry.clone()) {
                Ok(a) => Some(a),
                Err(e) => {
                    warn!("Skipping malformed announcement at index {}: {}", idx, e);
                    None
                }
            }
        })
        .collect();

    let announcements = dedupe_announcements(parsed);
    if announcements.is_empty() {
        None
    } else {
        Some(announcements)
    }
}

/// Keeps the first announcement for every id, preserving list order.
pub fn dedupe_announcements(announcements: Vec<Announcement>) -> Vec<Announcement> {
    let mut seen = HashSet::new();
    announcements
        .into_iter()
        .filter(|a| {
            let fresh = seen.insert(a.id.clone());
            if !fresh {
                warn!("Dropping duplicate announcement id '{}'", a.id);
            }
            fresh
        })
        .collect()
}
