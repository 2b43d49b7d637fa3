use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Coach {
    pub id: String,
    pub name: String,
    pub email: String,
    pub specialty: String,
    /// Ids of the athletes this coach trains.
    pub athletes: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Coach {
    pub fn athletes_count(&self) -> usize {
        self.athletes.len()
    }
}
