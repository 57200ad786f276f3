use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SocialProfile {
    pub platform: String,
    pub profile_url: Option<String>,
    pub last_activity: Option<DateTime<Utc>>,
    pub location_shared: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Associate {
    pub name: String,
    pub relationship: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

const CLOSE_RELATIONS: [&str; 3] = ["spouse", "parent", "sibling"];

impl Associate {
    pub fn is_close_relative(&self) -> bool {
        let relationship = self.relationship.to_lowercase();
        CLOSE_RELATIONS.contains(&relationship.as_str())
    }

    pub fn known_address(&self) -> Option<&str> {
        self.address
            .as_deref()
            .filter(|address| !address.is_empty())
    }
}
