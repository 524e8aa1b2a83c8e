use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BagLocation {
    #[serde(rename = "bagroom")]
    Bagroom,
    #[serde(rename = "player")]
    Player,
    #[serde(rename = "course")]
    Course,
}

impl BagLocation {
    pub const ALL: [BagLocation; 3] = [BagLocation::Bagroom, BagLocation::Player, BagLocation::Course];

    pub fn as_str(&self) -> &'static str {
        match self {
            BagLocation::Bagroom => "bagroom",
            BagLocation::Player => "player",
            BagLocation::Course => "course",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.as_str() == value)
    }

    pub fn label(&self) -> &'static str {
        match self {
            BagLocation::Bagroom => "In Bagroom",
            BagLocation::Player => "With Player",
            BagLocation::Course => "On Course",
        }
    }
}

impl std::fmt::Display for BagLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub membership_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl Member {
    pub fn new(name: String, membership_id: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            membership_id,
            photo_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bag {
    pub id: String,
    pub member_id: String,
    pub bag_number: String,
    pub location: BagLocation,
    pub last_updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Bag {
    pub fn new(member_id: String, bag_number: String, location: BagLocation, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            member_id,
            bag_number,
            location,
            last_updated: now,
            notes: None,
        }
    }
}

/// Per-location tallies for the dashboard status cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LocationCounts {
    pub bagroom: usize,
    pub player: usize,
    pub course: usize,
}

impl LocationCounts {
    pub fn get(&self, location: BagLocation) -> usize {
        match location {
            BagLocation::Bagroom => self.bagroom,
            BagLocation::Player => self.player,
            BagLocation::Course => self.course,
        }
    }

    pub fn total(&self) -> usize {
        self.bagroom + self.player + self.course
    }
}
