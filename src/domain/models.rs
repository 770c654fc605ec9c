use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map($name)
            }
        }
    };
}

entity_id!(TitleId);
entity_id!(EpisodeId);
entity_id!(TagId);

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Title {
    pub id: TitleId,
    pub name: String,
    #[serde(default)]
    pub watch_later: bool,
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
}

/// A single watchable unit. `previous` and `next` hold ids only; the catalog
/// keeps both sides of every link in sync.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Episode {
    pub id: EpisodeId,
    pub title_id: TitleId,
    pub name: String,
    pub season: u32,
    pub episode_number: u32,
    #[serde(default)]
    pub completed: bool,
    /// Resume offset in seconds, never zero.
    #[serde(default)]
    pub left_at: Option<u64>,
    #[serde(default)]
    pub previous: Option<EpisodeId>,
    #[serde(default)]
    pub next: Option<EpisodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Unstarted,
    InProgress(u64),
    Completed,
}

impl Episode {
    pub fn progress(&self) -> Progress {
        match (self.completed, self.left_at) {
            (true, _) => Progress::Completed,
            (false, Some(offset)) => Progress::InProgress(offset),
            (false, None) => Progress::Unstarted,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TitleTagLink {
    pub title_id: TitleId,
    pub tag_id: TagId,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(completed: bool, left_at: Option<u64>) -> Episode {
        Episode {
            id: EpisodeId(1),
            title_id: TitleId(1),
            name: "pilot".to_string(),
            season: 1,
            episode_number: 1,
            completed,
            left_at,
            previous: None,
            next: None,
        }
    }

    #[test]
    fn test_progress_states() {
        assert_eq!(episode(false, None).progress(), Progress::Unstarted);
        assert_eq!(episode(false, Some(42)).progress(), Progress::InProgress(42));
        assert_eq!(episode(true, None).progress(), Progress::Completed);
    }

    #[test]
    fn test_ids_parse_and_display() {
        let id: EpisodeId = " 17 ".parse().unwrap();
        assert_eq!(id, EpisodeId(17));
        assert_eq!(id.to_string(), "17");
        assert!("x".parse::<TitleId>().is_err());
    }

    #[test]
    fn test_episode_deserializes_with_defaults() {
        let json = r#"{"id":3,"title_id":1,"name":"e","season":2,"episode_number":5}"#;
        let episode: Episode = serde_json::from_str(json).unwrap();
        assert_eq!(episode.id, EpisodeId(3));
        assert!(!episode.completed);
        assert_eq!(episode.left_at, None);
        assert_eq!(episode.previous, None);
        assert_eq!(episode.next, None);
    }
}
