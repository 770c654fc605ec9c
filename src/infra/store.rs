use serde::{Deserialize, Serialize};

use crate::domain::models::{Episode, Tag, Title, TitleTagLink};

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything a store holds, as loaded at startup.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Snapshot {
    #[serde(default)]
    pub titles: Vec<Title>,
    #[serde(default)]
    pub episodes: Vec<Episode>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub links: Vec<TitleTagLink>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Title(Title),
    Episode(Episode),
    Tag(Tag),
    Link(TitleTagLink),
}

impl Snapshot {
    /// Inserts or replaces the entity, keyed by id (links by pair).
    pub fn upsert(&mut self, entity: &Entity) {
        match entity {
            Entity::Title(title) => upsert_by(&mut self.titles, title.clone(), |t| t.id == title.id),
            Entity::Episode(episode) => {
                upsert_by(&mut self.episodes, episode.clone(), |e| e.id == episode.id)
            }
            Entity::Tag(tag) => upsert_by(&mut self.tags, tag.clone(), |t| t.id == tag.id),
            Entity::Link(link) => upsert_by(&mut self.links, *link, |l| l == link),
        }
    }

    /// Removes the entity; a missing entity is left alone.
    pub fn remove(&mut self, entity: &Entity) {
        match entity {
            Entity::Title(title) => self.titles.retain(|t| t.id != title.id),
            Entity::Episode(episode) => self.episodes.retain(|e| e.id != episode.id),
            Entity::Tag(tag) => self.tags.retain(|t| t.id != tag.id),
            Entity::Link(link) => self.links.retain(|l| l != link),
        }
    }
}

fn upsert_by<T, F>(items: &mut Vec<T>, item: T, matches: F)
where
    F: Fn(&T) -> bool,
{
    match items.iter_mut().find(|existing| matches(existing)) {
        Some(existing) => *existing = item,
        None => items.push(item),
    }
}

/// Persistence collaborator of the catalog.
///
/// `save` and `delete` must be idempotent so a failed call can simply be
/// retried; the last write wins.
pub trait Store {
    fn load_all(&self) -> Result<Snapshot>;

    fn save(&mut self, entity: &Entity) -> Result<()>;

    fn delete(&mut self, entity: &Entity) -> Result<()>;
}

/// A store that only lives in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    snapshot: Snapshot,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}

impl Store for MemoryStore {
    fn load_all(&self) -> Result<Snapshot> {
        Ok(self.snapshot.clone())
    }

    fn save(&mut self, entity: &Entity) -> Result<()> {
        self.snapshot.upsert(entity);
        Ok(())
    }

    fn delete(&mut self, entity: &Entity) -> Result<()> {
        self.snapshot.remove(entity);
        Ok(())
    }
}
