//! The episode catalog: titles, their episode chains and tags.
//!
//! Every mutation first validates and collects the full set of entity changes,
//! persists them through the [`Store`], and only then applies them in memory.
//! When a store call fails, the writes that already went through are undone,
//! so a failed call leaves both the catalog and the store as they were.

use chrono::NaiveDate;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use super::error::{CatalogError, Result};
use super::models::{Episode, EpisodeId, Tag, TagId, Title, TitleId, TitleTagLink};
use crate::infra::store::{Entity, Store};

#[derive(Debug)]
enum Change {
    Save(Entity),
    Delete(Entity),
}

#[derive(Debug)]
pub struct Catalog<S: Store> {
    store: S,
    titles: BTreeMap<TitleId, Title>,
    episodes: BTreeMap<EpisodeId, Episode>,
    tags: BTreeMap<TagId, Tag>,
    links: BTreeSet<TitleTagLink>,
    next_title_id: u64,
    next_episode_id: u64,
    next_tag_id: u64,
}

impl<S: Store> Catalog<S> {
    /// Loads everything the store holds. The data is taken as is, chain
    /// consistency is checked lazily by the operations walking it.
    pub fn open(store: S) -> Result<Self> {
        let snapshot = store.load_all()?;

        let titles: BTreeMap<_, _> = snapshot.titles.into_iter().map(|t| (t.id, t)).collect();
        let episodes: BTreeMap<_, _> = snapshot.episodes.into_iter().map(|e| (e.id, e)).collect();
        let tags: BTreeMap<_, _> = snapshot.tags.into_iter().map(|t| (t.id, t)).collect();
        let links: BTreeSet<_> = snapshot.links.into_iter().collect();

        let next_title_id = titles.keys().next_back().map_or(1, |id| id.0 + 1);
        let next_episode_id = episodes.keys().next_back().map_or(1, |id| id.0 + 1);
        let next_tag_id = tags.keys().next_back().map_or(1, |id| id.0 + 1);

        debug!(
            "Loaded {} titles, {} episodes, {} tags, {} tag links",
            titles.len(),
            episodes.len(),
            tags.len(),
            links.len()
        );

        Ok(Self {
            store,
            titles,
            episodes,
            tags,
            links,
            next_title_id,
            next_episode_id,
            next_tag_id,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn get_title(&self, title_id: TitleId) -> Result<&Title> {
        self.titles
            .get(&title_id)
            .ok_or_else(|| CatalogError::not_found("title", title_id.0))
    }

    pub fn get_episode(&self, episode_id: EpisodeId) -> Result<&Episode> {
        self.episodes
            .get(&episode_id)
            .ok_or_else(|| CatalogError::not_found("episode", episode_id.0))
    }

    pub fn get_tag(&self, tag_id: TagId) -> Result<&Tag> {
        self.tags
            .get(&tag_id)
            .ok_or_else(|| CatalogError::not_found("tag", tag_id.0))
    }

    /// All titles, ordered by id.
    pub fn titles(&self) -> impl Iterator<Item = &Title> {
        self.titles.values()
    }

    /// All tags, ordered by id.
    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.tags.values()
    }

    pub fn add_title(
        &mut self,
        name: &str,
        release_date: Option<NaiveDate>,
        watch_later: bool,
    ) -> Result<Title> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogError::InvalidArgument(
                "title name must not be empty".to_string(),
            ));
        }

        let title = Title {
            id: TitleId(self.next_title_id),
            name: name.to_string(),
            watch_later,
            release_date,
        };
        self.commit(vec![Change::Save(Entity::Title(title.clone()))])?;
        self.next_title_id += 1;

        info!("Added title {} \"{}\"", title.id, title.name);
        Ok(title)
    }

    pub fn set_watch_later(&mut self, title_id: TitleId, watch_later: bool) -> Result<Title> {
        let mut title = self.get_title(title_id)?.clone();
        title.watch_later = watch_later;
        self.commit(vec![Change::Save(Entity::Title(title.clone()))])?;

        info!("Title {title_id} watch later set to {watch_later}");
        Ok(title)
    }

    pub fn watch_later(&self) -> Vec<&Title> {
        self.titles.values().filter(|t| t.watch_later).collect()
    }

    /// Adds an episode to a title.
    ///
    /// With `previous_id` the episode is appended after that episode, which
    /// must belong to the same title and must not have a successor yet.
    /// Without it the episode becomes the new head of the title's chain.
    pub fn add_episode(
        &mut self,
        title_id: TitleId,
        name: &str,
        season: u32,
        episode_number: u32,
        previous_id: Option<EpisodeId>,
    ) -> Result<Episode> {
        self.get_title(title_id)?;
        if season == 0 {
            return Err(CatalogError::InvalidArgument(
                "season must be positive".to_string(),
            ));
        }
        if episode_number == 0 {
            return Err(CatalogError::InvalidArgument(
                "episode number must be positive".to_string(),
            ));
        }

        let id = EpisodeId(self.next_episode_id);
        let mut episode = Episode {
            id,
            title_id,
            name: name.to_string(),
            season,
            episode_number,
            completed: false,
            left_at: None,
            previous: None,
            next: None,
        };
        let mut changes = Vec::new();

        match previous_id {
            Some(previous_id) => {
                let previous = self.get_episode(previous_id)?;
                if previous.title_id != title_id {
                    return Err(CatalogError::InvalidChain(format!(
                        "episode {previous_id} belongs to title {}, not {title_id}",
                        previous.title_id
                    )));
                }
                if let Some(next) = previous.next {
                    return Err(CatalogError::InvalidChain(format!(
                        "episode {previous_id} is already followed by episode {next}"
                    )));
                }

                let mut previous = previous.clone();
                previous.next = Some(id);
                episode.previous = Some(previous_id);
                changes.push(Change::Save(Entity::Episode(previous)));
            }
            None => {
                if let Some(head) = self.find_head(title_id)? {
                    let mut head = head.clone();
                    head.previous = Some(id);
                    episode.next = Some(head.id);
                    changes.push(Change::Save(Entity::Episode(head)));
                }
            }
        }

        changes.push(Change::Save(Entity::Episode(episode.clone())));
        self.commit(changes)?;
        self.next_episode_id += 1;

        info!(
            "Added episode {} \"{}\" S{:02}E{:02} to title {}",
            episode.id, episode.name, episode.season, episode.episode_number, title_id
        );
        Ok(episode)
    }

    /// Removes an episode and joins its neighbours so the chain stays
    /// contiguous.
    pub fn remove_episode(&mut self, episode_id: EpisodeId) -> Result<Episode> {
        let episode = self.get_episode(episode_id)?.clone();
        let mut changes = Vec::new();

        if let Some(previous_id) = episode.previous {
            let mut previous = self.linked_episode(previous_id, &episode)?.clone();
            if previous.next != Some(episode_id) {
                return Err(asymmetric_link(previous_id, episode_id));
            }
            previous.next = episode.next;
            changes.push(Change::Save(Entity::Episode(previous)));
        }
        if let Some(next_id) = episode.next {
            let mut next = self.linked_episode(next_id, &episode)?.clone();
            if next.previous != Some(episode_id) {
                return Err(asymmetric_link(episode_id, next_id));
            }
            next.previous = episode.previous;
            changes.push(Change::Save(Entity::Episode(next)));
        }

        changes.push(Change::Delete(Entity::Episode(episode.clone())));
        self.commit(changes)?;

        info!("Removed episode {episode_id} from title {}", episode.title_id);
        Ok(episode)
    }

    /// Moves an episode within its title's chain, directly after `after`, or
    /// to the head when `after` is `None`.
    pub fn move_episode(
        &mut self,
        episode_id: EpisodeId,
        after: Option<EpisodeId>,
    ) -> Result<Episode> {
        let episode = self.get_episode(episode_id)?.clone();
        let title_id = episode.title_id;

        if let Some(after_id) = after {
            if after_id == episode_id {
                return Err(CatalogError::InvalidChain(format!(
                    "episode {episode_id} cannot follow itself"
                )));
            }
            let target = self.get_episode(after_id)?;
            if target.title_id != title_id {
                return Err(CatalogError::InvalidChain(format!(
                    "episode {after_id} belongs to title {}, not {title_id}",
                    target.title_id
                )));
            }
        }
        if episode.previous == after {
            return Ok(episode);
        }

        let old_head = self.find_head(title_id)?.map(|head| head.id);
        let mut staged = BTreeMap::new();

        // unlink
        if let Some(previous_id) = episode.previous {
            self.staged(&mut staged, previous_id)?.next = episode.next;
        }
        if let Some(next_id) = episode.next {
            self.staged(&mut staged, next_id)?.previous = episode.previous;
        }

        // splice
        let (previous, next) = match after {
            Some(after_id) => {
                let target = self.staged(&mut staged, after_id)?;
                let next = target.next;
                target.next = Some(episode_id);
                (Some(after_id), next)
            }
            None => (None, old_head),
        };
        if let Some(next_id) = next {
            self.staged(&mut staged, next_id)?.previous = Some(episode_id);
        }

        let moved = self.staged(&mut staged, episode_id)?;
        moved.previous = previous;
        moved.next = next;
        let moved = moved.clone();

        let changes = staged
            .into_values()
            .map(|e| Change::Save(Entity::Episode(e)))
            .collect();
        self.commit(changes)?;

        info!("Moved episode {episode_id} of title {title_id} after {previous:?}");
        Ok(moved)
    }

    pub fn next_episode(&self, episode_id: EpisodeId) -> Result<Option<&Episode>> {
        let episode = self.get_episode(episode_id)?;
        episode
            .next
            .map(|next_id| self.linked_episode(next_id, episode))
            .transpose()
    }

    pub fn previous_episode(&self, episode_id: EpisodeId) -> Result<Option<&Episode>> {
        let episode = self.get_episode(episode_id)?;
        episode
            .previous
            .map(|previous_id| self.linked_episode(previous_id, episode))
            .transpose()
    }

    /// Records where the viewer left off. Marking an episode completed clears
    /// its resume offset; marking it not completed puts it back in progress.
    pub fn mark_progress(
        &mut self,
        episode_id: EpisodeId,
        left_at: u64,
        completed: bool,
    ) -> Result<Episode> {
        if left_at == 0 {
            return Err(CatalogError::InvalidArgument(
                "left_at must be positive".to_string(),
            ));
        }

        let mut episode = self.get_episode(episode_id)?.clone();
        episode.completed = completed;
        episode.left_at = if completed { None } else { Some(left_at) };
        self.commit(vec![Change::Save(Entity::Episode(episode.clone()))])?;

        info!("Episode {episode_id} progress is now {:?}", episode.progress());
        Ok(episode)
    }

    pub fn mark_completed(&mut self, episode_id: EpisodeId) -> Result<Episode> {
        let mut episode = self.get_episode(episode_id)?.clone();
        episode.completed = true;
        episode.left_at = None;
        self.commit(vec![Change::Save(Entity::Episode(episode.clone()))])?;

        info!("Episode {episode_id} completed");
        Ok(episode)
    }

    /// The first episode in chain order that has not been completed.
    pub fn continue_watching(&self, title_id: TitleId) -> Result<Option<&Episode>> {
        let chain = self.episodes(title_id)?;
        Ok(chain.into_iter().find(|e| !e.completed))
    }

    /// The episode of the title without a predecessor.
    ///
    /// More than one such episode means the chain is forked; none while the
    /// title has episodes means it loops.
    pub fn find_head(&self, title_id: TitleId) -> Result<Option<&Episode>> {
        self.get_title(title_id)?;

        let members: Vec<&Episode> = self
            .episodes
            .values()
            .filter(|e| e.title_id == title_id)
            .collect();
        let heads: Vec<&Episode> = members
            .iter()
            .copied()
            .filter(|e| e.previous.is_none())
            .collect();

        match heads.as_slice() {
            [head] => Ok(Some(*head)),
            [first, second, ..] => Err(CatalogError::InvalidChain(format!(
                "title {title_id} has more than one head (episodes {} and {})",
                first.id, second.id
            ))),
            [] if !members.is_empty() => Err(CatalogError::InvalidChain(format!(
                "title {title_id} has no head, its chain loops"
            ))),
            [] => Ok(None),
        }
    }

    /// The title's episodes walked from head to tail.
    pub fn episodes(&self, title_id: TitleId) -> Result<Vec<&Episode>> {
        let expected = self
            .episodes
            .values()
            .filter(|e| e.title_id == title_id)
            .count();
        let mut chain = Vec::with_capacity(expected);
        let mut cursor = self.find_head(title_id)?;

        while let Some(episode) = cursor {
            if chain.len() == expected {
                return Err(CatalogError::InvalidChain(format!(
                    "title {title_id} chain loops back at episode {}",
                    episode.id
                )));
            }
            chain.push(episode);
            cursor = self.next_episode(episode.id)?;
        }

        if chain.len() != expected {
            return Err(CatalogError::InvalidChain(format!(
                "title {title_id} chain reaches {} of {} episodes",
                chain.len(),
                expected
            )));
        }
        Ok(chain)
    }

    pub fn add_tag(&mut self, name: &str, description: &str) -> Result<Tag> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogError::InvalidArgument(
                "tag name must not be empty".to_string(),
            ));
        }
        if self.tags.values().any(|t| t.name == name) {
            return Err(CatalogError::Duplicate(format!("tag name \"{name}\"")));
        }

        let tag = Tag {
            id: TagId(self.next_tag_id),
            name: name.to_string(),
            description: description.to_string(),
        };
        self.commit(vec![Change::Save(Entity::Tag(tag.clone()))])?;
        self.next_tag_id += 1;

        info!("Added tag {} \"{}\"", tag.id, tag.name);
        Ok(tag)
    }

    pub fn tag_title(&mut self, title_id: TitleId, tag_id: TagId) -> Result<()> {
        self.get_title(title_id)?;
        self.get_tag(tag_id)?;

        let link = TitleTagLink { title_id, tag_id };
        if self.links.contains(&link) {
            return Err(CatalogError::Duplicate(format!(
                "tag {tag_id} on title {title_id}"
            )));
        }
        self.commit(vec![Change::Save(Entity::Link(link))])?;

        info!("Tagged title {title_id} with tag {tag_id}");
        Ok(())
    }

    pub fn tags_of(&self, title_id: TitleId) -> Result<Vec<&Tag>> {
        self.get_title(title_id)?;
        Ok(self
            .links
            .iter()
            .filter(|link| link.title_id == title_id)
            .filter_map(|link| self.tags.get(&link.tag_id))
            .collect())
    }

    /// Tag name to the titles carrying it, ordered by title id. Untagged
    /// titles and unused tags do not show up.
    pub fn titles_by_tag(&self) -> BTreeMap<String, Vec<&Title>> {
        let mut grouped: BTreeMap<String, Vec<&Title>> = BTreeMap::new();
        for link in &self.links {
            if let (Some(tag), Some(title)) =
                (self.tags.get(&link.tag_id), self.titles.get(&link.title_id))
            {
                grouped.entry(tag.name.clone()).or_default().push(title);
            }
        }
        grouped
    }

    /// Titles whose name or one of whose tags contains `query`, ignoring case.
    /// An empty query matches everything.
    pub fn search_titles(&self, query: &str) -> Vec<&Title> {
        let query = query.trim().to_lowercase();
        self.titles
            .values()
            .filter(|title| {
                query.is_empty()
                    || title.name.to_lowercase().contains(&query)
                    || self
                        .links
                        .iter()
                        .filter(|link| link.title_id == title.id)
                        .filter_map(|link| self.tags.get(&link.tag_id))
                        .any(|tag| tag.name.to_lowercase().contains(&query))
            })
            .collect()
    }

    fn linked_episode(&self, id: EpisodeId, from: &Episode) -> Result<&Episode> {
        let linked = self.episodes.get(&id).ok_or_else(|| {
            CatalogError::InvalidChain(format!(
                "episode {} links to missing episode {id}",
                from.id
            ))
        })?;
        if linked.title_id != from.title_id {
            return Err(CatalogError::InvalidChain(format!(
                "episode {} links to episode {id} of another title",
                from.id
            )));
        }
        Ok(linked)
    }

    fn staged<'a>(
        &self,
        staged: &'a mut BTreeMap<EpisodeId, Episode>,
        id: EpisodeId,
    ) -> Result<&'a mut Episode> {
        match staged.entry(id) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let episode = self.episodes.get(&id).cloned().ok_or_else(|| {
                    CatalogError::InvalidChain(format!("link to missing episode {id}"))
                })?;
                Ok(entry.insert(episode))
            }
        }
    }

    fn commit(&mut self, changes: Vec<Change>) -> Result<()> {
        let mut undo_log = Vec::with_capacity(changes.len());
        for change in &changes {
            let undo = self.undo_for(change);
            if let Err(e) = self.write(change) {
                self.rollback(undo_log);
                return Err(e.into());
            }
            undo_log.push(undo);
        }

        for change in changes {
            match change {
                Change::Save(entity) => self.apply_save(entity),
                Change::Delete(entity) => self.apply_delete(entity),
            }
        }
        Ok(())
    }

    fn write(&mut self, change: &Change) -> crate::infra::store::Result<()> {
        match change {
            Change::Save(entity) => self.store.save(entity),
            Change::Delete(entity) => self.store.delete(entity),
        }
    }

    /// The change restoring what the store holds before `change` is written.
    /// The in-memory maps mirror the store, so they provide the old version.
    fn undo_for(&self, change: &Change) -> Change {
        let (Change::Save(entity) | Change::Delete(entity)) = change;
        let current = match entity {
            Entity::Title(title) => self.titles.get(&title.id).cloned().map(Entity::Title),
            Entity::Episode(episode) => {
                self.episodes.get(&episode.id).cloned().map(Entity::Episode)
            }
            Entity::Tag(tag) => self.tags.get(&tag.id).cloned().map(Entity::Tag),
            Entity::Link(link) => self.links.contains(link).then_some(Entity::Link(*link)),
        };

        match current {
            Some(current) => Change::Save(current),
            None => Change::Delete(entity.clone()),
        }
    }

    fn rollback(&mut self, undo_log: Vec<Change>) {
        for undo in undo_log.into_iter().rev() {
            if let Err(e) = self.write(&undo) {
                warn!("Failed to roll back {undo:?}: {e}");
            }
        }
    }

    fn apply_save(&mut self, entity: Entity) {
        match entity {
            Entity::Title(title) => {
                self.titles.insert(title.id, title);
            }
            Entity::Episode(episode) => {
                self.episodes.insert(episode.id, episode);
            }
            Entity::Tag(tag) => {
                self.tags.insert(tag.id, tag);
            }
            Entity::Link(link) => {
                self.links.insert(link);
            }
        }
    }

    fn apply_delete(&mut self, entity: Entity) {
        match entity {
            Entity::Title(title) => {
                self.titles.remove(&title.id);
            }
            Entity::Episode(episode) => {
                self.episodes.remove(&episode.id);
            }
            Entity::Tag(tag) => {
                self.tags.remove(&tag.id);
            }
            Entity::Link(link) => {
                self.links.remove(&link);
            }
        }
    }
}

fn asymmetric_link(from: EpisodeId, to: EpisodeId) -> CatalogError {
    CatalogError::InvalidChain(format!(
        "link between episodes {from} and {to} is not symmetric"
    ))
}
