use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use episode_catalog::domain::models::{EpisodeId, TagId, TitleId};

#[derive(Parser)]
#[command(name = "episode-catalog")]
#[command(about = "Browse titles, step through episodes and keep track of what you watched")]
pub struct Cli {
    /// Catalog JSON file, overrides the configured one
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List titles grouped by tag
    Titles,

    /// Show a title with its episodes in chain order
    Show { title_id: TitleId },

    /// Create a title
    AddTitle {
        name: String,

        /// Release date as YYYY-MM-DD
        #[arg(long)]
        release_date: Option<NaiveDate>,

        #[arg(long)]
        watch_later: bool,
    },

    /// Add an episode, after --previous or as the new first episode
    AddEpisode {
        title_id: TitleId,
        name: String,

        #[arg(long, default_value_t = 1)]
        season: u32,

        #[arg(long, default_value_t = 1)]
        episode: u32,

        #[arg(long)]
        previous: Option<EpisodeId>,
    },

    /// Remove an episode and join its neighbours
    RemoveEpisode {
        episode_id: EpisodeId,

        /// Skip confirmation prompts
        #[arg(long)]
        no_confirm: bool,
    },

    /// Move an episode after --after, or to the front
    MoveEpisode {
        episode_id: EpisodeId,

        #[arg(long)]
        after: Option<EpisodeId>,
    },

    /// Show the episode after this one
    Next { episode_id: EpisodeId },

    /// Show the episode before this one
    Previous { episode_id: EpisodeId },

    /// Record where you left off, in seconds
    Progress {
        episode_id: EpisodeId,
        left_at: u64,

        #[arg(long)]
        completed: bool,
    },

    /// Mark an episode as fully watched
    Complete { episode_id: EpisodeId },

    /// Show the first unwatched episode of a title
    Continue { title_id: TitleId },

    /// Create a tag
    AddTag {
        name: String,

        #[arg(long, default_value = "")]
        description: String,
    },

    /// Attach a tag to a title
    Tag { title_id: TitleId, tag_id: TagId },

    /// Find titles by name or tag
    Search { query: String },

    /// List titles saved for later, or save one
    WatchLater {
        title_id: Option<TitleId>,

        /// Take the title off the list instead
        #[arg(long, requires = "title_id")]
        unset: bool,
    },

    /// Add the sample title with a few episodes and tags
    Seed,
}
