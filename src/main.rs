mod cli;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use episode_catalog::config;
use episode_catalog::domain::models::Episode;
use episode_catalog::infra::json_store::JsonFileStore;
use episode_catalog::workflows::listing::{confirm, format_episode, format_title};
use episode_catalog::workflows::seed;
use episode_catalog::Catalog;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = config::load()?;
    init_logging(&settings.log_level);

    let data_file = cli.data.unwrap_or(settings.data_file);
    debug!("Using catalog file {}", data_file.display());

    let store = JsonFileStore::open(&data_file)?;
    let mut catalog = Catalog::open(store)?;

    match cli.command {
        Command::Titles => {
            let grouped = catalog.titles_by_tag();
            if grouped.is_empty() {
                println!("No tagged titles.");
            }
            for (tag, titles) in grouped {
                println!("{tag}:");
                for title in titles {
                    println!("  {}", format_title(title));
                }
            }
        }
        Command::Show { title_id } => {
            let title = catalog.get_title(title_id)?;
            println!("{}", format_title(title));

            let tags: Vec<_> = catalog
                .tags_of(title_id)?
                .iter()
                .map(|t| t.name.as_str())
                .collect();
            if !tags.is_empty() {
                println!("Tags: {}", tags.join(", "));
            }
            for episode in catalog.episodes(title_id)? {
                println!("  {}", format_episode(episode));
            }
        }
        Command::AddTitle {
            name,
            release_date,
            watch_later,
        } => {
            let title = catalog.add_title(&name, release_date, watch_later)?;
            println!("Added {}", format_title(&title));
        }
        Command::AddEpisode {
            title_id,
            name,
            season,
            episode,
            previous,
        } => {
            let episode = catalog.add_episode(title_id, &name, season, episode, previous)?;
            println!("Added {}", format_episode(&episode));
        }
        Command::RemoveEpisode {
            episode_id,
            no_confirm,
        } => {
            let episode = catalog.get_episode(episode_id)?;
            let question = format!("Remove \"{}\"?", format_episode(episode));
            if !no_confirm && !confirm(&question) {
                println!("Skipped.");
                return Ok(());
            }
            catalog.remove_episode(episode_id)?;
            println!("Removed successfully.");
        }
        Command::MoveEpisode { episode_id, after } => {
            let episode = catalog.move_episode(episode_id, after)?;
            println!("Moved {}", format_episode(&episode));
        }
        Command::Next { episode_id } => {
            print_neighbour(catalog.next_episode(episode_id)?, "This is the last episode.");
        }
        Command::Previous { episode_id } => {
            print_neighbour(
                catalog.previous_episode(episode_id)?,
                "This is the first episode.",
            );
        }
        Command::Progress {
            episode_id,
            left_at,
            completed,
        } => {
            let episode = catalog.mark_progress(episode_id, left_at, completed)?;
            println!("{}", format_episode(&episode));
        }
        Command::Complete { episode_id } => {
            let episode = catalog.mark_completed(episode_id)?;
            println!("{}", format_episode(&episode));
        }
        Command::Continue { title_id } => match catalog.continue_watching(title_id)? {
            Some(episode) => println!("Continue with {}", format_episode(episode)),
            None => println!("Nothing left to watch."),
        },
        Command::AddTag { name, description } => {
            let tag = catalog.add_tag(&name, &description)?;
            println!("Added tag [{}] {}", tag.id, tag.name);
        }
        Command::Tag { title_id, tag_id } => {
            catalog.tag_title(title_id, tag_id)?;
            println!("Tagged.");
        }
        Command::Search { query } => {
            let results = catalog.search_titles(&query);
            if results.is_empty() {
                bail!("No titles found matching '{query}'");
            }
            for title in results {
                println!("{}", format_title(title));
            }
        }
        Command::WatchLater { title_id, unset } => match title_id {
            Some(title_id) => {
                let title = catalog.set_watch_later(title_id, !unset)?;
                println!("{}", format_title(&title));
            }
            None => {
                for title in catalog.watch_later() {
                    println!("{}", format_title(title));
                }
            }
        },
        Command::Seed => {
            let title = seed::populate(&mut catalog)?;
            println!("Seeded {}", format_title(&title));
        }
    }

    Ok(())
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_neighbour(episode: Option<&Episode>, at_end: &str) {
    match episode {
        Some(episode) => println!("{}", format_episode(episode)),
        None => println!("{at_end}"),
    }
}
