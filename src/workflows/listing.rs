use rustyline::DefaultEditor;

use crate::domain::models::{Episode, Progress, Title};

pub fn format_title(title: &Title) -> String {
    let mut line = format!("[{}] {}", title.id, title.name);
    if let Some(date) = title.release_date {
        line.push_str(&format!(" ({date})"));
    }
    if title.watch_later {
        line.push_str(" *watch later*");
    }
    line
}

pub fn format_episode(episode: &Episode) -> String {
    let status = match episode.progress() {
        Progress::Unstarted => String::new(),
        Progress::InProgress(offset) => format!(" [left at {}]", format_offset(offset)),
        Progress::Completed => " [watched]".to_string(),
    };
    format!(
        "[{}] S{:02}E{:02} - {}{}",
        episode.id, episode.season, episode.episode_number, episode.name, status
    )
}

/// Seconds as `m:ss`, or `h:mm:ss` past the hour.
pub fn format_offset(seconds: u64) -> String {
    let (hours, minutes, seconds) = (seconds / 3600, seconds / 60 % 60, seconds % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

pub fn confirm(question: &str) -> bool {
    println!("{question} [y/N] ");

    let Ok(mut rl) = DefaultEditor::new() else {
        return false;
    };
    loop {
        let input = rl.readline("").unwrap_or_default();
        let input = input.trim().to_lowercase();

        if input == "y" || input == "yes" {
            return true;
        } else if input == "n" || input == "no" || input.is_empty() {
            return false;
        } else {
            println!("Please enter 'y' or 'n'.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{EpisodeId, TitleId};
    use chrono::NaiveDate;

    fn episode(completed: bool, left_at: Option<u64>) -> Episode {
        Episode {
            id: EpisodeId(7),
            title_id: TitleId(1),
            name: "The Pilot".to_string(),
            season: 2,
            episode_number: 5,
            completed,
            left_at,
            previous: None,
            next: None,
        }
    }

    #[test]
    fn test_format_offset() {
        assert_eq!(format_offset(5), "0:05");
        assert_eq!(format_offset(754), "12:34");
        assert_eq!(format_offset(3600), "1:00:00");
        assert_eq!(format_offset(3725), "1:02:05");
    }

    #[test]
    fn test_format_episode() {
        assert_eq!(format_episode(&episode(false, None)), "[7] S02E05 - The Pilot");
        assert_eq!(
            format_episode(&episode(false, Some(90))),
            "[7] S02E05 - The Pilot [left at 1:30]"
        );
        assert_eq!(
            format_episode(&episode(true, None)),
            "[7] S02E05 - The Pilot [watched]"
        );
    }

    #[test]
    fn test_format_title() {
        let mut title = Title {
            id: TitleId(3),
            name: "Sample".to_string(),
            watch_later: false,
            release_date: None,
        };
        assert_eq!(format_title(&title), "[3] Sample");

        title.release_date = NaiveDate::from_ymd_opt(2021, 6, 9);
        title.watch_later = true;
        assert_eq!(format_title(&title), "[3] Sample (2021-06-09) *watch later*");
    }
}
