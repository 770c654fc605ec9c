use tracing::info;

use crate::domain::catalog::Catalog;
use crate::domain::error::Result;
use crate::domain::models::Title;
use crate::infra::store::Store;

const SAMPLE_TAGS: [&str; 4] = ["drama", "mystery", "thriller", "ben stiller"];

/// Fills the catalog with a sample title of three chained episodes and four
/// tags. Tags that already exist are reused.
pub fn populate<S: Store>(catalog: &mut Catalog<S>) -> Result<Title> {
    let title = catalog.add_title("Sample", None, false)?;

    let mut previous = None;
    for number in 1..=3 {
        let episode = catalog.add_episode(
            title.id,
            &format!("sample_s1e{number}"),
            1,
            number,
            previous,
        )?;
        previous = Some(episode.id);
    }

    for name in SAMPLE_TAGS {
        let existing = catalog.tags().find(|t| t.name == name).map(|t| t.id);
        let tag_id = match existing {
            Some(id) => id,
            None => catalog.add_tag(name, "")?.id,
        };
        catalog.tag_title(title.id, tag_id)?;
    }

    info!("Seeded sample title {}", title.id);
    Ok(title)
}
