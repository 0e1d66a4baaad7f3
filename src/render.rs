//! Terminal and JSON views of a ranked search result.
//!
//! Rows keep their ranked order unless a sort column is given. The filter
//! matches case-insensitively against every cell of a row.

use crate::errors::{MediaRankError, Result};
use crate::pipeline::SearchResult;
use crate::providers::omdb::{SeasonScore, SeriesInfo};
use crate::providers::spotify::{ArtistInfo, RankedAlbum};
use crate::providers::youtube::{ChannelInfo, RankedVideo};
use crate::utils::Utils;
use comfy_table::{Cell as TableCell, CellAlignment, Table};
use serde::Serialize;
use std::cmp::Ordering;

const TITLE_WIDTH: usize = 48;

/// One table cell. Numbers sort numerically, text case-insensitively.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number { value: f64, shown: String },
}

impl Cell {
    fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    fn count(value: u64) -> Self {
        Cell::Number {
            value: value as f64,
            shown: Utils::format_count(value),
        }
    }

    fn score(value: f64) -> Self {
        Cell::Number {
            value,
            shown: Utils::format_score(value),
        }
    }

    pub fn shown(&self) -> &str {
        match self {
            Cell::Text(text) => text,
            Cell::Number { shown, .. } => shown,
        }
    }

    fn compare(&self, other: &Cell) -> Ordering {
        match (self, other) {
            (Cell::Number { value: a, .. }, Cell::Number { value: b, .. }) => a.total_cmp(b),
            (a, b) => a.shown().to_lowercase().cmp(&b.shown().to_lowercase()),
        }
    }
}

/// A ranked item that can be shown as a table row
pub trait TableRow {
    const COLUMNS: &'static [&'static str];

    fn cells(&self) -> Vec<Cell>;
}

/// Lines printed above the table
pub trait Summary {
    fn summary(&self) -> Vec<(&'static str, String)>;
}

/// How to cut and order the rows of a result
#[derive(Debug, Clone, Default)]
pub struct ViewOptions {
    pub filter: Option<String>,
    pub sort: Option<String>,
    pub ascending: bool,
    pub limit: Option<usize>,
}

/// Apply filter, sort and limit, returning the surviving rows
pub fn select<'a, T: TableRow>(rows: &'a [T], options: &ViewOptions) -> Result<Vec<&'a T>> {
    let needle = options
        .filter
        .as_deref()
        .map(|f| f.trim().to_lowercase())
        .filter(|f| !f.is_empty());

    let mut selected: Vec<(&T, Vec<Cell>)> = rows
        .iter()
        .map(|row| (row, row.cells()))
        .filter(|(_, cells)| match &needle {
            Some(needle) => cells
                .iter()
                .any(|cell| cell.shown().to_lowercase().contains(needle.as_str())),
            None => true,
        })
        .collect();

    if let Some(column) = &options.sort {
        let index = column_index::<T>(column)?;
        selected.sort_by(|(_, a), (_, b)| {
            let order = a[index].compare(&b[index]);
            if options.ascending {
                order
            } else {
                order.reverse()
            }
        });
    } else if options.ascending {
        selected.reverse();
    }

    let limit = options.limit.unwrap_or(usize::MAX);
    Ok(selected.into_iter().take(limit).map(|(row, _)| row).collect())
}

fn column_index<T: TableRow>(column: &str) -> Result<usize> {
    let wanted = squash(column);
    T::COLUMNS
        .iter()
        .position(|name| squash(name) == wanted)
        .ok_or_else(|| {
            MediaRankError::InvalidInput(format!(
                "Unknown sort column '{}'. Available: {}",
                column,
                T::COLUMNS.join(", ")
            ))
        })
}

fn squash(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Render the summary and the selected rows as an aligned text table
pub fn render_table<P, T>(result: &SearchResult<P, T>, options: &ViewOptions) -> Result<String>
where
    P: Summary,
    T: TableRow,
{
    let rows = select(&result.items, options)?;
    let mut out = String::new();

    for (label, value) in result.parent.summary() {
        if !value.is_empty() {
            out.push_str(&format!("{:<10} {}\n", format!("{}:", label), value));
        }
    }
    out.push('\n');

    if rows.is_empty() {
        out.push_str("No results\n");
        return Ok(out);
    }

    let mut table = Table::new();
    table.set_header(
        std::iter::once("#")
            .chain(T::COLUMNS.iter().copied())
            .collect::<Vec<_>>(),
    );

    for (i, row) in rows.iter().enumerate() {
        let row_cells = row.cells();
        let cells = std::iter::once(
            TableCell::new(i + 1).set_alignment(CellAlignment::Right),
        )
        .chain(row_cells.iter().map(|cell| match cell {
            Cell::Text(text) => TableCell::new(text),
            Cell::Number { shown, .. } => {
                TableCell::new(shown).set_alignment(CellAlignment::Right)
            }
        }));
        table.add_row(cells.collect::<Vec<_>>());
    }

    out.push_str(&format!("{table}\n"));
    out.push_str(&format!("\n{} of {} shown\n", rows.len(), result.items.len()));
    Ok(out)
}

#[derive(Serialize)]
struct JsonView<'a, P, T> {
    parent: &'a P,
    items: Vec<&'a T>,
}

/// Render the parent and the selected rows as pretty JSON
pub fn render_json<P, T>(result: &SearchResult<P, T>, options: &ViewOptions) -> Result<String>
where
    P: Serialize,
    T: TableRow + Serialize,
{
    let view = JsonView {
        parent: &result.parent,
        items: select(&result.items, options)?,
    };
    Ok(serde_json::to_string_pretty(&view)?)
}

impl TableRow for SeasonScore {
    const COLUMNS: &'static [&'static str] = &["Season", "Median rating", "Episodes"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::count(self.season_number as u64),
            Cell::score(self.median_score),
            Cell::count(self.episode_count as u64),
        ]
    }
}

impl Summary for SeriesInfo {
    fn summary(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Series", format!("{} ({})", self.title, self.year)),
            ("IMDb", self.imdb_id.clone()),
            ("Seasons", self.total_seasons.to_string()),
            ("Poster", self.poster.clone()),
        ]
    }
}

impl TableRow for RankedAlbum {
    const COLUMNS: &'static [&'static str] = &[
        "Album",
        "Released",
        "Type",
        "Tracks",
        "Length",
        "Avg popularity",
    ];

    fn cells(&self) -> Vec<Cell> {
        let length_ms: u64 = self.tracks.iter().map(|t| t.duration_ms).sum();
        vec![
            Cell::text(Utils::truncate(&self.album.name, TITLE_WIDTH)),
            Cell::text(self.album.release_date.clone()),
            Cell::text(self.album.album_type.clone()),
            Cell::count(self.tracks.len() as u64),
            Cell::Number {
                value: length_ms as f64,
                shown: Utils::format_duration_ms(length_ms),
            },
            Cell::score(self.average_popularity),
        ]
    }
}

impl Summary for ArtistInfo {
    fn summary(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Artist", self.name.clone()),
            ("Genres", self.genres.join(", ")),
            ("Popularity", self.popularity.to_string()),
            ("Followers", Utils::format_count(self.followers)),
            ("Spotify", self.spotify_url.clone()),
        ]
    }
}

impl TableRow for RankedVideo {
    const COLUMNS: &'static [&'static str] = &[
        "Title",
        "Days",
        "Views",
        "Likes",
        "Comments",
        "Favorites",
        "Score",
        "URL",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::text(Utils::truncate(&self.title, TITLE_WIDTH)),
            Cell::count(self.days as u64),
            Cell::count(self.views),
            Cell::count(self.likes),
            Cell::count(self.comments),
            Cell::count(self.favorites),
            Cell::score(self.score),
            Cell::text(self.url.clone()),
        ]
    }
}

impl Summary for ChannelInfo {
    fn summary(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Channel", self.title.clone()),
            ("Id", self.channel_id.clone()),
            ("About", Utils::truncate(self.description.trim(), 120)),
        ]
    }
}
