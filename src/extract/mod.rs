// src/extract/mod.rs

//! Show extraction from afisha page markup.
//!
//! The two page layouts are modeled as an explicit tagged choice selected
//! by the orchestrator: the primary item-based layout on the main afisha
//! page, and the fallback table layout on the ticket page. Both layouts
//! fail soft: a page that matches nothing yields an empty list, which the
//! orchestrator treats as "try the other layout", not as "no shows".

use log::debug;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::config::ExtractConfig;
use crate::error::{AppError, Result};
use crate::models::Show;

/// Which page layout to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Item containers on the main afisha page
    Primary,
    /// Table rows on the alternate ticket page
    Fallback,
}

/// Extractor with selectors compiled at startup.
///
/// Invalid selectors are a configuration error surfaced by [`Extractor::new`];
/// extraction itself never fails.
pub struct Extractor {
    origin: String,
    item: Selector,
    day: Selector,
    time: Selector,
    title: Selector,
    link: Selector,
    link_attr: String,
    row: Selector,
    header_cell: Selector,
    data_cell: Selector,
    anchor: Selector,
    date_time: Regex,
}

impl Extractor {
    /// Compile selectors from configuration.
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        let p = &config.primary;
        Ok(Self {
            origin: config.origin.trim_end_matches('/').to_string(),
            item: parse_selector(&p.item_selector)?,
            day: parse_selector(&p.day_selector)?,
            time: parse_selector(&p.time_selector)?,
            title: parse_selector(&p.title_selector)?,
            link: parse_selector(&p.link_selector)?,
            link_attr: p.link_attr.clone(),
            row: parse_selector("table tr")?,
            header_cell: parse_selector("th")?,
            data_cell: parse_selector("td")?,
            anchor: parse_selector("a")?,
            // Strict combined date-time pattern used by the fallback layout
            date_time: Regex::new(r"(\d{2}\.\d{2}\.\d{4})\s+(\d{2}:\d{2})")
                .map_err(|e| AppError::config(format!("date-time pattern: {e}")))?,
        })
    }

    /// Extract shows from raw page markup using the given layout.
    pub fn extract(&self, html: &str, layout: Layout) -> Vec<Show> {
        let document = Html::parse_document(html);
        let shows = match layout {
            Layout::Primary => self.extract_primary(&document),
            Layout::Fallback => self.extract_fallback(&document),
        };
        debug!("Extracted {} shows ({:?} layout)", shows.len(), layout);
        shows
    }

    /// Primary layout: one container element per show.
    ///
    /// A candidate is emitted only if day, time and name are all non-empty
    /// after trimming; incomplete items are dropped silently.
    fn extract_primary(&self, document: &Html) -> Vec<Show> {
        let mut shows = Vec::new();

        for item in document.select(&self.item) {
            let date = select_text(&item, &self.day);
            let time = select_text(&item, &self.time);
            let name = select_text(&item, &self.title);

            if date.is_empty() || time.is_empty() || name.is_empty() {
                continue;
            }

            let href = item
                .select(&self.link)
                .next()
                .and_then(|el| el.value().attr(&self.link_attr))
                .unwrap_or("");

            shows.push(Show {
                date,
                time,
                name,
                url: self.qualify(href),
            });
        }

        shows
    }

    /// Fallback layout: table rows with a combined date-time cell and a
    /// name cell. Header rows and rows with fewer than two data cells are
    /// skipped.
    fn extract_fallback(&self, document: &Html) -> Vec<Show> {
        let mut shows = Vec::new();

        for row in document.select(&self.row) {
            if row.select(&self.header_cell).next().is_some() {
                continue;
            }
            let cells: Vec<ElementRef<'_>> = row.select(&self.data_cell).collect();
            if cells.len() < 2 {
                continue;
            }

            let date_time_raw = cell_text(&cells[0]);
            let name = cell_text(&cells[1]);
            if date_time_raw.is_empty() || name.is_empty() {
                continue;
            }

            let (date, time) = match self.date_time.captures(&date_time_raw) {
                Some(caps) => (caps[1].to_string(), caps[2].to_string()),
                // Unsplittable date-time stays whole in the date field
                None => (date_time_raw, String::new()),
            };

            let href = cells[1]
                .select(&self.anchor)
                .next()
                .and_then(|a| a.value().attr("href"))
                .unwrap_or("");
            let url = if href.is_empty() {
                String::new()
            } else {
                self.qualify(href)
            };

            shows.push(Show {
                date,
                time,
                name,
                url,
            });
        }

        shows
    }

    /// Qualify a link with the site origin unless it is already absolute.
    fn qualify(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else {
            format!("{}{}", self.origin, href)
        }
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Trimmed text of the first element matching `selector` within `scope`.
fn select_text(scope: &ElementRef<'_>, selector: &Selector) -> String {
    scope
        .select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn cell_text(cell: &ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}
