//! Nyaa torrent page extraction.
//!
//! Turns a torrent detail document into a [`ReleaseCandidate`]: title, magnet
//! link, the label/value statistics block and the nested file listing. Only
//! the title is mandatory; every other section degrades to an absent field or
//! an empty listing.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use shared::{FileNode, FinderError, ReleaseCandidate, TrackerStats};
use tracing::{debug, warn};

/// Suffix Nyaa appends to every page title
const TITLE_SUFFIX: &str = ":: Nyaa";

/// Size reported for files whose listing has no size element
pub const UNKNOWN_SIZE: &str = "Unknown";

/// Nested folders deeper than this are returned without contents
pub const MAX_TREE_DEPTH: usize = 64;

static TITLE: Lazy<Selector> = Lazy::new(|| selector("title"));
static MAGNET: Lazy<Selector> =
    Lazy::new(|| selector("div.panel-footer.clearfix a[href^='magnet']"));
static STAT_ROWS: Lazy<Selector> = Lazy::new(|| selector("div.panel-body .row"));
static FILE_LIST: Lazy<Selector> = Lazy::new(|| selector("div.torrent-file-list.panel-body"));
static LIST: Lazy<Selector> = Lazy::new(|| selector("ul"));
static RESULT_TABLE: Lazy<Selector> = Lazy::new(|| selector("table.torrent-list"));
static RESULT_LINK: Lazy<Selector> =
    Lazy::new(|| selector("tbody tr td a[href^='/view/']:not(.comments)"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector must parse")
}

/// What a search provider response turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPage {
    /// The provider served the detail page itself
    Detail,
    /// Result listing; holds the first result's detail link
    FirstResult(String),
    /// Result listing without any rows
    NoResults,
}

/// Classify a search response.
pub fn classify_search_page(html: &str) -> SearchPage {
    let document = Html::parse_document(html);

    let Some(table) = document.select(&RESULT_TABLE).next() else {
        return SearchPage::Detail;
    };

    table
        .select(&RESULT_LINK)
        .find_map(|link| link.value().attr("href"))
        .map(|href| SearchPage::FirstResult(href.to_string()))
        .unwrap_or(SearchPage::NoResults)
}

/// Extract a release record from a torrent detail document.
///
/// Fails only when the document has no `<title>` element.
pub fn extract(html: &str) -> Result<ReleaseCandidate, FinderError> {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE)
        .next()
        .ok_or_else(|| FinderError::malformed("document has no title element"))?;
    let release_name = release_name(&title.text().collect::<String>());

    let magnet_uri = document
        .select(&MAGNET)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string);

    let tracker_stats = tracker_stats(&stat_lines(&document));
    let files = file_tree(&document);

    debug!(
        release = %release_name,
        has_magnet = magnet_uri.is_some(),
        seeders = ?tracker_stats.seeders,
        entries = files.len(),
        "Extracted release"
    );

    Ok(ReleaseCandidate {
        release_name,
        magnet_uri,
        tracker_stats,
        files,
    })
}

fn release_name(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_suffix(TITLE_SUFFIX)
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

/// Flatten the statistics block into its sequence of non-empty text cells.
fn stat_lines(document: &Html) -> Vec<String> {
    let mut lines = Vec::new();

    for row in document.select(&STAT_ROWS) {
        let mut cells = child_elements(row).peekable();
        if cells.peek().is_none() {
            // Bare text row, split on line breaks
            let text: String = row.text().collect();
            lines.extend(
                text.lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string),
            );
            continue;
        }

        lines.extend(cells.map(normalized_text).filter(|cell| !cell.is_empty()));
    }

    lines
}

/// Scan label/value pairs; the value of a label is the following line.
fn tracker_stats(lines: &[String]) -> TrackerStats {
    let mut stats = TrackerStats::default();

    for (i, label) in lines.iter().enumerate() {
        let slot = match label.as_str() {
            "Category:" => &mut stats.category,
            "Date:" => &mut stats.date,
            "Submitter:" => &mut stats.submitter,
            "Seeders:" => &mut stats.seeders,
            "Leechers:" => &mut stats.leechers,
            "File size:" => &mut stats.file_size,
            "Completed:" => &mut stats.completed,
            _ => continue,
        };
        *slot = lines.get(i + 1).cloned();
    }

    stats
}

fn file_tree(document: &Html) -> Vec<FileNode> {
    let Some(container) = document.select(&FILE_LIST).next() else {
        return Vec::new();
    };
    let Some(list) = container.select(&LIST).next() else {
        return Vec::new();
    };
    file_list(list, 0)
}

fn file_list(list: ElementRef<'_>, depth: usize) -> Vec<FileNode> {
    child_elements(list)
        .filter(|el| el.value().name() == "li")
        .filter_map(|item| file_node(item, depth))
        .collect()
}

fn file_node(item: ElementRef<'_>, depth: usize) -> Option<FileNode> {
    if let Some(link) = child_elements(item).find(|el| is_tag(el, "a") && has_class(el, "folder")) {
        let name = non_empty(normalized_text(link));
        let contents = match child_elements(item).find(|el| is_tag(el, "ul")) {
            Some(nested) if depth + 1 < MAX_TREE_DEPTH => file_list(nested, depth + 1),
            Some(_) => {
                warn!(folder = ?name, depth, "File listing nested too deep, truncating");
                Vec::new()
            }
            None => Vec::new(),
        };
        return Some(FileNode::Folder { name, contents });
    }

    let icon = child_elements(item).find(|el| is_tag(el, "i") && has_class(el, "fa-file"))?;

    // The name is the bare text right after the icon
    let name = icon
        .next_sibling()
        .and_then(|node| node.value().as_text().map(|text| text.trim().to_string()))
        .and_then(non_empty);
    let size = child_elements(item)
        .find(|el| has_class(el, "file-size"))
        .map(normalized_text)
        .and_then(non_empty)
        .unwrap_or_else(|| UNKNOWN_SIZE.to_string());

    Some(FileNode::File { name, size })
}

fn child_elements<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.children().filter_map(ElementRef::wrap)
}

fn is_tag(el: &ElementRef<'_>, name: &str) -> bool {
    el.value().name() == name
}

fn has_class(el: &ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

fn normalized_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}
