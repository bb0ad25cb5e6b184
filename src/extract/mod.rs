// =============================================================================
// extract/mod.rs — THE TABLE ROOM
// =============================================================================
//
// One extractor per source-and-category pair. Each one knows exactly one
// table shape — which column holds what — because the sources publish
// neither headers we'd trust nor markup we'd call semantic. Column order is
// configuration, hand-mapped and frozen; when a webmaster reshuffles a
// table, extraction silently degrades until someone updates the shape here.
// We accept this bargain with open eyes.
//
// Ground rules shared by every extractor:
// - A row with too few cells is skipped, counted, and forgotten.
// - A row with an empty name cell is skipped likewise.
// - A malformed field inside an otherwise fine row becomes an absent field.
// Nothing a single row does can take down the batch.
// =============================================================================

pub mod listed;
pub mod upcoming;

use scraper::{ElementRef, Html, Selector};
use tracing::warn;
use url::Url;

/// Flatten a cell's text nodes into one trimmed, space-normalized string.
pub(crate) fn cell_text(cell: ElementRef<'_>) -> String {
    let raw: String = cell.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The first hyperlink in a cell, resolved against the page URL so relative
/// hrefs still point somewhere fetchable. No link, no detail page — fine.
pub(crate) fn first_link(cell: ElementRef<'_>, page_url: &str) -> Option<String> {
    // Static selector; cannot fail to parse.
    let a = Selector::parse("a").expect("static selector");
    let href = cell.select(&a).next()?.value().attr("href")?.trim();
    if href.is_empty() {
        return None;
    }
    match Url::parse(href) {
        Ok(abs) => Some(abs.to_string()),
        Err(_) => Url::parse(page_url)
            .and_then(|base| base.join(href))
            .map(|u| u.to_string())
            .ok(),
    }
}

/// All `<tr>` rows of the identified table's body. An id that matches
/// nothing yields an empty list — the "table got renamed upstream" failure
/// mode degrades to zero records, same as every other failure here.
pub(crate) fn table_rows<'a>(document: &'a Html, table_id: &str) -> Vec<ElementRef<'a>> {
    let selector = format!("#{} tbody tr", table_id);
    match Selector::parse(&selector).ok() {
        Some(sel) => document.select(&sel).collect(),
        None => {
            warn!(table_id = table_id, "unparseable table selector — no rows extracted");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unparseable_table_id_yields_no_rows() {
        let document = Html::parse_document(
            r#"<table id="tablepress-17"><tbody><tr><td>Acme</td></tr></tbody></table>"#,
        );
        // A leading digit makes the id selector invalid CSS.
        assert!(table_rows(&document, "17-tablepress[").is_empty());
        assert_eq!(table_rows(&document, "tablepress-17").len(), 1);
    }
}

/// The cells of one row, in document order.
pub(crate) fn row_cells<'a>(row: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    let td = Selector::parse("td").expect("static selector");
    row.select(&td).collect()
}
