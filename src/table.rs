// src/table.rs
//
// HTML table extraction and the row-level heuristics shared by both
// collectors: placeholder detection, largest-table selection, sum-row
// validation, and address-uniqueness checks. All pure functions over
// markup; nothing in here touches the network.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::error::HarvestError;

pub const ADDRESS_COLUMN: &str = "Address";
pub const NAME_TAG_COLUMN: &str = "Name Tag";

/// Marker of the trailing synthetic summary row ("Sum of N entries").
pub const SUM_ROW_PREFIX: &str = "Sum of";

/// Empty-state message the explorers render one page past the end.
pub const NO_MATCHING_ENTRIES: &str = "There are no matching entries";

static TABLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("table selector is valid"));
static TR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("tr selector is valid"));
static TH: Lazy<Selector> = Lazy::new(|| Selector::parse("th").expect("th selector is valid"));
static TD: Lazy<Selector> = Lazy::new(|| Selector::parse("td").expect("td selector is valid"));

/// One HTML table as returned by a single fetch: header row split off,
/// every cell whitespace-normalized, absent values as the empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Values of the named column in row order; short rows read as empty.
    pub fn column_values(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// A spanned cell repeats its value across the span, the same way a
/// dataframe-style reader widens it. The placeholder heuristic depends on
/// this: the explorers render their empty-state message in a cell spanning
/// the full column set.
fn push_cells(row: &mut Vec<String>, cell: ElementRef<'_>) {
    let text = cell_text(cell);
    let span = cell
        .value()
        .attr("colspan")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(1)
        .max(1);
    for _ in 0..span {
        row.push(text.clone());
    }
}

/// All tables in `html`, in document order.
pub fn extract_tables(html: &str) -> Vec<RawTable> {
    let doc = Html::parse_document(html);
    let mut tables = Vec::new();
    for el in doc.select(&TABLE) {
        let mut headers: Vec<String> = Vec::new();
        let mut rows: Vec<Vec<String>> = Vec::new();
        for tr in el.select(&TR) {
            if headers.is_empty() {
                let header_cells: Vec<String> = tr.select(&TH).map(cell_text).collect();
                if !header_cells.is_empty() {
                    headers = header_cells;
                    continue;
                }
            }
            let mut cells: Vec<String> = Vec::new();
            for td in tr.select(&TD) {
                push_cells(&mut cells, td);
            }
            if cells.is_empty() {
                continue;
            }
            // Ragged rows pad out to header width with empty strings.
            while cells.len() < headers.len() {
                cells.push(String::new());
            }
            rows.push(cells);
        }
        if !headers.is_empty() || !rows.is_empty() {
            tables.push(RawTable { headers, rows });
        }
    }
    tables
}

/// Number of data cells carrying the empty-state message.
pub fn placeholder_cells(table: &RawTable) -> usize {
    table
        .rows
        .iter()
        .flatten()
        .filter(|cell| cell.contains(NO_MATCHING_ENTRIES))
        .count()
}

/// A "no records" placeholder masquerading as a result table. Requiring the
/// message in more than one cell avoids a false positive on a table with a
/// single real row that merely mentions it.
pub fn is_placeholder(table: &RawTable) -> bool {
    placeholder_cells(table) > 1
}

/// The table with the most data rows among the non-placeholder, non-empty
/// candidates. Explorer pages can carry extra navigation tables, so index 0
/// is not reliable. `None` when no real table exists on the page.
pub fn select_largest(tables: &[RawTable]) -> Option<&RawTable> {
    tables
        .iter()
        .filter(|t| !is_placeholder(t) && !t.rows.is_empty())
        .max_by_key(|t| t.rows.len())
}

/// Validate the trailing "Sum of …" summary row and drop it. A missing or
/// malformed marker means the page no longer looks like a result table.
pub fn strip_sum_row(mut table: RawTable, label: &str) -> Result<RawTable, HarvestError> {
    let idx = table.column(NAME_TAG_COLUMN).ok_or_else(|| {
        HarvestError::integrity(label, format!("result table has no `{NAME_TAG_COLUMN}` column"))
    })?;
    let is_sum = table
        .rows
        .last()
        .and_then(|row| row.get(idx))
        .map_or(false, |tag| tag.starts_with(SUM_ROW_PREFIX));
    if !is_sum {
        return Err(HarvestError::integrity(
            label,
            format!("last row does not carry a `{SUM_ROW_PREFIX}` summary marker"),
        ));
    }
    table.rows.pop();
    Ok(table)
}

/// Addresses of `table` as a set, rejecting intra-table duplicates.
pub fn unique_addresses(
    table: &RawTable,
    label: &str,
    scope: &str,
) -> Result<HashSet<String>, HarvestError> {
    let values = table.column_values(ADDRESS_COLUMN).ok_or_else(|| {
        HarvestError::integrity(label, format!("result table has no `{ADDRESS_COLUMN}` column"))
    })?;
    let mut set = HashSet::with_capacity(values.len());
    for addr in values {
        if !set.insert(addr.to_string()) {
            return Err(HarvestError::integrity(
                label,
                format!("duplicate address {addr} in {scope}"),
            ));
        }
    }
    Ok(set)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::{NO_MATCHING_ENTRIES, SUM_ROW_PREFIX};

    /// A label result page: Address / Name Tag table with the given rows
    /// plus the trailing summary row.
    pub fn label_page(rows: &[(&str, &str)]) -> String {
        let mut body = String::from(
            "<html><body><table><tr><th>Address</th><th>Name Tag</th></tr>",
        );
        for (address, tag) in rows {
            body.push_str(&format!("<tr><td>{address}</td><td>{tag}</td></tr>"));
        }
        body.push_str(&format!(
            "<tr><td></td><td>{SUM_ROW_PREFIX} {} entries</td></tr></table></body></html>",
            rows.len()
        ));
        body
    }

    /// The empty-state page served one index past the end: message row
    /// (spanning both columns), blank row, sum row.
    pub fn sentinel_page() -> String {
        format!(
            "<html><body><table><tr><th>Address</th><th>Name Tag</th></tr>\
             <tr><td colspan=\"2\">{NO_MATCHING_ENTRIES}</td></tr>\
             <tr><td></td><td></td></tr>\
             <tr><td></td><td>{SUM_ROW_PREFIX} 0 entries</td></tr>\
             </table></body></html>"
        )
    }

    /// Like `sentinel_page` but with a shape the collector must reject.
    pub fn malformed_sentinel_page() -> String {
        format!(
            "<html><body><table><tr><th>Address</th><th>Name Tag</th></tr>\
             <tr><td colspan=\"2\">{NO_MATCHING_ENTRIES}</td></tr>\
             <tr><td></td><td>{SUM_ROW_PREFIX} 0 entries</td></tr>\
             </table></body></html>"
        )
    }
}
