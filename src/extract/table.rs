//! Table mode

use super::clean::{element_text, static_selector};
use super::{scope, ExtractedItem, ExtractionRequest};
use crate::ExtractionError;
use scraper::{ElementRef, Html};

/// Data rows of every table in scope
///
/// With a selector, matched tables are used directly and other matches
/// contribute the tables nested inside them. Rows are padded with empty
/// cells up to the header width; a header row made entirely of `th` cells
/// is not emitted.
pub fn extract_tables(
    html: &Html,
    request: &ExtractionRequest,
) -> Result<Vec<ExtractedItem>, ExtractionError> {
    let roots = scope(html, request.selector.as_deref(), None)?;
    let Some(table_sel) = static_selector("table") else {
        return Ok(Vec::new());
    };

    let mut tables: Vec<ElementRef<'_>> = Vec::new();
    for root in roots {
        let found = if root.value().name() == "table" {
            vec![root]
        } else {
            root.select(&table_sel).collect()
        };
        for table in found {
            if !tables.iter().any(|t| t.id() == table.id()) {
                tables.push(table);
            }
        }
    }

    let mut items = Vec::new();
    for (table_index, table) in tables.into_iter().enumerate() {
        for cells in table_rows(table) {
            if items.len() >= request.limits.max_results {
                return Ok(items);
            }
            items.push(ExtractedItem::TableRow { table_index, cells });
        }
    }
    Ok(items)
}

struct Row {
    cells: Vec<String>,
    any_header: bool,
    all_header: bool,
}

/// Rows belonging to `table` itself, not to tables nested inside it
fn raw_rows(table: ElementRef<'_>) -> Vec<Row> {
    let Some(tr) = static_selector("tr") else {
        return Vec::new();
    };
    table
        .select(&tr)
        .filter(|row| owning_table(*row).map(|t| t.id()) == Some(table.id()))
        .map(|row| {
            let cells: Vec<ElementRef<'_>> = row
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|c| matches!(c.value().name(), "td" | "th"))
                .collect();
            let headers = cells.iter().filter(|c| c.value().name() == "th").count();
            Row {
                any_header: headers > 0,
                all_header: headers > 0 && headers == cells.len(),
                cells: cells.into_iter().map(element_text).collect(),
            }
        })
        .collect()
}

fn owning_table(row: ElementRef<'_>) -> Option<ElementRef<'_>> {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
}

fn table_rows(table: ElementRef<'_>) -> Vec<Vec<String>> {
    let rows = raw_rows(table);
    let header = rows.iter().position(|r| r.any_header);
    let width = match header {
        Some(i) => rows[i].cells.len(),
        None => rows.first().map_or(0, |r| r.cells.len()),
    };

    rows.into_iter()
        .enumerate()
        .filter(|(i, row)| !(Some(*i) == header && row.all_header))
        .map(|(_, row)| row.cells)
        .filter(|cells| cells.iter().any(|c| !c.is_empty()))
        .map(|mut cells| {
            if cells.len() < width {
                cells.resize(width, String::new());
            }
            cells
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractionMode;
    use url::Url;

    fn rows(body: &str, selector: Option<&str>) -> Vec<(usize, Vec<String>)> {
        let html = Html::parse_document(body);
        let req = ExtractionRequest::new(
            Url::parse("https://example.com/").unwrap(),
            ExtractionMode::Table,
        )
        .with_selector(selector.map(str::to_string));
        extract_tables(&html, &req)
            .unwrap()
            .into_iter()
            .filter_map(|i| match i {
                ExtractedItem::TableRow { table_index, cells } => Some((table_index, cells)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_header_row_skipped_and_short_row_padded() {
        let found = rows(
            "<table><tr><th>A</th><th>B</th></tr><tr><td>1</td></tr></table>",
            None,
        );
        assert_eq!(found, vec![(0, vec!["1".to_string(), String::new()])]);
    }

    #[test]
    fn test_first_row_sets_width_without_headers() {
        let found = rows(
            "<table><tr><td>a</td><td>b</td><td>c</td></tr><tr><td>d</td></tr></table>",
            None,
        );
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].1, vec!["d", "", ""]);
    }

    #[test]
    fn test_row_header_cells_kept() {
        // A th used as a row label is data, not a header row
        let found = rows(
            "<table><tr><th>Name</th><th>Age</th></tr><tr><th>Ann</th><td>30</td></tr></table>",
            None,
        );
        assert_eq!(found, vec![(0, vec!["Ann".to_string(), "30".to_string()])]);
    }

    #[test]
    fn test_nested_table_rows_not_duplicated() {
        let found = rows(
            "<table><tr><td>outer</td><td><table><tr><td>inner</td></tr></table></td></tr></table>",
            None,
        );
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].0, 0);
        assert_eq!(found[0].1[0], "outer");
        assert_eq!(found[1], (1, vec!["inner".to_string()]));
    }

    #[test]
    fn test_selector_picks_tables() {
        let body = "<table id='a'><tr><td>x</td></tr></table><div class='wrap'><table><tr><td>y</td></tr></table></div>";
        assert_eq!(rows(body, Some("#a")), vec![(0, vec!["x".to_string()])]);
        assert_eq!(rows(body, Some(".wrap")), vec![(0, vec!["y".to_string()])]);
    }

    #[test]
    fn test_empty_rows_skipped() {
        let found = rows("<table><tr><td></td><td> </td></tr><tr><td>v</td></tr></table>", None);
        assert_eq!(found, vec![(0, vec!["v".to_string(), String::new()])]);
    }
}
