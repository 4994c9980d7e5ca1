//! Plain-text table output for one page of records

use std::collections::BTreeSet;

use tabula::{ListEngine, Record, Value};
use tabula_api::ID_FIELD;

const MAX_CELL_WIDTH: usize = 32;

/// Column order: `id` first, then every other field name alphabetically
pub fn columns(rows: &[&Record]) -> Vec<String> {
    let names: BTreeSet<&String> = rows.iter().flat_map(|row| row.keys()).collect();
    let mut columns: Vec<String> = names
        .into_iter()
        .filter(|name| name.as_str() != ID_FIELD)
        .cloned()
        .collect();
    if rows.iter().any(|row| row.contains_key(ID_FIELD)) {
        columns.insert(0, ID_FIELD.to_string());
    }
    columns
}

fn cell(value: Option<&Value>) -> String {
    let text = match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(Value::search_text)
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.search_text(),
    };
    if text.chars().count() > MAX_CELL_WIDTH {
        let cut: String = text.chars().take(MAX_CELL_WIDTH - 1).collect();
        format!("{}…", cut)
    } else {
        text
    }
}

pub fn render_table(rows: &[&Record]) -> String {
    let columns = columns(rows);
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| columns.iter().map(|c| cell(row.get(c))).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |values: &[String]| {
        values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:<width$}", v, width = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(&columns));
    out.push('\n');
    out.push_str(&line(
        &widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>(),
    ));
    out.push('\n');
    for row in &cells {
        out.push_str(&line(row));
        out.push('\n');
    }
    out
}

/// Summary line under the table, e.g. "showing 11–20 of 42"
pub fn summary(engine: &ListEngine) -> String {
    format!(
        "showing {}–{} of {} (page {}/{})",
        engine.start_index(),
        engine.end_index(),
        engine.total_items(),
        engine.current_page(),
        engine.total_pages()
    )
}

pub fn render_page(engine: &ListEngine) -> String {
    let rows = engine.page_rows();
    let mut out = if rows.is_empty() {
        "no matching records\n".to_string()
    } else {
        render_table(&rows)
    };
    out.push_str(&summary(engine));
    out.push('\n');
    out
}
