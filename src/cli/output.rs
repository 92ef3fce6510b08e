//! Table rendering for grids and key/value summaries

use console::style;
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::Table;

/// Render a `rows x cols` grid with X indices across and Y indices down.
///
/// Blank cells stay blank; `highlight` marks cells to emphasize.
pub fn grid_table<F>(rows: &[Vec<String>], highlight: F) -> Table
where
    F: Fn(usize, usize) -> bool,
{
    let width = rows.first().map(Vec::len).unwrap_or(0);
    let mut builder = Builder::default();

    let mut header = vec!["Y\\X".to_string()];
    header.extend((0..width).map(|x| x.to_string()));
    builder.push_record(header);

    for (y, row) in rows.iter().enumerate() {
        let mut record = vec![y.to_string()];
        record.extend(row.iter().enumerate().map(|(x, cell)| {
            if highlight(x, y) {
                style(cell).red().bold().to_string()
            } else {
                cell.clone()
            }
        }));
        builder.push_record(record);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table
}

/// Render label/value pairs as a two-column table
pub fn kv_table(pairs: &[(&str, String)]) -> Table {
    let mut builder = Builder::default();
    for (key, value) in pairs {
        builder.push_record([key.to_string(), value.clone()]);
    }
    let mut table = builder.build();
    table.with(Style::rounded());
    table
}

/// Count grid cells as text, with zeros shown as "."
pub fn count_cells<T: std::fmt::Display + PartialEq + Default>(rows: &[Vec<T>]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|c| {
                    if *c == T::default() {
                        ".".to_string()
                    } else {
                        c.to_string()
                    }
                })
                .collect()
        })
        .collect()
}

/// Section heading
pub fn heading(text: &str) {
    println!("{}", style(text).bold());
}
