use crate::error::Result;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(BufWriter::new(File::create(path)?));
    rows.iter().try_for_each(|row| wtr.serialize(row))?;
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, value)?;
    out.flush()?;
    Ok(())
}

pub fn write_text(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text)?;
    Ok(())
}

/// Markdown rendering of the first `max_rows` rows, with a footer when the
/// table was cut short.
pub fn render_preview<T: Tabled>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize) -> String {
    let mut lines = vec![title.to_string()];
    lines.extend(note.map(|n| format!("({})", n)));
    lines.push(String::new());
    let shown = &rows[..rows.len().min(max_rows)];
    if shown.is_empty() {
        lines.push("(no rows)".to_string());
    } else {
        lines.push(Table::new(shown).with(Style::markdown()).to_string());
        if shown.len() < rows.len() {
            lines.push(format!("(showing {} of {} rows)", shown.len(), rows.len()));
        }
    }
    lines.join("\n")
}

pub fn preview_table<T: Tabled>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize) {
    println!("{}\n", render_preview(title, note, rows, max_rows));
}
