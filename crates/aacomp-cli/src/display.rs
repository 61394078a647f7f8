use aacomp::core::utils::residues::three_letter_code;
use aacomp::engine::aggregate::{FrequencyTable, RatioTable, ResidueMeans};
use std::fmt::Write;

const PRECISION: usize = 4;

/// Formats the frequency table with one row per residue and one column per protein.
pub fn frequency_table(table: &FrequencyTable) -> String {
    let labels: Vec<String> = table.residues().iter().map(|s| residue_label(*s)).collect();
    let rows: Vec<Vec<f64>> = (0..table.residues().len())
        .map(|idx| table.row(idx).unwrap_or_default())
        .collect();
    render("Residue", table.proteins(), &labels, &rows)
}

/// Formats the ratio table with one row per protein and one column per ratio.
pub fn ratio_table(table: &RatioTable) -> String {
    let columns: Vec<String> = table.ratio_names().iter().map(|n| n.to_string()).collect();
    let rows: Vec<Vec<f64>> = (0..table.proteins().len())
        .map(|idx| {
            table
                .row(idx)
                .map(|row| row.as_slice().to_vec())
                .unwrap_or_default()
        })
        .collect();
    render("Protein", &columns, table.proteins(), &rows)
}

pub fn residue_means(means: &ResidueMeans) -> String {
    let labels: Vec<String> = means.iter().map(|(s, _)| residue_label(s)).collect();
    let rows: Vec<Vec<f64>> = means.iter().map(|(_, mean)| vec![mean]).collect();
    render("Residue", &["Mean".to_string()], &labels, &rows)
}

fn residue_label(symbol: char) -> String {
    match three_letter_code(symbol) {
        Some(code) => format!("{} ({})", symbol, code),
        None => symbol.to_string(),
    }
}

fn render(corner: &str, columns: &[String], labels: &[String], rows: &[Vec<f64>]) -> String {
    let label_width = labels
        .iter()
        .map(|l| l.chars().count())
        .chain(std::iter::once(corner.len()))
        .max()
        .unwrap_or(0);
    let cell_width = columns
        .iter()
        .map(|c| c.chars().count())
        .max()
        .unwrap_or(0)
        .max(PRECISION + 2);

    let mut out = String::new();
    let _ = write!(out, "{:<label_width$}", corner);
    for column in columns {
        let _ = write!(out, "  {:>cell_width$}", column);
    }
    out.push('\n');

    for (label, values) in labels.iter().zip(rows) {
        let _ = write!(out, "{:<label_width$}", label);
        for value in values {
            let _ = write!(out, "  {:>cell_width$.PRECISION$}", value);
        }
        out.push('\n');
    }
    out
}
