//! Export the per-grid-point likelihood table.
//!
//! One row per scored grid point, in enumeration order, with a blank line
//! whenever [Fe/H] changes so the file reads as one block per metallicity.
//! Undefined theory values are written as `nan`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{AppError, EXIT_INPUT};
use crate::fit::{GridPointRecord, GridSearch};

const HEADER: &str = "# age[Gyr]      feh      afe      likelihood       theory1       theory2       theory3       theory4  used";

/// Write the results table to `path`.
pub fn write_results_table(path: &Path, search: &GridSearch) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(
            EXIT_INPUT,
            format!("Failed to create results file '{}': {e}", path.display()),
        )
    })?;
    let mut out = BufWriter::new(file);
    write_results(&mut out, search)?;
    out.flush()
        .map_err(|e| AppError::new(EXIT_INPUT, format!("Failed to write results file: {e}")))
}

/// Write the results table to any writer.
pub fn write_results<W: Write>(out: &mut W, search: &GridSearch) -> Result<(), AppError> {
    let io_err = |e: std::io::Error| AppError::new(EXIT_INPUT, format!("Failed to write results table: {e}"));

    writeln!(out, "{HEADER}").map_err(io_err)?;
    let mut previous_feh: Option<f64> = None;
    for record in &search.records {
        if previous_feh.is_some_and(|feh| feh != record.feh()) {
            writeln!(out).map_err(io_err)?;
        }
        previous_feh = Some(record.feh());
        writeln!(out, "{}", format_row(record)).map_err(io_err)?;
    }
    Ok(())
}

fn format_row(record: &GridPointRecord) -> String {
    let theory: Vec<String> = record
        .theory
        .iter()
        .map(|t| match t {
            Some(v) => format!("{v:>13.6}"),
            None => format!("{:>13}", "nan"),
        })
        .collect();
    format!(
        "{:>10.4} {:>8.3} {:>8.3} {:>15.6e} {} {:>5}",
        record.age_gyr(),
        record.feh(),
        record.afe(),
        record.likelihood.value,
        theory.join(" "),
        record.likelihood.used
    )
}
