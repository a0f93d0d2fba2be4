use crate::{
    config::LoaderConfig,
    diagnostics::{DiagnosticKind, Diagnostics, Severity},
    error::{EcgError, Result},
    signal::RawRow,
};
use csv::ReaderBuilder;
use std::{fs::File, io::Read, path::Path};

const EXPECTED_FIELDS: usize = 2;

/// Read a two-column (time, voltage) file into raw rows.
///
/// Lines with more than two fields are skipped with a warning; short lines
/// keep `None` for the missing cells. No numeric validation happens here.
pub fn read_raw_rows(
    path: &Path,
    cfg: &LoaderConfig,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<RawRow>> {
    let file = File::open(path).map_err(|source| EcgError::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;
    let delimiter = cfg.delimiter_byte()?;
    let rows = read_raw_rows_from_reader(file, delimiter, cfg.has_header, diagnostics)
        .map_err(|source| EcgError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
    log::info!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

pub fn read_raw_rows_from_reader<R: Read>(
    reader: R,
    delimiter: u8,
    has_header: bool,
    diagnostics: &mut Diagnostics,
) -> std::result::Result<Vec<RawRow>, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(has_header)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in reader.byte_records() {
        let record = result?;
        if record.len() > EXPECTED_FIELDS {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            diagnostics.emit(
                Severity::Warning,
                DiagnosticKind::MalformedRow {
                    line,
                    fields: record.len(),
                },
                format!(
                    "Skipping line {}: expected {} fields, saw {}",
                    line,
                    EXPECTED_FIELDS,
                    record.len()
                ),
            );
            continue;
        }
        // Undecodable bytes become U+FFFD and fail numeric coercion later.
        let cell = |idx: usize| {
            record
                .get(idx)
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        };
        rows.push(RawRow {
            time: cell(0),
            voltage: cell(1),
        });
    }
    Ok(rows)
}
