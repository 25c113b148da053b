use std::{
    fs::File,
    path::{Path, PathBuf},
};

use crate::domain::InputRecord;

#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("could not open input file {path:?}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not read header row of {path:?}: {source}")]
    Header { path: PathBuf, source: csv::Error },
    #[error("input file {path:?} has no '{column}' column")]
    MissingColumn { path: PathBuf, column: String },
}

/// Reads every non blank row of a CSV file with a header row, in file order.
///
/// The `url_column` cell becomes [`InputRecord::url`], all other cells are kept
/// by header name. Rows with too few or too many cells are taken as they are,
/// and cells that are not valid UTF-8 are decoded lossily.
pub fn load_records<P: AsRef<Path>>(
    path: P,
    url_column: &str,
) -> Result<Vec<InputRecord>, LoaderError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoaderError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(file);

    let headers: Vec<String> = rdr
        .byte_headers()
        .map_err(|source| LoaderError::Header {
            path: path.to_path_buf(),
            source,
        })?
        .iter()
        .map(decode_cell)
        .collect();

    let url_index = headers
        .iter()
        .position(|header| header == url_column)
        .ok_or_else(|| LoaderError::MissingColumn {
            path: path.to_path_buf(),
            column: url_column.to_string(),
        })?;

    let mut records = Vec::new();
    for result in rdr.byte_records() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                log::error!("Skipping unreadable row in {:?}: {}", path, e);
                continue;
            }
        };

        if row.iter().all(<[u8]>::is_empty) {
            continue;
        }

        let url = row.get(url_index).map(decode_cell).unwrap_or_default();
        let fields = headers
            .iter()
            .zip(row.iter())
            .enumerate()
            .filter(|(index, _)| *index != url_index)
            .map(|(_, (header, cell))| (header.clone(), decode_cell(cell)))
            .collect();

        records.push(InputRecord { url, fields });
    }

    log::info!("Loaded {} records from {:?}", records.len(), path);
    Ok(records)
}

// Spreadsheet exports are often Latin-1
fn decode_cell(cell: &[u8]) -> String {
    String::from_utf8_lossy(cell).into_owned()
}
