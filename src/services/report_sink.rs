use std::{
    fs::{File, OpenOptions},
    path::{Path, PathBuf},
};

use crate::{
    configuration::PassthroughColumn,
    domain::{metric_fields, ReportRow},
};

#[derive(Debug, Clone, PartialEq)]
pub struct ReportColumn {
    pub field: String,
    pub title: String,
}

impl ReportColumn {
    pub fn new(field: impl Into<String>, title: impl Into<String>) -> Self {
        ReportColumn {
            field: field.into(),
            title: title.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("could not open report file {path:?}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write report row: {0}")]
    Write(#[from] csv::Error),
    #[error("could not flush report file: {0}")]
    Flush(#[from] std::io::Error),
}

/// Report columns: the audited url, the pass-through columns, then every metric.
pub fn report_schema(passthrough: &[PassthroughColumn]) -> Vec<ReportColumn> {
    let mut schema = vec![ReportColumn::new("url", "Website")];
    schema.extend(
        passthrough
            .iter()
            .map(|column| ReportColumn::new(&column.field, &column.title)),
    );
    schema.extend(
        metric_fields()
            .iter()
            .map(|field| ReportColumn::new(&field.name, &field.title)),
    );
    schema
}

/// CSV report with a fixed column layout.
///
/// The file is truncated and the header written on the first append only.
/// Every row is flushed right away so an interrupted run keeps what it had.
pub struct ReportSink {
    path: PathBuf,
    schema: Vec<ReportColumn>,
    writer: Option<csv::Writer<File>>,
}

impl ReportSink {
    pub fn new<P: AsRef<Path>>(path: P, schema: Vec<ReportColumn>) -> Self {
        ReportSink {
            path: path.as_ref().to_path_buf(),
            schema,
            writer: None,
        }
    }

    /// Writes `row` laid out against the schema. Unknown keys are dropped,
    /// schema fields missing from `row` are left blank.
    pub fn append(&mut self, row: &ReportRow) -> Result<(), SinkError> {
        let mut writer = match self.writer.take() {
            Some(writer) => writer,
            None => self.open()?,
        };

        let result = write_row(&mut writer, &self.schema, row);
        self.writer = Some(writer);
        result
    }

    fn open(&self) -> Result<csv::Writer<File>, SinkError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|source| SinkError::Open {
                path: self.path.clone(),
                source,
            })?;

        let mut writer = csv::WriterBuilder::new().from_writer(file);
        writer.write_record(self.schema.iter().map(|column| column.title.as_str()))?;
        writer.flush()?;

        log::info!("Writing report to {:?}", self.path);
        Ok(writer)
    }
}

fn write_row(
    writer: &mut csv::Writer<File>,
    schema: &[ReportColumn],
    row: &ReportRow,
) -> Result<(), SinkError> {
    writer.write_record(
        schema
            .iter()
            .map(|column| row.get(&column.field).map(String::as_str).unwrap_or("")),
    )?;
    writer.flush()?;
    Ok(())
}
