use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::{Writer, WriterBuilder};

use crate::models::{ErrorRecord, TagCategory, WorkId, WorkRecord};
use crate::Result;

pub const TEXT_HEADER: [&str; 2] = ["work_id", "text"];
pub const META_HEADER: [&str; 7] = [
    "work_id",
    "title",
    "rating",
    "category",
    "relationship",
    "character",
    "freeform",
];
pub const ERROR_HEADER: [&str; 2] = ["work_id", "error"];
pub const IDS_HEADER: [&str; 1] = ["work_id"];

/// Separator for multi-valued tag columns.
pub const TAG_SEPARATOR: &str = ", ";

/// Tag columns of the metadata file, in column order.
const META_TAGS: [TagCategory; 5] = [
    TagCategory::Rating,
    TagCategory::Category,
    TagCategory::Relationship,
    TagCategory::Character,
    TagCategory::Freeform,
];

/// A CSV stream that gets its header exactly once.
pub struct CsvSink<W: Write> {
    writer: Writer<W>,
    rows: usize,
}

impl CsvSink<File> {
    /// Opens `path` for appending. The header is written only if the file is empty.
    pub fn append(path: &Path, header: &[&str]) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let is_empty = file.metadata()?.len() == 0;
        Self::from_writer(file, is_empty.then_some(header))
    }

    /// Truncates `path` and starts it with `header`.
    pub fn create(path: &Path, header: &[&str]) -> Result<Self> {
        Self::from_writer(File::create(path)?, Some(header))
    }
}

impl<W: Write> CsvSink<W> {
    pub fn from_writer(writer: W, header: Option<&[&str]>) -> Result<Self> {
        let mut writer = WriterBuilder::new().from_writer(writer);
        if let Some(header) = header {
            writer.write_record(header)?;
            writer.flush()?;
        }
        Ok(Self { writer, rows: 0 })
    }

    pub fn write_row<I, T>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.writer.write_record(row)?;
        // Keep the file current so an interrupted run loses nothing already scraped.
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    /// Data rows written through this sink, header excluded.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|err| std::io::Error::other(err.to_string()).into())
    }
}

/// Where an extraction run sends its results.
pub trait RecordSink {
    fn record(&mut self, record: &WorkRecord) -> Result<()>;
    fn error(&mut self, error: &ErrorRecord) -> Result<()>;
}

/// The text, metadata and error CSV files of an extraction run.
pub struct CsvOutputs {
    pub text_path: PathBuf,
    pub meta_path: PathBuf,
    pub error_path: PathBuf,
    text: CsvSink<File>,
    meta: CsvSink<File>,
    errors: CsvSink<File>,
}

impl CsvOutputs {
    pub fn open(text_path: PathBuf, meta_path: PathBuf, error_path: PathBuf) -> Result<Self> {
        Ok(Self {
            text: CsvSink::append(&text_path, &TEXT_HEADER)?,
            meta: CsvSink::append(&meta_path, &META_HEADER)?,
            errors: CsvSink::append(&error_path, &ERROR_HEADER)?,
            text_path,
            meta_path,
            error_path,
        })
    }
}

impl RecordSink for CsvOutputs {
    fn record(&mut self, record: &WorkRecord) -> Result<()> {
        let mut meta_row = vec![record.id.to_string(), record.title.clone()];
        meta_row.extend(META_TAGS.iter().map(|c| record.tags.get(*c).join(TAG_SEPARATOR)));
        self.meta.write_row(&meta_row)?;
        self.text.write_row([record.id.as_str(), record.body.as_str()])?;
        Ok(())
    }

    fn error(&mut self, error: &ErrorRecord) -> Result<()> {
        self.errors.write_row([error.id.as_str(), error.message.as_str()])
    }
}

/// Rewrites `path` with a single `work_id` column.
pub fn write_work_ids(path: &Path, ids: &[WorkId]) -> Result<()> {
    let mut sink = CsvSink::create(path, &IDS_HEADER)?;
    for id in ids {
        sink.write_row([id.as_str()])?;
    }
    Ok(())
}
