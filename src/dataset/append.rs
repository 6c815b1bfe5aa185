//! Merging previously exported datasets.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use walkdir::WalkDir;

use super::builder::ensure_directory;
use super::record::{ARTIST_COLUMN, NAME_COLUMN};
use super::table::Dataset;
use super::{DatasetError, Result};

/// Subdirectory of the CSV directory holding the files to merge.
pub const APPEND_DIR: &str = "APPEND";

/// Filesystem-safe second-precision stamp: `2026_10_19 14_03_59`.
const TIMESTAMP_FORMAT: &str = "%Y_%m_%d %H_%M_%S";

/// Result of an append run.
#[derive(Debug)]
pub struct AppendResult {
    pub output: PathBuf,
    pub files_merged: usize,
    pub duplicates_dropped: usize,
    pub rows_written: usize,
}

/// `<directory>/<name> <timestamp>.csv`, with `_2`, `_3`, ... before the
/// extension for the `attempt`-th candidate.
pub fn append_output_path(directory: &Path, name: &str, at: NaiveDateTime, attempt: usize) -> PathBuf {
    let stamp = at.format(TIMESTAMP_FORMAT);
    let file_name = if attempt <= 1 {
        format!("{name} {stamp}.csv")
    } else {
        format!("{name} {stamp}_{attempt}.csv")
    };
    directory.join(file_name)
}

/// Create a new output file, never replacing an earlier one.
fn create_output(directory: &Path, name: &str, at: NaiveDateTime) -> Result<(PathBuf, File)> {
    let mut attempt = 1;
    loop {
        let path = append_output_path(directory, name, at, attempt);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                log::debug!("{} exists, trying next name", path.display());
                attempt += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Run `write` on a freshly created output; delete the file if it fails so
/// no partial output is left behind.
fn write_or_remove<F>(path: &Path, file: File, write: F) -> Result<()>
where
    F: FnOnce(File) -> Result<()>,
{
    match write(file) {
        Ok(()) => Ok(()),
        Err(e) => {
            if let Err(remove_err) = fs::remove_file(path) {
                log::warn!("Failed to remove partial output {}: {remove_err}", path.display());
            }
            Err(e)
        }
    }
}

/// `.csv` files directly inside `dir` (symlinks resolved), sorted by file name.
fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_csv = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if is_csv {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Merge every CSV in `<directory>/APPEND` into a new timestamped file in
/// `directory`, keeping the first row for each (Name, Artist) pair.
///
/// A missing APPEND folder is created so the user knows where to put files;
/// the run then fails with [`DatasetError::NoInputFiles`].
pub fn append_csv_files(directory: &Path, name: &str, with_index: bool) -> Result<AppendResult> {
    append_csv_files_at(directory, name, with_index, Local::now().naive_local())
}

pub(crate) fn append_csv_files_at(
    directory: &Path,
    name: &str,
    with_index: bool,
    at: NaiveDateTime,
) -> Result<AppendResult> {
    ensure_directory(directory)?;

    let append_dir = directory.join(APPEND_DIR);
    if !append_dir.exists() {
        fs::create_dir(&append_dir)?;
        println!(
            "Created {}. Copy the .csv files to be appended there.",
            append_dir.display()
        );
    } else if !append_dir.is_dir() {
        return Err(DatasetError::AppendDirectoryMissing(append_dir));
    }

    let files = list_csv_files(&append_dir)?;
    if files.is_empty() {
        return Err(DatasetError::NoInputFiles(append_dir));
    }

    let mut tables = Vec::with_capacity(files.len());
    for path in &files {
        let table = Dataset::read_csv(path)?;
        table.require_columns(&[NAME_COLUMN, ARTIST_COLUMN], &path.display().to_string())?;
        log::info!("Read {} rows from {}", table.len(), path.display());
        tables.push(table);
    }

    let mut merged = Dataset::concat(tables, true);
    let duplicates_dropped = merged.drop_duplicates(&[NAME_COLUMN, ARTIST_COLUMN])?;

    let (output, file) = create_output(directory, name, at)?;
    write_or_remove(&output, file, |file| {
        merged.write_to(csv::Writer::from_writer(file), with_index)
    })?;
    log::info!("{} created", output.display());

    Ok(AppendResult {
        output,
        files_merged: files.len(),
        duplicates_dropped,
        rows_written: merged.len(),
    })
}
