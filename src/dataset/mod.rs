pub mod append;
pub mod builder;
pub mod labels;
pub mod record;
pub mod table;

use std::path::PathBuf;

use thiserror::Error;

use crate::api::ApiError;

pub use append::{append_csv_files, AppendResult, APPEND_DIR};
pub use builder::{BuildResult, DatasetBuilder, Pacing};
pub use labels::{LabelEntry, LabelSet, LabelValidation, LabelValue};
pub use record::{TrackRecord, FIXED_COLUMNS};
pub use table::Dataset;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Directory {0} does not exist. Please pass a valid directory.")]
    TargetDirectory(PathBuf),
    #[error("Invalid labels for playlist {playlist}: {reason}")]
    MalformedLabels { playlist: String, reason: String },
    #[error("No playlists given")]
    NoPlaylists,
    #[error("Spotify API error: {0}")]
    Api(#[from] ApiError),
    #[error("{0} is not a directory, cannot read .csv files from it")]
    AppendDirectoryMissing(PathBuf),
    #[error("No .csv files found in {0}. Please insert .csv files to merge.")]
    NoInputFiles(PathBuf),
    #[error("Column '{column}' missing from {context}")]
    MissingColumn { column: String, context: String },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a [`DatasetError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad directory or label input; raised before any side effect.
    Configuration,
    /// Failure reported by the platform client, passed through as is.
    ExternalApi,
    /// Nothing to merge.
    NoInput,
    /// Reading or writing files.
    Io,
}

impl DatasetError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TargetDirectory(_) | Self::MalformedLabels { .. } | Self::NoPlaylists => {
                ErrorKind::Configuration
            }
            Self::Api(_) => ErrorKind::ExternalApi,
            Self::AppendDirectoryMissing(_) | Self::NoInputFiles(_) => ErrorKind::NoInput,
            Self::MissingColumn { .. } | Self::Csv(_) | Self::Io(_) => ErrorKind::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, DatasetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(DatasetError::TargetDirectory("/nope".into()).kind(), ErrorKind::Configuration);
        assert_eq!(DatasetError::NoPlaylists.kind(), ErrorKind::Configuration);
        assert_eq!(DatasetError::Api(ApiError::MissingToken).kind(), ErrorKind::ExternalApi);
        assert_eq!(DatasetError::NoInputFiles("/x/APPEND".into()).kind(), ErrorKind::NoInput);
        assert_eq!(DatasetError::AppendDirectoryMissing("/x/APPEND".into()).kind(), ErrorKind::NoInput);
    }

    #[test]
    fn test_no_input_message_names_directory() {
        let err = DatasetError::NoInputFiles("/data/APPEND".into());
        assert!(err.to_string().contains("/data/APPEND"));
    }
}
