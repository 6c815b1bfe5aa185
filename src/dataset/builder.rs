use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use super::labels::{LabelSet, LabelValidation};
use super::record::{TrackRecord, ARTIST_COLUMN, FIXED_COLUMNS, NAME_COLUMN};
use super::table::Dataset;
use super::{DatasetError, Result};
use crate::api::{normalize_playlist_id, SpotifyApi};

/// Pauses that keep a run under the platform's rate limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// After each track fetch.
    pub track_delay: Duration,
    /// After each playlist of a multi-playlist build.
    pub playlist_delay: Duration,
}

impl Pacing {
    pub const NONE: Pacing = Pacing {
        track_delay: Duration::ZERO,
        playlist_delay: Duration::ZERO,
    };

    pub fn from_millis(track_ms: u64, playlist_ms: u64) -> Self {
        Self {
            track_delay: Duration::from_millis(track_ms),
            playlist_delay: Duration::from_millis(playlist_ms),
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::from_millis(300, 5000)
    }
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}

/// Result of a multi-playlist build.
#[derive(Debug)]
pub struct BuildResult {
    pub output: PathBuf,
    pub playlists_processed: usize,
    pub duplicate_playlists: usize,
    pub tracks_skipped: usize,
    pub duplicates_dropped: usize,
    pub rows_written: usize,
}

/// Fails unless `path` is an existing directory.
pub(crate) fn ensure_directory(path: &Path) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(DatasetError::TargetDirectory(path.to_path_buf()))
    }
}

/// Assembles playlist datasets from the Spotify API and writes them out.
pub struct DatasetBuilder<A> {
    api: A,
    user_id: String,
    csv_directory: PathBuf,
    csv_name: String,
    pacing: Pacing,
    write_index: bool,
}

impl<A: SpotifyApi> DatasetBuilder<A> {
    pub fn new(
        api: A,
        user_id: impl Into<String>,
        csv_directory: impl Into<PathBuf>,
        csv_name: impl Into<String>,
    ) -> Self {
        Self {
            api,
            user_id: user_id.into(),
            csv_directory: csv_directory.into(),
            csv_name: csv_name.into(),
            pacing: Pacing::default(),
            write_index: true,
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Whether written files start with the unnamed index column.
    pub fn with_index(mut self, write_index: bool) -> Self {
        self.write_index = write_index;
        self
    }

    /// Track ids of a playlist, in playlist order.
    ///
    /// Only the first page the API returns is read; longer playlists are
    /// truncated (with a warning).
    pub fn get_track_ids(&self, playlist_id: &str) -> Result<Vec<String>> {
        let playlist_id = normalize_playlist_id(playlist_id);
        let page = self.api.playlist_tracks(&self.user_id, &playlist_id)?;

        if page.next.is_some() {
            log::warn!(
                "Playlist {playlist_id} has more than one page of tracks; only the first {} are used",
                page.items.len()
            );
        }

        let mut ids = Vec::with_capacity(page.items.len());
        for (position, item) in page.items.into_iter().enumerate() {
            match item.track.and_then(|t| t.id) {
                Some(id) => ids.push(id),
                None => log::warn!("Playlist {playlist_id}: entry {position} has no track id, skipping"),
            }
        }
        Ok(ids)
    }

    /// Metadata and audio features for one track.
    ///
    /// `Ok(None)` means the platform left out a field we need; the track
    /// should be left out of the dataset. API failures are still errors.
    pub fn get_track_features(&self, track_id: &str) -> Result<Option<TrackRecord>> {
        let track = self.api.track(track_id)?;
        let features = self.api.audio_features(track_id)?;

        match TrackRecord::from_responses(track_id, &track, features.as_ref()) {
            Ok(record) => Ok(Some(record)),
            Err(missing) => {
                log::warn!(
                    "Missing {} for: {} {}. Skipping this track.",
                    missing.0,
                    track.name.as_deref().unwrap_or("unknown"),
                    track.primary_artist().unwrap_or("unknown"),
                );
                Ok(None)
            }
        }
    }

    /// Dataset for one playlist: fixed columns, then the playlist's labels
    /// sorted by name and repeated on every row.
    pub fn create_playlist_dataset(&self, playlist_id: &str, labels: &LabelSet) -> Result<Dataset> {
        self.build_playlist(playlist_id, labels).map(|(dataset, _)| dataset)
    }

    fn build_playlist(&self, playlist_id: &str, labels: &LabelSet) -> Result<(Dataset, usize)> {
        let label_columns = match labels.validate() {
            LabelValidation::Empty => {
                log::info!("No additional playlist features for {playlist_id}. Dataset will be created without them.");
                Vec::new()
            }
            LabelValidation::Rejected { key, found } => {
                log::warn!(
                    "Label '{key}' for playlist {playlist_id} is a {found}; only strings, floats and integers are allowed. \
                     No additional playlist features will be added."
                );
                Vec::new()
            }
            accepted @ LabelValidation::Accepted(_) => accepted.columns(),
        };

        log::info!("Parsing playlist: {playlist_id}");
        let track_ids = self.get_track_ids(playlist_id)?;

        let mut dataset = Dataset::new(
            FIXED_COLUMNS
                .iter()
                .map(|c| c.to_string())
                .chain(label_columns.iter().map(|(name, _)| name.clone())),
        );
        let label_cells: Vec<String> = label_columns.iter().map(|(_, v)| v.to_string()).collect();

        let pb = ProgressBar::new(track_ids.len() as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} tracks ({eta} remaining) {msg}",
        ) {
            pb.set_style(style.progress_chars("=>-"));
        }
        pb.set_message(playlist_id.to_string());

        let mut skipped = 0;
        for track_id in &track_ids {
            let fetched = self.get_track_features(track_id);
            pb.inc(1);
            pause(self.pacing.track_delay);

            match fetched? {
                Some(record) => {
                    let mut cells = record.to_cells();
                    cells.extend(label_cells.iter().cloned());
                    dataset.push(cells);
                }
                None => skipped += 1,
            }
        }
        pb.finish_and_clear();

        log::info!(
            "Playlist {playlist_id}: {} tracks, {} skipped",
            dataset.len(),
            skipped
        );
        Ok((dataset, skipped))
    }

    /// Build every playlist in order, drop repeated (Name, Artist) pairs and
    /// write `<csv_directory>/<csv_name>.csv`, replacing any previous file.
    pub fn create_dataset(&self, playlists: &[(String, LabelSet)]) -> Result<BuildResult> {
        ensure_directory(&self.csv_directory)?;
        if playlists.is_empty() {
            return Err(DatasetError::NoPlaylists);
        }
        log::info!("Dataset will be saved in: {}", self.csv_directory.display());

        let mut seen: HashSet<String> = HashSet::new();
        let mut pending: Vec<(String, &LabelSet)> = Vec::new();
        for (playlist_id, labels) in playlists {
            let id = normalize_playlist_id(playlist_id);
            if seen.insert(id.clone()) {
                pending.push((id, labels));
            } else {
                log::debug!("Playlist {playlist_id} already listed, skipping");
            }
        }
        let duplicate_playlists = playlists.len() - pending.len();

        let mut tables = Vec::with_capacity(pending.len());
        let mut tracks_skipped = 0;
        for (i, (playlist_id, labels)) in pending.iter().enumerate() {
            let (dataset, skipped) = self.build_playlist(playlist_id, labels)?;
            tables.push(dataset);
            tracks_skipped += skipped;

            if i + 1 < pending.len() {
                pause(self.pacing.playlist_delay);
            }
        }

        let mut combined = Dataset::concat(tables, false);
        let duplicates_dropped = combined.drop_duplicates(&[NAME_COLUMN, ARTIST_COLUMN])?;

        let output = self.csv_directory.join(format!("{}.csv", self.csv_name));
        combined.write_csv(&output, self.write_index)?;
        log::info!("Dataset successfully created: {}", output.display());

        Ok(BuildResult {
            output,
            playlists_processed: pending.len(),
            duplicate_playlists,
            tracks_skipped,
            duplicates_dropped,
            rows_written: combined.len(),
        })
    }
}
