pub mod client;
pub mod models;

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use models::{AudioFeatures, PlaylistTracks, TrackInfo};

pub use client::WebApiClient;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
    #[error("No access token. Set SPOTIFY_ACCESS_TOKEN or pass --token.")]
    MissingToken,
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// The three Spotify Web API reads the dataset builder depends on.
///
/// Implementations are expected to be already authenticated. Nothing here
/// retries or throttles; pacing is the caller's job.
pub trait SpotifyApi {
    /// First page of a playlist's items.
    fn playlist_tracks(&self, user_id: &str, playlist_id: &str) -> Result<PlaylistTracks>;

    /// Track metadata.
    fn track(&self, track_id: &str) -> Result<TrackInfo>;

    /// Audio features. `None` when the platform returns a null entry.
    fn audio_features(&self, track_id: &str) -> Result<Option<AudioFeatures>>;
}

static PLAYLIST_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://open\.spotify\.com/(?:[a-z-]+/)?playlist/|spotify:playlist:)(?P<id>[A-Za-z0-9]+)")
        .unwrap()
});

/// Reduce a playlist reference to its bare id.
///
/// Accepts bare ids, `spotify:playlist:<id>` URIs and
/// `https://open.spotify.com/playlist/<id>?si=...` share links, so the same
/// playlist written two ways compares equal.
pub fn normalize_playlist_id(reference: &str) -> String {
    let trimmed = reference.trim();
    match PLAYLIST_URL_RE.captures(trimmed) {
        Some(caps) => caps["id"].to_string(),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_bare_id() {
        assert_eq!(normalize_playlist_id("37i9dQZF1DWWmGB2u14f8m"), "37i9dQZF1DWWmGB2u14f8m");
        assert_eq!(normalize_playlist_id("  37i9dQZF1DWWmGB2u14f8m \n"), "37i9dQZF1DWWmGB2u14f8m");
    }

    #[test]
    fn test_normalize_uri() {
        assert_eq!(
            normalize_playlist_id("spotify:playlist:37i9dQZF1DWWmGB2u14f8m"),
            "37i9dQZF1DWWmGB2u14f8m"
        );
    }

    #[test]
    fn test_normalize_share_link() {
        assert_eq!(
            normalize_playlist_id("https://open.spotify.com/playlist/37i9dQZF1DWWmGB2u14f8m?si=a1b2c3"),
            "37i9dQZF1DWWmGB2u14f8m"
        );
        assert_eq!(
            normalize_playlist_id("https://open.spotify.com/intl-de/playlist/37i9dQZF1DWWmGB2u14f8m"),
            "37i9dQZF1DWWmGB2u14f8m"
        );
    }

    #[test]
    fn test_normalize_leaves_other_urls_alone() {
        assert_eq!(
            normalize_playlist_id("https://open.spotify.com/album/abc"),
            "https://open.spotify.com/album/abc"
        );
    }
}
