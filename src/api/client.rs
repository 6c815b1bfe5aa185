//! Blocking Spotify Web API client.

use std::time::Duration;

use serde::de::DeserializeOwned;

use super::models::{AudioFeatures, AudioFeaturesResponse, PlaylistResponse, PlaylistTracks, TrackInfo};
use super::{ApiError, Result, SpotifyApi};

pub const DEFAULT_BASE_URL: &str = "https://api.spotify.com/v1";

/// Only the fields the lister reads.
const PLAYLIST_FIELDS: &str = "tracks.items(track(id)),tracks.next";

pub struct WebApiClient {
    agent: ureq::Agent,
    base_url: String,
    token: String,
}

impl WebApiClient {
    /// Build a client around an access token obtained elsewhere.
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        if token.trim().is_empty() {
            return Err(ApiError::MissingToken);
        }
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Ok(Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.trim().to_string(),
        })
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        log::debug!("GET {url}");

        let mut response = self
            .agent
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .call()
            .map_err(|e| match e {
                ureq::Error::StatusCode(status) => ApiError::Status {
                    status,
                    url: url.to_string(),
                },
                other => ApiError::Transport {
                    url: url.to_string(),
                    message: other.to_string(),
                },
            })?;

        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        serde_json::from_str(&body).map_err(|e| ApiError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

impl SpotifyApi for WebApiClient {
    fn playlist_tracks(&self, user_id: &str, playlist_id: &str) -> Result<PlaylistTracks> {
        log::debug!("Listing playlist {playlist_id} for user {user_id}");
        let url = format!(
            "{}/playlists/{playlist_id}?fields={PLAYLIST_FIELDS}",
            self.base_url
        );
        let playlist: PlaylistResponse = self.get_json(&url)?;
        Ok(playlist.tracks)
    }

    fn track(&self, track_id: &str) -> Result<TrackInfo> {
        let url = format!("{}/tracks/{track_id}", self.base_url);
        self.get_json(&url)
    }

    fn audio_features(&self, track_id: &str) -> Result<Option<AudioFeatures>> {
        let url = format!("{}/audio-features?ids={track_id}", self.base_url);
        let response: AudioFeaturesResponse = self.get_json(&url)?;
        Ok(response.audio_features.into_iter().next().flatten())
    }
}
