//! Response shapes for the Spotify Web API endpoints we read.
//!
//! Every leaf is optional: a field the platform omits or nulls out must not
//! fail decoding, it just makes the track unusable later on.

use serde::Deserialize;

/// `GET /playlists/{id}` (partial, we only need the first page of tracks).
#[derive(Debug, Deserialize)]
pub struct PlaylistResponse {
    pub tracks: PlaylistTracks,
}

/// One page of playlist items.
#[derive(Debug, Deserialize)]
pub struct PlaylistTracks {
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
    /// URL of the following page, if any. Not followed.
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistItem {
    /// Null for episodes or tracks removed from the catalog.
    #[serde(default)]
    pub track: Option<TrackRef>,
}

#[derive(Debug, Deserialize)]
pub struct TrackRef {
    /// Null for local files.
    #[serde(default)]
    pub id: Option<String>,
}

/// `GET /tracks/{id}`
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct TrackInfo {
    pub id: Option<String>,
    pub name: Option<String>,
    pub duration_ms: Option<i64>,
    pub popularity: Option<i64>,
    pub album: Option<AlbumInfo>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AlbumInfo {
    pub name: Option<String>,
    pub release_date: Option<String>,
    pub artists: Vec<ArtistInfo>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ArtistInfo {
    pub name: Option<String>,
}

/// `GET /audio-features?ids={id}` wraps its results in a list.
#[derive(Debug, Deserialize)]
pub struct AudioFeaturesResponse {
    #[serde(default)]
    pub audio_features: Vec<Option<AudioFeatures>>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AudioFeatures {
    pub acousticness: Option<f64>,
    pub danceability: Option<f64>,
    pub energy: Option<f64>,
    pub instrumentalness: Option<f64>,
    pub liveness: Option<f64>,
    pub loudness: Option<f64>,
    pub speechiness: Option<f64>,
    pub tempo: Option<f64>,
    pub time_signature: Option<i64>,
    pub valence: Option<f64>,
}

impl TrackInfo {
    /// Album artist used as the track's primary artist.
    pub fn primary_artist(&self) -> Option<&str> {
        self.album
            .as_ref()?
            .artists
            .first()?
            .name
            .as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_deserialize() {
        let json = r#"{
            "name": "All Out 70s",
            "tracks": {
                "items": [
                    {"track": {"id": "abc"}},
                    {"track": null},
                    {"track": {"id": null}}
                ],
                "next": "https://api.spotify.com/v1/playlists/x/tracks?offset=100"
            }
        }"#;
        let p: PlaylistResponse = serde_json::from_str(json).unwrap();
        assert_eq!(p.tracks.items.len(), 3);
        assert_eq!(p.tracks.items[0].track.as_ref().unwrap().id.as_deref(), Some("abc"));
        assert!(p.tracks.items[1].track.is_none());
        assert!(p.tracks.next.is_some());
    }

    #[test]
    fn test_track_missing_fields() {
        let json = r#"{"id": "abc", "name": "Dreams", "album": {"artists": []}}"#;
        let t: TrackInfo = serde_json::from_str(json).unwrap();
        assert_eq!(t.name.as_deref(), Some("Dreams"));
        assert!(t.popularity.is_none());
        assert!(t.primary_artist().is_none());
    }

    #[test]
    fn test_audio_features_null_entry() {
        let json = r#"{"audio_features": [null]}"#;
        let r: AudioFeaturesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(r.audio_features.len(), 1);
        assert!(r.audio_features[0].is_none());
    }

    #[test]
    fn test_audio_features_null_field() {
        let json = r#"{"audio_features": [{"tempo": 120.5, "time_signature": 4, "energy": null}]}"#;
        let r: AudioFeaturesResponse = serde_json::from_str(json).unwrap();
        let f = r.audio_features[0].as_ref().unwrap();
        assert_eq!(f.tempo, Some(120.5));
        assert_eq!(f.time_signature, Some(4));
        assert!(f.energy.is_none());
    }
}
