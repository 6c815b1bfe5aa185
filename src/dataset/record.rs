use crate::api::models::{AudioFeatures, TrackInfo};

/// Fixed leading columns of every dataset, in output order.
pub const FIXED_COLUMNS: [&str; 17] = [
    "Track ID",
    "Name",
    "Album",
    "Artist",
    "Release Date",
    "Length",
    "Popularity",
    "Acousticness",
    "Danceability",
    "Energy",
    "Instrumentalness",
    "Liveness",
    "Loudness",
    "Speechiness",
    "Tempo",
    "Time Signature",
    "Valence",
];

/// Columns that identify a track across playlists and files.
pub const NAME_COLUMN: &str = "Name";
pub const ARTIST_COLUMN: &str = "Artist";

/// Metadata and audio features for one track. Only built when every field is present.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRecord {
    pub id: String,
    pub name: String,
    pub album: String,
    pub artist: String,
    /// As reported by the platform: year, year-month or full date.
    pub release_date: String,
    pub length_ms: i64,
    pub popularity: i64,
    pub acousticness: f64,
    pub danceability: f64,
    pub energy: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub loudness: f64,
    pub speechiness: f64,
    pub tempo: f64,
    pub time_signature: i64,
    pub valence: f64,
}

/// The first field found missing while assembling a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingField(pub &'static str);

/// Render a float so it never reads as an integer: `120.0`, not `120`.
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

fn require<T>(value: Option<T>, field: &'static str) -> Result<T, MissingField> {
    value.ok_or(MissingField(field))
}

impl TrackRecord {
    /// Combine the two API responses for `track_id`.
    pub fn from_responses(
        track_id: &str,
        track: &TrackInfo,
        features: Option<&AudioFeatures>,
    ) -> Result<Self, MissingField> {
        let album = require(track.album.as_ref(), "album")?;
        let features = require(features, "audio_features")?;

        Ok(Self {
            id: track_id.to_string(),
            name: require(track.name.clone(), "name")?,
            album: require(album.name.clone(), "album.name")?,
            artist: require(track.primary_artist(), "album.artists[0].name")?.to_string(),
            release_date: require(album.release_date.clone(), "album.release_date")?,
            length_ms: require(track.duration_ms, "duration_ms")?,
            popularity: require(track.popularity, "popularity")?,
            acousticness: require(features.acousticness, "acousticness")?,
            danceability: require(features.danceability, "danceability")?,
            energy: require(features.energy, "energy")?,
            instrumentalness: require(features.instrumentalness, "instrumentalness")?,
            liveness: require(features.liveness, "liveness")?,
            loudness: require(features.loudness, "loudness")?,
            speechiness: require(features.speechiness, "speechiness")?,
            tempo: require(features.tempo, "tempo")?,
            time_signature: require(features.time_signature, "time_signature")?,
            valence: require(features.valence, "valence")?,
        })
    }

    /// Cell values in [`FIXED_COLUMNS`] order.
    pub fn to_cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.album.clone(),
            self.artist.clone(),
            self.release_date.clone(),
            self.length_ms.to_string(),
            self.popularity.to_string(),
            format_float(self.acousticness),
            format_float(self.danceability),
            format_float(self.energy),
            format_float(self.instrumentalness),
            format_float(self.liveness),
            format_float(self.loudness),
            format_float(self.speechiness),
            format_float(self.tempo),
            self.time_signature.to_string(),
            format_float(self.valence),
        ]
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::models::{AlbumInfo, ArtistInfo};

    pub(crate) fn track_info(id: &str, name: &str, artist: &str) -> TrackInfo {
        TrackInfo {
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            duration_ms: Some(215_000),
            popularity: Some(71),
            album: Some(AlbumInfo {
                name: Some(format!("{name} (Album)")),
                release_date: Some("1977-02-04".to_string()),
                artists: vec![ArtistInfo {
                    name: Some(artist.to_string()),
                }],
            }),
        }
    }

    pub(crate) fn features() -> AudioFeatures {
        AudioFeatures {
            acousticness: Some(0.0644),
            danceability: Some(0.774),
            energy: Some(0.491),
            instrumentalness: Some(0.00428),
            liveness: Some(0.0737),
            loudness: Some(-9.835),
            speechiness: Some(0.0306),
            tempo: Some(120.194),
            time_signature: Some(4),
            valence: Some(0.724),
        }
    }

    #[test]
    fn test_complete_record() {
        let record =
            TrackRecord::from_responses("0ofHAoxe9vBkTCp2UQIavz", &track_info("x", "Dreams", "Fleetwood Mac"), Some(&features()))
                .unwrap();
        assert_eq!(record.id, "0ofHAoxe9vBkTCp2UQIavz");
        assert_eq!(record.artist, "Fleetwood Mac");
        assert_eq!(record.time_signature, 4);

        let cells = record.to_cells();
        assert_eq!(cells.len(), FIXED_COLUMNS.len());
        assert_eq!(cells[1], "Dreams");
        assert_eq!(cells[5], "215000");
        assert_eq!(cells[12], "-9.835");
    }

    #[test]
    fn test_integral_floats_keep_fraction() {
        let mut f = features();
        f.tempo = Some(120.0);
        f.energy = Some(0.0);
        let record = TrackRecord::from_responses("id", &track_info("x", "Dreams", "Fleetwood Mac"), Some(&f)).unwrap();
        let cells = record.to_cells();
        assert_eq!(cells[14], "120.0");
        assert_eq!(cells[9], "0.0");
        // Integer columns stay integers
        assert_eq!(cells[15], "4");
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(1970.0), "1970.0");
        assert_eq!(format_float(-9.835), "-9.835");
        assert_eq!(format_float(0.00428), "0.00428");
        assert_eq!(format_float(f64::NAN), "NaN");
    }

    #[test]
    fn test_missing_feature_field() {
        let mut f = features();
        f.valence = None;
        let err = TrackRecord::from_responses("id", &track_info("x", "Dreams", "Fleetwood Mac"), Some(&f)).unwrap_err();
        assert_eq!(err, MissingField("valence"));
    }

    #[test]
    fn test_missing_features_entirely() {
        let err = TrackRecord::from_responses("id", &track_info("x", "Dreams", "Fleetwood Mac"), None).unwrap_err();
        assert_eq!(err, MissingField("audio_features"));
    }

    #[test]
    fn test_missing_artist() {
        let mut t = track_info("x", "Dreams", "Fleetwood Mac");
        t.album.as_mut().unwrap().artists.clear();
        let err = TrackRecord::from_responses("id", &t, Some(&features())).unwrap_err();
        assert_eq!(err, MissingField("album.artists[0].name"));
    }

    #[test]
    fn test_fixed_column_names() {
        assert_eq!(FIXED_COLUMNS[0], "Track ID");
        assert_eq!(FIXED_COLUMNS[16], "Valence");
        assert!(FIXED_COLUMNS.contains(&NAME_COLUMN));
        assert!(FIXED_COLUMNS.contains(&ARTIST_COLUMN));
    }
}
