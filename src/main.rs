use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use featureset::api::WebApiClient;
use featureset::config::{AppConfig, TOKEN_ENV};
use featureset::dataset::{Dataset, DatasetBuilder, LabelSet, TrackRecord, FIXED_COLUMNS};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "featureset", version, about = "Build audio-feature datasets from Spotify playlists")]
struct Cli {
    /// Config file (defaults to ~/.config/featureset/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory datasets are written to
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Output file name, without extension
    #[arg(long, global = true)]
    name: Option<String>,

    /// Spotify user id
    #[arg(long, global = true)]
    user: Option<String>,

    /// Spotify access token (defaults to $SPOTIFY_ACCESS_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Leave out the leading index column
    #[arg(long, global = true)]
    no_index: bool,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the track ids of a playlist (first page only)
    Tracks {
        /// Playlist id, URI or share link
        playlist: String,
    },

    /// Show metadata and audio features of one track
    Track {
        track_id: String,
    },

    /// Build the dataset of a single playlist and preview it
    Playlist {
        /// Playlist id, URI or share link
        playlist: String,

        /// Label added as a column to every row (KEY=VALUE, repeatable)
        #[arg(short, long = "label")]
        labels: Vec<String>,

        /// Also write the dataset to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build one deduplicated dataset from many playlists
    Build {
        /// TOML file with a [playlists] table (defaults to the config's)
        #[arg(long)]
        playlists: Option<PathBuf>,
    },

    /// Merge the .csv files in <dir>/APPEND into a new timestamped file
    Append,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Explicit --config must parse; the default location is optional
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load(),
    };

    let csv_name = cli.name.clone().unwrap_or_else(|| config.csv_name.clone());
    let write_index = config.write_index && !cli.no_index;
    let dir = csv_directory(&cli, &config);

    let token = cli
        .token
        .clone()
        .or_else(|| std::env::var(TOKEN_ENV).ok())
        .unwrap_or_default();
    let user_id = cli.user.clone().or(config.user_id.clone()).unwrap_or_default();

    // The client is only built once the command's own input has been validated
    let connect = |dir: PathBuf| -> Result<DatasetBuilder<WebApiClient>> {
        let client = WebApiClient::new(
            &config.api.base_url,
            &token,
            Duration::from_secs(config.api.timeout_secs),
        )?;
        Ok(DatasetBuilder::new(client, user_id.clone(), dir, csv_name.clone())
            .with_pacing(config.api.pacing())
            .with_index(write_index))
    };
    // Only `build` writes into the directory; the others just need a placeholder
    let placeholder = || PathBuf::from(".");

    match cli.command {
        Commands::Tracks { playlist } => {
            let builder = connect(dir.unwrap_or_else(|_| placeholder()))?;
            let ids = builder.get_track_ids(&playlist).context("Listing tracks failed")?;
            for id in &ids {
                println!("{id}");
            }
            log::info!("{} tracks", ids.len());
        }

        Commands::Track { track_id } => {
            let builder = connect(dir.unwrap_or_else(|_| placeholder()))?;
            match builder.get_track_features(&track_id).context("Track lookup failed")? {
                Some(record) => print_record(&record),
                None => println!("Track {track_id} is missing features and would be skipped."),
            }
        }

        Commands::Playlist { playlist, labels, output } => {
            let labels = LabelSet::from_pairs(&labels)?;
            let builder = connect(dir.unwrap_or_else(|_| placeholder()))?;
            let dataset = builder
                .create_playlist_dataset(&playlist, &labels)
                .context("Playlist build failed")?;
            print_preview(&dataset, 5);
            if let Some(path) = output {
                dataset
                    .write_csv(&path, write_index)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("{} written", path.display());
            }
        }

        Commands::Build { playlists } => {
            // Labels are validated before any request goes out
            let playlists = match playlists {
                Some(path) => featureset::config::load_playlists(&path)?,
                None => config.playlists()?,
            };
            let builder = connect(dir?)?;
            let result = builder.create_dataset(&playlists).context("Build failed")?;
            println!(
                "Dataset complete: {} playlists, {} rows written, {} duplicates dropped, {} tracks skipped",
                result.playlists_processed,
                result.rows_written,
                result.duplicates_dropped,
                result.tracks_skipped
            );
            if result.duplicate_playlists > 0 {
                println!("({} repeated playlists ignored)", result.duplicate_playlists);
            }
            println!("{} written", result.output.display());
        }

        Commands::Append => {
            let result = featureset::dataset::append_csv_files(&dir?, &csv_name, write_index)
                .context("Append failed")?;
            println!(
                "Merged {} files: {} rows written, {} duplicates dropped",
                result.files_merged, result.rows_written, result.duplicates_dropped
            );
            println!("{} created", result.output.display());
        }
    }

    Ok(())
}

/// Resolve the CSV directory: CLI > config.
fn csv_directory(cli: &Cli, config: &AppConfig) -> Result<PathBuf> {
    cli.dir
        .clone()
        .or_else(|| config.csv_directory.clone())
        .ok_or_else(|| anyhow::anyhow!("No CSV directory. Pass --dir or set csv_directory in config."))
}

/// Print one track record as aligned key/value lines.
fn print_record(record: &TrackRecord) {
    for (column, value) in FIXED_COLUMNS.iter().zip(record.to_cells()) {
        println!("{column:<17} {value}");
    }
}

/// Print the first rows of a dataset, truncating long text.
fn print_preview(dataset: &Dataset, rows: usize) {
    let label_columns: Vec<&str> = dataset.columns()[FIXED_COLUMNS.len().min(dataset.columns().len())..]
        .iter()
        .map(String::as_str)
        .collect();

    print!("{:<25} {:<20} {:>12} {:>4} {:>7} {:>6}", "Name", "Artist", "Released", "Pop", "Tempo", "Energy");
    for label in &label_columns {
        print!(" {label:>10}");
    }
    println!();
    println!("{}", "-".repeat(79 + 11 * label_columns.len()));

    for row in 0..dataset.len().min(rows) {
        let cell = |column: &str| dataset.get(row, column).unwrap_or("");
        print!(
            "{:<25} {:<20} {:>12} {:>4} {:>7} {:>6}",
            truncate(cell("Name"), 25),
            truncate(cell("Artist"), 20),
            cell("Release Date"),
            cell("Popularity"),
            cell("Tempo"),
            cell("Energy"),
        );
        for label in &label_columns {
            print!(" {:>10}", cell(label));
        }
        println!();
    }

    println!();
    println!("{} rows x {} columns", dataset.len(), dataset.columns().len());
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let kept: String = s.chars().take(width - 3).collect();
        format!("{kept}...")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_parses_without_token() {
        let cli = Cli::try_parse_from(["featureset", "--dir", "/data/csv", "append"]).unwrap();
        assert!(matches!(cli.command, Commands::Append));
        assert!(cli.token.is_none());
    }

    #[test]
    fn test_directory_cli_over_config() {
        let config = AppConfig {
            csv_directory: Some(PathBuf::from("/from/config")),
            ..AppConfig::default()
        };
        let cli = Cli::try_parse_from(["featureset", "append", "--dir", "/from/cli"]).unwrap();
        assert_eq!(csv_directory(&cli, &config).unwrap(), PathBuf::from("/from/cli"));

        let cli = Cli::try_parse_from(["featureset", "append"]).unwrap();
        assert_eq!(csv_directory(&cli, &config).unwrap(), PathBuf::from("/from/config"));
        assert!(csv_directory(&cli, &AppConfig::default()).is_err());
    }

    #[test]
    fn test_playlist_labels_repeatable() {
        let cli = Cli::try_parse_from([
            "featureset", "playlist", "37i9dQZF1DWWmGB2u14f8m", "-l", "Decade=1970", "--label", "Year=1971",
        ])
        .unwrap();
        match cli.command {
            Commands::Playlist { labels, output, .. } => {
                assert_eq!(labels, vec!["Decade=1970", "Year=1971"]);
                assert!(output.is_none());
            }
            _ => panic!("expected playlist command"),
        }
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Dreams", 25), "Dreams");
        assert_eq!(truncate("A Very Long Track Name Indeed", 10), "A Very ...");
    }
}
