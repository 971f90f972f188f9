//! In-memory track library and the store seam used by tag edits.

mod history;
mod track;

pub use history::EditHistory;
pub use track::Track;

use anyhow::{Context, Result, bail};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Backend that owns track records.
pub trait TrackStore {
    fn track(&self, id: i64) -> Option<&Track>;
    /// Every track, in library order.
    fn tracks(&self) -> &[Track];
    fn update_comment(&mut self, id: i64, comment_raw: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Json,
    Yaml,
}

impl FileFormat {
    fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("json") => Ok(FileFormat::Json),
            Some("yaml") | Some("yml") => Ok(FileFormat::Yaml),
            _ => bail!(
                "Library: Unsupported library file {:?} (expected .json, .yaml or .yml)",
                path
            ),
        }
    }
}

/// Ordered track collection with id lookup.
#[derive(Debug, Clone, Default)]
pub struct Library {
    tracks: Vec<Track>,
    index: HashMap<i64, usize>,
}

impl Library {
    pub fn new(tracks: Vec<Track>) -> Self {
        let mut index = HashMap::with_capacity(tracks.len());
        for (pos, track) in tracks.iter().enumerate() {
            if index.insert(track.id, pos).is_some() {
                tracing::warn!("Duplicate track id {}; edits go to the last one", track.id);
            }
        }
        Self { tracks, index }
    }

    /// Load a JSON or YAML array of tracks.
    pub fn load(path: &Path) -> Result<Self> {
        let format = FileFormat::from_path(path)?;
        let file = File::open(path)
            .with_context(|| format!("Library: Failed to open {:?}", path))?;
        let reader = BufReader::new(file);

        let tracks: Vec<Track> = match format {
            FileFormat::Json => serde_json::from_reader(reader)
                .with_context(|| format!("Library: Failed to parse {:?}", path))?,
            FileFormat::Yaml => serde_yaml::from_reader(reader)
                .with_context(|| format!("Library: Failed to parse {:?}", path))?,
        };

        tracing::info!("Library: loaded {} tracks from {:?}", tracks.len(), path);
        Ok(Self::new(tracks))
    }

    /// Write all tracks back in the format implied by the extension.
    pub fn save(&self, path: &Path) -> Result<()> {
        let format = FileFormat::from_path(path)?;
        let file = File::create(path)
            .with_context(|| format!("Library: Failed to create {:?}", path))?;
        let writer = BufWriter::new(file);

        match format {
            FileFormat::Json => serde_json::to_writer_pretty(writer, &self.tracks)
                .with_context(|| format!("Library: Failed to write {:?}", path))?,
            FileFormat::Yaml => serde_yaml::to_writer(writer, &self.tracks)
                .with_context(|| format!("Library: Failed to write {:?}", path))?,
        }

        tracing::info!("Library: saved {} tracks to {:?}", self.tracks.len(), path);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

impl TrackStore for Library {
    fn track(&self, id: i64) -> Option<&Track> {
        self.index.get(&id).map(|&pos| &self.tracks[pos])
    }

    fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    fn update_comment(&mut self, id: i64, comment_raw: &str) -> Result<()> {
        let Some(&pos) = self.index.get(&id) else {
            bail!("Library: No track with id {}", id);
        };
        self.tracks[pos].comment_raw = if comment_raw.is_empty() {
            None
        } else {
            Some(comment_raw.to_string())
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample() -> Vec<Track> {
        vec![
            Track {
                id: 1,
                title: Some("One".into()),
                ..Track::default()
            },
            Track {
                id: 2,
                title: Some("Two".into()),
                comment_raw: Some("note && A".into()),
                ..Track::default()
            },
        ]
    }

    #[test]
    fn lookup_and_update() {
        let mut library = Library::new(sample());
        assert_eq!(library.track(2).and_then(|t| t.title.as_deref()), Some("Two"));
        assert!(library.track(3).is_none());

        library.update_comment(1, " && B").unwrap();
        assert_eq!(library.track(1).unwrap().comment_raw.as_deref(), Some(" && B"));

        library.update_comment(2, "").unwrap();
        assert_eq!(library.track(2).unwrap().comment_raw, None);

        assert!(library.update_comment(9, "x").is_err());
    }

    #[test]
    fn json_round_trip_on_disk() {
        let file = tempfile::NamedTempFile::with_suffix(".json").unwrap();
        let library = Library::new(sample());
        library.save(file.path()).unwrap();

        let loaded = Library::load(file.path()).unwrap();
        assert_eq!(loaded.tracks(), library.tracks());
    }

    #[test]
    fn loads_yaml() {
        let mut file = tempfile::NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(file, "- id: 4\n  artist: Floorplan\n  bpm: 126\n- id: 5").unwrap();

        let library = Library::load(file.path()).unwrap();
        assert_eq!(library.len(), 2);
        assert_eq!(library.track(4).unwrap().bpm, Some(126));
    }

    #[test]
    fn rejects_unknown_extension() {
        let file = tempfile::NamedTempFile::with_suffix(".csv").unwrap();
        let err = Library::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Unsupported library file"));
    }
}
