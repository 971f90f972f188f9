//! The track record and how the query evaluator reads it.

use serde::{Deserialize, Serialize};

use crate::dsl::{NumericField, Searchable, StringField};

/// One track as the library backend hands it over.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: i64,
    #[serde(default)]
    pub persistent_id: String,
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    /// Grouping text, searched by `label:`.
    #[serde(default, alias = "grouping_raw")]
    pub grouping: Option<String>,
    /// Musical key, e.g. "8A" or "F#m".
    #[serde(default)]
    pub key: Option<String>,
    /// Encoded comment + tags field.
    #[serde(default)]
    pub comment_raw: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub bpm: Option<u32>,
    #[serde(default)]
    pub duration_secs: f64,
    /// 0-100
    #[serde(default)]
    pub rating: i64,
    /// Unix timestamp
    #[serde(default)]
    pub date_added: i64,
}

impl Searchable for Track {
    fn text(&self, field: StringField) -> Option<&str> {
        match field {
            StringField::Artist => self.artist.as_deref(),
            StringField::Title => self.title.as_deref(),
            StringField::Album => self.album.as_deref(),
            StringField::Genre => self.genre.as_deref(),
            StringField::Label => self.grouping.as_deref(),
            StringField::Key => self.key.as_deref(),
            StringField::Tag | StringField::Any => None,
        }
    }

    fn number(&self, field: NumericField) -> Option<f64> {
        match field {
            NumericField::Bpm => self.bpm.map(f64::from),
            NumericField::Year => self.year.map(f64::from),
        }
    }

    fn comment_raw(&self) -> Option<&str> {
        self.comment_raw.as_deref()
    }
}
