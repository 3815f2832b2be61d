//! Track record extraction with per-field fallbacks
//!
//! Each field is read independently. A field that is missing, fails to decode
//! or has the wrong shape receives its fallback value and extraction moves on
//! to the next field; a single bad field never discards the record.

use super::track_document::{FieldError, FieldPath, TrackDocument};
use crate::models::outcome::{FallbackReason, FieldOutcome, FileOutcome};
use crate::services::fallback::{self, FallbackGenerator};
use songsim_common::TrackRecord;
use std::ops::RangeInclusive;
use tracing::debug;

/// Extracted record fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TrackField {
    SongId,
    Title,
    ArtistId,
    ArtistName,
    Tempo,
    Key,
    Mode,
    ReleaseYear,
    Loudness,
    Energy,
    Danceability,
}

impl TrackField {
    pub const ALL: [TrackField; 11] = [
        TrackField::SongId,
        TrackField::Title,
        TrackField::ArtistId,
        TrackField::ArtistName,
        TrackField::Tempo,
        TrackField::Key,
        TrackField::Mode,
        TrackField::ReleaseYear,
        TrackField::Loudness,
        TrackField::Energy,
        TrackField::Danceability,
    ];

    /// Location of the field in a source document
    pub fn path(self) -> FieldPath {
        match self {
            Self::SongId => FieldPath::new("metadata", "songs", "track_id"),
            Self::Title => FieldPath::new("metadata", "songs", "title"),
            Self::ArtistId => FieldPath::new("metadata", "songs", "artist_id"),
            Self::ArtistName => FieldPath::new("metadata", "songs", "artist_name"),
            Self::Tempo => FieldPath::new("analysis", "songs", "tempo"),
            Self::Key => FieldPath::new("analysis", "songs", "key"),
            Self::Mode => FieldPath::new("analysis", "songs", "mode"),
            Self::ReleaseYear => FieldPath::new("musicbrainz", "songs", "year"),
            Self::Loudness => FieldPath::new("analysis", "songs", "loudness"),
            Self::Energy => FieldPath::new("analysis", "songs", "energy"),
            Self::Danceability => FieldPath::new("analysis", "songs", "danceability"),
        }
    }

    /// Record field name
    pub fn name(self) -> &'static str {
        match self {
            Self::SongId => "song_id",
            Self::Title => "title",
            Self::ArtistId => "artist_id",
            Self::ArtistName => "artist_name",
            Self::Tempo => "tempo",
            Self::Key => "key",
            Self::Mode => "mode",
            Self::ReleaseYear => "release_year",
            Self::Loudness => "loudness",
            Self::Energy => "energy",
            Self::Danceability => "danceability",
        }
    }
}

/// A record plus the outcome of each of its fields
#[derive(Debug, Clone)]
pub struct Extraction {
    pub record: TrackRecord,
    pub fields: Vec<(TrackField, FieldOutcome)>,
}

impl Extraction {
    /// File-level outcome derived from the field outcomes
    pub fn outcome(&self) -> FileOutcome {
        FileOutcome::from_fields(self.fields.iter().map(|(_, outcome)| outcome))
    }

    /// Fields that received a fallback value
    pub fn fallbacks(&self) -> impl Iterator<Item = (TrackField, FallbackReason)> + '_ {
        self.fields.iter().filter_map(|(field, outcome)| match outcome {
            FieldOutcome::Fallback(reason) => Some((*field, *reason)),
            FieldOutcome::Extracted => None,
        })
    }

    pub fn outcome_of(&self, field: TrackField) -> Option<FieldOutcome> {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, outcome)| *outcome)
    }
}

/// Builds a [`TrackRecord`] from one source document
pub struct TrackExtractor<'a> {
    document: &'a TrackDocument,
    fields: Vec<(TrackField, FieldOutcome)>,
}

impl<'a> TrackExtractor<'a> {
    pub fn new(document: &'a TrackDocument) -> Self {
        Self {
            document,
            fields: Vec::with_capacity(TrackField::ALL.len()),
        }
    }

    /// Extract every field, substituting fallbacks as needed
    ///
    /// # Arguments
    /// * `fallback_song_id` - token derived from the file name
    /// * `ordinal` - number of records produced before this one (fallback counter)
    /// * `generator` - seeded source of numeric fallbacks for this file
    pub fn extract(
        mut self,
        fallback_song_id: &str,
        ordinal: usize,
        generator: &mut FallbackGenerator,
    ) -> Extraction {
        let doc = self.document;

        let song_id = self.resolve(TrackField::SongId, doc.text(&TrackField::SongId.path()), || {
            fallback_song_id.to_string()
        });
        let title = self.resolve(TrackField::Title, doc.text(&TrackField::Title.path()), || {
            fallback::title(ordinal)
        });
        let artist_id = self.resolve(
            TrackField::ArtistId,
            doc.text(&TrackField::ArtistId.path()),
            || fallback::artist_id(ordinal),
        );
        let artist_name = self.resolve(
            TrackField::ArtistName,
            doc.text(&TrackField::ArtistName.path()),
            || fallback::artist_name(ordinal),
        );

        let tempo = self.resolve(TrackField::Tempo, doc.float(&TrackField::Tempo.path()), || {
            generator.tempo()
        });
        let key = self.resolve(TrackField::Key, read_int(doc, TrackField::Key, Some(0..=11)), || {
            generator.key()
        });
        let mode = self.resolve(TrackField::Mode, read_int(doc, TrackField::Mode, Some(0..=1)), || {
            generator.mode()
        });
        let release_year = self.resolve(TrackField::ReleaseYear, read_year(doc), || {
            generator.release_year()
        });
        let loudness = self.resolve(
            TrackField::Loudness,
            doc.float(&TrackField::Loudness.path()),
            || generator.loudness(),
        );
        let energy = self.resolve(TrackField::Energy, read_unit(doc, TrackField::Energy), || {
            generator.energy()
        });
        let danceability = self.resolve(
            TrackField::Danceability,
            read_unit(doc, TrackField::Danceability),
            || generator.danceability(),
        );

        Extraction {
            record: TrackRecord {
                song_id,
                title,
                artist_id,
                artist_name,
                tempo,
                key,
                mode,
                release_year,
                energy,
                danceability,
                loudness,
            },
            fields: self.fields,
        }
    }

    fn resolve<T>(
        &mut self,
        field: TrackField,
        result: Result<T, FieldError>,
        fallback: impl FnOnce() -> T,
    ) -> T {
        match result {
            Ok(value) => {
                self.fields.push((field, FieldOutcome::Extracted));
                value
            }
            Err(e) => {
                debug!("Fallback for {}: {}", field.name(), e);
                self.fields
                    .push((field, FieldOutcome::Fallback(FallbackReason::from(&e))));
                fallback()
            }
        }
    }
}

fn read_int(
    doc: &TrackDocument,
    field: TrackField,
    domain: Option<RangeInclusive<i64>>,
) -> Result<i32, FieldError> {
    let path = field.path();
    let value = doc.integer(&path)?;

    if let Some(domain) = domain {
        if !domain.contains(&value) {
            return Err(FieldError::DecodeError(
                path.to_string(),
                format!("{} outside {}..={}", value, domain.start(), domain.end()),
            ));
        }
    }

    i32::try_from(value)
        .map_err(|_| FieldError::DecodeError(path.to_string(), format!("{} out of range", value)))
}

/// Year 0 is the provider's "unknown" marker
fn read_year(doc: &TrackDocument) -> Result<i32, FieldError> {
    let year = read_int(doc, TrackField::ReleaseYear, None)?;
    if year == 0 {
        return Err(FieldError::MissingPath(format!(
            "{} (year 0 is unknown)",
            TrackField::ReleaseYear.path()
        )));
    }
    Ok(year)
}

fn read_unit(doc: &TrackDocument, field: TrackField) -> Result<f64, FieldError> {
    let path = field.path();
    let value = doc.float(&path)?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(FieldError::DecodeError(path.to_string(), format!("{} outside 0..=1", value)))
    }
}
