//! Tag commands against a track store, plus library-wide tag listing.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashMap;

use super::codec::{decode, validate_tag};
use crate::library::{Track, TrackStore};

/// One comment field rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentChange {
    pub id: i64,
    pub old_comment: String,
    pub new_comment: String,
}

/// The rewrites produced by one tag command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagEdit {
    pub changes: Vec<CommentChange>,
}

impl TagEdit {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.changes.iter().map(|c| c.id)
    }
}

/// A tag and how many tracks carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagUsage {
    pub name: String,
    pub usage_count: usize,
}

/// Add `tag` to every listed track that does not already have it.
pub fn add_tag_to_records<S: TrackStore>(store: &mut S, ids: &[i64], tag: &str) -> Result<TagEdit> {
    validate_tag(tag)?;
    let tag = tag.trim();
    if tag.is_empty() {
        return Ok(TagEdit::default());
    }

    rewrite_tags(store, ids, |tags| {
        if tags.iter().any(|t| t.to_lowercase() == tag.to_lowercase()) {
            false
        } else {
            tags.push(tag.to_string());
            true
        }
    })
}

/// Remove `tag` (any casing) from every listed track.
pub fn remove_tag_from_records<S: TrackStore>(
    store: &mut S,
    ids: &[i64],
    tag: &str,
) -> Result<TagEdit> {
    let wanted = tag.trim().to_lowercase();
    if wanted.is_empty() {
        return Ok(TagEdit::default());
    }

    rewrite_tags(store, ids, |tags| {
        let before = tags.len();
        tags.retain(|t| t.to_lowercase() != wanted);
        tags.len() != before
    })
}

/// Replace the whole tag list of every listed track, keeping user comments.
pub fn set_tags_on_records<S: TrackStore, T: AsRef<str>>(
    store: &mut S,
    ids: &[i64],
    tags: &[T],
) -> Result<TagEdit> {
    let mut wanted: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        validate_tag(tag.as_ref())?;
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !wanted.iter().any(|t| t.to_lowercase() == tag.to_lowercase()) {
            wanted.push(tag.to_string());
        }
    }

    rewrite_tags(store, ids, |current| {
        if *current == wanted {
            false
        } else {
            current.clone_from(&wanted);
            true
        }
    })
}

/// Decode each track, let `apply` edit its tags, and store the ones it changed.
///
/// Every new comment is built before the first write. A failed write reverts
/// the writes already made.
fn rewrite_tags<S, F>(store: &mut S, ids: &[i64], mut apply: F) -> Result<TagEdit>
where
    S: TrackStore,
    F: FnMut(&mut Vec<String>) -> bool,
{
    let mut edit = TagEdit::default();

    for &id in ids {
        let Some(track) = store.track(id) else {
            tracing::warn!("Tag edit: skipping unknown track id {}", id);
            continue;
        };
        let old_comment = track.comment_raw.clone().unwrap_or_default();

        let mut overlay = decode(&old_comment);
        if !apply(&mut overlay.tags) {
            continue;
        }
        // Stored tags holding the separator cannot be written back.
        let new_comment = match overlay.encode() {
            Ok(comment) => comment,
            Err(e) => {
                tracing::warn!("Tag edit: skipping track {}: {}", id, e);
                continue;
            }
        };

        edit.changes.push(CommentChange {
            id,
            old_comment,
            new_comment,
        });
    }

    write_changes(store, &edit.changes, |c| c.new_comment.as_str(), |c| c.old_comment.as_str())
        .context("Tag edit: Failed to store comments")?;

    tracing::debug!("Tag edit: rewrote {} of {} tracks", edit.len(), ids.len());
    Ok(edit)
}

/// Write `target` of every change; on failure, restore `revert` on those
/// already written and return the error.
pub(crate) fn write_changes<S, T, R>(
    store: &mut S,
    changes: &[CommentChange],
    target: T,
    revert: R,
) -> Result<()>
where
    S: TrackStore,
    T: Fn(&CommentChange) -> &str,
    R: Fn(&CommentChange) -> &str,
{
    for (done, change) in changes.iter().enumerate() {
        if let Err(e) = store.update_comment(change.id, target(change)) {
            for written in &changes[..done] {
                if let Err(revert_err) = store.update_comment(written.id, revert(written)) {
                    tracing::warn!("Failed to revert track {}: {}", written.id, revert_err);
                }
            }
            return Err(e.context(format!("track {}", change.id)));
        }
    }
    Ok(())
}

/// Every tag in the library, deduplicated and sorted ignoring case.
///
/// The first spelling seen is the one reported.
pub fn global_tags(tracks: &[Track]) -> Vec<TagUsage> {
    let mut usage: HashMap<String, TagUsage> = HashMap::new();

    for track in tracks {
        let Some(raw) = track.comment_raw.as_deref() else {
            continue;
        };
        let mut seen_here = Vec::new();
        for tag in decode(raw).tags {
            let folded = tag.to_lowercase();
            if seen_here.contains(&folded) {
                continue;
            }
            seen_here.push(folded.clone());
            usage
                .entry(folded)
                .or_insert_with(|| TagUsage {
                    name: tag,
                    usage_count: 0,
                })
                .usage_count += 1;
        }
    }

    let mut sorted: Vec<(String, TagUsage)> = usage.into_iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    sorted.into_iter().map(|(_, tag)| tag).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::Library;
    use crate::tags::TagError;

    fn track(id: i64, comment: Option<&str>) -> Track {
        Track {
            id,
            comment_raw: comment.map(str::to_string),
            ..Track::default()
        }
    }

    fn library() -> Library {
        Library::new(vec![
            track(1, None),
            track(2, Some("keep this")),
            track(3, Some("note && Ambient; Dub")),
        ])
    }

    fn comment(library: &Library, id: i64) -> Option<&str> {
        library.track(id).and_then(|t| t.comment_raw.as_deref())
    }

    #[test]
    fn add_appends_and_skips_existing() {
        let mut lib = library();
        let edit = add_tag_to_records(&mut lib, &[1, 2, 3], " Ambient ").unwrap();

        assert_eq!(edit.ids().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(comment(&lib, 1), Some(" && Ambient"));
        assert_eq!(comment(&lib, 2), Some("keep this && Ambient"));
        assert_eq!(comment(&lib, 3), Some("note && Ambient; Dub"));
        assert_eq!(edit.changes[1].old_comment, "keep this");
    }

    #[test]
    fn add_is_case_insensitive() {
        let mut lib = library();
        let edit = add_tag_to_records(&mut lib, &[3], "dub").unwrap();
        assert!(edit.is_empty());
    }

    #[test]
    fn add_rejects_separator_before_touching_anything() {
        let mut lib = library();
        let err = add_tag_to_records(&mut lib, &[1, 2], "a && b").unwrap_err();
        assert_eq!(
            err.downcast_ref::<TagError>(),
            Some(&TagError::ReservedSeparator("a && b".into()))
        );
        assert_eq!(comment(&lib, 1), None);
        assert_eq!(comment(&lib, 2), Some("keep this"));
    }

    #[test]
    fn add_blank_is_noop() {
        let mut lib = library();
        assert!(add_tag_to_records(&mut lib, &[1], "   ").unwrap().is_empty());
    }

    #[test]
    fn unknown_ids_are_skipped() {
        let mut lib = library();
        let edit = add_tag_to_records(&mut lib, &[42, 1], "House").unwrap();
        assert_eq!(edit.len(), 1);
    }

    #[test]
    fn remove_keeps_comment() {
        let mut lib = library();
        let edit = remove_tag_from_records(&mut lib, &[2, 3], "AMBIENT").unwrap();

        assert_eq!(edit.ids().collect::<Vec<_>>(), vec![3]);
        assert_eq!(comment(&lib, 3), Some("note && Dub"));

        remove_tag_from_records(&mut lib, &[3], "dub").unwrap();
        assert_eq!(comment(&lib, 3), Some("note"));
    }

    #[test]
    fn remove_last_tag_without_comment_clears_field() {
        let mut lib = library();
        add_tag_to_records(&mut lib, &[1], "House").unwrap();
        remove_tag_from_records(&mut lib, &[1], "house").unwrap();
        assert_eq!(comment(&lib, 1), None);
    }

    #[test]
    fn set_replaces_tag_block() {
        let mut lib = library();
        let edit = set_tags_on_records(&mut lib, &[2, 3], &["Dub", " dub ", "Live", ""]).unwrap();

        assert_eq!(edit.len(), 2);
        assert_eq!(comment(&lib, 2), Some("keep this && Dub; Live"));
        assert_eq!(comment(&lib, 3), Some("note && Dub; Live"));

        let again = set_tags_on_records(&mut lib, &[3], &["Dub", "Live"]).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn set_rejects_separator() {
        let mut lib = library();
        assert!(set_tags_on_records(&mut lib, &[1], &["ok", "x && y"]).is_err());
        assert_eq!(comment(&lib, 1), None);
    }

    /// A library that refuses writes to one track.
    struct ReadOnlyTrack {
        library: Library,
        locked: i64,
    }

    impl TrackStore for ReadOnlyTrack {
        fn track(&self, id: i64) -> Option<&Track> {
            self.library.track(id)
        }

        fn tracks(&self) -> &[Track] {
            self.library.tracks()
        }

        fn update_comment(&mut self, id: i64, comment_raw: &str) -> Result<()> {
            if id == self.locked {
                anyhow::bail!("track {} is read-only", id);
            }
            self.library.update_comment(id, comment_raw)
        }
    }

    #[test]
    fn unencodable_track_is_skipped() {
        let mut lib = Library::new(vec![
            track(1, Some("fine")),
            track(2, Some("rock && roll && Live")),
            track(3, None),
        ]);
        let edit = add_tag_to_records(&mut lib, &[1, 2, 3], "Warm").unwrap();

        assert_eq!(edit.ids().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(comment(&lib, 1), Some("fine && Warm"));
        assert_eq!(comment(&lib, 2), Some("rock && roll && Live"));
        assert_eq!(comment(&lib, 3), Some(" && Warm"));
    }

    #[test]
    fn remove_skips_unencodable_track() {
        let mut lib = Library::new(vec![
            track(1, Some("rock && roll && Live; Dub")),
            track(2, Some("x && Dub")),
        ]);
        let edit = remove_tag_from_records(&mut lib, &[1, 2], "Dub").unwrap();

        assert_eq!(edit.ids().collect::<Vec<_>>(), vec![2]);
        assert_eq!(comment(&lib, 1), Some("rock && roll && Live; Dub"));
        assert_eq!(comment(&lib, 2), Some("x"));
    }

    #[test]
    fn failed_write_reverts_earlier_tracks() {
        let mut store = ReadOnlyTrack {
            library: library(),
            locked: 3,
        };
        let err = set_tags_on_records(&mut store, &[1, 2, 3], &["Live"]).unwrap_err();

        assert!(format!("{:#}", err).contains("read-only"));
        assert_eq!(comment(&store.library, 1), None);
        assert_eq!(comment(&store.library, 2), Some("keep this"));
        assert_eq!(comment(&store.library, 3), Some("note && Ambient; Dub"));
    }

    #[test]
    fn global_tags_dedupe_and_count() {
        let tracks = vec![
            track(1, Some(" && techno; Ambient")),
            track(2, Some("x && Techno; dub; TECHNO")),
            track(3, Some("no tags here")),
            track(4, None),
        ];
        assert_eq!(
            global_tags(&tracks),
            vec![
                TagUsage {
                    name: "Ambient".into(),
                    usage_count: 1
                },
                TagUsage {
                    name: "dub".into(),
                    usage_count: 1
                },
                TagUsage {
                    name: "techno".into(),
                    usage_count: 2
                },
            ]
        );
    }
}
