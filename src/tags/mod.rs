//! Tag overlay codec and tag editing commands.

mod codec;
mod edit;

pub use codec::{
    SEPARATOR, TagError, TagOverlay, decode, encode, is_ambiguous, replace_tags, validate_tag,
};
pub use edit::{
    CommentChange, TagEdit, TagUsage, add_tag_to_records, global_tags, remove_tag_from_records,
    set_tags_on_records,
};
pub(crate) use edit::write_changes;
