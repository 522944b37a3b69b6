//! Core types: Note, NoteUpdate, WikiLink, BacklinkInfo, NoteVersion

mod link;
mod note;
mod version;

pub use link::{BacklinkInfo, WikiLink, extract_links};
pub use note::{Note, NoteUpdate, normalize_tags};
pub use version::{NoteDiff, NoteVersion};
