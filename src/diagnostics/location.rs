use crate::token::{CharPosition, TextLocation};
use crate::string_interning::StringTable;
use std::path::PathBuf;

/// A fully owned version of [`TextLocation`] that does not depend on a [`StringTable`] to
/// resolve its filename. Diagnostics are collected across every phase and rendered at the
/// very end, possibly after the arenas that produced them are gone, so they must not carry
/// borrows or interned handles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub start: CharPosition,
    pub end: CharPosition,
}

impl SourceLocation {
    pub fn new(file: PathBuf, start: CharPosition, end: CharPosition) -> Self {
        Self { file, start, end }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

impl TextLocation {
    pub fn to_source_location(&self, string_table: &StringTable) -> SourceLocation {
        SourceLocation {
            file: PathBuf::from(self.filename(string_table)),
            start: self.start,
            end: self.end,
        }
    }
}
