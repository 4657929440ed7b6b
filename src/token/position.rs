use crate::string_interning::{StringId, StringTable};
use std::cmp::Ordering;

/// A single point in a source file: byte offset plus 1-based line/column for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct CharPosition {
    pub offset: u32,
    pub line: u32,
    pub column: u32,
}

impl CharPosition {
    pub const NONE: CharPosition = CharPosition {
        offset: 0,
        line: 0,
        column: 0,
    };

    pub fn is_none(&self) -> bool {
        self.line == 0
    }
}

/// A source range attached to every AST node. `file` is the interned source file path so
/// ranges stay cheap to copy; resolve it against a [`StringTable`] only when rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct TextLocation {
    pub file: StringId,
    pub start: CharPosition,
    pub end: CharPosition,
}

impl TextLocation {
    pub fn new(file: StringId, start: CharPosition, end: CharPosition) -> Self {
        Self { file, start, end }
    }

    pub fn synthetic(file: StringId) -> Self {
        Self {
            file,
            start: CharPosition::NONE,
            end: CharPosition::NONE,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn filename<'a>(&self, table: &'a StringTable) -> &'a str {
        table.resolve(self.file)
    }

    pub fn covering(&self, other: &TextLocation) -> TextLocation {
        TextLocation {
            file: self.file,
            start: self.start,
            end: other.end,
        }
    }
}

/// Overlap-aware ordering: ranges that overlap on the same or adjacent lines compare as
/// `Equal` rather than forcing an arbitrary tiebreak, which keeps diagnostic sort stable
/// when two nodes share a line without imposing a spurious order between them.
impl PartialOrd for TextLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        let (sl, ol) = (self.start.line, other.start.line);
        if sl < ol {
            return Some(if self.end.line < ol {
                Ordering::Less
            } else {
                Ordering::Equal
            });
        }
        if sl > ol {
            return Some(if other.end.line < sl {
                Ordering::Greater
            } else {
                Ordering::Equal
            });
        }

        let (sc, oc) = (self.start.column, other.start.column);
        if sc < oc {
            return Some(
                if self.end.line < ol || (self.end.line == ol && self.end.column < oc) {
                    Ordering::Less
                } else {
                    Ordering::Equal
                },
            );
        }
        if sc > oc {
            return Some(
                if other.end.line < sl || (other.end.line == sl && other.end.column < sc) {
                    Ordering::Greater
                } else {
                    Ordering::Equal
                },
            );
        }
        Some(Ordering::Equal)
    }
}
