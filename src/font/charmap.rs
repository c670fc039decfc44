//! Character map
//!
//! Two lookup tables:
//! - character code -> font index, rebuilt whenever the encoding changes
//! - font index -> glyph cache slot, filled in as glyphs are constructed
//!
//! The second table survives encoding changes: a glyph belongs to a font
//! index, not to whatever code happened to reach it first.

use std::collections::HashMap;

use log::debug;

use crate::error::FaceError;
use crate::face::{Encoding, Face};

/// Cache slot meaning "no glyph"
pub const NULL_SLOT: usize = 0;

/// Font index meaning "code not mapped"
pub const MISSING_GLYPH: u32 = 0;

/// Code point <-> font index <-> cache slot mapping
#[derive(Debug, Default)]
pub struct CharacterMap {
    encoding: Option<Encoding>,
    code_to_index: HashMap<u32, u32>,
    index_to_slot: HashMap<u32, usize>,
}

impl CharacterMap {
    /// Map the face's active character map
    pub fn new(face: &dyn Face) -> Self {
        let mut map = Self {
            encoding: face.charmap(),
            ..Self::default()
        };
        map.rebuild(face);
        map
    }

    /// Switch to `encoding`, re-enumerating every code the face maps under it.
    ///
    /// Selecting the active encoding again is a no-op. On failure the
    /// previous table stays in place.
    pub fn select_encoding(
        &mut self,
        face: &mut dyn Face,
        encoding: Encoding,
    ) -> Result<(), FaceError> {
        if self.encoding == Some(encoding) {
            return Ok(());
        }
        face.select_charmap(encoding)?;
        self.encoding = Some(encoding);
        self.rebuild(face);
        Ok(())
    }

    fn rebuild(&mut self, face: &dyn Face) {
        self.code_to_index = face.char_codes().into_iter().collect();
        debug!(
            "Character map {:?}: {} codes",
            self.encoding,
            self.code_to_index.len()
        );
    }

    /// Active encoding
    pub fn encoding(&self) -> Option<Encoding> {
        self.encoding
    }

    /// Number of mapped codes
    pub fn len(&self) -> usize {
        self.code_to_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code_to_index.is_empty()
    }

    /// Font index for `code`, or `MISSING_GLYPH`
    pub fn font_index(&self, code: u32) -> u32 {
        self.code_to_index
            .get(&code)
            .copied()
            .unwrap_or(MISSING_GLYPH)
    }

    /// Record that the glyph for `code`'s font index lives at `slot`.
    ///
    /// Callers insert each font index once; a repeat insert overwrites.
    pub fn insert_index(&mut self, code: u32, slot: usize) {
        let index = self.font_index(code);
        self.index_to_slot.insert(index, slot);
    }

    /// Cache slot for `code`, or `NULL_SLOT` when not constructed yet
    pub fn cache_slot(&self, code: u32) -> usize {
        self.index_to_slot
            .get(&self.font_index(code))
            .copied()
            .unwrap_or(NULL_SLOT)
    }

    /// Forget every cache slot, keeping the code table
    pub fn clear_slots(&mut self) {
        self.index_to_slot.clear();
    }
}
