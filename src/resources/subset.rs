//! TrueType subsetting through the `subsetter` crate.
//!
//! The subset renumbers glyphs densely. Content streams keep showing the original glyph
//! ids as CIDs, so the font carries a CID-to-GID map onto the new numbering.

use std::collections::{BTreeMap, BTreeSet};
use subsetter::GlyphRemapper;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot subset font: {0}")]
pub struct SubsetError(String);

/// A subset font program and where each shown glyph went
#[derive(Debug)]
pub struct Subset {
    pub program: Vec<u8>,
    remapped: BTreeMap<u16, u16>,
}

impl Subset {
    /// New glyph id of an original one, if it was kept
    pub fn new_gid(&self, gid: u16) -> Option<u16> {
        self.remapped.get(&gid).copied()
    }

    /// Two big-endian bytes per CID, from 0 up to the highest glyph shown. CIDs that
    /// were never shown map to glyph 0.
    pub fn cid_to_gid_map(&self) -> Vec<u8> {
        let last = self.remapped.keys().next_back().copied().unwrap_or(0);
        (0..=last)
            .flat_map(|cid| self.new_gid(cid).unwrap_or(0).to_be_bytes())
            .collect()
    }
}

/// Keep `used` glyphs of face `index` in `data`, plus glyph 0 and whatever composite
/// glyphs are built from
pub fn subset(data: &[u8], index: u32, used: &BTreeSet<u16>) -> Result<Subset, SubsetError> {
    let mut remapper = GlyphRemapper::new();
    let mut remapped = BTreeMap::new();
    for gid in std::iter::once(0).chain(used.iter().copied()) {
        remapped.insert(gid, remapper.remap(gid));
    }
    let program = subsetter::subset(data, index, &remapper).map_err(|e| SubsetError(format!("{e:?}")))?;
    log::trace!("subset keeps {} of the shown glyphs in {} bytes", remapped.len(), program.len());
    Ok(Subset { program, remapped })
}
