//! Source parsing behind a crate-owned wrapper.
//!
//! `syn` is the only language-coupled dependency; everything above this layer
//! works with [`SourceTree`] and the record types in [`crate::scan`], so the
//! transformation passes never touch the host parser directly.

use crate::error::{Result, TwingenError};

/// An owned syntax tree for one source file.
///
/// Trees are never mutated in place: the rebuilder clones and edits the
/// clone, which keeps the original available for diffing against the
/// generated artifact.
#[derive(Debug, Clone)]
pub struct SourceTree {
    pub(crate) file: syn::File,
}

impl SourceTree {
    /// Parse file text into a tree, or fail with a parse error.
    pub fn parse(text: &str) -> Result<Self> {
        let file = syn::parse_file(text).map_err(|e| TwingenError::Parse(e.to_string()))?;
        Ok(Self { file })
    }

    /// Serialize back to formatted source text.
    pub fn to_source(&self) -> String {
        prettyplease::unparse(&self.file)
    }
}
