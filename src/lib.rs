//! # Guide - Hierarchical Outline Documents
//!
//! `guide-rs` reads and writes `.gde` outline files: an ordered tree of notes,
//! each with a title, a body and a handful of presentation attributes.
//!
//! - **Binary format version 2**, byte-compatible with existing files
//! - **Stable uids** per node, never reused within a document
//! - **Legacy pointer widths**: files written by 32-bit or 64-bit programs
//! - **Safe decoding**: every length field is bounds-checked and a damaged file
//!   never yields a partially built document
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use guide_rs::{ArchBits, Guide, Result};
//!
//! # fn main() -> Result<()> {
//! let mut guide = Guide::create()?;
//! let root = guide.root();
//! guide.node_mut(root).unwrap().set_title("The Beginning");
//!
//! let child = guide.new_node_with("My child", "Lorem ipsum dolor sit amet.")?;
//! guide.add_child(root, child, None)?;
//! guide.store("outline.gde")?;
//!
//! let loaded = Guide::load("outline.gde", ArchBits::Bits64)?;
//! for (node, depth) in loaded.preorder() {
//!     println!("{}{}", "-".repeat(depth), loaded.node(node).unwrap().title);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Older Files
//!
//! Node references in the format are as wide as a pointer on the machine that
//! wrote the file, and the file does not say which width that was. Pass the
//! width when loading:
//!
//! ```rust,no_run
//! use guide_rs::{ArchBits, Guide};
//!
//! let guide = Guide::load("from-win32.gde", ArchBits::Bits32)?;
//! guide.store("converted.gde")?; // rewritten with 8-byte references
//! # Ok::<(), guide_rs::GuideError>(())
//! ```

pub mod core;

pub use crate::core::{
    config::{GuideConfig, LoadOptions, StoreOptions},
    error::{GuideError, Result},
    guide::Guide,
    header::{ArchBits, Header, FORMAT_VERSION, MIN_FILE_SIZE, SIGNATURE},
    node::{NodeData, COLOR_UNSET},
    tree::{NodeId, Tree},
};

use std::path::Path;

/// Read and validate only the header of a guide file
///
/// Useful to tell whether a file is a guide at all before loading it.
///
/// # Examples
///
/// ```rust,no_run
/// let header = guide_rs::probe("outline.gde")?;
/// println!("format {} with counter {}", header.version, header.counter);
/// # Ok::<(), guide_rs::GuideError>(())
/// ```
pub fn probe<P: AsRef<Path>>(path: P) -> Result<Header> {
    crate::core::io::probe(path.as_ref())
}
