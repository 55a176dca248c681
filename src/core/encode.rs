//! Guide -> byte stream
//!
//! Node records follow the header in preorder:
//!
//! ```text
//! node_ref    u32 | u64   (correlation token, width chosen by the caller)
//! parent_ref  u32 | u64   (0 for the root)
//! attr_count  u32 = 7
//!   { id u32, len u32 = 4, value u32 } * 7
//! title_len   u32, title bytes (UTF-8)
//! text_len    u32, text bytes
//! ```
//!
//! Correlation tokens are 1-based preorder positions. They only have to be
//! unique within one file; the uid attribute is the durable identity.

use crate::core::error::{GuideError, Result};
use crate::core::guide::Guide;
use crate::core::header::{put_u32_attr, ArchBits, Header};
use crate::core::node::NodeData;
use crate::core::tree::NodeId;
use ahash::AHashMap;

pub const NODE_ATTR_STATE: u32 = 1;
pub const NODE_ATTR_ICON: u32 = 2;
pub const NODE_ATTR_FIRST_LINE: u32 = 3;
pub const NODE_ATTR_COLOR: u32 = 4;
pub const NODE_ATTR_BGCOLOR: u32 = 5;
pub const NODE_ATTR_UID: u32 = 6;
pub const NODE_ATTR_TC_STATE: u32 = 7;

/// Attributes written per node
pub const NODE_ATTR_COUNT: u32 = 7;

/// Encode `guide` into a complete file image
pub fn encode(guide: &Guide, ref_width: ArchBits) -> Result<Vec<u8>> {
    let tree = guide.tree();
    if ref_width == ArchBits::Bits32 && tree.len() > u32::MAX as usize {
        return Err(GuideError::TooManyNodes);
    }

    let mut tokens: AHashMap<NodeId, u64> = AHashMap::with_capacity(tree.len());
    for (position, (id, _)) in tree.preorder().enumerate() {
        tokens.insert(id, position as u64 + 1);
    }

    let selected = guide
        .selected()
        .and_then(|id| tokens.get(&id).copied())
        .unwrap_or(0);
    let selected = u32::try_from(selected).map_err(|_| GuideError::TooManyNodes)?;

    let mut out = Header::to_bytes(guide.uid_counter(), selected);

    for (id, _) in tree.preorder() {
        let Some(data) = tree.get(id) else { continue };
        let token = tokens[&id];
        let parent = tree
            .parent(id)
            .and_then(|p| tokens.get(&p).copied())
            .unwrap_or(0);

        put_ref(&mut out, token, ref_width);
        put_ref(&mut out, parent, ref_width);
        put_node_attrs(&mut out, data);
        put_bytes(&mut out, data.title.as_bytes())?;
        put_bytes(&mut out, &data.text)?;
    }

    tracing::debug!(
        "Encoded {} nodes into {} bytes ({}-bit refs)",
        tree.len(),
        out.len(),
        ref_width
    );
    Ok(out)
}

fn put_ref(out: &mut Vec<u8>, value: u64, width: ArchBits) {
    match width {
        // Tokens fit: the node count was checked against u32::MAX above.
        ArchBits::Bits32 => out.extend_from_slice(&(value as u32).to_le_bytes()),
        ArchBits::Bits64 => out.extend_from_slice(&value.to_le_bytes()),
    }
}

fn put_node_attrs(out: &mut Vec<u8>, data: &NodeData) {
    out.extend_from_slice(&NODE_ATTR_COUNT.to_le_bytes());
    put_u32_attr(out, NODE_ATTR_STATE, data.state);
    put_u32_attr(out, NODE_ATTR_ICON, data.icon);
    put_u32_attr(out, NODE_ATTR_FIRST_LINE, data.first_line);
    put_u32_attr(out, NODE_ATTR_COLOR, data.color);
    put_u32_attr(out, NODE_ATTR_BGCOLOR, data.bgcolor);
    put_u32_attr(out, NODE_ATTR_UID, data.uid());
    put_u32_attr(out, NODE_ATTR_TC_STATE, data.tc_state);
}

fn put_bytes(out: &mut Vec<u8>, bytes: &[u8]) -> Result<()> {
    let len = field_len(bytes.len())?;
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(bytes);
    Ok(())
}

fn field_len(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| GuideError::FieldTooLong { len })
}
