//! Byte stream -> Guide
//!
//! Records carry file-local node and parent references instead of structural
//! positions. Because records arrive in preorder, a parent's record always
//! precedes its children, so a single pass with a reference -> handle remap
//! table reconnects every edge.
//!
//! Decoding runs in two phases: every record is parsed and bounds-checked
//! first, then the tree is built. A malformed file therefore never yields a
//! partially populated guide.

use crate::core::encode::{
    NODE_ATTR_BGCOLOR, NODE_ATTR_COLOR, NODE_ATTR_FIRST_LINE, NODE_ATTR_ICON, NODE_ATTR_STATE,
    NODE_ATTR_TC_STATE, NODE_ATTR_UID,
};
use crate::core::error::{GuideError, Result};
use crate::core::guide::Guide;
use crate::core::header::{le_u32, ArchBits, ByteReader, Header};
use crate::core::node::{NodeData, COLOR_UNSET};
use crate::core::tree::NodeId;
use crate::core::uid::UidAllocator;
use ahash::AHashMap;
use tracing::{debug, warn};

/// One parsed node record, before it is attached to a tree
#[derive(Debug)]
struct NodeRecord {
    node_ref: u64,
    parent_ref: u64,
    uid: Option<u32>,
    state: u32,
    icon: u32,
    first_line: u32,
    color: u32,
    bgcolor: u32,
    tc_state: u32,
    title: String,
    text: Vec<u8>,
}

impl NodeRecord {
    fn read(reader: &mut ByteReader<'_>, arch: ArchBits) -> Result<Self> {
        let node_ref = reader.node_ref(arch)?;
        let parent_ref = reader.node_ref(arch)?;

        let mut record = NodeRecord {
            node_ref,
            parent_ref,
            uid: None,
            state: 0,
            icon: 0,
            first_line: 0,
            color: COLOR_UNSET,
            bgcolor: COLOR_UNSET,
            tc_state: 0,
            title: String::new(),
            text: Vec::new(),
        };

        let attr_count = reader.u32()?;
        for _ in 0..attr_count {
            let offset = reader.offset();
            let id = reader.u32()?;
            let len = reader.u32()?;
            let value = reader.take(len as usize)?;

            let slot = match id {
                NODE_ATTR_STATE => &mut record.state,
                NODE_ATTR_ICON => &mut record.icon,
                NODE_ATTR_FIRST_LINE => &mut record.first_line,
                NODE_ATTR_COLOR => &mut record.color,
                NODE_ATTR_BGCOLOR => &mut record.bgcolor,
                NODE_ATTR_TC_STATE => &mut record.tc_state,
                NODE_ATTR_UID => {
                    let uid = le_u32(value).ok_or(GuideError::InvalidAttribute { id, len, offset })?;
                    record.uid = Some(uid);
                    continue;
                }
                _ => {
                    warn!("Skipping unknown node attribute {} ({} bytes) at {}", id, len, offset);
                    continue;
                }
            };
            *slot = le_u32(value).ok_or(GuideError::InvalidAttribute { id, len, offset })?;
        }

        let title_len = reader.u32()? as usize;
        let title = reader.take(title_len)?;
        record.title = match std::str::from_utf8(title) {
            Ok(title) => title.to_owned(),
            Err(e) => {
                warn!("Node {:#x} has an invalid UTF-8 title: {}", node_ref, e);
                String::from_utf8_lossy(title).into_owned()
            }
        };

        let text_len = reader.u32()? as usize;
        record.text = reader.take(text_len)?.to_vec();

        Ok(record)
    }

    fn into_data(self, uid: u32) -> NodeData {
        let mut data = NodeData::new(uid);
        data.title = self.title;
        data.text = self.text;
        data.state = self.state;
        data.icon = self.icon;
        data.first_line = self.first_line;
        data.color = self.color;
        data.bgcolor = self.bgcolor;
        data.tc_state = self.tc_state;
        data
    }
}

/// Decode a complete file image
///
/// `origin` is the pointer width of the machine that wrote the file; it decides
/// how wide the node and parent references are.
pub fn decode(bytes: &[u8], origin: ArchBits) -> Result<Guide> {
    let header = Header::from_bytes(bytes)?;
    let mut reader = ByteReader::at(bytes, header.len);

    // Phase 1: parse. The first record is mandatory.
    let mut records = vec![NodeRecord::read(&mut reader, origin)?];
    while !reader.is_empty() {
        records.push(NodeRecord::read(&mut reader, origin)?);
    }

    // Phase 2: build.
    let max_uid = records
        .iter()
        .filter_map(|r| r.uid)
        .fold(header.counter, u32::max);
    let mut uids = UidAllocator::new();
    uids.fast_forward(max_uid);
    debug!(
        "Decoded {} records; header counter {}, allocator resumes after {}",
        records.len(),
        header.counter,
        max_uid
    );

    let mut records = records.into_iter();
    let root_record = records
        .next()
        .ok_or(GuideError::Truncated {
            offset: header.len,
            needed: 1,
            remaining: 0,
        })?;
    let root_ref = root_record.node_ref;
    let root_uid = match root_record.uid {
        Some(uid) => uid,
        None => uids.next()?,
    };
    let mut guide = Guide::with_root(root_record.into_data(root_uid), uids)?;

    let mut remap: AHashMap<u64, NodeId> = AHashMap::new();
    remap.insert(root_ref, guide.root());

    for record in records {
        let parent = *remap
            .get(&record.parent_ref)
            .ok_or(GuideError::UnresolvedParent {
                parent_ref: record.parent_ref,
            })?;
        let node_ref = record.node_ref;
        let uid = match record.uid {
            Some(uid) => uid,
            None => guide.allocate_uid()?,
        };

        // Appending after the current last child rebuilds the written order.
        let node = guide.add_child(parent, record.into_data(uid), None)?;
        if remap.insert(node_ref, node).is_some() {
            warn!("Node reference {:#x} appears more than once; using the latest", node_ref);
        }
    }

    if header.selected_ref != 0 {
        match resolve_selected(&remap, header.selected_ref, origin) {
            Some(node) => guide.set_selected(Some(node))?,
            None => warn!(
                "Selected node reference {:#x} does not match any node",
                header.selected_ref
            ),
        }
    }

    Ok(guide)
}

/// Map the header's selected reference onto a decoded node
///
/// Writers on 64-bit machines stored the selected address in a 4-byte
/// attribute, keeping only its low half. When no reference matches exactly,
/// a single node whose low 32 bits match is accepted; several are ambiguous.
fn resolve_selected(
    remap: &AHashMap<u64, NodeId>,
    selected_ref: u64,
    origin: ArchBits,
) -> Option<NodeId> {
    if let Some(&node) = remap.get(&selected_ref) {
        return Some(node);
    }
    if origin != ArchBits::Bits64 || selected_ref > u64::from(u32::MAX) {
        return None;
    }

    let mut matches = remap
        .iter()
        .filter(|(node_ref, _)| **node_ref & 0xffff_ffff == selected_ref)
        .map(|(_, &node)| node);
    let first = matches.next()?;
    if matches.next().is_some() {
        warn!(
            "Selected node reference {:#x} matches several nodes by its low 32 bits",
            selected_ref
        );
        return None;
    }
    debug!("Selected node resolved by low 32 bits of {:#x}", selected_ref);
    Some(first)
}
