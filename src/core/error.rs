use crate::core::tree::NodeId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GuideError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File too short to be a guide: {len} bytes (minimum 20)")]
    TooShort { len: u64 },

    #[error("Invalid signature: not a guide file")]
    InvalidSignature,

    #[error("Unsupported format version: {0}")]
    UnsupportedVersion(u32),

    #[error("Truncated data at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("Invalid attribute {id} with length {len} at offset {offset}")]
    InvalidAttribute { id: u32, len: u32, offset: usize },

    #[error("Unresolved parent reference: {parent_ref:#x}")]
    UnresolvedParent { parent_ref: u64 },

    #[error("Duplicate uid: {0}")]
    DuplicateUid(u32),

    #[error("Invalid node handle: {0}")]
    InvalidNode(NodeId),

    #[error("The root node has no siblings")]
    RootHasNoSiblings,

    #[error("The root node cannot be deleted")]
    CannotDeleteRoot,

    #[error("Node {after} is not a child of {parent}")]
    NotAChild { parent: NodeId, after: NodeId },

    #[error("Uid space exhausted")]
    UidExhausted,

    #[error("Too many nodes for 32-bit node references")]
    TooManyNodes,

    #[error("Field of {len} bytes does not fit a 32-bit length prefix")]
    FieldTooLong { len: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GuideError {
    /// Operating system error code, when the failure came from the OS
    pub fn os_error_code(&self) -> Option<i32> {
        match self {
            GuideError::Io(e) => e.raw_os_error(),
            _ => None,
        }
    }

    /// True when the input is not a recognized guide document
    ///
    /// These failures carry no OS error code.
    pub fn is_unrecognized(&self) -> bool {
        matches!(
            self,
            GuideError::TooShort { .. }
                | GuideError::InvalidSignature
                | GuideError::UnsupportedVersion(_)
        )
    }

    /// True when a recognized file failed structural checks
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            GuideError::Truncated { .. }
                | GuideError::InvalidAttribute { .. }
                | GuideError::UnresolvedParent { .. }
                | GuideError::DuplicateUid(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, GuideError>;
