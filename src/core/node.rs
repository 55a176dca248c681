//! Per-node payload

/// Sentinel for "no color set, use the default"
pub const COLOR_UNSET: u32 = u32::MAX;

/// Content and presentation state attached to one tree node
///
/// A payload is created through a [`Guide`](crate::Guide) so that it receives a
/// uid from that document's allocator. It deliberately does not implement
/// `Clone`: copies go through [`Guide::clone_node`](crate::Guide::clone_node),
/// which assigns a fresh uid. Dropping the value releases its storage.
#[derive(Debug, PartialEq, Eq)]
pub struct NodeData {
    /// Node title (UTF-8 on disk)
    pub title: String,

    /// Body content, passed through as raw bytes
    pub text: Vec<u8>,

    /// UI state flags
    pub state: u32,

    /// Icon index
    pub icon: u32,

    /// First visible line of the body
    pub first_line: u32,

    /// Foreground color, [`COLOR_UNSET`] for default
    pub color: u32,

    /// Background color, [`COLOR_UNSET`] for default
    pub bgcolor: u32,

    /// Text control state flags
    pub tc_state: u32,

    uid: u32,
}

impl NodeData {
    pub(crate) fn new(uid: u32) -> Self {
        NodeData {
            title: String::new(),
            text: Vec::new(),
            state: 0,
            icon: 0,
            first_line: 0,
            color: COLOR_UNSET,
            bgcolor: COLOR_UNSET,
            tc_state: 0,
            uid,
        }
    }

    /// Copy every field except the uid
    pub(crate) fn duplicate(&self, uid: u32) -> Self {
        NodeData {
            title: self.title.clone(),
            text: self.text.clone(),
            state: self.state,
            icon: self.icon,
            first_line: self.first_line,
            color: self.color,
            bgcolor: self.bgcolor,
            tc_state: self.tc_state,
            uid,
        }
    }

    /// Durable identity, fixed at creation
    pub fn uid(&self) -> u32 {
        self.uid
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.as_bytes().to_vec();
    }

    /// Replace the body with exactly `bytes`
    ///
    /// Callers pass a non-empty slice; use [`set_text`](Self::set_text) with
    /// `""` to clear the body.
    pub fn set_text_bytes(&mut self, bytes: &[u8]) {
        debug_assert!(!bytes.is_empty(), "set_text_bytes requires a non-empty slice");
        self.text = bytes.to_vec();
    }

    /// Body as text, replacing invalid UTF-8
    pub fn text_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.text)
    }

    pub fn has_color(&self) -> bool {
        self.color != COLOR_UNSET
    }

    pub fn has_bgcolor(&self) -> bool {
        self.bgcolor != COLOR_UNSET
    }
}
