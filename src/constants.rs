/// Feature index marking a node as a leaf.
pub const LEAF_FEATURE_INDEX: i16 = -1;
/// Branch targets are stored as `u8`, so a tree holds at most this many nodes.
pub const MAX_NODES: usize = u8::MAX as usize + 1;
/// Prefix used when rendering compiled block labels.
pub const BLOCK_LABEL_PREFIX: &str = "node_";
