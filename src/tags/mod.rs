pub mod editor;
pub mod tree;

pub use editor::{AddTagOutcome, Rejection, TagEditor};
pub use tree::{MAX_TREE_DEPTH, NodeId, TagForest, TagNode, build_subtree};
