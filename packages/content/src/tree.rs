//! Flat arena of page blocks.
//!
//! Containers store their children inline in `content_json.children`. When a
//! page is loaded those children are lifted out into the arena so that
//! nesting depth is unbounded without recursive ownership, and every node
//! knows its parent.

use serde_json::Value;
use tracing::debug;

use crate::block::{BlockKind, PageBlock};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BlockNode {
    /// The block itself. For containers, `children` has been removed from the
    /// content and lives in the arena instead.
    pub block: PageBlock,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub depth: usize,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BlockTree {
    nodes: Vec<BlockNode>,
    roots: Vec<NodeId>,
}

impl BlockTree {
    /// Build the arena from a page's ordered top-level blocks. Nodes are stored
    /// in document order (pre-order).
    pub fn from_blocks(blocks: impl IntoIterator<Item = PageBlock>) -> Self {
        let mut tree = Self::default();
        for block in blocks {
            let id = tree.insert(block, None, 0);
            tree.roots.push(id);
        }
        tree
    }

    fn insert(&mut self, mut block: PageBlock, parent: Option<NodeId>, depth: usize) -> NodeId {
        let children = if block.kind() == Some(BlockKind::Container) {
            take_children(&mut block)
        } else {
            Vec::new()
        };

        let id = NodeId(self.nodes.len());
        self.nodes.push(BlockNode {
            block,
            parent,
            children: Vec::new(),
            depth,
        });

        let child_ids: Vec<NodeId> = children
            .into_iter()
            .map(|child| self.insert(child, Some(id), depth + 1))
            .collect();
        self.nodes[id.0].children = child_ids;
        id
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Panics if `id` did not come from this tree.
    pub fn node(&self, id: NodeId) -> &BlockNode {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&BlockNode> {
        self.nodes.get(id.0)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Total node count, nested children included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in document order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &BlockNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Rebuild the inline representation: each container gets its children
    /// written back into `content_json.children`.
    pub fn to_blocks(&self) -> Vec<PageBlock> {
        self.roots.iter().map(|&id| self.to_block(id)).collect()
    }

    fn to_block(&self, id: NodeId) -> PageBlock {
        let node = self.node(id);
        let mut block = node.block.clone();
        if !node.children.is_empty() {
            let children: Vec<Value> = node
                .children
                .iter()
                .filter_map(|&child| serde_json::to_value(self.to_block(child)).ok())
                .collect();
            if let Some(content) = block.content_json.as_object_mut() {
                content.insert("children".into(), Value::Array(children));
            }
        }
        block
    }
}

/// Remove and parse a container's inline children. Entries that are not
/// block-shaped are dropped.
fn take_children(block: &mut PageBlock) -> Vec<PageBlock> {
    let Some(raw) = block
        .content_json
        .as_object_mut()
        .and_then(|content| content.remove("children"))
    else {
        return Vec::new();
    };
    let Value::Array(entries) = raw else {
        debug!(block_id = %block.id, "container children is not an array, ignoring");
        return Vec::new();
    };
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<PageBlock>(entry) {
            Ok(child) => Some(child),
            Err(e) => {
                debug!(block_id = %block.id, error = %e, "skipping malformed container child");
                None
            }
        })
        .collect()
}
