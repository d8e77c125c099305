//! Node Hierarchy
//!
//! Parent/child local transforms stored in an arena and addressed by
//! [`NodeIndex`]. World transforms are cached and recomputed eagerly by a
//! level-order (root to leaf) pass after every structural or local-transform
//! change, so a read never observes a stale world matrix.

use glam::Affine3A;

use super::transform::Transform;
use crate::errors::{Result, TidelightError};

/// Stable index of a node within its [`NodeHierarchy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub usize);

#[derive(Debug, Clone)]
pub struct HierarchyNode {
    pub name: String,
    local: Transform,
    parent: Option<NodeIndex>,
    children: Vec<NodeIndex>,
}

impl HierarchyNode {
    #[must_use]
    pub fn local(&self) -> &Transform {
        &self.local
    }

    #[must_use]
    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }
}

/// Arena of transform nodes with cached world matrices.
#[derive(Debug, Clone, Default)]
pub struct NodeHierarchy {
    nodes: Vec<HierarchyNode>,
    world: Vec<Affine3A>,
    /// Scratch queue for the level-order pass.
    queue: Vec<NodeIndex>,
}

impl NodeHierarchy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn node(&self, index: NodeIndex) -> Option<&HierarchyNode> {
        self.nodes.get(index.0)
    }

    /// Root nodes in insertion order.
    pub fn roots(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.parent.is_none())
            .map(|(i, _)| NodeIndex(i))
    }

    fn check(&self, index: NodeIndex) -> Result<()> {
        if index.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(TidelightError::InvalidNode {
                index: index.0,
                count: self.nodes.len(),
            })
        }
    }

    /// Appends a node under `parent` (or as a root).
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        local: Transform,
        parent: Option<NodeIndex>,
    ) -> Result<NodeIndex> {
        if let Some(p) = parent {
            self.check(p)?;
        }
        let index = NodeIndex(self.nodes.len());
        self.nodes.push(HierarchyNode {
            name: name.into(),
            local,
            parent,
            children: Vec::new(),
        });
        self.world.push(Affine3A::IDENTITY);
        if let Some(p) = parent {
            self.nodes[p.0].children.push(index);
        }
        self.update_world_transforms();
        Ok(index)
    }

    /// Moves `child` under `parent`, or makes it a root when `parent` is `None`.
    pub fn set_parent(&mut self, child: NodeIndex, parent: Option<NodeIndex>) -> Result<()> {
        self.check(child)?;
        if let Some(p) = parent {
            self.check(p)?;
            if self.is_ancestor_or_self(child, p) {
                return Err(TidelightError::HierarchyCycle {
                    child: child.0,
                    parent: p.0,
                });
            }
        }

        if let Some(old) = self.nodes[child.0].parent {
            self.nodes[old.0].children.retain(|&c| c != child);
        }
        self.nodes[child.0].parent = parent;
        if let Some(p) = parent {
            self.nodes[p.0].children.push(child);
        }
        self.update_world_transforms();
        Ok(())
    }

    pub fn set_local_transform(&mut self, index: NodeIndex, local: Transform) -> Result<()> {
        self.check(index)?;
        self.nodes[index.0].local = local;
        self.update_world_transforms();
        Ok(())
    }

    #[must_use]
    pub fn world_transform(&self, index: NodeIndex) -> Option<Affine3A> {
        self.world.get(index.0).copied()
    }

    /// Whether `ancestor` is `node` or lies on its parent chain.
    fn is_ancestor_or_self(&self, ancestor: NodeIndex, node: NodeIndex) -> bool {
        let mut current = Some(node);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.nodes[c.0].parent;
        }
        false
    }

    /// Level-order pass: each node's parent is resolved before the node.
    fn update_world_transforms(&mut self) {
        let mut queue = std::mem::take(&mut self.queue);
        queue.clear();
        queue.extend(self.roots());

        let mut head = 0;
        while head < queue.len() {
            let index = queue[head];
            head += 1;

            let node = &self.nodes[index.0];
            let local = node.local.to_affine();
            self.world[index.0] = match node.parent {
                Some(p) => self.world[p.0] * local,
                None => local,
            };
            queue.extend_from_slice(&node.children);
        }

        self.queue = queue;
    }
}
