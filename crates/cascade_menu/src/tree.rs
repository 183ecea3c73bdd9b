//! Menu item tree
//!
//! Parent/child/depth relationships among menus. The controller mutates the
//! tree as items mount and unmount; positioning only reads it.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{MenuError, Result};
use crate::id::MenuId;

/// Horizontal side of the opener a submenu attaches to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Left,
    #[default]
    Right,
}

impl Edge {
    pub fn opposite(self) -> Self {
        match self {
            Edge::Left => Edge::Right,
            Edge::Right => Edge::Left,
        }
    }
}

/// One menu in the tree
#[derive(Clone, Debug, PartialEq)]
pub struct MenuNode {
    pub id: MenuId,
    pub parent: Option<MenuId>,
    pub depth: u32,
    pub preferred_edge: Edge,
    pub open: bool,
}

/// Registry of every mounted menu
#[derive(Debug, Default)]
pub struct MenuItemTree {
    nodes: FxHashMap<MenuId, MenuNode>,
    root: Option<MenuId>,
}

impl MenuItemTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the top-level menu at depth 0
    pub fn insert_root(&mut self, id: MenuId) -> Result<()> {
        if self.nodes.contains_key(&id) {
            return Err(MenuError::DuplicateMenu(id));
        }
        self.nodes.insert(
            id.clone(),
            MenuNode {
                id: id.clone(),
                parent: None,
                depth: 0,
                preferred_edge: Edge::default(),
                open: true,
            },
        );
        self.root = Some(id);
        Ok(())
    }

    /// Register a submenu under `parent`
    pub fn insert(&mut self, id: MenuId, parent: &MenuId, preferred_edge: Edge) -> Result<u32> {
        if self.nodes.contains_key(&id) {
            return Err(MenuError::DuplicateMenu(id));
        }
        let depth = match self.nodes.get(parent) {
            Some(node) => node.depth + 1,
            None => return Err(MenuError::UnknownMenu(parent.clone())),
        };

        self.nodes.insert(
            id.clone(),
            MenuNode {
                id,
                parent: Some(parent.clone()),
                depth,
                preferred_edge,
                open: false,
            },
        );
        Ok(depth)
    }

    /// Remove a menu and every descendant. Returns the removed IDs, parents first.
    pub fn remove(&mut self, id: &MenuId) -> Vec<MenuId> {
        let mut removed = Vec::new();
        if !self.nodes.contains_key(id) {
            return removed;
        }

        let mut queue = vec![id.clone()];
        while let Some(current) = queue.pop() {
            queue.extend(self.children_of(&current));
            if self.nodes.remove(&current).is_some() {
                removed.push(current);
            }
        }

        if self.root.as_ref() == Some(id) {
            self.root = None;
        }
        removed
    }

    pub fn root(&self) -> Option<&MenuId> {
        self.root.as_ref()
    }

    pub fn get(&self, id: &MenuId) -> Option<&MenuNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &MenuId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Parent node of `id`, `None` for the root or an unknown menu
    pub fn parent_of(&self, id: &MenuId) -> Option<&MenuNode> {
        let Some(node) = self.nodes.get(id) else {
            tracing::warn!(menu = %id, "parent lookup for unknown menu");
            return None;
        };
        node.parent.as_ref().and_then(|parent| self.nodes.get(parent))
    }

    /// Depth of a registered menu, `None` if unknown
    pub fn depth_of_child(&self, id: &MenuId) -> Option<u32> {
        match self.nodes.get(id) {
            Some(node) => Some(node.depth),
            None => {
                tracing::warn!(menu = %id, "depth lookup for unknown menu");
                None
            }
        }
    }

    /// Chain from the root down to `id`, inclusive of both
    pub fn ancestors(&self, id: &MenuId) -> SmallVec<[MenuId; 4]> {
        let mut chain = SmallVec::new();
        let mut current = self.nodes.get(id);
        while let Some(node) = current {
            chain.push(node.id.clone());
            current = node.parent.as_ref().and_then(|parent| self.nodes.get(parent));
        }
        chain.reverse();
        chain
    }

    /// Direct children of `id`
    pub fn children_of(&self, id: &MenuId) -> Vec<MenuId> {
        let mut children: Vec<MenuId> = self
            .nodes
            .values()
            .filter(|node| node.parent.as_ref() == Some(id))
            .map(|node| node.id.clone())
            .collect();
        children.sort();
        children
    }

    /// Whether `ancestor` lies on the parent chain of `id` (or is `id`)
    pub fn is_ancestor_or_self(&self, ancestor: &MenuId, id: &MenuId) -> bool {
        let mut current = self.nodes.get(id);
        while let Some(node) = current {
            if &node.id == ancestor {
                return true;
            }
            current = node.parent.as_ref().and_then(|parent| self.nodes.get(parent));
        }
        false
    }

    pub fn set_open(&mut self, id: &MenuId, open: bool) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.open = open;
        }
    }

    pub fn set_preferred_edge(&mut self, id: &MenuId, edge: Edge) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.preferred_edge = edge;
        }
    }

    /// Stacking order of a submenu
    ///
    /// Each depth takes two slots: the menu itself and its scrollbar hit-box
    /// layer above it.
    pub fn z_index(&self, id: &MenuId, base: i32) -> i32 {
        match self.nodes.get(id) {
            Some(node) => node.depth as i32 * 2 + base,
            None => {
                tracing::error!(menu = %id, "no depth recorded, using base z-index");
                base
            }
        }
    }
}
