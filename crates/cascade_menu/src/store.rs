//! Shared dropdown state
//!
//! The open path, the hovered item, recorded alignments and the rect
//! registry used for hit testing across portal boundaries. One store per
//! dropdown root; the controller is its only writer.

use std::ops::Deref;

use cascade_core::geometry::Rect;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{MenuError, Result};
use crate::id::{ItemKey, MenuId};
use crate::tree::{Edge, MenuItemTree};

/// Root-to-leaf chain of open submenus
///
/// The root menu is never part of the path. Consecutive entries are
/// parent and child in the tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OpenPath(SmallVec<[MenuId; 4]>);

impl OpenPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self, id: &MenuId) -> Option<usize> {
        self.0.iter().position(|open| open == id)
    }

    pub fn deepest(&self) -> Option<&MenuId> {
        self.0.last()
    }

    pub fn to_vec(&self) -> Vec<MenuId> {
        self.0.to_vec()
    }

    /// Panics if the path is not a unique parent-to-child chain below the root
    pub fn assert_valid(&self, tree: &MenuItemTree) {
        for (i, id) in self.0.iter().enumerate() {
            assert!(
                !self.0[..i].contains(id),
                "open path contains {id} twice: {:?}",
                self.0
            );
            let parent = tree.get(id).and_then(|node| node.parent.as_ref());
            let expected = if i == 0 { tree.root() } else { self.0.get(i - 1) };
            assert!(
                parent.is_some() && parent == expected,
                "open path entry {id} is not a child of {expected:?}: {:?}",
                self.0
            );
        }
    }
}

impl Deref for OpenPath {
    type Target = [MenuId];

    fn deref(&self) -> &[MenuId] {
        &self.0
    }
}

/// Shared mutable state for one dropdown
#[derive(Debug, Default)]
pub struct MenuStore {
    open_path: OpenPath,
    hovered: Option<ItemKey>,
    alignment: FxHashMap<MenuId, Edge>,
    submenu_rects: FxHashMap<MenuId, Rect>,
    hitboxes: FxHashMap<MenuId, Rect>,
    epoch: u64,
}

impl MenuStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_path(&self) -> &OpenPath {
        &self.open_path
    }

    pub fn is_open(&self, id: &MenuId) -> bool {
        self.open_path.contains(id)
    }

    /// Incremented on every open path change
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Open `id`, making the path its ancestor chain.
    ///
    /// Opening a menu next to an open sibling closes the sibling and its
    /// descendants. Returns the menus that were closed, or `None` when the
    /// path did not change.
    pub fn open(&mut self, id: &MenuId, tree: &MenuItemTree) -> Result<Option<Vec<MenuId>>> {
        if !tree.contains(id) {
            return Err(MenuError::UnknownMenu(id.clone()));
        }
        if tree.root() == Some(id) {
            return Ok(None);
        }

        let chain: SmallVec<[MenuId; 4]> = tree
            .ancestors(id)
            .into_iter()
            .filter(|menu| Some(menu) != tree.root())
            .collect();
        if chain.as_slice() == &self.open_path[..] {
            return Ok(None);
        }

        let closed: Vec<MenuId> = self
            .open_path
            .iter()
            .filter(|open| !chain.contains(open))
            .cloned()
            .collect();
        self.open_path = OpenPath(chain);
        self.open_path.assert_valid(tree);
        self.forget(&closed);
        self.epoch += 1;
        Ok(Some(closed))
    }

    /// Close `id` and everything below it. Returns the closed menus.
    pub fn close(&mut self, id: &MenuId) -> Vec<MenuId> {
        match self.open_path.position(id) {
            Some(index) => self.truncate(index),
            None => Vec::new(),
        }
    }

    /// Keep the path up to and including `menu`, closing deeper menus.
    ///
    /// Collapsing to the root closes everything.
    pub fn collapse_to(&mut self, menu: &MenuId, tree: &MenuItemTree) -> Vec<MenuId> {
        if tree.root() == Some(menu) {
            return self.truncate(0);
        }
        match self.open_path.position(menu) {
            Some(index) => self.truncate(index + 1),
            None => {
                tracing::warn!(menu = %menu, "collapse target is not open");
                Vec::new()
            }
        }
    }

    /// Close every submenu
    pub fn clear(&mut self) -> Vec<MenuId> {
        self.truncate(0)
    }

    fn truncate(&mut self, len: usize) -> Vec<MenuId> {
        if len >= self.open_path.len() {
            return Vec::new();
        }
        let closed: Vec<MenuId> = self.open_path.0.drain(len..).collect();
        self.forget(&closed);
        self.epoch += 1;
        closed
    }

    fn forget(&mut self, closed: &[MenuId]) {
        for id in closed {
            self.alignment.remove(id);
            self.submenu_rects.remove(id);
            self.hitboxes.remove(id);
        }
    }

    /// Drop every trace of an unmounted menu
    pub fn remove_menu(&mut self, id: &MenuId) -> Vec<MenuId> {
        let closed = self.close(id);
        self.forget(std::slice::from_ref(id));
        closed
    }

    pub fn hovered(&self) -> Option<ItemKey> {
        self.hovered
    }

    /// Returns `true` if the hovered item changed
    pub fn set_hovered(&mut self, item: Option<ItemKey>) -> bool {
        if self.hovered == item {
            return false;
        }
        self.hovered = item;
        true
    }

    pub fn alignment_of(&self, id: &MenuId) -> Option<Edge> {
        self.alignment.get(id).copied()
    }

    pub fn record_alignment(&mut self, id: MenuId, edge: Edge) {
        self.alignment.insert(id, edge);
    }

    pub fn submenu_rect(&self, id: &MenuId) -> Option<&Rect> {
        self.submenu_rects.get(id)
    }

    pub fn set_submenu_rect(&mut self, id: MenuId, rect: Rect) {
        self.submenu_rects.insert(id, rect);
    }

    pub fn hitbox(&self, id: &MenuId) -> Option<&Rect> {
        self.hitboxes.get(id)
    }

    pub fn set_hitbox(&mut self, id: MenuId, rect: Option<Rect>) {
        match rect {
            Some(rect) => {
                self.hitboxes.insert(id, rect);
            }
            None => {
                self.hitboxes.remove(&id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> MenuItemTree {
        let mut tree = MenuItemTree::new();
        tree.insert_root("root".into()).unwrap();
        tree.insert("a".into(), &"root".into(), Edge::Right).unwrap();
        tree.insert("b".into(), &"a".into(), Edge::Right).unwrap();
        tree.insert("c".into(), &"a".into(), Edge::Right).unwrap();
        tree.insert("d".into(), &"b".into(), Edge::Right).unwrap();
        tree
    }

    fn ids(path: &OpenPath) -> Vec<String> {
        path.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_open_child_extends_path() {
        let tree = tree();
        let mut store = MenuStore::new();

        store.open(&"a".into(), &tree).unwrap();
        assert_eq!(ids(store.open_path()), vec!["a"]);

        store.open(&"b".into(), &tree).unwrap();
        assert_eq!(ids(store.open_path()), vec!["a", "b"]);
        assert_eq!(store.epoch(), 2);
    }

    #[test]
    fn test_open_sibling_closes_branch() {
        let tree = tree();
        let mut store = MenuStore::new();
        store.open(&"d".into(), &tree).unwrap();
        store.record_alignment("b".into(), Edge::Left);

        let closed = store.open(&"c".into(), &tree).unwrap().unwrap();
        assert_eq!(ids(store.open_path()), vec!["a", "c"]);
        assert_eq!(closed, vec![MenuId::from("b"), MenuId::from("d")]);
        assert_eq!(store.alignment_of(&"b".into()), None);
    }

    #[test]
    fn test_reopen_is_noop() {
        let tree = tree();
        let mut store = MenuStore::new();
        store.open(&"b".into(), &tree).unwrap();
        let epoch = store.epoch();

        assert!(store.open(&"b".into(), &tree).unwrap().is_none());
        assert_eq!(store.epoch(), epoch);
    }

    #[test]
    fn test_close_cascades() {
        let tree = tree();
        let mut store = MenuStore::new();
        store.open(&"d".into(), &tree).unwrap();

        let closed = store.close(&"a".into());
        assert_eq!(closed.len(), 3);
        assert!(store.open_path().is_empty());
        assert!(store.close(&"a".into()).is_empty());
    }

    #[test]
    fn test_collapse_to() {
        let tree = tree();
        let mut store = MenuStore::new();
        store.open(&"d".into(), &tree).unwrap();

        store.collapse_to(&"a".into(), &tree);
        assert_eq!(ids(store.open_path()), vec!["a"]);

        store.collapse_to(&"root".into(), &tree);
        assert!(store.open_path().is_empty());
    }

    #[test]
    fn test_unknown_menu_is_error() {
        let tree = tree();
        let mut store = MenuStore::new();
        assert!(matches!(
            store.open(&"zzz".into(), &tree),
            Err(MenuError::UnknownMenu(_))
        ));
    }

    #[test]
    #[should_panic(expected = "not a child")]
    fn test_broken_chain_panics() {
        let tree = tree();
        let path = OpenPath(SmallVec::from_vec(vec!["a".into(), "d".into()]));
        path.assert_valid(&tree);
    }

    #[test]
    fn test_hovered_change_detection() {
        let mut store = MenuStore::new();
        let mut keys = slotmap::SlotMap::<ItemKey, ()>::with_key();
        let key = keys.insert(());

        assert!(store.set_hovered(Some(key)));
        assert!(!store.set_hovered(Some(key)));
        assert!(store.set_hovered(None));
    }
}
