//! Integration tests for hover intent, click handling and open path sync
//!
//! These tests drive a three-level dropdown through the headless geometry
//! provider:
//!
//! ```text
//! root ── File ─┬─ New
//!        Edit   ├─ Export ─┬─ PNG
//!               │          └─ SVG
//!               └─ Share ──── Email
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use cascade_core::geometry::Point;
use cascade_menu::prelude::*;
use pretty_assertions::assert_eq;

struct Fixture {
    dropdown: Dropdown<HeadlessGeometry>,
    file: ItemKey,
    edit: ItemKey,
    new: ItemKey,
    export: ItemKey,
    share: ItemKey,
    png: ItemKey,
    file_menu: MenuId,
    export_menu: MenuId,
    share_menu: MenuId,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn fixture(config: MenuConfig) -> Fixture {
    init_tracing();

    let geometry = HeadlessGeometry::new(ViewportSnapshot::simple(1280.0, 800.0));
    let mut dropdown = Dropdown::new("root", geometry, config).unwrap();
    let root = dropdown.root().clone();
    dropdown
        .geometry_mut()
        .place_menu(&root, Point::new(20.0, 40.0), 220.0, None);

    let file = dropdown.add_item(&root, "File").unwrap();
    let edit = dropdown.add_item(&root, "Edit").unwrap();
    let file_menu = dropdown.set_submenu_id(file, "file").unwrap();
    dropdown.set_submenu_id(edit, "edit").unwrap();

    let new = dropdown.add_item(&file_menu, "New").unwrap();
    let export = dropdown.add_item(&file_menu, "Export").unwrap();
    let share = dropdown.add_item(&file_menu, "Share").unwrap();
    let export_menu = dropdown.set_submenu_id(export, "export").unwrap();
    let share_menu = dropdown.set_submenu_id(share, "share").unwrap();

    let png = dropdown.add_item(&export_menu, "PNG").unwrap();
    dropdown.add_item(&export_menu, "SVG").unwrap();
    dropdown.add_item(&share_menu, "Email").unwrap();

    Fixture {
        dropdown,
        file,
        edit,
        new,
        export,
        share,
        png,
        file_menu,
        export_menu,
        share_menu,
    }
}

fn path(dropdown: &Dropdown<HeadlessGeometry>) -> Vec<String> {
    dropdown.open_path().iter().map(|id| id.to_string()).collect()
}

fn state(dropdown: &Dropdown<HeadlessGeometry>, key: ItemKey) -> HoverState {
    dropdown.item(key).map(|item| item.hover_state()).unwrap()
}

fn center(dropdown: &Dropdown<HeadlessGeometry>, key: ItemKey) -> Point {
    dropdown.geometry().item_center(key).unwrap()
}

/// Hover File, then Export, opening the chain through hover intent
fn hover_open_export(f: &mut Fixture) {
    f.dropdown.pointer_enter(f.file);
    f.dropdown.advance_by(200);

    let target = center(&f.dropdown, f.export);
    f.dropdown.pointer_leave(f.file, target);
    f.dropdown.pointer_enter(f.export);
    f.dropdown.advance_by(200);
}

#[test]
fn test_hover_intent_opens_only_hovered_chain() {
    let mut f = fixture(MenuConfig::default());

    f.dropdown.pointer_enter(f.file);
    assert_eq!(state(&f.dropdown, f.file), HoverState::PendingOpen);

    f.dropdown.advance_by(199);
    assert!(f.dropdown.open_path().is_empty());

    f.dropdown.advance_by(1);
    assert_eq!(path(&f.dropdown), vec!["file"]);
    assert_eq!(state(&f.dropdown, f.file), HoverState::Open);

    // Moving into the portaled submenu is not a leave
    let target = center(&f.dropdown, f.export);
    f.dropdown.pointer_leave(f.file, target);
    assert!(f.dropdown.item(f.file).unwrap().pointer_inside());

    f.dropdown.pointer_enter(f.export);
    f.dropdown.advance_by(200);

    assert_eq!(path(&f.dropdown), vec!["file", "export"]);
    assert_eq!(state(&f.dropdown, f.edit), HoverState::Closed);
    assert_eq!(state(&f.dropdown, f.share), HoverState::Closed);
    assert_eq!(f.dropdown.hovered_item(), Some(f.export));
    assert_eq!(f.dropdown.stats().open_calls, 2);
}

#[test]
fn test_nested_placement_follows_opener() {
    let mut f = fixture(MenuConfig::default());
    hover_open_export(&mut f);

    let file = f.dropdown.placement(&f.file_menu).unwrap();
    assert_eq!((file.left, file.top), (241.0, 40.0));
    assert_eq!(file.z_index, 12);

    let export = f.dropdown.placement(&f.export_menu).unwrap();
    assert_eq!((export.left, export.top), (442.0, 70.0));
    assert_eq!(export.edge, Edge::Right);
    assert_eq!(export.z_index, 14);
}

#[test]
fn test_leaving_through_submenu_closes_after_delay() {
    let mut f = fixture(MenuConfig::default());
    f.dropdown.pointer_enter(f.file);
    f.dropdown.advance_by(200);

    let inside = center(&f.dropdown, f.new);
    f.dropdown.pointer_leave(f.file, inside);
    f.dropdown.pointer_move(inside);
    assert_eq!(state(&f.dropdown, f.file), HoverState::Open);

    f.dropdown.pointer_move(Point::new(1100.0, 700.0));
    assert_eq!(state(&f.dropdown, f.file), HoverState::PendingClose);

    f.dropdown.advance_by(199);
    assert_eq!(path(&f.dropdown), vec!["file"]);
    f.dropdown.advance_by(1);
    assert!(f.dropdown.open_path().is_empty());
    assert_eq!(state(&f.dropdown, f.file), HoverState::Closed);
    assert_eq!(f.dropdown.stats().close_calls, 1);
}

#[test]
fn test_reenter_during_pending_close_keeps_open() {
    let mut f = fixture(MenuConfig::default());
    f.dropdown.pointer_enter(f.file);
    f.dropdown.advance_by(200);

    f.dropdown.pointer_leave(f.file, Point::new(1100.0, 700.0));
    assert_eq!(state(&f.dropdown, f.file), HoverState::PendingClose);

    f.dropdown.advance_by(100);
    f.dropdown.pointer_enter(f.file);
    assert_eq!(state(&f.dropdown, f.file), HoverState::Open);

    f.dropdown.advance_by(1_000);
    assert_eq!(path(&f.dropdown), vec!["file"]);
    assert_eq!(f.dropdown.stats().close_calls, 0);
}

#[test]
fn test_passing_over_item_does_not_open() {
    let mut f = fixture(MenuConfig::default());
    f.dropdown.pointer_enter(f.file);
    f.dropdown.advance_by(50);
    f.dropdown.pointer_leave(f.file, Point::new(1100.0, 700.0));
    f.dropdown.advance_by(1_000);

    assert!(f.dropdown.open_path().is_empty());
    assert_eq!(f.dropdown.stats().total(), 0);
    assert_eq!(f.dropdown.pending_timers(), 0);
    assert_eq!(f.dropdown.hovered_item(), None);
}

#[test]
fn test_hovering_sibling_swaps_submenus() {
    let mut f = fixture(MenuConfig::default());
    hover_open_export(&mut f);
    let before = f.dropdown.stats();

    let target = center(&f.dropdown, f.share);
    f.dropdown.pointer_leave(f.export, target);
    f.dropdown.pointer_enter(f.share);
    assert_eq!(state(&f.dropdown, f.export), HoverState::PendingClose);
    assert_eq!(state(&f.dropdown, f.share), HoverState::PendingOpen);

    f.dropdown.advance_by(200);

    assert_eq!(path(&f.dropdown), vec!["file", "share"]);
    assert_eq!(state(&f.dropdown, f.export), HoverState::Closed);
    assert_eq!(state(&f.dropdown, f.share), HoverState::Open);

    let after = f.dropdown.stats();
    assert_eq!(after.close_calls - before.close_calls, 1);
    assert_eq!(after.open_calls - before.open_calls, 1);
}

#[test]
fn test_leaf_click_collapses_sibling_branch() {
    let mut config = MenuConfig::default();
    config.interaction.close_on_click_leaf_item = false;
    let mut f = fixture(config);
    hover_open_export(&mut f);

    let outcome = f.dropdown.click(f.new);

    assert_eq!(
        outcome,
        ClickOutcome {
            propagate: false,
            dismissed: false,
            suppressed: false,
        }
    );
    assert_eq!(path(&f.dropdown), vec!["file"]);
    assert_eq!(state(&f.dropdown, f.export), HoverState::Closed);
    assert_eq!(state(&f.dropdown, f.file), HoverState::Open);
    assert_eq!(f.dropdown.stats().collapse_calls, 1);
}

#[test]
fn test_leaf_click_in_deepest_menu_keeps_chain() {
    let mut config = MenuConfig::default();
    config.interaction.close_on_click_leaf_item = false;
    let mut f = fixture(config);
    hover_open_export(&mut f);

    let outcome = f.dropdown.click(f.png);

    assert!(!outcome.propagate);
    assert_eq!(path(&f.dropdown), vec!["file", "export"]);
}

#[test]
fn test_leaf_click_dismisses_by_default() {
    let mut f = fixture(MenuConfig::default());
    let dismissed = Rc::new(RefCell::new(0));
    let counter = dismissed.clone();
    f.dropdown
        .add_listener(MenuEventKind::Dismiss, move |_| *counter.borrow_mut() += 1);

    hover_open_export(&mut f);
    let before = f.dropdown.stats().total();
    let outcome = f.dropdown.click(f.png);

    assert!(outcome.propagate);
    assert!(outcome.dismissed);
    assert!(f.dropdown.open_path().is_empty());
    assert_eq!(*dismissed.borrow(), 1);
    assert_eq!(f.dropdown.stats().total() - before, 1);
}

#[test]
fn test_submenu_click_toggles_without_timers() {
    let mut f = fixture(MenuConfig::default());

    let outcome = f.dropdown.click(f.file);
    assert!(!outcome.propagate);
    assert_eq!(path(&f.dropdown), vec!["file"]);

    f.dropdown.click(f.export);
    assert_eq!(path(&f.dropdown), vec!["file", "export"]);

    f.dropdown.click(f.export);
    assert_eq!(path(&f.dropdown), vec!["file"]);
    assert_eq!(f.dropdown.pending_timers(), 0);
}

#[test]
fn test_close_cascades_with_single_controller_call() {
    let mut f = fixture(MenuConfig::default());
    f.dropdown.open_submenu(&f.file_menu).unwrap();
    f.dropdown.open_submenu(&f.export_menu).unwrap();
    assert_eq!(path(&f.dropdown), vec!["file", "export"]);

    let before = f.dropdown.stats();
    let file_menu = f.file_menu.clone();
    f.dropdown.close_submenu(&file_menu);

    assert!(f.dropdown.open_path().is_empty());
    assert_eq!(state(&f.dropdown, f.file), HoverState::Closed);
    assert_eq!(state(&f.dropdown, f.export), HoverState::Closed);

    let after = f.dropdown.stats();
    assert_eq!(after.close_calls - before.close_calls, 1);
    assert_eq!(after.total() - before.total(), 1);
}

#[test]
fn test_rapid_toggling_issues_one_request_per_click() {
    let mut f = fixture(MenuConfig::default());
    f.dropdown.open_submenu(&f.file_menu).unwrap();
    let before = f.dropdown.stats().total();

    for i in 1..=25 {
        f.dropdown.click(f.export);
        let open = i % 2 == 1;
        assert_eq!(f.dropdown.is_open(&f.export_menu), open);
        let expected = if open {
            HoverState::Open
        } else {
            HoverState::Closed
        };
        assert_eq!(state(&f.dropdown, f.export), expected);
    }

    assert_eq!(f.dropdown.stats().total() - before, 25);
    assert_eq!(path(&f.dropdown), vec!["file", "export"]);
}

#[test]
fn test_open_path_events() {
    let mut f = fixture(MenuConfig::default());
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    f.dropdown.add_listener(MenuEventKind::OpenPathChange, move |event| {
        if let MenuEvent::OpenPathChange(path) = event {
            sink.borrow_mut().push(path.len());
        }
    });

    f.dropdown.click(f.file);
    f.dropdown.click(f.export);
    let file_menu = f.file_menu.clone();
    f.dropdown.close_submenu(&file_menu);

    assert_eq!(*seen.borrow(), vec![1, 2, 0]);
}

#[test]
fn test_hover_events_disabled() {
    let mut config = MenuConfig::default();
    config.interaction.mouse_hover_events = false;
    let mut f = fixture(config);

    f.dropdown.pointer_enter(f.file);
    f.dropdown.advance_by(1_000);
    assert!(f.dropdown.open_path().is_empty());
    assert_eq!(f.dropdown.hovered_item(), Some(f.file));

    f.dropdown.click(f.file);
    assert_eq!(path(&f.dropdown), vec!["file"]);
}

#[test]
fn test_scroll_arrow_press_suppresses_next_click() {
    let mut f = fixture(MenuConfig::default());
    let menu = f.file_menu.clone();
    f.dropdown.open_submenu(&menu).unwrap();

    f.dropdown.pointer_down(PointerDownTarget::ScrollArrow {
        menu,
        direction: ScrollDirection::Down,
        pointer: PointerKind::Mouse,
    });
    let outcome = f.dropdown.click(f.export);
    assert!(outcome.suppressed);
    assert_eq!(path(&f.dropdown), vec!["file"]);

    let outcome = f.dropdown.click(f.export);
    assert!(!outcome.suppressed);
    assert_eq!(path(&f.dropdown), vec!["file", "export"]);
}

#[test]
fn test_unmounting_item_cancels_timers() {
    let mut f = fixture(MenuConfig::default());
    f.dropdown.pointer_enter(f.file);
    assert!(f.dropdown.pending_timers() > 0);

    f.dropdown.remove_item(f.file).unwrap();
    f.dropdown.advance_by(1_000);

    assert!(f.dropdown.open_path().is_empty());
    assert_eq!(f.dropdown.pending_timers(), 0);
    assert!(!f.dropdown.tree().contains(&f.file_menu));
    assert!(f.dropdown.item(f.export).is_none());
    assert_eq!(f.dropdown.stats().total(), 0);
}

#[test]
fn test_unmount_all_clears_everything() {
    let mut f = fixture(MenuConfig::default());
    hover_open_export(&mut f);
    let root = f.dropdown.root().clone();
    f.dropdown.scroll_arrow_enter(&root, ScrollDirection::Down);
    f.dropdown.pointer_leave(f.export, Point::new(1100.0, 700.0));

    f.dropdown.unmount_all();

    assert_eq!(f.dropdown.pending_timers(), 0);
    assert!(f.dropdown.open_path().is_empty());
    assert_eq!(f.dropdown.items().count(), 0);
    assert_eq!(f.dropdown.tree().len(), 1);
}

#[test]
fn test_flips_left_and_children_inherit_alignment() {
    let mut f = fixture(MenuConfig::default());
    let root = f.dropdown.root().clone();
    f.dropdown
        .geometry_mut()
        .place_menu(&root, Point::new(1000.0, 40.0), 220.0, None);
    f.dropdown.on_resize();

    f.dropdown.open_submenu(&f.file_menu).unwrap();
    f.dropdown.open_submenu(&f.export_menu).unwrap();

    let file = f.dropdown.placement(&f.file_menu).unwrap();
    assert_eq!(file.edge, Edge::Left);
    assert_eq!(file.left, 799.0);
    assert_eq!(f.dropdown.alignment_of(&f.file_menu), Some(Edge::Left));

    let export = f.dropdown.placement(&f.export_menu).unwrap();
    assert_eq!(export.edge, Edge::Left);
    assert_eq!(export.left, 598.0);
}

#[test]
fn test_reposition_is_idempotent() {
    let mut f = fixture(MenuConfig::default());
    hover_open_export(&mut f);
    let first = (
        f.dropdown.placement(&f.file_menu),
        f.dropdown.placement(&f.export_menu),
    );

    f.dropdown.schedule_reposition(RepositionPhase::Reposition);
    f.dropdown.schedule_reposition(RepositionPhase::Reposition);

    let second = (
        f.dropdown.placement(&f.file_menu),
        f.dropdown.placement(&f.export_menu),
    );
    assert_eq!(first, second);
}

#[test]
fn test_aria_wiring() {
    let mut f = fixture(MenuConfig::default());
    let aria = f.dropdown.aria(f.file).unwrap();
    assert_eq!(aria.expanded, Some(false));
    assert_eq!(aria.controls, Some(f.file_menu.clone()));

    f.dropdown.click(f.file);
    assert_eq!(f.dropdown.aria(f.file).unwrap().expanded, Some(true));
    assert_eq!(f.dropdown.aria(f.new).unwrap().has_popup, None);
    assert!(f.dropdown.aria(f.share).is_some_and(|aria| aria.controls == Some(f.share_menu.clone())));
}

/// Test that dismissing the dropdown drops hover intent inside closed menus
#[test]
fn test_close_all_cancels_pending_open_in_closed_menu() {
    let mut f = fixture(MenuConfig::default());
    f.dropdown.open_submenu(&f.file_menu).unwrap();
    f.dropdown.pointer_enter(f.export);
    f.dropdown.advance_by(50);
    assert_eq!(state(&f.dropdown, f.export), HoverState::PendingOpen);

    f.dropdown.close_all();

    assert_eq!(f.dropdown.pending_timers(), 0);
    assert_eq!(state(&f.dropdown, f.export), HoverState::Closed);
    assert!(!f.dropdown.item(f.export).unwrap().pointer_inside());
    assert_eq!(f.dropdown.hovered_item(), None);

    f.dropdown.advance_by(500);
    assert!(f.dropdown.open_path().is_empty());
    assert_eq!(f.dropdown.stats().open_calls, 1);
}

/// Test that closing a parent menu drops hover intent of its items
#[test]
fn test_close_submenu_cancels_pending_open_of_children() {
    let mut f = fixture(MenuConfig::default());
    f.dropdown.open_submenu(&f.file_menu).unwrap();
    f.dropdown.pointer_enter(f.share);

    let file_menu = f.file_menu.clone();
    f.dropdown.close_submenu(&file_menu);
    assert_eq!(f.dropdown.pending_timers(), 0);

    f.dropdown.advance_by(500);
    assert!(f.dropdown.open_path().is_empty());
    assert!(!f.dropdown.is_open(&f.share_menu));
    assert_eq!(state(&f.dropdown, f.share), HoverState::Closed);
}

/// Test that a pending close inside a dismissed chain never fires
#[test]
fn test_close_all_cancels_pending_close() {
    let mut f = fixture(MenuConfig::default());
    hover_open_export(&mut f);
    f.dropdown.pointer_leave(f.export, Point::new(1100.0, 700.0));
    assert_eq!(state(&f.dropdown, f.export), HoverState::PendingClose);

    f.dropdown.close_all();
    let after_dismiss = f.dropdown.stats();
    f.dropdown.advance_by(500);

    assert_eq!(f.dropdown.stats(), after_dismiss);
    assert_eq!(state(&f.dropdown, f.export), HoverState::Closed);
}

/// Test that shrinking the viewport re-clamps an open submenu
#[test]
fn test_viewport_resize_reclamps_open_submenu() {
    let mut f = fixture(MenuConfig::default());
    f.dropdown.open_submenu(&f.file_menu).unwrap();
    let wide = f.dropdown.placement(&f.file_menu).unwrap();

    f.dropdown
        .geometry_mut()
        .set_viewport(ViewportSnapshot::simple(400.0, 90.0));
    f.dropdown.on_resize();

    let narrow = f.dropdown.placement(&f.file_menu).unwrap();
    assert_eq!(narrow.edge, Edge::Right);
    assert_eq!((narrow.top, narrow.max_height), (0.0, 90.0));
    assert_eq!((narrow.left, narrow.width), (196.0, 200.0));
    assert_eq!(f.dropdown.submenu_rect(&f.file_menu), Some(narrow.rect()));

    f.dropdown
        .geometry_mut()
        .set_viewport(ViewportSnapshot::simple(1280.0, 800.0));
    f.dropdown.on_resize();
    assert_eq!(f.dropdown.placement(&f.file_menu), Some(wide));
}

/// Test that the measured width is clamped between the width bounds
#[test]
fn test_natural_width_is_clamped() {
    let mut f = fixture(MenuConfig::default());
    let file_menu = f.file_menu.clone();

    f.dropdown.geometry_mut().set_natural_width(&file_menu, 150.0);
    f.dropdown.open_submenu(&file_menu).unwrap();
    let narrow = f.dropdown.placement(&file_menu).unwrap();
    assert_eq!(narrow.width, narrow.min_width);
    assert_eq!(narrow.width, 200.0);

    f.dropdown.close_submenu(&file_menu);
    assert!(!f.dropdown.geometry().is_placed(&file_menu));

    f.dropdown.geometry_mut().set_natural_width(&file_menu, 2_000.0);
    f.dropdown.open_submenu(&file_menu).unwrap();
    let wide = f.dropdown.placement(&file_menu).unwrap();
    assert!(f.dropdown.geometry().is_placed(&file_menu));
    assert_eq!(wide.width, wide.max_width);
    assert_eq!(wide.edge, Edge::Right);
    assert!((wide.left - 12.8).abs() < 0.01);
}
