#![forbid(unsafe_code)]

//! End-to-end navigation scenarios through a synchronous host.
//!
//! Validates:
//! - The canonical ∅ → A → B → C → back → back walk.
//! - Back/forward round trips restore the exact selection.
//! - An external change after going back discards the forward branch.
//! - Destroyed objects are trimmed or skipped, never navigated to.
//! - Navigation assigned from inside the host is attributed correctly even
//!   when interleaved with unrelated changes.

use std::rc::Rc;

use selection_history::{
    HistoryNavigator, NavigationCommand, Navigator, ObjectId, ObjectTable, SelectionCell,
    SelectionSnapshot, Subscription,
};

const A: u64 = 1;
const B: u64 = 2;
const C: u64 = 3;
const D: u64 = 4;

fn sel(raw: &[u64]) -> SelectionSnapshot {
    raw.iter().copied().map(ObjectId::new).collect()
}

struct Harness {
    cell: SelectionCell,
    objects: Rc<ObjectTable>,
    nav: Rc<Navigator<SelectionCell, Rc<ObjectTable>>>,
    _sub: Subscription,
}

impl Harness {
    fn new(live: &[u64]) -> Self {
        let cell = SelectionCell::default();
        let objects = Rc::new(ObjectTable::with_objects(
            live.iter().copied().map(ObjectId::new),
        ));
        let nav = Rc::new(Navigator::new(cell.clone(), objects.clone()));
        let sub = cell.subscribe(nav.observer());
        Self {
            cell,
            objects,
            nav,
            _sub: sub,
        }
    }

    fn select(&self, raw: &[u64]) {
        self.cell.set(sel(raw));
    }

    fn back(&self) -> Vec<SelectionSnapshot> {
        self.nav.with_engine(|e| e.back().iter().cloned().collect())
    }

    fn forward(&self) -> Vec<SelectionSnapshot> {
        self.nav.with_engine(|e| e.forward().iter().cloned().collect())
    }
}

#[test]
fn canonical_walk() {
    let h = Harness::new(&[A, B, C]);
    assert!(h.cell.get().is_empty());

    h.select(&[A]);
    assert!(h.back().is_empty());
    h.select(&[B]);
    assert_eq!(h.back(), vec![sel(&[A])]);
    h.select(&[C]);
    assert_eq!(h.back(), vec![sel(&[B]), sel(&[A])]);

    assert!(h.nav.navigate_backward());
    assert_eq!(h.cell.get(), sel(&[B]));
    assert_eq!(h.back(), vec![sel(&[A])]);
    assert_eq!(h.forward(), vec![sel(&[C])]);

    assert!(h.nav.navigate_backward());
    assert_eq!(h.cell.get(), sel(&[A]));
    assert!(h.back().is_empty());
    assert_eq!(h.forward(), vec![sel(&[C]), sel(&[B])]);

    assert!(!h.nav.can_navigate_backward());
    assert!(h.nav.can_navigate_forward());
}

#[test]
fn back_then_forward_round_trips() {
    let h = Harness::new(&[A, B, C]);
    h.select(&[A]);
    h.select(&[B, C]);
    let before = h.cell.get();

    assert!(h.nav.navigate_backward());
    assert!(h.nav.navigate_forward());
    assert_eq!(h.cell.get(), before);
    assert_eq!(h.back(), vec![sel(&[A])]);
    assert!(h.forward().is_empty());
}

#[test]
fn external_change_discards_forward_branch() {
    let h = Harness::new(&[A, B, C, D]);
    h.select(&[A]);
    h.select(&[B]);
    h.select(&[C]);
    assert!(h.nav.navigate_backward());
    assert_eq!(h.forward(), vec![sel(&[C])]);

    h.select(&[D]);
    assert!(h.forward().is_empty());
    assert_eq!(h.back(), vec![sel(&[B]), sel(&[A])]);
    assert!(!h.nav.navigate_forward());
}

#[test]
fn walking_all_the_way_and_back_again() {
    let h = Harness::new(&[1, 2, 3, 4, 5]);
    for i in 1..=5 {
        h.select(&[i]);
    }
    let mut visited = Vec::new();
    while h.nav.navigate_backward() {
        visited.push(h.cell.get());
    }
    assert_eq!(
        visited,
        vec![sel(&[4]), sel(&[3]), sel(&[2]), sel(&[1])]
    );

    let mut revisited = Vec::new();
    while h.nav.navigate_forward() {
        revisited.push(h.cell.get());
    }
    assert_eq!(
        revisited,
        vec![sel(&[2]), sel(&[3]), sel(&[4]), sel(&[5])]
    );
    assert_eq!(h.back().len(), 4);
}

#[test]
fn destroyed_objects_are_trimmed_and_skipped() {
    let h = Harness::new(&[A, B, C, D]);
    h.select(&[A, B]);
    h.select(&[C]);
    h.select(&[D]);

    h.objects.destroy(ObjectId::new(C));
    h.objects.destroy(ObjectId::new(B));

    // back = [{C}, {A, B}]: {C} is fully dead, {A, B} trims to {A}.
    assert!(h.nav.can_navigate_backward());
    assert!(h.nav.navigate_backward());
    assert_eq!(h.cell.get(), sel(&[A]));
    assert!(h.back().is_empty());
    assert_eq!(h.forward(), vec![sel(&[D])]);
}

#[test]
fn everything_dead_means_no_navigation() {
    let h = Harness::new(&[A, B, C]);
    h.select(&[A]);
    h.select(&[B]);
    h.select(&[C]);
    h.objects.destroy(ObjectId::new(A));
    h.objects.destroy(ObjectId::new(B));

    assert!(!h.nav.can_navigate_backward());
    assert!(!h.nav.navigate_backward());
    assert_eq!(h.cell.get(), sel(&[C]));
}

#[test]
fn commands_dispatch_to_navigator() {
    let h = Harness::new(&[A, B]);
    h.select(&[A]);
    h.select(&[B]);

    assert!(NavigationCommand::Back.is_enabled(h.nav.as_ref()));
    assert!(!NavigationCommand::Forward.is_enabled(h.nav.as_ref()));

    let click = NavigationCommand::from_mouse_button(3, 1).unwrap();
    assert!(click.execute(h.nav.as_ref()));
    assert_eq!(h.cell.get(), sel(&[A]));
    assert!(NavigationCommand::Forward.execute(h.nav.as_ref()));
    assert_eq!(h.cell.get(), sel(&[B]));
}

#[test]
fn unrelated_subscriber_changes_are_external() {
    // A second subscriber that reacts to navigation by changing the
    // selection again. The follow-up change must be treated as external.
    let h = Harness::new(&[A, B, C, D]);
    h.select(&[A]);
    h.select(&[B]);
    h.select(&[C]);

    let cell = h.cell.clone();
    let redirect = Rc::new(std::cell::Cell::new(true));
    let flag = redirect.clone();
    let _redirect_sub = h.cell.subscribe(move |current| {
        if flag.get() && *current == sel(&[B]) {
            flag.set(false);
            cell.set(sel(&[D]));
        }
    });

    assert!(h.nav.navigate_backward());
    assert_eq!(h.cell.get(), sel(&[D]));
    // Going back recorded {C} forward; the redirect to {D} then cleared it.
    assert!(h.forward().is_empty());
    assert_eq!(h.back(), vec![sel(&[B]), sel(&[A])]);
}

#[test]
fn redirect_before_navigator_does_not_record_current() {
    // The redirecting subscriber runs first, so the navigator sees the
    // nested change before the stale outer notification.
    let cell = SelectionCell::default();
    let objects = Rc::new(ObjectTable::with_objects([A, B, C].map(ObjectId::new)));
    let redirect_cell = cell.clone();
    let _redirect = cell.subscribe(move |current| {
        if *current == sel(&[B]) {
            redirect_cell.set(sel(&[C]));
        }
    });
    let nav = Rc::new(Navigator::new(cell.clone(), objects));
    let _sub = cell.subscribe(nav.observer());

    cell.set(sel(&[A]));
    cell.set(sel(&[B]));
    assert_eq!(cell.get(), sel(&[C]));

    let back: Vec<_> = nav.with_engine(|e| e.back().iter().cloned().collect());
    assert_eq!(back, vec![sel(&[A])]);
    assert_ne!(back.first(), Some(&cell.get()));

    assert!(nav.navigate_backward());
    assert_eq!(cell.get(), sel(&[A]));
}
