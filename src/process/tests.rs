use super::fake::{FakeState, FakeWorld};
use super::{ProcessHandle, TrackedChildSet};

#[test]
fn reconcile_adds_new_children_with_current_baseline() {
    let world = FakeWorld::new();
    let target = world.spawn(100, None);
    world.spawn(101, Some(100));
    world.update(101, |c| c.read_bytes = 4096);

    let mut tracked = TrackedChildSet::new();
    let change = tracked.reconcile(target.children());

    assert_eq!(change.added, vec![101]);
    assert!(change.removed.is_empty());
    assert_eq!(tracked.get(101).unwrap().baseline.read_bytes, 4096);
}

#[test]
fn reconcile_purges_children_missing_from_enumeration() {
    let world = FakeWorld::new();
    let target = world.spawn(100, None);
    world.spawn(101, Some(100));
    world.spawn(102, Some(100));

    let mut tracked = TrackedChildSet::new();
    tracked.reconcile(target.children());
    assert_eq!(tracked.pids(), vec![101, 102]);

    world.set_state(101, FakeState::Gone);
    let change = tracked.reconcile(target.children());

    assert_eq!(change.removed, vec![101]);
    assert!(change.added.is_empty());
    assert!(!tracked.contains(101));
    assert_eq!(tracked.len(), 1);
}

#[test]
fn reconcile_leaves_existing_baselines_untouched() {
    let world = FakeWorld::new();
    let target = world.spawn(100, None);
    world.spawn(101, Some(100));
    world.update(101, |c| c.write_chars = 10);

    let mut tracked = TrackedChildSet::new();
    tracked.reconcile(target.children());

    world.update(101, |c| c.write_chars = 500);
    let change = tracked.reconcile(target.children());

    assert_eq!(change, Default::default());
    assert_eq!(tracked.get(101).unwrap().baseline.write_chars, 10);
}

#[test]
fn reconcile_skips_unreadable_newcomers_until_they_answer() {
    let world = FakeWorld::new();
    let target = world.spawn(100, None);
    world.spawn(101, Some(100));
    world.set_state(101, FakeState::Denied);

    let mut tracked = TrackedChildSet::new();
    let change = tracked.reconcile(target.children());
    assert!(change.added.is_empty());
    assert!(tracked.is_empty());

    world.set_state(101, FakeState::Running);
    let change = tracked.reconcile(target.children());
    assert_eq!(change.added, vec![101]);
}

#[test]
fn children_are_enumerated_recursively() {
    let world = FakeWorld::new();
    let target = world.spawn(1, None);
    world.spawn(2, Some(1));
    world.spawn(3, Some(2));
    world.spawn(4, None);

    let mut pids: Vec<u32> = target.children().iter().map(|c| c.pid()).collect();
    pids.sort_unstable();
    assert_eq!(pids, vec![2, 3]);
}

#[test]
fn terminate_treats_missing_process_as_done() {
    // PIDs are capped well below i32::MAX on Linux, so this one cannot exist.
    assert!(super::terminate(i32::MAX as u32).is_ok());
}
