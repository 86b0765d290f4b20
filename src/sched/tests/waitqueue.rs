//! Testes da WaitQueue

#![cfg(test)]

use std::vec::Vec;

use super::{ready, setup};
use crate::sched::error::SchedError;
use crate::sched::sync::{DeleteMode, InsertMode, WaitQueue};
use crate::sched::task::TaskState;

#[test]
fn test_wake_order_matches_priority() {
    let (sched, _) = setup(1);
    let wq = WaitQueue::new();
    let prios = [130u8, 101, 139, 100, 115, 5];
    let tids: Vec<_> = prios.iter().map(|&p| ready(&sched, "w", p, 0)).collect();
    for &t in &tids {
        wq.push(&sched, t).unwrap();
        assert_eq!(sched.state(t).unwrap(), TaskState::Sleeping);
    }
    assert_eq!(wq.len(), prios.len());
    assert_eq!(sched.nr_running(0).unwrap(), 0);

    let mut last = 0;
    for _ in 0..prios.len() {
        let t = wq.pop(&sched).unwrap();
        let p = sched.get_priority(t).unwrap();
        assert!(p > last || last == 0);
        last = p;
        assert_eq!(sched.state(t).unwrap(), TaskState::Runnable);
    }
    assert!(wq.is_empty());
}

#[test]
fn test_fifo_within_priority() {
    let (sched, _) = setup(1);
    let wq = WaitQueue::new();
    let a = ready(&sched, "a", 120, 0);
    let b = ready(&sched, "b", 120, 0);
    let c = ready(&sched, "c", 120, 0);
    for t in [a, b, c] {
        wq.push(&sched, t).unwrap();
    }
    assert_eq!(wq.snapshot().unwrap(), vec![a, b, c]);
    assert_eq!(wq.pop(&sched).unwrap(), a);
    assert_eq!(wq.pop(&sched).unwrap(), b);
    assert_eq!(wq.pop(&sched).unwrap(), c);
}

#[test]
fn test_first_peeks_without_removing() {
    let (sched, _) = setup(1);
    let wq = WaitQueue::new();
    assert_eq!(wq.first(), None);
    assert_eq!(wq.first_prio(), None);

    let a = ready(&sched, "a", 120, 0);
    let b = ready(&sched, "b", 100, 0);
    wq.push(&sched, a).unwrap();
    wq.push(&sched, b).unwrap();

    assert_eq!(wq.first(), Some(b));
    assert_eq!(wq.first_prio(), Some(100));
    assert_eq!(wq.len(), 2);
}

#[test]
fn test_pop_empty_is_error() {
    let (sched, _) = setup(1);
    let wq = WaitQueue::new();
    assert_eq!(wq.pop(&sched), Err(SchedError::QueueEmpty));
    assert_eq!(wq.wake_all(&sched), 0);
}

#[test]
fn test_duplicate_insert_rejected() {
    let (sched, _) = setup(1);
    let wq = WaitQueue::new();
    let a = ready(&sched, "a", 120, 0);
    wq.push(&sched, a).unwrap();
    assert_eq!(
        wq.insert(&sched, a, InsertMode::NoSleep),
        Err(SchedError::AlreadyQueued)
    );
    assert_eq!(wq.len(), 1);
}

#[test]
fn test_nosleep_insert_and_delete() {
    let (sched, _) = setup(1);
    let wq = WaitQueue::new();
    let a = ready(&sched, "a", 120, 0);

    wq.insert(&sched, a, InsertMode::NoSleep).unwrap();
    assert!(wq.contains(a));
    assert_eq!(sched.state(a).unwrap(), TaskState::Runnable);

    wq.delete(&sched, a, DeleteMode::NoWake).unwrap();
    assert!(!wq.contains(a));
    assert_eq!(wq.delete(&sched, a, DeleteMode::Wake), Err(SchedError::NotQueued));
}

#[test]
fn test_delete_with_wake() {
    let (sched, _) = setup(1);
    let wq = WaitQueue::new();
    let a = ready(&sched, "a", 120, 0);
    wq.push(&sched, a).unwrap();

    wq.delete(&sched, a, DeleteMode::Wake).unwrap();
    assert_eq!(sched.state(a).unwrap(), TaskState::Runnable);
    assert!(wq.is_empty());
}

#[test]
fn test_failed_sleep_leaves_queue_untouched() {
    let (sched, _) = setup(1);
    let wq = WaitQueue::new();
    let a = ready(&sched, "a", 120, 0);
    sched.signal(a).unwrap();

    assert_eq!(wq.push_interruptible(&sched, a), Err(SchedError::Interrupted));
    assert!(!wq.contains(a));
    assert!(wq.is_empty());
    assert_eq!(sched.state(a).unwrap(), TaskState::Runnable);

    // Task que não pode dormir
    let born = sched.spawn("born", 120, 0).unwrap();
    assert_eq!(wq.push(&sched, born), Err(SchedError::InvalidState));
    assert!(wq.is_empty());
}

#[test]
fn test_push_timeout_expires() {
    let (sched, _) = setup(1);
    let wq = WaitQueue::new();
    let a = ready(&sched, "a", 120, 0);
    wq.push_timeout(&sched, a, 2).unwrap();

    sched.tick(0).unwrap();
    sched.tick(0).unwrap();
    assert_eq!(sched.state(a).unwrap(), TaskState::Runnable);
    // O timer acorda, mas a remoção da fila é de quem esperava
    assert!(wq.contains(a));
}

#[test]
fn test_wake_all_in_priority_order() {
    let (sched, _) = setup(1);
    let wq = WaitQueue::new();
    let a = ready(&sched, "a", 130, 0);
    let b = ready(&sched, "b", 110, 0);
    let c = ready(&sched, "c", 120, 0);
    for t in [a, b, c] {
        wq.push(&sched, t).unwrap();
    }

    assert_eq!(wq.wake_all(&sched), 3);
    assert!(wq.is_empty());
    for t in [a, b, c] {
        assert_eq!(sched.state(t).unwrap(), TaskState::Runnable);
    }
    assert_eq!(sched.pick_next(0).unwrap(), Some(b));
}

#[test]
fn test_reprioritize_after_priority_change() {
    let (sched, _) = setup(1);
    let wq = WaitQueue::new();
    let a = ready(&sched, "a", 120, 0);
    let b = ready(&sched, "b", 130, 0);
    wq.push(&sched, a).unwrap();
    wq.push(&sched, b).unwrap();

    sched.set_priority(b, 100).unwrap();
    // Prioridade capturada na inserção
    assert_eq!(wq.first(), Some(a));

    wq.reprioritize(&sched, b).unwrap();
    assert_eq!(wq.first(), Some(b));
    assert_eq!(wq.first_prio(), Some(100));

    let c = ready(&sched, "c", 120, 0);
    assert_eq!(wq.reprioritize(&sched, c), Err(SchedError::NotQueued));
}

#[test]
fn test_refresh_repositions_changed_waiters() {
    let (sched, _) = setup(1);
    let wq = WaitQueue::new();
    let a = ready(&sched, "a", 120, 0);
    let b = ready(&sched, "b", 130, 0);
    let c = ready(&sched, "c", 125, 0);
    for t in [a, b, c] {
        wq.push(&sched, t).unwrap();
    }

    sched.set_priority(b, 100).unwrap();
    sched.set_priority(a, 135).unwrap();
    assert_eq!(wq.snapshot().unwrap(), vec![a, c, b]);

    assert_eq!(wq.refresh(&sched).unwrap(), 2);
    assert_eq!(wq.snapshot().unwrap(), vec![b, c, a]);
    assert_eq!(wq.refresh(&sched).unwrap(), 0);
}
