//! Testes do Mutex com herança de prioridade

#![cfg(test)]

use std::vec::Vec;

use super::{ready, setup};
use crate::klib::test_framework::XorShift64;
use crate::sched::error::SchedError;
use crate::sched::task::TaskState;
use crate::sync::{Acquire, Mutex};

#[test]
fn test_uncontended_lock_unlock() {
    let (sched, _) = setup(1);
    let m = Mutex::new();
    let a = ready(&sched, "a", 120, 0);

    assert!(!m.is_locked());
    assert_eq!(m.lock(&sched, a).unwrap(), Acquire::Acquired);
    assert_eq!(m.owner(), Some(a));
    assert_eq!(m.owner_priority(), Some(120));

    assert_eq!(m.unlock(&sched, a).unwrap(), None);
    assert!(!m.is_locked());
    assert_eq!(m.owner_priority(), None);
    // Sem dono: no-op
    assert_eq!(m.unlock(&sched, a).unwrap(), None);
}

#[test]
fn test_recursive_lock_is_usage_error() {
    let (sched, _) = setup(1);
    let m = Mutex::new();
    let a = ready(&sched, "a", 120, 0);
    m.lock(&sched, a).unwrap();

    assert_eq!(m.lock(&sched, a), Err(SchedError::Deadlock));
    assert_eq!(m.owner(), Some(a));
    assert_eq!(sched.state(a).unwrap(), TaskState::Runnable);
    assert!(m.waiters().is_empty());
}

#[test]
fn test_unlock_by_non_owner() {
    let (sched, _) = setup(1);
    let m = Mutex::new();
    let a = ready(&sched, "a", 120, 0);
    let b = ready(&sched, "b", 120, 0);
    m.lock(&sched, a).unwrap();

    assert_eq!(m.unlock(&sched, b), Err(SchedError::NotOwner));
    assert_eq!(m.owner(), Some(a));
}

#[test]
fn test_try_lock_never_blocks() {
    let (sched, _) = setup(1);
    let m = Mutex::new();
    let a = ready(&sched, "a", 120, 0);
    let b = ready(&sched, "b", 10, 0);

    assert!(m.try_lock(&sched, a).unwrap());
    assert!(!m.try_lock(&sched, b).unwrap());
    assert_eq!(sched.state(b).unwrap(), TaskState::Runnable);
    // try_lock não eleva o dono
    assert_eq!(sched.get_priority(a).unwrap(), 120);
}

#[test]
fn test_priority_inheritance_scenario() {
    let (sched, _) = setup(1);
    let m = Mutex::new();
    let holder = ready(&sched, "holder", 20, 0);
    let p5 = ready(&sched, "p5", 5, 0);
    let p10a = ready(&sched, "p10a", 10, 0);
    let p10b = ready(&sched, "p10b", 10, 0);

    assert_eq!(m.lock(&sched, holder).unwrap(), Acquire::Acquired);

    assert_eq!(m.lock(&sched, p5).unwrap(), Acquire::Blocked);
    assert_eq!(sched.get_priority(holder).unwrap(), 5);
    assert_eq!(m.lock(&sched, p10a).unwrap(), Acquire::Blocked);
    assert_eq!(m.lock(&sched, p10b).unwrap(), Acquire::Blocked);
    assert_eq!(sched.get_priority(holder).unwrap(), 5);
    assert_eq!(sched.static_priority(holder).unwrap(), 20);

    assert_eq!(m.unlock(&sched, holder).unwrap(), Some(p5));
    assert_eq!(m.owner(), Some(p5));
    assert_eq!(sched.get_priority(holder).unwrap(), 20);
    assert_eq!(sched.state(p5).unwrap(), TaskState::Runnable);
    assert_eq!(m.waiters().snapshot().unwrap(), vec![p10a, p10b]);
    assert_eq!(sched.state(p10a).unwrap(), TaskState::Sleeping);
    assert_eq!(sched.counters().pi_boosts, 1);
}

#[test]
fn test_queue_follows_waiter_priority_change() {
    let (sched, _) = setup(1);
    let m = Mutex::new();
    let holder = ready(&sched, "holder", 130, 0);
    let a = ready(&sched, "a", 10, 0);
    let b = ready(&sched, "b", 50, 0);

    m.lock(&sched, holder).unwrap();
    m.lock(&sched, a).unwrap();
    m.lock(&sched, b).unwrap();
    assert_eq!(sched.get_priority(holder).unwrap(), 10);

    // a perde prioridade enquanto dorme: o dono passa a herdar de b
    sched.set_static_priority(a, 135).unwrap();
    assert_eq!(sched.get_priority(holder).unwrap(), 50);

    // A fila é reordenada antes do handoff
    assert_eq!(m.unlock(&sched, holder).unwrap(), Some(b));
    assert_eq!(sched.get_priority(holder).unwrap(), 130);
    assert_eq!(sched.get_priority(b).unwrap(), 50);
    assert_eq!(m.owner_priority(), Some(50));
    assert_eq!(m.waiters().snapshot().unwrap(), vec![a]);

    assert_eq!(m.unlock(&sched, b).unwrap(), Some(a));
    assert_eq!(sched.get_priority(b).unwrap(), 50);
    assert_eq!(sched.counters().pi_boosts, 1);
}

#[test]
fn test_release_keeps_boost_from_other_held_mutex() {
    let (sched, _) = setup(1);
    let m1 = Mutex::new();
    let m2 = Mutex::new();
    let low = ready(&sched, "low", 100, 0);
    let high = ready(&sched, "high", 5, 0);
    let mid = ready(&sched, "mid", 50, 0);

    m1.lock(&sched, low).unwrap();
    m2.lock(&sched, low).unwrap();
    assert_eq!(m1.lock(&sched, high).unwrap(), Acquire::Blocked);
    assert_eq!(m2.lock(&sched, mid).unwrap(), Acquire::Blocked);
    assert_eq!(sched.get_priority(low).unwrap(), 5);

    assert_eq!(m2.unlock(&sched, low).unwrap(), Some(mid));
    // high ainda espera por m1
    assert_eq!(sched.get_priority(low).unwrap(), 5);
    assert_eq!(m1.waiters().first_prio(), Some(5));
    assert_eq!(sched.get_priority(mid).unwrap(), 50);

    assert_eq!(m1.unlock(&sched, low).unwrap(), Some(high));
    assert_eq!(sched.get_priority(low).unwrap(), 100);
}

#[test]
fn test_inheritance_follows_blocking_chain() {
    let (sched, _) = setup(1);
    let m1 = Mutex::new();
    let m2 = Mutex::new();
    let low = ready(&sched, "low", 60, 0);
    let other = ready(&sched, "other", 30, 0);
    let mid = ready(&sched, "mid", 50, 0);
    let high = ready(&sched, "high", 5, 0);

    m1.lock(&sched, low).unwrap();
    assert_eq!(m1.lock(&sched, other).unwrap(), Acquire::Blocked);
    assert_eq!(m2.lock(&sched, mid).unwrap(), Acquire::Acquired);
    assert_eq!(m1.lock(&sched, mid).unwrap(), Acquire::Blocked);
    assert_eq!(sched.get_priority(low).unwrap(), 30);

    // high → m2 (mid) → m1 (low)
    assert_eq!(m2.lock(&sched, high).unwrap(), Acquire::Blocked);
    assert_eq!(sched.get_priority(mid).unwrap(), 5);
    assert_eq!(sched.get_priority(low).unwrap(), 5);
    let k1 = sched.pi_blocked_on(other).unwrap();
    assert!(k1.is_some());
    assert_eq!(sched.pi_blocked_on(mid).unwrap(), k1);

    // mid foi elevada dormindo: passa na frente de other
    assert_eq!(m1.unlock(&sched, low).unwrap(), Some(mid));
    assert_eq!(sched.get_priority(low).unwrap(), 60);
    assert_eq!(sched.get_priority(mid).unwrap(), 5);
    assert_eq!(sched.pi_blocked_on(mid).unwrap(), None);
    assert_eq!(m1.waiters().snapshot().unwrap(), vec![other]);

    // Sem high, mid fica com a herança de other (m1)
    assert_eq!(m2.unlock(&sched, mid).unwrap(), Some(high));
    assert_eq!(sched.get_priority(mid).unwrap(), 30);

    assert_eq!(m1.unlock(&sched, mid).unwrap(), Some(other));
    assert_eq!(sched.get_priority(mid).unwrap(), 50);
    assert_eq!(sched.counters().pi_boosts, 3);
}

#[test]
fn test_exit_of_woken_waiter_drops_its_boost() {
    let (sched, _) = setup(1);
    let m = Mutex::new();
    let low = ready(&sched, "low", 130, 0);
    let high = ready(&sched, "high", 10, 0);

    m.lock(&sched, low).unwrap();
    m.lock_interruptible(&sched, high).unwrap();
    assert_eq!(sched.get_priority(low).unwrap(), 10);

    assert!(sched.signal(high).unwrap());
    sched.exit(high, 0).unwrap();
    assert_eq!(sched.pi_blocked_on(high).unwrap(), None);
    assert_eq!(sched.get_priority(low).unwrap(), 130);
}

#[test]
fn test_interrupted_wait_unwinds_boost() {
    let (sched, _) = setup(1);
    let m = Mutex::new();
    let low = ready(&sched, "low", 130, 0);
    let high = ready(&sched, "high", 10, 0);

    m.lock(&sched, low).unwrap();
    assert_eq!(m.lock_interruptible(&sched, high).unwrap(), Acquire::Blocked);
    assert_eq!(sched.get_priority(low).unwrap(), 10);

    // Ainda dormindo: continua bloqueada
    assert_eq!(m.finish_lock(&sched, high).unwrap(), Acquire::Blocked);

    assert!(sched.signal(high).unwrap());
    assert_eq!(m.finish_lock(&sched, high), Err(SchedError::Interrupted));
    assert_eq!(sched.get_priority(low).unwrap(), 130);
    assert_eq!(m.owner(), Some(low));
    assert!(m.waiters().is_empty());
    assert_eq!(m.finish_lock(&sched, high), Err(SchedError::NotQueued));
}

#[test]
fn test_pending_signal_refuses_interruptible_lock() {
    let (sched, _) = setup(1);
    let m = Mutex::new();
    let low = ready(&sched, "low", 130, 0);
    let high = ready(&sched, "high", 10, 0);
    m.lock(&sched, low).unwrap();
    sched.signal(high).unwrap();

    assert_eq!(m.lock_interruptible(&sched, high), Err(SchedError::Interrupted));
    assert_eq!(sched.get_priority(low).unwrap(), 130);
    assert!(m.waiters().is_empty());
}

#[test]
fn test_lock_timeout() {
    let (sched, _) = setup(1);
    let m = Mutex::new();
    let low = ready(&sched, "low", 130, 0);
    let high = ready(&sched, "high", 10, 0);
    let mid = ready(&sched, "mid", 50, 0);

    m.lock(&sched, low).unwrap();
    m.lock_timeout(&sched, high, 5).unwrap();
    m.lock(&sched, mid).unwrap();
    assert_eq!(sched.get_priority(low).unwrap(), 10);

    for _ in 0..5 {
        sched.tick(0).unwrap();
    }
    assert_eq!(sched.state(high).unwrap(), TaskState::Runnable);
    assert_eq!(m.finish_lock(&sched, high), Err(SchedError::TimedOut));
    // Volta ao waiter mais urgente restante
    assert_eq!(sched.get_priority(low).unwrap(), 50);

    assert_eq!(m.unlock(&sched, low).unwrap(), Some(mid));
    assert_eq!(sched.get_priority(low).unwrap(), 130);
}

#[test]
fn test_handoff_before_timeout() {
    let (sched, _) = setup(1);
    let m = Mutex::new();
    let low = ready(&sched, "low", 130, 0);
    let high = ready(&sched, "high", 10, 0);

    m.lock(&sched, low).unwrap();
    m.lock_timeout(&sched, high, 50).unwrap();
    assert_eq!(m.unlock(&sched, low).unwrap(), Some(high));

    assert_eq!(m.finish_lock(&sched, high).unwrap(), Acquire::Acquired);
    for _ in 0..60 {
        sched.tick(0).unwrap();
    }
    assert_eq!(m.owner(), Some(high));
    assert_eq!(sched.state(high).unwrap(), TaskState::Runnable);
}

#[test]
fn test_randomized_mutual_exclusion() {
    let (sched, _) = setup(1);
    let m = Mutex::new();
    let mut rng = XorShift64::new(42);
    let tasks: Vec<_> = (0..8)
        .map(|i| ready(&sched, "mx", 100 + (i as u8) * 3, 0))
        .collect();
    let mut holder = None;

    for _ in 0..2000 {
        let t = tasks[rng.below(tasks.len() as u64) as usize];
        if holder == Some(t) {
            holder = m.unlock(&sched, t).unwrap();
        } else if !m.waiters().contains(t) {
            match m.lock(&sched, t).unwrap() {
                Acquire::Acquired => {
                    assert_eq!(holder, None);
                    holder = Some(t);
                }
                Acquire::Blocked => {
                    assert_eq!(sched.state(t).unwrap(), TaskState::Sleeping);
                }
            }
        }

        assert_eq!(m.owner(), holder);
        if let (Some(owner), Some(best)) = (holder, m.waiters().first_prio()) {
            // Dono nunca menos urgente que quem espera
            assert!(sched.get_priority(owner).unwrap() <= best);
            assert_ne!(sched.state(owner).unwrap(), TaskState::Sleeping);
        }
    }
}
