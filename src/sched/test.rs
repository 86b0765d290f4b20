//! Testes do Escalonador (Scheduler)
//!
//! Suite embarcada: roda no boot com um `Platform` nulo (nenhuma troca de
//! contexto real) e valida seleção por prioridade, round-robin, wait
//! queues, herança de prioridade e o semáforo leitor/escritor.

use crate::arch::Platform;
use crate::core::smp::IpiVector;
use crate::klib::test_framework::{run_test_suite, TestCase, TestResult};
use crate::sched::config::time_slice_for;
use crate::sched::core::Scheduler;
use crate::sched::error::SchedResult;
use crate::sched::sync::WaitQueue;
use crate::sync::{Acquire, Mutex, RwSemaphore};
use crate::sys::types::{CpuId, Tid};

/// Plataforma sem efeitos: o estado do scheduler é observado direto.
struct NullPlatform;

impl Platform for NullPlatform {
    fn current_cpu(&self) -> CpuId {
        0
    }

    fn send_ipi(&self, _target: CpuId, _vector: IpiVector) {}

    fn context_switch(&self, _cpu: CpuId, _prev: Option<Tid>, _next: Option<Tid>) {}
}

static NULL_PLATFORM: NullPlatform = NullPlatform;

const TESTS: &[TestCase] = &[
    TestCase::new("sched: prioridade mais urgente primeiro", test_priority_pick),
    TestCase::new("sched: round-robin no nível", test_round_robin),
    TestCase::new("waitq: wake em ordem de prioridade", test_waitqueue_order),
    TestCase::new("mutex: herança de prioridade", test_mutex_inheritance),
    TestCase::new("rwsem: escritor após último leitor", test_rwsem_handoff),
];

/// Executa todos os testes de scheduler. Retorna `(passed, failed, skipped)`.
pub fn run_sched_tests() -> (usize, usize, usize) {
    crate::kinfo!("╔════════════════════════════════════════╗");
    crate::kinfo!("║     🧪 TESTES DE SCHEDULER             ║");
    crate::kinfo!("╚════════════════════════════════════════╝");

    let result = run_test_suite("sched", TESTS);

    if result.1 == 0 {
        crate::kinfo!("║  ✅ SCHEDULER VALIDADO!                ║");
    }
    result
}

fn verdict(r: SchedResult<bool>) -> TestResult {
    match r {
        Ok(true) => TestResult::Passed,
        _ => TestResult::Failed,
    }
}

fn ready(sched: &Scheduler, name: &str, prio: u8) -> SchedResult<Tid> {
    let tid = sched.spawn(name, prio, 0)?;
    sched.activate(tid)?;
    Ok(tid)
}

fn test_priority_pick() -> TestResult {
    verdict((|| -> SchedResult<bool> {
        let sched = Scheduler::new(1, &NULL_PLATFORM)?;
        ready(&sched, "low", 130)?;
        let hi = ready(&sched, "rt", 10)?;
        ready(&sched, "normal", 120)?;
        Ok(sched.schedule(0)? == Some(hi))
    })())
}

fn test_round_robin() -> TestResult {
    verdict((|| -> SchedResult<bool> {
        let sched = Scheduler::new(1, &NULL_PLATFORM)?;
        let a = ready(&sched, "a", 120)?;
        let b = ready(&sched, "b", 120)?;
        if sched.schedule(0)? != Some(a) {
            return Ok(false);
        }
        for _ in 0..time_slice_for(120) {
            sched.tick(0)?;
        }
        Ok(sched.schedule(0)? == Some(b))
    })())
}

fn test_waitqueue_order() -> TestResult {
    verdict((|| -> SchedResult<bool> {
        let sched = Scheduler::new(1, &NULL_PLATFORM)?;
        let wq = WaitQueue::new();
        let t1 = ready(&sched, "t1", 130)?;
        let t2 = ready(&sched, "t2", 101)?;
        let t3 = ready(&sched, "t3", 115)?;
        for t in [t1, t2, t3] {
            wq.push(&sched, t)?;
        }
        Ok(wq.pop(&sched)? == t2 && wq.pop(&sched)? == t3 && wq.pop(&sched)? == t1)
    })())
}

fn test_mutex_inheritance() -> TestResult {
    verdict((|| -> SchedResult<bool> {
        let sched = Scheduler::new(1, &NULL_PLATFORM)?;
        let m = Mutex::new();
        let low = ready(&sched, "low", 130)?;
        let high = ready(&sched, "high", 5)?;
        if m.lock(&sched, low)? != Acquire::Acquired || m.lock(&sched, high)? != Acquire::Blocked {
            return Ok(false);
        }
        let boosted = sched.get_priority(low)? == 5;
        let next = m.unlock(&sched, low)?;
        Ok(boosted && next == Some(high) && sched.get_priority(low)? == 130)
    })())
}

fn test_rwsem_handoff() -> TestResult {
    verdict((|| -> SchedResult<bool> {
        let sched = Scheduler::new(1, &NULL_PLATFORM)?;
        let sem = RwSemaphore::new();
        let r1 = ready(&sched, "r1", 120)?;
        let r2 = ready(&sched, "r2", 120)?;
        let w = ready(&sched, "w", 120)?;
        sem.down_read(&sched, r1)?;
        sem.down_read(&sched, r2)?;
        if sem.down_write(&sched, w)? != Acquire::Blocked {
            return Ok(false);
        }
        sem.up_read(&sched)?;
        let woken = sem.up_read(&sched)?;
        Ok(woken == 1 && sem.count() == -1)
    })())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_suite_passes() {
        let (passed, failed, _) = run_sched_tests();
        assert_eq!(failed, 0);
        assert_eq!(passed, TESTS.len());
    }
}
