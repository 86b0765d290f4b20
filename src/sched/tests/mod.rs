//! Testes de cenário do scheduler e das primitivas de bloqueio
//!
//! # Como Executar os Testes
//!
//! ```bash
//! cargo test --lib sched::tests
//! cargo test --lib sched::tests::mutex
//! ```
//!
//! # Estrutura dos Testes
//!
//! - `scheduler.rs` - Seleção, round-robin, ciclo de vida, sono e timers
//! - `waitqueue.rs` - Ordem de wake e esperas interrompíveis
//! - `mutex.rs` - Exclusão mútua e herança de prioridade
//! - `rwsem.rs` - Semáforo leitor/escritor
//! - `smp.rs` - Migração, IPIs e balanceamento
//!
//! Nenhum contexto é trocado de verdade: o [`RecordingPlatform`] só anota
//! trocas e IPIs, e os testes dirigem `schedule`/`tick` explicitamente.

#![cfg(test)]

pub mod mutex;
pub mod waitqueue;

use std::boxed::Box;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;
use std::vec::Vec;

use crate::arch::Platform;
use crate::core::smp::IpiVector;
use crate::sched::config::Priority;
use crate::sched::core::Scheduler;
use crate::sched::task::TaskFlags;
use crate::sys::types::{CpuId, Tid};

/// Plataforma de teste: anota IPIs e trocas de contexto.
pub struct RecordingPlatform {
    cpu: AtomicUsize,
    pub ipis: StdMutex<Vec<(CpuId, IpiVector)>>,
    pub switches: StdMutex<Vec<(CpuId, Option<Tid>, Option<Tid>)>>,
}

impl RecordingPlatform {
    /// Simula o chamador rodando em `cpu`.
    pub fn set_cpu(&self, cpu: CpuId) {
        self.cpu.store(cpu, Ordering::Relaxed);
    }

    pub fn ipis_to(&self, cpu: CpuId, vector: IpiVector) -> usize {
        self.ipis
            .lock()
            .unwrap()
            .iter()
            .filter(|&&(c, v)| c == cpu && v == vector)
            .count()
    }

    pub fn last_switch(&self) -> Option<(CpuId, Option<Tid>, Option<Tid>)> {
        self.switches.lock().unwrap().last().copied()
    }
}

impl Platform for RecordingPlatform {
    fn current_cpu(&self) -> CpuId {
        self.cpu.load(Ordering::Relaxed)
    }

    fn send_ipi(&self, target: CpuId, vector: IpiVector) {
        self.ipis.lock().unwrap().push((target, vector));
    }

    fn context_switch(&self, cpu: CpuId, prev: Option<Tid>, next: Option<Tid>) {
        self.switches.lock().unwrap().push((cpu, prev, next));
    }
}

/// Helper: scheduler com `nr_cpus` CPUs e a plataforma de teste
pub fn setup(nr_cpus: usize) -> (Scheduler, &'static RecordingPlatform) {
    let platform: &'static RecordingPlatform = Box::leak(Box::new(RecordingPlatform {
        cpu: AtomicUsize::new(0),
        ipis: StdMutex::new(Vec::new()),
        switches: StdMutex::new(Vec::new()),
    }));
    let sched = Scheduler::new(nr_cpus, platform).unwrap();
    (sched, platform)
}

/// Helper: task criada e ativada (Runnable) em `cpu`
pub fn ready(sched: &Scheduler, name: &str, prio: Priority, cpu: CpuId) -> Tid {
    let tid = sched.spawn(name, prio, cpu).unwrap();
    sched.activate(tid).unwrap();
    tid
}

pub fn flags(sched: &Scheduler, tid: Tid) -> TaskFlags {
    sched.task_info(tid).unwrap().flags
}

#[test]
fn test_scheduler_rejects_bad_cpu_count() {
    let (_, platform) = setup(1);
    assert!(Scheduler::new(0, platform).is_err());
    assert!(Scheduler::new(crate::sched::config::MAX_CPUS + 1, platform).is_err());
}
