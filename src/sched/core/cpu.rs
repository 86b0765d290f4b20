//! Estado de escalonamento por CPU

use alloc::collections::VecDeque;

use super::runqueue::PrioArray;
use crate::sys::types::{CpuId, Tid};

/// Estatísticas por CPU
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuStats {
    /// Ticks de timer recebidos
    pub ticks: u64,
    /// Trocas de contexto efetivas
    pub switches: u64,
    /// Trocas em que a task anterior continuava executável
    pub preemptions: u64,
    /// Ticks sem task (idle)
    pub idle_ticks: u64,
    pub migrations_in: u64,
    pub migrations_out: u64,
}

/// Run-queue de uma CPU. Protegida pelo Spinlock em `Scheduler::cpus`.
pub struct CpuRq {
    pub id: CpuId,
    /// Priority Array ativo
    pub active: PrioArray,
    /// Tasks paradas (fora do escalonamento)
    pub stopped: VecDeque<Tid>,
    /// Task executando (None = idle)
    pub curr: Option<Tid>,
    /// Há escolha melhor que `curr`
    pub need_resched: bool,
    /// Kernel thread `migration/N`
    pub migration_helper: Option<Tid>,
    pub stats: CpuStats,
}

impl CpuRq {
    pub const fn new(id: CpuId) -> Self {
        Self {
            id,
            active: PrioArray::new(id),
            stopped: VecDeque::new(),
            curr: None,
            need_resched: false,
            migration_helper: None,
            stats: CpuStats {
                ticks: 0,
                switches: 0,
                preemptions: 0,
                idle_ticks: 0,
                migrations_in: 0,
                migrations_out: 0,
            },
        }
    }

    /// Tasks enfileiradas (inclui a atual)
    pub fn nr_running(&self) -> usize {
        self.active.nr_running()
    }

    pub fn is_idle(&self) -> bool {
        self.curr.is_none()
    }

    /// Remove `tid` da lista de paradas
    pub fn unpark(&mut self, tid: Tid) -> bool {
        match self.stopped.iter().position(|&t| t == tid) {
            Some(pos) => {
                self.stopped.remove(pos);
                true
            }
            None => false,
        }
    }
}
