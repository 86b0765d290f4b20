//! Thread Control Block
//!
//! Apenas o que o scheduler precisa: contexto de CPU, pilhas e espaço de
//! endereçamento pertencem ao kernel que embute este crate.

use bitflags::bitflags;

use super::accounting::Accounting;
use super::state::TaskState;
use crate::core::time::timer::TimerId;
use crate::sched::core::PiKey;
use crate::sched::config::{time_slice_for, Priority, TASK_NAME_LEN};
use crate::sys::types::{CpuId, Tid};

bitflags! {
    /// Flags de task
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TaskFlags: u32 {
        /// Thread de kernel
        const KTHREAD       = 1 << 0;
        /// Deve perder a CPU no próximo ponto de escalonamento
        const NEED_RESCHED  = 1 << 1;
        /// Na caixa de migração de outra CPU
        const MIGRATING     = 1 << 2;
        /// Sinal pendente
        const SIGPENDING    = 1 << 3;
        /// Dorme (ou dormiu por último) de forma interrompível
        const INTERRUPTIBLE = 1 << 4;
        /// Acordada pelo timer da espera
        const TIMED_OUT     = 1 << 5;
    }
}

/// Dados privados do scheduler por task.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchedEntity {
    /// CPU e nível em que a task está enfileirada
    pub on_rq: Option<(CpuId, Priority)>,
    /// Vizinhos na run-queue do nível
    pub run_prev: Option<Tid>,
    pub run_next: Option<Tid>,
    /// CPU em cuja lista de paradas a task está
    pub parked_on: Option<CpuId>,
    /// Ticks restantes do quantum
    pub time_slice: u64,
    /// Timer da espera atual (handle, deadline)
    pub timer: Option<(TimerId, u64)>,
    /// Deadline absoluto da espera em curso (sobrevive a wakes espúrios)
    pub wait_deadline: Option<u64>,
    /// Migração adiada até a task sair da CPU
    pub pending_cpu: Option<CpuId>,
    /// Mutex com herança em que a task está bloqueada
    pub pi_blocked_on: Option<PiKey>,
}

/// Thread Control Block
pub struct Task {
    /// ID único
    pub tid: Tid,
    /// Estado atual
    pub state: TaskState,
    /// Prioridade atribuída (0 = mais urgente)
    pub static_prio: Priority,
    /// Prioridade efetiva (pode estar elevada por herança)
    pub prio: Priority,
    /// CPU de residência (afinidade)
    pub cpu: CpuId,
    pub flags: TaskFlags,
    pub se: SchedEntity,
    /// Estatísticas de contabilidade
    pub accounting: Accounting,
    /// Código de saída (para reap)
    pub exit_code: Option<i32>,
    /// Nome (debug)
    name: [u8; TASK_NAME_LEN],
    name_len: usize,
}

impl Task {
    pub fn new(tid: Tid, name: &str, prio: Priority, cpu: CpuId) -> Self {
        // Preparar buffer de nome (corta em fronteira de caractere)
        let mut name_buf = [0u8; TASK_NAME_LEN];
        let mut len = name.len().min(TASK_NAME_LEN);
        while !name.is_char_boundary(len) {
            len -= 1;
        }
        name_buf[..len].copy_from_slice(&name.as_bytes()[..len]);

        Self {
            tid,
            state: TaskState::JustBorn,
            static_prio: prio,
            prio,
            cpu,
            flags: TaskFlags::empty(),
            se: SchedEntity {
                time_slice: time_slice_for(prio),
                ..SchedEntity::default()
            },
            accounting: Accounting::new(),
            exit_code: None,
            name: name_buf,
            name_len: len,
        }
    }

    pub fn name(&self) -> &str {
        ::core::str::from_utf8(&self.name[..self.name_len]).unwrap_or("?")
    }

    /// Prioridade elevada acima da atribuída
    pub fn is_boosted(&self) -> bool {
        self.prio < self.static_prio
    }

    pub fn is_queued(&self) -> bool {
        self.se.on_rq.is_some()
    }
}
