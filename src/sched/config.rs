//! Constantes de configuração do Scheduler
//!
//! Prioridades: menor valor = mais urgente.
//!
//! ```text
//!   0 ............ 99 | 100 ........... 139
//!   tempo real (RT)   | best-effort (normal)
//! ```
//!
//! As duas faixas são disjuntas e a de tempo real vem antes, então uma
//! única busca no bitmap atende as duas classes.

/// Nível de prioridade
pub type Priority = u8;

/// Primeira prioridade best-effort (0..MAX_RT_PRIO é tempo real)
pub const MAX_RT_PRIO: Priority = 100;

/// Número de níveis de prioridade (0..MAX_PRIO)
pub const MAX_PRIO: Priority = 140;

/// Prioridade padrão para tasks normais
pub const DEFAULT_PRIO: Priority = 120;

/// Prioridade do helper de migração (mais urgente possível)
pub const MIGRATION_PRIO: Priority = 0;

/// Quantum padrão (Timeslice) em ticks do timer
pub const DEFAULT_QUANTUM: u64 = 10;

/// Menor quantum (best-effort menos urgente)
pub const MIN_QUANTUM: u64 = 2;

/// Maior quantum (best-effort mais urgente)
pub const MAX_QUANTUM: u64 = 20;

/// Ticks por segundo
pub const HZ: u64 = 100;

/// Máximo de CPUs lógicas
pub const MAX_CPUS: usize = 64;

/// CPU que avança os jiffies e dispara timers
pub const BOOT_CPU: usize = 0;

/// Intervalo (em ticks) entre rodadas do balanceador
pub const BALANCE_INTERVAL: u64 = 20;

/// Elos máximos seguidos ao propagar herança de prioridade
pub const PI_MAX_DEPTH: usize = 8;

/// Tamanho do nome de uma task (debug)
pub const TASK_NAME_LEN: usize = 16;

/// Limite de tasks vivas
pub const MAX_TASKS: usize = 4096;

/// Palavras do bitmap de prioridades
pub const PRIO_BITMAP_WORDS: usize = crate::klib::bitmap::words_for(MAX_PRIO as usize);

/// Verifica se é uma prioridade de tempo real
#[inline]
pub const fn is_rt(prio: Priority) -> bool {
    prio < MAX_RT_PRIO
}

/// Verifica se o valor é um nível válido
#[inline]
pub const fn is_valid(prio: Priority) -> bool {
    prio < MAX_PRIO
}

/// Quantum para uma prioridade.
///
/// Tempo real recebe `DEFAULT_QUANTUM`. Best-effort decresce linearmente de
/// `MAX_QUANTUM` (prio 100) a `MIN_QUANTUM` (prio 139).
pub const fn time_slice_for(prio: Priority) -> u64 {
    if is_rt(prio) {
        return DEFAULT_QUANTUM;
    }
    let span = (MAX_PRIO - MAX_RT_PRIO - 1) as u64;
    let level = if prio >= MAX_PRIO {
        span
    } else {
        (prio - MAX_RT_PRIO) as u64
    };
    MAX_QUANTUM - (MAX_QUANTUM - MIN_QUANTUM) * level / span
}
