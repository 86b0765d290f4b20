/// Arquivo: core/debug/stats.rs
///
/// Propósito: Contadores estatísticos do scheduler.
/// Usado para monitoramento e para os testes verificarem efeitos colaterais
/// (IPIs enviados, boosts aplicados).
///
/// Detalhes de Implementação:
/// - Usa atômicos (AtomicU64) para permitir atualizações concorrentes sem locks.
/// - Contadores monotônicos crescentes.
use core::sync::atomic::{AtomicU64, Ordering};

pub struct SchedCounters {
    pub context_switches: AtomicU64,
    pub wakeups: AtomicU64,
    pub migrations: AtomicU64,
    pub pi_boosts: AtomicU64,
    pub ipis_sent: AtomicU64,
    pub tasks_spawned: AtomicU64,
    pub tasks_reaped: AtomicU64,
}

/// Cópia instantânea dos contadores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountersSnapshot {
    pub context_switches: u64,
    pub wakeups: u64,
    pub migrations: u64,
    pub pi_boosts: u64,
    pub ipis_sent: u64,
    pub tasks_spawned: u64,
    pub tasks_reaped: u64,
}

impl SchedCounters {
    pub const fn new() -> Self {
        Self {
            context_switches: AtomicU64::new(0),
            wakeups: AtomicU64::new(0),
            migrations: AtomicU64::new(0),
            pi_boosts: AtomicU64::new(0),
            ipis_sent: AtomicU64::new(0),
            tasks_spawned: AtomicU64::new(0),
            tasks_reaped: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn inc_context_switches(&self) {
        self.context_switches.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_wakeups(&self) {
        self.wakeups.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_migrations(&self) {
        self.migrations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_pi_boosts(&self) {
        self.pi_boosts.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_ipis_sent(&self) {
        self.ipis_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_tasks_spawned(&self) {
        self.tasks_spawned.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_tasks_reaped(&self) {
        self.tasks_reaped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            context_switches: self.context_switches.load(Ordering::Relaxed),
            wakeups: self.wakeups.load(Ordering::Relaxed),
            migrations: self.migrations.load(Ordering::Relaxed),
            pi_boosts: self.pi_boosts.load(Ordering::Relaxed),
            ipis_sent: self.ipis_sent.load(Ordering::Relaxed),
            tasks_spawned: self.tasks_spawned.load(Ordering::Relaxed),
            tasks_reaped: self.tasks_reaped.load(Ordering::Relaxed),
        }
    }

    /// Imprime estatísticas no log
    pub fn dump(&self) {
        let s = self.snapshot();
        crate::kinfo!("--- Estatísticas do Scheduler ---");
        crate::kinfo!("Trocas Contexto:  ", s.context_switches);
        crate::kinfo!("Wakeups:          ", s.wakeups);
        crate::kinfo!("Migrações:        ", s.migrations);
        crate::kinfo!("Boosts (PI):      ", s.pi_boosts);
        crate::kinfo!("IPIs Enviados:    ", s.ipis_sent);
        crate::kinfo!("Tarefas Criadas:  ", s.tasks_spawned);
        crate::kinfo!("Tarefas Coletadas:", s.tasks_reaped);
        crate::kinfo!("--------------------");
    }
}

impl Default for SchedCounters {
    fn default() -> Self {
        Self::new()
    }
}
