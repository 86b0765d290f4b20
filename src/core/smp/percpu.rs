/// Arquivo: core/smp/percpu.rs
///
/// Propósito: Máscara de CPUs (online, afinidade).
///
/// Detalhes de Implementação:
/// - Um bit por CPU lógica em um `u64`, limitado por `MAX_CPUS`.
/// - Os dados per-CPU do scheduler vivem em um array indexado por `CpuId`
///   dentro do próprio `Scheduler`, não em globais.

// Máscara de CPUs

use crate::sched::config::MAX_CPUS;
use crate::sys::types::CpuId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuMask(u64);

impl CpuMask {
    pub const EMPTY: Self = Self(0);

    /// Máscara com as CPUs `0..n`.
    pub const fn first(n: usize) -> Self {
        if n >= MAX_CPUS {
            Self(u64::MAX)
        } else {
            Self((1u64 << n) - 1)
        }
    }

    pub const fn single(cpu: CpuId) -> Self {
        if cpu < MAX_CPUS {
            Self(1 << cpu)
        } else {
            Self(0)
        }
    }

    #[inline]
    pub fn set(&mut self, cpu: CpuId) {
        if cpu < MAX_CPUS {
            self.0 |= 1 << cpu;
        }
    }

    #[inline]
    pub fn clear(&mut self, cpu: CpuId) {
        if cpu < MAX_CPUS {
            self.0 &= !(1 << cpu);
        }
    }

    #[inline]
    pub const fn contains(&self, cpu: CpuId) -> bool {
        cpu < MAX_CPUS && (self.0 & (1 << cpu)) != 0
    }

    pub const fn count(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub const fn bits(&self) -> u64 {
        self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = CpuId> {
        let bits = self.0;
        (0..MAX_CPUS).filter(move |cpu| bits & (1 << cpu) != 0)
    }
}
