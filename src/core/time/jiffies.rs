//! Arquivo: core/time/jiffies.rs
//!
//! Propósito: Jiffies (Contador de ticks do sistema).
//! "Jiffies" é o termo histórico para ticks de relógio.
//! Útil para timeouts grosseiros e medição de uptime.
//!
//! Detalhes de Implementação:
//! - Usa AtomicU64 para ser thread-safe e lock-free.
//! - Um contador por instância de scheduler; incrementado apenas pelo
//!   tick da CPU de boot.

//! Contador de Jiffies (Ticks)

use core::sync::atomic::{AtomicU64, Ordering};

use crate::sched::config::HZ;

pub struct Jiffies(AtomicU64);

impl Jiffies {
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Retorna o número atual de jiffies.
    #[inline]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    /// Incrementa o contador e retorna o novo valor.
    #[inline]
    pub fn inc(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl Default for Jiffies {
    fn default() -> Self {
        Self::new()
    }
}

/// Converte segundos para jiffies.
#[inline]
pub const fn seconds_to_jiffies(seconds: u64) -> u64 {
    seconds * HZ
}

/// Converte milisegundos para jiffies (arredonda para cima).
#[inline]
pub const fn millis_to_jiffies(millis: u64) -> u64 {
    (millis * HZ + 999) / 1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(seconds_to_jiffies(2), 2 * HZ);
        assert_eq!(millis_to_jiffies(1000), HZ);
        // Timeout curto nunca vira zero
        assert_eq!(millis_to_jiffies(1), 1);
    }

    #[test]
    fn test_inc() {
        let j = Jiffies::new();
        assert_eq!(j.inc(), 1);
        assert_eq!(j.inc(), 2);
        assert_eq!(j.get(), 2);
    }
}
