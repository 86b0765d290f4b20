/// Arquivo: core/smp/mod.rs
///
/// Propósito: Módulo de Multiprocessamento Simétrico (SMP).
/// Comunicação entre cores e o conjunto de CPUs online.
///
/// Módulos contidos:
/// - `percpu`: Máscara de CPUs.
/// - `ipi`: Inter-Processor Interrupts.

pub mod ipi;
pub mod percpu;

pub use ipi::{IpiTarget, IpiVector};
pub use percpu::CpuMask;
