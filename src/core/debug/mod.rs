/// Arquivo: core/debug/mod.rs
///
/// Propósito: Módulo de diagnóstico e depuração.
/// Fornece ferramentas para inspeção e estatísticas do scheduler.
///
/// Módulos contidos:
/// - `oops`: Tratamento de erros recuperáveis e bugs fatais.
/// - `stats`: Contadores de eventos do scheduler.

pub mod oops;
pub mod stats;

pub use oops::{bug, oops};
pub use stats::SchedCounters;
