//! # Scheduler Subsystem
//!
//! Escalonamento preemptivo por prioridade, uma run-queue por CPU.
//!
//! ```text
//! config     → faixas de prioridade, quantum, limites
//! task       → Task, tabela de tasks, contabilidade
//! core       → Scheduler: Priority Arrays, sono/wake, timers, migração
//! sync       → WaitQueue ordenada por prioridade
//! error      → SchedError / SchedResult
//! ```
//!
//! Seleção em O(1): cada CPU mantém um bitmap com um bit por nível e uma
//! fila FIFO por nível. Tempo real (0..100) e best-effort (100..140) são
//! faixas disjuntas do mesmo bitmap. Não há aging: um nível menos urgente
//! pode esperar indefinidamente sob carga dos mais urgentes.
//!
//! O scheduler não conhece registradores nem pilhas: a troca efetiva de
//! contexto e os IPIs são delegados ao [`Platform`](crate::arch::Platform).

pub mod config;
pub mod core;
pub mod error;
pub mod sync;
pub mod task;

#[cfg(feature = "self_test")]
pub mod test;

#[cfg(test)]
mod tests;
