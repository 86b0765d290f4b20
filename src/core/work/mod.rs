//! Trabalho diferido
//!
//! Filas de funções para rodar fora do contexto de interrupção, em ordem
//! de prioridade.

pub mod workqueue;

pub use workqueue::{ClosureWork, WorkId, WorkItem, WorkQueue};
