//! # Synchronization Primitives
//!
//! Primitivas de sincronização para ambiente SMP.
//!
//! ## Hierarquia de Uso
//!
//! ```text
//! Spinlock     → Seções críticas curtas (não pode dormir)
//! Mutex        → Seções que podem bloquear, com herança de prioridade
//! RwSemaphore  → Muitos leitores, poucos escritores (podem bloquear)
//! ```
//!
//! ## Regras
//!
//! - **Spinlock**: Usar apenas quando NÃO pode dormir (IRQ handlers)
//! - **Mutex/RwSemaphore**: operam sobre tasks do [`Scheduler`]; quem
//!   bloqueia recebe [`Acquire::Blocked`] e deve ceder a CPU
//! - **Ordem de Lock**: estado da primitiva → WaitQueue → scheduler
//!
//! [`Scheduler`]: crate::sched::core::Scheduler

/// Spinlock (busy-wait, não dorme)
pub mod spinlock;

/// Mutex com herança de prioridade
pub mod mutex;

/// Semáforo leitor/escritor
pub mod rwsem;

pub use mutex::Mutex;
pub use rwsem::RwSemaphore;
pub use spinlock::{Spinlock, SpinlockGuard};

/// Resultado de uma aquisição que pode bloquear
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Acquire {
    /// O chamador já é dono
    Acquired,
    /// O chamador está dormindo na fila. A posse chega por handoff de
    /// quem libera; esperas interrompíveis ou com timeout confirmam com
    /// `finish_*` ao voltar a rodar.
    Blocked,
}
