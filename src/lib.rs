//! Forge Sched.
//!
//! Núcleo de escalonamento e sincronização intra-kernel do Redstone OS.
//! Define a estrutura hierárquica do subsistema:
//!
//! ```text
//! klib::list::PrioList      → lista ordenada por prioridade (grupos FIFO)
//!   ├── klib::pqueue        → fila de prioridade genérica (timers, work)
//!   └── sched::sync         → WaitQueue (integra com estados da Task)
//!         ├── sync::mutex   → Mutex com herança de prioridade
//!         └── sync::rwsem   → Semáforo leitor/escritor
//! sched::core::Scheduler    → Priority Arrays per-CPU + migração SMP
//! ```
//!
//! Tudo que toca hardware (troca de contexto, IPIs, cli/sti) é alcançado
//! pelos traits de `arch`; o kernel que embute este crate fornece as
//! implementações.

#![cfg_attr(not(test), no_std)]

// Habilitar alocação dinâmica (necessário para Vec/VecDeque/Box)
extern crate alloc;

// --- Camada de Hardware (apenas traits) ---
pub mod arch;

// --- Módulos Centrais ---
pub mod core; // Logging, Debug, SMP, Tempo, Work
pub mod klib; // Estruturas de dados agnósticas
pub mod sys; // Tipos de sistema e Errno

// --- Subsistemas ---
pub mod sched; // Scheduler, Tasks, WaitQueue
pub mod sync; // Spinlock, Mutex, RwSemaphore

pub use crate::sched::core::Scheduler;
pub use crate::sched::error::{SchedError, SchedResult};
pub use crate::sys::types::{CpuId, Tid};
