//! System Definitions (ABI).
//!
//! Tipos compartilhados entre o núcleo de escalonamento e o resto do kernel,
//! e os códigos de erro devolvidos na fronteira das syscalls.

pub mod error;
pub mod types;

pub use error::Errno;
pub use types::{CpuId, Tid};
