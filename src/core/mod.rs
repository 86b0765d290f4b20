//! Core Module
//!
//! Serviços centrais usados pelo scheduler, independentes de arquitetura.

pub mod debug;
pub mod logging;
pub mod smp;
pub mod time;
pub mod work;
