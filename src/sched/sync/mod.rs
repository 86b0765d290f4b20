//! Filas de espera integradas ao scheduler

pub mod waitqueue;

pub use waitqueue::{DeleteMode, InsertMode, WaitQueue};
