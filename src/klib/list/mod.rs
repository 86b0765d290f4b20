//! Listas do kernel.
//!
//! - `grouped`: lista ordenada por prioridade com grupos FIFO (base da
//!   WaitQueue e da PriorityQueue).

pub mod grouped;

pub use grouped::{Iter, NodeId, PrioList};
