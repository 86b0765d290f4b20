//! Kernel Library (KLib).
//!
//! Estruturas de dados agnósticas de hardware para uso interno do núcleo.
//! Funciona como uma extensão da `core` library.

pub mod bitmap;
pub mod list;
pub mod pqueue;
pub mod test_framework;

pub use bitmap::Bitmap;
pub use list::{NodeId, PrioList};
pub use pqueue::PriorityQueue;
