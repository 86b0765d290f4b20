//! Task management module
//!
//! A `Task` é o registro que o scheduler mantém por thread: estado,
//! prioridades, residência em CPU e contabilidade. Vive na `TaskTable`,
//! indexada por `Tid`.

pub mod accounting;
pub mod entity;
pub mod state;
pub mod table;

pub use crate::sys::Tid;
pub use accounting::Accounting;
pub use entity::{SchedEntity, Task, TaskFlags};
pub use state::TaskState;
pub use table::TaskTable;
