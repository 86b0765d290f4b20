//! Tempo e Timers
//!
//! - `jiffies`: contador de ticks avançado pelo tick da CPU de boot.
//! - `timer`: fila de deadlines das esperas com timeout.

pub mod jiffies;
pub mod timer;

pub use jiffies::Jiffies;
pub use timer::TimerQueue;
