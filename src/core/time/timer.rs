/// Arquivo: core/time/timer.rs
///
/// Propósito: Timers das esperas com timeout.
/// Cada task dormindo com timeout tem uma entrada na fila, chaveada pelo
/// deadline absoluto em jiffies.
///
/// Detalhes de Implementação:
/// - `PriorityQueue` ordenada por deadline (FIFO entre deadlines iguais).
/// - Quem vencer a corrida (wake ou expiração) remove a entrada; o outro
///   encontra o handle já inválido e não faz nada.

// Fila de Timers

use crate::klib::list::NodeId;
use crate::klib::pqueue::PriorityQueue;
use crate::sched::error::SchedResult;
use crate::sys::types::Tid;

/// Handle de um timer armado.
pub type TimerId = NodeId;

pub struct TimerQueue {
    queue: PriorityQueue<Tid, u64>,
}

impl TimerQueue {
    pub const fn new() -> Self {
        Self {
            queue: PriorityQueue::new(),
        }
    }

    /// Arma um timer que expira em `deadline` (jiffies absolutos).
    pub fn arm(&self, tid: Tid, deadline: u64) -> SchedResult<TimerId> {
        let id = self.queue.insert(tid, deadline)?;
        crate::ktrace!("(Timer) Armado deadline=", deadline);
        Ok(id)
    }

    /// Cancela um timer. Retorna `false` se ele já tinha expirado.
    pub fn cancel(&self, id: TimerId) -> bool {
        self.queue.delete(id).is_some()
    }

    /// Remove todos os timers com deadline <= `now`, chamando `f(tid, deadline)`
    /// para cada um.
    ///
    /// `f` roda sem o lock da fila.
    pub fn expire(&self, now: u64, mut f: impl FnMut(Tid, u64)) -> usize {
        let mut fired = 0;
        while let Some((tid, deadline)) = self.queue.delete_min_if(|deadline| deadline <= now) {
            f(tid, deadline);
            fired += 1;
        }
        fired
    }

    /// Próximo deadline, se houver.
    pub fn next_deadline(&self) -> Option<u64> {
        self.queue.peek_min()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Default for TimerQueue {
    fn default() -> Self {
        Self::new()
    }
}
