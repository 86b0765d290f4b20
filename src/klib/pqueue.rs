/// Arquivo: klib/pqueue.rs
///
/// Propósito: Fila de prioridade pequena e barata, protegida por Spinlock.
///
/// Casca fina sobre a `PrioList`: mesma ordenação (menor prioridade
/// primeiro, FIFO entre iguais). Usada pelos timers de espera e pela
/// fila de trabalho diferido.

// Priority Queue

use alloc::collections::TryReserveError;

use crate::klib::list::{NodeId, PrioList};
use crate::sync::spinlock::Spinlock;

pub struct PriorityQueue<T, P> {
    list: Spinlock<PrioList<T, P>>,
}

impl<T, P: Ord + Copy> PriorityQueue<T, P> {
    pub const fn new() -> Self {
        Self {
            list: Spinlock::new(PrioList::new()),
        }
    }

    pub fn insert(&self, value: T, prio: P) -> Result<NodeId, TryReserveError> {
        self.list.lock().insert(value, prio)
    }

    /// Remove um item específico. `None` se já saiu da fila.
    pub fn delete(&self, id: NodeId) -> Option<T> {
        self.list.lock().remove(id)
    }

    /// Prioridade do primeiro item, sem removê-lo.
    pub fn peek_min(&self) -> Option<P> {
        self.list.lock().peek_min().map(|(_, p)| p)
    }

    pub fn delete_min(&self) -> Option<(T, P)> {
        self.list.lock().pop_min()
    }

    /// Remove o primeiro item se `pred` aceitar sua prioridade.
    ///
    /// Checagem e remoção acontecem sob o mesmo lock.
    pub fn delete_min_if(&self, pred: impl FnOnce(P) -> bool) -> Option<(T, P)> {
        let mut list = self.list.lock();
        let (_, prio) = list.peek_min()?;
        if pred(prio) {
            list.pop_min()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.list.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.lock().is_empty()
    }
}

impl<T: Clone, P: Ord + Copy> PriorityQueue<T, P> {
    /// Cópia do primeiro item.
    pub fn peek_min_value(&self) -> Option<(T, P)> {
        self.list.lock().peek_min().map(|(v, p)| (v.clone(), p))
    }
}

impl<T, P: Ord + Copy> Default for PriorityQueue<T, P> {
    fn default() -> Self {
        Self::new()
    }
}
