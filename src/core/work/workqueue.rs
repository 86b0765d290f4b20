/// Arquivo: core/work/workqueue.rs
///
/// Propósito: Implementação de Filas de Trabalho (Work Queues).
/// Permite agendar a execução de funções para um momento posterior, fora
/// do contexto de interrupção.
///
/// Detalhes de Implementação:
/// - `PriorityQueue` ordenada pela prioridade do item (menor = mais
///   urgente), FIFO entre itens de mesma prioridade.
/// - Itens rodam sem nenhum lock da fila segurado, então um item pode
///   enfileirar outros.
/// - Projetado para ser consumido por threads dedicadas (worker threads).

// Filas de trabalho diferido

use alloc::boxed::Box;

use crate::klib::list::NodeId;
use crate::klib::pqueue::PriorityQueue;
use crate::sched::config::Priority;
use crate::sched::error::SchedResult;

/// Trait para itens de trabalho
pub trait WorkItem: Send + Sync {
    /// Executa o trabalho
    fn run(&mut self);
}

/// Um item de trabalho genérico (Closure)
pub struct ClosureWork {
    func: Box<dyn FnMut() + Send + Sync>,
}

impl ClosureWork {
    pub fn new<F>(f: F) -> Self
    where
        F: FnMut() + Send + Sync + 'static,
    {
        Self { func: Box::new(f) }
    }
}

impl WorkItem for ClosureWork {
    fn run(&mut self) {
        (self.func)();
    }
}

/// Handle de um item enfileirado.
pub type WorkId = NodeId;

/// Fila de trabalho
pub struct WorkQueue {
    queue: PriorityQueue<Box<dyn WorkItem>, Priority>,
}

impl WorkQueue {
    pub const fn new() -> Self {
        Self {
            queue: PriorityQueue::new(),
        }
    }

    /// Enfileira um trabalho para execução futura
    pub fn enqueue<W: WorkItem + 'static>(&self, prio: Priority, work: W) -> SchedResult<WorkId> {
        let id = self.queue.insert(Box::new(work), prio)?;
        crate::ktrace!("(Work) Enfileirado prio=", prio);
        Ok(id)
    }

    /// Cancela um item ainda não executado.
    pub fn cancel(&self, id: WorkId) -> bool {
        self.queue.delete(id).is_some()
    }

    /// Executa até `budget` itens, mais urgentes primeiro.
    ///
    /// Retorna quantos itens rodaram.
    pub fn run_pending(&self, budget: usize) -> usize {
        let mut ran = 0;
        while ran < budget {
            // Retirar um item protegendo o lock o mínimo possível
            match self.queue.delete_min() {
                Some((mut work, _)) => {
                    work.run();
                    ran += 1;
                }
                None => break, // Fila vazia
            }
        }
        ran
    }

    /// Processa todos os itens pendentes (Flush)
    pub fn process_all(&self) -> usize {
        self.run_pending(usize::MAX)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::sync::Arc;
    use alloc::vec::Vec;
    use std::sync::Mutex;

    fn recorder(log: &Arc<Mutex<Vec<u32>>>, tag: u32) -> ClosureWork {
        let log = Arc::clone(log);
        ClosureWork::new(move || log.lock().unwrap().push(tag))
    }

    #[test]
    fn test_runs_most_urgent_first_fifo_within_prio() {
        let wq = WorkQueue::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        wq.enqueue(50, recorder(&log, 1)).unwrap();
        wq.enqueue(10, recorder(&log, 2)).unwrap();
        wq.enqueue(50, recorder(&log, 3)).unwrap();
        wq.enqueue(10, recorder(&log, 4)).unwrap();

        assert_eq!(wq.run_pending(3), 3);
        assert_eq!(*log.lock().unwrap(), [2, 4, 1]);
        assert_eq!(wq.pending(), 1);
        assert_eq!(wq.process_all(), 1);
        assert_eq!(*log.lock().unwrap(), [2, 4, 1, 3]);
    }

    #[test]
    fn test_cancel() {
        let wq = WorkQueue::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let id = wq.enqueue(1, recorder(&log, 1)).unwrap();
        wq.enqueue(2, recorder(&log, 2)).unwrap();
        assert!(wq.cancel(id));
        assert!(!wq.cancel(id));
        wq.process_all();
        assert_eq!(*log.lock().unwrap(), [2]);
    }
}
