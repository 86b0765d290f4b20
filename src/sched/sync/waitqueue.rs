//! Wait queue ordenada por prioridade
//!
//! Tasks bloqueadas aguardam em ordem de prioridade efetiva (menor valor
//! primeiro), FIFO entre iguais. A prioridade é capturada na inserção;
//! mudanças posteriores só valem depois de [`WaitQueue::reprioritize`]
//! ou [`WaitQueue::refresh`].
//!
//! O lock da fila é tomado antes do lock de tasks do scheduler, então
//! "enfileirar e dormir" é atômico em relação a quem acorda pela fila.

use alloc::vec::Vec;

use crate::klib::list::{NodeId, PrioList};
use crate::sched::config::Priority;
use crate::sched::core::{Scheduler, SleepMode};
use crate::sched::error::{SchedError, SchedResult};
use crate::sync::spinlock::Spinlock;
use crate::sys::types::Tid;

/// O que acontece com a task ao entrar na fila
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertMode {
    /// Só registra (quem chama cuida do estado)
    NoSleep,
    /// Registra e dorme
    Sleep(SleepMode),
}

/// O que acontece com a task ao sair da fila
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    NoWake,
    Wake,
}

struct Waiters {
    list: PrioList<Tid, Priority>,
    /// (tid, nó) ordenado por tid
    index: Vec<(Tid, NodeId)>,
}

impl Waiters {
    fn find(&self, tid: Tid) -> Result<usize, usize> {
        self.index.binary_search_by_key(&tid, |&(t, _)| t)
    }

    fn take(&mut self, tid: Tid) -> Option<Priority> {
        let pos = self.find(tid).ok()?;
        let (_, node) = self.index.remove(pos);
        let prio = self.list.priority(node);
        self.list.remove(node);
        prio
    }

    /// Move o waiter de `pos` no índice para o fim do grupo `prio`.
    fn requeue(&mut self, pos: usize, prio: Priority) -> SchedResult<()> {
        let Some(&(tid, node)) = self.index.get(pos) else {
            return Err(SchedError::NotQueued);
        };
        self.list.remove(node);
        // O slot liberado acima é reutilizado: não aloca
        match self.list.insert(tid, prio) {
            Ok(node) => {
                self.index[pos].1 = node;
                Ok(())
            }
            Err(e) => {
                self.index.remove(pos);
                Err(e.into())
            }
        }
    }

    fn pop(&mut self) -> Option<Tid> {
        let (tid, _) = self.list.pop_min()?;
        if let Ok(pos) = self.find(tid) {
            self.index.remove(pos);
        }
        Some(tid)
    }
}

pub struct WaitQueue {
    waiters: Spinlock<Waiters>,
}

impl WaitQueue {
    pub const fn new() -> Self {
        Self {
            waiters: Spinlock::new(Waiters {
                list: PrioList::new(),
                index: Vec::new(),
            }),
        }
    }

    /// Insere `tid` na fila com a sua prioridade efetiva atual.
    ///
    /// Com `InsertMode::Sleep` a task também dorme; se o sono falhar
    /// (sinal pendente, timeout zero, estado inválido) ela sai da fila e o
    /// erro é devolvido.
    pub fn insert(&self, sched: &Scheduler, tid: Tid, mode: InsertMode) -> SchedResult<()> {
        let mut w = self.waiters.lock();
        let pos = match w.find(tid) {
            Ok(_) => {
                crate::kwarn!("(WaitQ) Task já está na fila tid=", tid.as_u32());
                return Err(SchedError::AlreadyQueued);
            }
            Err(pos) => pos,
        };

        let prio = sched.get_priority(tid)?;
        w.index.try_reserve(1)?;
        let node = w.list.insert(tid, prio)?;
        w.index.insert(pos, (tid, node));

        if let InsertMode::Sleep(sleep) = mode {
            if let Err(e) = sched.sleep(tid, sleep) {
                w.take(tid);
                return Err(e);
            }
        }
        crate::ktrace!("(WaitQ) insert tid=", tid.as_u32());
        Ok(())
    }

    /// Remove `tid` da fila, acordando-a se pedido.
    pub fn delete(&self, sched: &Scheduler, tid: Tid, mode: DeleteMode) -> SchedResult<()> {
        let mut w = self.waiters.lock();
        if w.take(tid).is_none() {
            return Err(SchedError::NotQueued);
        }
        if mode == DeleteMode::Wake {
            sched.wake(tid);
        }
        Ok(())
    }

    /// Bloqueia sem limite (não interrompível).
    pub fn push(&self, sched: &Scheduler, tid: Tid) -> SchedResult<()> {
        self.insert(sched, tid, InsertMode::Sleep(SleepMode::UNINTERRUPTIBLE))
    }

    pub fn push_interruptible(&self, sched: &Scheduler, tid: Tid) -> SchedResult<()> {
        self.insert(sched, tid, InsertMode::Sleep(SleepMode::INTERRUPTIBLE))
    }

    pub fn push_timeout(&self, sched: &Scheduler, tid: Tid, ticks: u64) -> SchedResult<()> {
        self.insert(sched, tid, InsertMode::Sleep(SleepMode::timeout(ticks)))
    }

    /// Retira e acorda a task mais urgente.
    pub fn pop(&self, sched: &Scheduler) -> SchedResult<Tid> {
        match self.pop_wake(sched) {
            Some(tid) => Ok(tid),
            None => {
                crate::kwarn!("(WaitQ) pop em fila vazia");
                Err(SchedError::QueueEmpty)
            }
        }
    }

    pub(crate) fn pop_wake(&self, sched: &Scheduler) -> Option<Tid> {
        let tid = self.waiters.lock().pop()?;
        sched.wake(tid);
        Some(tid)
    }

    /// Acorda todas, em ordem de prioridade. Retorna quantas.
    pub fn wake_all(&self, sched: &Scheduler) -> usize {
        let mut w = self.waiters.lock();
        let mut count = 0;
        while let Some(tid) = w.pop() {
            sched.wake(tid);
            count += 1;
        }
        count
    }

    /// Reposiciona `tid` segundo sua prioridade efetiva atual (fim do grupo).
    pub fn reprioritize(&self, sched: &Scheduler, tid: Tid) -> SchedResult<()> {
        let mut w = self.waiters.lock();
        let pos = w.find(tid).map_err(|_| SchedError::NotQueued)?;
        let prio = sched.get_priority(tid)?;
        let node = w.index[pos].1;
        if w.list.priority(node) == Some(prio) {
            return Ok(());
        }
        w.requeue(pos, prio)
    }

    /// Reposiciona toda task cuja prioridade efetiva mudou desde a
    /// inserção. Retorna quantas mudaram de lugar.
    pub fn refresh(&self, sched: &Scheduler) -> SchedResult<usize> {
        let mut w = self.waiters.lock();
        let mut moved = 0;
        let mut pos = 0;
        while let Some(&(tid, node)) = w.index.get(pos) {
            let prio = sched.get_priority(tid)?;
            if w.list.priority(node) != Some(prio) {
                w.requeue(pos, prio)?;
                moved += 1;
            }
            pos += 1;
        }
        Ok(moved)
    }

    /// Task mais urgente (sem remover)
    pub fn first(&self) -> Option<Tid> {
        self.waiters.lock().list.peek_min().map(|(&tid, _)| tid)
    }

    /// Prioridade da task mais urgente
    pub fn first_prio(&self) -> Option<Priority> {
        self.waiters.lock().list.peek_min().map(|(_, p)| p)
    }

    pub fn contains(&self, tid: Tid) -> bool {
        self.waiters.lock().find(tid).is_ok()
    }

    pub fn len(&self) -> usize {
        self.waiters.lock().list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiters.lock().list.is_empty()
    }

    /// Tids na ordem de atendimento
    pub fn snapshot(&self) -> SchedResult<Vec<Tid>> {
        let w = self.waiters.lock();
        let mut out = Vec::new();
        out.try_reserve_exact(w.list.len())?;
        out.extend(w.list.iter().map(|(_, &tid, _)| tid));
        Ok(out)
    }
}

impl Default for WaitQueue {
    fn default() -> Self {
        Self::new()
    }
}
