//! Herança de prioridade
//!
//! O scheduler guarda, para cada Mutex disputado, o dono e as tasks
//! bloqueadas nele. A prioridade efetiva de uma task é
//! `min(atribuída, waiters de todos os locks que ela segura)`; quando ela
//! muda e a task está bloqueada em outro lock, o dono daquele é
//! recalculado também, até `PI_MAX_DEPTH` elos.
//!
//! O lock da tabela é folha: nenhum outro lock é tomado com ele
//! segurado.

use alloc::vec::Vec;

use super::Scheduler;
use crate::sched::config::{Priority, PI_MAX_DEPTH};
use crate::sched::error::{SchedError, SchedResult};
use crate::sched::task::TaskTable;
use crate::sys::types::Tid;

/// Identidade de um lock com herança
pub type PiKey = usize;

struct PiLock {
    key: PiKey,
    owner: Tid,
    /// Tasks bloqueadas, em ordem de chegada
    waiters: Vec<Tid>,
    /// Algum waiter mudou de prioridade depois de entrar na fila do lock
    stale: bool,
}

/// Locks disputados (com pelo menos um waiter)
pub(super) struct PiTable {
    locks: Vec<PiLock>,
}

impl PiTable {
    pub(super) const fn new() -> Self {
        Self { locks: Vec::new() }
    }

    fn find(&self, key: PiKey) -> Option<usize> {
        self.locks.iter().position(|l| l.key == key)
    }

    /// Tira `tid` da lista do lock. Retorna o dono, se o lock existia.
    fn remove_waiter(&mut self, key: PiKey, tid: Tid) -> Option<Tid> {
        let i = self.find(key)?;
        let lock = self.locks.get_mut(i)?;
        lock.waiters.retain(|&w| w != tid);
        let owner = lock.owner;
        if lock.waiters.is_empty() {
            self.locks.swap_remove(i);
        }
        Some(owner)
    }
}

impl Scheduler {
    /// `tid` vai bloquear no lock `key`, de `owner`. Registra o elo e
    /// propaga a herança pela cadeia.
    pub fn pi_block(&self, tid: Tid, key: PiKey, owner: Tid) -> SchedResult<()> {
        let mut tasks = self.tasks.lock();
        tasks.task(owner)?;
        if tasks.task(tid)?.se.pi_blocked_on.is_some() {
            return Err(SchedError::AlreadyQueued);
        }

        {
            let mut pi = self.pi.lock();
            let i = match pi.find(key) {
                Some(i) => i,
                None => {
                    pi.locks.try_reserve(1)?;
                    pi.locks.push(PiLock {
                        key,
                        owner,
                        waiters: Vec::new(),
                        stale: false,
                    });
                    pi.locks.len() - 1
                }
            };
            let reserved = match pi.locks.get_mut(i) {
                Some(lock) => {
                    lock.owner = owner;
                    lock.waiters.try_reserve(1).map(|()| lock.waiters.push(tid))
                }
                None => return Err(SchedError::NotQueued),
            };
            if let Err(e) = reserved {
                if pi.locks.get(i).is_some_and(|l| l.waiters.is_empty()) {
                    pi.locks.swap_remove(i);
                }
                return Err(e.into());
            }
        }

        tasks.task_mut(tid)?.se.pi_blocked_on = Some(key);
        self.pi_propagate(&mut tasks, owner)
    }

    /// `tid` desistiu de esperar por `key`: o dono perde a contribuição.
    pub fn pi_unblock(&self, tid: Tid, key: PiKey) -> SchedResult<()> {
        let mut tasks = self.tasks.lock();
        let task = tasks.task_mut(tid)?;
        if task.se.pi_blocked_on != Some(key) {
            return Err(SchedError::NotQueued);
        }
        task.se.pi_blocked_on = None;

        let owner = self.pi.lock().remove_waiter(key, tid);
        match owner {
            Some(o) => self.pi_propagate(&mut tasks, o),
            None => Ok(()),
        }
    }

    /// `owner` liberou `key`; `next` (se houver) recebeu a posse.
    ///
    /// O antigo dono fica com min(atribuída, waiters dos locks que ainda
    /// segura); o novo herda os waiters restantes de `key`.
    pub fn pi_release(&self, owner: Tid, key: PiKey, next: Option<Tid>) -> SchedResult<()> {
        let mut tasks = self.tasks.lock();
        if let Some(n) = next {
            if let Some(t) = tasks.get_mut(n) {
                if t.se.pi_blocked_on == Some(key) {
                    t.se.pi_blocked_on = None;
                }
            }
        }

        {
            let mut pi = self.pi.lock();
            if let Some(i) = pi.find(key) {
                let keep = match (pi.locks.get_mut(i), next) {
                    (Some(lock), Some(n)) => {
                        lock.waiters.retain(|&w| w != n);
                        lock.owner = n;
                        !lock.waiters.is_empty()
                    }
                    _ => false,
                };
                if !keep {
                    pi.locks.swap_remove(i);
                }
            }
        }

        self.pi_propagate(&mut tasks, owner)?;
        if let Some(n) = next {
            self.pi_propagate(&mut tasks, n)?;
        }
        Ok(())
    }

    /// Algum waiter de `key` mudou de prioridade desde que entrou na fila?
    /// Limpa a marca.
    pub fn pi_take_stale(&self, key: PiKey) -> bool {
        let mut pi = self.pi.lock();
        let Some(i) = pi.find(key) else {
            return false;
        };
        pi.locks
            .get_mut(i)
            .is_some_and(|l| ::core::mem::replace(&mut l.stale, false))
    }

    /// Lock com herança em que a task está bloqueada
    pub fn pi_blocked_on(&self, tid: Tid) -> SchedResult<Option<PiKey>> {
        Ok(self.tasks.lock().task(tid)?.se.pi_blocked_on)
    }

    /// Prioridade de `tid` mudou por fora: se ela espera num lock, o dono
    /// daquele é recalculado.
    pub(super) fn pi_waiter_changed(&self, tasks: &mut TaskTable, tid: Tid) -> SchedResult<()> {
        let Some(key) = tasks.task(tid)?.se.pi_blocked_on else {
            return Ok(());
        };
        let owner = {
            let mut pi = self.pi.lock();
            let Some(i) = pi.find(key) else {
                return Ok(());
            };
            match pi.locks.get_mut(i) {
                Some(lock) => {
                    lock.stale = true;
                    lock.owner
                }
                None => return Ok(()),
            }
        };
        self.pi_propagate(tasks, owner)
    }

    /// Task saindo do sistema: some das listas de waiters.
    pub(super) fn pi_forget_locked(&self, tasks: &mut TaskTable, tid: Tid) -> SchedResult<()> {
        let Some(key) = tasks.task_mut(tid)?.se.pi_blocked_on.take() else {
            return Ok(());
        };
        let owner = self.pi.lock().remove_waiter(key, tid);
        match owner {
            Some(o) => self.pi_propagate(tasks, o),
            None => Ok(()),
        }
    }

    /// min(atribuída, prioridade de cada waiter dos locks de `tid`)
    fn pi_target(&self, tasks: &TaskTable, tid: Tid) -> SchedResult<Priority> {
        let stat = tasks.task(tid)?.static_prio;
        let pi = self.pi.lock();
        Ok(pi
            .locks
            .iter()
            .filter(|l| l.owner == tid)
            .flat_map(|l| l.waiters.iter())
            .filter_map(|&w| tasks.get(w).map(|t| t.prio))
            .fold(stat, |best, p| best.min(p)))
    }

    /// Recalcula `tid` e segue a cadeia "bloqueada em → dono".
    fn pi_propagate(&self, tasks: &mut TaskTable, mut tid: Tid) -> SchedResult<()> {
        for _ in 0..PI_MAX_DEPTH {
            let target = self.pi_target(tasks, tid)?;
            let task = tasks.task(tid)?;
            let (current, blocked) = (task.prio, task.se.pi_blocked_on);
            if target == current {
                return Ok(());
            }

            self.set_priority_locked(tasks, tid, target)?;
            if target < current {
                self.counters.inc_pi_boosts();
                crate::kdebug!("(Sched) PI boost tid=", tid.as_u32());
            }

            let Some(key) = blocked else {
                return Ok(());
            };
            let mut pi = self.pi.lock();
            let Some(i) = pi.find(key) else {
                return Ok(());
            };
            match pi.locks.get_mut(i) {
                Some(lock) => {
                    lock.stale = true;
                    tid = lock.owner;
                }
                None => return Ok(()),
            }
        }

        crate::kwarn!("(Sched) Cadeia de herança longa demais. tid=", tid.as_u32());
        Ok(())
    }
}
