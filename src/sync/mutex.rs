//! Mutex com herança de prioridade
//!
//! Diferente do [`Spinlock`](super::Spinlock), quem não consegue o lock
//! dorme na [`WaitQueue`] embutida e a posse passa direto ao primeiro da
//! fila. Enquanto houver alguém esperando, o dono roda com a prioridade do
//! waiter mais urgente. O cálculo fica no scheduler (`pi_block`,
//! `pi_release`), que conhece todos os locks que o dono segura e segue a
//! cadeia quando o próprio dono está bloqueado em outro Mutex.
//!
//! O lock de estado continua segurado enquanto a WaitQueue e o scheduler
//! são chamados (estado → WaitQueue → tasks). Soltá-lo antes abriria uma
//! janela entre decidir bloquear e dormir em que um unlock não veria o
//! waiter.

use core::sync::atomic::{AtomicUsize, Ordering};

use super::spinlock::Spinlock;
use super::Acquire;
use crate::sched::config::Priority;
use crate::sched::core::{PiKey, Scheduler, SleepMode, WakeReason};
use crate::sched::error::{SchedError, SchedResult};
use crate::sched::sync::{DeleteMode, InsertMode, WaitQueue};
use crate::sys::types::Tid;

/// Próxima identidade de Mutex (0 = ainda sem identidade)
static NEXT_KEY: AtomicUsize = AtomicUsize::new(1);

struct MutexState {
    owner: Option<Tid>,
    /// Prioridade atribuída do dono ao adquirir
    owner_prio: Option<Priority>,
}

pub struct Mutex {
    state: Spinlock<MutexState>,
    waiters: WaitQueue,
    /// Identidade na tabela de herança, atribuída na primeira disputa
    key: AtomicUsize,
}

impl Mutex {
    pub const fn new() -> Self {
        Self {
            state: Spinlock::new(MutexState {
                owner: None,
                owner_prio: None,
            }),
            waiters: WaitQueue::new(),
            key: AtomicUsize::new(0),
        }
    }

    fn key(&self) -> PiKey {
        let key = self.key.load(Ordering::Relaxed);
        if key != 0 {
            return key;
        }
        let fresh = NEXT_KEY.fetch_add(1, Ordering::Relaxed);
        match self
            .key
            .compare_exchange(0, fresh, Ordering::Relaxed, Ordering::Relaxed)
        {
            Ok(_) => fresh,
            Err(current) => current,
        }
    }

    /// Adquire o lock para `tid` (espera não interrompível).
    pub fn lock(&self, sched: &Scheduler, tid: Tid) -> SchedResult<Acquire> {
        self.lock_with(sched, tid, SleepMode::UNINTERRUPTIBLE)
    }

    /// Como [`lock`](Self::lock), mas um sinal encerra a espera.
    pub fn lock_interruptible(&self, sched: &Scheduler, tid: Tid) -> SchedResult<Acquire> {
        self.lock_with(sched, tid, SleepMode::INTERRUPTIBLE)
    }

    /// Como [`lock`](Self::lock), desistindo após `ticks`.
    pub fn lock_timeout(&self, sched: &Scheduler, tid: Tid, ticks: u64) -> SchedResult<Acquire> {
        self.lock_with(sched, tid, SleepMode::timeout(ticks))
    }

    fn lock_with(&self, sched: &Scheduler, tid: Tid, mode: SleepMode) -> SchedResult<Acquire> {
        let mut st = self.state.lock();

        let owner = match st.owner {
            None => {
                st.owner_prio = Some(sched.static_priority(tid)?);
                st.owner = Some(tid);
                return Ok(Acquire::Acquired);
            }
            Some(o) if o == tid => {
                crate::core::debug::oops::oops("(Mutex) lock recursivo pelo dono");
                return Err(SchedError::Deadlock);
            }
            Some(o) => o,
        };

        // Herança antes de enfileirar
        let key = self.key();
        sched.pi_block(tid, key, owner)?;

        if let Err(e) = self.waiters.insert(sched, tid, InsertMode::Sleep(mode)) {
            sched.pi_unblock(tid, key)?;
            return Err(e);
        }
        crate::ktrace!("(Mutex) bloqueado tid=", tid.as_u32());
        Ok(Acquire::Blocked)
    }

    /// Tenta adquirir sem bloquear.
    pub fn try_lock(&self, sched: &Scheduler, tid: Tid) -> SchedResult<bool> {
        let mut st = self.state.lock();
        if st.owner.is_some() {
            return Ok(false);
        }
        st.owner_prio = Some(sched.static_priority(tid)?);
        st.owner = Some(tid);
        Ok(true)
    }

    /// Libera o lock. Retorna o novo dono (primeiro da fila), se houver.
    ///
    /// Sem dono é no-op.
    pub fn unlock(&self, sched: &Scheduler, tid: Tid) -> SchedResult<Option<Tid>> {
        let mut st = self.state.lock();
        let Some(owner) = st.owner else {
            return Ok(None);
        };
        if owner != tid {
            crate::core::debug::oops::oops("(Mutex) unlock por quem não é dono");
            return Err(SchedError::NotOwner);
        }

        let key = self.key();
        // Waiters elevados enquanto dormiam: a fila volta a refletir a
        // prioridade efetiva antes de escolher o próximo dono
        if sched.pi_take_stale(key) {
            self.waiters.refresh(sched)?;
        }

        let next = self.waiters.pop_wake(sched);
        sched.pi_release(owner, key, next)?;

        let Some(next) = next else {
            st.owner = None;
            st.owner_prio = None;
            return Ok(None);
        };
        st.owner = Some(next);
        st.owner_prio = Some(sched.static_priority(next)?);
        crate::ktrace!("(Mutex) handoff para tid=", next.as_u32());
        Ok(Some(next))
    }

    /// Conclui uma espera interrompível ou com timeout depois que `tid`
    /// voltou a rodar.
    pub fn finish_lock(&self, sched: &Scheduler, tid: Tid) -> SchedResult<Acquire> {
        let st = self.state.lock();
        if st.owner == Some(tid) {
            sched.clear_wait(tid)?;
            return Ok(Acquire::Acquired);
        }
        if !self.waiters.contains(tid) {
            return Err(SchedError::NotQueued);
        }

        let abandon = match sched.wake_reason(tid)? {
            WakeReason::Asleep => return Ok(Acquire::Blocked),
            WakeReason::TimedOut => SchedError::TimedOut,
            WakeReason::Interrupted => SchedError::Interrupted,
            WakeReason::Spurious => match sched.resleep(tid) {
                Ok(()) => return Ok(Acquire::Blocked),
                Err(e) => e,
            },
        };

        self.waiters.delete(sched, tid, DeleteMode::NoWake)?;
        sched.clear_wait(tid)?;
        sched.pi_unblock(tid, self.key())?;
        crate::kdebug!("(Mutex) espera abandonada tid=", tid.as_u32());
        Err(abandon)
    }

    pub fn is_locked(&self) -> bool {
        self.state.lock().owner.is_some()
    }

    pub fn owner(&self) -> Option<Tid> {
        self.state.lock().owner
    }

    /// Prioridade atribuída do dono, registrada na aquisição
    pub fn owner_priority(&self) -> Option<Priority> {
        self.state.lock().owner_prio
    }

    pub fn waiters(&self) -> &WaitQueue {
        &self.waiters
    }
}

impl Default for Mutex {
    fn default() -> Self {
        Self::new()
    }
}
