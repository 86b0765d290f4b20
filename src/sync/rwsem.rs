//! Semáforo leitor/escritor
//!
//! Estado num único contador:
//!
//! ```text
//!   0   livre
//!  >0   n leitores ativos
//!  <0   escritor ativo; -(1 + escritores contabilizados na fila)
//! ```
//!
//! Escritor que chega com leitores ativos só entra na fila; o último
//! `up_read` passa o lock a ele e contabiliza toda a fila de escritores.
//! Leitores novos não passam à frente de escritores na fila.
//!
//! O lock do contador fica segurado durante as chamadas à WaitQueue e ao
//! scheduler (contador → WaitQueue → tasks): o `up_*` que passa o lock
//! adiante não pode correr entre um `down_*` decidir esperar e dormir.

use super::spinlock::Spinlock;
use super::Acquire;
use crate::sched::core::{Scheduler, SleepMode, WakeReason};
use crate::sched::error::{SchedError, SchedResult};
use crate::sched::sync::{DeleteMode, InsertMode, WaitQueue};
use crate::sys::types::Tid;

pub struct RwSemaphore {
    count: Spinlock<i32>,
    readers: WaitQueue,
    writers: WaitQueue,
}

impl RwSemaphore {
    pub const fn new() -> Self {
        Self {
            count: Spinlock::new(0),
            readers: WaitQueue::new(),
            writers: WaitQueue::new(),
        }
    }

    // =========================================================================
    // Leitura
    // =========================================================================

    pub fn down_read(&self, sched: &Scheduler, tid: Tid) -> SchedResult<Acquire> {
        self.down_read_with(sched, tid, SleepMode::UNINTERRUPTIBLE)
    }

    pub fn down_read_interruptible(&self, sched: &Scheduler, tid: Tid) -> SchedResult<Acquire> {
        self.down_read_with(sched, tid, SleepMode::INTERRUPTIBLE)
    }

    pub fn down_read_timeout(
        &self,
        sched: &Scheduler,
        tid: Tid,
        ticks: u64,
    ) -> SchedResult<Acquire> {
        self.down_read_with(sched, tid, SleepMode::timeout(ticks))
    }

    fn down_read_with(&self, sched: &Scheduler, tid: Tid, mode: SleepMode) -> SchedResult<Acquire> {
        let mut count = self.count.lock();
        if *count < 0 || !self.writers.is_empty() {
            self.readers.insert(sched, tid, InsertMode::Sleep(mode))?;
            return Ok(Acquire::Blocked);
        }
        *count += 1;
        Ok(Acquire::Acquired)
    }

    pub fn try_down_read(&self) -> bool {
        let mut count = self.count.lock();
        if *count < 0 || !self.writers.is_empty() {
            return false;
        }
        *count += 1;
        true
    }

    /// Libera uma leitura. Retorna quantas tasks acordou.
    pub fn up_read(&self, sched: &Scheduler) -> SchedResult<usize> {
        let mut count = self.count.lock();
        if *count <= 0 {
            crate::core::debug::oops::oops("(RwSem) up_read sem leitor ativo");
            return Err(SchedError::NotLocked);
        }
        *count -= 1;
        if *count == 0 && !self.writers.is_empty() {
            *count = -(self.writers.len() as i32);
            return Ok(self.writers.pop_wake(sched).map_or(0, |_| 1));
        }
        Ok(0)
    }

    // =========================================================================
    // Escrita
    // =========================================================================

    pub fn down_write(&self, sched: &Scheduler, tid: Tid) -> SchedResult<Acquire> {
        self.down_write_with(sched, tid, SleepMode::UNINTERRUPTIBLE)
    }

    pub fn down_write_interruptible(&self, sched: &Scheduler, tid: Tid) -> SchedResult<Acquire> {
        self.down_write_with(sched, tid, SleepMode::INTERRUPTIBLE)
    }

    pub fn down_write_timeout(
        &self,
        sched: &Scheduler,
        tid: Tid,
        ticks: u64,
    ) -> SchedResult<Acquire> {
        self.down_write_with(sched, tid, SleepMode::timeout(ticks))
    }

    fn down_write_with(&self, sched: &Scheduler, tid: Tid, mode: SleepMode) -> SchedResult<Acquire> {
        let mut count = self.count.lock();
        if *count == 0 {
            *count = -1;
            return Ok(Acquire::Acquired);
        }
        self.writers.insert(sched, tid, InsertMode::Sleep(mode))?;
        // Com leitores ativos a contabilização fica para o último up_read
        if *count < 0 {
            *count -= 1;
        }
        Ok(Acquire::Blocked)
    }

    pub fn try_down_write(&self) -> bool {
        let mut count = self.count.lock();
        if *count != 0 {
            return false;
        }
        *count = -1;
        true
    }

    /// Libera a escrita. Retorna quantas tasks acordou.
    pub fn up_write(&self, sched: &Scheduler) -> SchedResult<usize> {
        let mut count = self.count.lock();
        if *count >= 0 {
            crate::core::debug::oops::oops("(RwSem) up_write sem escritor ativo");
            return Err(SchedError::NotLocked);
        }
        *count += 1;
        if *count < 0 {
            return Ok(self.writers.pop_wake(sched).map_or(0, |_| 1));
        }
        // Lote: só os leitores que estão na fila agora
        let woken = self.readers.wake_all(sched);
        *count = woken as i32;
        Ok(woken)
    }

    // =========================================================================
    // Conclusão de esperas
    // =========================================================================

    /// Conclui uma espera de leitura depois que `tid` voltou a rodar.
    pub fn finish_read(&self, sched: &Scheduler, tid: Tid) -> SchedResult<Acquire> {
        let _count = self.count.lock();
        if !self.readers.contains(tid) {
            sched.clear_wait(tid)?;
            return Ok(Acquire::Acquired);
        }
        let abandon = match Self::outcome(sched, tid)? {
            Some(e) => e,
            None => return Ok(Acquire::Blocked),
        };
        // Leitor na fila não conta no estado
        self.readers.delete(sched, tid, DeleteMode::NoWake)?;
        sched.clear_wait(tid)?;
        Err(abandon)
    }

    /// Conclui uma espera de escrita depois que `tid` voltou a rodar.
    pub fn finish_write(&self, sched: &Scheduler, tid: Tid) -> SchedResult<Acquire> {
        let mut count = self.count.lock();
        if !self.writers.contains(tid) {
            sched.clear_wait(tid)?;
            return Ok(Acquire::Acquired);
        }
        let abandon = match Self::outcome(sched, tid)? {
            Some(e) => e,
            None => return Ok(Acquire::Blocked),
        };
        self.writers.delete(sched, tid, DeleteMode::NoWake)?;
        sched.clear_wait(tid)?;
        if *count < 0 {
            *count += 1;
        }
        // Último escritor desistiu: leitores retidos por ele entram
        if *count > 0 && self.writers.is_empty() && !self.readers.is_empty() {
            *count += self.readers.wake_all(sched) as i32;
        }
        crate::kdebug!("(RwSem) escritor desistiu tid=", tid.as_u32());
        Err(abandon)
    }

    /// None = continua esperando (dormindo de novo se preciso)
    fn outcome(sched: &Scheduler, tid: Tid) -> SchedResult<Option<SchedError>> {
        Ok(match sched.wake_reason(tid)? {
            WakeReason::Asleep => None,
            WakeReason::TimedOut => Some(SchedError::TimedOut),
            WakeReason::Interrupted => Some(SchedError::Interrupted),
            WakeReason::Spurious => sched.resleep(tid).err(),
        })
    }

    /// Valor bruto do contador
    pub fn count(&self) -> i32 {
        *self.count.lock()
    }

    pub fn is_write_locked(&self) -> bool {
        *self.count.lock() < 0
    }

    pub fn readers(&self) -> &WaitQueue {
        &self.readers
    }

    pub fn writers(&self) -> &WaitQueue {
        &self.writers
    }
}

impl Default for RwSemaphore {
    fn default() -> Self {
        Self::new()
    }
}
