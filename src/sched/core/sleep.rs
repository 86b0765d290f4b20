//! Sono, wake-up, timeouts e sinais

use super::Scheduler;
use crate::sched::error::{SchedError, SchedResult};
use crate::sched::task::{TaskFlags, TaskState, TaskTable};
use crate::sys::types::Tid;

/// Como uma task dorme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SleepMode {
    /// Sinal pendente acorda a task
    pub interruptible: bool,
    /// Ticks até o timeout (None = sem limite, Some(0) = já vencido)
    pub timeout: Option<u64>,
}

impl SleepMode {
    pub const UNINTERRUPTIBLE: Self = Self {
        interruptible: false,
        timeout: None,
    };

    pub const INTERRUPTIBLE: Self = Self {
        interruptible: true,
        timeout: None,
    };

    pub const fn timeout(ticks: u64) -> Self {
        Self {
            interruptible: false,
            timeout: Some(ticks),
        }
    }
}

/// Por que uma task que dormiu voltou a rodar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
    /// Ainda dormindo
    Asleep,
    /// O timer da espera venceu
    TimedOut,
    /// Sinal pendente numa espera interrompível
    Interrupted,
    /// Acordada por outro motivo (wake normal ou espúrio)
    Spurious,
}

impl Scheduler {
    /// Coloca a task para dormir (Runnable/Running → Sleeping).
    ///
    /// Falha com `Interrupted` sem dormir se a espera for interrompível e
    /// já houver sinal pendente, e com `TimedOut` se o timeout for zero.
    pub fn sleep(&self, tid: Tid, mode: SleepMode) -> SchedResult<()> {
        let mut tasks = self.tasks.lock();
        let deadline = mode
            .timeout
            .map(|t| self.jiffies.get().saturating_add(t));
        self.sleep_until_locked(&mut tasks, tid, mode.interruptible, deadline)
    }

    pub(super) fn sleep_until_locked(
        &self,
        tasks: &mut TaskTable,
        tid: Tid,
        interruptible: bool,
        deadline: Option<u64>,
    ) -> SchedResult<()> {
        let task = tasks.task(tid)?;
        if !task.state.is_runnable() {
            return Err(SchedError::InvalidState);
        }
        if interruptible && task.flags.contains(TaskFlags::SIGPENDING) {
            return Err(SchedError::Interrupted);
        }

        // Timer primeiro: falha de memória não muda nada
        let timer = match deadline {
            Some(d) if d <= self.jiffies.get() => return Err(SchedError::TimedOut),
            Some(d) => Some((self.timers.arm(tid, d)?, d)),
            None => None,
        };

        let task = tasks.task_mut(tid)?;
        task.flags.set(TaskFlags::INTERRUPTIBLE, interruptible);
        // Entrada na caixa de migração (se houver) fica obsoleta
        task.flags.remove(TaskFlags::TIMED_OUT | TaskFlags::MIGRATING);
        task.se.timer = timer;
        task.se.wait_deadline = deadline;
        task.state = TaskState::Sleeping;
        let cpu = task.cpu;

        self.dequeue_task(tasks, tid);

        let mut rq = self.rq(cpu).lock();
        if rq.curr == Some(tid) {
            self.resched_cpu(&mut rq, tasks);
        }
        crate::ktrace!("(Sched) sleep tid=", tid.as_u32());
        Ok(())
    }

    /// Acorda uma task Sleeping. Retorna false se ela não estava dormindo.
    pub fn wake(&self, tid: Tid) -> bool {
        let mut tasks = self.tasks.lock();
        self.wake_locked(&mut tasks, tid)
    }

    pub(super) fn wake_locked(&self, tasks: &mut TaskTable, tid: Tid) -> bool {
        let Some(task) = tasks.get_mut(tid) else {
            return false;
        };
        if task.state != TaskState::Sleeping {
            return false;
        }
        if let Some((id, _)) = task.se.timer.take() {
            self.timers.cancel(id);
        }

        self.make_runnable_locked(tasks, tid);
        self.counters.inc_wakeups();
        crate::ktrace!("(Sched) wake tid=", tid.as_u32());
        true
    }

    /// Timer de espera vencido. Ignora disparos de esperas já encerradas.
    pub(super) fn timer_fired(&self, tid: Tid, deadline: u64) {
        let mut tasks = self.tasks.lock();
        let Some(task) = tasks.get_mut(tid) else {
            return;
        };
        if task.state != TaskState::Sleeping {
            return;
        }
        match task.se.timer {
            Some((_, d)) if d == deadline => {}
            _ => return,
        }
        task.se.timer = None;
        task.flags.insert(TaskFlags::TIMED_OUT);
        self.wake_locked(&mut tasks, tid);
    }

    /// Transição de estado genérica.
    pub fn set_state(&self, tid: Tid, state: TaskState) -> SchedResult<()> {
        match state {
            TaskState::Sleeping => self.sleep(tid, SleepMode::UNINTERRUPTIBLE),
            TaskState::Runnable => match self.state(tid)? {
                TaskState::Sleeping => {
                    self.wake(tid);
                    Ok(())
                }
                TaskState::Stopped => self.resume(tid),
                TaskState::JustBorn => self.activate(tid),
                TaskState::Runnable | TaskState::Running => Ok(()),
                TaskState::Zombie => Err(SchedError::InvalidState),
            },
            TaskState::Stopped => self.stop(tid),
            TaskState::Zombie => self.exit(tid, 0),
            TaskState::Running | TaskState::JustBorn => Err(SchedError::InvalidState),
        }
    }

    // =========================================================================
    // Sinais
    // =========================================================================

    /// Marca sinal pendente. Acorda a task se ela dorme de forma
    /// interrompível; retorna se acordou.
    pub fn signal(&self, tid: Tid) -> SchedResult<bool> {
        let mut tasks = self.tasks.lock();
        let task = tasks.task_mut(tid)?;
        task.flags.insert(TaskFlags::SIGPENDING);
        let wake = task.state == TaskState::Sleeping && task.flags.contains(TaskFlags::INTERRUPTIBLE);
        Ok(wake && self.wake_locked(&mut tasks, tid))
    }

    pub fn clear_signal(&self, tid: Tid) -> SchedResult<()> {
        self.tasks.lock().task_mut(tid)?.flags.remove(TaskFlags::SIGPENDING);
        Ok(())
    }

    pub fn signal_pending(&self, tid: Tid) -> SchedResult<bool> {
        Ok(self.tasks.lock().task(tid)?.flags.contains(TaskFlags::SIGPENDING))
    }

    // =========================================================================
    // Suporte às primitivas de bloqueio
    // =========================================================================

    /// Classifica o último wake-up da task.
    pub fn wake_reason(&self, tid: Tid) -> SchedResult<WakeReason> {
        let tasks = self.tasks.lock();
        let task = tasks.task(tid)?;
        let flags = task.flags;
        Ok(if task.state == TaskState::Sleeping {
            WakeReason::Asleep
        } else if flags.contains(TaskFlags::TIMED_OUT) {
            WakeReason::TimedOut
        } else if flags.contains(TaskFlags::INTERRUPTIBLE | TaskFlags::SIGPENDING) {
            WakeReason::Interrupted
        } else {
            WakeReason::Spurious
        })
    }

    /// Volta a dormir na mesma espera (mesmo modo, mesmo deadline).
    pub fn resleep(&self, tid: Tid) -> SchedResult<()> {
        let mut tasks = self.tasks.lock();
        let task = tasks.task(tid)?;
        let interruptible = task.flags.contains(TaskFlags::INTERRUPTIBLE);
        let deadline = task.se.wait_deadline;
        self.sleep_until_locked(&mut tasks, tid, interruptible, deadline)
    }

    /// Encerra a espera: limpa deadline e marcas de wake-up.
    pub fn clear_wait(&self, tid: Tid) -> SchedResult<()> {
        let mut tasks = self.tasks.lock();
        let task = tasks.task_mut(tid)?;
        if let Some((id, _)) = task.se.timer.take() {
            self.timers.cancel(id);
        }
        task.se.wait_deadline = None;
        task.flags.remove(TaskFlags::TIMED_OUT | TaskFlags::INTERRUPTIBLE);
        Ok(())
    }
}
