//! Scheduler principal
//!
//! Uma instância de [`Scheduler`] serve todas as CPUs: cada CPU tem sua
//! própria `CpuRq` (Priority Array + lista de paradas) atrás de um
//! Spinlock, e a tabela de tasks tem o seu.
//!
//! Ordem de locks (sempre nesta ordem):
//!
//! ```text
//! lock da primitiva (Mutex/RwSem) → WaitQueue → tasks → cpu → mailbox / timers
//! ```
//!
//! A tabela de herança (`pi`) é folha: solta antes de qualquer outro
//! lock ser tomado.
//!
//! A task em execução continua enfileirada no seu nível; `schedule` só
//! troca o contexto quando a escolha muda.

pub mod cpu;
mod debug;
mod migrate;
mod pi;
pub mod runqueue;
mod sleep;
mod switch;

pub use cpu::{CpuRq, CpuStats};
pub use pi::PiKey;
pub use runqueue::PrioArray;
pub use sleep::{SleepMode, WakeReason};

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use crate::arch::Platform;
use crate::core::debug::stats::SchedCounters;
use crate::core::smp::ipi::{self, IpiTarget, IpiVector};
use crate::core::smp::percpu::CpuMask;
use crate::core::time::{Jiffies, TimerQueue};
use crate::sched::config::{self, Priority, MAX_CPUS, MAX_PRIO};
use crate::sched::error::{SchedError, SchedResult};
use crate::sched::task::{Accounting, Task, TaskFlags, TaskState, TaskTable};
use crate::sync::spinlock::Spinlock;
use crate::sys::types::{CpuId, Tid};

/// Cópia do estado visível de uma task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskInfo {
    pub tid: Tid,
    pub state: TaskState,
    pub static_prio: Priority,
    pub prio: Priority,
    pub cpu: CpuId,
    pub flags: TaskFlags,
    pub time_slice: u64,
    pub accounting: Accounting,
}

pub struct Scheduler {
    platform: &'static dyn Platform,
    online: CpuMask,
    tasks: Spinlock<TaskTable>,
    cpus: Vec<Spinlock<CpuRq>>,
    /// Caixas de migração (tasks a serem enfileiradas pelo helper da CPU)
    mailboxes: Vec<Spinlock<VecDeque<Tid>>>,
    jiffies: Jiffies,
    timers: TimerQueue,
    /// Locks com herança disputados
    pi: Spinlock<pi::PiTable>,
    counters: SchedCounters,
}

impl Scheduler {
    /// Cria o scheduler com `nr_cpus` CPUs online (0..nr_cpus).
    pub fn new(nr_cpus: usize, platform: &'static dyn Platform) -> SchedResult<Self> {
        if nr_cpus == 0 || nr_cpus > MAX_CPUS {
            return Err(SchedError::InvalidCpu);
        }

        let mut cpus = Vec::new();
        cpus.try_reserve_exact(nr_cpus)?;
        let mut mailboxes = Vec::new();
        mailboxes.try_reserve_exact(nr_cpus)?;
        for id in 0..nr_cpus {
            cpus.push(Spinlock::new(CpuRq::new(id)));
            mailboxes.push(Spinlock::new(VecDeque::new()));
        }

        crate::kinfo!("(Sched) Inicializado. CPUs=", nr_cpus);
        Ok(Self {
            platform,
            online: CpuMask::first(nr_cpus),
            tasks: Spinlock::new(TaskTable::new()),
            cpus,
            mailboxes,
            jiffies: Jiffies::new(),
            timers: TimerQueue::new(),
            pi: Spinlock::new(pi::PiTable::new()),
            counters: SchedCounters::new(),
        })
    }

    pub fn nr_cpus(&self) -> usize {
        self.cpus.len()
    }

    pub fn online(&self) -> CpuMask {
        self.online
    }

    /// Jiffies desde a criação
    pub fn jiffies(&self) -> u64 {
        self.jiffies.get()
    }

    // =========================================================================
    // Ciclo de vida
    // =========================================================================

    /// Cria uma task (JustBorn) residente em `cpu`.
    pub fn spawn(&self, name: &str, prio: Priority, cpu: CpuId) -> SchedResult<Tid> {
        self.spawn_with(name, prio, cpu, TaskFlags::empty())
    }

    /// Cria uma kernel thread (JustBorn).
    pub fn spawn_kthread(&self, name: &str, prio: Priority, cpu: CpuId) -> SchedResult<Tid> {
        self.spawn_with(name, prio, cpu, TaskFlags::KTHREAD)
    }

    fn spawn_with(
        &self,
        name: &str,
        prio: Priority,
        cpu: CpuId,
        flags: TaskFlags,
    ) -> SchedResult<Tid> {
        if !config::is_valid(prio) {
            return Err(SchedError::InvalidPriority);
        }
        if !self.online.contains(cpu) {
            return Err(SchedError::InvalidCpu);
        }

        let tid = self.tasks.lock().insert(|tid| {
            let mut task = Task::new(tid, name, prio, cpu);
            task.flags = flags;
            task
        })?;

        self.counters.inc_tasks_spawned();
        crate::ktrace!("(Sched) Task criada tid=", tid.as_u32());
        Ok(tid)
    }

    /// JustBorn → Runnable (enfileirada na CPU de residência).
    pub fn activate(&self, tid: Tid) -> SchedResult<()> {
        let mut tasks = self.tasks.lock();
        if tasks.task(tid)?.state != TaskState::JustBorn {
            return Err(SchedError::InvalidState);
        }
        self.make_runnable_locked(&mut tasks, tid);
        Ok(())
    }

    /// Termina a task (→ Zombie). Tasks dormindo precisam ser acordadas antes,
    /// para saírem das wait queues pelo caminho normal.
    pub fn exit(&self, tid: Tid, code: i32) -> SchedResult<()> {
        let mut tasks = self.tasks.lock();
        let task = tasks.task_mut(tid)?;
        match task.state {
            TaskState::Sleeping | TaskState::Zombie => return Err(SchedError::InvalidState),
            _ => {}
        }

        if let Some((id, _)) = task.se.timer.take() {
            self.timers.cancel(id);
        }
        task.se.wait_deadline = None;
        task.se.pending_cpu = None;
        // Entrada na caixa de migração fica obsoleta e é ignorada
        task.flags.remove(TaskFlags::MIGRATING | TaskFlags::NEED_RESCHED);
        task.state = TaskState::Zombie;
        task.exit_code = Some(code);
        let cpu = task.cpu;
        let parked = task.se.parked_on.take();

        self.dequeue_task(&mut tasks, tid);
        if let Some(p) = parked {
            self.rq(p).lock().unpark(tid);
        }

        {
            let mut rq = self.rq(cpu).lock();
            if rq.curr == Some(tid) {
                self.resched_cpu(&mut rq, &mut tasks);
            }
        }
        self.pi_forget_locked(&mut tasks, tid)?;

        crate::kdebug!("(Sched) exit tid=", tid.as_u32());
        Ok(())
    }

    /// Libera uma task Zombie e retorna o código de saída.
    ///
    /// Falha com `InvalidState` enquanto ela ainda for a `curr` da sua CPU.
    pub fn reap(&self, tid: Tid) -> SchedResult<i32> {
        let mut tasks = self.tasks.lock();
        let task = tasks.task(tid)?;
        if task.state != TaskState::Zombie {
            return Err(SchedError::InvalidState);
        }
        if self.rq(task.cpu).lock().curr == Some(tid) {
            return Err(SchedError::InvalidState);
        }

        let code = tasks.remove(tid).and_then(|t| t.exit_code).unwrap_or(0);
        self.counters.inc_tasks_reaped();
        Ok(code)
    }

    /// Suspende a task (→ Stopped), estacionada na lista de paradas da CPU.
    pub fn stop(&self, tid: Tid) -> SchedResult<()> {
        let mut tasks = self.tasks.lock();
        let task = tasks.task(tid)?;
        if !task.state.is_runnable() {
            return Err(SchedError::InvalidState);
        }
        let cpu = task.cpu;

        // Reserva antes de qualquer mudança
        self.rq(cpu).lock().stopped.try_reserve(1)?;

        self.dequeue_task(&mut tasks, tid);
        let task = tasks.task_mut(tid)?;
        task.state = TaskState::Stopped;
        task.flags.remove(TaskFlags::MIGRATING);
        task.se.parked_on = Some(cpu);

        let mut rq = self.rq(cpu).lock();
        rq.stopped.push_back(tid);
        if rq.curr == Some(tid) {
            self.resched_cpu(&mut rq, &mut tasks);
        }
        crate::kdebug!("(Sched) stop tid=", tid.as_u32());
        Ok(())
    }

    /// Stopped → Runnable, na CPU de residência atual.
    pub fn resume(&self, tid: Tid) -> SchedResult<()> {
        let mut tasks = self.tasks.lock();
        let task = tasks.task_mut(tid)?;
        if task.state != TaskState::Stopped {
            return Err(SchedError::InvalidState);
        }
        if let Some(p) = task.se.parked_on.take() {
            self.rq(p).lock().unpark(tid);
        }
        self.make_runnable_locked(&mut tasks, tid);
        Ok(())
    }

    // =========================================================================
    // Prioridade
    // =========================================================================

    /// Prioridade efetiva
    pub fn get_priority(&self, tid: Tid) -> SchedResult<Priority> {
        Ok(self.tasks.lock().task(tid)?.prio)
    }

    /// Prioridade atribuída
    pub fn static_priority(&self, tid: Tid) -> SchedResult<Priority> {
        Ok(self.tasks.lock().task(tid)?.static_prio)
    }

    /// Muda a prioridade efetiva.
    ///
    /// Task enfileirada sai do nível antigo e entra no fim do novo.
    pub fn set_priority(&self, tid: Tid, prio: Priority) -> SchedResult<()> {
        if !config::is_valid(prio) {
            return Err(SchedError::InvalidPriority);
        }
        let mut tasks = self.tasks.lock();
        self.set_priority_locked(&mut tasks, tid, prio)?;
        self.pi_waiter_changed(&mut tasks, tid)
    }

    /// Muda a prioridade atribuída. Se a task não estava elevada, a
    /// efetiva acompanha.
    pub fn set_static_priority(&self, tid: Tid, prio: Priority) -> SchedResult<()> {
        if !config::is_valid(prio) {
            return Err(SchedError::InvalidPriority);
        }
        let mut tasks = self.tasks.lock();
        let task = tasks.task_mut(tid)?;
        let follow = !task.is_boosted() || prio < task.prio;
        task.static_prio = prio;
        if follow {
            self.set_priority_locked(&mut tasks, tid, prio)?;
            self.pi_waiter_changed(&mut tasks, tid)?;
        }
        Ok(())
    }

    /// Herança de prioridade: eleva a prioridade efetiva de `tid` até
    /// `prio`, se for mais urgente. Retorna se houve elevação.
    pub fn boost_priority(&self, tid: Tid, prio: Priority) -> SchedResult<bool> {
        if !config::is_valid(prio) {
            return Err(SchedError::InvalidPriority);
        }
        let mut tasks = self.tasks.lock();
        if prio >= tasks.task(tid)?.prio {
            return Ok(false);
        }
        self.set_priority_locked(&mut tasks, tid, prio)?;
        self.counters.inc_pi_boosts();
        crate::kdebug!("(Sched) PI boost tid=", tid.as_u32());
        Ok(true)
    }

    /// Desfaz elevações: prioridade efetiva = min(atribuída, `floor`).
    pub fn restore_priority(&self, tid: Tid, floor: Option<Priority>) -> SchedResult<()> {
        let mut tasks = self.tasks.lock();
        let stat = tasks.task(tid)?.static_prio;
        let target = floor.map_or(stat, |f| f.min(stat));
        self.set_priority_locked(&mut tasks, tid, target)
    }

    fn set_priority_locked(
        &self,
        tasks: &mut TaskTable,
        tid: Tid,
        prio: Priority,
    ) -> SchedResult<()> {
        let task = tasks.task_mut(tid)?;
        if task.prio == prio {
            return Ok(());
        }
        task.prio = prio;
        let cpu = task.cpu;
        let on_rq = task.se.on_rq;

        if let Some((qcpu, _)) = on_rq {
            let mut rq = self.rq(qcpu).lock();
            rq.active.dequeue(tasks, tid);
            rq.active.enqueue(tasks, tid);
            self.check_preempt(&mut rq, tasks, tid);
        }

        // A task em execução perdeu urgência: alguém na fila pode passar
        let mut rq = self.rq(cpu).lock();
        if rq.curr == Some(tid) {
            if let Some(best) = rq.active.highest_prio() {
                if best < prio {
                    self.resched_cpu(&mut rq, tasks);
                }
            }
        }

        crate::ktrace!("(Sched) prio tid=", tid.as_u32());
        Ok(())
    }

    // =========================================================================
    // Consulta
    // =========================================================================

    pub fn task_info(&self, tid: Tid) -> SchedResult<TaskInfo> {
        let tasks = self.tasks.lock();
        let t = tasks.task(tid)?;
        Ok(TaskInfo {
            tid,
            state: t.state,
            static_prio: t.static_prio,
            prio: t.prio,
            cpu: t.cpu,
            flags: t.flags,
            time_slice: t.se.time_slice,
            accounting: t.accounting,
        })
    }

    /// Acesso de leitura ao TCB sob o lock da tabela.
    pub fn with_task<R>(&self, tid: Tid, f: impl FnOnce(&Task) -> R) -> SchedResult<R> {
        Ok(f(self.tasks.lock().task(tid)?))
    }

    pub fn state(&self, tid: Tid) -> SchedResult<TaskState> {
        Ok(self.tasks.lock().task(tid)?.state)
    }

    pub fn task_cpu(&self, tid: Tid) -> SchedResult<CpuId> {
        Ok(self.tasks.lock().task(tid)?.cpu)
    }

    pub fn nr_tasks(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Tasks enfileiradas na CPU (inclui a atual)
    pub fn nr_running(&self, cpu: CpuId) -> SchedResult<usize> {
        Ok(self.cpu_rq(cpu)?.lock().nr_running())
    }

    // =========================================================================
    // Internos (chamados com o lock de tasks)
    // =========================================================================

    fn cpu_rq(&self, cpu: CpuId) -> SchedResult<&Spinlock<CpuRq>> {
        self.cpus.get(cpu).ok_or(SchedError::InvalidCpu)
    }

    /// Run-queue de uma CPU de residência (sempre válida).
    fn rq(&self, cpu: CpuId) -> &Spinlock<CpuRq> {
        match self.cpus.get(cpu) {
            Some(rq) => rq,
            None => crate::core::debug::oops::bug("(Sched) CPU de residência inválida"),
        }
    }

    /// Estado → Runnable e enfileira; volta a Running se ainda for a `curr`.
    fn make_runnable_locked(&self, tasks: &mut TaskTable, tid: Tid) {
        let Some(task) = tasks.get_mut(tid) else {
            return;
        };
        task.state = TaskState::Runnable;
        let cpu = task.cpu;

        let mut rq = self.rq(cpu).lock();
        if task.se.on_rq.is_none() {
            rq.active.enqueue(tasks, tid);
        }
        if rq.curr == Some(tid) {
            if let Some(t) = tasks.get_mut(tid) {
                t.state = TaskState::Running;
            }
        } else {
            self.check_preempt(&mut rq, tasks, tid);
        }
    }

    fn dequeue_task(&self, tasks: &mut TaskTable, tid: Tid) -> bool {
        let Some((cpu, _)) = tasks.get(tid).and_then(|t| t.se.on_rq) else {
            return false;
        };
        self.rq(cpu).lock().active.dequeue(tasks, tid)
    }

    /// Pede reescalonamento se `tid` é mais urgente que a `curr` da CPU.
    fn check_preempt(&self, rq: &mut CpuRq, tasks: &mut TaskTable, tid: Tid) {
        let Some(prio) = tasks.get(tid).map(|t| t.prio) else {
            return;
        };
        let preempt = match rq.curr {
            None => true,
            Some(c) if c == tid => false,
            Some(c) => prio < tasks.get(c).map_or(MAX_PRIO, |t| t.prio),
        };
        if preempt {
            self.resched_cpu(rq, tasks);
        }
    }

    /// Marca NEED_RESCHED e avisa a CPU se ela for remota.
    fn resched_cpu(&self, rq: &mut CpuRq, tasks: &mut TaskTable) {
        if let Some(c) = rq.curr {
            if let Some(t) = tasks.get_mut(c) {
                t.flags.insert(TaskFlags::NEED_RESCHED);
            }
        }
        if rq.need_resched {
            return;
        }
        rq.need_resched = true;
        if rq.id != self.platform.current_cpu() {
            self.send_ipi(rq.id, IpiVector::Reschedule);
        }
    }

    fn send_ipi(&self, cpu: CpuId, vector: IpiVector) {
        let sent = ipi::send_ipi(self.platform, &self.online, IpiTarget::Single(cpu), vector);
        for _ in 0..sent {
            self.counters.inc_ipis_sent();
        }
    }
}
