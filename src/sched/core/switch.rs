//! Escolha de task e troca de contexto

use super::Scheduler;
use crate::sched::config::{time_slice_for, BOOT_CPU};
use crate::sched::error::{SchedError, SchedResult};
use crate::sched::task::{TaskFlags, TaskState, TaskTable};
use crate::sys::types::{CpuId, Tid};

impl Scheduler {
    /// Ponto de escalonamento da CPU.
    ///
    /// Escolhe a cabeça do nível mais urgente e, se mudou, troca o contexto
    /// via [`Platform::context_switch`](crate::arch::Platform). Retorna a
    /// task que fica com a CPU (None = idle).
    pub fn schedule(&self, cpu: CpuId) -> SchedResult<Option<Tid>> {
        self.schedule_inner(cpu, false)
    }

    /// A task atual cede a CPU: vai para o fim do seu nível e reescalona.
    pub fn yield_now(&self, cpu: CpuId) -> SchedResult<Option<Tid>> {
        let rq_lock = self.cpu_rq(cpu)?;
        {
            let mut tasks = self.tasks.lock();
            let mut rq = rq_lock.lock();
            if let Some(c) = rq.curr {
                rq.active.requeue_tail(&mut tasks, c);
            }
        }
        self.schedule_inner(cpu, true)
    }

    fn schedule_inner(&self, cpu: CpuId, yielded: bool) -> SchedResult<Option<Tid>> {
        let rq_lock = self.cpu_rq(cpu)?;

        let (prev, next) = {
            let mut tasks = self.tasks.lock();
            let now = self.jiffies.get();

            let prev = rq_lock.lock().curr;
            if let Some(p) = prev {
                self.apply_pending_migration(&mut tasks, p);
            }

            let mut rq = rq_lock.lock();
            rq.need_resched = false;
            if let Some(t) = prev.and_then(|p| tasks.get_mut(p)) {
                t.flags.remove(TaskFlags::NEED_RESCHED);
            }

            let next = rq.active.pick_next();
            if next == prev {
                return Ok(next);
            }

            if let Some(t) = prev.and_then(|p| tasks.get_mut(p)) {
                let preempted = t.state == TaskState::Running;
                if preempted {
                    t.state = TaskState::Runnable;
                    if !yielded {
                        rq.stats.preemptions += 1;
                    }
                }
                t.accounting.end_exec(now);
                t.accounting.account_switch(yielded || !preempted);
            }

            if let Some(t) = next.and_then(|n| tasks.get_mut(n)) {
                t.state = TaskState::Running;
                t.se.time_slice = time_slice_for(t.prio);
                t.accounting.start_exec(now);
            }

            rq.curr = next;
            rq.stats.switches += 1;
            (prev, next)
        };

        self.counters.inc_context_switches();
        crate::ktrace!("(Sched) switch cpu=", cpu);
        self.platform.context_switch(cpu, prev, next);
        Ok(next)
    }

    /// Executa a migração adiada de uma task que está deixando a CPU.
    fn apply_pending_migration(&self, tasks: &mut TaskTable, tid: Tid) {
        let Some(task) = tasks.get_mut(tid) else {
            return;
        };
        let Some(dest) = task.se.pending_cpu.take() else {
            return;
        };
        if dest == task.cpu {
            return;
        }

        if task.state.is_runnable() && task.is_queued() {
            if let Err(e) = self.migrate_queued_locked(tasks, tid, dest) {
                crate::kwarn!("(Sched) Migração adiada falhou: ", e.errno().as_usize());
            }
        } else {
            // Dormindo/parada/zumbi: só muda a residência
            task.cpu = dest;
        }
    }

    /// Tick do timer na CPU.
    ///
    /// Na CPU de boot avança os jiffies e dispara os timers vencidos. Em
    /// todas, consome o quantum da task atual; ao zerar, ela vai para o fim
    /// do seu nível. Retorna se a CPU precisa reescalonar.
    pub fn tick(&self, cpu: CpuId) -> SchedResult<bool> {
        let rq_lock = self.cpu_rq(cpu)?;

        if cpu == BOOT_CPU {
            let now = self.jiffies.inc();
            // Callbacks fora do lock dos timers
            self.timers.expire(now, |tid, deadline| self.timer_fired(tid, deadline));

            #[cfg(feature = "smp")]
            if now % crate::sched::config::BALANCE_INTERVAL == 0 {
                self.balance();
            }
        }

        let mut tasks = self.tasks.lock();
        let mut rq = rq_lock.lock();
        rq.stats.ticks += 1;

        match rq.curr {
            None => {
                rq.stats.idle_ticks += 1;
                if !rq.active.is_empty() {
                    rq.need_resched = true;
                }
            }
            Some(c) => {
                let task = tasks.task_mut(c)?;
                task.accounting.ticks += 1;
                task.se.time_slice = task.se.time_slice.saturating_sub(1);
                if task.se.time_slice == 0 {
                    task.se.time_slice = time_slice_for(task.prio);
                    task.flags.insert(TaskFlags::NEED_RESCHED);
                    rq.active.requeue_tail(&mut tasks, c);
                    rq.need_resched = true;
                }
            }
        }

        Ok(rq.need_resched)
    }

    /// Task executando na CPU
    pub fn current(&self, cpu: CpuId) -> Option<Tid> {
        self.cpus.get(cpu).and_then(|rq| rq.lock().curr)
    }

    pub fn need_resched(&self, cpu: CpuId) -> bool {
        self.cpus.get(cpu).is_some_and(|rq| rq.lock().need_resched)
    }

    /// Quem `schedule` escolheria agora, sem trocar.
    pub fn pick_next(&self, cpu: CpuId) -> SchedResult<Option<Tid>> {
        Ok(self.cpu_rq(cpu)?.lock().active.pick_next())
    }

    /// Enfileira uma task executável que está fora da fila.
    pub fn enqueue(&self, tid: Tid) -> SchedResult<()> {
        let mut tasks = self.tasks.lock();
        let task = tasks.task(tid)?;
        if task.is_queued() {
            crate::kwarn!("(Sched) enqueue: task já enfileirada tid=", tid.as_u32());
            return Err(SchedError::AlreadyQueued);
        }
        if !task.state.is_runnable() || task.flags.contains(TaskFlags::MIGRATING) {
            return Err(SchedError::InvalidState);
        }
        let cpu = task.cpu;
        let mut rq = self.rq(cpu).lock();
        rq.active.enqueue(&mut tasks, tid);
        self.check_preempt(&mut rq, &mut tasks, tid);
        Ok(())
    }

    /// Retira uma task da sua run-queue sem mudar o estado.
    ///
    /// A task em execução só sai da fila por sleep, stop ou exit.
    pub fn dequeue(&self, tid: Tid) -> SchedResult<()> {
        let mut tasks = self.tasks.lock();
        let task = tasks.task(tid)?;
        if !task.is_queued() {
            return Err(SchedError::NotQueued);
        }
        if task.state == TaskState::Running {
            return Err(SchedError::InvalidState);
        }
        self.dequeue_task(&mut tasks, tid);
        Ok(())
    }
}
