//! Migração entre CPUs
//!
//! Uma task executável muda de CPU em duas etapas: sai da run-queue de
//! origem e vai para a caixa de migração do destino, marcada MIGRATING.
//! O helper `migration/N` do destino (ou o próprio handler do IPI, se
//! não houver helper) esvazia a caixa e a enfileira. Entradas obsoletas
//! (task que saiu de MIGRATING ou mudou de destino) são descartadas.
//!
//! Task que é a `curr` de alguma CPU nunca muda de `cpu` diretamente: a
//! migração fica em `pending_cpu` até ela sair da CPU.

use super::Scheduler;
use crate::core::smp::ipi::IpiVector;
use crate::sched::config::MIGRATION_PRIO;
use crate::sched::error::{SchedError, SchedResult};
use crate::sched::task::{TaskFlags, TaskState, TaskTable};
use crate::sys::types::{CpuId, Tid};

impl Scheduler {
    /// Move a task para a CPU `dest`.
    pub fn migrate(&self, tid: Tid, dest: CpuId) -> SchedResult<()> {
        if !self.online.contains(dest) || dest >= self.cpus.len() {
            return Err(SchedError::InvalidCpu);
        }

        let mut tasks = self.tasks.lock();
        let task = tasks.task(tid)?;
        let (state, src, migrating) = (
            task.state,
            task.cpu,
            task.flags.contains(TaskFlags::MIGRATING),
        );
        if state == TaskState::Zombie {
            return Err(SchedError::InvalidState);
        }

        let is_curr = self.rq(src).lock().curr == Some(tid);
        if is_curr {
            let task = tasks.task_mut(tid)?;
            if src == dest {
                task.se.pending_cpu = None;
                return Ok(());
            }
            task.se.pending_cpu = Some(dest);
            let mut rq = self.rq(src).lock();
            self.resched_cpu(&mut rq, &mut tasks);
            crate::kdebug!("(Sched) Migração adiada tid=", tid.as_u32());
            return Ok(());
        }

        if src == dest {
            return Ok(());
        }

        match state {
            TaskState::Runnable if migrating => {
                // Ainda em trânsito: redireciona para a nova caixa
                self.mailboxes[dest].lock().try_reserve(1)?;
                tasks.task_mut(tid)?.cpu = dest;
                self.mailboxes[dest].lock().push_back(tid);
                self.send_ipi(dest, IpiVector::Migrate);
                self.counters.inc_migrations();
                Ok(())
            }
            TaskState::Runnable => self.migrate_queued_locked(&mut tasks, tid, dest),
            TaskState::Sleeping | TaskState::Stopped | TaskState::JustBorn => {
                tasks.task_mut(tid)?.cpu = dest;
                Ok(())
            }
            TaskState::Running | TaskState::Zombie => Err(SchedError::InvalidState),
        }
    }

    /// Tira uma task enfileirada da CPU de origem e a entrega à caixa de
    /// `dest`. Sem memória para a caixa, nada muda.
    pub(super) fn migrate_queued_locked(
        &self,
        tasks: &mut TaskTable,
        tid: Tid,
        dest: CpuId,
    ) -> SchedResult<()> {
        self.mailboxes[dest].lock().try_reserve(1)?;

        let src = tasks.task(tid)?.cpu;
        {
            let mut rq = self.rq(src).lock();
            rq.active.dequeue(tasks, tid);
            rq.stats.migrations_out += 1;
        }

        let task = tasks.task_mut(tid)?;
        task.cpu = dest;
        task.flags.insert(TaskFlags::MIGRATING);

        self.mailboxes[dest].lock().push_back(tid);
        self.send_ipi(dest, IpiVector::Migrate);
        self.counters.inc_migrations();
        crate::kdebug!("(Sched) Migração tid=", tid.as_u32());
        Ok(())
    }

    /// Cria (uma vez) a kernel thread `migration/N` da CPU.
    ///
    /// O helper nasce dormindo; o IPI de migração o acorda.
    pub fn register_migration_helper(&self, cpu: CpuId) -> SchedResult<Tid> {
        if let Some(h) = self.cpu_rq(cpu)?.lock().migration_helper {
            return Ok(h);
        }

        let mut name = [0u8; 16];
        let prefix = b"migration/";
        name[..prefix.len()].copy_from_slice(prefix);
        let len = prefix.len() + write_decimal(&mut name[prefix.len()..], cpu);
        let name = ::core::str::from_utf8(&name[..len]).unwrap_or("migration");

        let tid = self.spawn_kthread(name, MIGRATION_PRIO, cpu)?;

        let mut tasks = self.tasks.lock();
        tasks.task_mut(tid)?.state = TaskState::Sleeping;
        self.rq(cpu).lock().migration_helper = Some(tid);

        // Migrações que chegaram antes do helper
        if !self.mailboxes[cpu].lock().is_empty() {
            self.wake_locked(&mut tasks, tid);
        }

        crate::kinfo!("(Sched) Helper de migração na CPU ", cpu);
        Ok(tid)
    }

    /// Handler de IPI na CPU `cpu`. Retorna se a CPU precisa reescalonar.
    pub fn handle_ipi(&self, cpu: CpuId, vector: IpiVector) -> SchedResult<bool> {
        let rq_lock = self.cpu_rq(cpu)?;
        match vector {
            IpiVector::Reschedule => {
                rq_lock.lock().need_resched = true;
                Ok(true)
            }
            IpiVector::Migrate => {
                let helper = rq_lock.lock().migration_helper;
                match helper {
                    Some(h) => {
                        self.wake(h);
                    }
                    None => {
                        let mut tasks = self.tasks.lock();
                        self.drain_mailbox_locked(&mut tasks, cpu);
                    }
                }
                Ok(rq_lock.lock().need_resched)
            }
            IpiVector::Panic => {
                crate::kerror!("(Sched) IPI de pânico recebido na CPU ", cpu);
                Ok(false)
            }
            IpiVector::CallFunction => {
                crate::kdebug!("(Sched) CallFunction ignorado na CPU ", cpu);
                Ok(false)
            }
        }
    }

    /// Um passo do helper `migration/N`: enfileira tudo que está na caixa
    /// e volta a dormir. Retorna quantas tasks chegaram.
    pub fn migration_helper_step(&self, cpu: CpuId) -> SchedResult<usize> {
        let rq_lock = self.cpu_rq(cpu)?;
        let mut tasks = self.tasks.lock();
        let moved = self.drain_mailbox_locked(&mut tasks, cpu);

        // Caixa vazia e lock de tasks seguro: nenhum push entre o dreno e o sono
        let helper = rq_lock.lock().migration_helper;
        if let Some(h) = helper {
            if tasks.task(h)?.state.is_runnable() {
                self.sleep_until_locked(&mut tasks, h, false, None)?;
            }
        }
        Ok(moved)
    }

    fn drain_mailbox_locked(&self, tasks: &mut TaskTable, cpu: CpuId) -> usize {
        let mut moved = 0;
        loop {
            let Some(tid) = self.mailboxes[cpu].lock().pop_front() else {
                break;
            };
            let Some(task) = tasks.get_mut(tid) else {
                continue;
            };
            if !task.flags.contains(TaskFlags::MIGRATING)
                || task.cpu != cpu
                || task.state != TaskState::Runnable
            {
                continue;
            }
            task.flags.remove(TaskFlags::MIGRATING);

            self.make_runnable_locked(tasks, tid);
            self.rq(cpu).lock().stats.migrations_in += 1;
            moved += 1;
        }
        moved
    }

    /// Balanceamento: se a CPU mais carregada tem pelo menos duas tasks a
    /// mais que a mais ociosa, move para esta a task enfileirada menos
    /// urgente da primeira (exceto a atual e kernel threads).
    ///
    /// Retorna (task, origem, destino) quando houve migração.
    pub fn balance(&self) -> Option<(Tid, CpuId, CpuId)> {
        let mut tasks = self.tasks.lock();

        let mut busiest = (0, 0);
        let mut idlest = (0, usize::MAX);
        for (id, rq) in self.cpus.iter().enumerate() {
            let load = rq.lock().nr_running();
            if load > busiest.1 {
                busiest = (id, load);
            }
            if load < idlest.1 {
                idlest = (id, load);
            }
        }
        if busiest.0 == idlest.0 || busiest.1 < idlest.1 + 2 {
            return None;
        }

        let victim = {
            let rq = self.rq(busiest.0).lock();
            let mut victim = None;
            let mut prio = rq.active.lowest_prio();
            while let Some(p) = prio {
                victim = rq
                    .active
                    .level(&tasks, p)
                    .filter(|&t| {
                        Some(t) != rq.curr
                            && tasks
                                .get(t)
                                .is_some_and(|t| !t.flags.contains(TaskFlags::KTHREAD))
                    })
                    .last();
                if victim.is_some() || p == 0 {
                    break;
                }
                prio = (0..p).rev().find(|&q| rq.active.level_len(q) > 0);
            }
            victim
        }?;

        match self.migrate_queued_locked(&mut tasks, victim, idlest.0) {
            Ok(()) => {
                crate::kdebug!("(Sched) Balance moveu tid=", victim.as_u32());
                Some((victim, busiest.0, idlest.0))
            }
            Err(_) => None,
        }
    }
}

/// Escreve `n` em decimal no início de `buf`. Retorna os bytes escritos.
///
/// Sem espaço, ficam os dígitos mais significativos.
fn write_decimal(buf: &mut [u8], mut n: usize) -> usize {
    let mut digits = [0u8; 20];
    let mut len = 0;
    loop {
        digits[len] = b'0' + (n % 10) as u8;
        len += 1;
        n /= 10;
        if n == 0 {
            break;
        }
    }
    digits[..len].reverse();
    let fit = len.min(buf.len());
    buf[..fit].copy_from_slice(&digits[..fit]);
    fit
}

#[cfg(test)]
mod tests {
    use super::write_decimal;

    #[test]
    fn test_write_decimal() {
        let mut buf = [0u8; 4];
        assert_eq!(write_decimal(&mut buf, 0), 1);
        assert_eq!(&buf[..1], b"0");
        assert_eq!(write_decimal(&mut buf, 63), 2);
        assert_eq!(&buf[..2], b"63");
    }

    #[test]
    fn test_write_decimal_short_buffer_keeps_leading_digits() {
        let mut buf = [0u8; 2];
        assert_eq!(write_decimal(&mut buf, 123), 2);
        assert_eq!(&buf, b"12");
        assert_eq!(write_decimal(&mut [], 7), 0);
    }
}
