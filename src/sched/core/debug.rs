//! Diagnóstico do scheduler

use super::{CpuStats, Scheduler};
use crate::core::debug::oops::bug;
use crate::core::debug::stats::CountersSnapshot;
use crate::sched::error::SchedResult;
use crate::sched::task::TaskState;
use crate::sys::types::CpuId;

impl Scheduler {
    /// Loga o estado da CPU: task atual, Priority Array e paradas.
    pub fn dump_cpu(&self, cpu: CpuId) -> SchedResult<()> {
        let tasks = self.tasks.lock();
        let rq = self.cpu_rq(cpu)?.lock();

        crate::kinfo!("(Sched) === CPU ", cpu);
        match rq.curr.and_then(|c| tasks.get(c)) {
            Some(t) => {
                crate::klog!("  curr tid=", t.tid.as_u32(), " prio=", t.prio);
                crate::knl!();
                crate::klog!("  nome: ");
                crate::klog!(t.name());
                crate::knl!();
            }
            None => {
                crate::klog!("  curr: idle");
                crate::knl!();
            }
        }
        crate::klog!("  need_resched=", rq.need_resched as u8, " paradas=", rq.stopped.len());
        crate::knl!();
        rq.active.dump();
        Ok(())
    }

    /// Verifica a CPU; corrupção vira `bug` depois do dump.
    pub fn check_consistency(&self, cpu: CpuId) -> SchedResult<()> {
        let result = {
            let tasks = self.tasks.lock();
            let rq = self.cpu_rq(cpu)?.lock();
            rq.active.validate(&tasks).and_then(|()| {
                let Some(c) = rq.curr else {
                    return Ok(());
                };
                let task = tasks.get(c).ok_or("curr inexistente")?;
                if task.state == TaskState::Running && task.se.on_rq.map(|(q, _)| q) != Some(cpu) {
                    return Err("curr Running fora da run-queue");
                }
                Ok(())
            })
        };

        if let Err(msg) = result {
            self.dump_cpu(cpu)?;
            bug(msg);
        }
        Ok(())
    }

    pub fn cpu_stats(&self, cpu: CpuId) -> SchedResult<CpuStats> {
        Ok(self.cpu_rq(cpu)?.lock().stats)
    }

    /// Contadores globais
    pub fn counters(&self) -> CountersSnapshot {
        self.counters.snapshot()
    }

    pub fn dump_stats(&self) {
        self.counters.dump();
    }

    /// Testes de corrupção do Priority Array
    #[cfg(test)]
    pub(crate) fn corrupt_bitmap_for_test(&self, cpu: CpuId, level: usize) {
        if let Some(rq) = self.cpus.get(cpu) {
            rq.lock().active.corrupt_bit_for_test(level);
        }
    }
}
