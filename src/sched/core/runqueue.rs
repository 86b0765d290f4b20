//! Priority Array: bitmap + uma run-queue por nível de prioridade
//!
//! ```text
//!  bitmap:  0 0 1 0 ... 1 ...
//!               │       │
//!  queues[2]: [T4]─[T9]  queues[120]: [T1]─[T2]─[T3]
//! ```
//!
//! Invariante: o bit `p` está ligado se e somente se `queues[p]` não está
//! vazia. `pick_next` acha o primeiro bit ligado e devolve a cabeça da
//! fila daquele nível.
//!
//! As filas são intrusivas: os links `run_prev`/`run_next` ficam na
//! `SchedEntity` de cada task, então enfileirar nunca aloca. Quem chama
//! segura o lock da tabela de tasks e o lock da CPU.

use crate::core::debug::oops::bug;
use crate::klib::bitmap::Bitmap;
use crate::sched::config::{Priority, MAX_PRIO, PRIO_BITMAP_WORDS};
use crate::sched::task::{Task, TaskTable};
use crate::sys::types::{CpuId, Tid};

/// Fila FIFO de um nível
#[derive(Debug, Clone, Copy, Default)]
struct RunList {
    head: Option<Tid>,
    tail: Option<Tid>,
    len: usize,
}

pub struct PrioArray {
    cpu: CpuId,
    bitmap: Bitmap<PRIO_BITMAP_WORDS>,
    queues: [RunList; MAX_PRIO as usize],
    nr_running: usize,
}

#[cold]
fn desync(msg: &str) -> ! {
    crate::kerror!("(Sched) Priority Array corrompido");
    bug(msg)
}

fn linked(tasks: &mut TaskTable, tid: Tid) -> &mut Task {
    match tasks.get_mut(tid) {
        Some(t) => t,
        None => desync("run-queue aponta para task inexistente"),
    }
}

impl PrioArray {
    pub const fn new(cpu: CpuId) -> Self {
        Self {
            cpu,
            bitmap: Bitmap::new(),
            queues: [RunList {
                head: None,
                tail: None,
                len: 0,
            }; MAX_PRIO as usize],
            nr_running: 0,
        }
    }

    /// Tasks enfileiradas (inclui a que está rodando)
    #[inline]
    pub fn nr_running(&self) -> usize {
        self.nr_running
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nr_running == 0
    }

    /// Insere `tid` no fim da fila da sua prioridade efetiva.
    ///
    /// A task não pode estar enfileirada em lugar nenhum.
    pub fn enqueue(&mut self, tasks: &mut TaskTable, tid: Tid) {
        let cpu = self.cpu;
        let task = linked(tasks, tid);
        if task.se.on_rq.is_some() {
            desync("enqueue de task já enfileirada");
        }
        let prio = task.prio;
        let level = prio as usize;
        let Some(list) = self.queues.get_mut(level) else {
            desync("prioridade fora do Priority Array");
        };

        let old_tail = list.tail;
        task.se.on_rq = Some((cpu, prio));
        task.se.run_prev = old_tail;
        task.se.run_next = None;

        match old_tail {
            Some(t) => linked(tasks, t).se.run_next = Some(tid),
            None => list.head = Some(tid),
        }
        list.tail = Some(tid);
        list.len += 1;
        self.bitmap.set(level);
        self.nr_running += 1;
    }

    /// Remove `tid` da sua fila. Retorna `false` se não estava neste array.
    pub fn dequeue(&mut self, tasks: &mut TaskTable, tid: Tid) -> bool {
        let cpu = self.cpu;
        let task = linked(tasks, tid);
        let level = match task.se.on_rq {
            Some((c, p)) if c == cpu => p as usize,
            _ => return false,
        };
        let (prev, next) = (task.se.run_prev, task.se.run_next);
        task.se.on_rq = None;
        task.se.run_prev = None;
        task.se.run_next = None;

        let Some(list) = self.queues.get_mut(level) else {
            desync("prioridade fora do Priority Array");
        };
        match prev {
            Some(p) => linked(tasks, p).se.run_next = next,
            None => list.head = next,
        }
        match next {
            Some(n) => linked(tasks, n).se.run_prev = prev,
            None => list.tail = prev,
        }
        list.len -= 1;
        if list.len == 0 {
            if list.head.is_some() || list.tail.is_some() {
                desync("fila vazia com cabeça/cauda");
            }
            self.bitmap.clear(level);
        }
        self.nr_running -= 1;
        true
    }

    /// Move `tid` para o fim da fila do seu nível (round-robin).
    pub fn requeue_tail(&mut self, tasks: &mut TaskTable, tid: Tid) -> bool {
        if !self.dequeue(tasks, tid) {
            return false;
        }
        self.enqueue(tasks, tid);
        true
    }

    /// Cabeça do nível mais urgente.
    ///
    /// Bit ligado com fila vazia é corrupção fatal: dump + panic
    /// controlado. O bit não é limpo para tentar o próximo nível, porque
    /// a contagem e os links daquele nível também não merecem confiança.
    pub fn pick_next(&self) -> Option<Tid> {
        let level = self.bitmap.find_first_set()?;
        match self.queues.get(level).and_then(|l| l.head) {
            Some(tid) => Some(tid),
            None => {
                crate::kerror!("(Sched) Bit ligado com fila vazia. nivel=", level);
                self.dump();
                desync("bitmap/run-queue dessincronizados");
            }
        }
    }

    /// Nível mais urgente com tasks
    pub fn highest_prio(&self) -> Option<Priority> {
        self.bitmap.find_first_set().map(|l| l as Priority)
    }

    /// Nível menos urgente com tasks
    pub fn lowest_prio(&self) -> Option<Priority> {
        (0..MAX_PRIO)
            .rev()
            .find(|&p| self.bitmap.test(p as usize))
    }

    pub fn level_len(&self, prio: Priority) -> usize {
        self.queues.get(prio as usize).map_or(0, |l| l.len)
    }

    /// Tasks do nível, da cabeça para a cauda
    pub fn level<'a>(&self, tasks: &'a TaskTable, prio: Priority) -> LevelIter<'a> {
        LevelIter {
            tasks,
            cur: self.queues.get(prio as usize).and_then(|l| l.head),
        }
    }

    /// Última task do nível
    pub fn level_tail(&self, prio: Priority) -> Option<Tid> {
        self.queues.get(prio as usize).and_then(|l| l.tail)
    }

    /// Verifica bitmap ↔ filas e os links de cada task.
    pub fn validate(&self, tasks: &TaskTable) -> Result<(), &'static str> {
        let mut total = 0;
        for (level, list) in self.queues.iter().enumerate() {
            if self.bitmap.test(level) != (list.len > 0) {
                return Err("bit do nível diverge da fila");
            }
            let mut count = 0;
            let mut prev: Option<Tid> = None;
            let mut cur = list.head;
            while let Some(tid) = cur {
                let task = tasks.get(tid).ok_or("task inexistente na fila")?;
                if task.se.on_rq != Some((self.cpu, level as Priority)) {
                    return Err("on_rq diverge da fila");
                }
                if task.prio as usize != level {
                    return Err("task enfileirada fora da sua prioridade");
                }
                if !task.state.is_runnable() {
                    return Err("task não executável na fila");
                }
                if task.se.run_prev != prev {
                    return Err("run_prev inconsistente");
                }
                count += 1;
                if count > list.len {
                    return Err("ciclo na fila");
                }
                prev = Some(tid);
                cur = task.se.run_next;
            }
            if list.tail != prev || count != list.len {
                return Err("cauda/contagem inconsistente");
            }
            total += count;
        }
        if total != self.nr_running {
            return Err("nr_running diverge");
        }
        Ok(())
    }

    /// Loga o bitmap e o tamanho de cada nível não vazio.
    pub fn dump(&self) {
        crate::kinfo!("(Sched) PrioArray cpu=", self.cpu);
        for (i, w) in self.bitmap.words().iter().enumerate() {
            crate::klog!("  bitmap[", i, "]=", *w);
            crate::knl!();
        }
        for (level, list) in self.queues.iter().enumerate() {
            if list.len > 0 || self.bitmap.test(level) {
                crate::klog!("  nivel=", level, " len=", list.len);
                crate::knl!();
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn corrupt_bit_for_test(&mut self, level: usize) {
        self.bitmap.set(level);
    }
}

pub struct LevelIter<'a> {
    tasks: &'a TaskTable,
    cur: Option<Tid>,
}

impl Iterator for LevelIter<'_> {
    type Item = Tid;

    fn next(&mut self) -> Option<Tid> {
        let tid = self.cur?;
        self.cur = self.tasks.get(tid).and_then(|t| t.se.run_next);
        Some(tid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::klib::test_framework::XorShift64;
    use crate::sched::task::TaskState;
    use alloc::vec::Vec;

    fn table_with(prios: &[Priority]) -> (TaskTable, Vec<Tid>) {
        let mut table = TaskTable::new();
        let mut tids = Vec::new();
        for &p in prios {
            let tid = table
                .insert(|tid| {
                    let mut t = Task::new(tid, "t", p, 0);
                    t.state = TaskState::Runnable;
                    t
                })
                .unwrap();
            tids.push(tid);
        }
        (table, tids)
    }

    #[test]
    fn test_pick_next_lowest_level_fifo() {
        let (mut table, t) = table_with(&[120, 5, 120, 5]);
        let mut arr = PrioArray::new(0);
        for &tid in &t {
            arr.enqueue(&mut table, tid);
        }
        assert_eq!(arr.pick_next(), Some(t[1]));
        assert_eq!(arr.level(&table, 5).collect::<Vec<_>>(), [t[1], t[3]]);
        arr.dequeue(&mut table, t[1]);
        assert_eq!(arr.pick_next(), Some(t[3]));
        arr.dequeue(&mut table, t[3]);
        assert_eq!(arr.pick_next(), Some(t[0]));
        assert_eq!(arr.highest_prio(), Some(120));
        assert_eq!(arr.validate(&table), Ok(()));
    }

    #[test]
    fn test_requeue_tail_rotates_level() {
        let (mut table, t) = table_with(&[120, 120, 120]);
        let mut arr = PrioArray::new(0);
        for &tid in &t {
            arr.enqueue(&mut table, tid);
        }
        assert!(arr.requeue_tail(&mut table, t[0]));
        assert_eq!(arr.level(&table, 120).collect::<Vec<_>>(), [t[1], t[2], t[0]]);
        assert_eq!(arr.level_tail(120), Some(t[0]));
        assert_eq!(arr.validate(&table), Ok(()));
    }

    #[test]
    fn test_dequeue_not_queued_is_false() {
        let (mut table, t) = table_with(&[10]);
        let mut arr = PrioArray::new(0);
        assert!(!arr.dequeue(&mut table, t[0]));
        assert!(arr.is_empty());
        assert_eq!(arr.pick_next(), None);
    }

    #[test]
    #[should_panic(expected = "bitmap/run-queue dessincronizados")]
    fn test_desync_is_fatal() {
        let mut arr = PrioArray::new(0);
        arr.corrupt_bit_for_test(42);
        arr.pick_next();
    }

    /// Sequências aleatórias de enqueue/dequeue mantêm bit ⇔ fila não vazia.
    #[test]
    fn test_random_ops_keep_bitmap_consistent() {
        let mut rng = XorShift64::new(0xBEEF);
        let prios: Vec<Priority> = (0..64).map(|_| rng.below(MAX_PRIO as u64) as Priority).collect();
        let (mut table, t) = table_with(&prios);
        let mut arr = PrioArray::new(0);
        let mut queued = [false; 64];

        for _ in 0..5000 {
            let i = rng.below(64) as usize;
            if queued[i] {
                assert!(arr.dequeue(&mut table, t[i]));
            } else {
                arr.enqueue(&mut table, t[i]);
            }
            queued[i] = !queued[i];
            assert_eq!(arr.validate(&table), Ok(()));
        }

        let expected = queued
            .iter()
            .zip(&prios)
            .filter(|(q, _)| **q)
            .map(|(_, p)| *p)
            .min();
        assert_eq!(arr.highest_prio(), expected);
    }
}
