//! Tabela de tasks
//!
//! Arena de `Task` indexada pelo `Tid`. O índice 0 nunca é usado, então
//! `Tid(0)` não corresponde a nenhuma task. Tids são reutilizados somente
//! depois do `reap`.

use alloc::vec::Vec;

use super::entity::Task;
use crate::sched::config::MAX_TASKS;
use crate::sched::error::{SchedError, SchedResult};
use crate::sys::types::Tid;

pub struct TaskTable {
    slots: Vec<Option<Task>>,
    free: Vec<u32>,
    live: usize,
}

impl TaskTable {
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Reserva um Tid e insere a task construída por `make`.
    pub fn insert(&mut self, make: impl FnOnce(Tid) -> Task) -> SchedResult<Tid> {
        if self.live >= MAX_TASKS {
            return Err(SchedError::TooManyTasks);
        }

        let tid = match self.free.pop() {
            Some(index) => Tid(index),
            None => {
                // Índice 0 reservado
                let grow = if self.slots.is_empty() { 2 } else { 1 };
                self.slots.try_reserve(grow)?;
                // O remove nunca precisa alocar
                let total = self.slots.len() + grow;
                self.free.try_reserve(total - self.free.len())?;
                if self.slots.is_empty() {
                    self.slots.push(None);
                }
                self.slots.push(None);
                Tid((self.slots.len() - 1) as u32)
            }
        };

        match self.slots.get_mut(tid.as_index()) {
            Some(slot) => *slot = Some(make(tid)),
            None => return Err(SchedError::NoSuchTask),
        }
        self.live += 1;
        Ok(tid)
    }

    /// Remove a task e libera o Tid para reuso.
    pub fn remove(&mut self, tid: Tid) -> Option<Task> {
        let task = self.slots.get_mut(tid.as_index())?.take()?;
        self.free.push(tid.as_u32());
        self.live -= 1;
        Some(task)
    }

    pub fn get(&self, tid: Tid) -> Option<&Task> {
        self.slots.get(tid.as_index())?.as_ref()
    }

    pub fn get_mut(&mut self, tid: Tid) -> Option<&mut Task> {
        self.slots.get_mut(tid.as_index())?.as_mut()
    }

    /// Como `get`, mas com erro tipado
    pub fn task(&self, tid: Tid) -> SchedResult<&Task> {
        self.get(tid).ok_or(SchedError::NoSuchTask)
    }

    pub fn task_mut(&mut self, tid: Tid) -> SchedResult<&mut Task> {
        self.get_mut(tid).ok_or(SchedError::NoSuchTask)
    }

    pub fn contains(&self, tid: Tid) -> bool {
        self.get(tid).is_some()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }
}

impl Default for TaskTable {
    fn default() -> Self {
        Self::new()
    }
}
