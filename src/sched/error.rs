//! Tipos de Erro do Scheduler
//!
//! Erros estruturados do scheduler e das primitivas que dormem
//! (WaitQueue, Mutex, RwSemaphore).
//!
//! Corrupção de estrutura interna NÃO é um erro: é bug fatal
//! (`core::debug::oops::bug`).

use alloc::collections::TryReserveError;

use crate::sys::error::Errno;

/// Erros do scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedError {
    /// Tid não corresponde a nenhuma task viva
    NoSuchTask,
    /// Prioridade fora de 0..MAX_PRIO
    InvalidPriority,
    /// CPU inexistente ou offline
    InvalidCpu,
    /// Transição de estado não permitida
    InvalidState,
    /// Task já está na fila
    AlreadyQueued,
    /// Task não está na fila
    NotQueued,
    /// Pop em fila vazia
    QueueEmpty,
    /// Lock já pertence ao chamador
    Deadlock,
    /// Unlock por quem não é dono
    NotOwner,
    /// Release de lock não travado
    NotLocked,
    /// Operação try não conseguiu sem bloquear
    WouldBlock,
    /// Espera abandonada por sinal pendente
    Interrupted,
    /// Espera abandonada por timeout
    TimedOut,
    /// Falha de alocação (waiter, timer, migração)
    OutOfMemory,
    /// Tabela de tasks cheia
    TooManyTasks,
}

impl SchedError {
    /// Retorna descrição legível do erro
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoSuchTask => "Task inexistente",
            Self::InvalidPriority => "Prioridade inválida",
            Self::InvalidCpu => "CPU inválida",
            Self::InvalidState => "Transição de estado inválida",
            Self::AlreadyQueued => "Task já enfileirada",
            Self::NotQueued => "Task não enfileirada",
            Self::QueueEmpty => "Fila vazia",
            Self::Deadlock => "Lock já pertence ao chamador",
            Self::NotOwner => "Chamador não é o dono do lock",
            Self::NotLocked => "Lock não está travado",
            Self::WouldBlock => "Operação bloquearia",
            Self::Interrupted => "Espera interrompida por sinal",
            Self::TimedOut => "Tempo de espera esgotado",
            Self::OutOfMemory => "OOM: sem memória para a operação",
            Self::TooManyTasks => "Tabela de tasks cheia",
        }
    }

    /// Código POSIX para a fronteira de syscall
    pub fn errno(&self) -> Errno {
        match self {
            Self::NoSuchTask => Errno::ESRCH,
            Self::InvalidPriority | Self::InvalidCpu | Self::InvalidState => Errno::EINVAL,
            Self::AlreadyQueued | Self::NotQueued | Self::QueueEmpty => Errno::EINVAL,
            Self::Deadlock => Errno::EDEADLK,
            Self::NotOwner | Self::NotLocked => Errno::EPERM,
            Self::WouldBlock => Errno::EBUSY,
            Self::Interrupted => Errno::EINTR,
            Self::TimedOut => Errno::ETIMEDOUT,
            Self::OutOfMemory => Errno::ENOMEM,
            Self::TooManyTasks => Errno::EAGAIN,
        }
    }
}

impl ::core::fmt::Display for SchedError {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<TryReserveError> for SchedError {
    fn from(_: TryReserveError) -> Self {
        Self::OutOfMemory
    }
}

/// Tipo Result específico do scheduler
pub type SchedResult<T> = Result<T, SchedError>;
