//! Tipos fundamentais do sistema

/// Thread ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Tid(pub u32);

impl Tid {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Índice na tabela de tasks
    pub const fn as_index(self) -> usize {
        self.0 as usize
    }
}

/// Identificador lógico de CPU (0 a N-1)
pub type CpuId = usize;
