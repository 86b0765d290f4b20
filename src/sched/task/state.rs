//! Estados de task

/// Estado de uma task
///
/// ```text
/// JustBorn → Runnable ⇄ Running → { Runnable, Sleeping, Stopped, Zombie }
///               ▲                        │          │
///               └──────── wake ──────────┘          │
///               └──────── resume ───────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Recém criada, não executou ainda
    JustBorn,
    /// Pronta para executar (na run-queue)
    Runnable,
    /// Executando em alguma CPU (continua na run-queue)
    Running,
    /// Bloqueada esperando algo
    Sleeping,
    /// Parada externamente
    Stopped,
    /// Terminada, esperando reap
    Zombie,
}

impl TaskState {
    /// Verifica se pode ser escalonada
    pub const fn is_runnable(self) -> bool {
        matches!(self, Self::Runnable | Self::Running)
    }

    pub const fn as_u8(self) -> u8 {
        match self {
            Self::JustBorn => 0,
            Self::Runnable => 1,
            Self::Running => 2,
            Self::Sleeping => 3,
            Self::Stopped => 4,
            Self::Zombie => 5,
        }
    }
}
