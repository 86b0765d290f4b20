//! Contabilidade de Recursos (Accounting)
//!
//! Rastreia o consumo de CPU por tarefa e as trocas de contexto.
//! Atualizado por `schedule` (entrada/saída da CPU) e `tick`.

/// Estatísticas de uso de recursos de uma tarefa
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Accounting {
    /// Tempo total de CPU consumido (em ticks)
    pub total_cpu_time: u64,

    /// Timestamp (em ticks) da última vez que a tarefa começou a executar.
    /// Usado para calcular o delta quando ela perde a CPU.
    pub last_start_time: u64,

    /// Ticks de timer recebidos enquanto executava
    pub ticks: u64,

    /// Número de trocas de contexto voluntárias (ex: yield, esperar lock)
    pub voluntary_switches: u64,

    /// Número de trocas de contexto involuntárias (ex: preempção por quantum expirado)
    pub involuntary_switches: u64,
}

impl Accounting {
    /// Cria uma nova estrutura de contabilidade zerada
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra o início da execução (chamado quando a task ganha a CPU)
    pub fn start_exec(&mut self, now: u64) {
        self.last_start_time = now;
    }

    /// Registra o fim da execução (chamado quando a task perde a CPU)
    /// Retorna o tempo executado nesta fatia.
    pub fn end_exec(&mut self, now: u64) -> u64 {
        if now >= self.last_start_time {
            let delta = now - self.last_start_time;
            self.total_cpu_time += delta;
            delta
        } else {
            // Relógio voltou no tempo? Ignora.
            0
        }
    }

    /// Incrementa contadores de troca de contexto
    pub fn account_switch(&mut self, voluntary: bool) {
        if voluntary {
            self.voluntary_switches += 1;
        } else {
            self.involuntary_switches += 1;
        }
    }
}
