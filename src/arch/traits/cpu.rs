//! Interface Abstrata de CPU (HAL).
//! Define as operações que qualquer arquitetura (x86, ARM, RISC-V) deve implementar
//! para hospedar o scheduler.

use crate::core::smp::ipi::IpiVector;
use crate::sys::types::{CpuId, Tid};

/// Controle de interrupções locais.
///
/// Crítico para seções atômicas: todo `Spinlock` desabilita interrupções
/// enquanto está travado.
pub trait IrqControl: Sync {
    /// Desabilita interrupções (CLI) e retorna se estavam habilitadas.
    fn save_and_disable(&self) -> bool;

    /// Reabilita interrupções se `were_enabled` for verdadeiro.
    fn restore(&self, were_enabled: bool);
}

/// Serviços de plataforma usados pelo scheduler.
pub trait Platform: Send + Sync {
    /// CPU lógica executando o chamador.
    fn current_cpu(&self) -> CpuId;

    /// Envia uma interrupção inter-processador para `target`.
    fn send_ipi(&self, target: CpuId, vector: IpiVector);

    /// Troca o contexto de `cpu` de `prev` para `next`.
    ///
    /// `None` representa o loop idle da CPU. Chamado com os locks do
    /// scheduler já liberados.
    fn context_switch(&self, cpu: CpuId, prev: Option<Tid>, next: Option<Tid>);
}
