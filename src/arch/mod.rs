//! # Hardware Abstraction Layer (HAL)
//!
//! O módulo `arch` é a **única** ponte entre o núcleo de escalonamento
//! (lógica agnóstica) e o hardware real.
//!
//! Este crate não contém código de arquitetura: o kernel que o embute
//! fornece as implementações dos traits em `traits/`.
//!
//! - [`IrqControl`]: salvar/desabilitar/restaurar interrupções locais.
//!   Instalado uma vez no boot via [`install_irq_control`]. Sem instalação
//!   (testes no host) as operações são no-op.
//! - [`Platform`]: CPU atual, IPIs e troca de contexto. Passado por
//!   referência ao `Scheduler`.

pub mod traits;

pub use traits::*;

static IRQ: spin::Once<&'static dyn IrqControl> = spin::Once::new();

/// Instala o controlador de interrupções da arquitetura.
///
/// Chamadas subsequentes são ignoradas.
pub fn install_irq_control(ctl: &'static dyn IrqControl) {
    IRQ.call_once(|| ctl);
}

/// Desabilita interrupções locais e retorna se estavam habilitadas.
#[inline]
pub fn irq_save() -> bool {
    match IRQ.get() {
        Some(ctl) => ctl.save_and_disable(),
        None => false,
    }
}

/// Restaura o estado salvo por [`irq_save`].
#[inline]
pub fn irq_restore(were_enabled: bool) {
    if let Some(ctl) = IRQ.get() {
        ctl.restore(were_enabled);
    }
}
