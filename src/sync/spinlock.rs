//! Spinlock - bloqueio com busy-wait

use core::mem::ManuallyDrop;
use core::ops::{Deref, DerefMut};

/// Spinlock - usa busy-wait, NÃO pode dormir
///
/// Interrupções locais ficam desabilitadas enquanto o lock está travado
/// (via `arch::irq_save`), então um handler de interrupção na mesma CPU
/// nunca gira sobre um lock que a própria CPU segura.
///
/// # Quando usar
///
/// - Seções críticas MUITO curtas (uma operação estrutural)
/// - Dentro de handlers de interrupção
///
/// # Quando NÃO usar
///
/// - Através de um ponto de bloqueio (a task vai dormir)
pub struct Spinlock<T> {
    inner: spin::Mutex<T>,
}

impl<T> Spinlock<T> {
    /// Cria novo spinlock
    pub const fn new(data: T) -> Self {
        Self {
            inner: spin::Mutex::new(data),
        }
    }

    /// Adquire o lock
    pub fn lock(&self) -> SpinlockGuard<'_, T> {
        // Desabilitar interrupções antes de adquirir
        let interrupts_were_enabled = crate::arch::irq_save();
        let guard = self.inner.lock();
        SpinlockGuard {
            guard: ManuallyDrop::new(guard),
            interrupts_were_enabled,
        }
    }

    /// Tenta adquirir sem bloquear
    pub fn try_lock(&self) -> Option<SpinlockGuard<'_, T>> {
        let interrupts_were_enabled = crate::arch::irq_save();
        match self.inner.try_lock() {
            Some(guard) => Some(SpinlockGuard {
                guard: ManuallyDrop::new(guard),
                interrupts_were_enabled,
            }),
            None => {
                // Não conseguiu, restaurar interrupções
                crate::arch::irq_restore(interrupts_were_enabled);
                None
            }
        }
    }

    /// Verifica se está travado (apenas diagnóstico, pode mudar logo depois)
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    /// Acesso exclusivo sem travar (exige `&mut self`)
    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut()
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

impl<T: Default> Default for Spinlock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Guard do spinlock - libera ao sair do escopo
pub struct SpinlockGuard<'a, T> {
    guard: ManuallyDrop<spin::MutexGuard<'a, T>>,
    interrupts_were_enabled: bool,
}

impl<T> Deref for SpinlockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for SpinlockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T> Drop for SpinlockGuard<'_, T> {
    fn drop(&mut self) {
        // Liberar lock antes de reabilitar interrupções
        // SAFETY: o guard interno é descartado exatamente uma vez, aqui.
        unsafe { ManuallyDrop::drop(&mut self.guard) };

        // Restaurar interrupções se estavam habilitadas
        crate::arch::irq_restore(self.interrupts_were_enabled);
    }
}
