/// Arquivo: core/smp/ipi.rs
///
/// Propósito: Envio de Interrupções Inter-Processador (IPIs).
/// Usado para coordenar o scheduler entre CPUs: pedir reescalonamento
/// remoto e entregar tasks migradas ao helper da CPU destino.
///
/// Detalhes de Implementação:
/// - O envio real é da arquitetura (`Platform::send_ipi`).
/// - Alvos múltiplos são expandidos aqui contra a máscara de CPUs online.

// Inter-Processor Interrupts

use super::percpu::CpuMask;
use crate::arch::Platform;
use crate::sys::types::CpuId;

/// Destino da IPI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpiTarget {
    /// Uma CPU específica
    Single(CpuId),
    /// Todas as CPUs (Broadcast)
    All,
    /// Todas exceto a atual
    AllButSelf,
}

/// Vetores de IPI (definidos por convenção no kernel)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpiVector {
    /// Panic/Stop: Para todas as CPUs imediatamente
    Panic = 0xFE,
    /// Reschedule: Força o scheduler a rodar
    Reschedule = 0xFC,
    /// Call Function: Executa função remota (generic)
    CallFunction = 0xFB,
    /// Migrate: Há tasks na caixa de migração da CPU destino
    Migrate = 0xFA,
}

/// Envia uma IPI para o destino especificado.
///
/// Retorna quantas IPIs foram efetivamente enviadas.
pub fn send_ipi(
    platform: &dyn Platform,
    online: &CpuMask,
    target: IpiTarget,
    vector: IpiVector,
) -> usize {
    let this_cpu = platform.current_cpu();
    let mut sent = 0;

    match target {
        IpiTarget::Single(id) => {
            if online.contains(id) {
                platform.send_ipi(id, vector);
                sent = 1;
            } else {
                crate::kwarn!("(SMP) IPI para CPU offline: ", id as u64);
            }
        }
        IpiTarget::All | IpiTarget::AllButSelf => {
            for cpu in online.iter() {
                if target == IpiTarget::AllButSelf && cpu == this_cpu {
                    continue;
                }
                platform.send_ipi(cpu, vector);
                sent += 1;
            }
        }
    }

    crate::ktrace!("(SMP) IPI vetor=", vector as u8);
    sent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::types::Tid;
    use alloc::vec::Vec;
    use std::sync::Mutex;

    struct Recorder {
        sent: Mutex<Vec<(CpuId, IpiVector)>>,
    }

    impl Platform for Recorder {
        fn current_cpu(&self) -> CpuId {
            1
        }

        fn send_ipi(&self, target: CpuId, vector: IpiVector) {
            self.sent.lock().unwrap().push((target, vector));
        }

        fn context_switch(&self, _cpu: CpuId, _prev: Option<Tid>, _next: Option<Tid>) {}
    }

    #[test]
    fn test_all_but_self_skips_current() {
        let rec = Recorder {
            sent: Mutex::new(Vec::new()),
        };
        let online = CpuMask::first(3);
        let n = send_ipi(&rec, &online, IpiTarget::AllButSelf, IpiVector::Reschedule);
        assert_eq!(n, 2);
        let sent = rec.sent.lock().unwrap();
        assert_eq!(*sent, [(0, IpiVector::Reschedule), (2, IpiVector::Reschedule)]);
    }

    #[test]
    fn test_offline_target_is_dropped() {
        let rec = Recorder {
            sent: Mutex::new(Vec::new()),
        };
        let online = CpuMask::first(2);
        assert_eq!(send_ipi(&rec, &online, IpiTarget::Single(5), IpiVector::Migrate), 0);
        assert!(rec.sent.lock().unwrap().is_empty());
    }
}
