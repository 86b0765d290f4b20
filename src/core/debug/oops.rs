/// Arquivo: core/debug/oops.rs
///
/// Propósito: Tratamento de erros do núcleo.
/// Um Oops sinaliza um estado inválido que afetou apenas uma operação
/// (ex: unlock por não-dono). Um Bug sinaliza corrupção de estrutura
/// interna (lista, bitmap) e para a CPU de forma controlada.

// Kernel Oops (Erros recuperáveis) e Bugs (fatais)

/// Sinaliza um erro grave mas recuperável.
///
/// O chamador continua, normalmente devolvendo um erro ao caller.
pub fn oops(msg: &str) {
    crate::kwarn!("(Oops) *** KERNEL OOPS ***");
    crate::kwarn!(msg);
}

/// Estado interno corrompido. Loga e entra em pânico.
///
/// Usado quando continuar significaria escalonar a partir de estruturas
/// inconsistentes (ex: bit do bitmap ligado com fila vazia).
#[cold]
#[inline(never)]
pub fn bug(msg: &str) -> ! {
    crate::kerror!("*****************************************************");
    crate::kerror!("*                   KERNEL BUG                      *");
    crate::kerror!("*****************************************************");
    crate::kerror!(msg);
    panic!("{}", msg);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "lista corrompida")]
    fn test_bug_panics_with_message() {
        bug("lista corrompida");
    }

    #[test]
    fn test_oops_returns() {
        oops("unlock por nao-dono");
    }
}
