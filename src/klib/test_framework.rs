//! Framework de testes do kernel
//!
//! Suites embarcadas rodam no boot (feature `self_test`) e reportam pelo
//! log. Os testes de host usam o harness padrão do `cargo test`.

/// Resultado de teste
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TestResult {
    Passed,
    Failed,
    Skipped,
}

/// Um caso de teste
pub struct TestCase {
    pub name: &'static str,
    pub func: fn() -> TestResult,
}

impl TestCase {
    pub const fn new(name: &'static str, func: fn() -> TestResult) -> Self {
        Self { name, func }
    }
}

/// Executa suite de testes.
///
/// Retorna `(passed, failed, skipped)`.
pub fn run_test_suite(name: &str, tests: &[TestCase]) -> (usize, usize, usize) {
    crate::klog!("=== Executando suite: ");
    crate::klog!(name);
    crate::knl!();

    let mut passed = 0;
    let mut failed = 0;
    let mut skipped = 0;

    for test in tests {
        let result = (test.func)();
        match result {
            TestResult::Passed => {
                crate::klog!("[PASS] ");
                passed += 1;
            }
            TestResult::Failed => {
                crate::klog!("[FAIL] ");
                failed += 1;
            }
            TestResult::Skipped => {
                crate::klog!("[SKIP] ");
                skipped += 1;
            }
        }
        crate::klog!(test.name);
        crate::knl!();
    }

    crate::kinfo!("Resultados: passed=", passed as u64);
    if failed > 0 {
        crate::kerror!("Resultados: failed=", failed as u64);
    }
    (passed, failed, skipped)
}

/// Gerador xorshift determinístico para testes randomizados.
#[cfg(test)]
pub struct XorShift64(u64);

#[cfg(test)]
impl XorShift64 {
    pub fn new(seed: u64) -> Self {
        Self(if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed })
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    /// Valor em `0..bound`
    pub fn below(&mut self, bound: u64) -> u64 {
        self.next_u64() % bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok() -> TestResult {
        TestResult::Passed
    }

    fn bad() -> TestResult {
        TestResult::Failed
    }

    fn skip() -> TestResult {
        TestResult::Skipped
    }

    #[test]
    fn test_suite_counts_results() {
        let cases = [
            TestCase::new("ok", ok),
            TestCase::new("ok2", ok),
            TestCase::new("bad", bad),
            TestCase::new("skip", skip),
        ];
        assert_eq!(run_test_suite("contagem", &cases), (2, 1, 1));
    }

    #[test]
    fn test_xorshift_is_deterministic() {
        let mut a = XorShift64::new(42);
        let mut b = XorShift64::new(42);
        for _ in 0..16 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
        assert!(XorShift64::new(0).below(10) < 10);
    }
}
