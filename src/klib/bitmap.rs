//! Bitmap de tamanho fixo

/// Número de palavras de 64 bits para `bits` bits.
pub const fn words_for(bits: usize) -> usize {
    (bits + 63) / 64
}

/// Bitmap com armazenamento inline.
///
/// Usado pelos Priority Arrays: um bit por nível de prioridade, e a busca
/// do primeiro bit ligado dá o nível mais urgente em O(WORDS).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Bitmap<const WORDS: usize> {
    data: [u64; WORDS],
}

impl<const WORDS: usize> Bitmap<WORDS> {
    pub const BITS: usize = WORDS * 64;

    pub const fn new() -> Self {
        Self { data: [0; WORDS] }
    }

    /// Define um bit
    #[inline]
    pub fn set(&mut self, index: usize) {
        debug_assert!(index < Self::BITS);
        self.data[index / 64] |= 1 << (index % 64);
    }

    /// Limpa um bit
    #[inline]
    pub fn clear(&mut self, index: usize) {
        debug_assert!(index < Self::BITS);
        self.data[index / 64] &= !(1 << (index % 64));
    }

    /// Testa um bit
    #[inline]
    pub fn test(&self, index: usize) -> bool {
        debug_assert!(index < Self::BITS);
        (self.data[index / 64] & (1 << (index % 64))) != 0
    }

    /// Encontra o primeiro bit ligado (menor índice)
    #[inline]
    pub fn find_first_set(&self) -> Option<usize> {
        for (i, &word) in self.data.iter().enumerate() {
            if word != 0 {
                return Some(i * 64 + word.trailing_zeros() as usize);
            }
        }
        None
    }

    /// Encontra o primeiro bit ligado a partir de `from` (inclusive)
    pub fn find_next_set(&self, from: usize) -> Option<usize> {
        if from >= Self::BITS {
            return None;
        }
        let mut word_idx = from / 64;
        let mut word = self.data[word_idx] & (u64::MAX << (from % 64));
        loop {
            if word != 0 {
                return Some(word_idx * 64 + word.trailing_zeros() as usize);
            }
            word_idx += 1;
            if word_idx >= WORDS {
                return None;
            }
            word = self.data[word_idx];
        }
    }

    /// Encontra primeiro bit livre (0)
    pub fn find_first_zero(&self) -> Option<usize> {
        for (i, &word) in self.data.iter().enumerate() {
            if word != u64::MAX {
                return Some(i * 64 + word.trailing_ones() as usize);
            }
        }
        None
    }

    /// Quantidade de bits ligados
    pub fn count_ones(&self) -> usize {
        self.data.iter().map(|w| w.count_ones() as usize).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|&w| w == 0)
    }

    /// Palavras brutas (para dump)
    pub fn words(&self) -> &[u64; WORDS] {
        &self.data
    }
}

impl<const WORDS: usize> Default for Bitmap<WORDS> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_first_set_across_words() {
        let mut bm: Bitmap<3> = Bitmap::new();
        assert_eq!(bm.find_first_set(), None);
        bm.set(139);
        bm.set(70);
        assert_eq!(bm.find_first_set(), Some(70));
        bm.clear(70);
        assert_eq!(bm.find_first_set(), Some(139));
        assert_eq!(bm.count_ones(), 1);
    }

    #[test]
    fn test_find_next_set() {
        let mut bm: Bitmap<3> = Bitmap::new();
        bm.set(5);
        bm.set(64);
        bm.set(130);
        assert_eq!(bm.find_next_set(0), Some(5));
        assert_eq!(bm.find_next_set(6), Some(64));
        assert_eq!(bm.find_next_set(65), Some(130));
        assert_eq!(bm.find_next_set(131), None);
        assert_eq!(bm.find_next_set(500), None);
    }

    #[test]
    fn test_find_first_zero() {
        let mut bm: Bitmap<2> = Bitmap::new();
        for i in 0..64 {
            bm.set(i);
        }
        assert_eq!(bm.find_first_zero(), Some(64));
        assert!(!bm.is_empty());
    }

    #[test]
    fn test_words_for() {
        assert_eq!(words_for(140), 3);
        assert_eq!(words_for(64), 1);
        assert_eq!(words_for(65), 2);
    }
}
