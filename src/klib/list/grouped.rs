/// Arquivo: klib/list/grouped.rs
///
/// Propósito: Lista ordenada por prioridade com grupos de mesma prioridade.
///
/// A lista externa contém apenas uma "cabeça" por prioridade, em ordem
/// estritamente crescente (menor valor = mais urgente). Os demais nós da
/// mesma prioridade ficam pendurados na sub-lista da cabeça, em ordem de
/// chegada (FIFO).
///
/// ```text
///  head ─► [p=3] ──────────► [p=7] ──────────► [p=9]   (lista externa)
///            │                 │
///            ▼                 ▼
///          [p=3]─►[p=3]      [p=7]                     (sub-listas FIFO)
/// ```
///
/// Detalhes de Implementação:
/// - Arena de slots indexada (`NodeId` = índice + geração). Um `NodeId`
///   antigo nunca alcança o nó que reutilizou o slot.
/// - A sub-lista é circular com a própria cabeça como sentinela: o primeiro
///   membro aponta para trás para a cabeça e o último aponta para frente
///   para ela. Remover um membro ou promover o primeiro membro a cabeça
///   custa O(1).
/// - `insert` percorre apenas as cabeças: O(número de prioridades distintas).
/// - `peek_min`/`pop_min` atuam na primeira cabeça: O(1).
/// - Links inconsistentes são corrupção: log + panic controlado.

// Priority-Grouped List

use alloc::collections::TryReserveError;
use alloc::vec::Vec;

use crate::core::debug::oops::bug;

/// Handle para um nó da lista.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    gen: u32,
}

#[derive(Debug, Clone, Copy)]
enum Link {
    /// Cabeça de grupo, encadeada na lista externa
    Head {
        prev: Option<u32>,
        next: Option<u32>,
        first: Option<u32>,
        last: Option<u32>,
    },
    /// Membro da sub-lista circular de uma cabeça
    Member { prev: u32, next: u32 },
}

struct Entry<T, P> {
    value: T,
    prio: P,
    link: Link,
}

struct Slot<T, P> {
    gen: u32,
    entry: Option<Entry<T, P>>,
    next_free: Option<u32>,
}

enum Position {
    Group(u32),
    Before(u32),
    Back,
}

/// Lista ordenada por prioridade, FIFO dentro de cada prioridade.
pub struct PrioList<T, P> {
    slots: Vec<Slot<T, P>>,
    free: Option<u32>,
    head: Option<u32>,
    tail: Option<u32>,
    len: usize,
}

#[cold]
fn corrupted(msg: &str) -> ! {
    crate::kerror!("(PList) Estrutura corrompida");
    bug(msg)
}

impl<T, P: Ord + Copy> PrioList<T, P> {
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: None,
            head: None,
            tail: None,
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insere `value` com prioridade `prio`.
    ///
    /// Se já existe um grupo com a mesma prioridade, o nó entra no fim da
    /// sub-lista desse grupo.
    pub fn insert(&mut self, value: T, prio: P) -> Result<NodeId, TryReserveError> {
        let mut position = Position::Back;
        let mut cur = self.head;
        while let Some(c) = cur {
            let cp = self.entry(c).prio;
            if cp == prio {
                position = Position::Group(c);
                break;
            }
            if cp > prio {
                position = Position::Before(c);
                break;
            }
            cur = self.outer_next(c);
        }

        let idx = self.alloc(value, prio)?;
        match position {
            Position::Group(h) => self.append_member(h, idx),
            Position::Before(c) => self.link_head_before(c, idx),
            Position::Back => self.link_head_back(idx),
        }
        self.len += 1;
        Ok(self.id_of(idx))
    }

    /// Remove o nó `id`.
    ///
    /// Remover um nó que não está mais na lista é um no-op que retorna `None`.
    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        let idx = self.resolve(id)?;
        Some(self.unlink_and_free(idx).0)
    }

    /// Nó de menor prioridade (o mais antigo entre os empatados).
    pub fn peek_min(&self) -> Option<(&T, P)> {
        let h = self.head?;
        let e = self.entry(h);
        Some((&e.value, e.prio))
    }

    /// Handle do nó de menor prioridade.
    pub fn first_id(&self) -> Option<NodeId> {
        self.head.map(|h| self.id_of(h))
    }

    /// Remove e retorna o nó de menor prioridade.
    pub fn pop_min(&mut self) -> Option<(T, P)> {
        let h = self.head?;
        Some(self.unlink_and_free(h))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.resolve(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        let idx = self.resolve(id)?;
        Some(&self.entry(idx).value)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        let idx = self.resolve(id)?;
        Some(&mut self.entry_mut(idx).value)
    }

    pub fn priority(&self, id: NodeId) -> Option<P> {
        let idx = self.resolve(id)?;
        Some(self.entry(idx).prio)
    }

    /// Iteração em ordem de remoção (prioridade, depois chegada).
    pub fn iter(&self) -> Iter<'_, T, P> {
        Iter {
            list: self,
            cur: self.head,
        }
    }

    /// Verifica a estrutura completa.
    pub fn validate(&self) -> Result<(), &'static str> {
        let mut count = 0usize;
        let mut prev_head: Option<u32> = None;
        let mut prev_prio: Option<P> = None;
        let mut cur = self.head;

        while let Some(h) = cur {
            let e = self.try_entry(h).ok_or("slot livre na lista externa")?;
            let Link::Head {
                prev,
                next,
                first,
                last,
            } = e.link
            else {
                return Err("membro encadeado na lista externa");
            };
            if prev != prev_head {
                return Err("prev externo inconsistente");
            }
            if let Some(pp) = prev_prio {
                if e.prio <= pp {
                    return Err("lista externa fora de ordem");
                }
            }
            if first.is_some() != last.is_some() {
                return Err("first/last do grupo inconsistentes");
            }
            count += 1;

            let mut back = h;
            let mut m = first;
            while let Some(mi) = m {
                let me = self.try_entry(mi).ok_or("slot livre em sub-lista")?;
                let Link::Member {
                    prev: mp,
                    next: mn,
                } = me.link
                else {
                    return Err("cabeça dentro de sub-lista");
                };
                if me.prio != e.prio {
                    return Err("prioridade divergente no grupo");
                }
                if mp != back {
                    return Err("prev de membro inconsistente");
                }
                count += 1;
                if count > self.len {
                    return Err("ciclo na sub-lista");
                }
                back = mi;
                m = if mn == h { None } else { Some(mn) };
            }
            let expected_last = if back == h { None } else { Some(back) };
            if last != expected_last {
                return Err("last do grupo inconsistente");
            }

            if count > self.len {
                return Err("ciclo na lista externa");
            }
            prev_head = Some(h);
            prev_prio = Some(e.prio);
            cur = next;
        }

        if self.tail != prev_head {
            return Err("tail inconsistente");
        }
        if count != self.len {
            return Err("contagem divergente");
        }
        Ok(())
    }

    /// Como [`validate`](Self::validate), mas violação é fatal.
    pub fn check_invariants(&self) {
        if let Err(msg) = self.validate() {
            crate::kerror!("(PList) Invariante violada. len=", self.len as u64);
            corrupted(msg);
        }
    }

    // =========================================================================
    // Arena
    // =========================================================================

    fn alloc(&mut self, value: T, prio: P) -> Result<u32, TryReserveError> {
        let entry = Entry {
            value,
            prio,
            link: Link::Head {
                prev: None,
                next: None,
                first: None,
                last: None,
            },
        };

        if let Some(idx) = self.free {
            let Some(slot) = self.slots.get_mut(idx as usize) else {
                corrupted("free list aponta para fora da arena");
            };
            self.free = slot.next_free.take();
            slot.entry = Some(entry);
            return Ok(idx);
        }

        self.slots.try_reserve(1)?;
        let idx = self.slots.len() as u32;
        self.slots.push(Slot {
            gen: 0,
            entry: Some(entry),
            next_free: None,
        });
        Ok(idx)
    }

    fn release(&mut self, idx: u32) -> Entry<T, P> {
        let free = self.free;
        let Some(slot) = self.slots.get_mut(idx as usize) else {
            corrupted("release fora da arena");
        };
        let Some(entry) = slot.entry.take() else {
            corrupted("release de slot livre");
        };
        slot.gen = slot.gen.wrapping_add(1);
        slot.next_free = free;
        self.free = Some(idx);
        entry
    }

    fn resolve(&self, id: NodeId) -> Option<u32> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.gen == id.gen && slot.entry.is_some() {
            Some(id.index)
        } else {
            None
        }
    }

    fn id_of(&self, idx: u32) -> NodeId {
        let gen = self.slots.get(idx as usize).map_or(0, |s| s.gen);
        NodeId { index: idx, gen }
    }

    fn try_entry(&self, idx: u32) -> Option<&Entry<T, P>> {
        self.slots.get(idx as usize).and_then(|s| s.entry.as_ref())
    }

    fn entry(&self, idx: u32) -> &Entry<T, P> {
        match self.try_entry(idx) {
            Some(e) => e,
            None => corrupted("link aponta para slot livre"),
        }
    }

    fn entry_mut(&mut self, idx: u32) -> &mut Entry<T, P> {
        match self.slots.get_mut(idx as usize).and_then(|s| s.entry.as_mut()) {
            Some(e) => e,
            None => corrupted("link aponta para slot livre"),
        }
    }

    // =========================================================================
    // Links
    // =========================================================================

    fn outer_next(&self, idx: u32) -> Option<u32> {
        match self.entry(idx).link {
            Link::Head { next, .. } => next,
            Link::Member { .. } => corrupted("membro na lista externa"),
        }
    }

    fn set_outer_prev(&mut self, idx: u32, value: Option<u32>) {
        match &mut self.entry_mut(idx).link {
            Link::Head { prev, .. } => *prev = value,
            Link::Member { .. } => corrupted("membro na lista externa"),
        }
    }

    fn set_outer_next(&mut self, idx: u32, value: Option<u32>) {
        match &mut self.entry_mut(idx).link {
            Link::Head { next, .. } => *next = value,
            Link::Member { .. } => corrupted("membro na lista externa"),
        }
    }

    fn set_group_first(&mut self, head: u32, value: Option<u32>) {
        match &mut self.entry_mut(head).link {
            Link::Head { first, .. } => *first = value,
            Link::Member { .. } => corrupted("sentinela de grupo não é cabeça"),
        }
    }

    fn set_group_last(&mut self, head: u32, value: Option<u32>) {
        match &mut self.entry_mut(head).link {
            Link::Head { last, .. } => *last = value,
            Link::Member { .. } => corrupted("sentinela de grupo não é cabeça"),
        }
    }

    fn set_member_prev(&mut self, idx: u32, value: u32) {
        match &mut self.entry_mut(idx).link {
            Link::Member { prev, .. } => *prev = value,
            Link::Head { .. } => corrupted("cabeça dentro de sub-lista"),
        }
    }

    fn set_member_next(&mut self, idx: u32, value: u32) {
        match &mut self.entry_mut(idx).link {
            Link::Member { next, .. } => *next = value,
            Link::Head { .. } => corrupted("cabeça dentro de sub-lista"),
        }
    }

    fn is_head(&self, idx: u32) -> bool {
        matches!(self.entry(idx).link, Link::Head { .. })
    }

    fn link_head_before(&mut self, at: u32, idx: u32) {
        let prev = match self.entry(at).link {
            Link::Head { prev, .. } => prev,
            Link::Member { .. } => corrupted("membro na lista externa"),
        };
        self.entry_mut(idx).link = Link::Head {
            prev,
            next: Some(at),
            first: None,
            last: None,
        };
        self.set_outer_prev(at, Some(idx));
        match prev {
            Some(p) => self.set_outer_next(p, Some(idx)),
            None => self.head = Some(idx),
        }
    }

    fn link_head_back(&mut self, idx: u32) {
        let prev = self.tail;
        self.entry_mut(idx).link = Link::Head {
            prev,
            next: None,
            first: None,
            last: None,
        };
        match prev {
            Some(p) => self.set_outer_next(p, Some(idx)),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
    }

    fn append_member(&mut self, head: u32, idx: u32) {
        let last = match self.entry(head).link {
            Link::Head { last, .. } => last,
            Link::Member { .. } => corrupted("sentinela de grupo não é cabeça"),
        };
        match last {
            None => {
                self.entry_mut(idx).link = Link::Member {
                    prev: head,
                    next: head,
                };
                self.set_group_first(head, Some(idx));
            }
            Some(l) => {
                self.entry_mut(idx).link = Link::Member {
                    prev: l,
                    next: head,
                };
                self.set_member_next(l, idx);
            }
        }
        self.set_group_last(head, Some(idx));
    }

    fn unlink_and_free(&mut self, idx: u32) -> (T, P) {
        match self.entry(idx).link {
            Link::Member { prev, next } => self.unlink_member(prev, next),
            Link::Head {
                prev,
                next,
                first,
                last,
            } => self.unlink_head(idx, prev, next, first, last),
        }
        self.len -= 1;
        let entry = self.release(idx);
        (entry.value, entry.prio)
    }

    fn unlink_member(&mut self, prev: u32, next: u32) {
        if self.is_head(prev) {
            let first = if next == prev { None } else { Some(next) };
            self.set_group_first(prev, first);
        } else {
            self.set_member_next(prev, next);
        }

        if self.is_head(next) {
            let last = if prev == next { None } else { Some(prev) };
            self.set_group_last(next, last);
        } else {
            self.set_member_prev(next, prev);
        }
    }

    fn unlink_head(
        &mut self,
        idx: u32,
        prev: Option<u32>,
        next: Option<u32>,
        first: Option<u32>,
        last: Option<u32>,
    ) {
        let replacement = match first {
            None => next,
            Some(f) => {
                // Promoção: o primeiro membro assume a posição da cabeça
                let Some(last) = last else {
                    corrupted("grupo com first sem last");
                };
                let f_next = match self.entry(f).link {
                    Link::Member { next, .. } => next,
                    Link::Head { .. } => corrupted("cabeça dentro de sub-lista"),
                };
                let new_first = if f_next == idx { None } else { Some(f_next) };
                let new_last = if last == f { None } else { Some(last) };

                self.entry_mut(f).link = Link::Head {
                    prev,
                    next,
                    first: new_first,
                    last: new_last,
                };
                if let Some(nf) = new_first {
                    self.set_member_prev(nf, f);
                }
                if let Some(nl) = new_last {
                    self.set_member_next(nl, f);
                }
                if let Some(x) = next {
                    self.set_outer_prev(x, Some(f));
                } else {
                    self.tail = Some(f);
                }
                match prev {
                    Some(p) => self.set_outer_next(p, Some(f)),
                    None => self.head = Some(f),
                }
                return;
            }
        };

        match prev {
            Some(p) => self.set_outer_next(p, replacement),
            None => self.head = replacement,
        }
        match next {
            Some(x) => self.set_outer_prev(x, prev),
            None => self.tail = prev,
        }
    }

    fn next_in_order(&self, idx: u32) -> Option<u32> {
        match self.entry(idx).link {
            Link::Head { next, first, .. } => first.or(next),
            Link::Member { next, .. } => {
                if self.is_head(next) {
                    self.outer_next(next)
                } else {
                    Some(next)
                }
            }
        }
    }
}

impl<T, P: Ord + Copy> Default for PrioList<T, P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterador em ordem de prioridade.
pub struct Iter<'a, T, P> {
    list: &'a PrioList<T, P>,
    cur: Option<u32>,
}

impl<'a, T, P: Ord + Copy> Iterator for Iter<'a, T, P> {
    type Item = (NodeId, &'a T, P);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cur?;
        let list = self.list;
        let e = list.entry(idx);
        self.cur = list.next_in_order(idx);
        Some((list.id_of(idx), &e.value, e.prio))
    }
}
