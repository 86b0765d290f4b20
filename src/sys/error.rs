//! # Standard Error Codes (Errno)
//!
//! Códigos de erro devolvidos pelo kernel na fronteira das syscalls.
//! Baseado no padrão POSIX para compatibilidade com ferramentas existentes.
//!
//! O núcleo de escalonamento trabalha internamente com
//! [`SchedError`](crate::sched::error::SchedError); a conversão para `Errno`
//! acontece só quando o erro precisa sair para o userspace.
//!
//! Valores negativos são usados em retornos de syscalls (isize).

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Errno {
    Success = 0,
    EPERM = 1,      // Operation not permitted
    ESRCH = 3,      // No such process
    EINTR = 4,      // Interrupted system call
    EAGAIN = 11,    // Try again
    ENOMEM = 12,    // Out of memory
    EBUSY = 16,     // Device or resource busy
    EINVAL = 22,    // Invalid argument
    EDEADLK = 35,   // Resource deadlock would occur
    ENOSYS = 38,    // Function not implemented
    ETIMEDOUT = 110, // Connection timed out
}

impl Errno {
    pub fn as_usize(self) -> usize {
        self as usize
    }

    pub fn as_isize(self) -> isize {
        -(self as i32) as isize
    }
}
