//! One-time lookup of the C library's `malloc` and `free`.
//!
//! The lookup asks the dynamic linker for the *next* definition of each name
//! after ours (`RTLD_NEXT`), so the interposed entry points can forward to the
//! real allocator instead of calling themselves.
//!
//! `dlsym` may allocate. While the resolving thread is inside the lookup its
//! allocations are served from a small static arena, so they neither wait on
//! the one-time guard nor show up in anyone's statistics.

use std::cell::{Cell, UnsafeCell};
use std::ffi::{c_void, CStr};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

pub(crate) type MallocFn = unsafe extern "C" fn(libc::size_t) -> *mut c_void;
pub(crate) type FreeFn = unsafe extern "C" fn(*mut c_void);

/// Addresses of the allocator primitives the interposer forwards to.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RealPrimitives {
    pub(crate) malloc: MallocFn,
    pub(crate) free: FreeFn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResolveError {
    SymbolNotFound(&'static CStr),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::SymbolNotFound(name) => write!(
                f,
                "no next definition of `{}` found with dlsym(RTLD_NEXT)",
                name.to_string_lossy()
            ),
        }
    }
}

impl std::error::Error for ResolveError {}

/// What an entry point should forward to.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Binding {
    Real(&'static RealPrimitives),
    /// The calling thread is itself resolving the primitives.
    Bootstrap,
}

static REAL: OnceLock<RealPrimitives> = OnceLock::new();

thread_local! {
    static RESOLVING: Cell<bool> = const { Cell::new(false) };
}

/// Makes sure the real primitives are bound.
///
/// After the first completed call this is a single acquire load. Concurrent
/// first callers block until the resolving thread is done. A reentrant call
/// from the resolving thread gets [`Binding::Bootstrap`].
#[inline]
pub(crate) fn ensure_initialized() -> Binding {
    // Still flagged as resolving while reporting, so the report cannot recurse.
    bind(&REAL, || resolve().unwrap_or_else(|e| fatal(e)))
}

/// Binds `cell` with `resolve` unless the calling thread is already inside a
/// resolution, in which case it gets [`Binding::Bootstrap`].
#[inline]
pub(crate) fn bind(
    cell: &'static OnceLock<RealPrimitives>,
    resolve: impl FnOnce() -> RealPrimitives,
) -> Binding {
    match init_once(cell, resolve) {
        Some(real) => Binding::Real(real),
        None => Binding::Bootstrap,
    }
}

/// Runs `init` at most once for `cell`. Returns `None` instead of waiting when
/// the calling thread is the one running an initializer.
fn init_once<'a, T>(cell: &'a OnceLock<T>, init: impl FnOnce() -> T) -> Option<&'a T> {
    if let Some(value) = cell.get() {
        return Some(value);
    }

    if RESOLVING.get() {
        return None;
    }

    Some(cell.get_or_init(|| {
        RESOLVING.set(true);
        let value = init();
        RESOLVING.set(false);
        value
    }))
}

pub(crate) fn resolve() -> Result<RealPrimitives, ResolveError> {
    let malloc = lookup(c"malloc")?;
    let free = lookup(c"free")?;

    // SAFETY: the C library defines both symbols with exactly these signatures.
    unsafe {
        Ok(RealPrimitives {
            malloc: std::mem::transmute::<*mut c_void, MallocFn>(malloc),
            free: std::mem::transmute::<*mut c_void, FreeFn>(free),
        })
    }
}

fn lookup(name: &'static CStr) -> Result<*mut c_void, ResolveError> {
    let symbol = unsafe { libc::dlsym(libc::RTLD_NEXT, name.as_ptr()) };
    if symbol.is_null() {
        return Err(ResolveError::SymbolNotFound(name));
    }
    Ok(symbol)
}

fn fatal(err: ResolveError) -> ! {
    eprintln!("[alloc-track] cannot bind the real allocator: {}", err);
    std::process::abort();
}

const ARENA_SIZE: usize = 16 * 1024;
const ARENA_ALIGN: usize = 16;

#[repr(C, align(16))]
struct Arena(UnsafeCell<[u8; ARENA_SIZE]>);

// Disjoint ranges are handed out through `ARENA_USED`.
unsafe impl Sync for Arena {}

static ARENA: Arena = Arena(UnsafeCell::new([0; ARENA_SIZE]));
static ARENA_USED: AtomicUsize = AtomicUsize::new(0);

/// Bump-allocates `size` bytes from the static arena, or returns null once it
/// is exhausted. Memory is never reclaimed.
pub(crate) fn bootstrap_alloc(size: usize) -> *mut c_void {
    let Some(rounded) = size
        .max(1)
        .checked_add(ARENA_ALIGN - 1)
        .map(|s| s & !(ARENA_ALIGN - 1))
    else {
        return std::ptr::null_mut();
    };

    let mut used = ARENA_USED.load(Ordering::Relaxed);
    loop {
        let end = match used.checked_add(rounded) {
            Some(end) if end <= ARENA_SIZE => end,
            _ => return std::ptr::null_mut(),
        };
        match ARENA_USED.compare_exchange_weak(used, end, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => {
                let base = ARENA.0.get().cast::<u8>();
                return unsafe { base.add(used) }.cast();
            }
            Err(actual) => used = actual,
        }
    }
}

/// Whether `ptr` was handed out by [`bootstrap_alloc`].
#[inline]
pub(crate) fn is_bootstrap(ptr: *mut c_void) -> bool {
    let base = ARENA.0.get() as usize;
    let addr = ptr as usize;
    addr >= base && addr < base + ARENA_SIZE
}
