//! Process-wide pool of reusable SQL output buffers.
//!
//! A [`PooledBuffer`] is taken from the pool when a statement starts rendering
//! and handed back in `Drop`, so it returns exactly once on every exit path,
//! including early `?` returns.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, OnceLock, PoisonError};

/// Maximum number of idle buffers kept around.
const MAX_IDLE: usize = 64;
/// Buffers that grew beyond this are dropped instead of pooled.
const MAX_RETAINED_CAPACITY: usize = 64 * 1024;
const INITIAL_CAPACITY: usize = 256;

fn pool() -> &'static Mutex<Vec<String>> {
    static POOL: OnceLock<Mutex<Vec<String>>> = OnceLock::new();
    POOL.get_or_init(|| Mutex::new(Vec::new()))
}

#[derive(Debug)]
pub(crate) struct PooledBuffer {
    buf: String,
}

impl PooledBuffer {
    pub(crate) fn acquire() -> Self {
        let buf = pool()
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_else(|| String::with_capacity(INITIAL_CAPACITY));
        Self { buf }
    }
}

impl Deref for PooledBuffer {
    type Target = String;

    fn deref(&self) -> &String {
        &self.buf
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut String {
        &mut self.buf
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        let mut buf = std::mem::take(&mut self.buf);
        if buf.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        buf.clear();
        let mut idle = pool().lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < MAX_IDLE {
            idle.push(buf);
        }
    }
}
