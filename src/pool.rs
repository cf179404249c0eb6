use parking_lot::Mutex;
use std::cell::Cell;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Capacity of a freshly allocated scratch buffer; enough for most lines.
pub const DEFAULT_BUFFER_CAPACITY: usize = 256;

/// Buffers that grew past this are dropped on release instead of cached.
pub const MAX_RETAINED_CAPACITY: usize = 64 * 1024;

static NEXT_SHARD: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    static SHARD_HINT: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Cache of reusable scratch buffers.
///
/// Free buffers live in several independently locked lists; each thread
/// sticks to one list, so threads rarely contend on the same lock. The pool
/// is unbounded: it holds as many buffers as were ever released at once.
pub struct BufferPool {
    shards: Box<[Mutex<Vec<Vec<u8>>>]>,
}

impl BufferPool {
    pub fn new() -> Self {
        let shards = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
            .next_power_of_two();
        Self::with_shards(shards)
    }

    pub fn with_shards(shards: usize) -> Self {
        let shards = shards.max(1);
        BufferPool {
            shards: (0..shards).map(|_| Mutex::new(Vec::new())).collect(),
        }
    }

    fn shard(&self) -> &Mutex<Vec<Vec<u8>>> {
        let hint = SHARD_HINT.with(|cell| match cell.get() {
            Some(hint) => hint,
            None => {
                let hint = NEXT_SHARD.fetch_add(1, Ordering::Relaxed);
                cell.set(Some(hint));
                hint
            }
        });
        &self.shards[hint % self.shards.len()]
    }

    /// Borrows an empty buffer. It goes back to the pool when dropped.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let cached = self.shard().try_lock().and_then(|mut free| free.pop());
        let mut buf = cached.unwrap_or_else(|| Vec::with_capacity(DEFAULT_BUFFER_CAPACITY));
        buf.clear();
        PooledBuffer { pool: self, buf }
    }

    fn release(&self, mut buf: Vec<u8>) {
        if buf.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        buf.clear();
        self.shard().lock().push(buf);
    }

    /// Number of cached buffers currently waiting to be reused.
    pub fn idle(&self) -> usize {
        self.shards.iter().map(|shard| shard.lock().len()).sum()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        BufferPool::new()
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("shards", &self.shards.len())
            .field("idle", &self.idle())
            .finish()
    }
}

/// Scratch buffer on loan from a [`BufferPool`].
pub struct PooledBuffer<'a> {
    pool: &'a BufferPool,
    buf: Vec<u8>,
}

impl Deref for PooledBuffer<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buf
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn acquired_buffers_start_empty_with_capacity() {
        let pool = BufferPool::with_shards(1);
        let buf = pool.acquire();
        assert!(buf.is_empty());
        assert!(buf.capacity() >= DEFAULT_BUFFER_CAPACITY);
    }

    #[test]
    fn released_capacity_is_reused() {
        let pool = BufferPool::with_shards(1);
        {
            let mut buf = pool.acquire();
            buf.extend_from_slice(&[b'x'; 1000]);
        }
        assert_eq!(pool.idle(), 1);

        let buf = pool.acquire();
        assert!(buf.is_empty());
        assert!(buf.capacity() >= 1000);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn oversized_buffers_are_not_retained() {
        let pool = BufferPool::with_shards(1);
        {
            let mut buf = pool.acquire();
            buf.resize(MAX_RETAINED_CAPACITY + 1, 0);
        }
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn pool_grows_with_concurrent_loans() {
        let pool = BufferPool::with_shards(1);
        {
            let _a = pool.acquire();
            let _b = pool.acquire();
            let _c = pool.acquire();
        }
        assert_eq!(pool.idle(), 3);
    }

    #[test]
    fn concurrent_acquire_release() {
        let pool = Arc::new(BufferPool::with_shards(4));
        let workers: Vec<_> = (0..8)
            .map(|n| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    for i in 0..500 {
                        let mut buf = pool.acquire();
                        assert!(buf.is_empty());
                        buf.extend_from_slice(format!("worker {n} line {i}").as_bytes());
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert!(pool.idle() >= 1);
    }
}
