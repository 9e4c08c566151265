use fss::BufferPool;
use std::sync::Arc;
use std::thread;

#[test]
fn empty_pool_allocates_then_reuses() {
    let pool = BufferPool::new(64, 1024);

    let mut buf = pool.get();
    assert!(buf.capacity() >= 64);
    buf.extend_from_slice(b"{\"a\":1}");
    pool.put(buf);
    assert_eq!(pool.available(), 1);

    let buf = pool.get();
    assert!(buf.is_empty(), "returned buffers must be cleared");
    assert_eq!(pool.available(), 0);

    let snap = pool.metrics().snapshot();
    assert_eq!(snap.misses, 1);
    assert_eq!(snap.hits, 1);
    assert_eq!(snap.returns, 1);
    assert_eq!(snap.drops, 0);
    assert!((snap.hit_rate() - 0.5).abs() < f64::EPSILON);
}

#[test]
fn oversized_buffers_are_dropped() {
    let pool = BufferPool::new(16, 128);

    let mut big = pool.get();
    big.resize(4096, b'x');
    pool.put(big);

    assert_eq!(pool.available(), 0);
    assert_eq!(pool.metrics().snapshot().drops, 1);
}

#[test]
fn unused_pool_reports_full_hit_rate() {
    let pool = BufferPool::default();
    assert_eq!(pool.metrics().snapshot().hit_rate(), 1.0);
}

#[test]
fn concurrent_get_and_put() {
    let pool = Arc::new(BufferPool::new(32, 1024));
    let threads = 8;
    let rounds = 500;

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                for i in 0..rounds {
                    let mut buf = pool.get();
                    assert!(buf.is_empty());
                    buf.extend_from_slice(format!("{t}:{i}").as_bytes());
                    pool.put(buf);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker panicked");
    }

    let snap = pool.metrics().snapshot();
    assert_eq!(snap.hits + snap.misses, (threads * rounds) as u64);
    assert_eq!(snap.returns, (threads * rounds) as u64);
    assert!(snap.misses <= threads as u64);
    assert_eq!(pool.available() as u64, snap.misses);
}
