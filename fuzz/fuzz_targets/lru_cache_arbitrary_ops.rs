#![no_main]

use libfuzzer_sys::fuzz_target;
use memlru::ds::IndexKind;
use memlru::policy::lru::LruCache;

// Fuzz arbitrary operation sequences on LruCache
//
// The first bytes pick budget, batch size and index layout; the rest is a
// stream of set/get/peek/delete/clear ops over a small key space so keys
// collide often. Invariants are checked after every op.
fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    let max_cost = 1 + usize::from(data[0]);
    let batch = 1 + usize::from(data[1] % 8);
    let index = if data[2] & 1 == 0 {
        IndexKind::Exact
    } else {
        IndexKind::Hashed
    };
    let mut cache: LruCache<Vec<u8>> = LruCache::builder(max_cost)
        .evict_batch_size(batch)
        .index(index)
        .build();

    for op in data[3..].chunks_exact(3) {
        let key = [op[1] % 32];
        match op[0] % 6 {
            0 | 1 => {
                let value = vec![op[1]; usize::from(op[2])];
                let cost = 1 + value.len();
                let had_key = cache.contains(&key);
                let before = cache.current_cost();
                cache.set(&key, value);
                if cost <= max_cost {
                    assert!(cache.contains(&key));
                } else {
                    // refused: nothing moves
                    assert_eq!(cache.contains(&key), had_key);
                    assert_eq!(cache.current_cost(), before);
                }
            }
            2 => {
                if let Some(value) = cache.get(&key) {
                    assert!(value.iter().all(|&b| b % 32 == key[0]));
                }
                if cache.contains(&key) {
                    assert_eq!(cache.iter().next().map(|(k, _)| k), Some(&key[..]));
                }
            }
            3 => {
                let _ = cache.peek(&key);
            }
            4 => {
                let before = cache.current_cost();
                if let Some(value) = cache.delete(&key) {
                    assert_eq!(cache.current_cost(), before - (1 + value.len()));
                }
                assert!(!cache.contains(&key));
            }
            5 => {
                if op[2] == 0 {
                    cache.clear();
                    assert_eq!(cache.current_cost(), 0);
                }
            }
            _ => unreachable!(),
        }

        assert!(cache.current_cost() <= cache.max_cost());
        cache.check_invariants().unwrap();
    }
});
