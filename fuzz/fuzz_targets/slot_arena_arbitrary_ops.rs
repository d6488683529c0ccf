#![no_main]

use libfuzzer_sys::fuzz_target;
use memlru::ds::SlotArena;

// Fuzz arbitrary operation sequences on SlotArena
//
// Every id ever handed out is kept, so removes and lookups regularly hit
// released and reused slots. A released id must never resolve again, even
// after its slot index is recycled.
fuzz_target!(|data: &[u8]| {
    let mut arena: SlotArena<u32> = SlotArena::new();
    let mut all_ids = Vec::new();
    let mut released = Vec::new();

    for pair in data.chunks_exact(2) {
        let op = pair[0] % 7;
        let value = u32::from(pair[1]);

        match op {
            0 => {
                // insert
                let id = arena.insert(value);
                all_ids.push(id);
                assert_eq!(arena.get(id), Some(&value));
                assert!(arena.contains(id));
            }
            1 => {
                // remove
                if !all_ids.is_empty() {
                    let id = all_ids[(value as usize) % all_ids.len()];
                    let old_len = arena.len();
                    if arena.remove(id).is_some() {
                        assert_eq!(arena.len(), old_len - 1);
                        released.push(id);
                    } else {
                        assert_eq!(arena.len(), old_len);
                    }
                    assert!(!arena.contains(id));
                    assert_eq!(arena.get(id), None);
                }
            }
            2 => {
                // get_mut
                if !all_ids.is_empty() {
                    let id = all_ids[(value as usize) % all_ids.len()];
                    if let Some(slot) = arena.get_mut(id) {
                        *slot = value;
                        assert_eq!(arena.get(id), Some(&value));
                    }
                }
            }
            3 => {
                // contains agrees with get
                if !all_ids.is_empty() {
                    let id = all_ids[(value as usize) % all_ids.len()];
                    assert_eq!(arena.contains(id), arena.get(id).is_some());
                }
            }
            4 => {
                // iter
                assert_eq!(arena.iter().count(), arena.len());
                for (id, _) in arena.iter() {
                    assert!(arena.contains(id));
                }
            }
            5 => {
                // clear: every id goes stale
                for &id in &all_ids {
                    if arena.contains(id) {
                        released.push(id);
                    }
                }
                arena.clear();
                assert!(arena.is_empty());
                assert_eq!(arena.iter().count(), 0);
            }
            6 => {
                // slot reuse never revives a released id
                let _ = arena.insert(value);
            }
            _ => unreachable!(),
        }

        for &id in &released {
            assert!(!arena.contains(id));
        }
        assert!(arena.len() <= arena.slot_count());
    }
});
