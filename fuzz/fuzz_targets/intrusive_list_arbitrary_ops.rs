#![no_main]

use libfuzzer_sys::fuzz_target;
use memlru::ds::IntrusiveList;

// Fuzz arbitrary operation sequences on IntrusiveList
//
// Tests random sequences of push_front, pop_back, move_to_front, remove,
// get and clear, checking link consistency after every step.
fuzz_target!(|data: &[u8]| {
    let mut list: IntrusiveList<u32> = IntrusiveList::new();
    let mut all_ids = Vec::new();

    for pair in data.chunks_exact(2) {
        let op = pair[0] % 7;
        let value = u32::from(pair[1]);

        match op {
            0 => {
                // push_front
                let id = list.push_front(value);
                all_ids.push(id);
                assert_eq!(list.front_id(), Some(id));
                assert_eq!(list.get(id), Some(&value));
            }
            1 => {
                // pop_back
                let old_len = list.len();
                let expected = list.back_id();
                match list.pop_back() {
                    Some((id, _)) => {
                        assert_eq!(Some(id), expected);
                        assert_eq!(list.len(), old_len - 1);
                        assert!(!list.contains(id));
                    }
                    None => assert_eq!(old_len, 0),
                }
            }
            2 => {
                // move_to_front
                if !all_ids.is_empty() {
                    let id = all_ids[(value as usize) % all_ids.len()];
                    let len = list.len();
                    if list.move_to_front(id) {
                        assert_eq!(list.front_id(), Some(id));
                    }
                    assert_eq!(list.len(), len);
                }
            }
            3 => {
                // remove
                if !all_ids.is_empty() {
                    let id = all_ids[(value as usize) % all_ids.len()];
                    let old_len = list.len();
                    if list.remove(id).is_some() {
                        assert_eq!(list.len(), old_len - 1);
                    }
                    assert!(!list.contains(id));
                }
            }
            4 => {
                // get_mut
                if !all_ids.is_empty() {
                    let id = all_ids[(value as usize) % all_ids.len()];
                    if let Some(slot) = list.get_mut(id) {
                        *slot = value;
                    }
                }
            }
            5 => {
                // iteration order matches the id walk
                let values: Vec<u32> = list.iter().copied().collect();
                let walked: Vec<u32> = list.iter_entries().map(|(_, v)| *v).collect();
                assert_eq!(values, walked);
                assert_eq!(values.len(), list.len());
            }
            6 => {
                // clear
                list.clear();
                assert!(list.is_empty());
                assert_eq!(list.front_id(), None);
                assert_eq!(list.back_id(), None);
            }
            _ => unreachable!(),
        }

        list.check_links().unwrap();
    }
});
