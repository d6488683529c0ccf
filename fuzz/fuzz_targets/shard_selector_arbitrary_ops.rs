#![no_main]

use libfuzzer_sys::fuzz_target;
use memlru::ds::ShardSelector;
use memlru::ds::shard::{default_hash, default_hash_fn};

// Fuzz shard selection
//
// Power-of-two counts must map every key into range, deterministically, and
// agree with masking the default hash. Every other count must be rejected.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let requested = usize::from(data[0]) % 130;
    let Ok(selector) = ShardSelector::try_with_hash(requested, default_hash_fn()) else {
        assert!(!requested.is_power_of_two());
        return;
    };
    assert!(requested.is_power_of_two());
    assert_eq!(selector.shard_count(), requested);

    for key in data[1..].chunks(1 + usize::from(data[1]) % 8) {
        let shard = selector.shard_for_key(key);
        assert!(shard < selector.shard_count());
        assert_eq!(shard, selector.shard_for_key(key));
        assert_eq!(shard, (default_hash(key) as usize) & (requested - 1));
    }
});
