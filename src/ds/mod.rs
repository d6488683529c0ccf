pub mod intrusive_list;
pub mod key_index;
pub mod shard;
pub mod slot_arena;

pub use intrusive_list::IntrusiveList;
pub use key_index::{IndexKind, KeyIndex};
pub use shard::{HashFn, ShardSelector};
pub use slot_arena::{SlotArena, SlotId};
