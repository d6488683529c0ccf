pub mod budget;
pub mod lru;
pub mod sharded;
