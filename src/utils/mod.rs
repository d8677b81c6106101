pub mod join;
pub mod read_cache;
