pub mod classify;
pub mod completion;
pub mod hash_key;
pub mod serve;
