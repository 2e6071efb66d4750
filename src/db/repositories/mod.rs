pub mod kv;
pub mod phase_history;
