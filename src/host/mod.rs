//! Host implementations of the collaborator traits.

pub mod memory;

pub use memory::{HostCall, MemoryHost};
