// Backend implementations of the platform trigger boundary.
// The OS-level trigger store lives on the mobile side of the bridge;
// in-process embedders and the test suite run against the memory backend.

pub mod memory;

pub use memory::{MemoryBackend, StaticPermissionGate};
