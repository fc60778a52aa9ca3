pub mod backend;
pub mod local;
pub mod memory;

pub use backend::{PhotoStore, StoreKind};
pub use local::LocalStore;
pub use memory::MemoryStore;
