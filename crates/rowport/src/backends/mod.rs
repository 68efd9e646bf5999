#[cfg(feature = "mem")]
pub mod mem;

#[cfg(feature = "mem")]
pub use mem::{CellValue, MemConnection, MemFactory, MemInput, MemOutput, MemStore, MemTable};
