pub mod atomic_write;
pub mod move_dir;
pub mod move_file;

pub use atomic_write::{AtomicWriteOptions, atomic_write, write_new};
pub use move_dir::move_dir;
pub use move_file::{FallbackStrategy, MoveFileOptions, move_file};
