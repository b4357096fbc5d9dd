/* 📖 # What is the Platform Abstraction Layer?

The PAL is the only place that touches the filesystem. File-backed preference
stores read and write through it, so the same store code runs against the real
disk (RealPal) or an in-memory map (MockPal) in tests.
*/

mod file_path;
pub mod mock;
pub mod real_pal;
mod traits;

pub use file_path::FilePath;
pub use mock::MockPal;
pub use real_pal::RealPal;
pub use traits::{Pal, PalHandle, ReadSeek};
