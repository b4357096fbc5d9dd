/* 📖 # Why have prefkit_base as a separate crate?
prefkit_base holds the error type, the tracing setup and the filesystem
abstraction. The store crate and the CLI both build on it, and neither has to know
how the other reports errors.
*/

pub mod error;
mod error_tests;
pub mod pal;
pub mod tracing;

pub use error::{ErrorKind, PrefError, PrefResult, ResultExt};
pub use pal::{FilePath, MockPal, Pal, PalHandle, RealPal};
