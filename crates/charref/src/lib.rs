pub mod cache;
pub mod config;
pub mod error;
pub mod escape;
pub mod loader;
pub mod registry;
pub mod source;
pub mod table;
pub mod unescape;

pub use config::*;
pub use error::*;
pub use escape::*;
pub use loader::*;
pub use registry::*;
pub use source::*;
pub use table::*;
pub use unescape::*;
