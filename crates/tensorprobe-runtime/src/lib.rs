pub mod binder;
pub mod config;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod reducer;
pub mod session;
pub mod timing;

pub use binder::*;
pub use config::*;
pub use error::*;
pub use loader::*;
pub use pipeline::*;
pub use reducer::*;
pub use session::*;
pub use timing::*;
