pub mod cli;
pub mod error;
pub mod handle;
pub mod target;

pub use error::{ClassifyError, ExitStatus, Result};
pub use handle::Priority;
pub use target::registry::{register_classify, TargetRegistry};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
