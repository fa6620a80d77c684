//! 核心：错误类型与优雅关闭

pub mod error;
pub mod shutdown;

pub use error::{RegistryError, RpcError};
pub use shutdown::{SessionStoreCleanup, ShutdownCoordinator, ShutdownManager, ShutdownReason};
