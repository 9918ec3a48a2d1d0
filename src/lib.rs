pub mod binding;
pub mod config;
pub mod container;
pub mod error;
pub mod function;
pub mod key;
pub mod loader;
pub mod logging;
pub mod reflect;
pub mod value;

// Re-export commonly used items for convenience
pub use config::ContainerConfig;
pub use container::{Container, ContainerBuilder, ContainerStats, PrepareKeys, Prepared, Slot};
pub use error::{ContainerError, LoadError, Result};
pub use function::{Arguments, Function, FunctionKind};
pub use loader::{FileLoader, Loader, ModuleTable};
pub use reflect::{DeclaredParameters, Reflector};
pub use value::{Args, Object, Value};
