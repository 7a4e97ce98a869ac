//! The plugin model and runtime: fact/operator definitions, the process-
//! wide registry they're loaded into, the stdio protocol client used to
//! talk to out-of-tree plugin executables, and the search-path resolver
//! that finds them on disk.

mod context;
mod error;
mod loader;
mod model;
mod process;
mod registry;

pub use context::FactContext;
pub use error::PluginError;
pub use loader::PluginLoader;
pub use model::{
    FactDefn, FactSource, NativeFactFn, NativeOperatorFn, OperatorDefn, OperatorSource, Plugin,
};
pub use process::ProcessPluginHandle;
pub use registry::PluginRegistry;
