pub mod loader;
pub mod registry;
pub mod types;

pub use loader::load_from_path;
pub use registry::ModelRegistry;
pub use types::*;
