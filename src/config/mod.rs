mod env;
mod settings;
mod tracing;

pub use env::*;
pub use settings::*;
pub use self::tracing::init_tracing;
