mod container_spec;
mod payload;
mod server_config;

pub use container_spec::*;
pub use payload::*;
pub use server_config::*;
