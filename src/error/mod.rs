mod app;
mod cloud;
mod config;
mod provision;

pub(crate) use app::*;
pub(crate) use cloud::*;
pub(crate) use config::*;
pub(crate) use provision::*;

pub(crate) type AppResult<T> = Result<T, ProvisionError>;
