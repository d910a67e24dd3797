mod config;
mod error;
mod status;

pub use config::{Config, DEVICE_URI_ENV};
pub use error::{functions::*, AcquireError, AcquireErrorKind};
pub use status::Status;
