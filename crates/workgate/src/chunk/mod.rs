mod config;
mod values;
mod worker;

pub use config::*;
pub use values::*;
pub use worker::*;
