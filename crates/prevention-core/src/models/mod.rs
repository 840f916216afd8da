//! Domain models for preventive examination tracking.

mod account;
mod examination;
mod self_examination;

pub use account::*;
pub use examination::*;
pub use self_examination::*;
