mod handle;
mod request;
mod worker;

pub use handle::*;
