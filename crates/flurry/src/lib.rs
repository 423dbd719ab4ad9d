#![doc = include_str!("../README.md")]

mod engine;
mod error;
mod id;
mod time;

pub use crate::engine::*;
pub use crate::error::*;
pub use crate::id::*;
pub use crate::time::*;
