//! Utility functions

mod fault;
mod timing;

pub use fault::maybe_flip_bit;
pub use timing::measure;
