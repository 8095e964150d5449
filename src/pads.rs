//! Effect pads: twelve slots, each lazily loading its sound on the first
//! trigger and keeping it cached until cleared or reassigned.

mod bank;
mod slot;

pub use bank::*;
pub use slot::*;

#[cfg(test)]
mod tests;
