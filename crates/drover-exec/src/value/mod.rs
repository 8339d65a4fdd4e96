//! Runtime values and tuples.
//!
//! A [`Value`] is one field; a [`Tuple`] is the unit pulled through
//! relational operators.

mod scalar;
mod tuple;

pub use scalar::Value;
pub use tuple::Tuple;
