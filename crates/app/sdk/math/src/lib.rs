//! Decimal arithmetic for admission policy.
//!
//! Commission-rate bounds and minimum gas prices are fractional values that
//! must compare and multiply deterministically across nodes, so they are kept
//! in binary fixed point rather than floating point.

mod dec;

pub use dec::{Dec, MathError};
