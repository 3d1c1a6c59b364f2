//! Fleetform Random
//!
//! The `random` package: resources whose value is generated once by the
//! provider and then kept in stack state.
//!
//! ```ignore
//! let args = RandomIntegerArgs::builder().min(1).max(100).build()?;
//! let number = RandomInteger::new(ctx, "randomNumber", args)?;
//! ctx.export("randomNumber", &number.result)?;
//! ```

pub mod integer;
pub mod provider;

// Re-exports
pub use integer::{RANDOM_INTEGER, RandomInteger, RandomIntegerArgs, RandomIntegerArgsBuilder};
pub use provider::RandomProvider;
