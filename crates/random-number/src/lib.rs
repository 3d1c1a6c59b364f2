//! Sample program: a random integer between 1 and 100, exported as
//! `randomNumber`.

use fleetform_cloud::{Engine, ProviderRegistry};
use fleetform_core::{Context, Result, StackRef};
use fleetform_random::{RandomInteger, RandomIntegerArgs, RandomProvider};
use std::path::Path;
use std::sync::Arc;

/// Project name used when no `Fleetform.yaml` is present
pub const PROJECT_NAME: &str = "random-number";

/// Logical name of the declared resource
pub const RESOURCE_NAME: &str = "randomNumber";

/// Key the result is exported under
pub const EXPORT_KEY: &str = "randomNumber";

pub const MIN: i64 = 1;
pub const MAX: i64 = 100;

/// Declare the random integer and export its result
pub fn program(ctx: &mut Context) -> Result<()> {
    let random_number = RandomInteger::new(
        ctx,
        RESOURCE_NAME,
        RandomIntegerArgs::builder().min(MIN).max(MAX).build()?,
    )?;

    ctx.export(EXPORT_KEY, &random_number.result)
}

/// Engine with the providers this program needs
pub fn engine(stack: StackRef, state_dir: &Path) -> Engine {
    let providers = ProviderRegistry::new().with(Arc::new(RandomProvider::new()));
    Engine::new(stack, providers, state_dir)
}
