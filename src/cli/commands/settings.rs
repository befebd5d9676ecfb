//! Settings command implementation.

use anyhow::Result;

use crate::cli::Context;

pub async fn run(ctx: &Context) -> Result<()> {
    print!("{}", ctx.settings.to_toml()?);
    Ok(())
}
