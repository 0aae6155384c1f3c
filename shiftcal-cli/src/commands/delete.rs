use anyhow::Result;
use owo_colors::OwoColorize;
use shiftcal_core::store::ShiftStore;

use crate::context::Context;

pub async fn run(ctx: &Context, id: &str) -> Result<()> {
    let principal = ctx.principal().await?;
    ctx.store()?.delete(&principal, id).await?;

    println!("{} {}", "Deleted".green(), id.dimmed());
    Ok(())
}
