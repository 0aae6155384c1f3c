use anyhow::Result;
use owo_colors::OwoColorize;
use shiftcal_core::duplicates::find_duplicate_dates;

use crate::context::Context;

pub async fn run(ctx: &Context, dates: &[String]) -> Result<()> {
    let principal = ctx.principal().await?;
    let store = ctx.store()?;

    let duplicates = find_duplicate_dates(&store, &principal, dates).await?;

    if duplicates.is_empty() {
        println!("{}", "None of these dates have a shift yet".dimmed());
    } else {
        println!("{}", "Already have a shift on:".yellow());
        for date in duplicates {
            println!("  {date}");
        }
    }
    Ok(())
}
