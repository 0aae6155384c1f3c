use anyhow::Result;
use owo_colors::OwoColorize;
use shiftcal_core::store::ShiftStore;

use crate::context::Context;
use crate::render::shift_line;
use crate::utils::tui;

pub async fn run(ctx: &Context) -> Result<()> {
    let principal = ctx.principal().await?;
    let store = ctx.store()?;

    let spinner = tui::create_spinner("Loading shifts");
    let result = store.list(&principal).await;
    spinner.finish_and_clear();

    let shifts = result?;
    if shifts.is_empty() {
        println!("{}", "No shifts yet".dimmed());
        return Ok(());
    }

    for shift in &shifts {
        println!("{}", shift_line(shift));
    }

    let overtime = shifts.iter().filter(|s| s.is_overtime).count();
    println!();
    println!(
        "{}",
        format!("{} shifts, {} overtime", shifts.len(), overtime).dimmed()
    );
    Ok(())
}
