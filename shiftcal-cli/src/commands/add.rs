use std::collections::HashSet;

use anyhow::{Result, bail};
use chrono::Days;
use dialoguer::Confirm;
use owo_colors::OwoColorize;
use shiftcal_core::duplicates::find_duplicate_dates;
use shiftcal_core::store::{check_date_count, create_many};
use shiftcal_core::time::{format_local_date, parse_local_date};
use shiftcal_core::{NewShift, ShiftKind};

use crate::context::Context;
use crate::render::outcome_line;
use crate::utils::tui;

pub struct AddArgs {
    pub dates: Vec<String>,
    pub through: Option<String>,
    pub kind: ShiftKind,
    pub start: Option<String>,
    pub end: Option<String>,
    pub overtime: bool,
    pub yes: bool,
}

pub async fn run(ctx: &Context, args: AddArgs) -> Result<()> {
    let dates = selected_dates(&args.dates, args.through.as_deref())?;
    let Some(first_date) = dates.first() else {
        bail!("Select at least one date");
    };
    let template = template(&args, first_date)?;

    let principal = ctx.principal().await?;
    let store = ctx.store()?;

    let duplicates = find_duplicate_dates(&store, &principal, &dates).await?;
    if !duplicates.is_empty() {
        println!("{}", "You already have a shift on:".yellow());
        for date in &duplicates {
            println!("  {date}");
        }

        if !args.yes {
            println!();
            let confirmed = Confirm::new()
                .with_prompt("Add another shift on these dates anyway?")
                .default(false)
                .interact()?;

            if !confirmed {
                return Ok(());
            }
        }
    }

    let spinner = tui::create_spinner(format!(
        "Adding {} {}",
        dates.len(),
        if dates.len() == 1 { "shift" } else { "shifts" }
    ));
    let outcomes = create_many(&store, &principal, &template, &dates).await;
    spinner.finish_and_clear();

    for outcome in &outcomes {
        println!("{}", outcome_line(outcome));
    }

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    if failed > 0 {
        bail!("{failed} of {} shifts could not be added", outcomes.len());
    }
    Ok(())
}

/// The shift every selected date gets, with the kind's default hours
/// filling in whatever wasn't given. Checked once against `first_date`
/// since the hours are the same on every date.
fn template(args: &AddArgs, first_date: &str) -> Result<NewShift> {
    let (default_start, default_end) = args.kind.default_times();
    let start = args.start.as_deref().unwrap_or(default_start);
    let end = args.end.as_deref().unwrap_or(default_end);

    let shift = NewShift {
        date: first_date.to_string(),
        kind: args.kind,
        start_time: start.to_string(),
        end_time: end.to_string(),
        is_overtime: args.overtime,
    }
    .validated()?;
    Ok(shift)
}

/// Dates in the order given, followed by every day after the last one up
/// to and including `through`. Repeats are dropped and the result is bounded
/// by [`shiftcal_core::store::MAX_DATES_PER_REQUEST`].
fn selected_dates(dates: &[String], through: Option<&str>) -> Result<Vec<String>> {
    check_date_count(dates.len())?;
    let mut parsed = dates
        .iter()
        .map(|d| parse_local_date(d))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(through) = through {
        let until = parse_local_date(through)?;
        let Some(&last) = parsed.last() else {
            bail!("--through needs a starting date");
        };
        if until < last {
            bail!("--through {through} is before {}", format_local_date(last));
        }

        let extra = usize::try_from((until - last).num_days()).unwrap_or(usize::MAX);
        check_date_count(parsed.len().saturating_add(extra))?;

        let mut day = last;
        while day < until {
            match day.checked_add_days(Days::new(1)) {
                Some(next) => day = next,
                None => break,
            }
            parsed.push(day);
        }
    }

    let mut seen = HashSet::with_capacity(parsed.len());
    Ok(parsed
        .into_iter()
        .filter(|date| seen.insert(*date))
        .map(format_local_date)
        .collect())
}
