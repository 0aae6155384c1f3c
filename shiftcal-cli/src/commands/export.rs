use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow, bail};
use owo_colors::OwoColorize;
use reqwest::StatusCode;
use reqwest::header::CONTENT_DISPOSITION;
use serde::Deserialize;
use shiftcal_core::export::EXPORT_FILENAME;

use crate::context::Context;
use crate::utils::tui;

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

pub async fn run(ctx: &Context, output: Option<PathBuf>) -> Result<()> {
    let principal = ctx.principal().await?;
    let url = format!(
        "{}/api/generate-ical",
        ctx.config.server_url.trim_end_matches('/')
    );

    let spinner = tui::create_spinner("Generating calendar");
    let result = reqwest::Client::builder()
        .timeout(ctx.config.request_timeout())
        .build()?
        .get(&url)
        .bearer_auth(&principal.access_token)
        .send()
        .await;
    spinner.finish_and_clear();

    let resp = result.map_err(|e| {
        anyhow!(
            "Could not reach the shiftcal server at {}: {e}\n\n\
            Is it running? Start it with: shiftcal-server",
            ctx.config.server_url
        )
    })?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(body);

        if status == StatusCode::NOT_FOUND {
            bail!("{message}\n\nAdd one with: shiftcal add <YYYY-MM-DD>");
        }
        bail!("Export failed ({status}): {message}");
    }

    let suggested = resp
        .headers()
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(attachment_filename)
        .unwrap_or_else(|| EXPORT_FILENAME.to_string());
    let path = output.unwrap_or_else(|| PathBuf::from(suggested));

    let ics = resp.text().await?;
    std::fs::write(&path, &ics)?;

    let events = ics.matches("BEGIN:VEVENT").count();
    println!(
        "{} {} {}",
        "Wrote".green(),
        path.display(),
        format!("({events} events)").dimmed()
    );
    Ok(())
}

/// `filename` from an `attachment; filename="..."` header, reduced to a
/// bare file name.
fn attachment_filename(header: &str) -> Option<String> {
    let value = header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))?
        .trim_matches('"');

    let name = Path::new(value).file_name()?.to_str()?;
    if name.is_empty() {
        return None;
    }
    Some(name.to_string())
}
