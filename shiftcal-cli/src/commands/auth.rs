use anyhow::{Result, bail};
use owo_colors::OwoColorize;

use crate::context::Context;
use crate::utils::tui;

pub async fn login(ctx: &Context, email: &str) -> Result<()> {
    let client = ctx.client()?;
    let password = rpassword::prompt_password("Password: ")?;

    let spinner = tui::create_spinner("Signing in");
    let result = client.sign_in_with_password(email, &password).await;
    spinner.finish_and_clear();

    let session = result?;
    let user = session.email.clone().unwrap_or_else(|| session.user_id.to_string());
    ctx.auth.set_session(Some(session));

    println!("{} {}", "Signed in as".green(), user.bold());
    Ok(())
}

pub async fn signup(ctx: &Context, email: &str) -> Result<()> {
    let client = ctx.client()?;
    let password = rpassword::prompt_password("Choose a password: ")?;
    let confirm = rpassword::prompt_password("Repeat password: ")?;
    if password != confirm {
        bail!("Passwords don't match");
    }

    let spinner = tui::create_spinner("Creating account");
    let result = client.sign_up(email, &password).await;
    spinner.finish_and_clear();

    match result? {
        Some(session) => {
            ctx.auth.set_session(Some(session));
            println!("{} {}", "Account created, signed in as".green(), email.bold());
        }
        None => {
            println!(
                "{}\n{}",
                "Account created.".green(),
                "Check your email to confirm it, then run: shiftcal login".dimmed()
            );
        }
    }
    Ok(())
}

pub async fn logout(ctx: &Context) -> Result<()> {
    let Some(session) = ctx.auth.current() else {
        println!("{}", "Not signed in".dimmed());
        return Ok(());
    };

    // Revoke server-side when we can; forgetting the local session is what matters
    if let Ok(client) = ctx.client() {
        if let Err(e) = client.sign_out(&session.access_token).await {
            tracing::warn!("Could not revoke session: {e}");
        }
    }

    ctx.auth.set_session(None);
    println!("{}", "Signed out".green());
    Ok(())
}
