use chrono::NaiveTime;

use super::{format_minutes, Context};
use crate::auth::{self, RegisterInput, Session};
use crate::error::Result;

pub fn cmd_register(ctx: &Context, input: RegisterInput) -> Result<()> {
    let user = auth::register(&ctx.store, &input, ctx.now())?;
    println!("Registered '{}' (id = {}). Run `planwise login` to sign in.", user.username, user.id);
    Ok(())
}

pub fn cmd_login(ctx: &Context, login: &str, password: &str) -> Result<()> {
    let user = auth::login(&ctx.store, login, password)?;
    let session = Session { user_id: user.id, username: user.username.clone(), signed_in_at: ctx.now() };
    auth::save_session(&ctx.session_file(), &session)?;
    println!("Signed in as {}.", user.username);
    Ok(())
}

pub fn cmd_logout(ctx: &Context) -> Result<()> {
    if auth::clear_session(&ctx.session_file())? {
        println!("Signed out.");
    } else {
        println!("Nobody is signed in.");
    }
    Ok(())
}

pub fn cmd_whoami(ctx: &Context) -> Result<()> {
    let user = ctx.user()?;
    let prefs = user.preferences;
    println!("{} <{}> (id = {})", user.username, user.email, user.id);
    println!(
        "Day window {}-{}, up to {} of work per day.",
        prefs.day_start.format("%H:%M"),
        prefs.day_end.format("%H:%M"),
        format_minutes(prefs.max_daily_minutes)
    );
    Ok(())
}

/// Shows preferences, or updates the ones given.
pub fn cmd_prefs(
    ctx: &Context,
    start: Option<NaiveTime>,
    end: Option<NaiveTime>,
    max_minutes: Option<u32>,
) -> Result<()> {
    let user = ctx.user()?;
    if start.is_none() && end.is_none() && max_minutes.is_none() {
        return cmd_whoami(ctx);
    }
    let mut prefs = user.preferences;
    if let Some(start) = start {
        prefs.day_start = start;
    }
    if let Some(end) = end {
        prefs.day_end = end;
    }
    if let Some(max) = max_minutes {
        prefs.max_daily_minutes = max;
    }
    let user = auth::update_preferences(&ctx.store, user.id, &prefs)?;
    let prefs = user.preferences;
    println!(
        "Preferences saved: {}-{}, max {} per day.",
        prefs.day_start.format("%H:%M"),
        prefs.day_end.format("%H:%M"),
        format_minutes(prefs.max_daily_minutes)
    );
    Ok(())
}
