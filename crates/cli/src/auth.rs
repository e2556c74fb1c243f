use anyhow::{Context, Result};
use dialoguer::{Input, Password};

use crate::context::AppContext;

pub async fn run_login(username: Option<String>, password: Option<String>) -> Result<()> {
    let ctx = AppContext::load()?;

    let username = match username {
        Some(name) => name,
        None => Input::<String>::new()
            .with_prompt("Username")
            .interact_text()
            .context("read username")?,
    };
    let password = match password {
        Some(secret) => secret,
        None => Password::new()
            .with_prompt("Password")
            .interact()
            .context("read password")?,
    };

    ctx.client.login(&username, &password).await?;
    println!("Logged in to {} as {}.", ctx.config.server.url, username.trim());
    Ok(())
}

pub async fn run_logout() -> Result<()> {
    let ctx = AppContext::load()?;
    if !ctx.client.session().is_authenticated() {
        println!("Not logged in.");
        return Ok(());
    }
    ctx.client.logout().await;
    println!("Logged out.");
    Ok(())
}
