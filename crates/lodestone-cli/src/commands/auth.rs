use anyhow::Result;
use lodestone_core::ViewState;
use lodestone_core::session::{AuthFlow, LoginRequest, RegisterRequest};

use super::Context;
use crate::render;

pub async fn login(ctx: &Context, username: String, password: String) -> Result<()> {
    ctx.check(ctx.app.navigate(ViewState::Login).await).await?;
    let user = ctx
        .check(
            ctx.app
                .submit_auth(AuthFlow::Login(LoginRequest::new(username, password)))
                .await,
        )
        .await?;

    ctx.emit(|_| format!("Signed in as {}", user.username)).await
}

pub async fn register(ctx: &Context, email: String, username: String, password: String) -> Result<()> {
    ctx.check(ctx.app.navigate(ViewState::Register).await).await?;
    let user = ctx
        .check(
            ctx.app
                .submit_auth(AuthFlow::Register(RegisterRequest::new(email, username, password)))
                .await,
        )
        .await?;

    ctx.emit(|_| format!("Account created. Signed in as {}", user.username))
        .await
}

pub async fn logout(ctx: &Context) -> Result<()> {
    ctx.app.logout().await;
    ctx.emit(|_| "Signed out".to_string()).await
}

pub async fn whoami(ctx: &Context) -> Result<()> {
    ctx.emit(render::identity).await
}
