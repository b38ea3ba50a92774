pub mod auth;
pub mod files;
pub mod search;

use anyhow::Result;
use lodestone_application::{AppSnapshot, LodestoneApp};
use lodestone_infrastructure::{ConfigService, LodestonePaths};
use std::path::Path;

use crate::render;

/// A connected app plus output preferences, shared by every command.
pub struct Context {
    pub app: LodestoneApp,
    json: bool,
}

impl Context {
    /// Loads configuration, builds the app and restores any saved session.
    pub async fn connect(api_url: Option<String>, config_dir: Option<&Path>, json: bool) -> Result<Self> {
        let paths = LodestonePaths::new(config_dir);
        let mut config = ConfigService::new(paths.clone()).get_config()?;

        if let Some(url) = api_url {
            config = config.with_base_url(url);
            config.validate()?;
        }

        let app = LodestoneApp::from_config(&config, &paths)?;
        if let Some(user) = app.start().await {
            tracing::debug!(username = %user.username, "resumed saved session");
        }

        Ok(Self { app, json })
    }

    /// Turns a flow failure into the message the app recorded for it.
    pub async fn check<T>(&self, result: lodestone_core::Result<T>) -> Result<T> {
        match result {
            Ok(value) => Ok(value),
            Err(e) => {
                let message = self
                    .app
                    .snapshot()
                    .await
                    .error
                    .unwrap_or_else(|| e.user_message());
                anyhow::bail!(message)
            }
        }
    }

    /// Fails if a flow recorded an error without returning one.
    pub async fn check_recorded(&self) -> Result<AppSnapshot> {
        let snapshot = self.app.snapshot().await;
        if let Some(message) = &snapshot.error {
            anyhow::bail!(message.clone());
        }
        Ok(snapshot)
    }

    /// Prints `text`, or the whole snapshot when JSON output was requested.
    pub async fn emit(&self, text: impl FnOnce(&AppSnapshot) -> String) -> Result<()> {
        let snapshot = self.app.snapshot().await;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        } else {
            println!("{}", render::trim_trailing(&text(&snapshot)));
        }
        Ok(())
    }
}
