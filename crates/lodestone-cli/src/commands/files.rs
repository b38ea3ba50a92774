use anyhow::{Context as _, Result};
use lodestone_core::ViewState;
use lodestone_core::files::UploadFile;
use std::path::Path;

use super::Context;
use crate::render;

pub async fn list(ctx: &Context) -> Result<()> {
    ctx.check(ctx.app.navigate(ViewState::Files).await).await?;
    ctx.check_recorded().await?;
    ctx.emit(|snapshot| render::files_table(&snapshot.files)).await
}

pub async fn upload(ctx: &Context, path: &Path) -> Result<()> {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} is not a file path", path.display()))?;
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let record = ctx
        .check(ctx.app.upload(UploadFile::new(filename, bytes)).await)
        .await?;

    ctx.emit(|snapshot| {
        format!(
            "Uploaded {} (id {})\n\n{}",
            record.original_filename,
            record.id,
            render::files_table(&snapshot.files)
        )
    })
    .await
}

pub async fn delete(ctx: &Context, id: i64) -> Result<()> {
    ctx.check(ctx.app.delete_file(id).await).await?;
    ctx.emit(|snapshot| format!("Deleted file {}\n\n{}", id, render::files_table(&snapshot.files)))
        .await
}

pub async fn download(ctx: &Context, id: i64, name: Option<String>) -> Result<()> {
    let file = ctx
        .check(ctx.app.download(id, name.as_deref().unwrap_or_default()).await)
        .await?;

    ctx.emit(|_| format!("Downloaded {} ({} bytes)", file.filename, file.bytes.len()))
        .await
}
