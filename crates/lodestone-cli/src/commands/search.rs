use anyhow::Result;
use lodestone_core::ViewState;
use lodestone_core::search::SearchForm;

use super::Context;
use crate::render;

pub async fn run(
    ctx: &Context,
    query: String,
    collection: Option<String>,
    max_results: Option<i64>,
    score_threshold: Option<f64>,
) -> Result<()> {
    let form = SearchForm {
        query,
        collection_name: collection.unwrap_or_default(),
        max_results,
        score_threshold,
    };

    ctx.check(ctx.app.navigate(ViewState::Search).await).await?;
    let results = ctx.check(ctx.app.search(&form.to_query()).await).await?;

    ctx.emit(|_| render::search_results(&results)).await
}
