use crate::app::{AppContext, Result};
use crate::domain::{ScrapeSelectors, Source, SourceInput, SourceMode, SourcePatch};
use crate::scraper;
use crate::store::KvStore;

pub async fn run(ctx: &AppContext) -> Result<()> {
    let report = ctx.orchestrator.run().await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub async fn add_source(ctx: &AppContext, input: SourceInput) -> Result<()> {
    let source = ctx.registry.add(input).await?;
    println!("Added source {}", source.id);
    print_source(&source);
    Ok(())
}

pub async fn update_source(ctx: &AppContext, id: &str, patch: SourcePatch) -> Result<()> {
    let source = ctx.registry.update(id, patch).await?;
    println!("Updated source {}", source.id);
    print_source(&source);
    Ok(())
}

pub async fn remove_source(ctx: &AppContext, id: &str) -> Result<()> {
    let source = ctx.registry.remove(id).await?;
    println!("Removed source: {} ({})", source.title, source.url);
    Ok(())
}

pub async fn list_sources(ctx: &AppContext, json: bool) -> Result<()> {
    let sources = ctx.registry.list().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sources)?);
        return Ok(());
    }

    if sources.is_empty() {
        println!("No sources");
        return Ok(());
    }

    for source in &sources {
        print_source(source);
    }
    Ok(())
}

pub async fn preview(
    ctx: &AppContext,
    url: &str,
    selectors: ScrapeSelectors,
    limit: usize,
) -> Result<()> {
    let items = scraper::preview(ctx.fetcher.as_ref(), url, &selectors, limit).await?;

    if items.is_empty() {
        println!("No items");
        return Ok(());
    }

    for (i, item) in items.iter().enumerate() {
        println!("{}. {}\n   {}", i + 1, item.title, item.link);
        if let Some(summary) = &item.summary {
            println!("   {}", summary);
        }
    }
    Ok(())
}

pub async fn purge(ctx: &AppContext) -> Result<()> {
    let removed = ctx.store.purge_expired().await?;
    println!("Removed {} expired entries", removed);
    Ok(())
}

fn print_source(source: &Source) {
    let mode = match &source.mode {
        SourceMode::Syndication => "feed".to_string(),
        SourceMode::Scrape(sel) => format!(
            "scrape: title=\"{}\" link=\"{}\"{}",
            sel.title_selector,
            sel.link_selector,
            sel.description()
                .map(|d| format!(" description=\"{}\"", d))
                .unwrap_or_default()
        ),
    };

    println!("{} [{}]", source.title, source.group_label());
    println!("  id:       {}", source.id);
    println!("  url:      {}", source.url);
    println!("  mode:     {}", mode);
    println!("  interval: {} min", source.effective_interval());
    if let Some(prefix) = source.link_prefix() {
        println!("  prefix:   {}", prefix);
    }
    match (&source.last_run_at, &source.last_run_summary) {
        (Some(at), Some(summary)) => {
            println!("  last run: {} | {}", at.format("%Y-%m-%d %H:%M"), summary)
        }
        (Some(at), None) => println!("  last run: {}", at.format("%Y-%m-%d %H:%M")),
        (None, Some(summary)) => println!("  last run: never | {}", summary),
        (None, None) => println!("  last run: never"),
    }
}
