//! Country and headlines command handlers

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};

use tidings_core::news::country;
use tidings_core::{Article, Config, Country, FetchState, Headlines, NewsApiClient};

use crate::output::Output;

/// List countries whose name matches `query`
pub fn countries(query: Option<String>, output: &Output) -> Result<()> {
    let matches = country::filter(query.as_deref().unwrap_or(""));
    output.print_countries(&matches);
    Ok(())
}

/// Fetch and print the headlines for a country
pub async fn headlines(config: &Config, code: Option<String>, output: &Output) -> Result<()> {
    let country = resolve_country(config, code.as_deref())?;
    let articles = fetch(config, country).await?;
    output.print_articles(&country, &articles);
    Ok(())
}

/// Fetch the headlines and open the `index`th article (1-based)
pub async fn open_article(
    config: &Config,
    code: Option<String>,
    index: usize,
    output: &Output,
) -> Result<()> {
    let country = resolve_country(config, code.as_deref())?;
    let articles = fetch(config, country).await?;
    let article = pick(&articles, index)?;

    output.print_article(article);
    open::that(&article.url).with_context(|| format!("Failed to open {}", article.url))?;
    Ok(())
}

async fn fetch(config: &Config, country: Country) -> Result<Vec<Article>> {
    let client = NewsApiClient::from_config(config).context(
        "News API key not configured. Set it with:\n  tidings config set news_api_key <key>",
    )?;
    let headlines = Headlines::new(Arc::new(client), country);

    headlines
        .fetch(country)
        .await
        .context("Headlines task panicked")??;

    match headlines.state() {
        FetchState::Loaded(articles) => Ok(articles),
        FetchState::Failed(message) => Err(anyhow!(message)),
        FetchState::Loading => bail!("Headlines request did not finish"),
    }
}

/// The explicit `--country` flag, else the configured default
fn resolve_country(config: &Config, code: Option<&str>) -> Result<Country> {
    let code = code.unwrap_or(&config.default_country);
    Country::from_code(code).ok_or_else(|| {
        anyhow!(
            "Unknown country code '{}'. Run `tidings countries` for the list.",
            code
        )
    })
}

fn pick(articles: &[Article], index: usize) -> Result<&Article> {
    if index == 0 {
        bail!("Article numbers start at 1");
    }
    articles.get(index - 1).ok_or_else(|| {
        anyhow!(
            "No article #{} ({} article(s) loaded)",
            index,
            articles.len()
        )
    })
}
