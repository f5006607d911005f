//! Headlines: summarize the current top news into one post, steering away
//! from stories covered recently.

use postbot_core::{
    error::Result,
    news::{self, Article},
    prompts, ContentGenerator, PostbotError, Posted, SocialPoster, TopicHistory,
};

use crate::context::JobContext;

pub async fn run(ctx: &JobContext) -> Result<Posted> {
    let cfg = &ctx.config.headlines;

    let poster = ctx.poster().await?;
    let generator = ctx.generator().await?;
    let news = ctx.news().await?;
    let history = ctx.history(&cfg.history);

    let recent = history.load().await?;
    let articles = news.top_headlines(&cfg.sources, cfg.article_limit).await?;
    if articles.is_empty() {
        return Err(PostbotError::NoContentFound(format!(
            "No headlines available from {}",
            cfg.sources
        )));
    }

    summarize_and_post(&history, &recent, &articles, &generator, &poster, &cfg.model).await
}

pub async fn summarize_and_post(
    history: &TopicHistory,
    recent: &[String],
    articles: &[Article],
    generator: &dyn ContentGenerator,
    poster: &dyn SocialPoster,
    model: &str,
) -> Result<Posted> {
    let prompt = prompts::headline_summary(&news::format_articles(articles), recent);

    let summary = generator
        .complete(&prompt, model)
        .await?
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            PostbotError::NoContentFound("The model returned no summary.".to_string())
        })?;

    let updated = history.remember(&summary, recent);
    let posted = poster.post_text(&summary).await?;

    if let Some(updated) = updated {
        history.persist(&updated).await?;
    }
    Ok(posted)
}
