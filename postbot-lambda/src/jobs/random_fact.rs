//! Random fact: a little-known fact the recent history has not covered,
//! optionally illustrated.

use postbot_core::{
    error::Result, media::ImageFetcher, prompts, ContentGenerator, ImageOptions, PostbotError,
    Posted, SocialPoster, TopicHistory,
};

use super::{generated_media, publish};
use crate::context::JobContext;

/// Image settings for an illustrated post.
pub struct Illustration<'a> {
    pub fetcher: &'a ImageFetcher,
    pub options: ImageOptions,
}

pub async fn run(ctx: &JobContext) -> Result<Posted> {
    let cfg = &ctx.config.random_fact;

    let poster = ctx.poster().await?;
    let generator = ctx.generator().await?;
    let history = ctx.history(&cfg.history);

    let seed_words = if cfg.seed_words > 0 {
        ctx.words()?.words(cfg.seed_words).await?
    } else {
        Vec::new()
    };

    let fetcher = ctx.images()?;
    let illustration = cfg.generate_image.then(|| Illustration {
        fetcher: &fetcher,
        options: ctx.image_options(),
    });

    generate_and_post(
        &history,
        &generator,
        &poster,
        &cfg.model,
        &seed_words,
        illustration,
    )
    .await
}

pub async fn generate_and_post(
    history: &TopicHistory,
    generator: &dyn ContentGenerator,
    poster: &dyn SocialPoster,
    model: &str,
    seed_words: &[String],
    illustration: Option<Illustration<'_>>,
) -> Result<Posted> {
    let recent = history.load().await?;
    let prompt = prompts::random_fact(&recent, seed_words);
    tracing::debug!(prompt = %prompt, "Built random fact prompt");

    let fact = generator
        .complete(&prompt, model)
        .await?
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| PostbotError::NoContentFound("The model returned no fact.".to_string()))?;

    let updated = history.remember(&fact, &recent);

    let posted = match illustration {
        Some(ill) => {
            let media = generated_media(
                generator,
                ill.fetcher,
                poster,
                &prompts::fact_illustration(&fact),
                &ill.options,
            )
            .await;
            publish(poster, &fact, media).await?
        }
        None => poster.post_text(&fact).await?,
    };

    if let Some(updated) = updated {
        history.persist(&updated).await?;
    }

    Ok(posted)
}
