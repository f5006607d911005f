//! Wikimedia: post a random Wikipedia article with its lead image.

use postbot_core::{
    error::Result,
    media::ImageFetcher,
    wikipedia::{RandomPage, WikipediaClient},
    PostbotError, Posted, SocialPoster,
};

use super::{media_from_url, publish};
use crate::context::JobContext;

pub async fn run(ctx: &JobContext) -> Result<Posted> {
    let poster = ctx.poster().await?;
    let wikipedia = ctx.wikipedia()?;
    let fetcher = ctx.images()?;

    post_random_page(&wikipedia, &fetcher, &poster).await
}

pub async fn post_random_page(
    wikipedia: &WikipediaClient,
    fetcher: &ImageFetcher,
    poster: &dyn SocialPoster,
) -> Result<Posted> {
    let page = wikipedia.random_page().await?;
    let image_url = page.image_url.clone().ok_or_else(|| {
        PostbotError::NoContentFound("No image URL found for the article.".to_string())
    })?;
    tracing::info!(title = %page.title, "Picked random article");

    let text = post_text(&page);
    let media = media_from_url(fetcher, poster, &image_url).await;
    publish(poster, &text, media).await
}

pub fn post_text(page: &RandomPage) -> String {
    format!(
        "Today's image: {}, \n{} \n\nRead more at: {}",
        page.title,
        page.description.as_deref().unwrap_or_default(),
        page.link
    )
}
