//! Posting jobs. Each run produces at most one post.

pub mod headlines;
pub mod random_fact;
pub mod wikimedia;
pub mod year_progress;

use postbot_core::{
    error::Result, media::ImageFetcher, ContentGenerator, ImageOptions, Posted, SocialPoster,
};

/// Result of the optional image pipeline. `TextOnly` is the degraded mode:
/// the post still goes out, without media.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaOutcome {
    Attached(String),
    TextOnly(String),
}

/// Download `url` and upload it as media. Any failure yields `TextOnly`.
pub async fn media_from_url(
    fetcher: &ImageFetcher,
    poster: &dyn SocialPoster,
    url: &str,
) -> MediaOutcome {
    let data = match fetcher.download(url).await {
        Ok(d) => d,
        Err(e) => return MediaOutcome::TextOnly(format!("image download failed: {}", e)),
    };
    match poster.upload_media(data).await {
        Ok(media_id) => MediaOutcome::Attached(media_id),
        Err(e) => MediaOutcome::TextOnly(format!("media upload failed: {}", e)),
    }
}

/// Generate an image for `prompt`, then download and upload it.
pub async fn generated_media(
    generator: &dyn ContentGenerator,
    fetcher: &ImageFetcher,
    poster: &dyn SocialPoster,
    prompt: &str,
    options: &ImageOptions,
) -> MediaOutcome {
    match generator.generate_image(prompt, options).await {
        Ok(url) => media_from_url(fetcher, poster, &url).await,
        Err(e) => MediaOutcome::TextOnly(format!("image generation failed: {}", e)),
    }
}

/// Post `text`, attaching media when the pipeline produced some.
pub async fn publish(poster: &dyn SocialPoster, text: &str, media: MediaOutcome) -> Result<Posted> {
    match media {
        MediaOutcome::Attached(media_id) => poster.post_text_with_media(text, &media_id).await,
        MediaOutcome::TextOnly(reason) => {
            tracing::warn!(reason = %reason, "Falling back to text-only post");
            poster.post_text(text).await
        }
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    //! In-process collaborators for job unit tests.

    use async_trait::async_trait;
    use bytes::Bytes;
    use postbot_core::{
        error::Result, ContentGenerator, ImageOptions, PostbotError, Posted, SocialPoster,
    };
    use std::sync::Mutex;

    pub struct FakeGenerator {
        pub text: Option<String>,
        pub image: std::result::Result<String, u16>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl FakeGenerator {
        pub fn replying(text: &str) -> Self {
            Self {
                text: Some(text.to_string()),
                image: Err(500),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn last_prompt(&self) -> String {
            self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl ContentGenerator for FakeGenerator {
        async fn complete(&self, prompt: &str, _model: &str) -> Result<Option<String>> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.text.clone())
        }

        async fn generate_image(&self, _prompt: &str, _options: &ImageOptions) -> Result<String> {
            self.image.clone().map_err(|status| PostbotError::UpstreamApi {
                service: "OpenAI",
                status,
                body: "image generation unavailable".to_string(),
            })
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    #[derive(Default)]
    pub struct FakePoster {
        pub fail_post_with: Option<u16>,
        pub fail_upload: bool,
        pub posts: Mutex<Vec<(String, Option<String>)>>,
    }

    impl FakePoster {
        pub fn posts(&self) -> Vec<(String, Option<String>)> {
            self.posts.lock().unwrap().clone()
        }

        fn record(&self, text: &str, media_id: Option<&str>) -> Result<Posted> {
            if let Some(status) = self.fail_post_with {
                return Err(PostbotError::UpstreamApi {
                    service: "X",
                    status,
                    body: "Forbidden".to_string(),
                });
            }
            let mut posts = self.posts.lock().unwrap();
            posts.push((text.to_string(), media_id.map(str::to_string)));
            let id = posts.len().to_string();
            Ok(Posted {
                id: id.clone(),
                status: 201,
                response: serde_json::json!({ "data": { "id": id, "text": text } }),
            })
        }
    }

    #[async_trait]
    impl SocialPoster for FakePoster {
        async fn post_text(&self, text: &str) -> Result<Posted> {
            self.record(text, None)
        }

        async fn upload_media(&self, _data: Bytes) -> Result<String> {
            if self.fail_upload {
                return Err(PostbotError::UpstreamApi {
                    service: "X media upload",
                    status: 400,
                    body: "bad media".to_string(),
                });
            }
            Ok("media-1".to_string())
        }

        async fn post_text_with_media(&self, text: &str, media_id: &str) -> Result<Posted> {
            self.record(text, Some(media_id))
        }
    }
}
