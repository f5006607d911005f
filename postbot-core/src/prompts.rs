use crate::history::TopicHistory;

pub fn random_fact(recent_topics: &[String], seed_words: &[String]) -> String {
    let inspiration = if seed_words.is_empty() {
        String::new()
    } else {
        format!(
            "\nIf it helps, draw inspiration from one of these words: {}.",
            seed_words.join(", ")
        )
    };

    format!(
        r#"You are an AI that provides random interesting facts suitable for Twitter posts. Generate an interesting and little-known fact.
The fact should be concise, informative, and fit within the character limit for a tweet (280 characters). Don't use hashtags. Don't start with 'Did you know'.
Avoid repeating topics already covered in the following facts: {topics}.{inspiration}"#,
        topics = TopicHistory::prompt_list(recent_topics),
        inspiration = inspiration,
    )
}

pub fn headline_summary(articles_block: &str, recent_topics: &[String]) -> String {
    format!(
        r#"You are an AI that summarizes news. Choose the most important piece (or pieces) of news from those listed below and summarize it to a tweet format.
Be very concise and fit within the character limit for a tweet (280 characters) - Max 2/3 sentences. Don't use hashtags.
Here are the news pieces:
{articles}
Avoid repeating topics already covered recently: {topics}. If it's impossible to tweet something new write an interesting fact about politics."#,
        articles = articles_block,
        topics = TopicHistory::prompt_list(recent_topics),
    )
}

/// Prompt for the illustration attached to a fact post.
pub fn fact_illustration(fact: &str) -> String {
    format!(
        "A clean, photorealistic illustration of the following fact, with no text in the image: {}",
        fact
    )
}
