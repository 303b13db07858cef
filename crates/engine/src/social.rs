//! Social feed analytics: hashtag and mention tallies, word-list sentiment and
//! topic summaries.
//!
//! Topic counts and sentiment are deterministic placeholders built from the
//! posts at hand, not a real model.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use rugradar_clients::SocialDataSource;
use rugradar_common::error::AppError;
use rugradar_common::types::{
    HashtagCount, MentionCount, Post, Sentiment, SocialData, TopicSummary, TrendTopic,
};

pub const SEARCH_QUERY: &str = "solana OR #solana OR #sol";
pub const SEARCH_COUNT: usize = 20;

/// Worldwide trends.
pub const TRENDS_WOEID: u32 = 1;

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "awesome", "excellent", "bullish", "moon", "profit", "gain", "up",
];
const NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "awful", "bearish", "crash", "dump", "rug", "scam", "down",
];

const CRYPTO_TERMS: &[&str] = &["crypto", "bitcoin", "solana", "nft"];

/// Fixed ecosystem topics and the keywords that attribute a post to them.
const ECOSYSTEM_TOPICS: &[(&str, &[&str])] = &[
    ("Solana Ecosystem", &["solana", "sol", "defi", "ecosystem"]),
    ("SOL Price", &["$sol", "price", "pump", "ath", "usd"]),
    ("Solana NFTs", &["nft", "nfts", "mint", "collection"]),
];

/// Derives social summaries from the feed source.
pub struct SocialAnalyzer {
    social: Arc<dyn SocialDataSource>,
}

impl SocialAnalyzer {
    pub fn new(social: Arc<dyn SocialDataSource>) -> Self {
        Self { social }
    }

    /// Recent ecosystem posts with their tallies and topic summaries.
    pub async fn social_data(&self) -> Result<SocialData, AppError> {
        let tweets = self.social.search_posts(SEARCH_QUERY, SEARCH_COUNT).await?;
        let (hashtags, mentions) = Self::tally(&tweets);
        let topics = Self::ecosystem_topics(&tweets, Utc::now());

        tracing::info!(
            posts = tweets.len(),
            hashtags = hashtags.len(),
            mentions = mentions.len(),
            "Social data refreshed"
        );
        Ok(SocialData {
            tweets,
            hashtags,
            mentions,
            topics,
        })
    }

    /// Crypto related entries from the worldwide trends.
    pub async fn trending_topics(&self) -> Result<Vec<TopicSummary>, AppError> {
        let trends = self.social.trending_topics(TRENDS_WOEID).await?;
        let topics = Self::crypto_topics(&trends, Utc::now());
        tracing::info!(trends = trends.len(), crypto = topics.len(), "Trending topics refreshed");
        Ok(topics)
    }

    /// Hashtag and mention counts, highest count first, ties by name.
    pub fn tally(posts: &[Post]) -> (Vec<HashtagCount>, Vec<MentionCount>) {
        let mut hashtags: HashMap<&str, u64> = HashMap::new();
        let mut mentions: HashMap<&str, u64> = HashMap::new();

        for post in posts {
            for tag in &post.hashtags {
                *hashtags.entry(tag.as_str()).or_default() += 1;
            }
            for mention in &post.mentions {
                *mentions.entry(mention.as_str()).or_default() += 1;
            }
        }

        let hashtags = ranked(hashtags)
            .into_iter()
            .map(|(hashtag, count)| HashtagCount { hashtag, count })
            .collect();
        let mentions = ranked(mentions)
            .into_iter()
            .map(|(mention, count)| MentionCount { mention, count })
            .collect();
        (hashtags, mentions)
    }

    /// Placeholder sentiment from fixed positive and negative word lists.
    pub fn sentiment(text: &str) -> Sentiment {
        let mut score: i64 = 0;
        for word in words(text) {
            if POSITIVE_WORDS.contains(&word.as_str()) {
                score += 1;
            }
            if NEGATIVE_WORDS.contains(&word.as_str()) {
                score -= 1;
            }
        }

        match score {
            s if s > 0 => Sentiment::Positive,
            s if s < 0 => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }

    /// The fixed ecosystem topics, counted over the posts that mention them.
    pub fn ecosystem_topics(posts: &[Post], now: DateTime<Utc>) -> Vec<TopicSummary> {
        ECOSYSTEM_TOPICS
            .iter()
            .map(|(topic, keywords)| {
                let matching: Vec<&Post> = posts
                    .iter()
                    .filter(|post| mentions_any(post, keywords))
                    .collect();
                TopicSummary {
                    topic: topic.to_string(),
                    tweet_count: matching.len() as u64,
                    change_24h: 0,
                    sentiment: majority(matching.iter().map(|p| Self::sentiment(&p.content))),
                    last_updated: now,
                }
            })
            .collect()
    }

    /// Keep trends about crypto, bitcoin, solana or NFTs.
    pub fn crypto_topics(trends: &[TrendTopic], now: DateTime<Utc>) -> Vec<TopicSummary> {
        trends
            .iter()
            .filter(|trend| {
                let name = trend.name.to_lowercase();
                CRYPTO_TERMS.iter().any(|term| name.contains(term))
            })
            .map(|trend| TopicSummary {
                topic: trend.name.clone(),
                tweet_count: trend.tweet_volume.unwrap_or(0),
                change_24h: 0,
                sentiment: Self::sentiment(&trend.name),
                last_updated: now,
            })
            .collect()
    }
}

fn ranked(counts: HashMap<&str, u64>) -> Vec<(String, u64)> {
    let mut entries: Vec<(String, u64)> = counts
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries
}

/// Lowercased words with surrounding punctuation stripped.
fn words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric() && c != '$')
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

fn mentions_any(post: &Post, keywords: &[&str]) -> bool {
    let in_text = words(&post.content)
        .iter()
        .any(|w| keywords.contains(&w.as_str()));
    in_text
        || post
            .hashtags
            .iter()
            .any(|tag| keywords.contains(&tag.to_lowercase().as_str()))
}

fn majority(sentiments: impl Iterator<Item = Sentiment>) -> Sentiment {
    let (mut positive, mut negative) = (0usize, 0usize);
    for sentiment in sentiments {
        match sentiment {
            Sentiment::Positive => positive += 1,
            Sentiment::Negative => negative += 1,
            Sentiment::Neutral => {}
        }
    }
    match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: &str, content: &str, hashtags: &[&str], mentions: &[&str]) -> Post {
        Post {
            id: id.to_string(),
            author: "Author".to_string(),
            author_handle: "author".to_string(),
            content: content.to_string(),
            timestamp: "Wed Oct 10 20:19:24 +0000 2024".to_string(),
            likes: 0,
            reposts: 0,
            hashtags: hashtags.iter().map(|s| s.to_string()).collect(),
            mentions: mentions.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn trend(name: &str, volume: Option<u64>) -> TrendTopic {
        TrendTopic {
            name: name.to_string(),
            url: format!("https://example.com/{}", name),
            query: name.to_string(),
            tweet_volume: volume,
        }
    }

    #[test]
    fn test_sentiment_word_lists() {
        assert_eq!(SocialAnalyzer::sentiment("SOL to the moon, bullish!"), Sentiment::Positive);
        assert_eq!(SocialAnalyzer::sentiment("This is a rug. Total scam"), Sentiment::Negative);
        assert_eq!(SocialAnalyzer::sentiment("great launch but a bad dump"), Sentiment::Negative);
        assert_eq!(SocialAnalyzer::sentiment("good and bad"), Sentiment::Neutral);
        assert_eq!(SocialAnalyzer::sentiment(""), Sentiment::Neutral);
    }

    #[test]
    fn test_tally_orders_by_count_then_name() {
        let posts = vec![
            post("1", "", &["solana", "bonk"], &["toly"]),
            post("2", "", &["solana", "jup"], &["raj", "toly"]),
            post("3", "", &["bonk"], &[]),
        ];
        let (hashtags, mentions) = SocialAnalyzer::tally(&posts);

        let tags: Vec<(&str, u64)> = hashtags.iter().map(|h| (h.hashtag.as_str(), h.count)).collect();
        assert_eq!(tags, vec![("bonk", 2), ("solana", 2), ("jup", 1)]);

        let names: Vec<(&str, u64)> = mentions.iter().map(|m| (m.mention.as_str(), m.count)).collect();
        assert_eq!(names, vec![("toly", 2), ("raj", 1)]);
    }

    #[test]
    fn test_ecosystem_topics_are_fixed_and_counted() {
        let posts = vec![
            post("1", "Solana defi is great", &[], &[]),
            post("2", "$SOL price looking bullish", &[], &[]),
            post("3", "new mint dropped", &["NFT"], &[]),
            post("4", "unrelated", &[], &[]),
        ];
        let now = Utc::now();
        let topics = SocialAnalyzer::ecosystem_topics(&posts, now);

        let names: Vec<&str> = topics.iter().map(|t| t.topic.as_str()).collect();
        assert_eq!(names, vec!["Solana Ecosystem", "SOL Price", "Solana NFTs"]);
        assert_eq!(topics[0].tweet_count, 1);
        assert_eq!(topics[0].sentiment, Sentiment::Positive);
        assert_eq!(topics[1].tweet_count, 1);
        assert_eq!(topics[2].tweet_count, 1);
        assert_eq!(topics[2].sentiment, Sentiment::Neutral);
        assert!(topics.iter().all(|t| t.change_24h == 0 && t.last_updated == now));
    }

    #[test]
    fn test_ecosystem_topics_with_no_posts() {
        let topics = SocialAnalyzer::ecosystem_topics(&[], Utc::now());
        assert_eq!(topics.len(), 3);
        assert!(topics.iter().all(|t| t.tweet_count == 0));
        assert!(topics.iter().all(|t| t.sentiment == Sentiment::Neutral));
    }

    #[test]
    fn test_crypto_topics_filter() {
        let trends = vec![
            trend("#Bitcoin", Some(120_000)),
            trend("Football", Some(900_000)),
            trend("Solana crash", None),
            trend("CryptoNews", Some(4_000)),
            trend("#NFTs", None),
        ];
        let topics = SocialAnalyzer::crypto_topics(&trends, Utc::now());

        let names: Vec<&str> = topics.iter().map(|t| t.topic.as_str()).collect();
        assert_eq!(names, vec!["#Bitcoin", "Solana crash", "CryptoNews", "#NFTs"]);
        assert_eq!(topics[0].tweet_count, 120_000);
        assert_eq!(topics[1].tweet_count, 0);
        assert_eq!(topics[1].sentiment, Sentiment::Negative);
    }
}
