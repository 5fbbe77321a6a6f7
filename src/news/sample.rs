//! Deterministic sample dataset used when the remote lookup fails.

use chrono::{DateTime, Duration, Utc};

use super::types::Article;

/// (title, description, source). `{city}` is replaced with the city name.
const TEMPLATES: &[(&str, &str, &str)] = &[
    (
        "{city} Announces Major Infrastructure Upgrades",
        "The city council has approved a massive infrastructure project aimed at improving public transportation and road networks across {city}.",
        "City News",
    ),
    (
        "Tech Giants Expand Operations in {city}",
        "Several major technology companies have announced plans to open new offices in {city}, creating thousands of jobs.",
        "Tech Daily",
    ),
    (
        "{city}'s Tourism Industry Shows Record Growth",
        "The tourism sector in {city} has experienced unprecedented growth this quarter, with visitor numbers reaching all-time highs.",
        "Travel Weekly",
    ),
    (
        "New Green Initiatives Launched in {city}",
        "The city has unveiled ambitious plans to become carbon neutral by 2030, including new renewable energy projects.",
        "Environment Today",
    ),
    (
        "{city} Hosts International Cultural Festival",
        "A week-long celebration of arts and culture brings together performers and artists from around the world.",
        "Culture Magazine",
    ),
    (
        "{city} Public Schools Announce New STEM Programs",
        "Educational institutions in {city} are launching innovative science and technology programs to prepare students for future careers.",
        "Education News",
    ),
    (
        "{city} Housing Market Sees Continued Growth",
        "Real estate experts report strong demand and rising property values across {city} neighborhoods.",
        "Property Times",
    ),
    (
        "{city} Launches New Public Health Initiative",
        "City officials announce comprehensive wellness program aimed at improving community health outcomes.",
        "Health Today",
    ),
];

/// Number of articles in the sample dataset.
pub const SAMPLE_SIZE: usize = TEMPLATES.len();

/// Lowercase `city` and join its words with `-` ("New York" -> "new-york").
pub fn slugify(city: &str) -> String {
    city.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// Sample articles for `city`, newest first, timestamped relative to `now`.
///
/// Article `n` (1-based) has url `https://example.com/<slug>/article<n>` and
/// is published `n - 1` hours before `now`.
pub fn sample_articles_at(city: &str, now: DateTime<Utc>) -> Vec<Article> {
    let slug = slugify(city);
    TEMPLATES
        .iter()
        .enumerate()
        .map(|(i, (title, description, source))| {
            let n = i + 1;
            Article {
                title: title.replace("{city}", city),
                description: description.replace("{city}", city),
                url: format!("https://example.com/{slug}/article{n}"),
                image: format!("https://picsum.photos/400/250?random={n}"),
                published_at: now - Duration::hours(i as i64),
                source: Some((*source).to_string()),
            }
        })
        .collect()
}

/// Sample articles for `city` timestamped relative to the current time.
pub fn sample_articles(city: &str) -> Vec<Article> {
    sample_articles_at(city, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Paris"), "paris");
        assert_eq!(slugify("New York"), "new-york");
        assert_eq!(slugify("  Rio   de Janeiro "), "rio-de-janeiro");
    }

    #[test]
    fn test_sample_shape() {
        let articles = sample_articles("New York");
        assert_eq!(articles.len(), 8);
        assert_eq!(articles[0].url, "https://example.com/new-york/article1");
        assert_eq!(articles[7].url, "https://example.com/new-york/article8");
        assert_eq!(
            articles[0].title,
            "New York Announces Major Infrastructure Upgrades"
        );
        assert_eq!(articles[2].source.as_deref(), Some("Travel Weekly"));
    }

    #[test]
    fn test_timestamps_hour_apart() {
        let now = Utc::now();
        let articles = sample_articles_at("Seoul", now);
        assert_eq!(articles[0].published_at, now);
        assert_eq!(articles[3].published_at, now - Duration::hours(3));
    }

    proptest! {
        #[test]
        fn prop_deterministic_urls_and_decreasing_times(city in "[A-Za-z][A-Za-z ]{0,20}") {
            let first = sample_articles(&city);
            let second = sample_articles(&city);

            let first_urls: Vec<_> = first.iter().map(|a| a.url.clone()).collect();
            let second_urls: Vec<_> = second.iter().map(|a| a.url.clone()).collect();
            prop_assert_eq!(first_urls, second_urls);

            for pair in first.windows(2) {
                prop_assert!(pair[0].published_at > pair[1].published_at);
            }
        }

        #[test]
        fn prop_pure_for_fixed_clock(city in "\\PC{1,24}", offset in 0i64..1_000_000) {
            let now = DateTime::from_timestamp(1_700_000_000 + offset, 0).unwrap();
            prop_assert_eq!(sample_articles_at(&city, now), sample_articles_at(&city, now));
        }
    }
}
