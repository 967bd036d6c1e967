//! Keeps the profile cards in `dark_mode.svg` and `light_mode.svg` current.
//!
//! One run asks the GitHub GraphQL API for the account's repository, star,
//! commit and follower counts, optionally turns the avatar into ASCII art,
//! and writes both into the placeholder spans of each card. Cards missing
//! from disk are skipped with a warning.

pub mod ascii;
pub mod config;
pub mod github;
pub mod stats;
pub mod svg;

use anyhow::{Result, bail};
use log::{debug, info, warn};
use std::path::PathBuf;

use config::{AsciiMode, Config, MissingToken};
use github::Fetcher;
use stats::Stats;

/// What happened to each configured card.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Report {
    pub stats: Option<Stats>,
    pub ascii_lines: usize,
    pub updated: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

/// Fetch, render, aggregate and patch, in that order.
pub async fn run<F: Fetcher>(config: &Config, fetcher: &F) -> Result<Report> {
    info!("Fetching GitHub data for {}...", config.login);

    let Some(user) = fetcher.fetch_user(&config.login).await? else {
        match config.on_missing_token {
            MissingToken::Abort => {
                bail!("Failed to fetch GitHub data: GH_TOKEN is not set")
            }
            MissingToken::Placeholder => {
                warn!("GH_TOKEN not set. Using placeholder values.");
                return patch_targets(config, Stats::placeholder(), None);
            }
        }
    };

    let art = match &user.avatar_url {
        Some(url) => avatar_art(fetcher, url, config.ascii).await,
        None => None,
    };

    let stats = Stats::from_user(&user);
    info!(
        "Stats: repos={} commits={} stars={} followers={}",
        stats.repos, stats.commits, stats.stars, stats.followers
    );
    if let Some(following) = &user.following {
        debug!("Following: {}", following.total_count);
    }

    patch_targets(config, stats, art)
}

/// Art rows for the avatar, or `None` whenever they can't be produced.
async fn avatar_art<F: Fetcher>(fetcher: &F, url: &str, mode: AsciiMode) -> Option<Vec<String>> {
    if mode == AsciiMode::Off {
        return None;
    }
    if !ascii::is_available() {
        warn!("Image support not compiled in, leaving ASCII art unchanged");
        return None;
    }

    info!("Generating ASCII art from: {url}");
    let rendered = match fetcher.fetch_bytes(url).await {
        Ok(bytes) => ascii::render(&bytes, mode),
        Err(e) => Err(e),
    };

    match rendered {
        Ok(lines) => {
            info!("Generated ASCII art with {} lines", lines.len());
            Some(lines)
        }
        Err(e) => {
            warn!("Skipping ASCII art: {e:#}");
            None
        }
    }
}

fn patch_targets(config: &Config, stats: Stats, art: Option<Vec<String>>) -> Result<Report> {
    let mut report = Report {
        ascii_lines: art.as_ref().map_or(0, Vec::len),
        ..Report::default()
    };

    for path in &config.targets {
        if path.exists() {
            svg::update_file(path, &stats, art.as_deref())?;
            info!("Updated {}", path.display());
            report.updated.push(path.clone());
        } else {
            warn!("{} not found", path.display());
            report.skipped.push(path.clone());
        }
    }

    info!("Done!");
    report.stats = Some(stats);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::User;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const CARD: &str = r#"<svg>
<text x="30" y="55" class="ascii-art ascii">
  </text>
<tspan class="stat-value" id="repos">-</tspan>
<tspan class="stat-value" id="commits">-</tspan>
<tspan class="stat-value" id="stars">-</tspan>
<tspan class="stat-value" id="followers">-</tspan>
</svg>
"#;

    /// Canned answers and a count of every call made.
    struct FakeFetcher {
        user: Option<serde_json::Value>,
        avatar: Result<Vec<u8>, String>,
        calls: AtomicUsize,
    }

    impl FakeFetcher {
        fn with_user(user: serde_json::Value) -> Self {
            Self {
                user: Some(user),
                avatar: Err("no avatar".to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn without_token() -> Self {
            Self {
                user: None,
                avatar: Err("no avatar".to_string()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Fetcher for FakeFetcher {
        async fn fetch_user(&self, _login: &str) -> Result<Option<User>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(match &self.user {
                Some(json) => Some(serde_json::from_value(json.clone())?),
                None => None,
            })
        }

        async fn fetch_bytes(&self, _url: &str) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.avatar.clone().map_err(|e| anyhow!(e))
        }
    }

    fn user_json() -> serde_json::Value {
        serde_json::json!({
            "avatarUrl": "https://example.invalid/avatar.png",
            "repositories": {
                "totalCount": 3,
                "nodes": [{"stargazerCount": 5}, {"stargazerCount": 0}, {"stargazerCount": 12}]
            },
            "contributionsCollection": {
                "totalCommitContributions": 12000,
                "restrictedContributionsCount": 345
            },
            "followers": {"totalCount": 8},
            "following": {"totalCount": 1}
        })
    }

    fn config_in(dir: &std::path::Path) -> Config {
        let mut config = Config::new(None);
        config.targets = vec![dir.join("dark_mode.svg"), dir.join("light_mode.svg")];
        config
    }

    #[tokio::test]
    async fn missing_card_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        fs::write(&config.targets[1], CARD).unwrap();

        let report = run(&config, &FakeFetcher::with_user(user_json()))
            .await
            .unwrap();

        assert_eq!(report.updated, vec![config.targets[1].clone()]);
        assert_eq!(report.skipped, vec![config.targets[0].clone()]);
        assert!(!config.targets[0].exists());

        let light = fs::read_to_string(&config.targets[1]).unwrap();
        assert!(light.contains(r#"id="commits">12,345</tspan>"#));
        assert!(light.contains(r#"id="stars">17</tspan>"#));
    }

    #[tokio::test]
    async fn failed_avatar_download_keeps_stats() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        fs::write(&config.targets[0], CARD).unwrap();

        let report = run(&config, &FakeFetcher::with_user(user_json()))
            .await
            .unwrap();

        assert_eq!(report.ascii_lines, 0);
        let dark = fs::read_to_string(&config.targets[0]).unwrap();
        assert!(dark.contains(r#"id="repos">3</tspan>"#));
        assert!(dark.contains("<text x=\"30\" y=\"55\" class=\"ascii-art ascii\">\n  </text>"));
    }

    #[tokio::test]
    async fn ascii_off_never_downloads() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.ascii = AsciiMode::Off;
        let fetcher = FakeFetcher::with_user(user_json());

        run(&config, &fetcher).await.unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_token_aborts_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        fs::write(&config.targets[0], CARD).unwrap();

        let err = run(&config, &FakeFetcher::without_token())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("GH_TOKEN"));
        assert_eq!(fs::read_to_string(&config.targets[0]).unwrap(), CARD);
    }

    #[tokio::test]
    async fn missing_token_placeholder_writes_tildes() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.on_missing_token = MissingToken::Placeholder;
        fs::write(&config.targets[0], CARD).unwrap();
        let fetcher = FakeFetcher::without_token();

        let report = run(&config, &fetcher).await.unwrap();

        assert_eq!(report.stats, Some(Stats::placeholder()));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        let dark = fs::read_to_string(&config.targets[0]).unwrap();
        for id in ["repos", "commits", "stars", "followers"] {
            assert!(dark.contains(&format!(r#"id="{id}">~</tspan>"#)));
        }
    }

    #[tokio::test]
    async fn malformed_user_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let fetcher = FakeFetcher::with_user(serde_json::json!({ "followers": {"totalCount": 1} }));

        assert!(run(&config, &fetcher).await.is_err());
    }
}
