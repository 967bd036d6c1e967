use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;

const USER_AGENT: &str = "profile-stats";

/// One request for everything the cards need. Only the first page of 100
/// repositories is read.
const USER_QUERY: &str = r#"
query($login: String!) {
  user(login: $login) {
    avatarUrl
    repositories(first: 100, ownerAffiliations: OWNER, isFork: false) {
      totalCount
      nodes {
        stargazerCount
      }
    }
    contributionsCollection {
      totalCommitContributions
      restrictedContributionsCount
    }
    followers {
      totalCount
    }
    following {
      totalCount
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
pub struct CountObj {
    #[serde(rename = "totalCount")]
    pub total_count: u64,
}

#[derive(Debug, Deserialize)]
pub struct StarNode {
    #[serde(rename = "stargazerCount")]
    pub stargazer_count: u64,
}

#[derive(Debug, Deserialize)]
pub struct Repositories {
    #[serde(rename = "totalCount")]
    pub total_count: u64,
    #[serde(default)]
    pub nodes: Vec<StarNode>,
}

#[derive(Debug, Deserialize)]
pub struct ContributionsCollection {
    #[serde(rename = "totalCommitContributions")]
    pub total_commit_contributions: u64,
    #[serde(rename = "restrictedContributionsCount")]
    pub restricted_contributions_count: u64,
}

/// The `user` object exactly as the API returns it.
#[derive(Debug, Deserialize)]
pub struct User {
    #[serde(rename = "avatarUrl")]
    pub avatar_url: Option<String>,
    pub repositories: Repositories,
    #[serde(rename = "contributionsCollection")]
    pub contributions_collection: ContributionsCollection,
    pub followers: CountObj,
    pub following: Option<CountObj>,
}

/// Network access needed by a run. Swapped for a fake in tests.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Raw user statistics, or `None` when there is no credential to ask with.
    async fn fetch_user(&self, login: &str) -> Result<Option<User>>;

    /// Body of a plain GET, used for the avatar image.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

pub struct GithubClient {
    token: Option<SecretString>,
    endpoint: String,
    http: Client,
}

impl GithubClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            token: config
                .token
                .as_ref()
                .map(|t| SecretString::new(t.expose_secret().clone())),
            endpoint: config.api_url.clone(),
            http,
        })
    }

    /// Single GraphQL POST with status and `errors` checking. No retries.
    async fn graphql(&self, token: &SecretString, query: &str, variables: Value) -> Result<Value> {
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(token.expose_secret())
            .json(&serde_json::json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|e| anyhow!("Network error sending GraphQL request: {e}"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!(
                "GitHub API returned HTTP {}: {}",
                status.as_u16(),
                body.trim()
            ));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse JSON from GitHub: {e}"))?;

        if let Some(errors) = json.get("errors") {
            return Err(anyhow!("GraphQL reported errors: {errors:#}"));
        }

        Ok(json)
    }
}

#[async_trait]
impl Fetcher for GithubClient {
    async fn fetch_user(&self, login: &str) -> Result<Option<User>> {
        let Some(token) = &self.token else {
            return Ok(None);
        };

        #[derive(Deserialize)]
        struct UserResponse {
            data: Option<UserData>,
        }
        #[derive(Deserialize)]
        struct UserData {
            user: Option<User>,
        }

        let json = self
            .graphql(token, USER_QUERY, serde_json::json!({ "login": login }))
            .await?;
        let parsed: UserResponse =
            serde_json::from_value(json).context("Failed to deserialize user stats response")?;

        let user = parsed
            .data
            .and_then(|d| d.user)
            .ok_or_else(|| anyhow!("GitHub returned no user for login {login:?}"))?;
        debug!(
            "{login}: {} repos on first page, avatar {:?}",
            user.repositories.nodes.len(),
            user.avatar_url
        );

        Ok(Some(user))
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("Network error downloading {url}"))?
            .error_for_status()
            .with_context(|| format!("Download of {url} failed"))?;
        let bytes = resp
            .bytes()
            .await
            .with_context(|| format!("Failed to read body of {url}"))?;
        Ok(bytes.to_vec())
    }
}
