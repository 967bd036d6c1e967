use crate::github::User;

/// Display values written into the cards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    pub repos: String,
    pub commits: String,
    pub stars: String,
    pub followers: String,
}

impl Stats {
    /// Derive the four display strings from a raw user object.
    ///
    /// Stars are summed over the repositories the API returned, which is at
    /// most the first page of 100.
    pub fn from_user(user: &User) -> Self {
        let stars: u64 = user
            .repositories
            .nodes
            .iter()
            .map(|n| n.stargazer_count)
            .sum();
        let contributions = &user.contributions_collection;
        let commits = contributions.total_commit_contributions
            + contributions.restricted_contributions_count;

        Stats {
            repos: user.repositories.total_count.to_string(),
            commits: format_thousands(commits),
            stars: stars.to_string(),
            followers: user.followers.total_count.to_string(),
        }
    }

    /// "~" everywhere, used when there is no data to show.
    pub fn placeholder() -> Self {
        Stats {
            repos: "~".to_string(),
            commits: "~".to_string(),
            stars: "~".to_string(),
            followers: "~".to_string(),
        }
    }

    /// (span id, value) pairs in card order.
    pub fn fields(&self) -> [(&'static str, &str); 4] {
        [
            ("repos", self.repos.as_str()),
            ("commits", self.commits.as_str()),
            ("stars", self.stars.as_str()),
            ("followers", self.followers.as_str()),
        ]
    }
}

/// 12345 -> "12,345"
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(stars: &[u64], public: u64, private: u64) -> User {
        let nodes: Vec<_> = stars
            .iter()
            .map(|s| serde_json::json!({ "stargazerCount": s }))
            .collect();
        serde_json::from_value(serde_json::json!({
            "repositories": { "totalCount": stars.len(), "nodes": nodes },
            "contributionsCollection": {
                "totalCommitContributions": public,
                "restrictedContributionsCount": private
            },
            "followers": { "totalCount": 42 }
        }))
        .unwrap()
    }

    #[test]
    fn thousands_separators() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(12345), "12,345");
        assert_eq!(format_thousands(1234567), "1,234,567");
    }

    #[test]
    fn stars_are_summed() {
        let stats = Stats::from_user(&user(&[5, 0, 12], 0, 0));
        assert_eq!(stats.stars, "17");
        assert_eq!(stats.repos, "3");
        assert_eq!(stats.followers, "42");
    }

    #[test]
    fn commits_include_private_contributions() {
        let stats = Stats::from_user(&user(&[], 12000, 345));
        assert_eq!(stats.commits, "12,345");
        assert_eq!(stats.stars, "0");
    }

    #[test]
    fn placeholder_uses_tilde() {
        let stats = Stats::placeholder();
        assert!(stats.fields().iter().all(|(_, v)| *v == "~"));
    }
}
