//! Robots.txt rule evaluation on top of the robotstxt crate

use robotstxt::DefaultMatcher;
use std::time::Duration;

/// Parsed robots.txt data for one origin
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content; `None` means everything is allowed
    content: Option<String>,
}

impl ParsedRobots {
    pub fn from_content(content: &str) -> Self {
        Self {
            content: Some(content.to_string()),
        }
    }

    /// A permissive rule set, used when no robots.txt applies
    pub fn allow_all() -> Self {
        Self { content: None }
    }

    pub fn is_allow_all(&self) -> bool {
        self.content.as_deref().map(str::trim).unwrap_or_default().is_empty()
    }

    /// Checks whether `url` (absolute) may be fetched by the agent `token`
    pub fn is_allowed(&self, url: &str, token: &str) -> bool {
        match &self.content {
            Some(content) if !content.trim().is_empty() => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(content, token, url)
            }
            _ => true,
        }
    }

    /// Crawl delay for the agent `token`
    ///
    /// A group naming the agent wins over the `*` group. User-agent lines
    /// that directly follow each other share one group.
    pub fn crawl_delay(&self, token: &str) -> Option<Duration> {
        let content = self.content.as_deref()?;
        let token = token.to_lowercase();

        let mut group_agents: Vec<String> = Vec::new();
        let mut collecting_agents = false;
        let mut for_agent: Option<f64> = None;
        let mut for_wildcard: Option<f64> = None;

        for line in content.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            if key == "user-agent" {
                if !collecting_agents {
                    group_agents.clear();
                    collecting_agents = true;
                }
                group_agents.push(value.to_lowercase());
                continue;
            }
            collecting_agents = false;

            if key != "crawl-delay" {
                continue;
            }
            let Ok(delay) = value.parse::<f64>() else {
                continue;
            };
            if !delay.is_finite() || delay < 0.0 {
                continue;
            }

            if group_agents.iter().any(|agent| agent == &token) {
                for_agent.get_or_insert(delay);
            } else if group_agents.iter().any(|agent| agent == "*") {
                for_wildcard.get_or_insert(delay);
            }
        }

        for_agent
            .or(for_wildcard)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITE: &str = "https://docs.example.com";

    fn url(path: &str) -> String {
        format!("{}{}", SITE, path)
    }

    #[test]
    fn test_allow_all() {
        let robots = ParsedRobots::allow_all();
        assert!(robots.is_allow_all());
        assert!(robots.is_allowed(&url("/admin"), "DocFetch"));
    }

    #[test]
    fn test_disallow_all() {
        let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /");
        assert!(!robots.is_allowed(&url("/"), "DocFetch"));
        assert!(!robots.is_allowed(&url("/guide"), "DocFetch"));
    }

    #[test]
    fn test_disallow_specific() {
        let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /private");
        assert!(robots.is_allowed(&url("/guide"), "DocFetch"));
        assert!(!robots.is_allowed(&url("/private"), "DocFetch"));
        assert!(!robots.is_allowed(&url("/private/keys"), "DocFetch"));
    }

    #[test]
    fn test_allow_overrides_longer_match() {
        let robots = ParsedRobots::from_content(
            "User-agent: *\nDisallow: /private\nAllow: /private/public",
        );
        assert!(!robots.is_allowed(&url("/private"), "DocFetch"));
        assert!(robots.is_allowed(&url("/private/public"), "DocFetch"));
    }

    #[test]
    fn test_specific_agent_group() {
        let robots =
            ParsedRobots::from_content("User-agent: DocFetch\nDisallow: /\n\nUser-agent: *\nAllow: /");
        assert!(!robots.is_allowed(&url("/guide"), "DocFetch"));
        assert!(robots.is_allowed(&url("/guide"), "OtherBot"));
    }

    #[test]
    fn test_garbage_and_empty_allow_everything() {
        let robots = ParsedRobots::from_content("This is not valid robots.txt {{{");
        assert!(robots.is_allowed(&url("/any"), "DocFetch"));

        let robots = ParsedRobots::from_content("");
        assert!(robots.is_allow_all());
        assert!(robots.is_allowed(&url("/any"), "DocFetch"));
    }

    #[test]
    fn test_crawl_delay_wildcard() {
        let robots = ParsedRobots::from_content("User-agent: *\nCrawl-delay: 10\nDisallow: /admin");
        assert_eq!(robots.crawl_delay("DocFetch"), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_crawl_delay_specific_agent_wins() {
        let robots = ParsedRobots::from_content(
            "User-agent: *\nCrawl-delay: 10\n\nUser-agent: DocFetch\nCrawl-delay: 5",
        );
        assert_eq!(robots.crawl_delay("DocFetch"), Some(Duration::from_secs(5)));
        assert_eq!(robots.crawl_delay("OtherBot"), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_crawl_delay_after_other_directives() {
        let robots =
            ParsedRobots::from_content("User-agent: *\nDisallow: /admin\nCrawl-delay: 2.5");
        assert_eq!(
            robots.crawl_delay("DocFetch"),
            Some(Duration::from_millis(2500))
        );
    }

    #[test]
    fn test_crawl_delay_shared_group() {
        let robots =
            ParsedRobots::from_content("User-agent: BotA\nUser-agent: BotB\nCrawl-delay: 3");
        assert_eq!(robots.crawl_delay("bota"), Some(Duration::from_secs(3)));
        assert_eq!(robots.crawl_delay("BotB"), Some(Duration::from_secs(3)));
        assert_eq!(robots.crawl_delay("BotC"), None);
    }

    #[test]
    fn test_crawl_delay_out_of_range_is_ignored() {
        let robots = ParsedRobots::from_content("User-agent: *\nCrawl-delay: 1e30\n");
        assert_eq!(robots.crawl_delay("DocFetch"), None);

        let robots = ParsedRobots::from_content("User-agent: *\nCrawl-delay: 1e15\n");
        assert_eq!(
            robots.crawl_delay("DocFetch"),
            Some(Duration::from_secs(1_000_000_000_000_000))
        );
    }

    #[test]
    fn test_crawl_delay_ignores_invalid_values() {
        let robots = ParsedRobots::from_content("User-agent: *\nCrawl-delay: soon");
        assert_eq!(robots.crawl_delay("DocFetch"), None);
        assert_eq!(ParsedRobots::allow_all().crawl_delay("DocFetch"), None);
    }
}
