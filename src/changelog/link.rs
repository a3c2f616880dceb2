//! Repository URL normalisation for changelog links.

use std::sync::LazyLock;

use regex::Regex;

/// `user@host:owner/repo`
static SCP_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[^@/:]+@)?([^:/]+):([^/].*)$").expect("Invalid regex"));

/// `owner/repo`
static SHORTHAND_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.-]+/[\w.-]+$").expect("Invalid regex"));

/// A web-browsable repository location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoUrl {
    /// `https://host/owner/repo`
    pub base: String,
    /// `https://host`, used for user profile links
    pub host: String,
}

impl RepoUrl {
    pub fn issue(&self, number: &str) -> String {
        format!("{}/issues/{}", self.base, number)
    }

    pub fn commit(&self, hash: &str) -> String {
        format!("{}/commit/{}", self.base, hash)
    }

    pub fn compare(&self, from: &str, to: &str) -> String {
        format!("{}/compare/{}...{}", self.base, from, to)
    }

    pub fn user(&self, name: &str) -> String {
        format!("{}/{}", self.host, name)
    }
}

/// Normalise the forms a repository URL takes in manifests and remotes.
///
/// Accepts `git+https://`, `ssh://`, `git://`, scp-like `git@host:owner/repo`,
/// `github:owner/repo` and bare `owner/repo` (GitHub). Returns `None` for
/// anything that does not name a host and a path.
pub fn normalize_repo_url(raw: &str) -> Option<RepoUrl> {
    let mut url = raw.trim();
    url = url.strip_prefix("git+").unwrap_or(url);
    url = url.trim_end_matches('/');
    url = url.strip_suffix(".git").unwrap_or(url);

    if url.is_empty() {
        return None;
    }

    for (shorthand, host) in [
        ("github:", "github.com"),
        ("gitlab:", "gitlab.com"),
        ("bitbucket:", "bitbucket.org"),
    ] {
        if let Some(path) = url.strip_prefix(shorthand) {
            return build("https", host, path);
        }
    }

    if let Some((scheme, rest)) = url.split_once("://") {
        let (authority, path) = rest.split_once('/')?;
        let host = authority.rsplit('@').next().unwrap_or(authority);
        let scheme = if scheme == "http" { "http" } else { "https" };
        let host = if scheme == "https" {
            host.split(':').next().unwrap_or(host)
        } else {
            host
        };
        return build(scheme, host, path);
    }

    if let Some(caps) = SCP_REGEX.captures(url) {
        return build("https", &caps[1], &caps[2]);
    }

    if SHORTHAND_REGEX.is_match(url) {
        return build("https", "github.com", url);
    }

    None
}

fn build(scheme: &str, host: &str, path: &str) -> Option<RepoUrl> {
    let path = path.trim_matches('/');
    if host.is_empty() || path.is_empty() {
        return None;
    }
    let host = format!("{}://{}", scheme, host);
    Some(RepoUrl {
        base: format!("{}/{}", host, path),
        host,
    })
}
