use semver::Version;

/// Release tag naming: `<prefix><version><suffix>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFormat {
    pub prefix: String,
    pub suffix: String,
}

impl TagFormat {
    /// Create a new tag format
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        TagFormat {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Format a version as a tag name
    /// Example: prefix="v", suffix="-stable", version="2.0.0" -> "v2.0.0-stable"
    pub fn format(&self, version: &Version) -> String {
        format!("{}{}{}", self.prefix, version, self.suffix)
    }

    /// Extract the version from a tag that follows this format
    pub fn parse(&self, tag: &str) -> Option<Version> {
        let version = tag
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.suffix.as_str())?;
        Version::parse(version).ok()
    }

    /// Check whether a tag names a release under this format
    pub fn matches(&self, tag: &str) -> bool {
        self.parse(tag).is_some()
    }
}

impl Default for TagFormat {
    fn default() -> Self {
        TagFormat::new("v", "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_default() {
        let format = TagFormat::default();
        assert_eq!(format.format(&Version::new(1, 2, 3)), "v1.2.3");
    }

    #[test]
    fn test_format_with_suffix() {
        let format = TagFormat::new("v", "-stable");
        assert_eq!(format.format(&Version::new(2, 0, 0)), "v2.0.0-stable");
    }

    #[test]
    fn test_parse_round_trip() {
        let format = TagFormat::new("release-", "");
        assert_eq!(format.parse("release-1.2.3"), Some(Version::new(1, 2, 3)));
    }

    #[test]
    fn test_parse_prerelease_tag() {
        let format = TagFormat::default();
        let version = format.parse("v1.0.0-beta.1").unwrap();
        assert_eq!(version.pre.as_str(), "beta.1");
    }

    #[test]
    fn test_matches() {
        let format = TagFormat::new("v", "-stable");
        assert!(format.matches("v1.2.3-stable"));
        assert!(!format.matches("v1.2.3"));
        assert!(!format.matches("release-1.2.3-stable"));
        assert!(!format.matches("vnext-stable"));
    }
}
