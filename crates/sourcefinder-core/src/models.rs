//! Source records attached to a chat answer.
//!
//! A [`SourceRecord`] is created when a research answer arrives and is never
//! mutated afterwards. The list of records for one answer is the lookup
//! table that citation markers in the answer text resolve against.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Category of the site or service a source came from.
///
/// The upstream service sends this as a free-form string. Known categories
/// are matched case-insensitively; anything else is preserved verbatim in
/// [`Provider::Other`] so it can still be displayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Provider {
    Academic,
    Reddit,
    News,
    #[default]
    Web,
    Twitter,
    Other(String),
}

impl Provider {
    /// Human-readable label, as shown on a source card.
    pub fn label(&self) -> &str {
        match self {
            Provider::Academic => "Academic",
            Provider::Reddit => "Reddit",
            Provider::News => "News",
            Provider::Web => "Web",
            Provider::Twitter => "Twitter",
            Provider::Other(name) => name,
        }
    }

    /// Lowercase bucket name used for styling. Unrecognised providers all
    /// share the `"other"` bucket.
    pub fn bucket(&self) -> &'static str {
        match self {
            Provider::Academic => "academic",
            Provider::Reddit => "reddit",
            Provider::News => "news",
            Provider::Web => "web",
            Provider::Twitter => "twitter",
            Provider::Other(_) => "other",
        }
    }
}

impl From<&str> for Provider {
    fn from(value: &str) -> Self {
        let trimmed = value.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "academic" | "scholar" | "paper" => Provider::Academic,
            "reddit" => Provider::Reddit,
            "news" => Provider::News,
            "web" | "" => Provider::Web,
            "twitter" | "x" => Provider::Twitter,
            _ => Provider::Other(trimmed.to_string()),
        }
    }
}

impl From<String> for Provider {
    fn from(value: String) -> Self {
        Provider::from(value.as_str())
    }
}

impl From<Provider> for String {
    fn from(value: Provider) -> Self {
        value.label().to_string()
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One cited reference: the metadata behind a `[n]` marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Citation index as it appears in the answer text.
    pub number: u32,
    pub title: String,
    /// Absolute URL. May be missing or a placeholder such as `"#"`.
    #[serde(default, alias = "url", skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, alias = "source", deserialize_with = "null_as_default_provider")]
    pub provider: Provider,
    /// Short excerpt of the source content.
    #[serde(default, alias = "snippet", skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    /// Whether the source passed the upstream credibility check.
    #[serde(default, deserialize_with = "null_as_false")]
    pub verified: bool,
}

impl SourceRecord {
    pub fn new(number: u32, title: impl Into<String>) -> Self {
        Self {
            number,
            title: title.into(),
            link: None,
            provider: Provider::default(),
            preview: None,
            verified: false,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_provider(mut self, provider: impl Into<Provider>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn with_preview(mut self, preview: impl Into<String>) -> Self {
        self.preview = Some(preview.into());
        self
    }

    pub fn with_verified(mut self, verified: bool) -> Self {
        self.verified = verified;
        self
    }

    /// The link if it is an absolute `http`/`https` URL. Placeholders such
    /// as `""` or `#`, relative paths and other schemes (`javascript:`,
    /// `data:`) count as no link.
    pub fn href(&self) -> Option<&str> {
        self.link.as_deref().map(str::trim).filter(|l| is_web_url(l))
    }
}

fn is_web_url(link: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        link.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
            && link.len() > scheme.len()
    })
}

fn null_as_default_provider<'de, D>(deserializer: D) -> Result<Provider, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .map(Provider::from)
        .unwrap_or_default())
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}
