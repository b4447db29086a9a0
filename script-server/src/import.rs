//! URL import: turn a third-party song page into pre-filled script fields.
//!
//! Only the page title is extracted. Anything smarter belongs in a dedicated
//! scraper plugged in through [`UrlImporter`].

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use shared_types::ImportedFields;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImportFailure {
    #[error("url must start with http:// or https://")]
    InvalidUrl,
    #[error("url import is disabled")]
    Disabled,
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("upstream returned HTTP {0}")]
    Upstream(u16),
    #[error("no usable fields found on page")]
    NothingFound,
}

#[async_trait]
pub trait UrlImporter: Send + Sync {
    async fn import(&self, url: &str) -> Result<ImportedFields, ImportFailure>;
}

/// Trim the URL and require an http(s) scheme.
pub fn validate_url(url: &str) -> Result<&str, ImportFailure> {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url)
    } else {
        Err(ImportFailure::InvalidUrl)
    }
}

/// Importer used when URL import is switched off.
pub struct DisabledImporter;

#[async_trait]
impl UrlImporter for DisabledImporter {
    async fn import(&self, _url: &str) -> Result<ImportedFields, ImportFailure> {
        Err(ImportFailure::Disabled)
    }
}

/// Fetches the page and reads its `og:title` (or `<title>`).
pub struct PageMetaImporter {
    http: reqwest::Client,
}

impl PageMetaImporter {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("SunoScriptManager/0.1 (+import-url)")
            .build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl UrlImporter for PageMetaImporter {
    async fn import(&self, url: &str) -> Result<ImportedFields, ImportFailure> {
        let url = validate_url(url)?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ImportFailure::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImportFailure::Upstream(status.as_u16()));
        }
        let body = response
            .text()
            .await
            .map_err(|e| ImportFailure::Fetch(e.to_string()))?;

        let fields = ImportedFields {
            title: extract_page_title(&body),
            ..ImportedFields::default()
        };
        if !fields.has_content() {
            return Err(ImportFailure::NothingFound);
        }
        Ok(fields)
    }
}

static OG_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?is)<meta[^>]+property\s*=\s*["']og:title["'][^>]*content\s*=\s*["']([^"']*)["']"#,
    )
    .expect("og:title pattern is valid")
});

static TITLE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("title pattern is valid"));

/// Prefer the Open Graph title, fall back to `<title>`.
pub(crate) fn extract_page_title(html: &str) -> Option<String> {
    let og = first_capture(&OG_TITLE, html);
    let title = first_capture(&TITLE_TAG, html);

    [og, title]
        .into_iter()
        .flatten()
        .map(|raw| decode_entities(raw).split_whitespace().collect::<Vec<_>>().join(" "))
        .find(|text| !text.is_empty())
}

fn first_capture<'h>(re: &Regex, html: &'h str) -> Option<&'h str> {
    re.captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn decode_entities(raw: &str) -> String {
    raw.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert_eq!(validate_url("  https://suno.com/song/1 "), Ok("https://suno.com/song/1"));
        assert_eq!(validate_url("ftp://x"), Err(ImportFailure::InvalidUrl));
        assert_eq!(validate_url(""), Err(ImportFailure::InvalidUrl));
    }

    #[test]
    fn test_extract_prefers_og_title() {
        let html = r#"<html><head>
            <title>Ignored | Site</title>
            <meta property="og:title" content="Midnight &amp; Neon">
        </head></html>"#;
        assert_eq!(extract_page_title(html).as_deref(), Some("Midnight & Neon"));
    }

    #[test]
    fn test_extract_falls_back_to_title_tag() {
        let html = "<html><head><TITLE>\n  Slow   Jazz Night\n</TITLE></head></html>";
        assert_eq!(extract_page_title(html).as_deref(), Some("Slow Jazz Night"));
    }

    #[test]
    fn test_extract_ignores_blank_titles() {
        let html = r#"<meta property="og:title" content="  "><title></title>"#;
        assert_eq!(extract_page_title(html), None);
    }

    #[test]
    fn test_title_patterns_compile_once_and_are_reused() {
        let og: &Regex = &OG_TITLE;
        let tag: &Regex = &TITLE_TAG;
        for n in 0..3 {
            let html = format!("<title>Take {n}</title>");
            assert_eq!(extract_page_title(&html), Some(format!("Take {n}")));
        }
        assert!(std::ptr::eq(og, &*OG_TITLE));
        assert!(std::ptr::eq(tag, &*TITLE_TAG));
    }

    #[tokio::test]
    async fn test_disabled_importer_refuses() {
        let result = DisabledImporter.import("https://example.com").await;
        assert_eq!(result, Err(ImportFailure::Disabled));
    }
}
