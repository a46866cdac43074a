//! Rendering of shareable links.
//!
//! Two formats are produced from an encoded session token:
//!
//! - **Wiki**: a single `[<url> Try it online]` link
//! - **Markdown**: a post-ready snippet with a title line, the indented code
//!   and reference-style links to the language documentation and the session

use esobox_core::language::LanguageInfo;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Project whose links omit the `project` query parameter.
pub const DEFAULT_PROJECT: &str = "main";

static HTTP_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://\S+$").unwrap_or_else(|e| panic!("url pattern: {e}"))
});
static LINE_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\r\n|\r|\n").unwrap_or_else(|e| panic!("line break pattern: {e}"))
});

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    #[default]
    Markdown,
    Wiki,
}

impl ExportFormat {
    pub fn from_wiki_flag(wiki: bool) -> Self {
        if wiki { Self::Wiki } else { Self::Markdown }
    }
}

/// Where links point and how they are rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSettings {
    pub base_url: String,
    pub project: String,
    pub format: ExportFormat,
}

/// Result of an export operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Export {
    /// Encoded session
    pub token: String,
    /// Shareable link carrying the token
    pub url: String,
    /// Rendered snippet, as placed in the Export field
    pub text: String,
}

/// Builds the shareable link for `token`.
pub fn share_url(base_url: &str, project: &str, token: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if project == DEFAULT_PROJECT {
        format!("{}/?data={}", base, token)
    } else {
        format!("{}/?project={}&data={}", base, project, token)
    }
}

/// Escapes every character outside `[A-Za-z0-9 ]` as a hex character
/// reference.
pub fn escape_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == ' ' {
                c.to_string()
            } else {
                format!("&#x{:X};", u32::from(c))
            }
        })
        .collect()
}

/// Reference label for the session link: `TIO-<ms hex><random hex>`.
pub fn link_label(now_millis: u64, random: [u8; 2]) -> String {
    format!("TIO-{:x}{:02x}{:02x}", now_millis, random[0], random[1])
}

/// Renders the wiki link.
pub fn wiki_link(url: &str) -> String {
    format!("[{} Try it online]", url)
}

/// Renders the markdown snippet.
///
/// # Arguments
///
/// * `language` - Catalog entry of the session language
/// * `code` - The Code field
/// * `bytes` - Byte count shown in the title
/// * `url` - Shareable link
/// * `label` - Reference label, see [`link_label`]
pub fn markdown_snippet(
    language: &LanguageInfo,
    code: &str,
    bytes: usize,
    url: &str,
    label: &str,
) -> String {
    let name = escape_name(&language.name);
    let linked = language
        .details
        .as_deref()
        .is_some_and(|details| HTTP_URL.is_match(details));
    let title = if linked {
        format!("[{}]", name)
    } else {
        name.clone()
    };

    let body = LINE_BREAK
        .split(code)
        .map(|line| {
            let visible: String = line.chars().filter(|c| !is_stripped_control(*c)).collect();
            format!("    {}", visible)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut snippet = format!(
        "# {}, {} bytes\n\n{}\n\n[Try it online!][{}]\n\n",
        title, bytes, body, label
    );
    if let Some(details) = &language.details {
        snippet.push_str(&format!("[{}]: {}\n", name, details));
    }
    snippet.push_str(&format!("[{}]: {}", label, url));
    snippet
}

fn is_stripped_control(c: char) -> bool {
    u32::from(c) < 0x20
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brainfuck() -> LanguageInfo {
        LanguageInfo {
            details: Some("https://esolangs.org/wiki/Brainfuck".to_string()),
            ..LanguageInfo::new("Brainfuck")
        }
    }

    #[test]
    fn test_share_url() {
        assert_eq!(
            share_url("https://tio.example/", "main", "ABC="),
            "https://tio.example/?data=ABC="
        );
        assert_eq!(
            share_url("https://tio.example", "beta", "ABC"),
            "https://tio.example/?project=beta&data=ABC"
        );
    }

    #[test]
    fn test_escape_name() {
        assert_eq!(escape_name("Brainfuck 2"), "Brainfuck 2");
        assert_eq!(escape_name("C++"), "C&#x2B;&#x2B;");
        assert_eq!(escape_name("><>"), "&#x3E;&#x3C;&#x3E;");
        assert_eq!(escape_name("λ"), "&#x3BB;");
    }

    #[test]
    fn test_link_label() {
        assert_eq!(link_label(0x18f3a, [0x0a, 0xff]), "TIO-18f3a0aff");
    }

    #[test]
    fn test_wiki_link() {
        assert_eq!(
            wiki_link("http://h/?data=X"),
            "[http://h/?data=X Try it online]"
        );
    }

    #[test]
    fn test_markdown_snippet_with_linked_language() {
        let snippet = markdown_snippet(&brainfuck(), "+[\r\n-]\t.", 7, "http://h/?data=X", "TIO-1");
        assert_eq!(
            snippet,
            "# [Brainfuck], 7 bytes\n\n    +[\n    -].\n\n[Try it online!][TIO-1]\n\n\
             [Brainfuck]: https://esolangs.org/wiki/Brainfuck\n[TIO-1]: http://h/?data=X"
        );
    }

    #[test]
    fn test_markdown_snippet_without_link() {
        let info = LanguageInfo {
            details: Some("a stack language".to_string()),
            ..LanguageInfo::new("C++")
        };
        let snippet = markdown_snippet(&info, "x", 1, "u", "L");
        assert!(snippet.starts_with("# C&#x2B;&#x2B;, 1 bytes\n"));
        assert!(snippet.contains("[C&#x2B;&#x2B;]: a stack language\n"));

        let bare = markdown_snippet(&LanguageInfo::new("Text"), "", 0, "u", "L");
        assert_eq!(bare, "# Text, 0 bytes\n\n    \n\n[Try it online!][L]\n\n[L]: u");
    }

    #[test]
    fn test_format_from_flag() {
        assert_eq!(ExportFormat::from_wiki_flag(true), ExportFormat::Wiki);
        assert_eq!(ExportFormat::from_wiki_flag(false), ExportFormat::Markdown);
    }
}
