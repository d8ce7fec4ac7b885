use crate::value::FileAttachment;

/// Canonicalizes a raw file-accept specification.
///
/// The composer shorthand `"pdf"` expands to `".pdf,application/pdf"`; a
/// string that already contains `.`, `/`, or `,` passes through unchanged;
/// anything else is treated as a bare extension and prefixed with `.`.
#[must_use]
pub fn normalize_accept(raw: &str) -> Option<String> {
    let lowered = raw.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }

    if lowered == "pdf" {
        return Some(".pdf,application/pdf".to_owned());
    }

    if lowered.starts_with('.') || lowered.contains('/') || lowered.contains(',') {
        return Some(raw.to_owned());
    }

    Some(format!(".{lowered}"))
}

/// Parsed accept tokens for candidate-file testing.
///
/// Tokens are comma-separated: extensions (`.pdf`), exact MIME types
/// (`application/pdf`), or wildcard MIME types (`image/*`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptPatterns {
    raw: String,
    tokens: Vec<String>,
}

impl AcceptPatterns {
    /// Parses a canonical accept string into match tokens.
    #[must_use]
    pub fn parse(accept: &str) -> Self {
        let tokens = accept
            .split(',')
            .map(|token| token.trim().to_lowercase())
            .filter(|token| !token.is_empty())
            .collect();

        Self {
            raw: accept.to_owned(),
            tokens,
        }
    }

    /// Returns the accept string the patterns were parsed from.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.raw.as_str()
    }

    /// Returns whether no usable token was parsed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tests one candidate file: accepted when ANY token matches, or when
    /// the token list is empty.
    #[must_use]
    pub fn accepts(&self, file: &FileAttachment) -> bool {
        if self.tokens.is_empty() {
            return true;
        }

        let name = file.name().to_lowercase();
        let media_type = file.media_type().to_lowercase();

        self.tokens
            .iter()
            .any(|token| Self::token_matches(token, name.as_str(), media_type.as_str()))
    }

    fn token_matches(token: &str, name: &str, media_type: &str) -> bool {
        if token.starts_with('.') {
            return name.ends_with(token);
        }

        if let Some(prefix) = token.strip_suffix('*') {
            // wildcard mime, e.g. image/* keeps the trailing '/'
            return token.contains('/') && media_type.starts_with(prefix);
        }

        if token.contains('/') {
            if !media_type.is_empty() {
                return media_type == token;
            }

            // fallback when the picker supplies no MIME type
            return token == "application/pdf" && name.ends_with(".pdf");
        }

        false
    }
}
