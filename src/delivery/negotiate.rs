//! Content-type and disposition decisions for a delivered artifact.

use serde::Serialize;

pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Directives that keep every response out of intermediate caches.
pub const CACHE_CONTROL: &str = "no-store, no-cache, must-revalidate, max-age=0";
pub const PRAGMA: &str = "no-cache";
pub const EXPIRES: &str = "0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    Inline,
    Attachment,
}

impl Disposition {
    pub fn as_str(self) -> &'static str {
        match self {
            Disposition::Inline => "inline",
            Disposition::Attachment => "attachment",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheDirectives {
    pub cache_control: &'static str,
    pub pragma: &'static str,
    pub expires: &'static str,
}

impl Default for CacheDirectives {
    fn default() -> Self {
        Self {
            cache_control: CACHE_CONTROL,
            pragma: PRAGMA,
            expires: EXPIRES,
        }
    }
}

/// Outcome of negotiating how a stored content type is presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiated {
    pub content_type: String,
    pub disposition: Disposition,
    pub binary: bool,
}

/// Text renders inline; everything else, including an unknown type, is a
/// binary attachment.
pub fn negotiate(content_type: Option<&str>) -> Negotiated {
    match content_type.map(str::trim).filter(|ct| !ct.is_empty()) {
        Some(ct) if is_text(ct) => Negotiated {
            content_type: ct.to_string(),
            disposition: Disposition::Inline,
            binary: false,
        },
        Some(ct) => Negotiated {
            content_type: ct.to_string(),
            disposition: Disposition::Attachment,
            binary: true,
        },
        None => Negotiated {
            content_type: FALLBACK_CONTENT_TYPE.to_string(),
            disposition: Disposition::Attachment,
            binary: true,
        },
    }
}

fn is_text(content_type: &str) -> bool {
    content_type
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("text/"))
}

/// Formats a `Content-Disposition` value (RFC 6266).
///
/// `filename` carries an ASCII stand-in; `filename*` (RFC 5987) carries the
/// exact name whenever the stand-in had to alter it.
pub fn content_disposition(disposition: Disposition, filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if fallback == filename {
        format!("{}; filename=\"{}\"", disposition.as_str(), fallback)
    } else {
        format!(
            "{}; filename=\"{}\"; filename*=UTF-8''{}",
            disposition.as_str(),
            fallback,
            urlencoding::encode(filename)
        )
    }
}
