use axum::http::HeaderValue;

const MAX_SLUG_LEN: usize = 64;
const MAX_FILENAME_LEN: usize = 255;

fn is_valid_slug_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'
}

fn validate_slug(slug: &str, entity: &str) -> Result<(), String> {
    if slug.is_empty() {
        return Err(format!("{entity} slug cannot be empty"));
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(format!(
            "{entity} slug cannot exceed {MAX_SLUG_LEN} characters"
        ));
    }
    if !slug.chars().all(is_valid_slug_char) {
        return Err(format!(
            "{entity} slug can only contain alphanumeric characters, hyphens, underscores, and periods"
        ));
    }
    if slug == "." || slug == ".." {
        return Err(format!("{entity} slug cannot be '{slug}'"));
    }
    Ok(())
}

pub fn validate_project_slug(slug: &str) -> Result<(), String> {
    validate_slug(slug, "Project")
}

pub fn validate_platform_slug(slug: &str) -> Result<(), String> {
    validate_slug(slug, "Platform")
}

/// Versions appear as a path segment, so they follow the slug rules.
pub fn validate_version(version: &str) -> Result<(), String> {
    validate_slug(version, "Release version")
}

pub fn validate_filename(filename: &str) -> Result<(), String> {
    if filename.is_empty() {
        return Err("Filename cannot be empty".to_string());
    }
    if filename.len() > MAX_FILENAME_LEN {
        return Err(format!(
            "Filename cannot exceed {MAX_FILENAME_LEN} characters"
        ));
    }
    if filename == "." || filename == ".." {
        return Err(format!("Filename cannot be '{filename}'"));
    }

    const INVALID_CHARS: &[char] = &['/', '\\', '\0', '\n', '\r'];
    if filename.chars().any(|c| INVALID_CHARS.contains(&c) || c.is_control()) {
        return Err("Filename contains invalid characters".to_string());
    }
    Ok(())
}

/// The stored type is sent back verbatim as `Content-Type`, so it must be a
/// valid header value.
pub fn validate_content_type(content_type: &str) -> Result<(), String> {
    if HeaderValue::from_str(content_type).is_err() {
        return Err(format!(
            "Content type {content_type:?} contains characters not allowed in a header"
        ));
    }
    Ok(())
}
