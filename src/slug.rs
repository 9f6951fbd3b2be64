//! Text to URL-slug normalization.
//!
//! Slugs are used as the last path segment of a content path, so the output
//! only ever contains `[a-z0-9]` separated by single hyphens.

pub const MAX_SLUG_LEN: usize = 100;

const FILENAME_FALLBACK: &str = "image";

/// Normalize prompt or instruction text into a slug.
///
/// ```
/// assert_eq!(pixvault::slugify("A Cool Título!!"), "a-cool-t-tulo");
/// ```
pub fn slugify(text: &str) -> String {
    normalize(&text.to_lowercase())
}

/// Slug for an uploaded file name: the last extension is dropped and an empty
/// result becomes `"image"`.
pub fn slugify_filename(filename: &str) -> String {
    let stem = match filename.rfind('.') {
        Some(idx) => &filename[..idx],
        None => filename,
    };
    let slug = normalize(&stem.to_lowercase());
    if slug.is_empty() {
        FILENAME_FALLBACK.to_string()
    } else {
        slug
    }
}

fn normalize(lowered: &str) -> String {
    let mut slug = String::with_capacity(lowered.len().min(MAX_SLUG_LEN));
    let mut pending_hyphen = false;

    for c in lowered.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }

    slug.truncate(MAX_SLUG_LEN);
    // the cut can land right after a separator
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
