// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Request validation module.

use std::sync::LazyLock;

use linkshelf_common::{CreatePostRequest, RecordId, UpdatePostRequest};
use regex::Regex;
use thiserror::Error;
use url::Url;

use crate::storage::{NewPost, PostChanges};

// Common validation constants
const MAX_USERNAME_LENGTH: usize = 64;
const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit
const MAX_TITLE_LENGTH: usize = 200;
const MAX_TAG_LENGTH: usize = 50;
const MAX_TAGS_PER_POST: usize = 20;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

/// Possible validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("All fields are mandatory!")]
    AllFieldsMandatory,

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("{0}")]
    WeakPassword(String),

    #[error("Invalid URL format for link or image")]
    InvalidUrl,

    #[error("Post ID must be a number.")]
    InvalidPostId,

    #[error("Invalid title: {0}")]
    InvalidTitle(String),

    #[error("Invalid tags: {0}")]
    InvalidTags(String),
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trimmed, non-empty value of an optional text field
pub fn present(field: Option<&str>) -> Option<&str> {
    field.map(str::trim).filter(|value| !value.is_empty())
}

/// Validate an email address
pub fn validate_email(email: &str) -> ValidationResult<&str> {
    if email.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "Email address cannot be empty".to_string(),
        ));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::InvalidEmail(format!(
            "Email address cannot exceed {MAX_EMAIL_LENGTH} characters"
        )));
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail(
            "Invalid email address format".to_string(),
        ));
    }

    Ok(email)
}

/// Validate a username
pub fn validate_username(username: &str) -> ValidationResult<&str> {
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::InvalidUsername(format!(
            "Username cannot exceed {MAX_USERNAME_LENGTH} characters"
        )));
    }
    Ok(username)
}

/// Only absolute http(s) URLs are accepted for links and images
pub fn validate_url(candidate: &str) -> ValidationResult<&str> {
    match Url::parse(candidate) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(candidate),
        _ => Err(ValidationError::InvalidUrl),
    }
}

/// Parse the `{id}` path segment of a post route
pub fn parse_post_id(raw: &str) -> ValidationResult<RecordId> {
    match raw.trim().parse::<RecordId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ValidationError::InvalidPostId),
    }
}

/// Lenient page parsing: anything that is not a positive number is page 1
pub fn parse_page(raw: Option<&str>) -> u32 {
    raw.and_then(|page| page.trim().parse::<u32>().ok())
        .filter(|page| *page >= 1)
        .unwrap_or(1)
}

/// Trim, lowercase, drop empties and duplicates, keep first-seen order
pub fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.as_ref().trim().to_lowercase();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

/// Parse the comma separated `tags` query parameter
pub fn parse_tag_filter(raw: Option<&str>) -> Vec<String> {
    match raw {
        Some(raw) => normalize_tags(&raw.split(',').collect::<Vec<_>>()),
        None => Vec::new(),
    }
}

fn validate_title(title: &str) -> ValidationResult<()> {
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::InvalidTitle(format!(
            "Title cannot exceed {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_tags(tags: &[String]) -> ValidationResult<()> {
    if tags.len() > MAX_TAGS_PER_POST {
        return Err(ValidationError::InvalidTags(format!(
            "A post can have at most {MAX_TAGS_PER_POST} tags"
        )));
    }
    if tags.iter().any(|tag| tag.chars().count() > MAX_TAG_LENGTH) {
        return Err(ValidationError::InvalidTags(format!(
            "Tags cannot exceed {MAX_TAG_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate the body of a create-post request
pub fn validate_new_post(req: &CreatePostRequest) -> ValidationResult<NewPost> {
    let title = present(req.title.as_deref());
    let link = present(req.link.as_deref());
    let image = present(req.image.as_deref());
    let tags = normalize_tags(req.tags.as_deref().unwrap_or_default());

    let mut missing = Vec::new();
    if title.is_none() {
        missing.push("title");
    }
    if link.is_none() {
        missing.push("link");
    }
    if image.is_none() {
        missing.push("image");
    }
    if tags.is_empty() {
        missing.push("tags");
    }

    match (title, link, image) {
        (Some(title), Some(link), Some(image)) if missing.is_empty() => {
            validate_title(title)?;
            validate_url(link)?;
            validate_url(image)?;
            validate_tags(&tags)?;

            Ok(NewPost {
                title: title.to_string(),
                description: present(req.description.as_deref()).map(str::to_string),
                link: link.to_string(),
                image: image.to_string(),
                tags,
            })
        },
        _ => Err(ValidationError::MissingFields(missing)),
    }
}

/// Validate the body of an update-post request
pub fn validate_post_changes(req: &UpdatePostRequest) -> ValidationResult<PostChanges> {
    let title = present(req.title.as_deref());
    let image = present(req.image.as_deref());
    let tags = normalize_tags(req.tags.as_deref().unwrap_or_default());

    let mut missing = Vec::new();
    if title.is_none() {
        missing.push("title");
    }
    if image.is_none() {
        missing.push("image");
    }
    if tags.is_empty() {
        missing.push("tags");
    }

    match (title, image) {
        (Some(title), Some(image)) if missing.is_empty() => {
            validate_title(title)?;
            validate_url(image)?;
            validate_tags(&tags)?;

            Ok(PostChanges {
                title: title.to_string(),
                description: present(req.description.as_deref()).map(str::to_string),
                image: image.to_string(),
                tags,
            })
        },
        _ => Err(ValidationError::MissingFields(missing)),
    }
}
