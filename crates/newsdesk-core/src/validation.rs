//! Server-side input validation.
//!
//! Every admin and public payload is checked here before it reaches a
//! repository. Failures are collected per field so a form can show all of
//! them at once.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

use crate::error::AppError;
use crate::models::{
    NewAdvertisement, NewArticle, NewAuthor, NewCategory, NewMediaItem, NewNavigationLink,
    NewPage, NewTag, SubscribeRequest,
};

pub const MIN_PRIORITY: i32 = 1;
pub const MAX_PRIORITY: i32 = 10;

const MAX_TITLE_LEN: usize = 255;
const MAX_SLUG_LEN: usize = 200;

/// Per-field validation messages, ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message for `field`. The first message for a field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// `Ok(())` when nothing was recorded, otherwise [`AppError::Validation`].
    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|(field, msg)| format!("{} {}", field, msg))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

/// Turns a title into a URL slug: lower-case ASCII alphanumerics joined by
/// single hyphens.
///
/// # Examples
///
/// ```
/// use newsdesk_core::validation::slugify;
///
/// assert_eq!(slugify("Breaking: Rates Rise 2%!"), "breaking-rates-rise-2");
/// assert_eq!(slugify("  --  "), "");
/// ```
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug.truncate(MAX_SLUG_LEN);
    slug.trim_end_matches('-').to_string()
}

/// Returns the explicit slug if given, otherwise one derived from `source`.
pub fn resolve_slug(explicit: Option<&str>, source: &str) -> String {
    match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        Some(slug) => slug.to_string(),
        None => slugify(source),
    }
}

fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= MAX_SLUG_LEN
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !slug.starts_with('-')
        && !slug.ends_with('-')
}

/// An absolute http(s) URL with a host, or a path on this site.
fn is_valid_url(value: &str) -> bool {
    if value.starts_with('/') {
        return !value.starts_with("//") && !value.chars().any(char::is_whitespace);
    }
    match Url::parse(value) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}

fn is_valid_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
}

fn check_required(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, "is required");
    } else if value.len() > MAX_TITLE_LEN {
        errors.add(field, format!("must be at most {} characters", MAX_TITLE_LEN));
    }
}

fn check_slug(errors: &mut ValidationErrors, explicit: Option<&str>, source: &str) {
    let slug = resolve_slug(explicit, source);
    if !is_valid_slug(&slug) {
        errors.add(
            "slug",
            "must contain only lower-case letters, digits and single hyphens",
        );
    }
}

fn check_optional_url(errors: &mut ValidationErrors, field: &str, value: Option<&str>) {
    if let Some(v) = value.filter(|v| !v.is_empty()) {
        if !is_valid_url(v) {
            errors.add(field, "must be an absolute http(s) URL or a site path");
        }
    }
}

impl NewAdvertisement {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = ValidationErrors::new();

        check_required(&mut errors, "name", &self.name);

        let has_image = self.image_url.as_deref().is_some_and(|s| !s.trim().is_empty());
        let has_code = self
            .custom_code
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty());
        if !has_image && !has_code {
            errors.add("imageUrl", "an image URL or custom code is required");
        }
        check_optional_url(&mut errors, "imageUrl", self.image_url.as_deref());
        check_optional_url(&mut errors, "linkUrl", self.link_url.as_deref());

        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&self.priority) {
            errors.add(
                "priority",
                format!("must be between {} and {}", MIN_PRIORITY, MAX_PRIORITY),
            );
        }
        for (field, dim) in [("width", self.width), ("height", self.height)] {
            if dim.is_some_and(|d| d <= 0) {
                errors.add(field, "must be positive");
            }
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                errors.add("endDate", "must not be before startDate");
            }
        }
        for rule in &self.targets {
            if rule.page_id.as_deref().is_some_and(|id| id.trim().is_empty()) {
                errors.add("targets", "pageId must not be blank");
            }
        }

        errors.into_result()
    }
}

impl NewArticle {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = ValidationErrors::new();
        check_required(&mut errors, "title", &self.title);
        if self.content.trim().is_empty() {
            errors.add("content", "is required");
        }
        check_slug(&mut errors, self.slug.as_deref(), &self.title);
        check_optional_url(&mut errors, "coverImageUrl", self.cover_image_url.as_deref());
        errors.into_result()
    }
}

impl NewCategory {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = ValidationErrors::new();
        check_required(&mut errors, "name", &self.name);
        check_slug(&mut errors, self.slug.as_deref(), &self.name);
        errors.into_result()
    }
}

impl NewTag {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = ValidationErrors::new();
        check_required(&mut errors, "name", &self.name);
        check_slug(&mut errors, self.slug.as_deref(), &self.name);
        errors.into_result()
    }
}

impl NewAuthor {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = ValidationErrors::new();
        check_required(&mut errors, "name", &self.name);
        if !is_valid_email(self.email.trim()) {
            errors.add("email", "must be a valid email address");
        }
        check_optional_url(&mut errors, "avatarUrl", self.avatar_url.as_deref());
        errors.into_result()
    }
}

impl NewPage {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = ValidationErrors::new();
        check_required(&mut errors, "title", &self.title);
        check_slug(&mut errors, self.slug.as_deref(), &self.title);
        errors.into_result()
    }
}

impl NewNavigationLink {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = ValidationErrors::new();
        check_required(&mut errors, "label", &self.label);
        if !is_valid_url(self.url.trim()) {
            errors.add("url", "must be an absolute http(s) URL or a site path");
        }
        errors.into_result()
    }
}

impl NewMediaItem {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = ValidationErrors::new();
        if !is_valid_url(self.url.trim()) {
            errors.add("url", "must be an absolute http(s) URL or a site path");
        }
        check_required(&mut errors, "fileName", &self.file_name);
        if !self.mime_type.contains('/') {
            errors.add("mimeType", "must look like type/subtype");
        }
        if self.size_bytes < 0 {
            errors.add("sizeBytes", "must not be negative");
        }
        errors.into_result()
    }
}

impl SubscribeRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = ValidationErrors::new();
        if !is_valid_email(self.email.trim()) {
            errors.add("email", "must be a valid email address");
        }
        errors.into_result()
    }
}
