//! Document field names and `%lang%` placeholder handling.

use crate::error::QueryError;

/// Placeholder replaced by the active search language.
pub const LANG_PLACEHOLDER: &str = "%lang%";

pub const LANGUAGE_FIELD: &str = "lang";
pub const TITLE_FIELD: &str = "title_lang.%lang%";
pub const BODY_FIELD: &str = "body_lang.%lang%";
pub const META_DESC_FIELD: &str = "meta_desc_lang.%lang%";
pub const TREC_ID_FIELD: &str = "warc_trec_id";
pub const HOSTNAME_FIELD: &str = "warc_target_hostname";
/// Untokenized hostname. Filtering on it suppresses result grouping.
pub const HOSTNAME_RAW_FIELD: &str = "warc_target_hostname.raw";
pub const PATH_FIELD: &str = "warc_target_path";
pub const URI_FIELD: &str = "warc_target_uri";
pub const SPAM_RANK_FIELD: &str = "spam_rank";
pub const PAGE_RANK_FIELD: &str = "page_rank";

/// Substitute the language placeholder without validation.
pub fn localized(template: &str, language: &str) -> String {
    template.replace(LANG_PLACEHOLDER, language)
}

/// Substitute the language placeholder and check that the result can be sent
/// to the backend as a field name.
pub fn resolve_field(template: &str, language: &str) -> Result<String, QueryError> {
    let name = localized(template.trim(), language);
    let invalid = name.is_empty()
        || name.starts_with('.')
        || name.ends_with('.')
        || name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '%' | '^' | ',' | '"' | '\\'));
    if invalid {
        return Err(QueryError::InvalidSearchField(template.to_string()));
    }
    Ok(name)
}
