pub mod geometry;
pub mod identifiers;
pub mod sequence;

/// Current UTC time in RFC 3339 form, used for `last_updated` fields.
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
