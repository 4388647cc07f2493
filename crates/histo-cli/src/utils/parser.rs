use std::ops::RangeInclusive;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid item set reference '{0}'. Expected 'context/slug' (e.g., 'complex_type/class_i_with_peptide').")]
    InvalidSetReference(String),

    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    InvalidKeyValue(String),

    #[error("Invalid residue window '{0}'. Expected 'start-end' or 'start..=end' (e.g., '3-180').")]
    InvalidWindow(String),

    #[error("Invalid chain identifier '{0}'. Expected a single character.")]
    InvalidChainId(String),

    #[error("Component '{component}' cannot be empty in '{input}'.")]
    EmptyComponent {
        component: &'static str,
        input: String,
    },
}

/// An item set named on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetReference {
    pub context: String,
    pub slug: String,
}

pub fn parse_set_reference(input: &str) -> Result<SetReference, ParseError> {
    let (context, slug) = input
        .trim()
        .split_once('/')
        .ok_or_else(|| ParseError::InvalidSetReference(input.to_string()))?;
    if slug.contains('/') {
        return Err(ParseError::InvalidSetReference(input.to_string()));
    }
    let non_empty = |component: &'static str, value: &str| {
        if value.is_empty() {
            Err(ParseError::EmptyComponent {
                component,
                input: input.to_string(),
            })
        } else {
            Ok(value.to_string())
        }
    };
    Ok(SetReference {
        context: non_empty("context", context)?,
        slug: non_empty("slug", slug)?,
    })
}

pub fn parse_key_value(input: &str) -> Result<(&str, &str), ParseError> {
    match input.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
        _ => Err(ParseError::InvalidKeyValue(input.to_string())),
    }
}

pub fn parse_window(input: &str) -> Result<RangeInclusive<isize>, ParseError> {
    let invalid = || ParseError::InvalidWindow(input.to_string());
    let trimmed = input.trim();
    // A leading '-' belongs to the start, so split after the first character.
    let (start, end) = trimmed
        .split_once("..=")
        .or_else(|| {
            let (first, rest) = trimmed.split_at(trimmed.chars().next().map_or(0, char::len_utf8));
            rest.split_once('-')
                .map(|(tail, end)| (&trimmed[..first.len() + tail.len()], end))
        })
        .ok_or_else(invalid)?;
    let start: isize = start.trim().parse().map_err(|_| invalid())?;
    let end: isize = end.trim().parse().map_err(|_| invalid())?;
    if start > end {
        return Err(invalid());
    }
    Ok(start..=end)
}

pub fn parse_chain_id(input: &str) -> Result<char, ParseError> {
    let mut chars = input.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(ParseError::InvalidChainId(input.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_references_split_on_one_slash() {
        assert_eq!(
            parse_set_reference("complex_type/class_i_with_peptide").unwrap(),
            SetReference {
                context: "complex_type".to_string(),
                slug: "class_i_with_peptide".to_string(),
            }
        );
        assert_eq!(
            parse_set_reference("features"),
            Err(ParseError::InvalidSetReference("features".to_string()))
        );
        assert!(parse_set_reference("a/b/c").is_err());
        assert!(matches!(
            parse_set_reference("/slug"),
            Err(ParseError::EmptyComponent { component: "context", .. })
        ));
    }

    #[test]
    fn key_values_keep_everything_after_the_first_equals() {
        assert_eq!(
            parse_key_value("pipeline.privacy=a=b").unwrap(),
            ("pipeline.privacy", "a=b")
        );
        assert!(parse_key_value("no-equals").is_err());
        assert!(parse_key_value("=value").is_err());
    }

    #[test]
    fn windows_accept_both_notations_and_negative_starts() {
        assert_eq!(parse_window("3-180").unwrap(), 3..=180);
        assert_eq!(parse_window("3..=180").unwrap(), 3..=180);
        assert_eq!(parse_window("-5-10").unwrap(), -5..=10);
        assert!(parse_window("180-3").is_err());
        assert!(parse_window("abc").is_err());
        assert!(parse_window("").is_err());
    }

    #[test]
    fn chain_ids_are_single_characters() {
        assert_eq!(parse_chain_id(" A ").unwrap(), 'A');
        assert!(parse_chain_id("AB").is_err());
        assert!(parse_chain_id("").is_err());
    }
}
