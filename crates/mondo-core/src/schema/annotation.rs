//! Parser for the relationship annotation attached to entity fields.
//!
//! The grammar is `kind(key:value, key:value, ...)` where `kind` is
//! `referenceOne` or `referenceMany`. Recognized keys are `targetDocument`
//! (required), `mappedBy`, and `cascade` (`persist`, `remove`, or `all`).
//! Whitespace inside the argument list is insignificant.

use super::Cascade;
use crate::{Error, Result};

/// Relationship arity declared by an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    One,
    Many,
}

/// Parsed form of a relationship annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationAnnotation {
    pub kind: ReferenceKind,
    pub target: String,
    pub mapped_by: Option<String>,
    pub cascade: Cascade,
}

pub fn parse(input: &str) -> Result<RelationAnnotation> {
    let input = input.trim();
    let Some((head, rest)) = input.split_once('(') else {
        return Err(Error::configuration(format!(
            "malformed annotation `{input}`: expected `kind(arguments)`"
        )));
    };
    let kind = match head.trim() {
        "referenceOne" => ReferenceKind::One,
        "referenceMany" => ReferenceKind::Many,
        other => {
            return Err(Error::configuration(format!(
                "unknown relationship kind `{other}`"
            )))
        }
    };
    let Some(args) = rest.trim_end().strip_suffix(')') else {
        return Err(Error::configuration(format!(
            "malformed annotation `{input}`: missing closing parenthesis"
        )));
    };

    let mut target = None;
    let mut mapped_by = None;
    let mut cascade = None;

    for part in args.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let Some((key, value)) = part.split_once(':') else {
            return Err(Error::configuration(format!(
                "malformed argument `{part}`: expected `key:value`"
            )));
        };
        let key = key.trim();
        let value = value.trim();
        if value.is_empty() {
            return Err(Error::configuration(format!(
                "argument `{key}` has an empty value"
            )));
        }
        match key {
            "targetDocument" => {
                if target.is_some() {
                    return Err(Error::configuration("duplicate `targetDocument` argument"));
                }
                target = Some(value.to_string());
            }
            "mappedBy" => {
                if mapped_by.is_some() {
                    return Err(Error::configuration("duplicate `mappedBy` argument"));
                }
                mapped_by = Some(value.to_string());
            }
            "cascade" => {
                if cascade.is_some() {
                    return Err(Error::configuration("duplicate `cascade` argument"));
                }
                // annotations in the wild write `cascade:Persist`, so the
                // policy name is matched case-insensitively
                let policy = match value.to_ascii_lowercase().as_str() {
                    "persist" => Cascade::PERSIST,
                    "remove" => Cascade::REMOVE,
                    "all" => Cascade::ALL,
                    other => {
                        return Err(Error::configuration(format!(
                            "unknown cascade policy `{other}`"
                        )))
                    }
                };
                cascade = Some(policy);
            }
            other => {
                return Err(Error::configuration(format!(
                    "unknown annotation key `{other}`"
                )))
            }
        }
    }

    let Some(target) = target else {
        return Err(Error::configuration(format!(
            "annotation `{input}` is missing `targetDocument`"
        )));
    };

    Ok(RelationAnnotation {
        kind,
        target,
        mapped_by,
        cascade: cascade.unwrap_or(Cascade::NONE),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_one_minimal() {
        let parsed = parse("referenceOne(targetDocument:Role)").unwrap();
        assert_eq!(parsed.kind, ReferenceKind::One);
        assert_eq!(parsed.target, "Role");
        assert_eq!(parsed.mapped_by, None);
        assert_eq!(parsed.cascade, Cascade::NONE);
    }

    #[test]
    fn reference_many_with_all_arguments() {
        let parsed =
            parse("referenceMany(targetDocument:Post, mappedBy:Author, cascade:all)").unwrap();
        assert_eq!(parsed.kind, ReferenceKind::Many);
        assert_eq!(parsed.target, "Post");
        assert_eq!(parsed.mapped_by.as_deref(), Some("Author"));
        assert_eq!(parsed.cascade, Cascade::ALL);
    }

    #[test]
    fn whitespace_is_insignificant() {
        let parsed = parse("  referenceMany ( targetDocument : Tag , cascade : persist )  ").unwrap();
        assert_eq!(parsed.target, "Tag");
        assert_eq!(parsed.cascade, Cascade::PERSIST);
    }

    #[test]
    fn cascade_policy_is_case_insensitive() {
        let parsed = parse("referenceOne(targetDocument:Role,cascade:Persist)").unwrap();
        assert_eq!(parsed.cascade, Cascade::PERSIST);
    }

    #[test]
    fn missing_target_document_is_fatal() {
        let err = parse("referenceOne(cascade:persist)").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("targetDocument"));
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = parse("referenceOne(targetDocument:Role,cascades:all)").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("unknown annotation key"));
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let err = parse("referenceOne(targetDocument:Role,targetDocument:Post)").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(parse("referenceAll(targetDocument:Role)").unwrap_err().is_configuration());
    }

    #[test]
    fn malformed_syntax_is_rejected() {
        assert!(parse("referenceOne").is_err());
        assert!(parse("referenceOne(targetDocument:Role").is_err());
        assert!(parse("referenceOne(targetDocument)").is_err());
        assert!(parse("referenceOne(cascade:)").is_err());
    }
}
