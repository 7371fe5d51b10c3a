//! Filter types for queries.
//!
//! [`MetadataFilter`] constrains metadata by exact equality. [`DocumentPredicate`]
//! is a boolean expression over document content. [`WhereDocument`] is the
//! loosely-typed wire form callers deserialize; converting it into a
//! `DocumentPredicate` validates it.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Required metadata values. A document matches when every key is present in
/// its metadata with exactly the given value.
pub type MetadataFilter = HashMap<String, String>;

/// Content predicate operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "$eq")]
    Equals,
    #[serde(rename = "$contains")]
    Contains,
    #[serde(rename = "$not_contains")]
    NotContains,
    #[serde(rename = "$or")]
    Or,
    #[serde(rename = "$and")]
    And,
}

impl Operator {
    /// Wire tag of the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "$eq",
            Operator::Contains => "$contains",
            Operator::NotContains => "$not_contains",
            Operator::Or => "$or",
            Operator::And => "$and",
        }
    }

    /// Parses a wire tag.
    pub fn parse(tag: &str) -> Result<Self, ValidationError> {
        match tag {
            "" => Err(ValidationError::EmptyOperator),
            "$eq" => Ok(Operator::Equals),
            "$contains" => Ok(Operator::Contains),
            "$not_contains" => Ok(Operator::NotContains),
            "$or" => Ok(Operator::Or),
            "$and" => Ok(Operator::And),
            other => Err(ValidationError::UnsupportedOperator(other.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean expression over document content.
///
/// Leaves compare the content against a string; `Or` and `And` combine
/// sub-predicates. Call [`validate`](Self::validate) once before evaluating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentPredicate {
    /// Content equals the value exactly.
    Equals(String),
    /// Value is a substring of the content.
    Contains(String),
    /// Value is not a substring of the content.
    NotContains(String),
    /// At least one sub-predicate matches.
    Or(Vec<DocumentPredicate>),
    /// Every sub-predicate matches.
    And(Vec<DocumentPredicate>),
}

impl DocumentPredicate {
    pub fn equals(value: impl Into<String>) -> Self {
        DocumentPredicate::Equals(value.into())
    }

    pub fn contains(value: impl Into<String>) -> Self {
        DocumentPredicate::Contains(value.into())
    }

    pub fn not_contains(value: impl Into<String>) -> Self {
        DocumentPredicate::NotContains(value.into())
    }

    pub fn or(predicates: Vec<DocumentPredicate>) -> Self {
        DocumentPredicate::Or(predicates)
    }

    pub fn and(predicates: Vec<DocumentPredicate>) -> Self {
        DocumentPredicate::And(predicates)
    }

    pub fn operator(&self) -> Operator {
        match self {
            DocumentPredicate::Equals(_) => Operator::Equals,
            DocumentPredicate::Contains(_) => Operator::Contains,
            DocumentPredicate::NotContains(_) => Operator::NotContains,
            DocumentPredicate::Or(_) => Operator::Or,
            DocumentPredicate::And(_) => Operator::And,
        }
    }

    /// Checks the whole tree: leaves need a non-empty value, composites need
    /// at least one sub-predicate.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            DocumentPredicate::Equals(value)
            | DocumentPredicate::Contains(value)
            | DocumentPredicate::NotContains(value) => {
                if value.is_empty() {
                    return Err(ValidationError::MissingValue(self.operator()));
                }
                Ok(())
            }
            DocumentPredicate::Or(subs) | DocumentPredicate::And(subs) => {
                if subs.is_empty() {
                    return Err(ValidationError::MissingSubPredicates(self.operator()));
                }
                subs.iter().try_for_each(DocumentPredicate::validate)
            }
        }
    }

    /// Evaluates the predicate against document content.
    ///
    /// Has no error path; the tree must already be validated.
    pub fn matches(&self, content: &str) -> bool {
        match self {
            DocumentPredicate::Equals(value) => content == value,
            DocumentPredicate::Contains(value) => content.contains(value.as_str()),
            DocumentPredicate::NotContains(value) => !content.contains(value.as_str()),
            DocumentPredicate::Or(subs) => subs.iter().any(|p| p.matches(content)),
            DocumentPredicate::And(subs) => subs.iter().all(|p| p.matches(content)),
        }
    }
}

/// Wire form of a document predicate, e.g.
/// `{"operator": "$contains", "value": "foo"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhereDocument {
    #[serde(default)]
    pub operator: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub where_documents: Vec<WhereDocument>,
}

impl TryFrom<WhereDocument> for DocumentPredicate {
    type Error = ValidationError;

    fn try_from(wd: WhereDocument) -> Result<Self, Self::Error> {
        let predicate = match Operator::parse(&wd.operator)? {
            Operator::Equals => DocumentPredicate::Equals(wd.value),
            Operator::Contains => DocumentPredicate::Contains(wd.value),
            Operator::NotContains => DocumentPredicate::NotContains(wd.value),
            op @ (Operator::Or | Operator::And) => {
                let subs = wd
                    .where_documents
                    .into_iter()
                    .map(DocumentPredicate::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                if op == Operator::Or {
                    DocumentPredicate::Or(subs)
                } else {
                    DocumentPredicate::And(subs)
                }
            }
        };
        predicate.validate()?;
        Ok(predicate)
    }
}

impl From<&DocumentPredicate> for WhereDocument {
    fn from(p: &DocumentPredicate) -> Self {
        let operator = p.operator().as_str().to_string();
        match p {
            DocumentPredicate::Equals(v)
            | DocumentPredicate::Contains(v)
            | DocumentPredicate::NotContains(v) => WhereDocument {
                operator,
                value: v.clone(),
                where_documents: Vec::new(),
            },
            DocumentPredicate::Or(subs) | DocumentPredicate::And(subs) => WhereDocument {
                operator,
                value: String::new(),
                where_documents: subs.iter().map(WhereDocument::from).collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_and_contains_not_contains() {
        let p = DocumentPredicate::and(vec![
            DocumentPredicate::contains("foo"),
            DocumentPredicate::not_contains("bar"),
        ]);
        p.validate().unwrap();
        assert!(p.matches("foo baz"));
        assert!(!p.matches("foo bar"));
    }

    #[test]
    fn test_or_equals() {
        let p = DocumentPredicate::or(vec![DocumentPredicate::equals("x")]);
        p.validate().unwrap();
        assert!(p.matches("x"));
        assert!(!p.matches("xx"));
    }

    #[test]
    fn test_empty_or_invalid() {
        let err = DocumentPredicate::or(vec![]).validate().unwrap_err();
        assert_eq!(err, ValidationError::MissingSubPredicates(Operator::Or));
        let err = DocumentPredicate::and(vec![]).validate().unwrap_err();
        assert_eq!(err, ValidationError::MissingSubPredicates(Operator::And));
    }

    #[test]
    fn test_empty_leaf_value_invalid() {
        for p in [
            DocumentPredicate::equals(""),
            DocumentPredicate::contains(""),
            DocumentPredicate::not_contains(""),
        ] {
            assert_eq!(
                p.validate().unwrap_err(),
                ValidationError::MissingValue(p.operator())
            );
        }
    }

    #[test]
    fn test_validation_is_recursive() {
        let p = DocumentPredicate::or(vec![
            DocumentPredicate::contains("ok"),
            DocumentPredicate::and(vec![DocumentPredicate::contains("")]),
        ]);
        assert_eq!(
            p.validate().unwrap_err(),
            ValidationError::MissingValue(Operator::Contains)
        );
    }

    #[test]
    fn test_validate_idempotent_and_pure() {
        let p = DocumentPredicate::or(vec![
            DocumentPredicate::equals("a"),
            DocumentPredicate::and(vec![
                DocumentPredicate::contains("b"),
                DocumentPredicate::not_contains("c"),
            ]),
        ]);
        let before = p.clone();
        assert!(p.validate().is_ok());
        assert!(p.validate().is_ok());
        let _ = p.matches("abc");
        assert_eq!(p, before);
    }

    #[test]
    fn test_unvalidated_composites_fall_through() {
        assert!(!DocumentPredicate::or(vec![]).matches("anything"));
        assert!(DocumentPredicate::and(vec![]).matches("anything"));
    }

    #[test]
    fn test_operator_parse() {
        assert_eq!(Operator::parse("$not_contains").unwrap(), Operator::NotContains);
        assert_eq!(Operator::parse("").unwrap_err(), ValidationError::EmptyOperator);
        assert_eq!(
            Operator::parse("$regex").unwrap_err(),
            ValidationError::UnsupportedOperator("$regex".into())
        );
    }

    #[test]
    fn test_where_document_from_json() {
        let wd: WhereDocument = serde_json::from_str(
            r#"{
                "operator": "$and",
                "where_documents": [
                    {"operator": "$contains", "value": "foo"},
                    {"operator": "$not_contains", "value": "bar"}
                ]
            }"#,
        )
        .unwrap();
        let p = DocumentPredicate::try_from(wd).unwrap();
        assert_eq!(
            p,
            DocumentPredicate::and(vec![
                DocumentPredicate::contains("foo"),
                DocumentPredicate::not_contains("bar"),
            ])
        );
    }

    #[test]
    fn test_where_document_rejects_bad_operator() {
        let wd = WhereDocument {
            operator: "$or".into(),
            value: String::new(),
            where_documents: vec![WhereDocument {
                operator: "$like".into(),
                value: "x".into(),
                where_documents: vec![],
            }],
        };
        assert_eq!(
            DocumentPredicate::try_from(wd).unwrap_err(),
            ValidationError::UnsupportedOperator("$like".into())
        );
        assert_eq!(
            DocumentPredicate::try_from(WhereDocument::default()).unwrap_err(),
            ValidationError::EmptyOperator
        );
    }

    #[test]
    fn test_where_document_from_predicate() {
        let p = DocumentPredicate::or(vec![DocumentPredicate::equals("x")]);
        let wd = WhereDocument::from(&p);
        assert_eq!(wd.operator, "$or");
        assert_eq!(wd.where_documents[0].operator, "$eq");
        assert_eq!(DocumentPredicate::try_from(wd).unwrap(), p);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ValidationError::MissingValue(Operator::Contains).to_string(),
            "where document operator $contains requires a value"
        );
        assert_eq!(
            ValidationError::MissingSubPredicates(Operator::Or).to_string(),
            "where document operator $or must have at least one sub-filter"
        );
    }
}
