use thiserror::Error;

/// Everything that can go wrong while building, evaluating, or
/// round-tripping a condition tree. All variants indicate a programming
/// or data error and propagate to the caller; none is downgraded to a
/// `false` evaluation result.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("imbalanced rule: {reason}")]
    ImbalancedRule { reason: String },

    #[error("field '{field}' not found on type '{ty}'")]
    FieldNotFound { field: String, ty: String },

    #[error("type mismatch: expected {expected}, found {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("condition contains an extractor field node and cannot be serialized")]
    Unserializable,

    #[error("malformed rule document: {0}")]
    MalformedRule(#[from] serde_json::Error),
}

impl RuleError {
    pub(crate) fn mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        RuleError::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub(crate) fn field_not_found(field: impl Into<String>, ty: impl Into<String>) -> Self {
        RuleError::FieldNotFound {
            field: field.into(),
            ty: ty.into(),
        }
    }

    pub(crate) fn imbalanced(reason: impl Into<String>) -> Self {
        RuleError::ImbalancedRule {
            reason: reason.into(),
        }
    }
}
