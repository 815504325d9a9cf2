//! Portable JSON encoding of condition trees.
//!
//! Each node is one JSON object: the discriminator tag lives in a `"type"`
//! property, the node's parameters sit alongside it, and children are
//! encoded recursively. The tag spellings are frozen so documents stay
//! readable across runtimes sharing the format.
//!
//! ## Tag table
//!
//! ```text
//! Tag                                Parameters
//! and / or                           conditions
//! not                                condition
//! equal / notequal                   target
//! greaterthan / greaterthanorequal   threshold
//! lessthan / lessthanorequal         threshold
//! between                            min, max
//! contains / notcontains             keyword
//! startswith / notstartswith         prefix
//! endwith / notendwith               suffix
//! isnull / isnotnull                 (none)
//! fieldName                          fieldName, innerCondition
//! ```
//!
//! The `endwith`/`notendwith` spellings and the camelCase `fieldName` tag
//! and property names are part of the frozen format. Unknown properties on
//! a node are ignored on decode; unknown tags and missing parameters fail
//! with [`RuleError::MalformedRule`].

use serde::{Deserialize, Serialize};

use crate::types::{Condition, RuleError, Value};

// ---------------------------------------------------------------------------
// Serialized type hierarchy
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
enum SerializedNode {
    #[serde(rename = "and")]
    And { conditions: Vec<SerializedNode> },
    #[serde(rename = "or")]
    Or { conditions: Vec<SerializedNode> },
    #[serde(rename = "not")]
    Not { condition: Box<SerializedNode> },
    #[serde(rename = "equal")]
    Equal { target: SerializedValue },
    #[serde(rename = "notequal")]
    NotEqual { target: SerializedValue },
    #[serde(rename = "greaterthan")]
    GreaterThan { threshold: SerializedValue },
    #[serde(rename = "greaterthanorequal")]
    GreaterThanOrEqual { threshold: SerializedValue },
    #[serde(rename = "lessthan")]
    LessThan { threshold: SerializedValue },
    #[serde(rename = "lessthanorequal")]
    LessThanOrEqual { threshold: SerializedValue },
    #[serde(rename = "between")]
    Between {
        min: SerializedValue,
        max: SerializedValue,
    },
    #[serde(rename = "contains")]
    Contains { keyword: String },
    #[serde(rename = "notcontains")]
    NotContains { keyword: String },
    #[serde(rename = "startswith")]
    StartsWith { prefix: String },
    #[serde(rename = "notstartswith")]
    NotStartsWith { prefix: String },
    #[serde(rename = "endwith")]
    EndsWith { suffix: String },
    #[serde(rename = "notendwith")]
    NotEndsWith { suffix: String },
    #[serde(rename = "isnull")]
    IsNull,
    #[serde(rename = "isnotnull")]
    IsNotNull,
    #[serde(rename = "fieldName")]
    FieldByName {
        #[serde(rename = "fieldName")]
        field_name: String,
        #[serde(rename = "innerCondition")]
        inner_condition: Box<SerializedNode>,
    },
}

/// Parameter values ride as bare JSON scalars, no tagging.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum SerializedValue {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

// ---------------------------------------------------------------------------
// Value conversion
// ---------------------------------------------------------------------------

fn serialize_value(value: &Value) -> SerializedValue {
    match value {
        Value::Null => SerializedValue::Null,
        Value::Int(v) => SerializedValue::Int(*v),
        Value::Float(v) => SerializedValue::Float(*v),
        Value::Bool(v) => SerializedValue::Bool(*v),
        Value::String(v) => SerializedValue::Str(v.clone()),
    }
}

fn deserialize_value(value: SerializedValue) -> Value {
    match value {
        SerializedValue::Null => Value::Null,
        SerializedValue::Int(v) => Value::Int(v),
        SerializedValue::Float(v) => Value::Float(v),
        SerializedValue::Bool(v) => Value::Bool(v),
        SerializedValue::Str(v) => Value::String(v),
    }
}

// ---------------------------------------------------------------------------
// Node conversion
// ---------------------------------------------------------------------------

fn serialize_node(cond: &Condition) -> Result<SerializedNode, RuleError> {
    Ok(match cond {
        Condition::Equal { target } => SerializedNode::Equal {
            target: serialize_value(target),
        },
        Condition::NotEqual { target } => SerializedNode::NotEqual {
            target: serialize_value(target),
        },
        Condition::GreaterThan { threshold } => SerializedNode::GreaterThan {
            threshold: serialize_value(threshold),
        },
        Condition::GreaterThanOrEqual { threshold } => SerializedNode::GreaterThanOrEqual {
            threshold: serialize_value(threshold),
        },
        Condition::LessThan { threshold } => SerializedNode::LessThan {
            threshold: serialize_value(threshold),
        },
        Condition::LessThanOrEqual { threshold } => SerializedNode::LessThanOrEqual {
            threshold: serialize_value(threshold),
        },
        Condition::Between { min, max } => SerializedNode::Between {
            min: serialize_value(min),
            max: serialize_value(max),
        },
        Condition::Contains { keyword } => SerializedNode::Contains {
            keyword: keyword.clone(),
        },
        Condition::NotContains { keyword } => SerializedNode::NotContains {
            keyword: keyword.clone(),
        },
        Condition::StartsWith { prefix } => SerializedNode::StartsWith {
            prefix: prefix.clone(),
        },
        Condition::NotStartsWith { prefix } => SerializedNode::NotStartsWith {
            prefix: prefix.clone(),
        },
        Condition::EndsWith { suffix } => SerializedNode::EndsWith {
            suffix: suffix.clone(),
        },
        Condition::NotEndsWith { suffix } => SerializedNode::NotEndsWith {
            suffix: suffix.clone(),
        },
        Condition::IsNull => SerializedNode::IsNull,
        Condition::IsNotNull => SerializedNode::IsNotNull,
        Condition::And(children) => SerializedNode::And {
            conditions: serialize_nodes(children)?,
        },
        Condition::Or(children) => SerializedNode::Or {
            conditions: serialize_nodes(children)?,
        },
        Condition::Not(inner) => SerializedNode::Not {
            condition: Box::new(serialize_node(inner)?),
        },
        Condition::Field { .. } => return Err(RuleError::Unserializable),
        Condition::FieldByName { field, inner } => SerializedNode::FieldByName {
            field_name: field.clone(),
            inner_condition: Box::new(serialize_node(inner)?),
        },
    })
}

fn serialize_nodes(children: &[Condition]) -> Result<Vec<SerializedNode>, RuleError> {
    children.iter().map(serialize_node).collect()
}

fn deserialize_node(node: SerializedNode) -> Condition {
    match node {
        SerializedNode::And { conditions } => {
            Condition::And(conditions.into_iter().map(deserialize_node).collect())
        }
        SerializedNode::Or { conditions } => {
            Condition::Or(conditions.into_iter().map(deserialize_node).collect())
        }
        SerializedNode::Not { condition } => Condition::Not(Box::new(deserialize_node(*condition))),
        SerializedNode::Equal { target } => Condition::Equal {
            target: deserialize_value(target),
        },
        SerializedNode::NotEqual { target } => Condition::NotEqual {
            target: deserialize_value(target),
        },
        SerializedNode::GreaterThan { threshold } => Condition::GreaterThan {
            threshold: deserialize_value(threshold),
        },
        SerializedNode::GreaterThanOrEqual { threshold } => Condition::GreaterThanOrEqual {
            threshold: deserialize_value(threshold),
        },
        SerializedNode::LessThan { threshold } => Condition::LessThan {
            threshold: deserialize_value(threshold),
        },
        SerializedNode::LessThanOrEqual { threshold } => Condition::LessThanOrEqual {
            threshold: deserialize_value(threshold),
        },
        SerializedNode::Between { min, max } => Condition::Between {
            min: deserialize_value(min),
            max: deserialize_value(max),
        },
        SerializedNode::Contains { keyword } => Condition::Contains { keyword },
        SerializedNode::NotContains { keyword } => Condition::NotContains { keyword },
        SerializedNode::StartsWith { prefix } => Condition::StartsWith { prefix },
        SerializedNode::NotStartsWith { prefix } => Condition::NotStartsWith { prefix },
        SerializedNode::EndsWith { suffix } => Condition::EndsWith { suffix },
        SerializedNode::NotEndsWith { suffix } => Condition::NotEndsWith { suffix },
        SerializedNode::IsNull => Condition::IsNull,
        SerializedNode::IsNotNull => Condition::IsNotNull,
        SerializedNode::FieldByName {
            field_name,
            inner_condition,
        } => Condition::FieldByName {
            field: field_name,
            inner: Box::new(deserialize_node(*inner_condition)),
        },
    }
}

// ---------------------------------------------------------------------------
// Public encode/decode
// ---------------------------------------------------------------------------

pub(crate) fn encode(cond: &Condition) -> Result<String, RuleError> {
    let node = serialize_node(cond)?;
    Ok(serde_json::to_string(&node)?)
}

pub(crate) fn encode_pretty(cond: &Condition) -> Result<String, RuleError> {
    let node = serialize_node(cond)?;
    Ok(serde_json::to_string_pretty(&node)?)
}

pub(crate) fn decode(text: &str) -> Result<Condition, RuleError> {
    let node: SerializedNode = serde_json::from_str(text)?;
    Ok(deserialize_node(node))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
