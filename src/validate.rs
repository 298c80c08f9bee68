//! 结构校验
//!
//! 只报告问题，从不修复。

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::config::ValidationRules;
use crate::control::{GeometryField, GENERIC_CONTROL_TAG};
use crate::preset::PresetDocument;
use crate::utils::PresetError;

/// 校验发生的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// 加载之后、变换之前
    PreTransform,
    /// 内存中变换之后、写入之前
    PostTransform,
    /// 写入磁盘并重新读取之后
    PostWrite,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::PreTransform => "before transform",
            Stage::PostTransform => "after transform",
            Stage::PostWrite => "after write",
        })
    }
}

/// 结构问题
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "problem", rename_all = "kebab-case")]
pub enum Problem {
    UnexpectedRoot { expected: String, found: String },
    MissingAttribute { element: String, attribute: String },
    InvalidNumber { element: String, attribute: String, value: String },
    NegativeGeometry { element: String, attribute: String, value: String },
    DuplicateId { id: String, first: usize, second: usize },
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::UnexpectedRoot { expected, found } => {
                write!(f, "root element is <{}>, expected <{}>", found, expected)
            }
            Problem::MissingAttribute { element, attribute } => {
                write!(f, "{} is missing required attribute '{}'", element, attribute)
            }
            Problem::InvalidNumber { element, attribute, value } => {
                write!(f, "{} has non-numeric {}=\"{}\"", element, attribute, value)
            }
            Problem::NegativeGeometry { element, attribute, value } => {
                write!(f, "{} has negative {}={}", element, attribute, value)
            }
            Problem::DuplicateId { id, first, second } => {
                write!(f, "duplicate id '{}' on controls #{} and #{}", id, first, second)
            }
        }
    }
}

/// 检查文档，返回发现的全部问题
pub fn validate(document: &PresetDocument, rules: &ValidationRules) -> Vec<Problem> {
    let mut problems = Vec::new();

    if let Some(expected) = &rules.root_tag {
        if document.root_tag() != expected {
            problems.push(Problem::UnexpectedRoot {
                expected: expected.clone(),
                found: document.root_tag().to_string(),
            });
        }
    }

    let mut seen_ids: HashMap<String, usize> = HashMap::new();

    for element in document.elements() {
        // 通用 <control> 必须声明 type
        if element.tag == GENERIC_CONTROL_TAG
            && !element.has_attribute("type")
            && !rules.required_attributes.iter().any(|a| a == "type")
        {
            problems.push(Problem::MissingAttribute {
                element: element.describe(),
                attribute: "type".to_string(),
            });
        }

        for attribute in &rules.required_attributes {
            if !element.has_attribute(attribute) {
                problems.push(Problem::MissingAttribute {
                    element: element.describe(),
                    attribute: attribute.clone(),
                });
            }
        }

        for field in GeometryField::ALL {
            match element.geometry_value(field) {
                Ok(Some(value)) if value < 0.0 => problems.push(Problem::NegativeGeometry {
                    element: element.describe(),
                    attribute: field.attribute_name().to_string(),
                    value: crate::utils::format_number(value),
                }),
                Ok(_) => {}
                Err(raw) => problems.push(Problem::InvalidNumber {
                    element: element.describe(),
                    attribute: field.attribute_name().to_string(),
                    value: raw,
                }),
            }
        }

        if rules.unique_ids {
            if let Some(id) = element.attribute("id") {
                let id = id.into_owned();
                match seen_ids.get(&id) {
                    Some(&first) => problems.push(Problem::DuplicateId {
                        id,
                        first,
                        second: element.index,
                    }),
                    None => {
                        seen_ids.insert(id, element.index);
                    }
                }
            }
        }
    }

    problems
}

/// 检查文档，有问题时返回 `PresetError::Validation`
pub fn ensure_valid(
    document: &PresetDocument,
    rules: &ValidationRules,
    stage: Stage,
) -> Result<(), PresetError> {
    let problems = validate(document, rules);
    if problems.is_empty() {
        log::debug!("校验通过 ({}): {}", stage, document.path().display());
        return Ok(());
    }

    for problem in &problems {
        log::error!("校验失败 ({}): {}", stage, problem);
    }
    Err(PresetError::Validation { stage, problems })
}
