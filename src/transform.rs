use serde::{Deserialize, Serialize};
use std::fmt;

use crate::control::{Geometry, GeometryField};
use crate::editor::ChangeRecord;
use crate::preset::PresetDocument;
use crate::select::Selection;
use crate::utils::{format_number, round_geometry};

/// 变换方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// 用给定值覆盖
    Set,
    /// 在原值上加上给定值
    Delta,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Set => "set",
            Operation::Delta => "delta",
        })
    }
}

/// 一次运行的变换意图，构造后不可变
///
/// `values` 中为 `None` 的字段不受影响。`Delta` 模式下值为 0 的字段视为不修改。
#[derive(Debug, Clone)]
pub struct TransformSpec {
    selection: Selection,
    operation: Operation,
    values: Geometry,
}

impl TransformSpec {
    pub fn new(selection: Selection, operation: Operation, values: Geometry) -> Self {
        let mut values = values;
        if operation == Operation::Delta {
            for field in GeometryField::ALL {
                if values.get(field) == Some(0.0) {
                    values.set(field, None);
                }
            }
        }
        Self {
            selection,
            operation,
            values,
        }
    }

    pub fn set(selection: Selection, values: Geometry) -> Self {
        Self::new(selection, Operation::Set, values)
    }

    pub fn delta(selection: Selection, values: Geometry) -> Self {
        Self::new(selection, Operation::Delta, values)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn values(&self) -> &Geometry {
        &self.values
    }

    /// 被修改的字段
    pub fn targets(&self) -> impl Iterator<Item = GeometryField> + '_ {
        GeometryField::ALL
            .into_iter()
            .filter(|field| self.values.get(*field).is_some())
    }

    /// 没有任何字段被修改
    pub fn is_noop(&self) -> bool {
        self.values.is_empty()
    }

    fn compute(&self, old: Option<f64>, value: f64) -> f64 {
        let result = match self.operation {
            Operation::Set => value,
            Operation::Delta => old.unwrap_or(0.0) + value,
        };
        round_geometry(result)
    }
}

/// 对选中的控件应用变换
///
/// 只修改内存中的文档，每个控件生成一条 `ChangeRecord`。
/// 宽高计算结果为负时钳制为 0 并记录在变更中，不会中止整个运行。
pub fn transform(
    document: &mut PresetDocument,
    indices: &[usize],
    spec: &TransformSpec,
) -> Vec<ChangeRecord> {
    let mut changes = Vec::with_capacity(indices.len());

    for &index in indices {
        let Some(element) = document.element_mut(index) else {
            log::warn!("控件索引 {} 不存在，已跳过", index);
            continue;
        };

        let old = element.geometry();
        let mut new = old;
        let mut clamped = Vec::new();

        for field in spec.targets() {
            let Some(value) = spec.values.get(field) else {
                continue;
            };

            let mut result = spec.compute(old.get(field), value);
            if field.is_size() && result < 0.0 {
                log::warn!(
                    "{} 的 {} 计算结果为 {}，已钳制为 0",
                    element.describe(),
                    field,
                    format_number(result)
                );
                result = 0.0;
                clamped.push(field);
            }

            new.set(field, Some(result));
            // 数值未变化时保留原始文本
            if old.get(field) != Some(result) {
                element.set_attribute(field.attribute_name(), &format_number(result));
            }
        }

        changes.push(ChangeRecord {
            element_index: element.index,
            name: element.display_name(),
            type_name: element.type_name.clone(),
            kind: element.kind,
            old,
            new,
            clamped,
        });
    }

    log::debug!("{} 变换: {} 个控件", spec.operation, changes.len());
    changes
}
