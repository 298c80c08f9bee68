use serde::Serialize;
use std::collections::BTreeMap;

use super::PresetDocument;
use crate::control::ControlKind;

/// 文档统计信息
#[derive(Debug, Clone, Serialize)]
pub struct PresetStats {
    pub name: String,
    pub root_tag: String,
    pub control_count: usize,
    /// 按原始类型名统计（如 `labeled-knob`、`image`）
    pub by_type: BTreeMap<String, usize>,
    /// 按控件类型统计
    pub by_kind: BTreeMap<ControlKind, usize>,
}

impl std::fmt::Display for PresetStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== 预设统计信息 ===")?;
        writeln!(f, "名称: {}", self.name)?;
        writeln!(f, "根元素: {}", self.root_tag)?;
        writeln!(f, "控件数量: {}", self.control_count)?;
        writeln!(f, "可用控件类型:")?;
        for (type_name, count) in &self.by_type {
            writeln!(f, "- {}: {} 个", type_name, count)?;
        }
        Ok(())
    }
}

impl PresetDocument {
    /// 文件名（不含目录）
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// 按原始类型名统计控件数量
    pub fn control_types(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for element in &self.elements {
            *counts.entry(element.type_name.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// 文档中出现过的控件类型（按枚举顺序）
    pub fn kinds_present(&self) -> Vec<ControlKind> {
        ControlKind::ALL
            .into_iter()
            .filter(|kind| self.elements.iter().any(|e| e.kind == *kind))
            .collect()
    }

    /// 获取统计信息
    pub fn get_stats(&self) -> PresetStats {
        let mut by_kind = BTreeMap::new();
        for element in &self.elements {
            *by_kind.entry(element.kind).or_insert(0) += 1;
        }

        PresetStats {
            name: self.name(),
            root_tag: self.root_tag.clone(),
            control_count: self.elements.len(),
            by_type: self.control_types(),
            by_kind,
        }
    }
}
