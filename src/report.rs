use serde::Serialize;
use std::collections::BTreeMap;

use crate::control::{format_optional, ControlKind};
use crate::editor::ChangeRecord;

/// 变更预览
///
/// 变更记录的纯函数视图：受影响的控件数、逐控件的新旧几何以及按类型的统计。
#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    /// 被选中的控件数
    pub affected: usize,
    /// 几何实际发生变化的控件数
    pub changed: usize,
    /// 有字段被钳制的控件数
    pub clamped: usize,
    /// 按原始类型名统计
    pub by_type: BTreeMap<String, usize>,
    /// 按控件类型统计
    pub by_kind: BTreeMap<ControlKind, usize>,
    pub changes: Vec<ChangeRecord>,
}

impl Preview {
    pub fn new(changes: &[ChangeRecord]) -> Self {
        let mut by_type = BTreeMap::new();
        let mut by_kind = BTreeMap::new();
        for change in changes {
            *by_type.entry(change.type_name.clone()).or_insert(0) += 1;
            *by_kind.entry(change.kind).or_insert(0) += 1;
        }

        Self {
            affected: changes.len(),
            changed: changes.iter().filter(|c| !c.is_noop()).count(),
            clamped: changes.iter().filter(|c| c.was_clamped()).count(),
            by_type,
            by_kind,
            changes: changes.to_vec(),
        }
    }

    pub fn has_changes(&self) -> bool {
        self.changed > 0
    }
}

impl std::fmt::Display for Preview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.changes.is_empty() {
            return writeln!(f, "没有选中任何控件。");
        }

        writeln!(f, "=== 变更预览 ===")?;
        writeln!(f, "{}", "-".repeat(50))?;

        for change in &self.changes {
            writeln!(
                f,
                "控件: {} (类型: {}, #{})",
                change.name, change.type_name, change.element_index
            )?;
            let changed = change.changed_fields();
            if changed.is_empty() {
                writeln!(f, "  (无变化)")?;
            }
            for field in changed {
                write!(
                    f,
                    "  {:<7} {:>8} → {:>8}",
                    format!("{}:", field),
                    format_optional(change.old.get(field)),
                    format_optional(change.new.get(field))
                )?;
                if change.clamped.contains(&field) {
                    write!(f, "  (负值已钳制为 0)")?;
                }
                writeln!(f)?;
            }
            writeln!(f, "{}", "-".repeat(30))?;
        }

        writeln!(f, "选中控件: {}", self.affected)?;
        writeln!(f, "发生变化: {}", self.changed)?;
        if self.clamped > 0 {
            writeln!(f, "钳制: {}", self.clamped)?;
        }
        writeln!(f, "按类型统计:")?;
        for (type_name, count) in &self.by_type {
            writeln!(f, "- {}: {}", type_name, count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{Geometry, GeometryField};

    fn change(index: usize, type_name: &str, kind: ControlKind, old: Geometry, new: Geometry) -> ChangeRecord {
        ChangeRecord {
            element_index: index,
            name: format!("c{}", index),
            type_name: type_name.into(),
            kind,
            old,
            new,
            clamped: Vec::new(),
        }
    }

    fn sample() -> Vec<ChangeRecord> {
        let base = Geometry::new(10.0, 20.0, 5.0, 5.0);
        let mut clamped = change(2, "button", ControlKind::Button, base, base.with(GeometryField::Width, 0.0));
        clamped.clamped.push(GeometryField::Width);
        vec![
            change(0, "knob", ControlKind::Knob, base, base.with(GeometryField::X, 15.0)),
            change(1, "labeled-knob", ControlKind::Knob, base, base),
            clamped,
        ]
    }

    #[test]
    fn test_preview_counts() {
        let preview = Preview::new(&sample());

        assert_eq!(preview.affected, 3);
        assert_eq!(preview.changed, 2);
        assert_eq!(preview.clamped, 1);
        assert!(preview.has_changes());
        assert_eq!(preview.by_kind.get(&ControlKind::Knob), Some(&2));
        assert_eq!(preview.by_type.get("labeled-knob"), Some(&1));
    }

    #[test]
    fn test_preview_text() {
        let text = Preview::new(&sample()).to_string();

        assert!(text.contains("控件: c0 (类型: knob, #0)"));
        assert!(text.contains("x:            10 →       15"));
        assert!(text.contains("(无变化)"));
        assert!(text.contains("(负值已钳制为 0)"));
        assert!(text.contains("选中控件: 3"));
        assert!(text.contains("- button: 1"));
    }

    #[test]
    fn test_empty_preview() {
        let preview = Preview::new(&[]);
        assert_eq!(preview.affected, 0);
        assert!(!preview.has_changes());
        assert_eq!(preview.to_string(), "没有选中任何控件。\n");
    }

    #[test]
    fn test_preview_json() {
        let json = serde_json::to_value(Preview::new(&sample())).unwrap();
        assert_eq!(json["affected"], 3);
        assert_eq!(json["by_kind"]["knob"], 2);
        assert_eq!(json["changes"][0]["new"]["x"], 15.0);
        assert_eq!(json["changes"][2]["clamped"][0], "width");
    }
}
