/// 变更记录模块
///
/// 每个被选中的控件对应一条记录，保存变换前后的几何信息。
/// 记录只用于预览和统计，不会持久化。
use serde::Serialize;

use crate::control::{format_optional, ControlKind, Geometry, GeometryField};

/// 单个控件的变更
///
/// 通过 `element_index` 引用文档中的控件，不持有控件本身。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeRecord {
    /// 控件在文档中的索引
    pub element_index: usize,
    /// 控件显示名称
    pub name: String,
    /// 原始类型名
    pub type_name: String,
    /// 控件类型
    pub kind: ControlKind,
    /// 修改前的几何
    pub old: Geometry,
    /// 修改后的几何
    pub new: Geometry,
    /// 被钳制为 0 的字段
    pub clamped: Vec<GeometryField>,
}

impl ChangeRecord {
    /// 值发生变化的字段
    pub fn changed_fields(&self) -> Vec<GeometryField> {
        GeometryField::ALL
            .into_iter()
            .filter(|field| self.old.get(*field) != self.new.get(*field))
            .collect()
    }

    /// 几何没有任何变化
    pub fn is_noop(&self) -> bool {
        self.changed_fields().is_empty()
    }

    pub fn was_clamped(&self) -> bool {
        !self.clamped.is_empty()
    }
}

impl std::fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[#{}] {} '{}':", self.element_index, self.type_name, self.name)?;
        let changed = self.changed_fields();
        if changed.is_empty() {
            return write!(f, " 无变化");
        }
        for field in changed {
            write!(
                f,
                " {} {} -> {}",
                field,
                format_optional(self.old.get(field)),
                format_optional(self.new.get(field))
            )?;
            if self.clamped.contains(&field) {
                write!(f, " (已钳制)")?;
            }
        }
        Ok(())
    }
}
