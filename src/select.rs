use regex::Regex;

use crate::control::ControlKind;
use crate::element::{ElementNode, NAME_ATTRIBUTES};
use crate::preset::PresetDocument;
use crate::utils::PresetError;

/// 名称过滤条件
///
/// 正则表达式，匹配控件的 `id`、`name`、`label`、`text` 属性中任意一个。
#[derive(Debug, Clone)]
pub struct NamePattern(Regex);

impl NamePattern {
    pub fn new(pattern: &str) -> Result<Self, PresetError> {
        Ok(Self(Regex::new(pattern)?))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, element: &ElementNode) -> bool {
        NAME_ATTRIBUTES
            .iter()
            .filter_map(|key| element.attribute(key))
            .any(|value| self.0.is_match(&value))
    }
}

/// 控件选择条件
#[derive(Debug, Clone, Default)]
pub struct Selection {
    kinds: Vec<ControlKind>,
    name: Option<NamePattern>,
}

impl Selection {
    /// 选择指定类型的控件
    pub fn new(kinds: impl IntoIterator<Item = ControlKind>) -> Self {
        let mut selected: Vec<ControlKind> = Vec::new();
        for kind in kinds {
            if !selected.contains(&kind) {
                selected.push(kind);
            }
        }
        Self {
            kinds: selected,
            name: None,
        }
    }

    /// 选择所有类型的控件
    pub fn all() -> Self {
        Self::new(ControlKind::ALL)
    }

    /// 附加名称过滤
    pub fn with_name(mut self, pattern: NamePattern) -> Self {
        self.name = Some(pattern);
        self
    }

    pub fn kinds(&self) -> &[ControlKind] {
        &self.kinds
    }

    pub fn name(&self) -> Option<&NamePattern> {
        self.name.as_ref()
    }

    pub fn matches(&self, element: &ElementNode) -> bool {
        self.kinds.contains(&element.kind)
            && self.name.as_ref().map_or(true, |pattern| pattern.is_match(element))
    }
}

/// 按文档顺序返回匹配控件的索引
///
/// 没有匹配时返回空列表，这不是错误。
pub fn select(document: &PresetDocument, selection: &Selection) -> Vec<usize> {
    let indices: Vec<usize> = document
        .elements()
        .iter()
        .filter(|element| selection.matches(element))
        .map(|element| element.index)
        .collect();

    log::debug!(
        "选择 {:?} (名称过滤: {:?}): {} 个控件",
        selection.kinds,
        selection.name.as_ref().map(|p| p.as_str()),
        indices.len()
    );
    indices
}
