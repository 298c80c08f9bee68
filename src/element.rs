use std::borrow::Cow;
use std::ops::Range;

use crate::control::{ControlKind, Geometry, GeometryField};

/// 用于显示控件名称的属性，按优先级排列
pub const NAME_ATTRIBUTES: &[&str] = &["id", "name", "label", "text"];

/// XML 属性
///
/// 值以原始（仍然转义的）形式保存，未修改的属性在写回时逐字保留。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub key: String,
    raw_value: String,
}

impl Attribute {
    /// 从解析得到的原始值创建
    pub(crate) fn from_raw(key: String, raw_value: String) -> Self {
        Self { key, raw_value }
    }

    /// 从未转义的值创建
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            raw_value: quick_xml::escape::escape(value).into_owned(),
        }
    }

    /// 反转义后的值；包含无法识别的实体时返回原始文本
    pub fn value(&self) -> Cow<'_, str> {
        quick_xml::escape::unescape(&self.raw_value).unwrap_or(Cow::Borrowed(&self.raw_value))
    }

    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }
}

/// 单个控件元素
///
/// 只保存起始标签的信息；子元素和标签之外的文本留在文档源码中。
#[derive(Debug, Clone)]
pub struct ElementNode {
    /// 在文档中的顺序（从 0 开始）
    pub index: usize,
    /// 元素标签名
    pub tag: String,
    /// 控件类型
    pub kind: ControlKind,
    /// 原始类型名（`type` 属性或标签名）
    pub type_name: String,
    /// 起始标签在源码中的字节范围
    pub(crate) span: Range<usize>,
    /// 是否为自闭合标签 `<... />`
    pub(crate) self_closing: bool,
    attributes: Vec<Attribute>,
    is_modified: bool,
}

impl ElementNode {
    pub(crate) fn new(
        index: usize,
        tag: String,
        kind: ControlKind,
        type_name: String,
        span: Range<usize>,
        self_closing: bool,
        attributes: Vec<Attribute>,
    ) -> Self {
        Self {
            index,
            tag,
            kind,
            type_name,
            span,
            self_closing,
            attributes,
            is_modified: false,
        }
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<Cow<'_, str>> {
        self.attributes.iter().find(|a| a.key == key).map(|a| a.value())
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.iter().any(|a| a.key == key)
    }

    /// 设置属性值（已存在则原位替换，否则追加到末尾）
    pub fn set_attribute(&mut self, key: &str, value: &str) {
        let attribute = Attribute::new(key, value);
        match self.attributes.iter_mut().find(|a| a.key == key) {
            Some(existing) => *existing = attribute,
            None => self.attributes.push(attribute),
        }
        self.is_modified = true;
    }

    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    /// 解析单个几何字段
    ///
    /// 属性缺失返回 `Ok(None)`，无法解析为有限数值时返回原始文本。
    pub fn geometry_value(&self, field: GeometryField) -> Result<Option<f64>, String> {
        let Some(raw) = self.attribute(field.attribute_name()) else {
            return Ok(None);
        };
        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Some(value)),
            _ => Err(raw.into_owned()),
        }
    }

    /// 当前几何信息，无法解析的字段视为缺失
    pub fn geometry(&self) -> Geometry {
        let mut geometry = Geometry::default();
        for field in GeometryField::ALL {
            geometry.set(field, self.geometry_value(field).ok().flatten());
        }
        geometry
    }

    /// 用于展示的名称：`id`、`name`、`label`、`text` 中第一个存在的值
    pub fn display_name(&self) -> String {
        NAME_ATTRIBUTES
            .iter()
            .find_map(|key| self.attribute(key))
            .map(|name| name.into_owned())
            .unwrap_or_else(|| format!("#{}", self.index))
    }

    /// 简短描述，用于错误信息
    pub fn describe(&self) -> String {
        format!("<{}> '{}' (#{})", self.tag, self.display_name(), self.index)
    }

    /// 重新生成起始标签
    pub(crate) fn render_start_tag(&self) -> String {
        let mut tag = String::with_capacity(self.span.len() + 16);
        tag.push('<');
        tag.push_str(&self.tag);
        for attribute in &self.attributes {
            // 原本用单引号包裹且值中含双引号的属性保持单引号
            let quote = if attribute.raw_value.contains('"') { '\'' } else { '"' };
            tag.push(' ');
            tag.push_str(&attribute.key);
            tag.push('=');
            tag.push(quote);
            tag.push_str(&attribute.raw_value);
            tag.push(quote);
        }
        tag.push_str(if self.self_closing { "/>" } else { ">" });
        tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knob(attributes: &[(&str, &str)]) -> ElementNode {
        let attributes = attributes
            .iter()
            .map(|(k, v)| Attribute::from_raw(k.to_string(), v.to_string()))
            .collect();
        ElementNode::new(0, "control".into(), ControlKind::Knob, "knob".into(), 0..0, true, attributes)
    }

    #[test]
    fn test_geometry_parsing() {
        let node = knob(&[("x", "10"), ("y", " 20.5 "), ("width", "abc")]);

        assert_eq!(node.geometry_value(GeometryField::X), Ok(Some(10.0)));
        assert_eq!(node.geometry_value(GeometryField::Y), Ok(Some(20.5)));
        assert_eq!(node.geometry_value(GeometryField::Width), Err("abc".to_string()));
        assert_eq!(node.geometry_value(GeometryField::Height), Ok(None));

        let geometry = node.geometry();
        assert_eq!(geometry.x, Some(10.0));
        assert_eq!(geometry.width, None);
    }

    #[test]
    fn test_non_finite_is_invalid() {
        let node = knob(&[("x", "NaN"), ("y", "inf")]);
        assert!(node.geometry_value(GeometryField::X).is_err());
        assert!(node.geometry_value(GeometryField::Y).is_err());
    }

    #[test]
    fn test_display_name_priority() {
        assert_eq!(knob(&[("label", "Cutoff"), ("id", "k1")]).display_name(), "k1");
        assert_eq!(knob(&[("text", "Tone &amp; Color")]).display_name(), "Tone & Color");
        assert_eq!(knob(&[]).display_name(), "#0");
    }

    #[test]
    fn test_set_attribute_replaces_in_place() {
        let mut node = knob(&[("x", "10"), ("label", "A")]);
        assert!(!node.is_modified());

        node.set_attribute("x", "15");
        node.set_attribute("width", "40");

        assert!(node.is_modified());
        let keys: Vec<_> = node.attributes().iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["x", "label", "width"]);
        assert_eq!(node.attribute("x").unwrap(), "15");
    }

    #[test]
    fn test_render_start_tag() {
        let mut node = knob(&[("type", "knob"), ("label", "Say \"hi\""), ("x", "1")]);
        node.set_attribute("x", "2");
        node.set_attribute("text", "a<b");

        assert_eq!(
            node.render_start_tag(),
            r#"<control type="knob" label='Say "hi"' x="2" text="a&lt;b"/>"#
        );

        node.self_closing = false;
        assert!(node.render_start_tag().ends_with("\">"));
    }
}
