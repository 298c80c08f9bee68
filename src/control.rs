use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::format_number;

/// 控件类型
///
/// 封闭的枚举，选择器按此过滤。具体的原始类型名（如 `labeled-knob`、`image`）
/// 另外保存在 `ElementNode::type_name` 中，用于统计展示。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlKind {
    Knob,
    Button,
    Label,
    Other,
}

/// 作为控件识别的元素标签
const WIDGET_TAGS: &[(&str, ControlKind)] = &[
    ("labeled-knob", ControlKind::Knob),
    ("knob", ControlKind::Knob),
    ("button", ControlKind::Button),
    ("label", ControlKind::Label),
    ("image", ControlKind::Other),
    ("menu", ControlKind::Other),
    ("xypad", ControlKind::Other),
    ("slider", ControlKind::Other),
];

/// 通用控件元素，具体类型由 `type` 属性决定
pub const GENERIC_CONTROL_TAG: &str = "control";

impl ControlKind {
    pub const ALL: [ControlKind; 4] = [
        ControlKind::Knob,
        ControlKind::Button,
        ControlKind::Label,
        ControlKind::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ControlKind::Knob => "knob",
            ControlKind::Button => "button",
            ControlKind::Label => "label",
            ControlKind::Other => "other",
        }
    }

    /// 由 `<control type="...">` 的类型名推断
    pub fn from_type_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "knob" | "labeled-knob" => ControlKind::Knob,
            "button" => ControlKind::Button,
            "label" => ControlKind::Label,
            _ => ControlKind::Other,
        }
    }

    /// 判断元素是否为控件，并返回 (类型, 原始类型名)
    ///
    /// 非控件元素返回 `None`。
    pub fn classify(tag: &str, type_attr: Option<&str>) -> Option<(ControlKind, String)> {
        if tag == GENERIC_CONTROL_TAG {
            let type_name = type_attr.unwrap_or("unknown");
            return Some((Self::from_type_name(type_name), type_name.to_string()));
        }

        WIDGET_TAGS
            .iter()
            .find(|(name, _)| *name == tag)
            .map(|(name, kind)| (*kind, name.to_string()))
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControlKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "knob" | "knobs" => Ok(ControlKind::Knob),
            "button" | "buttons" => Ok(ControlKind::Button),
            "label" | "labels" => Ok(ControlKind::Label),
            "other" => Ok(ControlKind::Other),
            other => Err(format!(
                "unknown control type '{}', expected one of knob, button, label, other",
                other
            )),
        }
    }
}

/// 几何字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryField {
    X,
    Y,
    Width,
    Height,
}

impl GeometryField {
    pub const ALL: [GeometryField; 4] = [
        GeometryField::X,
        GeometryField::Y,
        GeometryField::Width,
        GeometryField::Height,
    ];

    /// 对应的 XML 属性名
    pub fn attribute_name(&self) -> &'static str {
        match self {
            GeometryField::X => "x",
            GeometryField::Y => "y",
            GeometryField::Width => "width",
            GeometryField::Height => "height",
        }
    }

    /// 尺寸字段（宽高）不允许为负
    pub fn is_size(&self) -> bool {
        matches!(self, GeometryField::Width | GeometryField::Height)
    }
}

impl fmt::Display for GeometryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.attribute_name())
    }
}

/// 控件几何信息 (x, y, width, height)
///
/// 缺失的属性为 `None`。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl Geometry {
    /// 四个字段都存在的几何
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            width: Some(width),
            height: Some(height),
        }
    }

    pub fn get(&self, field: GeometryField) -> Option<f64> {
        match field {
            GeometryField::X => self.x,
            GeometryField::Y => self.y,
            GeometryField::Width => self.width,
            GeometryField::Height => self.height,
        }
    }

    pub fn set(&mut self, field: GeometryField, value: Option<f64>) {
        match field {
            GeometryField::X => self.x = value,
            GeometryField::Y => self.y = value,
            GeometryField::Width => self.width = value,
            GeometryField::Height => self.height = value,
        }
    }

    pub fn with(mut self, field: GeometryField, value: f64) -> Self {
        self.set(field, Some(value));
        self
    }

    pub fn is_empty(&self) -> bool {
        GeometryField::ALL.iter().all(|f| self.get(*f).is_none())
    }
}

/// 缺失值显示为 `-`
pub(crate) fn format_optional(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_else(|| "-".to_string())
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            format_optional(self.x),
            format_optional(self.y),
            format_optional(self.width),
            format_optional(self.height)
        )
    }
}
