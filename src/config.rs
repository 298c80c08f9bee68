use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::utils::PresetError;

/// 默认要求的根元素
pub const DEFAULT_ROOT_TAG: &str = "DecentSampler";

/// 备份文件命名规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupNaming {
    /// `<file>.backup`，每次运行覆盖上一次的备份
    Suffix,
    /// `<file>.<时间戳>.bak`，保留每一次运行的备份
    #[default]
    Timestamped,
}

impl FromStr for BackupNaming {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "suffix" => Ok(BackupNaming::Suffix),
            "timestamped" | "timestamp" => Ok(BackupNaming::Timestamped),
            other => Err(format!("unknown backup naming '{}', expected suffix or timestamped", other)),
        }
    }
}

/// 结构校验规则
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationRules {
    /// 要求的根元素名，`None` 表示不检查
    pub root_tag: Option<String>,
    /// 每个控件元素必须携带的属性
    pub required_attributes: Vec<String>,
    /// 控件之间的 `id` 不允许重复
    pub unique_ids: bool,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            root_tag: Some(DEFAULT_ROOT_TAG.to_string()),
            required_attributes: Vec::new(),
            unique_ids: true,
        }
    }
}

/// 编辑器配置
///
/// 可以从 JSON 文件加载，缺失的字段使用默认值：
///
/// ```json
/// {
///   "backup": "suffix",
///   "validation": { "required_attributes": ["x", "y"] }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub backup: BackupNaming,
    pub validation: ValidationRules,
}

impl EditorConfig {
    /// 从 JSON 字符串解析配置
    pub fn from_json_str(json: &str) -> Result<Self, PresetError> {
        Ok(serde_json::from_str(json)?)
    }

    /// 从 JSON 文件加载配置
    pub fn from_file(path: &Path) -> Result<Self, PresetError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PresetError::Config(format!("读取配置文件 {} 失败: {}", path.display(), e)))?;
        Self::from_json_str(&content)
    }
}
