use std::path::{Path, PathBuf};

use crate::element::ElementNode;
use crate::io::{DefaultPresetReader, PresetReader};
use crate::utils::PresetError;

mod parser;
mod stats;
mod writer;

pub use stats::PresetStats;

/// 解析后的 .dspreset 文档
///
/// 保存完整的源码文本和所有控件元素。控件之外的内容（样本、效果、注释、
/// 空白）不单独建模，写回时从源码原样复制。
#[derive(Debug, Clone)]
pub struct PresetDocument {
    /// 文件路径
    pub path: PathBuf,
    /// 原始源码
    source: String,
    /// 根元素名
    root_tag: String,
    /// 控件元素（文档顺序）
    elements: Vec<ElementNode>,
}

impl PresetDocument {
    /// 从文件系统加载
    ///
    /// # 示例
    /// ```rust,ignore
    /// let document = PresetDocument::load("piano.dspreset")?;
    /// println!("{} 个控件", document.len());
    /// ```
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PresetError> {
        Self::load_with_reader(path, &DefaultPresetReader)
    }

    /// 使用自定义 Reader 加载
    pub fn load_with_reader(
        path: impl AsRef<Path>,
        reader: &dyn PresetReader,
    ) -> Result<Self, PresetError> {
        let path = path.as_ref().to_path_buf();

        let raw_data = reader.read(&path).map_err(|e| PresetError::Parse {
            path: path.clone(),
            message: format!("无法读取文件: {}", e),
        })?;

        let source = String::from_utf8(raw_data.bytes).map_err(|e| PresetError::Parse {
            path: path.clone(),
            message: format!("文件不是有效的 UTF-8: {}", e),
        })?;

        Self::parse(path, source)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root_tag(&self) -> &str {
        &self.root_tag
    }

    pub fn elements(&self) -> &[ElementNode] {
        &self.elements
    }

    pub fn element(&self, index: usize) -> Option<&ElementNode> {
        self.elements.get(index)
    }

    pub(crate) fn element_mut(&mut self, index: usize) -> Option<&mut ElementNode> {
        self.elements.get_mut(index)
    }

    /// 控件数量
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// 是否有控件被修改
    pub fn is_modified(&self) -> bool {
        self.elements.iter().any(|e| e.is_modified())
    }

    pub fn modified_count(&self) -> usize {
        self.elements.iter().filter(|e| e.is_modified()).count()
    }
}
