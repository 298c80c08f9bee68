use std::path::Path;

use super::PresetDocument;
use crate::io::{AtomicPresetWriter, PresetWriter, RawPresetData};
use crate::utils::PresetError;

impl PresetDocument {
    /// 序列化为 XML 文本
    ///
    /// 只替换被修改控件的起始标签，其余字节与原始源码完全一致。
    pub fn to_xml_string(&self) -> String {
        let mut output = String::with_capacity(self.source.len() + 64);
        let mut cursor = 0;

        for element in self.elements.iter().filter(|e| e.is_modified()) {
            output.push_str(&self.source[cursor..element.span.start]);
            output.push_str(&element.render_start_tag());
            cursor = element.span.end;
        }
        output.push_str(&self.source[cursor..]);

        output
    }

    /// 使用自定义 Writer 写入
    pub fn write_with_writer(&self, path: &Path, writer: &dyn PresetWriter) -> Result<(), PresetError> {
        let data = RawPresetData {
            bytes: self.to_xml_string().into_bytes(),
        };

        writer.write(&data, path).map_err(|source| PresetError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        log::info!("已写入: {} ({} 字节)", path.display(), data.bytes.len());
        Ok(())
    }

    /// 原子写入文件
    pub fn write_to_file(&self, path: &Path) -> Result<(), PresetError> {
        self.write_with_writer(path, &AtomicPresetWriter)
    }
}
