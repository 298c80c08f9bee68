/// IO 抽象层 - trait 定义
///
/// 读写器只负责字节的搬运，不负责解析和序列化。
use std::path::Path;

/// .dspreset 文件原始数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPresetData {
    /// 文件的原始字节数据
    pub bytes: Vec<u8>,
}

/// .dspreset 文件读取 trait
///
/// # 实现示例
/// ```rust,ignore
/// pub struct DefaultPresetReader;
/// impl PresetReader for DefaultPresetReader {
///     fn read(&self, path: &Path) -> std::io::Result<RawPresetData> {
///         let bytes = std::fs::read(path)?;
///         Ok(RawPresetData { bytes })
///     }
/// }
/// ```
pub trait PresetReader {
    /// 读取文件的原始数据
    fn read(&self, path: &Path) -> std::io::Result<RawPresetData>;
}

/// .dspreset 文件写入 trait
///
/// 实现必须保证：写入失败时目标文件保持原样。
pub trait PresetWriter {
    /// 写入文件数据
    ///
    /// # 参数
    /// * `data` - 要写入的原始数据
    /// * `path` - 目标文件路径
    fn write(&self, data: &RawPresetData, path: &Path) -> std::io::Result<()>;
}
