/// IO 抽象层模块
///
/// 该模块提供了文件读写的抽象接口，核心流程通过 trait 访问文件系统，
/// 测试时可以注入内存实现或故意失败的实现。
///
/// # 架构设计
///
/// - **traits**: 定义 Reader/Writer trait 接口
/// - **preset_io**: .dspreset 文件的默认实现（原子写入）
///
/// # 使用示例
///
/// ```rust,ignore
/// use dspreset_editor::io::{DefaultPresetReader, PresetReader};
///
/// let reader = DefaultPresetReader;
/// let data = reader.read(Path::new("piano.dspreset"))?;
/// ```
pub mod traits;
pub mod preset_io;

// === 导出 trait 定义 ===
pub use traits::{PresetReader, PresetWriter, RawPresetData};

// === 导出默认实现 ===
pub use preset_io::{AtomicPresetWriter, DefaultPresetReader};
