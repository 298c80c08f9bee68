/// .dspreset 文件 IO 实现
///
/// 提供基于文件系统的默认读写实现
use std::io::Write;
use std::path::Path;
use tempfile::Builder;

use super::traits::{PresetReader, PresetWriter, RawPresetData};

/// 默认的读取器（基于 std::fs）
#[derive(Debug, Clone, Default)]
pub struct DefaultPresetReader;

impl PresetReader for DefaultPresetReader {
    fn read(&self, path: &Path) -> std::io::Result<RawPresetData> {
        let bytes = std::fs::read(path)?;
        Ok(RawPresetData { bytes })
    }
}

/// 原子写入器
///
/// 先写入目标目录中的临时文件，刷新到磁盘后再重命名覆盖目标文件。
/// 任何一步失败，目标文件都不会被截断；临时文件在 drop 时自动删除。
#[derive(Debug, Clone, Default)]
pub struct AtomicPresetWriter;

impl PresetWriter for AtomicPresetWriter {
    fn write(&self, data: &RawPresetData, path: &Path) -> std::io::Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        // 确保父目录存在
        std::fs::create_dir_all(dir)?;

        let mut tmp = Builder::new()
            .prefix(".dspreset_editor.")
            .suffix(".tmp")
            .tempfile_in(dir)?;

        tmp.write_all(&data.bytes)?;
        tmp.flush()?;

        // 临时文件默认权限为 0600，覆盖已有文件时沿用原文件的权限
        if let Ok(metadata) = std::fs::metadata(path) {
            tmp.as_file().set_permissions(metadata.permissions())?;
        }
        tmp.as_file().sync_all()?;

        tmp.persist(path)?;
        Ok(())
    }
}
