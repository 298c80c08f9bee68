use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::BackupNaming;
use crate::editor::RunState;
use crate::validate::{Problem, Stage};

/// 自定义错误类型
///
/// 每个变体对应处理流程中的一个阶段，错误信息会指明失败发生在哪一步。
#[derive(Error, Debug)]
pub enum PresetError {
    #[error("Parse error in {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Validation failed {stage}: {}", join_problems(.problems))]
    Validation { stage: Stage, problems: Vec<Problem> },

    #[error("Backup error for {}: {source}", .path.display())]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Write error for {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid editor state: expected {expected}, found {actual}")]
    InvalidState { expected: RunState, actual: RunState },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid name pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

fn join_problems(problems: &[Problem]) -> String {
    problems
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// 检查文件扩展名是否受支持（不区分大小写）
pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .is_some_and(|ext| crate::SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

/// 几何数值保留的小数位数
pub const GEOMETRY_DECIMALS: i32 = 6;

/// 将几何数值舍入到 `GEOMETRY_DECIMALS` 位小数，消除浮点运算误差
pub fn round_geometry(value: f64) -> f64 {
    let scale = 10f64.powi(GEOMETRY_DECIMALS);
    if value.abs() >= 1e9 {
        return value;
    }
    let rounded = (value * scale).round() / scale;
    // 避免输出 -0
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// 将几何数值格式化为属性文本
///
/// 整数值不带小数部分（`15` 而不是 `15.0`），与手写 preset 的习惯一致。
pub fn format_number(value: f64) -> String {
    let value = round_geometry(value);
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// 根据命名规则计算备份文件路径
///
/// 备份文件始终位于原文件旁边，文件名在原文件名之后追加后缀。
pub fn backup_path_for(file_path: &Path, naming: BackupNaming) -> PathBuf {
    let mut name = file_path.as_os_str().to_owned();
    match naming {
        BackupNaming::Suffix => name.push(".backup"),
        BackupNaming::Timestamped => {
            let timestamp = chrono::Local::now().format("%Y-%m-%d-%H-%M-%S");
            name.push(format!(".{}.bak", timestamp));
        }
    }
    PathBuf::from(name)
}

/// 创建文件备份
///
/// 逐字节复制原文件。失败时返回 `PresetError::Backup`，调用方不得继续写入。
pub fn create_backup(file_path: &Path, naming: BackupNaming) -> Result<PathBuf, PresetError> {
    if !file_path.exists() {
        return Err(PresetError::Backup {
            path: file_path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "原文件不存在"),
        });
    }

    let backup_path = backup_path_for(file_path, naming);

    std::fs::copy(file_path, &backup_path).map_err(|source| PresetError::Backup {
        path: backup_path.clone(),
        source,
    })?;

    log::info!("已创建备份: {}", backup_path.display());
    Ok(backup_path)
}
