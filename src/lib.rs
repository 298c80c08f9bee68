pub mod config;
pub mod control;
pub mod editor;
pub mod element;
pub mod io;
pub mod preset;
pub mod report;
pub mod select;
pub mod transform;
pub mod utils;
pub mod validate;

// 重新导出主要结构
pub use config::{BackupNaming, EditorConfig, ValidationRules};
pub use control::{ControlKind, Geometry, GeometryField};
pub use editor::{apply, AssumeNo, AssumeYes, ChangeRecord, CommitOutcome, Confirmer, PresetEditor, RunOutcome, RunState};
pub use element::{Attribute, ElementNode};
pub use preset::{PresetDocument, PresetStats};
pub use report::Preview;
pub use select::{select, NamePattern, Selection};
pub use transform::{transform, Operation, TransformSpec};
pub use utils::{create_backup, PresetError};
pub use validate::{ensure_valid, validate, Problem, Stage};

// 常量定义
pub const SUPPORTED_EXTENSIONS: &[&str] = &["dspreset"];
