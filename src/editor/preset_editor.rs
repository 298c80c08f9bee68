/// 预设编辑器模块
///
/// 管理一次运行的完整状态。预览与确认是显式的状态转换，
/// 核心流程不需要模拟交互输入即可完整测试。
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use super::delta::ChangeRecord;
use crate::config::EditorConfig;
use crate::io::{AtomicPresetWriter, DefaultPresetReader, PresetReader, PresetWriter};
use crate::preset::PresetDocument;
use crate::report::Preview;
use crate::select::{select, Selection};
use crate::transform::{transform, TransformSpec};
use crate::utils::{create_backup, PresetError};
use crate::validate::{ensure_valid, Stage};

/// 运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunState {
    Loaded,
    Validated,
    Selected,
    Transformed,
    Previewed,
    Confirmed,
    BackedUp,
    Written,
    PostValidated,
    Aborted,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunState::Loaded => "loaded",
            RunState::Validated => "validated",
            RunState::Selected => "selected",
            RunState::Transformed => "transformed",
            RunState::Previewed => "previewed",
            RunState::Confirmed => "confirmed",
            RunState::BackedUp => "backed-up",
            RunState::Written => "written",
            RunState::PostValidated => "post-validated",
            RunState::Aborted => "aborted",
        })
    }
}

/// 确认步骤的决策者
///
/// 命令行实现会弹出交互提示；测试和批处理使用 `AssumeYes` / `AssumeNo` 或闭包。
pub trait Confirmer {
    fn confirm(&mut self, preview: &Preview) -> bool;
}

impl<F> Confirmer for F
where
    F: FnMut(&Preview) -> bool,
{
    fn confirm(&mut self, preview: &Preview) -> bool {
        self(preview)
    }
}

/// 总是确认
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirmer for AssumeYes {
    fn confirm(&mut self, _preview: &Preview) -> bool {
        true
    }
}

/// 总是拒绝
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeNo;

impl Confirmer for AssumeNo {
    fn confirm(&mut self, _preview: &Preview) -> bool {
        false
    }
}

/// 写入结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitOutcome {
    /// 实际写入的文件
    pub written_to: PathBuf,
    /// 备份文件（写入新文件时为 `None`）
    pub backup: Option<PathBuf>,
    /// 被修改的控件数
    pub modified: usize,
}

/// `apply` 的运行结果
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// 没有需要写入的变化
    NoChanges(Preview),
    /// 用户拒绝了变更
    Declined(Preview),
    /// 已写入
    Committed { preview: Preview, outcome: CommitOutcome },
}

/// 预设编辑器 - 管理一次运行的状态
///
/// # 使用示例
///
/// ```rust,ignore
/// let mut editor = PresetEditor::open("piano.dspreset", EditorConfig::default())?;
/// editor.validate()?;
/// editor.select(spec.selection())?;
/// editor.transform(&spec)?;
/// let preview = editor.preview()?;
/// if editor.confirm_with(&mut AssumeYes)? {
///     let outcome = editor.commit()?;
///     println!("备份: {:?}", outcome.backup);
/// }
/// ```
pub struct PresetEditor {
    /// 正在编辑的文档
    document: PresetDocument,
    config: EditorConfig,
    state: RunState,
    /// 选中的控件索引
    selected: Vec<usize>,
    /// 变换产生的变更
    changes: Vec<ChangeRecord>,
}

impl PresetEditor {
    /// 从已加载的文档创建编辑器
    pub fn new(document: PresetDocument, config: EditorConfig) -> Self {
        Self {
            document,
            config,
            state: RunState::Loaded,
            selected: Vec::new(),
            changes: Vec::new(),
        }
    }

    /// 加载文件并创建编辑器
    pub fn open(path: impl AsRef<Path>, config: EditorConfig) -> Result<Self, PresetError> {
        Self::open_with_reader(path, config, &DefaultPresetReader)
    }

    pub fn open_with_reader(
        path: impl AsRef<Path>,
        config: EditorConfig,
        reader: &dyn PresetReader,
    ) -> Result<Self, PresetError> {
        let document = PresetDocument::load_with_reader(path, reader)?;
        Ok(Self::new(document, config))
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn document(&self) -> &PresetDocument {
        &self.document
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn selected(&self) -> &[usize] {
        &self.selected
    }

    pub fn changes(&self) -> &[ChangeRecord] {
        &self.changes
    }

    /// 是否有实际的几何变化
    pub fn has_changes(&self) -> bool {
        self.changes.iter().any(|c| !c.is_noop())
    }

    fn expect_state(&self, expected: RunState) -> Result<(), PresetError> {
        if self.state != expected {
            return Err(PresetError::InvalidState {
                expected,
                actual: self.state,
            });
        }
        Ok(())
    }

    fn abort<T>(&mut self, err: PresetError) -> Result<T, PresetError> {
        log::warn!("运行中止 (状态 {}): {}", self.state, err);
        self.state = RunState::Aborted;
        Err(err)
    }

    /// 变换前的结构校验
    pub fn validate(&mut self) -> Result<(), PresetError> {
        self.expect_state(RunState::Loaded)?;
        if let Err(err) = ensure_valid(&self.document, &self.config.validation, Stage::PreTransform) {
            return self.abort(err);
        }
        self.state = RunState::Validated;
        Ok(())
    }

    /// 选择控件
    pub fn select(&mut self, selection: &Selection) -> Result<&[usize], PresetError> {
        self.expect_state(RunState::Validated)?;
        self.selected = select(&self.document, selection);
        self.state = RunState::Selected;
        Ok(&self.selected)
    }

    /// 在内存中应用变换，并校验变换后的文档
    pub fn transform(&mut self, spec: &TransformSpec) -> Result<&[ChangeRecord], PresetError> {
        self.expect_state(RunState::Selected)?;
        self.changes = transform(&mut self.document, &self.selected, spec);

        if let Err(err) = ensure_valid(&self.document, &self.config.validation, Stage::PostTransform) {
            return self.abort(err);
        }
        self.state = RunState::Transformed;
        Ok(&self.changes)
    }

    /// 生成预览（可以重复调用）
    pub fn preview(&mut self) -> Result<Preview, PresetError> {
        if self.state != RunState::Previewed {
            self.expect_state(RunState::Transformed)?;
        }
        self.state = RunState::Previewed;
        Ok(Preview::new(&self.changes))
    }

    /// 确认或拒绝变更，返回是否确认
    pub fn confirm(&mut self, accepted: bool) -> Result<bool, PresetError> {
        self.expect_state(RunState::Previewed)?;
        if accepted {
            self.state = RunState::Confirmed;
        } else {
            log::info!("用户取消了变更");
            self.state = RunState::Aborted;
        }
        Ok(accepted)
    }

    /// 通过 `Confirmer` 确认
    pub fn confirm_with(&mut self, confirmer: &mut dyn Confirmer) -> Result<bool, PresetError> {
        self.expect_state(RunState::Previewed)?;
        let preview = Preview::new(&self.changes);
        let accepted = confirmer.confirm(&preview);
        self.confirm(accepted)
    }

    /// 备份并写回原文件
    pub fn commit(&mut self) -> Result<CommitOutcome, PresetError> {
        self.commit_with(&DefaultPresetReader, &AtomicPresetWriter, None)
    }

    /// 写入到另一个文件（原文件不变，不创建备份）
    pub fn commit_to(&mut self, output: &Path) -> Result<CommitOutcome, PresetError> {
        self.commit_with(&DefaultPresetReader, &AtomicPresetWriter, Some(output))
    }

    /// 备份、写入并校验写入结果
    ///
    /// # 参数
    /// * `reader` - 用于重新读取写入结果
    /// * `writer` - 文件写入器
    /// * `output` - 输出路径，`None` 表示覆盖原文件
    pub fn commit_with(
        &mut self,
        reader: &dyn PresetReader,
        writer: &dyn PresetWriter,
        output: Option<&Path>,
    ) -> Result<CommitOutcome, PresetError> {
        self.expect_state(RunState::Confirmed)?;

        let original = self.document.path().to_path_buf();
        let target = output.map(Path::to_path_buf).unwrap_or_else(|| original.clone());

        let backup = if is_same_file(&original, &target) {
            match create_backup(&original, self.config.backup) {
                Ok(path) => Some(path),
                Err(err) => return self.abort(err),
            }
        } else {
            log::info!("输出到 {}，原文件保持不变，跳过备份", target.display());
            None
        };
        self.state = RunState::BackedUp;

        if let Err(err) = self.document.write_with_writer(&target, writer) {
            return self.abort(err);
        }
        self.state = RunState::Written;

        let written = match PresetDocument::load_with_reader(&target, reader) {
            Ok(document) => document,
            Err(err) => return self.abort(err),
        };
        if let Err(err) = ensure_valid(&written, &self.config.validation, Stage::PostWrite) {
            return self.abort(err);
        }
        self.state = RunState::PostValidated;

        Ok(CommitOutcome {
            written_to: target,
            backup,
            modified: self.document.modified_count(),
        })
    }

    /// 生成编辑摘要
    pub fn summary(&self) -> String {
        format!(
            "预设: {}, 状态: {}, 选中: {}, 修改: {}",
            self.document.name(),
            self.state,
            self.selected.len(),
            self.document.modified_count()
        )
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// 完整运行一次：加载、校验、选择、变换、预览、确认、备份、写入、写后校验
///
/// 没有实际变化或被拒绝时不触碰磁盘。
pub fn apply(
    path: impl AsRef<Path>,
    spec: &TransformSpec,
    config: EditorConfig,
    confirmer: &mut dyn Confirmer,
) -> Result<RunOutcome, PresetError> {
    let mut editor = PresetEditor::open(path, config)?;
    editor.validate()?;
    editor.select(spec.selection())?;
    editor.transform(spec)?;

    let preview = editor.preview()?;
    if !preview.has_changes() {
        return Ok(RunOutcome::NoChanges(preview));
    }

    if !editor.confirm_with(confirmer)? {
        return Ok(RunOutcome::Declined(preview));
    }

    let outcome = editor.commit()?;
    Ok(RunOutcome::Committed { preview, outcome })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackupNaming;
    use crate::control::{ControlKind, Geometry, GeometryField};
    use crate::io::RawPresetData;
    use tempfile::TempDir;

    const PRESET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<DecentSampler>
  <ui width="800" height="400">
    <tab name="main">
      <control type="knob" id="attack" x="10" y="20" width="5" height="5"/>
      <control type="button" id="power" x="100" y="20" width="40" height="20"/>
    </tab>
  </ui>
</DecentSampler>
"#;

    struct FailingWriter;

    impl PresetWriter for FailingWriter {
        fn write(&self, _data: &RawPresetData, _path: &Path) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
        }
    }

    fn fixture() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("synth.dspreset");
        std::fs::write(&path, PRESET).unwrap();
        (temp_dir, path)
    }

    fn suffix_config() -> EditorConfig {
        EditorConfig {
            backup: BackupNaming::Suffix,
            ..EditorConfig::default()
        }
    }

    fn knob_delta(dx: f64) -> TransformSpec {
        TransformSpec::delta(
            Selection::new([ControlKind::Knob]),
            Geometry::default().with(GeometryField::X, dx),
        )
    }

    fn confirmed_editor(path: &Path, spec: &TransformSpec) -> PresetEditor {
        let mut editor = PresetEditor::open(path, suffix_config()).unwrap();
        editor.validate().unwrap();
        editor.select(spec.selection()).unwrap();
        editor.transform(spec).unwrap();
        editor.preview().unwrap();
        assert!(editor.confirm(true).unwrap());
        editor
    }

    #[test]
    fn test_full_state_sequence() {
        let (_dir, path) = fixture();
        let spec = knob_delta(5.0);

        let mut editor = PresetEditor::open(&path, suffix_config()).unwrap();
        assert_eq!(editor.state(), RunState::Loaded);

        editor.validate().unwrap();
        assert_eq!(editor.state(), RunState::Validated);

        assert_eq!(editor.select(spec.selection()).unwrap(), &[0]);
        assert_eq!(editor.state(), RunState::Selected);

        let changes = editor.transform(&spec).unwrap();
        assert_eq!(changes[0].new, Geometry::new(15.0, 20.0, 5.0, 5.0));
        assert_eq!(editor.state(), RunState::Transformed);

        let preview = editor.preview().unwrap();
        assert_eq!(preview.changed, 1);
        assert_eq!(editor.state(), RunState::Previewed);

        assert!(editor.confirm_with(&mut AssumeYes).unwrap());
        assert_eq!(editor.state(), RunState::Confirmed);

        let outcome = editor.commit().unwrap();
        assert_eq!(editor.state(), RunState::PostValidated);
        assert_eq!(outcome.written_to, path);
        assert_eq!(outcome.modified, 1);

        let backup = outcome.backup.unwrap();
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), PRESET);

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains(r#"<control type="knob" id="attack" x="15" y="20" width="5" height="5"/>"#));
        assert!(written.contains(r#"<control type="button" id="power" x="100" y="20" width="40" height="20"/>"#));
    }

    #[test]
    fn test_out_of_order_calls_rejected() {
        let (_dir, path) = fixture();
        let mut editor = PresetEditor::open(&path, suffix_config()).unwrap();

        let result = editor.select(&Selection::all());
        assert!(matches!(
            result,
            Err(PresetError::InvalidState { expected: RunState::Validated, actual: RunState::Loaded })
        ));
        assert!(matches!(editor.commit(), Err(PresetError::InvalidState { .. })));
        assert!(matches!(editor.preview(), Err(PresetError::InvalidState { .. })));
        // 顺序错误不会中止运行
        assert_eq!(editor.state(), RunState::Loaded);
    }

    #[test]
    fn test_decline_aborts_without_touching_disk() {
        let (dir, path) = fixture();
        let spec = knob_delta(5.0);

        let mut editor = PresetEditor::open(&path, suffix_config()).unwrap();
        editor.validate().unwrap();
        editor.select(spec.selection()).unwrap();
        editor.transform(&spec).unwrap();
        editor.preview().unwrap();

        assert!(!editor.confirm_with(&mut AssumeNo).unwrap());
        assert_eq!(editor.state(), RunState::Aborted);
        assert!(matches!(editor.commit(), Err(PresetError::InvalidState { .. })));

        assert_eq!(std::fs::read_to_string(&path).unwrap(), PRESET);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_pre_validation_failure_aborts() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.dspreset");
        std::fs::write(&path, r#"<DecentSampler><control type="knob" x="wide"/></DecentSampler>"#).unwrap();

        let mut editor = PresetEditor::open(&path, suffix_config()).unwrap();
        let err = editor.validate().unwrap_err();

        assert!(matches!(err, PresetError::Validation { stage: Stage::PreTransform, .. }));
        assert_eq!(editor.state(), RunState::Aborted);
    }

    #[test]
    fn test_post_transform_validation_aborts() {
        let (dir, path) = fixture();
        // x = 10 - 50 为负，宽高之外的字段不钳制
        let spec = knob_delta(-50.0);

        let mut editor = PresetEditor::open(&path, suffix_config()).unwrap();
        editor.validate().unwrap();
        editor.select(spec.selection()).unwrap();
        let err = editor.transform(&spec).unwrap_err();

        assert!(matches!(err, PresetError::Validation { stage: Stage::PostTransform, .. }));
        assert_eq!(editor.state(), RunState::Aborted);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), PRESET);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_backup_failure_skips_write() {
        let (_dir, path) = fixture();
        // 备份路径被目录占用，复制必然失败
        std::fs::create_dir(path.with_extension("dspreset.backup")).unwrap();

        let mut editor = confirmed_editor(&path, &knob_delta(5.0));
        let err = editor.commit().unwrap_err();

        assert!(matches!(err, PresetError::Backup { .. }));
        assert_eq!(editor.state(), RunState::Aborted);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), PRESET);
    }

    #[test]
    fn test_write_failure_keeps_original() {
        let (_dir, path) = fixture();

        let mut editor = confirmed_editor(&path, &knob_delta(5.0));
        let err = editor
            .commit_with(&DefaultPresetReader, &FailingWriter, None)
            .unwrap_err();

        assert!(matches!(err, PresetError::Write { .. }));
        assert_eq!(editor.state(), RunState::Aborted);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), PRESET);

        // 备份在写入之前已经创建，内容与原文件一致
        let backup = path.with_extension("dspreset.backup");
        assert_eq!(std::fs::read_to_string(backup).unwrap(), PRESET);
    }

    #[test]
    fn test_commit_to_other_file_skips_backup() {
        let (dir, path) = fixture();
        let output = dir.path().join("out").join("synth-moved.dspreset");

        let mut editor = confirmed_editor(&path, &knob_delta(5.0));
        let outcome = editor.commit_to(&output).unwrap();

        assert_eq!(outcome.backup, None);
        assert_eq!(outcome.written_to, output);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), PRESET);
        assert!(std::fs::read_to_string(&output).unwrap().contains(r#"x="15""#));
        assert!(!path.with_extension("dspreset.backup").exists());
    }

    #[test]
    fn test_apply_outcomes() {
        let (_dir, path) = fixture();

        let noop = TransformSpec::delta(Selection::new([ControlKind::Label]), Geometry::new(1.0, 1.0, 1.0, 1.0));
        assert!(matches!(apply(&path, &noop, suffix_config(), &mut AssumeYes).unwrap(), RunOutcome::NoChanges(_)));

        let spec = knob_delta(5.0);
        let mut asked = 0;
        let mut decline = |preview: &Preview| {
            asked += 1;
            assert_eq!(preview.changed, 1);
            false
        };
        assert!(matches!(apply(&path, &spec, suffix_config(), &mut decline).unwrap(), RunOutcome::Declined(_)));
        assert_eq!(asked, 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), PRESET);

        match apply(&path, &spec, suffix_config(), &mut AssumeYes).unwrap() {
            RunOutcome::Committed { preview, outcome } => {
                assert_eq!(preview.affected, 1);
                assert!(outcome.backup.is_some());
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_summary() {
        let (_dir, path) = fixture();
        let editor = PresetEditor::open(&path, suffix_config()).unwrap();
        assert!(editor.summary().contains("synth.dspreset"));
        assert!(editor.summary().contains("loaded"));
    }
}
