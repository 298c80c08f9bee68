/// 编辑器层模块
///
/// 该模块提供有状态的编辑接口，把一次运行显式建模为状态机：
///
/// `Loaded → Validated → Selected → Transformed → Previewed → Confirmed
///  → BackedUp → Written → PostValidated`
///
/// 任何一步失败（或确认时被拒绝）都会进入 `Aborted`，之后不再修改磁盘。
/// 所有修改先在内存中进行，只有 `commit` 才会触碰文件系统。
///
/// # 架构设计
///
/// - **preset_editor**: 预设编辑器，管理一次运行的状态
/// - **delta**: 变更记录
///
/// # 使用示例
///
/// ```rust,ignore
/// use dspreset_editor::{PresetEditor, EditorConfig, Selection, TransformSpec, Geometry};
///
/// let mut editor = PresetEditor::open("piano.dspreset", EditorConfig::default())?;
/// editor.validate()?;
/// editor.select(&Selection::new([ControlKind::Knob]))?;
/// editor.transform(&spec)?;
/// println!("{}", editor.preview()?);
/// if editor.confirm(true)? {
///     editor.commit()?;
/// }
/// ```
pub mod delta;
pub mod preset_editor;

// === 导出公共接口 ===
pub use delta::ChangeRecord;
pub use preset_editor::{
    apply, AssumeNo, AssumeYes, CommitOutcome, Confirmer, PresetEditor, RunOutcome, RunState,
};
