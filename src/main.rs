use anyhow::{bail, Context, Result};
use clap::Parser;
use inquire::InquireError;
use std::fmt::Display;
use std::path::{Path, PathBuf};

use dspreset_editor::utils::has_supported_extension;
use dspreset_editor::{
    BackupNaming, CommitOutcome, Confirmer, ControlKind, EditorConfig, Geometry, GeometryField,
    NamePattern, Operation, PresetEditor, Preview, Selection, TransformSpec,
};

#[derive(Parser)]
#[command(name = "dspreset_editor")]
#[command(about = "批量调整 Decent Sampler .dspreset 文件中控件的位置与尺寸")]
#[command(version)]
struct Cli {
    /// 输入 .dspreset 文件路径
    input: PathBuf,

    /// 要修改的控件类型（knob, button, label, other），逗号分隔；省略时交互选择
    #[arg(short, long, value_delimiter = ',')]
    types: Vec<ControlKind>,

    /// 名称过滤（正则，匹配 id / name / label / text 属性）
    #[arg(long)]
    name: Option<String>,

    /// 绝对设置数值
    #[arg(long, conflicts_with = "delta")]
    set: bool,

    /// 在原值上偏移（默认）
    #[arg(long)]
    delta: bool,

    /// X 值
    #[arg(long, allow_negative_numbers = true)]
    x: Option<f64>,

    /// Y 值
    #[arg(long, allow_negative_numbers = true)]
    y: Option<f64>,

    /// 宽度值
    #[arg(long, allow_negative_numbers = true)]
    width: Option<f64>,

    /// 高度值
    #[arg(long, allow_negative_numbers = true)]
    height: Option<f64>,

    /// 输出到另一个文件（原文件不变，不创建备份）
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 只预览，不写入
    #[arg(long)]
    dry_run: bool,

    /// 跳过确认提示
    #[arg(long)]
    yes: bool,

    /// 以 JSON 输出预览
    #[arg(long)]
    json: bool,

    /// JSON 配置文件
    #[arg(long)]
    config: Option<PathBuf>,

    /// 备份命名规则（suffix 或 timestamped）
    #[arg(long)]
    backup: Option<BackupNaming>,

    /// 显示统计信息后退出
    #[arg(long)]
    stats: bool,

    /// 静默模式(仅输出错误)
    #[arg(long)]
    quiet: bool,
}

/// 交互式确认
///
/// 用户按 Esc / Ctrl-C 视为拒绝；其他提示错误（如非终端环境）保存下来交给调用方报告。
#[derive(Default)]
struct PromptConfirmer {
    error: Option<InquireError>,
}

impl Confirmer for PromptConfirmer {
    fn confirm(&mut self, preview: &Preview) -> bool {
        let answer = inquire::Confirm::new(&format!("应用以上 {} 处变更？", preview.changed))
            .with_default(false)
            .prompt();
        match answer {
            Ok(accepted) => accepted,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => false,
            Err(err) => {
                self.error = Some(err);
                false
            }
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logger(cli.quiet);
    validate_input(&cli.input)?;

    let config = load_config(&cli)?;
    let mut editor = PresetEditor::open(&cli.input, config)
        .with_context(|| format!("加载预设失败: {}", cli.input.display()))?;
    editor.validate().context("预设结构校验失败")?;

    if cli.stats {
        let stats = editor.document().get_stats();
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!("{}", stats);
        }
        return Ok(());
    }

    handle_edit(&cli, &mut editor)
}

fn init_logger(quiet: bool) {
    let default_level = if quiet { "error" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

/// 验证输入文件
fn validate_input(input: &Path) -> Result<()> {
    if !input.exists() {
        bail!("输入文件不存在: {:?}", input);
    }

    if !has_supported_extension(input) {
        bail!("输入文件必须是 .dspreset 文件");
    }

    Ok(())
}

/// 加载配置文件并应用命令行覆盖
fn load_config(cli: &Cli) -> Result<EditorConfig> {
    let mut config = match &cli.config {
        Some(path) => EditorConfig::from_file(path)?,
        None => EditorConfig::default(),
    };

    if let Some(naming) = cli.backup {
        config.backup = naming;
    }

    Ok(config)
}

/// 输出状态信息
///
/// `--json` 时写到 stderr，stdout 只保留 JSON 文档。
fn status(cli: &Cli, message: impl Display) {
    if cli.json {
        eprintln!("{}", message);
    } else {
        println!("{}", message);
    }
}

/// 处理编辑流程
fn handle_edit(cli: &Cli, editor: &mut PresetEditor) -> Result<()> {
    if editor.document().is_empty() {
        status(cli, "警告: 预设中没有找到控件元素");
        return Ok(());
    }

    if !cli.quiet {
        print_control_types(cli, editor);
    }

    let kinds = resolve_kinds(cli, editor)?;
    if kinds.is_empty() {
        status(cli, "未选择任何控件类型，退出。");
        return Ok(());
    }

    let mut selection = Selection::new(kinds);
    if let Some(pattern) = &cli.name {
        selection = selection.with_name(NamePattern::new(pattern)?);
    }

    let operation = resolve_operation(cli)?;
    let values = resolve_values(cli, operation)?;
    let spec = TransformSpec::new(selection, operation, values);

    if spec.is_noop() {
        status(cli, "所有字段都为 0，没有需要修改的内容。");
        return Ok(());
    }

    let selected = editor.select(spec.selection())?.len();
    if selected == 0 {
        status(cli, "所选类型没有找到控件。");
        return Ok(());
    }

    editor.transform(&spec).context("变换后的预设未通过校验，未写入任何内容")?;
    let preview = editor.preview()?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&preview)?);
    } else if !cli.quiet {
        println!("\n{}", preview);
    }

    if !preview.has_changes() {
        status(cli, "没有需要写入的变更。");
        return Ok(());
    }

    if cli.dry_run {
        if !cli.quiet {
            status(cli, "预览模式，未写入任何文件。");
        }
        return Ok(());
    }

    let accepted = if cli.yes {
        editor.confirm(true)?
    } else {
        let mut confirmer = PromptConfirmer::default();
        let accepted = editor.confirm_with(&mut confirmer)?;
        if let Some(err) = confirmer.error {
            return Err(err).context("读取确认失败，文件未修改（可使用 --yes 跳过确认）");
        }
        accepted
    };
    if !accepted {
        status(cli, "已取消，文件未修改。");
        return Ok(());
    }

    let outcome = match &cli.output {
        Some(output) => editor.commit_to(output),
        None => editor.commit(),
    }
    .context("保存失败")?;

    if !cli.quiet {
        print_commit_summary(cli, &outcome);
    }

    Ok(())
}

/// 打印可用控件类型
fn print_control_types(cli: &Cli, editor: &PresetEditor) {
    status(cli, "可用控件类型:");
    for (type_name, count) in editor.document().control_types() {
        status(cli, format!("- {}: {} 个", type_name, count));
    }
}

/// 确定要修改的控件类型（命令行未指定时交互选择）
fn resolve_kinds(cli: &Cli, editor: &PresetEditor) -> Result<Vec<ControlKind>> {
    if !cli.types.is_empty() {
        return Ok(cli.types.clone());
    }

    let options = editor.document().kinds_present();
    inquire::MultiSelect::new("选择要修改的控件类型:", options)
        .prompt()
        .context("读取控件类型失败（可使用 --types 指定）")
}

/// 确定变换方式
fn resolve_operation(cli: &Cli) -> Result<Operation> {
    if cli.set {
        return Ok(Operation::Set);
    }
    if cli.delta || has_value_flags(cli) {
        return Ok(Operation::Delta);
    }

    let choice = inquire::Select::new("变换方式:", vec!["偏移 (delta)", "设置 (set)"])
        .prompt()
        .context("读取变换方式失败（可使用 --set / --delta 指定）")?;
    Ok(if choice.starts_with("设置") {
        Operation::Set
    } else {
        Operation::Delta
    })
}

fn has_value_flags(cli: &Cli) -> bool {
    cli.x.is_some() || cli.y.is_some() || cli.width.is_some() || cli.height.is_some()
}

/// 确定各字段的值（命令行未指定时逐个询问，输入 0 表示不修改）
fn resolve_values(cli: &Cli, operation: Operation) -> Result<Geometry> {
    if has_value_flags(cli) {
        return Ok(Geometry {
            x: cli.x,
            y: cli.y,
            width: cli.width,
            height: cli.height,
        });
    }

    let verb = match operation {
        Operation::Set => "新值",
        Operation::Delta => "偏移（负数表示减少）",
    };

    let mut values = Geometry::default();
    for field in GeometryField::ALL {
        let value = inquire::CustomType::<f64>::new(&format!("{} {}:", field, verb))
            .with_default(0.0)
            .with_help_message("输入 0 表示不修改该字段")
            .with_error_message("请输入数字")
            .prompt()
            .with_context(|| format!("读取 {} 失败（可使用 --{} 指定）", field, field))?;
        if value != 0.0 {
            values.set(field, Some(value));
        }
    }

    Ok(values)
}

/// 打印保存结果
fn print_commit_summary(cli: &Cli, outcome: &CommitOutcome) {
    if let Some(backup) = &outcome.backup {
        status(cli, format!("已创建备份: {:?}", backup));
    }
    status(
        cli,
        format!("已修改 {} 个控件，保存到: {:?}", outcome.modified, outcome.written_to),
    );
}
