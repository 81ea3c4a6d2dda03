// ==========================================
// 车间作业排产引擎 - 主程序入口
// ==========================================
// 用法: jobshop-aps [选项文件]
// 流程: 读取选项 -> 加载数据目录 -> 选择方案 -> 静态分析 + 排产 -> 输出报告
// 红线: 任一步骤失败立即终止,不重试
// ==========================================

use std::path::Path;

use anyhow::{bail, Context};

use jobshop_aps::config::OutputFormat;
use jobshop_aps::domain::types::PlanId;
use jobshop_aps::{
    assign_partitions, logging, FlatFileLoader, PlanReport, PlanningConfigReader, PlanningModel,
    RunOptions, SimpleSolver,
};

fn main() -> anyhow::Result<()> {
    let mut options = match std::env::args().nth(1) {
        Some(path) => RunOptions::from_file(Path::new(&path))
            .with_context(|| format!("无法读取选项文件: {}", path))?,
        None => RunOptions::new(),
    };
    options.apply_env_overrides()?;

    let trace = options.trace_options();
    let format = options.output_format();
    logging::init(trace, format == OutputFormat::Json);

    tracing::info!("==================================================");
    tracing::info!("{}", jobshop_aps::APP_NAME);
    tracing::info!("系统版本: {}", jobshop_aps::VERSION);
    tracing::info!("==================================================");

    let data_dir = options.data_dir();
    tracing::info!(data_dir = %data_dir.display(), "加载数据目录");
    let mut model = FlatFileLoader::new(&data_dir)
        .load()
        .with_context(|| format!("数据加载失败: {}", data_dir.display()))?;

    let plan = select_plan(&model, options.default_plan().as_deref())?;
    tracing::info!(plan = %model.plan(plan).plan_id, "选定方案");

    let solver = SimpleSolver::new(trace);
    let summary = solver.solve(&mut model, plan)?;

    let partitions = assign_partitions(&model);
    tracing::debug!("分区标记结果:\n{}", partitions.log_string());

    let report = PlanReport::build(&model, plan, Some(summary));
    match format {
        OutputFormat::Text => print!("{}", report.render_text()),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }
    Ok(())
}

/// 选择方案: 指定了默认方案则必须存在,否则取方案ID排序后的第一个
fn select_plan(model: &PlanningModel, default_plan: Option<&str>) -> anyhow::Result<PlanId> {
    if let Some(plan_id) = default_plan {
        return match model.find_plan(plan_id) {
            Some(plan) => Ok(plan),
            None => bail!("默认方案不存在: {}", plan_id),
        };
    }
    match model
        .plan_ids()
        .min_by(|&a, &b| model.plan(a).plan_id.cmp(&model.plan(b).plan_id))
    {
        Some(plan) => Ok(plan),
        None => bail!("数据目录中没有任何方案"),
    }
}
