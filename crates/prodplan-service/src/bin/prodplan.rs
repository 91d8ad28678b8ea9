use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use prodplan_core::{PlanError, PlannerConfig, TieBreakRule};
use prodplan_service::{logging, ErrorBody, InMemoryCatalog, ProductionService, Scenario};

#[derive(Parser)]
#[command(name = "prodplan")]
#[command(about = "依單價優先分配原物料的生產計劃工具", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 同單價產品的排序規則
    #[arg(long, global = true, default_value = "product-id")]
    tie_break: TieBreakArg,

    /// BOM 引用不存在的原物料時直接失敗
    #[arg(long, global = true)]
    strict_references: bool,

    /// 美化 JSON 輸出
    #[arg(long, global = true)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 計算目錄的生產計劃
    Plan {
        /// 目錄 JSON 檔
        #[arg(value_hint = clap::ValueHint::FilePath)]
        catalog: PathBuf,
    },

    /// 以覆寫庫存計算多個假設情境
    Scenarios {
        /// 目錄 JSON 檔
        #[arg(value_hint = clap::ValueHint::FilePath)]
        catalog: PathBuf,

        /// 情境 JSON 檔（陣列）
        #[arg(value_hint = clap::ValueHint::FilePath)]
        scenarios: PathBuf,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum TieBreakArg {
    ProductId,
    InputOrder,
}

impl From<TieBreakArg> for TieBreakRule {
    fn from(arg: TieBreakArg) -> Self {
        match arg {
            TieBreakArg::ProductId => TieBreakRule::ProductId,
            TieBreakArg::InputOrder => TieBreakRule::InputOrder,
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    logging::init();

    let config = PlannerConfig::new()
        .with_tie_break(cli.tie_break.into())
        .with_strict_references(cli.strict_references);

    let result = match &cli.command {
        Commands::Plan { catalog } => run_plan(catalog, config, cli.pretty),
        Commands::Scenarios { catalog, scenarios } => {
            run_scenarios(catalog, scenarios, config, cli.pretty)
        }
    };

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => match err.downcast_ref::<PlanError>() {
            Some(plan_err) => {
                let body = ErrorBody::from_error(plan_err);
                eprintln!("{}", serde_json::to_string_pretty(&body)?);
                Ok(ExitCode::FAILURE)
            }
            None => Err(err),
        },
    }
}

fn load_service(
    path: &Path,
    config: PlannerConfig,
) -> anyhow::Result<ProductionService<InMemoryCatalog>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("無法讀取目錄檔 {}", path.display()))?;
    let catalog = InMemoryCatalog::from_json(&json)?;
    Ok(ProductionService::with_config(catalog, config))
}

fn run_plan(catalog: &Path, config: PlannerConfig, pretty: bool) -> anyhow::Result<()> {
    let service = load_service(catalog, config)?;
    let report = service.calculate_production_plan()?;
    println!("{}", report.to_json(pretty)?);
    Ok(())
}

fn run_scenarios(
    catalog: &Path,
    scenarios: &Path,
    config: PlannerConfig,
    pretty: bool,
) -> anyhow::Result<()> {
    let service = load_service(catalog, config)?;
    let json = std::fs::read_to_string(scenarios)
        .with_context(|| format!("無法讀取情境檔 {}", scenarios.display()))?;
    let scenarios: Vec<Scenario> = serde_json::from_str(&json).context("情境檔格式錯誤")?;

    let mut output = serde_json::Map::new();
    for (scenario, result) in scenarios.iter().zip(service.calculate_scenarios(&scenarios)?) {
        let value = match result {
            Ok(report) => serde_json::to_value(report)?,
            Err(err) => serde_json::to_value(ErrorBody::from_error(&err))?,
        };
        output.insert(scenario.name.clone(), value);
    }

    let output = serde_json::Value::Object(output);
    let text = if pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{text}");
    Ok(())
}
