//! simplelabel 命令行入口
//!
//! 加载配置、初始化日志后分发子命令。

use clap::Parser;
use simplelabel::cli::{joined_override, Cli, CommandRunner, Commands};
use simplelabel_shared::config::AppConfig;
use simplelabel_shared::observability;

const SERVICE_NAME: &str = "simplelabel";

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config_dir {
        Some(dir) => {
            let env = std::env::var("SIMPLELABEL_ENV").unwrap_or_else(|_| "development".to_string());
            AppConfig::load_from(dir, &env, SERVICE_NAME)?
        }
        None => AppConfig::load(SERVICE_NAME)?,
    };

    // 命令行参数优先于配置文件与环境变量
    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }
    observability::init(&config.observability)?;

    let runner = CommandRunner::new(config);

    match cli.command {
        Commands::Template { output } => {
            runner.run_template(output.as_deref())?;
        }
        Commands::Check { rules } => {
            runner.run_check(&rules)?;
        }
        Commands::Label {
            rules,
            data,
            mapping,
            output,
            policy,
            trace,
        } => {
            runner.run_label(
                &rules,
                &data,
                &mapping,
                output.as_deref(),
                policy.as_deref(),
                trace,
            )?;
        }
        Commands::Sql {
            rules,
            identifiers,
            dialect,
            joined,
            split,
            output,
        } => {
            runner.run_sql(
                &rules,
                &identifiers,
                dialect.as_deref(),
                joined_override(joined, split),
                output.as_deref(),
            )?;
        }
    }

    Ok(())
}
