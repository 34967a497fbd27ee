//! CLI 命令定义
//!
//! 使用 clap derive 宏定义命令行接口结构。

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// 简单规则打标签工具
#[derive(Parser, Debug)]
#[command(name = "simplelabel")]
#[command(version, about = "基于规则表的数据打标签工具")]
#[command(propagate_version = true)]
pub struct Cli {
    /// 日志级别，覆盖配置文件 (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// 配置目录，默认读取 CONFIG_DIR 或 ./config
    #[arg(long)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// 子命令枚举
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 输出规则模板（表头、可用条件与示例行）
    Template {
        /// 输出到文件，默认写到标准输出
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 校验并编译规则表
    Check {
        /// 规则表文件（JSON 行数组）
        #[arg(short, long)]
        rules: PathBuf,
    },

    /// 对数据文件中的每一行打标签
    ///
    /// 输出的每一行会追加标签列，列名取自配置 `labeling.label_column`。
    Label {
        #[arg(short, long)]
        rules: PathBuf,

        /// 数据文件（JSON 对象数组）
        #[arg(short, long)]
        data: PathBuf,

        /// 字段映射文件：字段名称 -> 字段标识
        #[arg(short, long)]
        mapping: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 匹配策略 (first_match, all_matches)
        #[arg(short, long)]
        policy: Option<String>,

        /// 在输出中附带规则评估追踪
        #[arg(long)]
        trace: bool,
    },

    /// 将规则表编译为 SQL 条件
    Sql {
        #[arg(short, long)]
        rules: PathBuf,

        /// 字段标识文件：字段名称 -> 列名
        #[arg(short, long)]
        identifiers: PathBuf,

        /// SQL 方言 (generic, mysql, postgres, sqlite)
        #[arg(long)]
        dialect: Option<String>,

        /// 输出合并后的 CASE WHEN 表达式
        #[arg(long)]
        joined: bool,

        /// 逐条输出规则条件，覆盖配置中的 `sql.joined`
        #[arg(long, conflicts_with = "joined")]
        split: bool,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// `--joined` / `--split` 转为输出方式覆盖，均未指定时沿用配置
pub fn joined_override(joined: bool, split: bool) -> Option<bool> {
    match (joined, split) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}
