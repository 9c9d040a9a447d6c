//! # FX Replay
//!
//! 效果回放工具 - 无头加载时间线与效果样式表，以固定帧率驱动调度器，
//! 输出事件日志与节点最终状态。用于在没有宿主的情况下检查样式表。
//!
//! ## 用法
//!
//! ```bash
//! # 在项目根目录使用 cargo 运行
//! cargo run -p fx-replay -- demos/panel.json
//! cargo run -p fx-replay -- demos/panel.json --fps 30 --duration 2.0
//! cargo run -p fx-replay -- demos/panel.json -vv --json
//! ```

mod replay;
mod script;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser};
use tracing::Level;

use crate::replay::{Replay, Report};
use crate::script::ReplayScript;

#[derive(Parser)]
#[command(name = "fx-replay")]
#[command(about = "效果回放工具 - 以固定帧率无头驱动动画调度器")]
#[command(version)]
struct Cli {
    /// 回放脚本（JSON）
    script: PathBuf,

    /// 帧率（默认：60）
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..=1000))]
    fps: u32,

    /// 回放时长（秒），缺省时回放到所有动画结束
    #[arg(short, long)]
    duration: Option<f32>,

    /// 日志详细程度（-v: debug, -vv: trace）
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// 以 JSON 输出结果
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("❌ 回放失败: {e:#}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    if let Some(duration) = cli.duration {
        anyhow::ensure!(
            duration.is_finite() && duration >= 0.0,
            "回放时长必须是非负数: {duration}"
        );
    }

    let script = ReplayScript::load(&cli.script)?;
    let report = Replay::new(&script)?.run(cli.fps, cli.duration);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &Report) {
    println!("帧数: {}  时长: {:.3}s", report.frames, report.time);
    println!();

    for entry in &report.entries {
        println!(
            "[{:>8.3}] {:<12} {:<16} {:?}",
            entry.time, entry.node, entry.effect, entry.kind
        );
    }
    println!();

    for node in &report.nodes {
        let p = node.position;
        let s = node.scale;
        println!(
            "{}: position=({:.3}, {:.3}, {:.3}) scale=({:.3}, {:.3}, {:.3}) visible={} parent={}",
            node.name,
            p.x,
            p.y,
            p.z,
            s.x,
            s.y,
            s.z,
            node.visible,
            node.parent.as_deref().unwrap_or("-")
        );
    }
}
