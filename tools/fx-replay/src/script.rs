//! 回放脚本：节点初始状态 + 效果样式表 + 时间线。
//!
//! ```json
//! {
//!   "config": { "effects": { "open": { "kind": "open", "channel": "visibility" } } },
//!   "nodes": [ { "name": "panel", "scale": [0, 0, 0], "visible": false } ],
//!   "timeline": [ { "at": 0.0, "node": "panel", "effect": "open" } ]
//! }
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use fx_runtime::{EngineConfig, NodeData};
use serde::{Deserialize, Serialize};

/// 回放脚本
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayScript {
    /// 引擎配置（含效果样式表）
    #[serde(default)]
    pub config: EngineConfig,
    /// 参与回放的节点
    pub nodes: Vec<NodeData>,
    /// 时间线
    #[serde(default)]
    pub timeline: Vec<Cue>,
}

/// 时间线上的一次效果触发
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    /// 触发时刻（秒）
    pub at: f32,
    /// 节点名
    pub node: String,
    /// 效果名
    pub effect: String,
    /// 是否快进，缺省使用配置
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fast_forward: Option<bool>,
}

impl ReplayScript {
    /// 从文件加载并验证
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取脚本失败: {}", path.display()))?;
        Self::from_json_str(&content).with_context(|| format!("脚本无效: {}", path.display()))
    }

    /// 从 JSON 文本解析并验证
    pub fn from_json_str(json: &str) -> Result<Self> {
        let script: Self = serde_json::from_str(json).context("JSON 解析失败")?;
        script.validate()?;
        Ok(script)
    }

    /// 检查配置、节点名与时间线
    pub fn validate(&self) -> Result<()> {
        self.config.validate().context("配置无效")?;

        let mut names = BTreeSet::new();
        for node in &self.nodes {
            if !names.insert(node.name.as_str()) {
                bail!("节点名重复: {}", node.name);
            }
        }

        for (index, cue) in self.timeline.iter().enumerate() {
            if !(cue.at.is_finite() && cue.at >= 0.0) {
                bail!("时间线第 {} 项的触发时刻无效: {}", index + 1, cue.at);
            }
            if !names.contains(cue.node.as_str()) {
                bail!("时间线第 {} 项引用了不存在的节点: {}", index + 1, cue.node);
            }
        }

        Ok(())
    }

    /// 时间线中最晚的触发时刻
    pub fn last_cue_time(&self) -> f32 {
        self.timeline.iter().map(|cue| cue.at).fold(0.0, f32::max)
    }
}
