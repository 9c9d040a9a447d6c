//! 以固定帧率驱动调度器的回放器。

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use fx_runtime::{
    AnimatableNode, AnimationEvent, AnimationId, AnimationScheduler, EffectControl, EffectError,
    NodeData,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::script::{Cue, ReplayScript};

/// 没有指定时长时最多回放的秒数
const MAX_REPLAY_SECONDS: f32 = 600.0;

/// 回放日志条目的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// 效果开始运行
    Run,
    /// 效果没有产生动画
    Noop,
    /// 效果未注册
    NotFound,
    /// 节点不存在
    UnknownNode,
    /// 动画完成
    Completed,
    /// 动画被取消
    Cancelled,
    /// 动画被跳过
    Skipped,
}

/// 回放日志条目
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    /// 发生时刻（秒）
    pub time: f32,
    /// 节点名
    pub node: String,
    /// 效果名
    pub effect: String,
    /// 类型
    pub kind: EntryKind,
}

/// 回放结果
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// 推进的帧数
    pub frames: u32,
    /// 结束时刻（秒）
    pub time: f32,
    /// 日志
    pub entries: Vec<Entry>,
    /// 各节点的最终状态
    pub nodes: Vec<NodeData>,
}

/// 回放器
pub struct Replay {
    scheduler: AnimationScheduler,
    nodes: BTreeMap<String, AnimatableNode>,
    controls: BTreeMap<String, EffectControl>,
    cues: Vec<Cue>,
    /// 动画 → (节点名, 效果名)
    origins: HashMap<AnimationId, (String, String)>,
    entries: Vec<Entry>,
}

impl Replay {
    /// 根据脚本搭建节点、控制器与时间线
    pub fn new(script: &ReplayScript) -> anyhow::Result<Self> {
        let scheduler = AnimationScheduler::new("replay");
        scheduler.set_time_scale(script.config.time_scale);

        let mut nodes = BTreeMap::new();
        let mut controls = BTreeMap::new();
        for data in &script.nodes {
            let node = AnimatableNode::from_data(data.clone());
            let control = EffectControl::new(Rc::new(node.clone()), scheduler.clone());
            control.install_config(&script.config)?;
            nodes.insert(data.name.clone(), node);
            controls.insert(data.name.clone(), control);
        }

        // 同一时刻的触发保持脚本中的顺序
        let mut cues = script.timeline.clone();
        cues.sort_by(|a, b| a.at.total_cmp(&b.at));

        Ok(Self {
            scheduler,
            nodes,
            controls,
            cues,
            origins: HashMap::new(),
            entries: Vec::new(),
        })
    }

    /// 以 `fps` 帧率回放
    ///
    /// 指定 `duration` 时回放到该时刻为止；否则在所有触发完成
    /// 且没有活跃动画时结束。
    pub fn run(mut self, fps: u32, duration: Option<f32>) -> Report {
        let fps = fps.max(1);
        let dt = 1.0 / fps as f32;
        let limit = duration.unwrap_or(MAX_REPLAY_SECONDS);
        let mut next_cue = 0;
        let mut frames = 0u32;

        info!(fps, cues = self.cues.len(), nodes = self.nodes.len(), "开始回放");

        loop {
            let time = frames as f32 * dt;

            while let Some(cue) = self.cues.get(next_cue).filter(|cue| cue.at <= time) {
                let cue = cue.clone();
                self.fire(&cue, time);
                next_cue += 1;
            }

            let finished = next_cue >= self.cues.len() && !self.scheduler.has_active_animations();
            if time >= limit || (duration.is_none() && finished) {
                break;
            }

            let events = self.scheduler.tick(dt);
            frames += 1;
            self.record_events(&events, frames as f32 * dt);
        }

        if duration.is_none() && self.scheduler.has_active_animations() {
            warn!(seconds = MAX_REPLAY_SECONDS, "达到回放时长上限，仍有动画未结束");
        }

        let time = frames as f32 * dt;
        info!(frames, time, entries = self.entries.len(), "回放结束");

        Report {
            frames,
            time,
            entries: self.entries,
            nodes: self.nodes.values().map(AnimatableNode::snapshot).collect(),
        }
    }

    fn fire(&mut self, cue: &Cue, time: f32) {
        let Some(control) = self.controls.get(&cue.node) else {
            warn!(time, node = %cue.node, effect = %cue.effect, "时间线引用了不存在的节点");
            self.push_entry(cue, time, EntryKind::UnknownNode);
            return;
        };
        let fast_forward = cue.fast_forward.unwrap_or_else(|| control.fast_forward());
        debug!(time, node = %cue.node, effect = %cue.effect, fast_forward, "触发效果");

        let kind = match control.run_with(&cue.effect, fast_forward) {
            Ok(Some(invocation)) => {
                self.origins.insert(
                    invocation.animation.id(),
                    (cue.node.clone(), cue.effect.clone()),
                );
                EntryKind::Run
            }
            Ok(None) => EntryKind::Noop,
            Err(EffectError::NotFound { .. }) => EntryKind::NotFound,
        };
        self.push_entry(cue, time, kind);
    }

    fn push_entry(&mut self, cue: &Cue, time: f32, kind: EntryKind) {
        self.entries.push(Entry {
            time,
            node: cue.node.clone(),
            effect: cue.effect.clone(),
            kind,
        });
    }

    fn record_events(&mut self, events: &[AnimationEvent], time: f32) {
        for event in events {
            let kind = match event {
                AnimationEvent::Completed(_) => EntryKind::Completed,
                AnimationEvent::Cancelled(_) => EntryKind::Cancelled,
                AnimationEvent::Skipped(_) => EntryKind::Skipped,
            };
            let Some((node, effect)) = self.origins.remove(&event.id()) else {
                continue;
            };
            self.entries.push(Entry {
                time,
                node,
                effect,
                kind,
            });
        }
    }
}
