//! # FX Runtime
//!
//! 时间驱动的补间调度与按通道替换的效果引擎。
//!
//! ## 架构概述
//!
//! `fx-runtime` 不做渲染，也不依赖任何 IO 引擎。宿主每帧调用一次
//! [`AnimationScheduler::tick`]，引擎通过 [`Animatable`] 接口把插值结果写回宿主对象：
//!
//! ```text
//! Host                                   fx-runtime
//!   │                                         │
//!   │──── EffectControl::run(name) ─────────►│ pop 旧调用 → create → 快进 → 取消旧动画
//!   │                                         │
//!   │──── AnimationScheduler::tick(dt) ─────►│ 推进所有活跃动画
//!   │◄─── Animatable::set_* / invoke ────────│
//!   │◄─── Vec<AnimationEvent> ───────────────│
//! ```
//!
//! ## 核心类型
//!
//! - [`Tween`]：以归一化进度为参数的一步副作用
//! - [`Animation`]：把经过的时间换算成进度并驱动补间
//! - [`AnimationScheduler`]：每帧推进动画，帧内修改排队处理
//! - [`Effect`] / [`EffectControl`]：具名、可替换、按通道跟踪的动画
//! - [`EngineConfig`]：引擎配置与效果样式表
//!
//! ## 线程模型
//!
//! 单线程协作式：所有类型基于 `Rc` / `RefCell`，不能跨线程传递。
//!
//! ## 使用示例
//!
//! ```ignore
//! use fx_runtime::{AnimatableNode, AnimationScheduler, EffectControl, EngineConfig, Target};
//!
//! let config = EngineConfig::load("fx.json")?;
//! let scheduler = AnimationScheduler::new("ui");
//!
//! let panel = AnimatableNode::new("panel");
//! let control = EffectControl::new(Rc::new(panel.clone()) as Target, scheduler.clone());
//! control.install_config(&config)?;
//!
//! control.run("open")?;
//! loop {
//!     for event in scheduler.tick(frame_dt) {
//!         // ...
//!     }
//! }
//! ```

pub mod animation;
pub mod config;
pub mod effects;
pub mod error;
pub mod tween;

pub use animation::{
    Animatable, AnimatableNode, Animation, AnimationEvent, AnimationId, AnimationScheduler,
    AnimationState, EasingFunction, MethodArg, NodeData, Quat, SchedulerRegistry, Target, Vec3,
};
pub use config::EngineConfig;
pub use effects::{
    Effect, EffectControl, EffectDef, EffectInvocation, EffectKind, EffectRef, FnEffect,
    ResolvedEffect, resolve,
};
pub use error::{
    ConfigError, EffectError, Endpoint, FxError, FxResult, StyleError, TweenError, TweenProperty,
};
pub use tween::{Parallel, Sequence, Tween, TweenExt};
