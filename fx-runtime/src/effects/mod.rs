//! # Effects 模块（效果与通道替换）
//!
//! 把"在某个目标上运行一个具名、可替换的动画"收敛到一个统一单元。
//!
//! ## 核心组件
//!
//! - [`Effect`]：动画工厂，可选地属于某个替换通道
//! - [`EffectInvocation`]：一次 `run` 的记录 `(name, effect, animation)`
//! - [`EffectControl`]：单个目标的效果注册表，实现通道替换与快进协议
//! - [`EffectKind`] / [`ResolvedEffect`] / [`resolve`]：样式表中的内置效果
//!
//! ## 使用流程
//!
//! ```text
//! EffectDef (样式表)
//!   → resolve() → ResolvedEffect (实现 Effect)
//!   → EffectControl::add_effect(name, effect)
//!   → EffectControl::run(name) → AnimationScheduler
//! ```
//!
//! ## 设计原则
//!
//! - **效果无状态**：同一个效果实例可被多个控制器共享
//! - **通道唯一**：同一控制器的同一通道上最多一个被跟踪的动画
//! - **默认值唯一来源**：效果级默认值只在 `defaults` 模块定义

mod control;
mod effect;
mod registry;
mod resolver;

pub use control::EffectControl;
pub use effect::{Effect, EffectInvocation, EffectRef, FnEffect};
pub use registry::{EffectKind, defaults};
pub use resolver::{EffectDef, ResolvedEffect, resolve};
