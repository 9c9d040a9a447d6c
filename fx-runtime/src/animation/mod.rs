//! # Animation 模块
//!
//! 动画实例与调度器。
//!
//! ## 核心设计理念
//!
//! 动画系统只负责 **时间轴管理**：
//! - 动画把经过的时间换算成进度，交给补间执行
//! - 调度器每帧推进所有活跃动画，并在帧末统一清理
//! - **不假设对象类型**，补间通过 `Animatable` 接口写回属性
//!
//! ## 核心概念
//!
//! - `Animation`: 单个动画实例（共享句柄）
//! - `AnimationScheduler`: 每帧推进动画的调度器
//! - `SchedulerRegistry`: 显式持有的调度器上下文（默认调度器 + 具名调度器）
//! - `Animatable` / `Target`: 补间作用的对象
//! - `EasingFunction`: 缓动函数
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let scheduler = AnimationScheduler::new("ui");
//!
//! let node = AnimatableNode::new("panel");
//! let target: Target = Rc::new(node.clone());
//! let anim = Animation::new(tween::scale(&target, Some(Vec3::zero()), None, Some(0.3))?);
//! scheduler.add(&anim);
//!
//! // 宿主每帧调用
//! for event in scheduler.tick(dt) {
//!     tracing::debug!(?event, "动画事件");
//! }
//! ```

mod core;
mod easing;
mod node;
mod scheduler;
mod traits;
mod transform;

// 核心类型
pub use self::core::{Animation, AnimationId, AnimationState};
pub use self::easing::EasingFunction;
pub use self::scheduler::{AnimationScheduler, SchedulerRegistry};

// 作用对象
pub use self::node::{AnimatableNode, NodeData};
pub use self::traits::{Animatable, MethodArg, Target};
pub use self::transform::{Quat, Vec3};

/// 动画事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationEvent {
    /// 动画播放完成
    Completed(AnimationId),
    /// 动画被取消
    Cancelled(AnimationId),
    /// 动画被跳过（直接到达终值）
    Skipped(AnimationId),
}

impl AnimationEvent {
    /// 事件对应的动画
    pub fn id(&self) -> AnimationId {
        match self {
            Self::Completed(id) | Self::Cancelled(id) | Self::Skipped(id) => *id,
        }
    }
}
