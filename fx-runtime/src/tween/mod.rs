//! # Tween 模块
//!
//! 补间：以归一化进度为参数的一步副作用。
//!
//! ## 核心概念
//!
//! - [`Tween`]: 补间接口，报告时长并在给定进度上执行一步
//! - 属性补间：[`translate`] / [`rotate`] / [`scale`]，缺省端点在**构造时**读取目标当前值
//! - 调用补间：[`call`] / [`invoke`] / [`attach`] / [`detach`]，零时长，只执行一次
//! - 组合器：[`Sequence`] / [`Parallel`] / [`Eased`]
//!
//! 补间本身不关心时间，由 [`Animation`](crate::animation::Animation) 把经过的时间
//! 换算成进度后驱动它。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let slide_out = Sequence::new()
//!     .then(tween::translate(&target, None, Some(Vec3::new(4.0, 0.0, 0.0)), None)?)
//!     .then(tween::detach(&target))
//!     .with_duration(0.5);
//!
//! scheduler.add(&Animation::new(slide_out.eased(EasingFunction::EaseOutCubic)));
//! ```

mod combinator;
mod property;

pub use combinator::{Eased, Parallel, Sequence};
pub use property::{Interpolate, PropertyTween, rotate, scale, translate, translate_with_speed};

use std::fmt;

use tracing::warn;

use crate::animation::{EasingFunction, MethodArg, Target};
use crate::error::TweenError;

/// 补间接口
///
/// `apply` 以单调不减的进度被调用，最后一次调用的进度恰好为 `1.0`。
/// 补间由驱动它的动画独占，因此 `apply` 可以修改自身状态。
pub trait Tween {
    /// 配置的时长（秒），`0` 表示瞬时
    fn duration(&self) -> f32;

    /// 在给定进度上执行一步
    fn apply(&mut self, progress: f32);
}

impl<T: Tween + ?Sized> Tween for Box<T> {
    fn duration(&self) -> f32 {
        (**self).duration()
    }

    fn apply(&mut self, progress: f32) {
        (**self).apply(progress)
    }
}

/// 补间扩展方法
pub trait TweenExt: Tween + Sized + 'static {
    /// 用缓动曲线重映射进度
    fn eased(self, easing: EasingFunction) -> Eased<Self> {
        Eased::new(self, easing)
    }

    /// 装箱为 trait object
    fn boxed(self) -> Box<dyn Tween> {
        Box::new(self)
    }
}

impl<T: Tween + 'static> TweenExt for T {}

/// 校验时长：必须是非负有限值
pub(crate) fn check_duration(duration: f32) -> Result<f32, TweenError> {
    if duration.is_finite() && duration >= 0.0 {
        Ok(duration)
    } else {
        Err(TweenError::InvalidDuration(duration))
    }
}

/// 由闭包构成的补间
///
/// 调用方提供的不透明"时间到效果"函数。
pub struct FnTween<F> {
    duration: f32,
    step: F,
}

impl<F: FnMut(f32)> Tween for FnTween<F> {
    fn duration(&self) -> f32 {
        self.duration
    }

    fn apply(&mut self, progress: f32) {
        (self.step)(progress)
    }
}

impl<F> fmt::Debug for FnTween<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTween")
            .field("duration", &self.duration)
            .finish_non_exhaustive()
    }
}

/// 创建闭包补间
pub fn from_fn<F: FnMut(f32)>(duration: f32, step: F) -> Result<FnTween<F>, TweenError> {
    Ok(FnTween {
        duration: check_duration(duration)?,
        step,
    })
}

/// 零时长的一次性调用补间
///
/// 第一次观察到任意进度时执行动作，之后的调用都是空操作。
/// 在 [`Sequence`] 中可作为屏障：前面的补间全部结束后才会触发。
pub struct CallTween {
    action: Option<Box<dyn FnOnce()>>,
}

impl CallTween {
    /// 动作是否已执行
    pub fn has_fired(&self) -> bool {
        self.action.is_none()
    }
}

impl Tween for CallTween {
    fn duration(&self) -> f32 {
        0.0
    }

    fn apply(&mut self, _progress: f32) {
        if let Some(action) = self.action.take() {
            action();
        }
    }
}

impl fmt::Debug for CallTween {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallTween")
            .field("fired", &self.has_fired())
            .finish()
    }
}

/// 创建调用补间
pub fn call(action: impl FnOnce() + 'static) -> CallTween {
    CallTween {
        action: Some(Box::new(action)),
    }
}

/// 创建按名调用目标方法的补间
pub fn invoke(target: &Target, method: impl Into<String>, arg: Option<MethodArg>) -> CallTween {
    let target = target.clone();
    let method = method.into();
    call(move || {
        if !target.invoke(&method, arg.as_ref()) {
            warn!(method = %method, "目标不支持该方法，调用被忽略");
        }
    })
}

/// 从父节点脱离
pub fn detach(target: &Target) -> CallTween {
    invoke(target, "detach", None)
}

/// 挂到指定父节点下
pub fn attach(target: &Target, parent: impl Into<String>) -> CallTween {
    invoke(target, "attach", Some(MethodArg::Text(parent.into())))
}

/// 空等待
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wait(f32);

impl Tween for Wait {
    fn duration(&self) -> f32 {
        self.0
    }

    fn apply(&mut self, _progress: f32) {}
}

/// 创建空等待补间
pub fn wait(duration: f32) -> Result<Wait, TweenError> {
    Ok(Wait(check_duration(duration)?))
}
