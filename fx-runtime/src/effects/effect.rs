//! # Effect
//!
//! 效果工厂接口与调用记录。

use std::fmt;
use std::rc::Rc;

use crate::animation::{Animation, Target};

/// 效果
///
/// 产生动画的工厂。效果本身不保存任何单次调用的状态，
/// 同一个实例可以在同一帧内对多个目标反复调用。
///
/// ## 实现示例
///
/// ```rust,ignore
/// struct Pulse;
///
/// impl Effect for Pulse {
///     fn channel(&self) -> Option<&str> {
///         Some("scale")
///     }
///
///     fn create(&self, target: &Target, _existing: Option<&EffectInvocation>) -> Option<Animation> {
///         let grow = tween::scale(target, None, Some(Vec3::new(1.2, 1.2, 1.2)), Some(0.1)).ok()?;
///         let back = tween::scale(target, Some(Vec3::new(1.2, 1.2, 1.2)), Some(Vec3::one()), Some(0.1)).ok()?;
///         Some(Animation::new(Sequence::new().then(grow).then(back)))
///     }
/// }
/// ```
pub trait Effect {
    /// 替换作用域
    ///
    /// 同一目标的同一通道上最多只有一个被跟踪的调用；
    /// `None` 表示不跟踪，每次调用彼此独立。
    fn channel(&self) -> Option<&str>;

    /// 创建新的动画
    ///
    /// `existing` 是同一通道上即将被替换的调用（已从通道中取出），
    /// 工厂可以据此决定如何开始，例如从上一个动画停下的地方继续。
    ///
    /// 返回 `None` 表示空效果：不调度任何动画，但通道仍会被清空。
    fn create(&self, target: &Target, existing: Option<&EffectInvocation>) -> Option<Animation>;
}

/// 共享的效果引用
pub type EffectRef = Rc<dyn Effect>;

/// 一次 `run` 调用的记录
#[derive(Clone)]
pub struct EffectInvocation {
    /// 运行时使用的效果名
    pub name: String,
    /// 效果实例
    pub effect: EffectRef,
    /// 调度的动画
    pub animation: Animation,
}

impl EffectInvocation {
    /// 动画是否仍在播放
    pub fn is_active(&self) -> bool {
        self.animation.is_active()
    }

    /// 是否由指定的效果实例产生
    pub fn is_from(&self, effect: &EffectRef) -> bool {
        Rc::ptr_eq(&self.effect, effect)
    }
}

impl fmt::Debug for EffectInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectInvocation")
            .field("name", &self.name)
            .field("channel", &self.effect.channel())
            .field("animation", &self.animation)
            .finish()
    }
}

/// 由闭包构成的效果
pub struct FnEffect<F> {
    channel: Option<String>,
    factory: F,
}

impl<F> FnEffect<F>
where
    F: Fn(&Target, Option<&EffectInvocation>) -> Option<Animation>,
{
    /// 创建属于指定通道的效果
    pub fn new(channel: impl Into<String>, factory: F) -> Self {
        Self {
            channel: Some(channel.into()),
            factory,
        }
    }

    /// 创建不跟踪的效果
    pub fn untracked(factory: F) -> Self {
        Self {
            channel: None,
            factory,
        }
    }
}

impl<F> Effect for FnEffect<F>
where
    F: Fn(&Target, Option<&EffectInvocation>) -> Option<Animation>,
{
    fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    fn create(&self, target: &Target, existing: Option<&EffectInvocation>) -> Option<Animation> {
        (self.factory)(target, existing)
    }
}

impl<F> fmt::Debug for FnEffect<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnEffect")
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}
