//! # Effect Control
//!
//! 单个目标的效果注册表与通道替换协议。
//!
//! ## 替换流程
//!
//! ```text
//! run(name)
//!   → 查找效果（未注册 → EffectError::NotFound）
//!   → 从通道中取出旧调用（pop，不再放回）
//!   → effect.create(target, 旧调用)
//!   → 可选：新动画快进到旧动画的剩余比例
//!   → 取消旧动画
//!   → 调度新动画，记录到通道
//! ```

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use super::effect::{Effect, EffectInvocation, EffectRef};
use super::resolver::resolve;
use crate::animation::{AnimationScheduler, Target};
use crate::config::EngineConfig;
use crate::error::{EffectError, StyleError};

/// 效果控制器
///
/// 每个目标一个。持有 名称 → 效果 的注册表，以及 通道 → 当前调用 的映射，
/// 保证同一通道上最多只有一个被跟踪的动画。
///
/// 所有方法都只需要 `&self`：效果的工厂或补间可以在执行过程中
/// 通过共享的控制器再次调用 `run`。
///
/// ## 使用示例
///
/// ```rust,ignore
/// let control = EffectControl::new(target, scheduler.clone());
/// control.add_effect("open", resolve("open", &EffectDef::new("open").on_channel("visibility"), 1.0)?);
/// control.add_effect("close", resolve("close", &EffectDef::new("close").on_channel("visibility"), 1.0)?);
///
/// control.run("open")?;
/// // 展开未结束时收起：展开被取消，收起从对应进度开始
/// control.run("close")?;
/// ```
pub struct EffectControl {
    target: Target,
    scheduler: AnimationScheduler,
    effects: RefCell<BTreeMap<String, EffectRef>>,
    channels: RefCell<BTreeMap<String, EffectInvocation>>,
    /// `run` 默认是否快进
    fast_forward: Cell<bool>,
}

impl EffectControl {
    /// 创建新的控制器
    pub fn new(target: Target, scheduler: AnimationScheduler) -> Self {
        Self {
            target,
            scheduler,
            effects: RefCell::new(BTreeMap::new()),
            channels: RefCell::new(BTreeMap::new()),
            fast_forward: Cell::new(true),
        }
    }

    /// 设置 `run` 默认是否快进
    pub fn with_fast_forward(self, enabled: bool) -> Self {
        self.fast_forward.set(enabled);
        self
    }

    /// 设置 `run` 默认是否快进
    pub fn set_fast_forward(&self, enabled: bool) {
        self.fast_forward.set(enabled);
    }

    /// `run` 默认是否快进
    pub fn fast_forward(&self) -> bool {
        self.fast_forward.get()
    }

    /// 作用的目标
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// 使用的调度器
    pub fn scheduler(&self) -> &AnimationScheduler {
        &self.scheduler
    }

    // ========== 效果注册 ==========

    /// 注册效果
    ///
    /// 同名效果会被替换（后写入者生效），返回被替换的效果。
    pub fn add_effect(&self, name: impl Into<String>, effect: impl Effect + 'static) -> Option<EffectRef> {
        self.add_shared_effect(name, Rc::new(effect))
    }

    /// 注册共享的效果实例
    ///
    /// 同一实例可以注册到多个控制器。
    pub fn add_shared_effect(&self, name: impl Into<String>, effect: EffectRef) -> Option<EffectRef> {
        self.effects.borrow_mut().insert(name.into(), effect)
    }

    /// 批量注册效果
    pub fn install<I, S>(&self, effects: I)
    where
        I: IntoIterator<Item = (S, EffectRef)>,
        S: Into<String>,
    {
        let mut registry = self.effects.borrow_mut();
        for (name, effect) in effects {
            registry.insert(name.into(), effect);
        }
    }

    /// 注册配置中样式表定义的所有效果，并采用配置的快进默认值
    ///
    /// 任一条目无法解析时不注册任何效果。
    pub fn install_config(&self, config: &EngineConfig) -> Result<(), StyleError> {
        let mut resolved = Vec::with_capacity(config.effects.len());
        for (name, def) in &config.effects {
            let effect: EffectRef = Rc::new(resolve(name, def, config.move_speed)?);
            resolved.push((name.clone(), effect));
        }
        self.install(resolved);
        self.fast_forward.set(config.fast_forward);
        Ok(())
    }

    /// 是否注册了指定效果
    pub fn has_effect(&self, name: &str) -> bool {
        self.effects.borrow().contains_key(name)
    }

    /// 注销效果
    ///
    /// 已经在播放的调用不受影响。
    pub fn remove_effect(&self, name: &str) -> Option<EffectRef> {
        self.effects.borrow_mut().remove(name)
    }

    /// 已注册的效果名（按名称排序）
    pub fn effect_names(&self) -> Vec<String> {
        self.effects.borrow().keys().cloned().collect()
    }

    // ========== 运行 ==========

    /// 运行效果，是否快进取控制器的默认值
    pub fn run(&self, name: &str) -> Result<Option<EffectInvocation>, EffectError> {
        self.run_with(name, self.fast_forward.get())
    }

    /// 运行效果
    ///
    /// # 返回
    /// - `Ok(Some(invocation))`: 已调度新动画（无论效果是否属于某个通道）
    /// - `Ok(None)`: 效果没有产生动画；所在通道已被清空
    /// - `Err(EffectError::NotFound)`: 效果未注册，什么也不做
    pub fn run_with(
        &self,
        name: &str,
        fast_forward: bool,
    ) -> Result<Option<EffectInvocation>, EffectError> {
        let Some(effect) = self.effects.borrow().get(name).cloned() else {
            warn!(effect = %name, "效果未注册");
            return Err(EffectError::NotFound {
                name: name.to_string(),
            });
        };

        // 先取出旧调用，工厂执行期间它已不在通道中
        let channel = effect.channel().map(str::to_string);
        let existing = channel
            .as_deref()
            .and_then(|channel| self.channels.borrow_mut().remove(channel));

        let animation = effect.create(&self.target, existing.as_ref());

        if fast_forward {
            if let (Some(old), Some(new)) = (&existing, &animation) {
                // 同一个效果重复触发不快进
                if !old.is_from(&effect)
                    && old.animation.supports_fast_forward()
                    && new.supports_fast_forward()
                {
                    if let Some(percent) = old.animation.percent_remaining() {
                        new.fast_forward(percent);
                        debug!(
                            effect = %name,
                            replaced = %old.name,
                            percent,
                            "快进新动画"
                        );
                    }
                }
            }
        }

        if let Some(old) = &existing {
            self.scheduler.cancel(&old.animation);
            debug!(effect = %name, replaced = %old.name, id = %old.animation.id(), "取消旧动画");
        }

        let Some(animation) = animation else {
            debug!(effect = %name, channel = ?channel, "效果未产生动画");
            return Ok(None);
        };

        self.scheduler.add(&animation);
        let invocation = EffectInvocation {
            name: name.to_string(),
            effect,
            animation,
        };
        debug!(
            effect = %name,
            channel = ?channel,
            id = %invocation.animation.id(),
            "运行效果"
        );

        if let Some(channel) = channel {
            // 工厂内部可能对同一通道重入调用了 run，其结果被本次调用取代
            let displaced = self
                .channels
                .borrow_mut()
                .insert(channel, invocation.clone());
            if let Some(displaced) = displaced {
                self.scheduler.cancel(&displaced.animation);
            }
        }

        Ok(Some(invocation))
    }

    // ========== 通道 ==========

    /// 通道上当前被跟踪的调用
    pub fn current(&self, channel: &str) -> Option<EffectInvocation> {
        self.channels.borrow().get(channel).cloned()
    }

    /// 当前有调用记录的通道
    pub fn channels(&self) -> Vec<String> {
        self.channels.borrow().keys().cloned().collect()
    }

    /// 取消通道上的调用并清空通道
    ///
    /// # 返回
    /// 通道上原本是否有调用
    pub fn cancel_channel(&self, channel: &str) -> bool {
        let removed = self.channels.borrow_mut().remove(channel);
        match removed {
            Some(invocation) => {
                self.scheduler.cancel(&invocation.animation);
                true
            }
            None => false,
        }
    }

    /// 取消所有通道上的调用
    ///
    /// 不跟踪的调用不受影响。
    pub fn cancel_all(&self) {
        let removed = std::mem::take(&mut *self.channels.borrow_mut());
        for invocation in removed.into_values() {
            self.scheduler.cancel(&invocation.animation);
        }
    }
}

impl fmt::Debug for EffectControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectControl")
            .field("effects", &self.effect_names())
            .field("channels", &self.channels.borrow())
            .field("fast_forward", &self.fast_forward.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimatableNode, Animation, AnimationState, Vec3};
    use crate::effects::{EffectDef, FnEffect};
    use crate::tween::{call, from_fn};

    fn control() -> EffectControl {
        let target: Target = Rc::new(AnimatableNode::new("n"));
        EffectControl::new(target, AnimationScheduler::default())
    }

    fn timed(channel: Option<&'static str>, duration: f32) -> EffectRef {
        let factory = move |_: &Target, _: Option<&EffectInvocation>| {
            Some(Animation::new(from_fn(duration, |_| {}).ok()?))
        };
        match channel {
            Some(channel) => Rc::new(FnEffect::new(channel, factory)),
            None => Rc::new(FnEffect::untracked(factory)),
        }
    }

    #[test]
    fn test_registry_operations() {
        let control = control();
        assert!(control.add_shared_effect("a", timed(Some("x"), 1.0)).is_none());
        assert!(control.add_shared_effect("a", timed(Some("x"), 2.0)).is_some());
        control.add_shared_effect("b", timed(None, 1.0));

        assert!(control.has_effect("a"));
        assert_eq!(control.effect_names(), vec!["a", "b"]);

        // 后写入者生效
        let invocation = control.run("a").unwrap().unwrap();
        assert_eq!(invocation.animation.duration(), Some(2.0));

        assert!(control.remove_effect("a").is_some());
        assert!(!control.has_effect("a"));
        assert!(control.remove_effect("a").is_none());
    }

    #[test]
    fn test_run_unknown_effect() {
        let control = control();
        assert_eq!(
            control.run("missing").unwrap_err(),
            EffectError::NotFound {
                name: "missing".to_string()
            }
        );
        assert_eq!(control.scheduler().active_count(), 0);
    }

    #[test]
    fn test_channel_replacement_cancels_old() {
        let control = control();
        control.add_shared_effect("a", timed(Some("x"), 1.0));
        control.add_shared_effect("b", timed(Some("x"), 1.0));

        let a = control.run("a").unwrap().unwrap();
        let b = control.run("b").unwrap().unwrap();

        assert_eq!(a.animation.state(), AnimationState::Cancelled);
        assert!(!control.scheduler().contains(&a.animation));
        assert!(control.current("x").unwrap().animation.ptr_eq(&b.animation));
        assert_eq!(control.channels(), vec!["x"]);
    }

    #[test]
    fn test_noop_effect_clears_channel() {
        let control = control();
        control.add_shared_effect("a", timed(Some("x"), 1.0));
        control.add_effect("clear", FnEffect::new("x", |_: &Target, _: Option<&EffectInvocation>| None));

        let a = control.run("a").unwrap().unwrap();
        assert!(control.run("clear").unwrap().is_none());

        assert!(a.animation.is_finished());
        assert!(control.current("x").is_none());
    }

    #[test]
    fn test_untracked_effects_independent() {
        let control = control();
        control.add_shared_effect("a", timed(None, 1.0));
        control.add_shared_effect("b", timed(None, 1.0));

        let a = control.run("a").unwrap().unwrap();
        let b = control.run("b").unwrap().unwrap();
        let a2 = control.run("a").unwrap().unwrap();

        assert!(a.is_active() && b.is_active() && a2.is_active());
        assert!(control.channels().is_empty());
        assert_eq!(control.scheduler().active_count(), 3);
    }

    #[test]
    fn test_fast_forward_hand_off() {
        let control = control();
        control.add_shared_effect("a", timed(Some("x"), 2.0));
        control.add_shared_effect("b", timed(Some("x"), 1.0));

        let a = control.run("a").unwrap().unwrap();
        control.scheduler().tick(1.0);
        assert_eq!(a.animation.percent_remaining(), Some(0.5));

        let b = control.run("b").unwrap().unwrap();
        assert_eq!(b.animation.elapsed(), Some(0.5));

        // 关闭快进时从头开始
        let a = control.run_with("a", false).unwrap().unwrap();
        assert_eq!(a.animation.elapsed(), Some(0.0));
    }

    #[test]
    fn test_same_effect_never_fast_forwards() {
        let control = control();
        control.add_shared_effect("a", timed(Some("x"), 2.0));

        let first = control.run("a").unwrap().unwrap();
        control.scheduler().tick(1.0);

        let second = control.run("a").unwrap().unwrap();
        assert!(first.animation.is_finished());
        assert_eq!(second.animation.elapsed(), Some(0.0));
    }

    #[test]
    fn test_fast_forward_skipped_without_capability() {
        let control = control();
        control.add_shared_effect("a", timed(Some("x"), 2.0));
        control.add_effect(
            "open_ended",
            FnEffect::new("x", |_: &Target, _: Option<&EffectInvocation>| {
                Some(Animation::driven(|_| false))
            }),
        );

        control.run("a").unwrap();
        control.scheduler().tick(1.0);
        let driven = control.run("open_ended").unwrap().unwrap();
        assert_eq!(driven.animation.elapsed(), None);

        // 旧动画不支持快进时同样跳过
        let a = control.run("a").unwrap().unwrap();
        assert_eq!(a.animation.elapsed(), Some(0.0));
    }

    #[test]
    fn test_factory_sees_existing_before_cancel() {
        let control = control();
        control.add_shared_effect("a", timed(Some("x"), 1.0));

        let seen: Rc<RefCell<Option<(String, bool)>>> = Rc::default();
        let sink = seen.clone();
        control.add_effect(
            "b",
            FnEffect::new("x", move |_: &Target, existing: Option<&EffectInvocation>| {
                *sink.borrow_mut() = existing.map(|e| (e.name.clone(), e.is_active()));
                None
            }),
        );

        control.run("a").unwrap();
        control.run("b").unwrap();
        assert_eq!(*seen.borrow(), Some(("a".to_string(), true)));
    }

    #[test]
    fn test_cancel_channel_and_all() {
        let control = control();
        control.add_shared_effect("a", timed(Some("x"), 1.0));
        control.add_shared_effect("b", timed(Some("y"), 1.0));
        control.add_shared_effect("free", timed(None, 1.0));

        let a = control.run("a").unwrap().unwrap();
        let b = control.run("b").unwrap().unwrap();
        let free = control.run("free").unwrap().unwrap();

        assert!(control.cancel_channel("x"));
        assert!(!control.cancel_channel("x"));
        assert!(a.animation.is_finished());

        control.cancel_all();
        assert!(b.animation.is_finished());
        assert!(free.is_active());
        assert!(control.channels().is_empty());
    }

    #[test]
    fn test_reentrant_run_from_tween() {
        let node = AnimatableNode::new("n");
        let target: Target = Rc::new(node.clone());
        let control = Rc::new(EffectControl::new(target, AnimationScheduler::default()));

        control.add_effect(
            "grow",
            crate::effects::resolve(
                "grow",
                &EffectDef {
                    to: Some(Vec3::new(2.0, 2.0, 2.0)),
                    duration: Some(1.0),
                    ..EffectDef::new("scale_to").on_channel("scale")
                },
                1.0,
            )
            .unwrap(),
        );

        // 一次性效果在播放时触发另一个效果
        let weak = Rc::downgrade(&control);
        control.add_effect(
            "chain",
            FnEffect::untracked(move |_: &Target, _: Option<&EffectInvocation>| {
                let weak = weak.clone();
                Some(Animation::new(call(move || {
                    if let Some(control) = weak.upgrade() {
                        let _ = control.run("grow");
                    }
                })))
            }),
        );

        control.run("chain").unwrap();
        control.scheduler().tick(0.1);
        let grow = control.current("scale").unwrap();
        assert_eq!(grow.animation.elapsed(), Some(0.0));

        control.scheduler().tick(1.0);
        assert_eq!(node.snapshot().scale, Vec3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn test_install_config() {
        let config = EngineConfig::from_json_str(
            r#"{
                "fast_forward": false,
                "effects": {
                    "open": { "kind": "open", "channel": "visibility" },
                    "close": { "kind": "close", "channel": "visibility" }
                }
            }"#,
        )
        .unwrap();

        let control = control();
        control.install_config(&config).unwrap();
        assert_eq!(control.effect_names(), vec!["close", "open"]);
        assert!(!control.fast_forward());

        let open = control.run("open").unwrap().unwrap();
        assert_eq!(open.effect.channel(), Some("visibility"));
    }
}
