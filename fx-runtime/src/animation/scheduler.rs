//! # Scheduler 模块
//!
//! 动画调度器：宿主每帧调用一次 `tick`，推进所有活跃动画。
//!
//! ## 帧内修改
//!
//! `tick` 推进的是调用开始时的活跃动画快照：
//! - 推进期间新加入的动画排队，推进结束后才进入活跃集合，本帧不会被推进
//! - 推进期间被取消的动画立即生效，快照中排在后面的也不会再被推进
//! - 完成的动画在整轮推进结束后统一移除

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use super::{Animation, AnimationEvent, AnimationId, AnimationState};

struct SchedulerInner {
    name: String,
    /// 活跃动画，按加入顺序排列
    active: RefCell<Vec<Animation>>,
    /// tick 期间加入、等待进入活跃集合的动画
    pending: RefCell<Vec<Animation>>,
    ticking: Cell<bool>,
    paused: Cell<bool>,
    time_scale: Cell<f32>,
    /// 自上次 tick 以来的事件
    events: RefCell<Vec<AnimationEvent>>,
}

/// 动画调度器
///
/// 共享句柄：克隆得到的是同一个调度器，补间内部也可以持有它
/// 并在播放过程中加入或取消动画。
///
/// 多个调度器可以并存，彼此独立。
#[derive(Clone)]
pub struct AnimationScheduler {
    inner: Rc<SchedulerInner>,
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new(SchedulerRegistry::DEFAULT_NAME)
    }
}

impl fmt::Debug for AnimationScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationScheduler")
            .field("name", &self.inner.name)
            .field("active", &self.inner.active.borrow().len())
            .field("pending", &self.inner.pending.borrow().len())
            .field("paused", &self.inner.paused.get())
            .finish()
    }
}

impl AnimationScheduler {
    /// 创建新的调度器
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(SchedulerInner {
                name: name.into(),
                active: RefCell::new(Vec::new()),
                pending: RefCell::new(Vec::new()),
                ticking: Cell::new(false),
                paused: Cell::new(false),
                time_scale: Cell::new(1.0),
                events: RefCell::new(Vec::new()),
            }),
        }
    }

    /// 调度器名称
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    // ========== 动画控制 ==========

    /// 加入动画
    ///
    /// tick 期间加入的动画会排队，在本轮推进结束后才生效。
    ///
    /// # 返回
    /// - `true`: 已加入（或已排队）
    /// - `false`: 动画已结束，或已经在调度器中
    pub fn add(&self, animation: &Animation) -> bool {
        if animation.is_finished() || self.contains(animation) {
            return false;
        }
        if self.inner.ticking.get() {
            self.inner.pending.borrow_mut().push(animation.clone());
        } else {
            self.inner.active.borrow_mut().push(animation.clone());
        }
        true
    }

    /// 取消动画
    ///
    /// 立即生效且幂等：动画从活跃集合与等待队列中移除，之后不会再被推进。
    ///
    /// # 返回
    /// 本次调用是否真的取消了一个活跃动画
    pub fn cancel(&self, animation: &Animation) -> bool {
        let removed = self.remove(animation);
        let cancelled = animation.cancel();
        if cancelled || removed {
            debug!(scheduler = %self.name(), id = %animation.id(), "取消动画");
            self.inner
                .events
                .borrow_mut()
                .push(AnimationEvent::Cancelled(animation.id()));
        }
        cancelled
    }

    fn remove(&self, animation: &Animation) -> bool {
        let mut removed = false;
        for list in [&self.inner.active, &self.inner.pending] {
            let mut list = list.borrow_mut();
            let before = list.len();
            list.retain(|a| !a.ptr_eq(animation));
            removed |= list.len() != before;
        }
        removed
    }

    /// 推进所有活跃动画
    ///
    /// 每个在调用开始时活跃的动画恰好以同一个 dt（乘以时间缩放）推进一次。
    /// 暂停时不推进任何动画。
    ///
    /// # 返回
    /// 自上次 tick 以来产生的事件
    pub fn tick(&self, dt: f32) -> Vec<AnimationEvent> {
        if self.inner.ticking.get() {
            warn!(scheduler = %self.name(), "tick 被重入调用，已忽略");
            return Vec::new();
        }

        if !self.inner.paused.get() {
            self.inner.ticking.set(true);
            let dt = dt * self.inner.time_scale.get();

            let snapshot: Vec<Animation> = self.inner.active.borrow().clone();
            for animation in &snapshot {
                animation.advance(dt);
            }

            self.retain_active();
            self.inner.ticking.set(false);

            // 推进期间排队的动画；排队后又被取消的直接丢弃
            let pending = std::mem::take(&mut *self.inner.pending.borrow_mut());
            self.inner
                .active
                .borrow_mut()
                .extend(pending.into_iter().filter(Animation::is_active));
        }

        std::mem::take(&mut *self.inner.events.borrow_mut())
    }

    /// 移除已结束的动画并记录事件
    fn retain_active(&self) {
        let mut active = self.inner.active.borrow_mut();
        let mut events = self.inner.events.borrow_mut();
        active.retain(|animation| match animation.state() {
            AnimationState::Active => true,
            AnimationState::Completed => {
                events.push(AnimationEvent::Completed(animation.id()));
                false
            }
            AnimationState::Cancelled => {
                events.push(AnimationEvent::Cancelled(animation.id()));
                false
            }
        });
    }

    /// 跳过所有动画：每个动画以终值执行一次后移除
    pub fn skip_all(&self) {
        let mut skipped: Vec<Animation> = std::mem::take(&mut *self.inner.active.borrow_mut());
        skipped.append(&mut self.inner.pending.borrow_mut());

        for animation in &skipped {
            if animation.skip() {
                self.inner
                    .events
                    .borrow_mut()
                    .push(AnimationEvent::Skipped(animation.id()));
            }
        }
    }

    /// 取消所有动画并清空事件队列
    pub fn clear(&self) {
        let active = std::mem::take(&mut *self.inner.active.borrow_mut());
        let pending = std::mem::take(&mut *self.inner.pending.borrow_mut());
        for animation in active.iter().chain(&pending) {
            animation.cancel();
        }
        self.inner.events.borrow_mut().clear();
    }

    /// 暂停：之后的 tick 不推进任何动画
    pub fn pause(&self) {
        self.inner.paused.set(true);
    }

    /// 恢复推进
    pub fn resume(&self) {
        self.inner.paused.set(false);
    }

    /// 是否已暂停
    pub fn is_paused(&self) -> bool {
        self.inner.paused.get()
    }

    /// 设置时间缩放（负数与非有限值按 0 处理）
    pub fn set_time_scale(&self, scale: f32) {
        let scale = if scale.is_finite() { scale.max(0.0) } else { 0.0 };
        self.inner.time_scale.set(scale);
    }

    /// 当前时间缩放
    pub fn time_scale(&self) -> f32 {
        self.inner.time_scale.get()
    }

    // ========== 查询方法 ==========

    /// 动画是否在调度器中（包括等待队列）
    pub fn contains(&self, animation: &Animation) -> bool {
        let found = |list: &RefCell<Vec<Animation>>| list.borrow().iter().any(|a| a.ptr_eq(animation));
        found(&self.inner.active) || found(&self.inner.pending)
    }

    /// 按 ID 查找调度器中的动画
    pub fn get(&self, id: AnimationId) -> Option<Animation> {
        let find = |list: &RefCell<Vec<Animation>>| list.borrow().iter().find(|a| a.id() == id).cloned();
        find(&self.inner.active).or_else(|| find(&self.inner.pending))
    }

    /// 活跃动画数量（包括等待队列）
    pub fn active_count(&self) -> usize {
        let count = |list: &RefCell<Vec<Animation>>| list.borrow().iter().filter(|a| a.is_active()).count();
        count(&self.inner.active) + count(&self.inner.pending)
    }

    /// 是否有活跃的动画
    pub fn has_active_animations(&self) -> bool {
        self.active_count() > 0
    }
}

/// 调度器上下文
///
/// 由宿主显式创建并持有：一个默认调度器，外加按名创建的具名调度器。
/// 没有全局单例，测试和多个宿主可以各自拥有独立的上下文。
#[derive(Debug, Default)]
pub struct SchedulerRegistry {
    default: AnimationScheduler,
    named: BTreeMap<String, AnimationScheduler>,
}

impl SchedulerRegistry {
    /// 默认调度器的名称
    pub const DEFAULT_NAME: &'static str = "default";

    /// 创建新的上下文
    pub fn new() -> Self {
        Self::default()
    }

    /// 默认调度器
    pub fn default_scheduler(&self) -> &AnimationScheduler {
        &self.default
    }

    /// 获取具名调度器，不存在时创建
    pub fn get_or_create(&mut self, name: &str) -> AnimationScheduler {
        if name == Self::DEFAULT_NAME {
            return self.default.clone();
        }
        self.named
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(scheduler = %name, "创建调度器");
                AnimationScheduler::new(name)
            })
            .clone()
    }

    /// 获取具名调度器
    pub fn get(&self, name: &str) -> Option<&AnimationScheduler> {
        if name == Self::DEFAULT_NAME {
            Some(&self.default)
        } else {
            self.named.get(name)
        }
    }

    /// 移除具名调度器（其中的动画全部取消）
    pub fn remove(&mut self, name: &str) -> bool {
        match self.named.remove(name) {
            Some(scheduler) => {
                scheduler.clear();
                true
            }
            None => false,
        }
    }

    /// 所有调度器名称（默认调度器在前）
    pub fn names(&self) -> Vec<&str> {
        std::iter::once(Self::DEFAULT_NAME)
            .chain(self.named.keys().map(String::as_str))
            .collect()
    }

    /// 以同一个 dt 推进所有调度器
    pub fn tick_all(&self, dt: f32) -> Vec<AnimationEvent> {
        let mut events = self.default.tick(dt);
        for scheduler in self.named.values() {
            events.extend(scheduler.tick(dt));
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tween::{call, from_fn};

    type Log = Rc<RefCell<Vec<String>>>;

    fn recording(log: &Log, name: &'static str, duration: f32) -> Animation {
        let log = log.clone();
        Animation::new(
            from_fn(duration, move |p| log.borrow_mut().push(format!("{name}:{p}"))).unwrap(),
        )
    }

    #[test]
    fn test_scheduler_creation() {
        let scheduler = AnimationScheduler::new("ui");
        assert_eq!(scheduler.name(), "ui");
        assert_eq!(scheduler.active_count(), 0);
        assert!(!scheduler.has_active_animations());
        assert!(!scheduler.is_paused());
    }

    #[test]
    fn test_tick_advances_and_removes_completed() {
        let log: Log = Rc::default();
        let scheduler = AnimationScheduler::default();
        let a = recording(&log, "a", 1.0);
        let b = recording(&log, "b", 0.5);

        assert!(scheduler.add(&a));
        assert!(scheduler.add(&b));
        assert!(!scheduler.add(&a));

        assert!(scheduler.tick(0.25).is_empty());
        let events = scheduler.tick(0.25);
        assert_eq!(events, vec![AnimationEvent::Completed(b.id())]);
        assert_eq!(scheduler.active_count(), 1);
        assert!(scheduler.contains(&a));
        assert!(!scheduler.contains(&b));

        assert_eq!(*log.borrow(), vec!["a:0.25", "b:0.5", "a:0.5", "b:1"]);
    }

    #[test]
    fn test_without_tick_nothing_is_removed() {
        let log: Log = Rc::default();
        let scheduler = AnimationScheduler::default();
        let a = recording(&log, "a", 0.0);
        scheduler.add(&a);

        assert!(scheduler.contains(&a));
        assert_eq!(scheduler.active_count(), 1);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_tick_zero_changes_nothing() {
        let log: Log = Rc::default();
        let scheduler = AnimationScheduler::default();
        let a = recording(&log, "a", 1.0);
        scheduler.add(&a);
        scheduler.tick(0.5);

        let events = scheduler.tick(0.0);
        assert!(events.is_empty());
        assert_eq!(a.progress(), Some(0.5));
        assert!(a.is_active());
    }

    #[test]
    fn test_add_during_tick_is_deferred() {
        let log: Log = Rc::default();
        let scheduler = AnimationScheduler::default();
        let late = recording(&log, "late", 1.0);

        let spawner = {
            let scheduler = scheduler.clone();
            let late = late.clone();
            Animation::new(call(move || {
                assert!(scheduler.add(&late));
            }))
        };
        scheduler.add(&spawner);

        let events = scheduler.tick(0.5);
        assert_eq!(events, vec![AnimationEvent::Completed(spawner.id())]);
        // 本帧加入的动画不会被推进
        assert!(log.borrow().is_empty());
        assert!(scheduler.contains(&late));

        scheduler.tick(0.5);
        assert_eq!(*log.borrow(), vec!["late:0.5"]);
    }

    #[test]
    fn test_cancel_during_tick_stops_later_animation() {
        let log: Log = Rc::default();
        let scheduler = AnimationScheduler::default();
        let victim = recording(&log, "victim", 1.0);

        let killer = {
            let scheduler = scheduler.clone();
            let victim = victim.clone();
            Animation::new(call(move || {
                scheduler.cancel(&victim);
            }))
        };
        scheduler.add(&killer);
        scheduler.add(&victim);

        let events = scheduler.tick(0.1);
        assert!(log.borrow().is_empty());
        assert_eq!(victim.state(), AnimationState::Cancelled);
        assert_eq!(
            events,
            vec![
                AnimationEvent::Cancelled(victim.id()),
                AnimationEvent::Completed(killer.id()),
            ]
        );
        assert_eq!(scheduler.active_count(), 0);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let log: Log = Rc::default();
        let scheduler = AnimationScheduler::default();
        let a = recording(&log, "a", 1.0);
        scheduler.add(&a);

        assert!(scheduler.cancel(&a));
        assert!(!scheduler.cancel(&a));
        assert_eq!(scheduler.tick(1.0), vec![AnimationEvent::Cancelled(a.id())]);
        assert!(log.borrow().is_empty());

        // 已结束的动画不能再加入
        assert!(!scheduler.add(&a));
    }

    #[test]
    fn test_external_cancel_reported_on_tick() {
        let log: Log = Rc::default();
        let scheduler = AnimationScheduler::default();
        let a = recording(&log, "a", 1.0);
        scheduler.add(&a);

        a.cancel();
        assert_eq!(scheduler.tick(0.1), vec![AnimationEvent::Cancelled(a.id())]);
        assert!(!scheduler.contains(&a));
    }

    #[test]
    fn test_reentrant_tick_ignored() {
        let scheduler = AnimationScheduler::default();
        let inner_events: Rc<RefCell<Option<Vec<AnimationEvent>>>> = Rc::default();

        let anim = {
            let scheduler = scheduler.clone();
            let inner_events = inner_events.clone();
            Animation::new(call(move || {
                *inner_events.borrow_mut() = Some(scheduler.tick(1.0));
            }))
        };
        scheduler.add(&anim);
        scheduler.tick(0.1);

        assert_eq!(*inner_events.borrow(), Some(Vec::new()));
        assert!(anim.is_finished());
    }

    #[test]
    fn test_pause_and_time_scale() {
        let log: Log = Rc::default();
        let scheduler = AnimationScheduler::default();
        let a = recording(&log, "a", 1.0);
        scheduler.add(&a);

        scheduler.pause();
        scheduler.tick(0.5);
        assert!(log.borrow().is_empty());

        scheduler.resume();
        scheduler.set_time_scale(0.5);
        scheduler.tick(0.5);
        assert_eq!(a.elapsed(), Some(0.25));

        scheduler.set_time_scale(-3.0);
        assert_eq!(scheduler.time_scale(), 0.0);
    }

    #[test]
    fn test_skip_all() {
        let log: Log = Rc::default();
        let scheduler = AnimationScheduler::default();
        let a = recording(&log, "a", 1.0);
        let b = recording(&log, "b", 2.0);
        scheduler.add(&a);
        scheduler.add(&b);

        scheduler.skip_all();
        assert!(!scheduler.has_active_animations());
        assert_eq!(*log.borrow(), vec!["a:1", "b:1"]);
        assert_eq!(
            scheduler.tick(0.1),
            vec![AnimationEvent::Skipped(a.id()), AnimationEvent::Skipped(b.id())]
        );
    }

    #[test]
    fn test_clear_cancels_everything() {
        let log: Log = Rc::default();
        let scheduler = AnimationScheduler::default();
        let a = recording(&log, "a", 1.0);
        scheduler.add(&a);

        scheduler.clear();
        assert_eq!(a.state(), AnimationState::Cancelled);
        assert!(scheduler.tick(0.1).is_empty());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_get_by_id() {
        let log: Log = Rc::default();
        let scheduler = AnimationScheduler::default();
        let a = recording(&log, "a", 1.0);
        scheduler.add(&a);

        assert_eq!(scheduler.get(a.id()), Some(a.clone()));
        assert_eq!(scheduler.get(AnimationId::new(u64::MAX)), None);
    }

    #[test]
    fn test_registry_schedulers_are_independent() {
        let log: Log = Rc::default();
        let mut registry = SchedulerRegistry::new();
        let ui = registry.get_or_create("ui");
        assert_eq!(ui.name(), "ui");
        assert_eq!(registry.names(), vec!["default", "ui"]);

        let a = recording(&log, "a", 1.0);
        let b = recording(&log, "b", 1.0);
        registry.default_scheduler().add(&a);
        ui.add(&b);

        // 同名返回同一个调度器
        assert!(registry.get_or_create("ui").contains(&b));
        assert!(!registry.default_scheduler().contains(&b));

        let events = registry.tick_all(1.0);
        assert_eq!(
            events,
            vec![AnimationEvent::Completed(a.id()), AnimationEvent::Completed(b.id())]
        );

        assert!(registry.remove("ui"));
        assert!(registry.get("ui").is_none());
        assert!(registry.get("default").is_some());
    }
}
