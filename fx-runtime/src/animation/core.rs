//! # Core 模块
//!
//! 动画实例定义。
//!
//! 核心设计：动画把经过的真实时间换算成进度并驱动补间；
//! 它本身不知道补间作用在什么对象上。

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

use crate::tween::Tween;

static NEXT_ANIMATION_ID: AtomicU64 = AtomicU64::new(1);

/// 动画 ID
///
/// 进程内唯一，按创建顺序递增。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnimationId(pub u64);

impl AnimationId {
    /// 创建新的动画 ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    fn next() -> Self {
        Self(NEXT_ANIMATION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for AnimationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 动画状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationState {
    /// 正在播放
    #[default]
    Active,
    /// 已完成
    Completed,
    /// 已取消
    Cancelled,
}

impl AnimationState {
    /// 是否为活跃状态（需要更新）
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// 是否已结束（完成或取消）
    pub fn is_finished(&self) -> bool {
        !self.is_active()
    }
}

/// 动画驱动方式
enum Driver {
    /// 补间驱动：有固定时长，支持快进
    Timed(Box<dyn Tween>),
    /// 开放式驱动：闭包接收 dt，返回 `true` 表示完成；没有时长，不支持快进
    Open(Box<dyn FnMut(f32) -> bool>),
}

struct Inner {
    id: AnimationId,
    state: Cell<AnimationState>,
    /// 补间时长；开放式动画为 `None`
    duration: Option<f32>,
    elapsed: Cell<f32>,
    driver: RefCell<Driver>,
}

/// 动画
///
/// 共享句柄：克隆得到的是同一个动画。调度器、效果调用记录与调用方
/// 都可以持有它，状态变化对所有持有者立即可见。
///
/// 状态与时间记录在 `Cell` 中，补间执行期间也可以安全地查询、取消或快进
/// 正在推进的动画。
///
/// ## 不变量
///
/// - 补间收到的进度为 `clamp(elapsed / duration, 0, 1)`，零时长动画第一次推进即为 `1`
/// - 状态离开 `Active` 后不再调用补间
#[derive(Clone)]
pub struct Animation {
    inner: Rc<Inner>,
}

impl Animation {
    /// 由补间创建动画
    pub fn new(tween: impl Tween + 'static) -> Self {
        Self::from_boxed(Box::new(tween))
    }

    /// 由已装箱的补间创建动画
    pub fn from_boxed(tween: Box<dyn Tween>) -> Self {
        let duration = tween.duration().max(0.0);
        Self::with_driver(Some(duration), Driver::Timed(tween))
    }

    /// 创建开放式动画
    ///
    /// 每次推进以 dt 调用闭包，闭包返回 `true` 时动画完成。
    /// 这类动画没有固定时长，不参与快进。
    pub fn driven(step: impl FnMut(f32) -> bool + 'static) -> Self {
        Self::with_driver(None, Driver::Open(Box::new(step)))
    }

    fn with_driver(duration: Option<f32>, driver: Driver) -> Self {
        Self {
            inner: Rc::new(Inner {
                id: AnimationId::next(),
                state: Cell::new(AnimationState::Active),
                duration,
                elapsed: Cell::new(0.0),
                driver: RefCell::new(driver),
            }),
        }
    }

    /// 动画 ID
    pub fn id(&self) -> AnimationId {
        self.inner.id
    }

    /// 当前状态
    pub fn state(&self) -> AnimationState {
        self.inner.state.get()
    }

    /// 是否为活跃状态
    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    /// 是否已结束
    pub fn is_finished(&self) -> bool {
        self.state().is_finished()
    }

    /// 配置的时长；开放式动画为 `None`
    pub fn duration(&self) -> Option<f32> {
        self.inner.duration
    }

    /// 已经过的时间；开放式动画为 `None`
    pub fn elapsed(&self) -> Option<f32> {
        self.inner.duration.map(|_| self.inner.elapsed.get())
    }

    /// 当前进度（0.0 - 1.0）
    ///
    /// 零时长动画在完成前为 `0`；开放式动画为 `None`。
    pub fn progress(&self) -> Option<f32> {
        let duration = self.inner.duration?;
        Some(if duration > 0.0 {
            (self.inner.elapsed.get() / duration).clamp(0.0, 1.0)
        } else if self.state() == AnimationState::Completed {
            1.0
        } else {
            0.0
        })
    }

    /// 推进动画
    ///
    /// 负数或非有限的 `dt` 按 `0` 处理。
    ///
    /// # 返回
    /// - `true`: 动画在本次推进中完成
    /// - `false`: 仍在进行，或本来就已结束
    pub fn advance(&self, dt: f32) -> bool {
        if !self.is_active() {
            return false;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        let Ok(mut driver) = self.inner.driver.try_borrow_mut() else {
            warn!(id = %self.id(), "动画在自身的补间内被再次推进，已忽略");
            return false;
        };
        let done = match &mut *driver {
            Driver::Timed(tween) => {
                let duration = self.inner.duration.unwrap_or(0.0);
                let elapsed = self.inner.elapsed.get() + dt;
                self.inner.elapsed.set(elapsed);
                let progress = if duration > 0.0 {
                    (elapsed / duration).clamp(0.0, 1.0)
                } else {
                    1.0
                };
                tween.apply(progress);
                progress >= 1.0
            }
            Driver::Open(step) => step(dt),
        };
        drop(driver);

        // 补间执行期间可能取消了自己
        if done && self.is_active() {
            self.inner.state.set(AnimationState::Completed);
            true
        } else {
            false
        }
    }

    /// 取消动画
    ///
    /// 幂等；不会再调用一次补间。
    ///
    /// # 返回
    /// 本次调用是否使状态从 `Active` 变为 `Cancelled`
    pub fn cancel(&self) -> bool {
        if self.is_active() {
            self.inner.state.set(AnimationState::Cancelled);
            true
        } else {
            false
        }
    }

    /// 跳过动画：以进度 `1` 执行一次补间并标记完成
    ///
    /// 开放式动画没有终值，直接标记完成。
    pub fn skip(&self) -> bool {
        if !self.is_active() {
            return false;
        }
        if let Some(duration) = self.inner.duration {
            self.inner.elapsed.set(self.inner.elapsed.get().max(duration));
            if let Ok(mut driver) = self.inner.driver.try_borrow_mut() {
                if let Driver::Timed(tween) = &mut *driver {
                    tween.apply(1.0);
                }
            }
        }
        if self.is_active() {
            self.inner.state.set(AnimationState::Completed);
            true
        } else {
            false
        }
    }

    // ========== 快进能力 ==========

    /// 是否支持快进
    pub fn supports_fast_forward(&self) -> bool {
        self.inner.duration.is_some()
    }

    /// 剩余时长占总时长的比例
    ///
    /// 仅对时长大于零的补间动画有意义，其余情况返回 `None`。
    pub fn percent_remaining(&self) -> Option<f32> {
        let duration = self.inner.duration.filter(|d| *d > 0.0)?;
        Some(1.0 - (self.inner.elapsed.get() / duration).clamp(0.0, 1.0))
    }

    /// 快进：把已经过时间设为 `percent * duration`
    ///
    /// 下一次推进将从该偏移继续。只对活跃的补间动画生效。
    ///
    /// # 返回
    /// 是否实际执行了快进
    pub fn fast_forward(&self, percent: f32) -> bool {
        if !self.is_active() || !percent.is_finite() {
            return false;
        }
        match self.inner.duration {
            Some(duration) => {
                self.inner.elapsed.set(percent.clamp(0.0, 1.0) * duration);
                true
            }
            None => false,
        }
    }

    /// 两个句柄是否指向同一个动画
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Animation {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Animation {}

impl fmt::Debug for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animation")
            .field("id", &self.id())
            .field("state", &self.state())
            .field("duration", &self.duration())
            .field("elapsed", &self.elapsed())
            .finish()
    }
}
