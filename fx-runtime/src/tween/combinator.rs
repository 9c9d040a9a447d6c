//! 补间组合器：顺序、并行、缓动。

use std::fmt;

use super::Tween;
use crate::animation::EasingFunction;

/// 顺序补间
///
/// 子补间首尾相接。零时长的子补间在播放头到达它时执行，
/// 因此调用补间可以作为屏障。
///
/// 假设进度单调不减：已完成的子补间不会回退。弹性、弹跳这类会越过 `1.0`
/// 的缓动曲线应包裹单个子补间，而不是整个序列。
pub struct Sequence {
    steps: Vec<Box<dyn Tween>>,
    /// 子补间时长之和
    natural: f32,
    /// 对外报告的时长（可整体缩放）
    scaled: Option<f32>,
    /// 当前子补间下标
    cursor: usize,
    /// 当前子补间的起始时刻（自然时间轴）
    cursor_start: f32,
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new()
    }
}

impl Sequence {
    /// 创建空序列
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            natural: 0.0,
            scaled: None,
            cursor: 0,
            cursor_start: 0.0,
        }
    }

    /// 追加一个补间
    pub fn then(mut self, tween: impl Tween + 'static) -> Self {
        self.push(Box::new(tween));
        self
    }

    /// 追加一个已装箱的补间
    pub fn push(&mut self, tween: Box<dyn Tween>) {
        self.natural += tween.duration();
        self.steps.push(tween);
    }

    /// 把总时长等比缩放到 `total` 秒
    ///
    /// 各子补间的相对比例保持不变。
    pub fn with_duration(mut self, total: f32) -> Self {
        self.scaled = Some(total.max(0.0));
        self
    }

    /// 子补间数量
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Tween for Sequence {
    fn duration(&self) -> f32 {
        self.scaled.unwrap_or(self.natural)
    }

    fn apply(&mut self, progress: f32) {
        let progress = progress.clamp(0.0, 1.0);
        let t = progress * self.natural;

        while let Some(step) = self.steps.get_mut(self.cursor) {
            let d = step.duration();
            let end = self.cursor_start + d;

            if t >= end || progress >= 1.0 {
                step.apply(1.0);
                self.cursor += 1;
                self.cursor_start = end;
            } else {
                let local = if d > 0.0 {
                    (t - self.cursor_start) / d
                } else {
                    1.0
                };
                step.apply(local.clamp(0.0, 1.0));
                break;
            }
        }
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("steps", &self.steps.len())
            .field("duration", &self.duration())
            .field("cursor", &self.cursor)
            .finish()
    }
}

/// 并行补间
///
/// 所有子补间同时开始，时长取最长者；较短的子补间先结束，
/// 结束后不再被调用。
#[derive(Default)]
pub struct Parallel {
    steps: Vec<(Box<dyn Tween>, bool)>,
}

impl Parallel {
    /// 创建空的并行组
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入一个补间
    pub fn with(mut self, tween: impl Tween + 'static) -> Self {
        self.steps.push((Box::new(tween), false));
        self
    }

    /// 子补间数量
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Tween for Parallel {
    fn duration(&self) -> f32 {
        self.steps
            .iter()
            .map(|(step, _)| step.duration())
            .fold(0.0, f32::max)
    }

    fn apply(&mut self, progress: f32) {
        let progress = progress.clamp(0.0, 1.0);
        let t = progress * self.duration();

        for (step, finished) in self.steps.iter_mut().filter(|(_, done)| !*done) {
            let d = step.duration();
            let local = if d > 0.0 && progress < 1.0 {
                (t / d).min(1.0)
            } else {
                1.0
            };
            step.apply(local);
            *finished = local >= 1.0;
        }
    }
}

impl fmt::Debug for Parallel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parallel")
            .field("steps", &self.steps.len())
            .field("duration", &self.duration())
            .finish()
    }
}

/// 缓动补间
///
/// 把进度经过缓动曲线后交给内部补间，时长不变。
#[derive(Debug)]
pub struct Eased<T> {
    inner: T,
    easing: EasingFunction,
}

impl<T: Tween> Eased<T> {
    /// 包裹一个补间
    pub fn new(inner: T, easing: EasingFunction) -> Self {
        Self { inner, easing }
    }
}

impl<T: Tween> Tween for Eased<T> {
    fn duration(&self) -> f32 {
        self.inner.duration()
    }

    fn apply(&mut self, progress: f32) {
        let eased = if progress >= 1.0 {
            1.0
        } else {
            self.easing.apply(progress)
        };
        self.inner.apply(eased);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tween::{TweenExt, call, from_fn, wait};
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    fn recorder(log: &Log, name: &'static str, duration: f32) -> impl Tween + 'static {
        let log = log.clone();
        from_fn(duration, move |p| log.borrow_mut().push(format!("{name}:{p}"))).unwrap()
    }

    fn marker(log: &Log, name: &'static str) -> impl Tween + 'static {
        let log = log.clone();
        call(move || log.borrow_mut().push(name.to_string()))
    }

    #[test]
    fn test_sequence_runs_in_order() {
        let log: Log = Rc::default();
        let mut seq = Sequence::new()
            .then(recorder(&log, "a", 1.0))
            .then(marker(&log, "barrier"))
            .then(recorder(&log, "b", 1.0));

        assert_eq!(seq.duration(), 2.0);
        assert_eq!(seq.len(), 3);

        seq.apply(0.25);
        seq.apply(0.75);
        seq.apply(1.0);

        assert_eq!(
            *log.borrow(),
            vec!["a:0.5", "a:1", "barrier", "b:0.5", "b:1"]
        );
    }

    #[test]
    fn test_sequence_leading_call_fires_at_zero() {
        let log: Log = Rc::default();
        let mut seq = Sequence::new()
            .then(marker(&log, "start"))
            .then(recorder(&log, "a", 1.0));

        seq.apply(0.0);
        assert_eq!(*log.borrow(), vec!["start", "a:0"]);
    }

    #[test]
    fn test_sequence_rescale_keeps_proportions() {
        let log: Log = Rc::default();
        let mut seq = Sequence::new()
            .then(recorder(&log, "a", 1.0))
            .then(recorder(&log, "b", 3.0))
            .with_duration(8.0);

        assert_eq!(seq.duration(), 8.0);

        // 25% 处恰好是 a 的结束，b 随即从 0 开始
        seq.apply(0.25);
        seq.apply(0.625);
        assert_eq!(*log.borrow(), vec!["a:1", "b:0", "b:0.5"]);
    }

    #[test]
    fn test_sequence_of_instant_steps() {
        let log: Log = Rc::default();
        let mut seq = Sequence::new()
            .then(marker(&log, "x"))
            .then(marker(&log, "y"));

        assert_eq!(seq.duration(), 0.0);
        seq.apply(1.0);
        assert_eq!(*log.borrow(), vec!["x", "y"]);
    }

    #[test]
    fn test_parallel_duration_is_longest() {
        let log: Log = Rc::default();
        let mut par = Parallel::new()
            .with(recorder(&log, "short", 1.0))
            .with(recorder(&log, "long", 2.0))
            .with(wait(0.5).unwrap());

        assert_eq!(par.duration(), 2.0);

        par.apply(0.5);
        par.apply(0.75);
        par.apply(1.0);

        // short 在 50% 时结束，之后不再被调用
        assert_eq!(
            *log.borrow(),
            vec!["short:1", "long:0.5", "long:0.75", "long:1"]
        );
    }

    #[test]
    fn test_eased_remaps_progress() {
        let log: Log = Rc::default();
        let mut eased = recorder(&log, "e", 1.0).eased(EasingFunction::EaseInQuad);

        assert_eq!(eased.duration(), 1.0);
        eased.apply(0.5);
        eased.apply(1.0);
        assert_eq!(*log.borrow(), vec!["e:0.25", "e:1"]);
    }
}
