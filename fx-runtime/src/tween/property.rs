//! 位置 / 朝向 / 缩放补间。
//!
//! 缺省端点在构造时读取目标当前值，而不是在播放时读取：
//! 预先拼好的序列会精确反映拼装那一刻的状态。

use std::fmt;

use tracing::warn;

use super::{Tween, check_duration};
use crate::animation::{Animatable, Quat, Target, Vec3};
use crate::effects::defaults;
use crate::error::{Endpoint, TweenError, TweenProperty};

/// 可插值的值
pub trait Interpolate: Copy {
    /// 在 `self` 与 `to` 之间按 `t` 插值
    fn interpolate(self, to: Self, t: f32) -> Self;
}

impl Interpolate for Vec3 {
    fn interpolate(self, to: Self, t: f32) -> Self {
        self.lerp(to, t)
    }
}

impl Interpolate for Quat {
    fn interpolate(self, to: Self, t: f32) -> Self {
        self.slerp(to, t)
    }
}

type Setter<V> = fn(&dyn Animatable, V) -> bool;

/// 属性补间
pub struct PropertyTween<V> {
    target: Target,
    property: TweenProperty,
    from: V,
    to: V,
    duration: f32,
    setter: Setter<V>,
    unsupported: bool,
}

impl<V: Interpolate> PropertyTween<V> {
    /// 起点
    pub fn from(&self) -> V {
        self.from
    }

    /// 终点
    pub fn to(&self) -> V {
        self.to
    }

    /// 作用的属性
    pub fn property(&self) -> TweenProperty {
        self.property
    }
}

impl<V: Interpolate> Tween for PropertyTween<V> {
    fn duration(&self) -> f32 {
        self.duration
    }

    fn apply(&mut self, progress: f32) {
        let value = self.from.interpolate(self.to, progress);
        if !(self.setter)(&*self.target, value) && !self.unsupported {
            self.unsupported = true;
            warn!(property = %self.property, "目标不支持写入该属性，补间不产生效果");
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for PropertyTween<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyTween")
            .field("property", &self.property)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("duration", &self.duration)
            .finish()
    }
}

/// 解析端点：缺省端点取当前值
fn resolve_endpoints<V: Copy>(
    property: TweenProperty,
    current: Option<V>,
    from: Option<V>,
    to: Option<V>,
) -> Result<(V, V), TweenError> {
    let from = from.or(current).ok_or(TweenError::UnresolvedEndpoint {
        property,
        endpoint: Endpoint::From,
    })?;
    let to = to.or(current).ok_or(TweenError::UnresolvedEndpoint {
        property,
        endpoint: Endpoint::To,
    })?;
    Ok((from, to))
}

/// 位置补间
///
/// 未指定时长时按欧氏距离和 [`defaults::MOVE_SPEED`] 推导，
/// 这样连续的移动补间具有一致的视觉速度，外层序列可再整体缩放。
pub fn translate(
    target: &Target,
    from: Option<Vec3>,
    to: Option<Vec3>,
    duration: Option<f32>,
) -> Result<PropertyTween<Vec3>, TweenError> {
    let (from, to) = resolve_endpoints(TweenProperty::Position, target.position(), from, to)?;
    let duration = match duration {
        Some(d) => check_duration(d)?,
        None => from.distance(to) / defaults::MOVE_SPEED,
    };
    Ok(PropertyTween {
        target: target.clone(),
        property: TweenProperty::Position,
        from,
        to,
        duration,
        setter: |t, v| t.set_position(v),
        unsupported: false,
    })
}

/// 以指定速度（单位/秒）移动的位置补间
pub fn translate_with_speed(
    target: &Target,
    from: Option<Vec3>,
    to: Option<Vec3>,
    speed: f32,
) -> Result<PropertyTween<Vec3>, TweenError> {
    if !(speed.is_finite() && speed > 0.0) {
        return Err(TweenError::InvalidSpeed(speed));
    }
    let (from, to) = resolve_endpoints(TweenProperty::Position, target.position(), from, to)?;
    translate(target, Some(from), Some(to), Some(from.distance(to) / speed))
}

/// 朝向补间（球面插值）
pub fn rotate(
    target: &Target,
    from: Option<Quat>,
    to: Option<Quat>,
    duration: Option<f32>,
) -> Result<PropertyTween<Quat>, TweenError> {
    let (from, to) = resolve_endpoints(TweenProperty::Orientation, target.orientation(), from, to)?;
    let duration = check_duration(duration.unwrap_or(defaults::ROTATE_DURATION))?;
    Ok(PropertyTween {
        target: target.clone(),
        property: TweenProperty::Orientation,
        from,
        to,
        duration,
        setter: |t, v| t.set_orientation(v),
        unsupported: false,
    })
}

/// 缩放补间
pub fn scale(
    target: &Target,
    from: Option<Vec3>,
    to: Option<Vec3>,
    duration: Option<f32>,
) -> Result<PropertyTween<Vec3>, TweenError> {
    let (from, to) = resolve_endpoints(TweenProperty::Scale, target.scale(), from, to)?;
    let duration = check_duration(duration.unwrap_or(defaults::SCALE_DURATION))?;
    Ok(PropertyTween {
        target: target.clone(),
        property: TweenProperty::Scale,
        from,
        to,
        duration,
        setter: |t, v| t.set_scale(v),
        unsupported: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimatableNode;
    use std::f32::consts::FRAC_PI_2;
    use std::rc::Rc;

    /// 没有任何可读属性的目标
    struct Opaque;

    impl Animatable for Opaque {}

    fn node_target() -> (AnimatableNode, Target) {
        let node = AnimatableNode::new("n");
        let target: Target = Rc::new(node.clone());
        (node, target)
    }

    #[test]
    fn test_translate_interpolates_target() {
        let (node, target) = node_target();
        let mut tween = translate(
            &target,
            Some(Vec3::zero()),
            Some(Vec3::new(10.0, 0.0, 0.0)),
            Some(2.0),
        )
        .unwrap();

        assert_eq!(tween.duration(), 2.0);
        tween.apply(0.5);
        assert_eq!(node.position(), Some(Vec3::new(5.0, 0.0, 0.0)));
        tween.apply(1.0);
        assert_eq!(node.position(), Some(Vec3::new(10.0, 0.0, 0.0)));
    }

    #[test]
    fn test_missing_from_captured_at_construction() {
        let (node, target) = node_target();
        node.set_position(Vec3::new(1.0, 0.0, 0.0));

        let mut tween = translate(&target, None, Some(Vec3::new(3.0, 0.0, 0.0)), Some(1.0)).unwrap();

        // 构造后目标再移动，不影响已捕获的起点
        node.set_position(Vec3::new(100.0, 0.0, 0.0));
        assert_eq!(tween.from(), Vec3::new(1.0, 0.0, 0.0));

        tween.apply(0.0);
        assert_eq!(node.position(), Some(Vec3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_translate_duration_from_distance() {
        let (_node, target) = node_target();
        let tween = translate(&target, None, Some(Vec3::new(3.0, 4.0, 0.0)), None).unwrap();
        assert!((tween.duration() - 5.0 / defaults::MOVE_SPEED).abs() < 1e-6);

        let fast = translate_with_speed(&target, None, Some(Vec3::new(3.0, 4.0, 0.0)), 10.0).unwrap();
        assert!((fast.duration() - 0.5).abs() < 1e-6);

        assert_eq!(
            translate_with_speed(&target, None, None, 0.0).unwrap_err(),
            TweenError::InvalidSpeed(0.0)
        );
    }

    #[test]
    fn test_unresolvable_endpoint_is_error() {
        let target: Target = Rc::new(Opaque);

        let err = scale(&target, None, Some(Vec3::one()), None).unwrap_err();
        assert_eq!(
            err,
            TweenError::UnresolvedEndpoint {
                property: TweenProperty::Scale,
                endpoint: Endpoint::From,
            }
        );

        let err = rotate(&target, Some(Quat::IDENTITY), None, None).unwrap_err();
        assert!(matches!(
            err,
            TweenError::UnresolvedEndpoint {
                endpoint: Endpoint::To,
                ..
            }
        ));

        // 两端都显式给出时无需读取目标
        assert!(translate(&target, Some(Vec3::zero()), Some(Vec3::one()), Some(1.0)).is_ok());
    }

    #[test]
    fn test_rotate_uses_slerp() {
        let (node, target) = node_target();
        let end = Quat::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), FRAC_PI_2);
        let mut tween = rotate(&target, None, Some(end), None).unwrap();
        assert_eq!(tween.duration(), defaults::ROTATE_DURATION);

        tween.apply(0.5);
        let expected = Quat::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), FRAC_PI_2 / 2.0);
        assert!(node.orientation().unwrap().approx_eq(expected, 1e-5));
    }

    #[test]
    fn test_negative_duration_rejected() {
        let (_node, target) = node_target();
        assert_eq!(
            scale(&target, None, Some(Vec3::zero()), Some(-0.1)).unwrap_err(),
            TweenError::InvalidDuration(-0.1)
        );
    }
}
