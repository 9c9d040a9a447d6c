//! # Effect Resolver
//!
//! 将样式表条目 [`EffectDef`] 解析为 [`ResolvedEffect`]。
//!
//! 这是 EffectDef → ResolvedEffect 的**唯一转换入口**。
//! 所有效果参数的提取、校验、默认值填充都在这里完成。

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::effect::{Effect, EffectInvocation};
use super::registry::{EffectKind, defaults};
use crate::animation::{Animation, EasingFunction, MethodArg, Quat, Target, Vec3};
use crate::error::{Endpoint, StyleError, TweenError, TweenProperty};
use crate::tween::{self, Sequence, TweenExt};

/// 样式表中的效果定义
///
/// ```json
/// { "kind": "move_by", "channel": "move", "offset": [2, 0, 0], "easing": "ease_out_cubic" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectDef {
    /// 效果类型（大小写不敏感）
    pub kind: String,
    /// 替换通道，缺省为不跟踪
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// 时长（秒），缺省使用类型默认值
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f32>,
    /// 缓动曲线
    #[serde(default)]
    pub easing: EasingFunction,
    /// 目标值（move_to / scale_to / open）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Vec3>,
    /// 起始值（close 接替其他动画时的展开缩放）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Vec3>,
    /// 位移（move_by）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<Vec3>,
    /// 旋转轴（rotate_to）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis: Option<Vec3>,
    /// 旋转角度，单位为度（rotate_to）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f32>,
    /// 移动速度（move_to / move_by），缺省使用引擎配置
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    /// 方法名（call）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// 方法参数（call）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arg: Option<MethodArg>,
}

impl EffectDef {
    /// 创建指定类型的定义
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// 设置通道
    pub fn on_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }
}

/// 解析后的效果
///
/// 包含效果类型、通道、时长、缓动函数等所有执行所需参数，
/// 并实现 [`Effect`]，可直接注册到 `EffectControl`。
///
/// ## 时长处理
///
/// `duration` 字段存储样式表中**显式指定**的时长。
/// 未指定时，移动效果按距离和 `speed` 推导，其余效果使用
/// [`defaults`] 中的类型默认值。
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEffect {
    /// 效果类型
    pub kind: EffectKind,
    /// 替换通道
    pub channel: Option<String>,
    /// 显式指定的时长（秒）
    pub duration: Option<f32>,
    /// 移动速度（单位/秒）
    pub speed: f32,
    /// 缓动函数
    pub easing: EasingFunction,
}

impl ResolvedEffect {
    /// 获取时长，未指定时使用提供的默认值
    pub fn duration_or(&self, default: f32) -> f32 {
        self.duration.unwrap_or(default)
    }

    fn build(
        &self,
        target: &Target,
        existing: Option<&EffectInvocation>,
    ) -> Result<Option<Animation>, TweenError> {
        let easing = self.easing;
        let animation = match &self.kind {
            EffectKind::None => return Ok(None),

            EffectKind::MoveTo { to } => self.movement(target, *to)?,

            EffectKind::MoveBy { offset } => {
                let from = target.position().ok_or(TweenError::UnresolvedEndpoint {
                    property: TweenProperty::Position,
                    endpoint: Endpoint::From,
                })?;
                self.movement(target, from + *offset)?
            }

            EffectKind::ScaleTo { to } => {
                let duration = self.duration_or(defaults::SCALE_DURATION);
                Animation::new(tween::scale(target, None, Some(*to), Some(duration))?.eased(easing))
            }

            EffectKind::Open { to } => {
                // 同一实例重新运行时不会快进，只能从当前缩放继续
                let from = if self.is_rerun_of(existing) {
                    None
                } else {
                    Some(Vec3::zero())
                };
                let duration = self.duration_or(defaults::OPEN_DURATION);
                let grow = tween::scale(target, from, Some(*to), Some(duration))?;
                Animation::new(
                    Sequence::new()
                        .then(tween::invoke(target, "show", None))
                        .then(grow.eased(easing)),
                )
            }

            EffectKind::Close { from } => {
                // 接替其他动画时端点固定，快进负责对齐当前缩放
                let from = if self.hands_off(existing) {
                    Some(*from)
                } else {
                    None
                };
                let duration = self.duration_or(defaults::CLOSE_DURATION);
                let shrink = tween::scale(target, from, Some(Vec3::zero()), Some(duration))?;
                Animation::new(
                    Sequence::new()
                        .then(shrink.eased(easing))
                        .then(tween::invoke(target, "hide", None)),
                )
            }

            EffectKind::RotateTo { to } => {
                let duration = self.duration_or(defaults::ROTATE_DURATION);
                Animation::new(tween::rotate(target, None, Some(*to), Some(duration))?.eased(easing))
            }

            EffectKind::Call { method, arg } => {
                Animation::new(tween::invoke(target, method.clone(), arg.clone()))
            }
        };
        Ok(Some(animation))
    }

    /// 上一个调用来自同一效果实例且仍在播放
    fn is_rerun_of(&self, existing: Option<&EffectInvocation>) -> bool {
        existing.is_some_and(|previous| {
            previous.is_active() && std::ptr::addr_eq(Rc::as_ptr(&previous.effect), self as *const Self)
        })
    }

    /// 接替另一个效果仍在播放的动画，此时会被快进
    fn hands_off(&self, existing: Option<&EffectInvocation>) -> bool {
        existing.is_some_and(|previous| previous.is_active()) && !self.is_rerun_of(existing)
    }

    fn movement(&self, target: &Target, to: Vec3) -> Result<Animation, TweenError> {
        let tween = match self.duration {
            Some(duration) => tween::translate(target, None, Some(to), Some(duration))?,
            None => tween::translate_with_speed(target, None, Some(to), self.speed)?,
        };
        Ok(Animation::new(tween.eased(self.easing)))
    }
}

impl Effect for ResolvedEffect {
    fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    fn create(&self, target: &Target, existing: Option<&EffectInvocation>) -> Option<Animation> {
        match self.build(target, existing) {
            Ok(animation) => animation,
            Err(e) => {
                warn!(kind = self.kind.name(), error = %e, "效果无法作用于目标，跳过");
                None
            }
        }
    }
}

/// 将 `EffectDef` 解析为 `ResolvedEffect`
///
/// 这是效果解析的**唯一入口**。`name` 仅用于错误信息；
/// `move_speed` 是未在条目中指定 `speed` 时使用的移动速度。
///
/// ## 类型名称映射（大小写不敏感）
///
/// | 类型名 | 必需字段 | 可选字段 |
/// |--------|----------|----------|
/// | `none` | - | - |
/// | `move_to` | `to` | `speed` / `duration` |
/// | `move_by` | `offset` | `speed` / `duration` |
/// | `scale_to` | `to` | `duration` |
/// | `open` | - | `to`（默认 `[1, 1, 1]`）/ `duration` |
/// | `close` | - | `from`（默认 `[1, 1, 1]`）/ `duration` |
/// | `rotate_to` | `axis`, `angle` | `duration` |
/// | `call` | `method` | `arg` |
///
/// 所有类型都接受 `channel` 与 `easing`。未知类型名是错误。
pub fn resolve(name: &str, def: &EffectDef, move_speed: f32) -> Result<ResolvedEffect, StyleError> {
    let kind_name = def.kind.trim().to_lowercase();

    let missing = |field: &'static str| StyleError::MissingField {
        name: name.to_string(),
        kind: kind_name.clone(),
        field,
    };
    let invalid = |field: &'static str, message: String| StyleError::InvalidField {
        name: name.to_string(),
        field,
        message,
    };

    if let Some(duration) = def.duration {
        if !(duration.is_finite() && duration >= 0.0) {
            return Err(invalid("duration", format!("时长必须是非负数，实际为 {duration}")));
        }
    }
    let speed = def.speed.unwrap_or(move_speed);
    if !(speed.is_finite() && speed > 0.0) {
        return Err(invalid("speed", format!("速度必须是正数，实际为 {speed}")));
    }

    let kind = match kind_name.as_str() {
        "none" => EffectKind::None,
        "move_to" => EffectKind::MoveTo {
            to: def.to.ok_or_else(|| missing("to"))?,
        },
        "move_by" => EffectKind::MoveBy {
            offset: def.offset.ok_or_else(|| missing("offset"))?,
        },
        "scale_to" => EffectKind::ScaleTo {
            to: def.to.ok_or_else(|| missing("to"))?,
        },
        "open" => EffectKind::Open {
            to: def.to.unwrap_or(Vec3::one()),
        },
        "close" => EffectKind::Close {
            from: def.from.unwrap_or(Vec3::one()),
        },
        "rotate_to" => {
            let axis = def.axis.ok_or_else(|| missing("axis"))?;
            let angle = def.angle.ok_or_else(|| missing("angle"))?;
            if axis.length() <= f32::EPSILON {
                return Err(invalid("axis", "旋转轴不能为零向量".to_string()));
            }
            EffectKind::RotateTo {
                to: Quat::from_axis_angle(axis, angle.to_radians()),
            }
        }
        "call" => EffectKind::Call {
            method: def.method.clone().ok_or_else(|| missing("method"))?,
            arg: def.arg.clone(),
        },
        _ => {
            return Err(StyleError::UnknownKind {
                name: name.to_string(),
                kind: def.kind.clone(),
            });
        }
    };

    Ok(ResolvedEffect {
        kind,
        channel: def.channel.clone(),
        duration: def.duration,
        speed,
        easing: def.easing,
    })
}
