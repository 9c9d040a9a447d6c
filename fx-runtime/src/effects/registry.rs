//! # Effect Registry
//!
//! 内置效果类型定义与默认参数。
//! 这是所有内置效果名称、默认值的**唯一来源**。

use crate::animation::{MethodArg, Quat, Vec3};

/// 内置效果类型
///
/// 标识一个效果的行为及其关联参数。
/// 由 [`resolve`](super::resolve) 从样式表条目 [`EffectDef`](super::EffectDef) 解析得到。
///
/// ## 语义说明
///
/// - `None`：空效果，不调度动画，但会清空所在通道
/// - `MoveTo` / `MoveBy`：位置移动，未指定时长时按速度推导
/// - `ScaleTo`：缩放到指定值
/// - `Open`：先显示，再从零缩放到目标值
/// - `Close`：从展开缩放收缩到零后隐藏
///
/// `Open` / `Close` 接替同通道上另一个仍在播放的动画时使用固定端点，
/// 由快进把播放头放到与当前缩放对应的位置；否则从目标当前缩放开始。
/// - `RotateTo`：沿最短弧旋转到指定朝向
/// - `Call`：按名调用目标方法（零时长）
#[derive(Debug, Clone, PartialEq)]
pub enum EffectKind {
    /// 空效果
    None,
    /// 移动到绝对位置
    MoveTo {
        /// 目标位置
        to: Vec3,
    },
    /// 相对当前位置移动
    MoveBy {
        /// 位移
        offset: Vec3,
    },
    /// 缩放到指定值
    ScaleTo {
        /// 目标缩放
        to: Vec3,
    },
    /// 展开
    Open {
        /// 展开后的缩放
        to: Vec3,
    },
    /// 收起
    Close {
        /// 展开时的缩放
        from: Vec3,
    },
    /// 旋转到指定朝向
    RotateTo {
        /// 目标朝向
        to: Quat,
    },
    /// 调用目标方法
    Call {
        /// 方法名
        method: String,
        /// 参数
        arg: Option<MethodArg>,
    },
}

impl EffectKind {
    /// 类型名
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::MoveTo { .. } => "move_to",
            Self::MoveBy { .. } => "move_by",
            Self::ScaleTo { .. } => "scale_to",
            Self::Open { .. } => "open",
            Self::Close { .. } => "close",
            Self::RotateTo { .. } => "rotate_to",
            Self::Call { .. } => "call",
        }
    }
}

/// 各效果的默认参数
///
/// 这些常量是效果参数的**唯一来源**，任何需要默认值的地方
/// 都应使用这些常量，而非硬编码数字。
pub mod defaults {
    /// 移动速度（单位/秒），用于推导未指定时长的移动补间
    pub const MOVE_SPEED: f32 = 1.0;
    /// 旋转默认时长
    pub const ROTATE_DURATION: f32 = 0.3;
    /// 缩放默认时长
    pub const SCALE_DURATION: f32 = 0.3;
    /// Open（展开）默认时长
    pub const OPEN_DURATION: f32 = 0.25;
    /// Close（收起）默认时长
    pub const CLOSE_DURATION: f32 = 0.2;
}
