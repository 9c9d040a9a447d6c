//! # Error 模块
//!
//! 定义 fx-runtime 中使用的错误类型。
//!
//! 所有错误都是局部、可恢复的：调用方决定是记录日志还是上抛，
//! 不会有任何错误中断宿主的 tick 循环。

use std::fmt;

use thiserror::Error;

/// 补间可动画的属性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TweenProperty {
    /// 位置
    Position,
    /// 朝向
    Orientation,
    /// 缩放
    Scale,
}

impl fmt::Display for TweenProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position => write!(f, "position"),
            Self::Orientation => write!(f, "orientation"),
            Self::Scale => write!(f, "scale"),
        }
    }
}

/// 补间端点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// 起点
    From,
    /// 终点
    To,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::From => write!(f, "from"),
            Self::To => write!(f, "to"),
        }
    }
}

/// 补间构造错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TweenError {
    /// 端点既未显式给出，也无法从目标读取当前值
    #[error("{property} 补间的 {endpoint} 端点无法解析：未显式指定且目标没有当前值")]
    UnresolvedEndpoint {
        property: TweenProperty,
        endpoint: Endpoint,
    },

    /// 时长为负数或非有限值
    #[error("无效的补间时长: {0}")]
    InvalidDuration(f32),

    /// 速度不是正的有限值
    #[error("无效的移动速度: {0}")]
    InvalidSpeed(f32),
}

/// 效果执行错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EffectError {
    /// 效果未注册
    #[error("效果 '{name}' 未注册")]
    NotFound { name: String },
}

/// 效果样式解析错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StyleError {
    /// 未知的效果类型
    #[error("效果 '{name}'：未知的效果类型 '{kind}'")]
    UnknownKind { name: String, kind: String },

    /// 缺少必需字段
    #[error("效果 '{name}'：类型 '{kind}' 缺少字段 '{field}'")]
    MissingField {
        name: String,
        kind: String,
        field: &'static str,
    },

    /// 字段值无效
    #[error("效果 '{name}'：字段 '{field}' 的值无效 - {message}")]
    InvalidField {
        name: String,
        field: &'static str,
        message: String,
    },
}

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 读写配置文件失败
    #[error("配置 IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 解析或序列化失败
    #[error("配置 JSON 错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 配置值不合法
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),

    /// 效果样式表中的条目无法解析
    #[error("效果样式错误: {0}")]
    Style(#[from] StyleError),
}

/// fx-runtime 统一错误类型
#[derive(Error, Debug)]
pub enum FxError {
    /// 补间错误
    #[error("补间错误: {0}")]
    Tween(#[from] TweenError),

    /// 效果错误
    #[error("效果错误: {0}")]
    Effect(#[from] EffectError),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// Result 类型别名
pub type FxResult<T> = Result<T, FxError>;
