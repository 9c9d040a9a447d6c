//! # Traits 模块
//!
//! 补间作用对象的接口定义。
//!
//! ## 核心概念
//!
//! - `Animatable`: 可动画对象接口（位置/朝向/缩放的 getter/setter + 按名调用方法）
//! - `Target`: 共享的可动画对象句柄
//! - `MethodArg`: 按名调用时的单个参数

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::transform::{Quat, Vec3};

/// 共享的可动画对象
///
/// 补间在构造时捕获它，在播放时写回属性；同一对象可被多个补间同时持有。
pub type Target = Rc<dyn Animatable>;

/// 按名调用方法时的参数
///
/// 在 JSON 中按形状区分：数字、三元数组或字符串。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MethodArg {
    /// 数值参数
    Number(f32),
    /// 向量参数
    Vector(Vec3),
    /// 文本参数（例如父节点名）
    Text(String),
}

impl MethodArg {
    /// 以文本形式读取
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// 可动画对象接口
///
/// 所有方法都有"不支持"的默认实现：getter 返回 `None`，setter 与 `invoke`
/// 返回 `false`。对象只需实现自己真正拥有的属性。
///
/// 方法接收 `&self`，实现方通过 `RefCell` 等内部可变性写入，
/// 这样多个补间可以同时持有并驱动同一个对象。
///
/// ## 实现示例
///
/// ```rust,ignore
/// struct Camera {
///     position: RefCell<Vec3>,
/// }
///
/// impl Animatable for Camera {
///     fn position(&self) -> Option<Vec3> {
///         Some(*self.position.borrow())
///     }
///
///     fn set_position(&self, value: Vec3) -> bool {
///         *self.position.borrow_mut() = value;
///         true
///     }
/// }
/// ```
pub trait Animatable: 'static {
    /// 当前位置
    fn position(&self) -> Option<Vec3> {
        None
    }

    /// 写入位置
    fn set_position(&self, _value: Vec3) -> bool {
        false
    }

    /// 当前朝向
    fn orientation(&self) -> Option<Quat> {
        None
    }

    /// 写入朝向
    fn set_orientation(&self, _value: Quat) -> bool {
        false
    }

    /// 当前缩放
    fn scale(&self) -> Option<Vec3> {
        None
    }

    /// 写入缩放
    fn set_scale(&self, _value: Vec3) -> bool {
        false
    }

    /// 按名调用零参或单参方法
    ///
    /// # 返回
    /// - `true`: 方法存在且已执行
    /// - `false`: 方法不存在或参数不匹配
    fn invoke(&self, _method: &str, _arg: Option<&MethodArg>) -> bool {
        false
    }

    /// 可按名调用的方法列表
    ///
    /// 用于调试和验证。
    fn method_list(&self) -> &'static [&'static str] {
        &[]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct PositionOnly {
        position: RefCell<Vec3>,
    }

    impl Animatable for PositionOnly {
        fn position(&self) -> Option<Vec3> {
            Some(*self.position.borrow())
        }

        fn set_position(&self, value: Vec3) -> bool {
            *self.position.borrow_mut() = value;
            true
        }
    }

    #[test]
    fn test_defaults_report_unsupported() {
        let obj = PositionOnly {
            position: RefCell::new(Vec3::zero()),
        };

        assert_eq!(obj.orientation(), None);
        assert_eq!(obj.scale(), None);
        assert!(!obj.set_scale(Vec3::one()));
        assert!(!obj.invoke("detach", None));
        assert!(obj.method_list().is_empty());

        assert!(obj.set_position(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(obj.position(), Some(Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_method_arg_untagged() {
        let n: MethodArg = serde_json::from_str("2.5").unwrap();
        assert_eq!(n, MethodArg::Number(2.5));

        let v: MethodArg = serde_json::from_str("[1, 2, 3]").unwrap();
        assert_eq!(v, MethodArg::Vector(Vec3::new(1.0, 2.0, 3.0)));

        let t: MethodArg = serde_json::from_str("\"root\"").unwrap();
        assert_eq!(t.as_text(), Some("root"));
    }
}
