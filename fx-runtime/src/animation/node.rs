//! # Node 模块
//!
//! 可动画的场景节点实现，使用 `Animatable` trait。
//!
//! ## 设计说明
//!
//! `AnimatableNode` 使用 `Rc<RefCell<T>>` 实现内部可变性，
//! 克隆得到的句柄共享同一份数据，补间与宿主看到的是同一个节点。

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::traits::{Animatable, MethodArg};
use super::transform::{Quat, Vec3};

/// 场景节点的内部数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    /// 节点名（标识符）
    pub name: String,
    /// 位置
    #[serde(default)]
    pub position: Vec3,
    /// 朝向
    #[serde(default)]
    pub orientation: Quat,
    /// 缩放
    #[serde(default = "Vec3::one")]
    pub scale: Vec3,
    /// 父节点名（`None` 表示已脱离场景树）
    #[serde(default)]
    pub parent: Option<String>,
    /// 是否可见
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl NodeData {
    /// 创建位于原点的节点数据
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: Vec3::zero(),
            orientation: Quat::IDENTITY,
            scale: Vec3::one(),
            parent: None,
            visible: true,
        }
    }
}

/// 可动画场景节点
///
/// ## 可按名调用的方法
///
/// - `"detach"`: 从父节点脱离
/// - `"attach"`: 挂到父节点下，参数为父节点名（文本）
/// - `"show"` / `"hide"`: 切换可见性
///
/// ## 使用示例
///
/// ```rust,ignore
/// let node = AnimatableNode::new("panel");
/// let target: Target = Rc::new(node.clone());
///
/// let tween = tween::scale(&target, Some(Vec3::zero()), None, Some(0.2))?;
/// scheduler.add(&Animation::new(tween));
/// ```
#[derive(Debug, Clone)]
pub struct AnimatableNode {
    data: Rc<RefCell<NodeData>>,
}

impl AnimatableNode {
    /// 支持按名调用的方法
    pub const METHODS: &'static [&'static str] = &["detach", "attach", "show", "hide"];

    /// 创建新的节点
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_data(NodeData::new(name))
    }

    /// 从现有数据创建
    pub fn from_data(data: NodeData) -> Self {
        Self {
            data: Rc::new(RefCell::new(data)),
        }
    }

    /// 节点名
    pub fn name(&self) -> String {
        self.data.borrow().name.clone()
    }

    /// 父节点名
    pub fn parent(&self) -> Option<String> {
        self.data.borrow().parent.clone()
    }

    /// 是否可见
    pub fn is_visible(&self) -> bool {
        self.data.borrow().visible
    }

    /// 获取完整数据副本
    pub fn snapshot(&self) -> NodeData {
        self.data.borrow().clone()
    }
}

impl Animatable for AnimatableNode {
    fn position(&self) -> Option<Vec3> {
        Some(self.data.borrow().position)
    }

    fn set_position(&self, value: Vec3) -> bool {
        self.data.borrow_mut().position = value;
        true
    }

    fn orientation(&self) -> Option<Quat> {
        Some(self.data.borrow().orientation)
    }

    fn set_orientation(&self, value: Quat) -> bool {
        self.data.borrow_mut().orientation = value;
        true
    }

    fn scale(&self) -> Option<Vec3> {
        Some(self.data.borrow().scale)
    }

    fn set_scale(&self, value: Vec3) -> bool {
        self.data.borrow_mut().scale = value;
        true
    }

    fn invoke(&self, method: &str, arg: Option<&MethodArg>) -> bool {
        let mut data = self.data.borrow_mut();
        match (method, arg) {
            ("detach", None) => {
                data.parent = None;
                true
            }
            ("attach", Some(MethodArg::Text(parent))) => {
                data.parent = Some(parent.clone());
                true
            }
            ("show", None) => {
                data.visible = true;
                true
            }
            ("hide", None) => {
                data.visible = false;
                true
            }
            _ => false,
        }
    }

    fn method_list(&self) -> &'static [&'static str] {
        Self::METHODS
    }
}
