//! # Config 模块
//!
//! 引擎配置与效果样式表。
//!
//! ## 配置文件示例
//!
//! ```json
//! {
//!   "move_speed": 4.0,
//!   "fast_forward": true,
//!   "effects": {
//!     "open":  { "kind": "open",  "channel": "visibility", "easing": "ease_out_cubic" },
//!     "close": { "kind": "close", "channel": "visibility" },
//!     "nudge": { "kind": "move_by", "offset": [0.5, 0, 0] }
//!   }
//! }
//! ```
//!
//! 所有字段都有默认值，空对象 `{}` 是合法配置。

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::effects::{EffectDef, EffectRef, defaults, resolve};
use crate::error::ConfigError;

/// 引擎配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 移动效果未指定时长与速度时使用的速度（单位/秒）
    #[serde(default = "default_move_speed")]
    pub move_speed: f32,

    /// `EffectControl::run` 默认是否快进
    #[serde(default = "default_fast_forward")]
    pub fast_forward: bool,

    /// 调度器时间缩放
    #[serde(default = "default_time_scale")]
    pub time_scale: f32,

    /// 效果样式表（效果名 → 定义）
    #[serde(default)]
    pub effects: BTreeMap<String, EffectDef>,
}

fn default_move_speed() -> f32 {
    defaults::MOVE_SPEED
}

fn default_fast_forward() -> bool {
    true
}

fn default_time_scale() -> f32 {
    1.0
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            move_speed: default_move_speed(),
            fast_forward: default_fast_forward(),
            time_scale: default_time_scale(),
            effects: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// 从 JSON 文本解析并验证
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载配置
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config = Self::from_json_str(&content)?;
        info!(path = %path.display(), effects = config.effects.len(), "配置文件加载成功");
        Ok(config)
    }

    /// 从文件加载配置，失败时使用默认配置
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = %path.display(), "配置文件不存在，使用默认配置");
            return Self::default();
        }

        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "配置文件加载失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// 验证配置有效性
    ///
    /// 检查数值范围，并确认样式表中的每个条目都能解析。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.move_speed.is_finite() && self.move_speed > 0.0) {
            return Err(ConfigError::ValidationFailed(format!(
                "move_speed 必须是正数，实际为 {}",
                self.move_speed
            )));
        }

        if !(self.time_scale.is_finite() && self.time_scale >= 0.0) {
            return Err(ConfigError::ValidationFailed(format!(
                "time_scale 必须是非负数，实际为 {}",
                self.time_scale
            )));
        }

        self.build_effects()?;
        Ok(())
    }

    /// 解析样式表中的所有效果
    pub fn build_effects(&self) -> Result<Vec<(String, EffectRef)>, ConfigError> {
        let mut effects = Vec::with_capacity(self.effects.len());
        for (name, def) in &self.effects {
            let effect: EffectRef = Rc::new(resolve(name, def, self.move_speed)?);
            effects.push((name.clone(), effect));
        }
        Ok(effects)
    }
}
