//! 布娃娃过渡配置
//!
//! 所有参数扁平化；引擎构建时复制一份，之后修改全局配置不影响已运行的引擎。

use once_cell::sync::Lazy;
use std::sync::RwLock;

use crate::{RagdollError, Result};
use super::state::{FacingAxis, ReimpactPolicy};

/// 布娃娃过渡配置（扁平化，不嵌套）
#[derive(Debug, Clone)]
pub struct RagdollConfig {
    // ========== 静止检测 ==========
    /// 受击后开始检测速度的等待时间，也是低速需持续的时间（秒），默认 1.0
    pub time_to_wake_up: f32,
    /// 髋骨线速度平方阈值，默认 0.01
    pub stand_up_velocity: f32,

    // ========== 骨骼混合 ==========
    /// 从静止姿势混合到起身姿势的时长（秒），默认 0.5
    pub time_to_reset_bones: f32,

    // ========== 动画名称 ==========
    /// 仰面起身片段，默认 "Stand Up Face Up"
    pub face_up_clip: String,
    /// 俯卧起身片段，默认 "Stand Up Face Down"
    pub face_down_clip: String,
    /// 仰面起身动画状态，默认 "Stand Up Face Up"
    pub face_up_state: String,
    /// 俯卧起身动画状态，默认 "Stand Up Face Down"
    pub face_down_state: String,

    // ========== 行为 ==========
    /// 朝向判定轴，默认 Up
    pub facing_axis: FacingAxis,
    /// 起身过程中再次受击，默认 Restart
    pub reimpact_policy: ReimpactPolicy,

    // ========== 调试 ==========
    /// 状态切换以 info 级别输出，默认 false（debug 级别）
    pub debug_log: bool,
}

impl Default for RagdollConfig {
    fn default() -> Self {
        Self {
            time_to_wake_up: 1.0,
            stand_up_velocity: 0.01,

            time_to_reset_bones: 0.5,

            face_up_clip: "Stand Up Face Up".to_string(),
            face_down_clip: "Stand Up Face Down".to_string(),
            face_up_state: "Stand Up Face Up".to_string(),
            face_down_state: "Stand Up Face Down".to_string(),

            facing_axis: FacingAxis::Up,
            reimpact_policy: ReimpactPolicy::Restart,

            debug_log: false,
        }
    }
}

impl RagdollConfig {
    /// 检查配置，任何不一致都会让引擎拒绝启动
    pub fn validate(&self) -> Result<()> {
        if !self.time_to_wake_up.is_finite() || self.time_to_wake_up < 0.0 {
            return Err(RagdollError::InvalidConfig(format!(
                "time_to_wake_up must be finite and >= 0, got {}",
                self.time_to_wake_up
            )));
        }
        if !self.stand_up_velocity.is_finite() || self.stand_up_velocity < 0.0 {
            return Err(RagdollError::InvalidConfig(format!(
                "stand_up_velocity must be finite and >= 0, got {}",
                self.stand_up_velocity
            )));
        }
        if !self.time_to_reset_bones.is_finite() || self.time_to_reset_bones <= 0.0 {
            return Err(RagdollError::InvalidConfig(format!(
                "time_to_reset_bones must be finite and > 0, got {}",
                self.time_to_reset_bones
            )));
        }

        let names = [
            ("face_up_clip", &self.face_up_clip),
            ("face_down_clip", &self.face_down_clip),
            ("face_up_state", &self.face_up_state),
            ("face_down_state", &self.face_down_state),
        ];
        for (field, value) in names {
            if value.trim().is_empty() {
                return Err(RagdollError::InvalidConfig(format!("{} is empty", field)));
            }
        }
        Ok(())
    }

    /// 按朝向选择起身片段
    pub fn clip_for(&self, face_up: bool) -> &str {
        if face_up {
            &self.face_up_clip
        } else {
            &self.face_down_clip
        }
    }

    /// 按朝向选择起身动画状态
    pub fn state_for(&self, face_up: bool) -> &str {
        if face_up {
            &self.face_up_state
        } else {
            &self.face_down_state
        }
    }
}

/// 全局配置实例
static RAGDOLL_CONFIG: Lazy<RwLock<RagdollConfig>> = Lazy::new(|| {
    RwLock::new(RagdollConfig::default())
});

/// 获取当前配置（只读）
pub fn get_config() -> RagdollConfig {
    RAGDOLL_CONFIG.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// 手动设置配置（仅影响之后创建的引擎）
pub fn set_config(config: RagdollConfig) {
    *RAGDOLL_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = config;
}

/// 重置为默认配置
pub fn reset_config() {
    *RAGDOLL_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = RagdollConfig::default();
}
