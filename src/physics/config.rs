//! 布娃娃物理配置
//!
//! 所有参数扁平化，直接在代码中修改默认值即可。

use once_cell::sync::Lazy;
use std::sync::RwLock;

/// 物理配置（扁平化，不嵌套）
#[derive(Debug, Clone)]
pub struct PhysicsConfig {
    // ========== 重力 ==========
    /// 重力 Y 分量（负数向下），默认 -9.81
    pub gravity_y: f32,

    // ========== 模拟参数 ==========
    /// 物理 FPS，默认 60.0
    pub physics_fps: f32,
    /// 每帧最大子步数，默认 5（超出部分直接丢弃，避免卡顿后连锁追帧）
    pub max_substep_count: u32,

    // ========== 刚体 ==========
    /// 关节刚体（球体）半径，默认 0.08
    pub body_radius: f32,
    /// 刚体密度，默认 1000.0
    pub body_density: f32,
    /// 线性阻尼，默认 0.2
    pub linear_damping: f32,
    /// 角速度阻尼，默认 0.8
    pub angular_damping: f32,
    /// 摩擦系数，默认 0.8
    pub friction: f32,

    // ========== 速度限制 ==========
    /// 最大线速度 (m/s)，默认 50.0
    pub max_linear_velocity: f32,
    /// 最大角速度 (rad/s)，默认 30.0
    pub max_angular_velocity: f32,

    // ========== 地面 ==========
    /// 地面顶面高度，默认 0.0
    pub ground_height: f32,
    /// 地面半边长，默认 500.0
    pub ground_half_extent: f32,
    /// 向下射线最大距离，默认 1000.0
    pub max_ray_distance: f32,

    // ========== 调试 ==========
    /// 是否创建关节约束，默认 true
    pub joints_enabled: bool,
    /// 是否输出调试日志，默认 false
    pub debug_log: bool,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity_y: -9.81,

            physics_fps: 60.0,
            max_substep_count: 5,

            // 球体放在关节原点，半径小于常见骨长的一半
            body_radius: 0.08,
            body_density: 1000.0,
            linear_damping: 0.2,
            angular_damping: 0.8,
            friction: 0.8,

            max_linear_velocity: 50.0,
            max_angular_velocity: 30.0,

            ground_height: 0.0,
            ground_half_extent: 500.0,
            max_ray_distance: 1000.0,

            joints_enabled: true,
            debug_log: false,
        }
    }
}

impl PhysicsConfig {
    /// 修正会让模拟停摆的步进参数
    ///
    /// `physics_fps` 非有限或 <= 0 时取默认值，`max_substep_count` 至少为 1。
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !self.physics_fps.is_finite() || self.physics_fps <= 0.0 {
            log::warn!(
                "[物理配置] physics_fps={} 无效，使用 {}",
                self.physics_fps, defaults.physics_fps
            );
            self.physics_fps = defaults.physics_fps;
        }
        if self.max_substep_count == 0 {
            log::warn!("[物理配置] max_substep_count=0 无效，使用 1");
            self.max_substep_count = 1;
        }
        self
    }
}

/// 全局配置实例
static PHYSICS_CONFIG: Lazy<RwLock<PhysicsConfig>> = Lazy::new(|| {
    RwLock::new(PhysicsConfig::default())
});

/// 获取当前配置（只读）
pub fn get_config() -> PhysicsConfig {
    PHYSICS_CONFIG.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// 手动设置配置（仅影响之后创建的物理世界）
pub fn set_config(config: PhysicsConfig) {
    *PHYSICS_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = config;
}

/// 重置为默认配置
pub fn reset_config() {
    *PHYSICS_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = PhysicsConfig::default();
}
