//! 物理系统
//!
//! - PhysicsQuery: 引擎消费的物理查询服务接口（按关节索引寻址刚体）
//! - RapierRagdoll: 基于 rapier3d 的实现

pub mod config;
mod rapier_ragdoll;

pub use config::PhysicsConfig;
pub use rapier_ragdoll::{RapierRagdoll, RAGDOLL_GROUP};

use glam::{Quat, Vec3};

/// 物理查询服务
///
/// 刚体由物理侧持有，引擎只按关节索引读写；调用方保证索引小于 `body_count()`。
pub trait PhysicsQuery {
    /// 刚体数量（必须等于骨骼关节数）
    fn body_count(&self) -> usize;

    /// 刚体世界位置
    fn body_position(&self, joint: usize) -> Vec3;

    /// 刚体世界旋转
    fn body_rotation(&self, joint: usize) -> Quat;

    /// 刚体线速度
    fn body_linear_velocity(&self, joint: usize) -> Vec3;

    /// 切换模拟（true）/ 运动学（false）
    fn set_simulated(&mut self, joint: usize, simulated: bool);

    /// 移动运动学刚体到给定世界姿势（模拟中的刚体忽略）
    fn set_body_pose(&mut self, joint: usize, position: Vec3, rotation: Quat);

    /// 在世界坐标 `at_point` 处施加瞬时冲量
    fn apply_impulse(&mut self, joint: usize, force: Vec3, at_point: Vec3);

    /// 从 `origin` 竖直向下投射射线，返回命中点
    fn raycast_down(&self, origin: Vec3) -> Option<Vec3>;
}
