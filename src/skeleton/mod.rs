//! 骨骼系统
//!
//! 核心设计思想：
//! - Joint: 单个关节节点，按固定整数索引存放在数组中
//! - Skeleton: 关节数组（父节点总在子节点之前）+ 角色根变换
//! - 0 号关节固定为髋骨（HIP_JOINT），其父节点为根变换

mod joint;
mod joint_set;

pub use joint::{Joint, JointDef};
pub use joint_set::Skeleton;

use glam::{Quat, Vec3};

/// 髋骨索引（骨骼数组的第一个关节）
pub const HIP_JOINT: usize = 0;

// ============================================================================
// 公共类型定义
// ============================================================================

/// 单个关节的姿势（相对父节点的平移 + 旋转）
///
/// 同一类型也用于世界空间姿势，此时父节点视为世界原点。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BonePose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for BonePose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl BonePose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    #[inline]
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    #[inline]
    pub fn from_position(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }

    /// 组合变换：self 为父节点世界姿势，child 为子节点局部姿势
    #[inline]
    pub fn mul_pose(&self, child: &BonePose) -> BonePose {
        BonePose {
            position: self.position + self.rotation * child.position,
            rotation: (self.rotation * child.rotation).normalize(),
        }
    }

    #[inline]
    pub fn inverse(&self) -> BonePose {
        let rotation = self.rotation.inverse();
        BonePose {
            position: rotation * -self.position,
            rotation,
        }
    }

    /// 位置线性插值，旋转球面插值
    ///
    /// `t <= 0` 与 `t >= 1` 时直接返回端点，保证首尾精确。
    pub fn interpolate(&self, target: &BonePose, t: f32) -> BonePose {
        if t <= 0.0 {
            return *self;
        }
        if t >= 1.0 {
            return *target;
        }
        BonePose {
            position: self.position.lerp(target.position, t),
            rotation: self.rotation.slerp(target.rotation, t),
        }
    }

    pub fn abs_diff_eq(&self, other: &BonePose, max_abs_diff: f32) -> bool {
        self.position.abs_diff_eq(other.position, max_abs_diff)
            && same_rotation(self.rotation, other.rotation, max_abs_diff)
    }
}

/// 比较两个四元数是否表示同一旋转（q 与 -q 等价）
#[inline]
pub fn same_rotation(a: Quat, b: Quat, max_abs_diff: f32) -> bool {
    a.abs_diff_eq(b, max_abs_diff) || a.abs_diff_eq(-b, max_abs_diff)
}

// ============================================================================
// 根变换
// ============================================================================

/// 角色实体的根变换（髋骨的父节点）
///
/// 约定：+Y 为上，+Z 为前。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootTransform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for RootTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl RootTransform {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    #[inline]
    pub fn as_pose(&self) -> BonePose {
        BonePose::new(self.position, self.rotation)
    }

    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    #[inline]
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }
}
