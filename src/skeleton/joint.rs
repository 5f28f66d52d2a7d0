//! 关节节点
//!
//! Joint 是骨骼数组的基本单元，以稳定的整数索引标识。
//! 每个关节恰好对应一个物理刚体（索引相同）。

use glam::{Quat, Vec3};

use super::BonePose;

// ============================================================================
// 关节定义（构建输入）
// ============================================================================

/// 关节定义
#[derive(Clone, Debug)]
pub struct JointDef {
    /// 关节名称（骨骼内唯一，动画轨道按名称绑定）
    pub name: String,
    /// 父关节索引，None 表示直接挂在根变换下
    pub parent: Option<usize>,
    /// 初始局部姿势
    pub local: BonePose,
}

impl JointDef {
    /// 挂在根变换下的关节（髋骨）
    pub fn root(name: impl Into<String>, local: BonePose) -> Self {
        Self {
            name: name.into(),
            parent: None,
            local,
        }
    }

    pub fn child(name: impl Into<String>, parent: usize, local: BonePose) -> Self {
        Self {
            name: name.into(),
            parent: Some(parent),
            local,
        }
    }
}

// ============================================================================
// 关节节点
// ============================================================================

/// 关节节点
///
/// - 静态数据：名称、父子关系、初始姿势（初始化后不变）
/// - 动态数据：局部姿势（由动画、混合或物理回读写入）与世界姿势缓存
#[derive(Clone, Debug)]
pub struct Joint {
    // ========================================
    // 静态数据（初始化后不变）
    // ========================================

    pub name: String,

    pub(crate) index: usize,

    pub(crate) parent: Option<usize>,

    /// 初始局部姿势
    pub(crate) rest_pose: BonePose,

    pub(crate) is_leaf: bool,

    // ========================================
    // 动态数据（每帧更新）
    // ========================================

    /// 局部姿势（相对父关节）
    pub(crate) local: BonePose,

    /// 世界姿势缓存（update_world_transforms 后有效）
    pub(crate) world: BonePose,
}

impl Joint {
    pub(crate) fn from_def(index: usize, def: JointDef) -> Self {
        Self {
            name: def.name,
            index,
            parent: def.parent,
            rest_pose: def.local,
            is_leaf: true,
            local: def.local,
            world: def.local,
        }
    }

    // ========================================
    // 访问器
    // ========================================

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn parent_id(&self) -> Option<usize> {
        self.parent
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.is_leaf
    }

    #[inline]
    pub fn rest_pose(&self) -> BonePose {
        self.rest_pose
    }

    #[inline]
    pub fn local_pose(&self) -> BonePose {
        self.local
    }

    #[inline]
    pub fn world_pose(&self) -> BonePose {
        self.world
    }

    /// 世界位置
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.world.position
    }

    /// 世界旋转
    #[inline]
    pub fn rotation(&self) -> Quat {
        self.world.rotation
    }

    /// 世界空间上方向（局部 +Y）
    #[inline]
    pub fn up(&self) -> Vec3 {
        self.world.rotation * Vec3::Y
    }

    /// 世界空间前方向（局部 +Z）
    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.world.rotation * Vec3::Z
    }

    #[inline]
    pub(crate) fn reset_to_rest(&mut self) {
        self.local = self.rest_pose;
    }
}
