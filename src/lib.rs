//! 布娃娃过渡引擎
//!
//! 角色骨骼在动画驱动与物理布娃娃之间切换，并平滑恢复到动画控制：
//! 受击 → 物理模拟 → 静止检测 → 朝向判定 → 根节点对齐 → 骨骼混合到起身姿势 → 播放起身动画。
//!
//! 模块划分：
//! - `skeleton`: 骨骼数组（固定索引，0 号为髋骨）与根变换
//! - `animation`: 动画播放服务接口及关键帧 Animator 实现
//! - `physics`: 物理查询服务接口及 Rapier 布娃娃实现
//! - `ragdoll`: 状态机与骨骼混合核心

pub mod skeleton;
pub mod animation;
pub mod physics;
pub mod ragdoll;

pub use skeleton::{BonePose, Joint, JointDef, RootTransform, Skeleton, HIP_JOINT};
pub use animation::{AnimationClip, AnimationPlayback, Animator, AnimatorState};
pub use physics::{PhysicsConfig, PhysicsQuery, RapierRagdoll};
pub use ragdoll::{
    EngineState, Facing, FacingAxis, Impact, PoseSet, RagdollConfig, RagdollEngine,
    ReimpactPolicy,
};

use thiserror::Error;

/// 引擎错误（仅在构建阶段返回，Tick / ApplyImpact 不会失败）
#[derive(Debug, Error)]
pub enum RagdollError {
    #[error("skeleton has no joints")]
    EmptySkeleton,

    #[error("joint {joint} has invalid parent index {parent}")]
    InvalidJointParent { joint: usize, parent: usize },

    #[error("duplicate joint name: {0}")]
    DuplicateJoint(String),

    #[error("animation clip not found: {0}")]
    MissingClip(String),

    #[error("animation state not found: {0}")]
    MissingState(String),

    #[error("skeleton has {joints} joints but physics provides {bodies} bodies")]
    BodyCountMismatch { joints: usize, bodies: usize },

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, RagdollError>;
