//! 布娃娃过渡核心
//!
//! - `engine`: 状态机（Idle → Ragdoll → ResettingBones → StandingUp → Idle）
//! - `pose_set`: 起身姿势 / 静止姿势缓冲区与逐关节混合
//! - `alignment`: 朝向判定、根节点位置与旋转对齐
//! - `impact`: 最近刚体选择与冲量计算
//! - `config`: 过渡参数（全局默认值）

pub mod alignment;
pub mod config;
mod engine;
pub mod impact;
mod pose_set;
mod state;

pub use config::RagdollConfig;
pub use engine::RagdollEngine;
pub use impact::{nearest_body, slap_impulse, Impact};
pub use pose_set::{blend_poses, PoseSet};
pub use state::{EngineState, Facing, FacingAxis, ReimpactPolicy};
