//! 动画系统
//!
//! - AnimationPlayback: 引擎消费的动画播放服务接口
//! - Animator: 基于关键帧片段与命名状态的实现

mod animator;
mod clip;
mod keyframe;
mod motion_track;

pub use animator::{Animator, AnimatorState};
pub use clip::{AnimationClip, DEFAULT_CLIP_FPS};
pub use keyframe::JointKeyframe;
pub use motion_track::JointMotionTrack;

use crate::skeleton::Skeleton;

/// 动画播放服务
///
/// 引擎通过它启停动画、采样起身片段以及播放起身状态。
/// 实现者不得持有或修改引擎的姿势缓冲区，只通过传入的骨骼写姿势。
pub trait AnimationPlayback {
    /// 启用/禁用动画驱动
    fn set_enabled(&mut self, enabled: bool);

    fn is_enabled(&self) -> bool;

    fn has_clip(&self, clip: &str) -> bool;

    fn has_state(&self, state: &str) -> bool;

    /// 把片段在 `time` 秒处的姿势写入骨骼局部姿势
    ///
    /// 片段不存在时返回 false，骨骼保持不变。
    fn sample_clip(&mut self, clip: &str, time: f32, skeleton: &mut Skeleton) -> bool;

    /// 从 0 时刻播放指定状态
    fn play_state(&mut self, state: &str);

    /// 当前播放的状态是否为 `state`
    fn is_current_state(&self, state: &str) -> bool;

    /// 推进播放并把结果写入骨骼（禁用时不做任何事）
    fn advance(&mut self, dt: f32, skeleton: &mut Skeleton);
}
