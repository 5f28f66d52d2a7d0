//! 动画片段
//!
//! 片段由若干按关节名称索引的轨道组成，采样时按名称绑定到骨骼。

use std::collections::HashMap;

use crate::skeleton::{BonePose, Skeleton};
use super::keyframe::JointKeyframe;
use super::motion_track::JointMotionTrack;

/// 默认片段帧率
pub const DEFAULT_CLIP_FPS: f32 = 30.0;

/// 动画片段
#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub name: String,
    /// 帧率（帧/秒），恒为有限值且 >= 1
    fps: f32,
    tracks: HashMap<String, JointMotionTrack>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fps: DEFAULT_CLIP_FPS,
            tracks: HashMap::new(),
        }
    }

    /// 设置帧率：小于 1 取 1，非有限值退回默认帧率
    pub fn with_fps(mut self, fps: f32) -> Self {
        self.fps = if fps.is_finite() {
            fps.max(1.0)
        } else {
            log::warn!("片段 '{}' 帧率无效: {}，使用默认值 {}", self.name, fps, DEFAULT_CLIP_FPS);
            DEFAULT_CLIP_FPS
        };
        self
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// 用一整套局部姿势（按骨骼顺序）生成单帧片段
    pub fn from_pose(name: impl Into<String>, skeleton: &Skeleton, poses: &[BonePose]) -> Self {
        let mut clip = Self::new(name);
        clip.insert_pose(0, skeleton, poses);
        clip
    }

    /// 在指定帧为每个关节插入一个关键帧
    pub fn insert_pose(&mut self, frame_index: u32, skeleton: &Skeleton, poses: &[BonePose]) {
        for (joint, pose) in skeleton.joints().iter().zip(poses) {
            self.insert_keyframe(&joint.name, JointKeyframe::from_pose(frame_index, *pose));
        }
    }

    pub fn insert_keyframe(&mut self, joint_name: &str, keyframe: JointKeyframe) {
        self.tracks
            .entry(joint_name.to_string())
            .or_default()
            .insert_keyframe(keyframe);
    }

    pub fn track(&self, joint_name: &str) -> Option<&JointMotionTrack> {
        self.tracks.get(joint_name)
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// 最大帧索引
    pub fn duration_frames(&self) -> u32 {
        self.tracks
            .values()
            .map(JointMotionTrack::max_frame_index)
            .max()
            .unwrap_or(0)
    }

    /// 时长（秒）
    pub fn duration(&self) -> f32 {
        self.duration_frames() as f32 / self.fps
    }

    /// 采样 time 秒处的姿势并写入骨骼局部姿势
    ///
    /// 没有轨道的关节保持原姿势。采样后刷新世界缓存。
    pub fn sample(&self, time: f32, skeleton: &mut Skeleton) {
        let frame = (time.max(0.0) * self.fps).min(self.duration_frames() as f32);
        let frame_index = frame.floor() as u32;
        let amount = frame - frame_index as f32;

        for index in 0..skeleton.len() {
            let Some(track) = skeleton
                .joint(index)
                .and_then(|joint| self.tracks.get(&joint.name))
            else {
                continue;
            };
            if let Some(pose) = track.seek_precisely(frame_index, amount) {
                skeleton.set_local_pose(index, pose);
            }
        }
        skeleton.update_world_transforms();
    }
}
