//! 关键帧定义

use glam::{Quat, Vec3};

use crate::skeleton::BonePose;

/// 关节关键帧
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointKeyframe {
    /// 帧索引（按片段帧率）
    pub frame_index: u32,
    /// 局部平移
    pub translation: Vec3,
    /// 局部旋转
    pub orientation: Quat,
}

impl JointKeyframe {
    pub fn new(frame_index: u32, translation: Vec3, orientation: Quat) -> Self {
        Self {
            frame_index,
            translation,
            orientation,
        }
    }

    pub fn from_pose(frame_index: u32, pose: BonePose) -> Self {
        Self::new(frame_index, pose.position, pose.rotation)
    }

    #[inline]
    pub fn pose(&self) -> BonePose {
        BonePose::new(self.translation, self.orientation)
    }
}
