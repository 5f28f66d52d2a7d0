//! 关节动画轨道
//!
//! 存储单个关节的所有关键帧，并提供查找和插值功能

use std::collections::BTreeMap;

use crate::skeleton::BonePose;
use super::keyframe::JointKeyframe;

/// 两帧之间的插值系数
#[inline]
pub fn coefficient(prev_frame: u32, next_frame: u32, frame_index: u32) -> f32 {
    if next_frame <= prev_frame {
        return 1.0;
    }
    let interval = (next_frame - prev_frame) as f32;
    ((frame_index.saturating_sub(prev_frame)) as f32 / interval).clamp(0.0, 1.0)
}

/// 关节动画轨道
#[derive(Debug, Clone, Default)]
pub struct JointMotionTrack {
    /// 关键帧映射（帧索引 -> 关键帧）
    pub keyframes: BTreeMap<u32, JointKeyframe>,
}

impl JointMotionTrack {
    pub fn new() -> Self {
        Self {
            keyframes: BTreeMap::new(),
        }
    }

    /// 插入关键帧（同帧覆盖，返回旧值）
    pub fn insert_keyframe(&mut self, keyframe: JointKeyframe) -> Option<JointKeyframe> {
        self.keyframes.insert(keyframe.frame_index, keyframe)
    }

    /// 查找精确帧
    pub fn find(&self, frame_index: u32) -> Option<BonePose> {
        self.keyframes.get(&frame_index).map(JointKeyframe::pose)
    }

    /// 查找最近的前后关键帧（前帧 <= frame_index < 后帧）
    fn search_closest_keyframes(
        &self,
        frame_index: u32,
    ) -> (Option<&JointKeyframe>, Option<&JointKeyframe>) {
        let prev = self.keyframes.range(..=frame_index).next_back().map(|(_, kf)| kf);
        let next = frame_index
            .checked_add(1)
            .and_then(|start| self.keyframes.range(start..).next())
            .map(|(_, kf)| kf);
        (prev, next)
    }

    /// 查找最近的前后关键帧索引
    pub fn search_closest(&self, frame_index: u32) -> (Option<u32>, Option<u32>) {
        let (prev, next) = self.search_closest_keyframes(frame_index);
        (prev.map(|kf| kf.frame_index), next.map(|kf| kf.frame_index))
    }

    /// 求值指定帧
    ///
    /// 首帧之前取首帧，末帧之后取末帧；无关键帧时返回 None。
    pub fn seek(&self, frame_index: u32) -> Option<BonePose> {
        if let Some(pose) = self.find(frame_index) {
            return Some(pose);
        }

        match self.search_closest_keyframes(frame_index) {
            (Some(prev), Some(next)) => {
                let coef = coefficient(prev.frame_index, next.frame_index, frame_index);
                Some(prev.pose().interpolate(&next.pose(), coef))
            }
            (Some(prev), None) => Some(prev.pose()),
            (None, Some(next)) => Some(next.pose()),
            (None, None) => None,
        }
    }

    /// 精确求值（支持帧间插值，amount ∈ [0, 1)）
    pub fn seek_precisely(&self, frame_index: u32, amount: f32) -> Option<BonePose> {
        let f0 = self.seek(frame_index)?;
        if amount > 0.0 {
            let f1 = self.seek(frame_index.saturating_add(1)).unwrap_or(f0);
            Some(f0.interpolate(&f1, amount))
        } else {
            Some(f0)
        }
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// 获取最大帧索引
    pub fn max_frame_index(&self) -> u32 {
        self.keyframes.keys().next_back().copied().unwrap_or(0)
    }
}
