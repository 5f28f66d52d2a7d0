//! 参考姿势集合与骨骼混合

use crate::skeleton::BonePose;

/// 引擎持有的三组局部姿势（顺序与骨骼数组一致）
///
/// - 两组起身姿势在构建时采样一次，之后只读
/// - `captured` 在每次静止时整体覆盖
#[derive(Debug, Clone)]
pub struct PoseSet {
    face_up: Vec<BonePose>,
    face_down: Vec<BonePose>,
    captured: Vec<BonePose>,
}

impl PoseSet {
    pub fn new(face_up: Vec<BonePose>, face_down: Vec<BonePose>) -> Self {
        debug_assert_eq!(face_up.len(), face_down.len());
        let captured = vec![BonePose::IDENTITY; face_up.len()];
        Self {
            face_up,
            face_down,
            captured,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.captured.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.captured.is_empty()
    }

    #[inline]
    pub fn face_up(&self) -> &[BonePose] {
        &self.face_up
    }

    #[inline]
    pub fn face_down(&self) -> &[BonePose] {
        &self.face_down
    }

    /// 按朝向选择起身姿势
    #[inline]
    pub fn stand_up(&self, face_up: bool) -> &[BonePose] {
        if face_up {
            &self.face_up
        } else {
            &self.face_down
        }
    }

    #[inline]
    pub fn captured(&self) -> &[BonePose] {
        &self.captured
    }

    pub(crate) fn captured_mut(&mut self) -> &mut [BonePose] {
        &mut self.captured
    }
}

/// 逐关节混合：位置线性插值，旋转球面插值
///
/// `t` 被钳制到 [0, 1]；0 与 1 时输出与端点逐位相等。
pub fn blend_poses(from: &[BonePose], to: &[BonePose], t: f32, out: &mut [BonePose]) {
    debug_assert_eq!(from.len(), to.len());
    debug_assert_eq!(from.len(), out.len());
    let t = clamp01(t);
    for ((slot, a), b) in out.iter_mut().zip(from).zip(to) {
        *slot = a.interpolate(b, t);
    }
}

#[inline]
pub(crate) fn clamp01(t: f32) -> f32 {
    if t.is_nan() {
        0.0
    } else {
        t.clamp(0.0, 1.0)
    }
}
