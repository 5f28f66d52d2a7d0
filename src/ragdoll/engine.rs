//! 布娃娃过渡状态机
//!
//! 驱动方式：外部每帧调用 `tick(dt)`，受击时调用 `apply_impact`。
//! 使用 Rapier 后端时，调用方在 `tick` 之前自行 `physics_mut().step(dt)`。
//!
//! ```text
//! Idle ──apply_impact──▶ Ragdoll ──静止──▶ ResettingBones ──t=1──▶ StandingUp ──动画结束──▶ Idle
//! ```

use glam::Vec3;

use crate::animation::AnimationPlayback;
use crate::physics::PhysicsQuery;
use crate::skeleton::{BonePose, RootTransform, Skeleton, HIP_JOINT};
use crate::{RagdollError, Result};

use super::alignment::{align_position_to_hips, align_rotation_to_hips, detect_facing};
use super::config::{get_config, RagdollConfig};
use super::impact::{nearest_body, Impact};
use super::pose_set::{blend_poses, clamp01, PoseSet};
use super::state::{EngineState, Facing, ReimpactPolicy};

/// 布娃娃过渡引擎
///
/// 独占骨骼、全部姿势缓冲区与状态；物理与动画通过构造时注入的服务访问。
pub struct RagdollEngine<P: PhysicsQuery, A: AnimationPlayback> {
    config: RagdollConfig,
    skeleton: Skeleton,
    physics: P,
    animation: A,

    poses: PoseSet,
    /// 混合结果缓冲区（避免每帧分配）
    blend_buffer: Vec<BonePose>,

    state: EngineState,
    /// 本次布娃娃过程的朝向（静止时判定，直到下次静止前不变）
    facing: Facing,

    // ========== 计时器 ==========
    /// 受击后经过的时间
    fall_timer: f32,
    /// 低速持续时间
    dwell_timer: f32,
    /// 骨骼混合经过的时间
    elapsed_reset_time: f32,
}

impl<P: PhysicsQuery, A: AnimationPlayback> RagdollEngine<P, A> {
    /// 构建引擎
    ///
    /// 检查配置与协作者，采样两个起身片段的 0 时刻姿势，之后全部刚体切为运动学、启用动画。
    pub fn new(
        config: RagdollConfig,
        mut skeleton: Skeleton,
        mut physics: P,
        mut animation: A,
    ) -> Result<Self> {
        config.validate()?;
        if skeleton.is_empty() {
            return Err(RagdollError::EmptySkeleton);
        }
        let joint_count = skeleton.len();
        if physics.body_count() != joint_count {
            return Err(RagdollError::BodyCountMismatch {
                joints: joint_count,
                bodies: physics.body_count(),
            });
        }
        for clip in [&config.face_up_clip, &config.face_down_clip] {
            if !animation.has_clip(clip) {
                return Err(RagdollError::MissingClip(clip.clone()));
            }
        }
        for state in [&config.face_up_state, &config.face_down_state] {
            if !animation.has_state(state) {
                return Err(RagdollError::MissingState(state.clone()));
            }
        }

        let face_up = sample_stand_up_pose(&mut animation, &mut skeleton, config.clip_for(true))?;
        let face_down =
            sample_stand_up_pose(&mut animation, &mut skeleton, config.clip_for(false))?;

        for joint in 0..joint_count {
            physics.set_simulated(joint, false);
        }
        animation.set_enabled(true);

        log::info!(
            "布娃娃引擎初始化: {} 关节, wake_up={}s, reset_bones={}s, 阈值={}",
            joint_count,
            config.time_to_wake_up,
            config.time_to_reset_bones,
            config.stand_up_velocity
        );

        let mut engine = Self {
            config,
            skeleton,
            physics,
            animation,
            poses: PoseSet::new(face_up, face_down),
            blend_buffer: vec![BonePose::IDENTITY; joint_count],
            state: EngineState::Idle,
            facing: Facing::Up,
            fall_timer: 0.0,
            dwell_timer: 0.0,
            elapsed_reset_time: 0.0,
        };
        engine.sync_kinematic_bodies();
        Ok(engine)
    }

    /// 使用全局默认配置构建
    pub fn with_default_config(skeleton: Skeleton, physics: P, animation: A) -> Result<Self> {
        Self::new(get_config(), skeleton, physics, animation)
    }

    // ========================================
    // 每帧驱动
    // ========================================

    /// 推进一帧（非有限或负的 dt 视为 0）
    pub fn tick(&mut self, dt: f32) {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };

        if self.animation.is_enabled() {
            self.animation.advance(dt, &mut self.skeleton);
        }

        match self.state {
            EngineState::Idle => {}
            EngineState::Ragdoll => self.ragdoll_behaviour(dt),
            EngineState::ResettingBones => self.reset_bones_behaviour(dt),
            EngineState::StandingUp => self.standing_up_behaviour(),
        }

        if self.state != EngineState::Ragdoll {
            self.skeleton.update_world_transforms();
            self.sync_kinematic_bodies();
        }
    }

    /// 受击
    ///
    /// 冲量只施加到距离命中点最近的一个刚体。没有可用刚体时什么都不做。
    /// - Idle：进入布娃娃
    /// - Ragdoll：施加冲量并重新开始静止检测，朝向与已捕获姿势不变
    /// - ResettingBones / StandingUp：按 `reimpact_policy` 重新进入布娃娃或忽略
    ///
    /// 进入布娃娃时立即从刚体读回骨骼，`hip_world_position` 无需等到下一次 `tick`。
    pub fn apply_impact(&mut self, force: Vec3, hit_point: Vec3) {
        let Some(body) = nearest_body(&self.physics, hit_point) else {
            log::warn!("受击点 {:?} 附近没有可用刚体，忽略", hit_point);
            return;
        };

        match self.state {
            EngineState::Ragdoll => {
                self.physics.apply_impulse(body, force, hit_point);
                self.fall_timer = 0.0;
                self.dwell_timer = 0.0;
                return;
            }
            EngineState::ResettingBones | EngineState::StandingUp
                if self.config.reimpact_policy == ReimpactPolicy::Ignore =>
            {
                log::debug!("{} 状态下受击，按配置忽略", self.state);
                return;
            }
            _ => {}
        }

        self.enable_ragdoll();
        self.physics.apply_impulse(body, force, hit_point);

        self.fall_timer = 0.0;
        self.dwell_timer = 0.0;
        self.elapsed_reset_time = 0.0;
        self.sync_skeleton_from_bodies();
        self.transition(EngineState::Ragdoll);
    }

    /// 以 [`Impact`] 形式受击
    pub fn apply(&mut self, impact: Impact) {
        self.apply_impact(impact.force, impact.hit_point);
    }

    // ========================================
    // 状态行为
    // ========================================

    fn ragdoll_behaviour(&mut self, dt: f32) {
        self.sync_skeleton_from_bodies();

        self.fall_timer += dt;
        if self.fall_timer < self.config.time_to_wake_up {
            return;
        }

        let speed_sq = self.physics.body_linear_velocity(HIP_JOINT).length_squared();
        if speed_sq < self.config.stand_up_velocity {
            self.dwell_timer += dt;
            if self.dwell_timer >= self.config.time_to_wake_up {
                self.settle();
            }
        } else {
            self.fall_timer = 0.0;
            self.dwell_timer = 0.0;
        }
    }

    /// 静止：判定朝向，对齐根节点，捕获当前局部姿势
    fn settle(&mut self) {
        self.fall_timer = 0.0;
        self.dwell_timer = 0.0;

        self.facing = detect_facing(&self.skeleton, self.config.facing_axis);
        let face_up = self.facing.is_up();

        let grounded = align_position_to_hips(
            &mut self.skeleton,
            self.poses.stand_up(face_up),
            &self.physics,
        );
        align_rotation_to_hips(&mut self.skeleton, self.facing);

        self.skeleton.capture_local_poses(self.poses.captured_mut());

        self.disable_ragdoll();
        self.elapsed_reset_time = 0.0;

        log::debug!(
            "布娃娃静止: 朝向={:?}, 根节点={:?}, 贴地={}",
            self.facing,
            self.skeleton.root().position,
            grounded
        );
        self.transition(EngineState::ResettingBones);
    }

    fn reset_bones_behaviour(&mut self, dt: f32) {
        self.elapsed_reset_time += dt;
        let t = clamp01(self.elapsed_reset_time / self.config.time_to_reset_bones);
        let face_up = self.facing.is_up();

        blend_poses(
            self.poses.captured(),
            self.poses.stand_up(face_up),
            t,
            &mut self.blend_buffer,
        );
        self.skeleton.apply_local_poses(&self.blend_buffer);

        if t >= 1.0 {
            self.animation.set_enabled(true);
            self.animation.play_state(self.config.state_for(face_up));
            self.transition(EngineState::StandingUp);
        }
    }

    fn standing_up_behaviour(&mut self) {
        let expected = self.config.state_for(self.facing.is_up());
        if !self.animation.is_current_state(expected) {
            self.transition(EngineState::Idle);
        }
    }

    // ========================================
    // 物理 / 动画切换
    // ========================================

    fn enable_ragdoll(&mut self) {
        for joint in 0..self.skeleton.len() {
            self.physics.set_simulated(joint, true);
        }
        self.animation.set_enabled(false);
    }

    fn disable_ragdoll(&mut self) {
        for joint in 0..self.skeleton.len() {
            self.physics.set_simulated(joint, false);
        }
        self.animation.set_enabled(false);
    }

    /// 把模拟结果读回骨骼（父节点在前）
    fn sync_skeleton_from_bodies(&mut self) {
        for joint in 0..self.skeleton.len() {
            let position = self.physics.body_position(joint);
            let rotation = self.physics.body_rotation(joint);
            self.skeleton.set_joint_world_pose(joint, position, rotation);
        }
    }

    /// 运动学刚体跟随骨骼
    fn sync_kinematic_bodies(&mut self) {
        for joint in 0..self.skeleton.len() {
            let pose = self.skeleton.joint_world_pose(joint);
            self.physics.set_body_pose(joint, pose.position, pose.rotation);
        }
    }

    fn transition(&mut self, next: EngineState) {
        if self.config.debug_log {
            log::info!("布娃娃状态: {} → {}", self.state, next);
        } else {
            log::debug!("布娃娃状态: {} → {}", self.state, next);
        }
        self.state = next;
    }

    // ========================================
    // 访问器
    // ========================================

    #[inline]
    pub fn current_state(&self) -> EngineState {
        self.state
    }

    /// 髋骨世界位置（起身后供移动控制器重新定位角色）
    #[inline]
    pub fn hip_world_position(&self) -> Vec3 {
        self.skeleton.joint_world_position(HIP_JOINT)
    }

    /// 本次（或上次）布娃娃过程的朝向
    #[inline]
    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// 骨骼混合进度 [0, 1]
    pub fn reset_progress(&self) -> f32 {
        clamp01(self.elapsed_reset_time / self.config.time_to_reset_bones)
    }

    /// (受击后计时, 低速持续计时)
    pub fn settle_timers(&self) -> (f32, f32) {
        (self.fall_timer, self.dwell_timer)
    }

    #[inline]
    pub fn pose_set(&self) -> &PoseSet {
        &self.poses
    }

    #[inline]
    pub fn config(&self) -> &RagdollConfig {
        &self.config
    }

    #[inline]
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    #[inline]
    pub fn root(&self) -> &RootTransform {
        self.skeleton.root()
    }

    #[inline]
    pub fn physics(&self) -> &P {
        &self.physics
    }

    #[inline]
    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }

    #[inline]
    pub fn animation(&self) -> &A {
        &self.animation
    }

    #[inline]
    pub fn animation_mut(&mut self) -> &mut A {
        &mut self.animation
    }
}

/// 采样起身片段 0 时刻的局部姿势，之后恢复骨骼原姿势与根变换
fn sample_stand_up_pose<A: AnimationPlayback>(
    animation: &mut A,
    skeleton: &mut Skeleton,
    clip: &str,
) -> Result<Vec<BonePose>> {
    let root = *skeleton.root();
    let before = skeleton.local_poses();

    if !animation.sample_clip(clip, 0.0, skeleton) {
        return Err(RagdollError::MissingClip(clip.to_string()));
    }
    let sampled = skeleton.local_poses();

    skeleton.set_root_position(root.position);
    skeleton.set_root_rotation(root.rotation);
    skeleton.apply_local_poses(&before);
    Ok(sampled)
}
