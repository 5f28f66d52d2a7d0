//! 集成测试公共部分：可脚本化的物理与动画替身

#![allow(dead_code)]

use std::collections::HashMap;

use glam::{Quat, Vec3};
use ragdoll_engine::{
    AnimationPlayback, BonePose, JointDef, PhysicsQuery, RagdollConfig, RagdollEngine, Skeleton,
};

pub const FACE_UP: &str = "Stand Up Face Up";
pub const FACE_DOWN: &str = "Stand Up Face Down";
pub const IDLE: &str = "Idle";

// ============================================================================
// 物理替身
// ============================================================================

/// 刚体状态完全由测试控制；运动学刚体跟随 set_body_pose
#[derive(Debug, Clone)]
pub struct MockPhysics {
    pub positions: Vec<Vec3>,
    pub rotations: Vec<Quat>,
    pub velocities: Vec<Vec3>,
    pub simulated: Vec<bool>,
    /// (关节, 冲量, 作用点)
    pub impulses: Vec<(usize, Vec3, Vec3)>,
    /// 地面高度，None 表示射线不命中
    pub ground: Option<f32>,
}

impl MockPhysics {
    pub fn new(body_count: usize) -> Self {
        Self {
            positions: vec![Vec3::ZERO; body_count],
            rotations: vec![Quat::IDENTITY; body_count],
            velocities: vec![Vec3::ZERO; body_count],
            simulated: vec![false; body_count],
            impulses: Vec::new(),
            ground: Some(0.0),
        }
    }

    pub fn all_simulated(&self) -> bool {
        self.simulated.iter().all(|s| *s)
    }

    pub fn none_simulated(&self) -> bool {
        self.simulated.iter().all(|s| !*s)
    }
}

impl PhysicsQuery for MockPhysics {
    fn body_count(&self) -> usize {
        self.positions.len()
    }

    fn body_position(&self, joint: usize) -> Vec3 {
        self.positions[joint]
    }

    fn body_rotation(&self, joint: usize) -> Quat {
        self.rotations[joint]
    }

    fn body_linear_velocity(&self, joint: usize) -> Vec3 {
        self.velocities[joint]
    }

    fn set_simulated(&mut self, joint: usize, simulated: bool) {
        self.simulated[joint] = simulated;
    }

    fn set_body_pose(&mut self, joint: usize, position: Vec3, rotation: Quat) {
        if !self.simulated[joint] {
            self.positions[joint] = position;
            self.rotations[joint] = rotation;
        }
    }

    fn apply_impulse(&mut self, joint: usize, force: Vec3, at_point: Vec3) {
        self.impulses.push((joint, force, at_point));
    }

    fn raycast_down(&self, origin: Vec3) -> Option<Vec3> {
        self.ground
            .filter(|y| *y <= origin.y)
            .map(|y| Vec3::new(origin.x, y, origin.z))
    }
}

// ============================================================================
// 动画替身
// ============================================================================

/// 片段是静态姿势；状态只在测试调用 `finish_current` 时结束
#[derive(Debug, Clone, Default)]
pub struct MockAnimation {
    pub clips: HashMap<String, Vec<BonePose>>,
    pub states: Vec<String>,
    pub enabled: bool,
    pub current: Option<String>,
    pub played: Vec<String>,
    /// 启用期间累计推进的时间
    pub advanced: f32,
    /// 采样时顺带移动根节点
    pub sample_moves_root: bool,
}

impl MockAnimation {
    pub fn new(face_up: Vec<BonePose>, face_down: Vec<BonePose>) -> Self {
        let mut clips = HashMap::new();
        clips.insert(FACE_UP.to_string(), face_up);
        clips.insert(FACE_DOWN.to_string(), face_down);
        Self {
            clips,
            states: vec![IDLE.into(), FACE_UP.into(), FACE_DOWN.into()],
            current: Some(IDLE.into()),
            ..Default::default()
        }
    }

    /// 当前状态播放完毕，切到 Idle
    pub fn finish_current(&mut self) {
        self.current = Some(IDLE.into());
    }
}

impl AnimationPlayback for MockAnimation {
    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn has_clip(&self, clip: &str) -> bool {
        self.clips.contains_key(clip)
    }

    fn has_state(&self, state: &str) -> bool {
        self.states.iter().any(|s| s == state)
    }

    fn sample_clip(&mut self, clip: &str, _time: f32, skeleton: &mut Skeleton) -> bool {
        let Some(poses) = self.clips.get(clip) else {
            return false;
        };
        skeleton.apply_local_poses(poses);
        if self.sample_moves_root {
            skeleton.set_root_position(Vec3::new(100.0, 100.0, 100.0));
            skeleton.set_root_rotation(Quat::from_rotation_y(1.0));
        }
        true
    }

    fn play_state(&mut self, state: &str) {
        self.current = Some(state.to_string());
        self.played.push(state.to_string());
    }

    fn is_current_state(&self, state: &str) -> bool {
        self.current.as_deref() == Some(state)
    }

    fn advance(&mut self, dt: f32, _skeleton: &mut Skeleton) {
        if self.enabled {
            self.advanced += dt;
        }
    }
}

// ============================================================================
// 装配
// ============================================================================

pub type MockEngine = RagdollEngine<MockPhysics, MockAnimation>;

/// hips(0,1,0) → spine(+0.5) → head(+0.5)
pub fn skeleton() -> Skeleton {
    Skeleton::new(vec![
        JointDef::root("hips", BonePose::from_position(Vec3::new(0.0, 1.0, 0.0))),
        JointDef::child("spine", 0, BonePose::from_position(Vec3::new(0.0, 0.5, 0.0))),
        JointDef::child("head", 1, BonePose::from_position(Vec3::new(0.0, 0.5, 0.0))),
    ])
    .unwrap()
}

pub fn face_up_pose() -> Vec<BonePose> {
    vec![
        BonePose::new(Vec3::new(0.0, 0.2, 0.5), Quat::from_rotation_x(-1.4)),
        BonePose::new(Vec3::new(0.0, 0.5, 0.0), Quat::from_rotation_x(0.2)),
        BonePose::new(Vec3::new(0.0, 0.5, 0.0), Quat::from_rotation_y(0.3)),
    ]
}

pub fn face_down_pose() -> Vec<BonePose> {
    vec![
        BonePose::new(Vec3::new(0.3, 0.2, -0.4), Quat::from_rotation_x(1.4)),
        BonePose::new(Vec3::new(0.0, 0.5, 0.0), Quat::from_rotation_z(-0.2)),
        BonePose::new(Vec3::new(0.0, 0.5, 0.0), Quat::from_rotation_x(-0.6)),
    ]
}

/// wake_up = 1.0s, reset_bones = 0.5s；测试使用 0.25 / 0.125 步长以保证计时精确
pub fn config() -> RagdollConfig {
    RagdollConfig {
        time_to_wake_up: 1.0,
        stand_up_velocity: 0.01,
        time_to_reset_bones: 0.5,
        face_up_clip: FACE_UP.into(),
        face_down_clip: FACE_DOWN.into(),
        face_up_state: FACE_UP.into(),
        face_down_state: FACE_DOWN.into(),
        ..Default::default()
    }
}

pub fn engine_with(config: RagdollConfig) -> MockEngine {
    let skeleton = skeleton();
    let physics = MockPhysics::new(skeleton.len());
    let animation = MockAnimation::new(face_up_pose(), face_down_pose());
    RagdollEngine::new(config, skeleton, physics, animation).unwrap()
}

pub fn engine() -> MockEngine {
    engine_with(config())
}

/// 把全部刚体摆成“髋骨在 hip_position、旋转为 hip_rotation”的躺倒姿势
pub fn lay_bodies(engine: &mut MockEngine, hip_position: Vec3, hip_rotation: Quat) {
    let physics = engine.physics_mut();
    let mut parent = BonePose::new(hip_position, hip_rotation);
    physics.positions[0] = hip_position;
    physics.rotations[0] = hip_rotation;
    for joint in 1..physics.positions.len() {
        let world = parent.mul_pose(&BonePose::from_position(Vec3::new(0.0, 0.5, 0.0)));
        physics.positions[joint] = world.position;
        physics.rotations[joint] = world.rotation;
        parent = world;
    }
}

/// 从 Idle 受击并推进到刚好完成静止（wake_up = 1.0，dt = 0.25 时第 7 帧静止）
pub fn knock_down_and_settle(engine: &mut MockEngine, hip_position: Vec3, hip_rotation: Quat) {
    engine.apply_impact(Vec3::new(0.0, 5.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
    lay_bodies(engine, hip_position, hip_rotation);
    for _ in 0..7 {
        engine.tick(0.25);
    }
}
