//! 布娃娃过渡演示
//!
//! 无渲染：60 Hz 驱动 Rapier 布娃娃与过渡引擎，扇角色一巴掌，
//! 输出每次状态切换与髋骨位置，直到角色重新站起。
//!
//! 运行：`RUST_LOG=debug cargo run --features demo --bin ragdoll_demo`

use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec3};
use ragdoll_engine::animation::JointKeyframe;
use ragdoll_engine::ragdoll::Impact;
use ragdoll_engine::{
    AnimationClip, Animator, AnimatorState, BonePose, EngineState, FacingAxis, JointDef,
    PhysicsConfig, RagdollConfig, RagdollEngine, RapierRagdoll, Skeleton, HIP_JOINT,
};

const FRAME_TIME: f32 = 1.0 / 60.0;
const MAX_FRAMES: u32 = 60 * 30;
const SLAP_FRAME: u32 = 30;

const IDLE: &str = "Idle";
const STAND_UP_FACE_UP: &str = "Stand Up Face Up";
const STAND_UP_FACE_DOWN: &str = "Stand Up Face Down";

fn humanoid() -> ragdoll_engine::Result<Skeleton> {
    let at = |x: f32, y: f32, z: f32| BonePose::from_position(Vec3::new(x, y, z));
    Skeleton::new(vec![
        JointDef::root("hips", at(0.0, 1.0, 0.0)),
        JointDef::child("spine", 0, at(0.0, 0.25, 0.0)),
        JointDef::child("chest", 1, at(0.0, 0.25, 0.0)),
        JointDef::child("head", 2, at(0.0, 0.3, 0.0)),
        JointDef::child("left_upper_arm", 2, at(0.2, 0.2, 0.0)),
        JointDef::child("left_lower_arm", 4, at(0.28, 0.0, 0.0)),
        JointDef::child("right_upper_arm", 2, at(-0.2, 0.2, 0.0)),
        JointDef::child("right_lower_arm", 6, at(-0.28, 0.0, 0.0)),
        JointDef::child("left_upper_leg", 0, at(0.1, -0.05, 0.0)),
        JointDef::child("left_lower_leg", 8, at(0.0, -0.45, 0.0)),
        JointDef::child("right_upper_leg", 0, at(-0.1, -0.05, 0.0)),
        JointDef::child("right_lower_leg", 10, at(0.0, -0.45, 0.0)),
    ])
}

/// 起身片段：第 0 帧躺在地上，第 45 帧回到站立姿势
fn stand_up_clip(name: &str, skeleton: &Skeleton, hip_tilt: f32) -> AnimationClip {
    let rest: Vec<BonePose> = skeleton.joints().iter().map(|j| j.rest_pose()).collect();

    let mut clip = AnimationClip::new(name);
    clip.insert_pose(0, skeleton, &rest);
    clip.insert_keyframe(
        "hips",
        JointKeyframe::new(0, Vec3::new(0.0, 0.15, 0.0), Quat::from_rotation_x(hip_tilt)),
    );
    clip.insert_pose(45, skeleton, &rest);
    clip
}

fn animator(skeleton: &Skeleton) -> Animator {
    let rest: Vec<BonePose> = skeleton.joints().iter().map(|j| j.rest_pose()).collect();

    let mut idle = AnimationClip::new(IDLE);
    idle.insert_pose(0, skeleton, &rest);
    idle.insert_keyframe("chest", JointKeyframe::new(15, Vec3::new(0.0, 0.26, 0.0), Quat::IDENTITY));
    idle.insert_pose(30, skeleton, &rest);

    let mut animator = Animator::new();
    animator.add_clip(idle);
    // 仰面：胸口朝上（+Z 转到 +Y）
    animator.add_clip(stand_up_clip(STAND_UP_FACE_UP, skeleton, -FRAC_PI_2));
    animator.add_clip(stand_up_clip(STAND_UP_FACE_DOWN, skeleton, FRAC_PI_2));

    animator.add_state(AnimatorState::new(IDLE, IDLE).looping());
    animator.add_state(AnimatorState::new(STAND_UP_FACE_UP, STAND_UP_FACE_UP).then(IDLE));
    animator.add_state(AnimatorState::new(STAND_UP_FACE_DOWN, STAND_UP_FACE_DOWN).then(IDLE));
    animator.set_default_state(IDLE);
    animator
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let skeleton = humanoid()?;
    let mut physics = RapierRagdoll::with_config(PhysicsConfig {
        debug_log: true,
        ..Default::default()
    });
    physics.build_ragdoll(&skeleton);
    let animator = animator(&skeleton);

    let config = RagdollConfig {
        time_to_wake_up: 1.0,
        time_to_reset_bones: 0.5,
        facing_axis: FacingAxis::Forward,
        debug_log: true,
        ..Default::default()
    };
    let mut engine = RagdollEngine::new(config, skeleton, physics, animator)?;

    let mut last_state = engine.current_state();
    let mut episode_done = false;

    for frame in 0..MAX_FRAMES {
        if frame == SLAP_FRAME {
            let target = engine.hip_world_position();
            let attacker = target + Vec3::new(0.0, 0.5, -1.5);
            let impact = Impact::slap(attacker, target, target, 20.0, 2.0, 5.0);
            log::info!("第 {} 帧: 巴掌 force={:?}", frame, impact.force);
            engine.apply(impact);
        }

        engine.physics_mut().step(FRAME_TIME);
        engine.tick(FRAME_TIME);

        let state = engine.current_state();
        if state != last_state {
            log::info!(
                "第 {} 帧 ({:.2}s): {} → {}, 髋骨={:?}, 朝向={:?}",
                frame,
                frame as f32 * FRAME_TIME,
                last_state,
                state,
                engine.hip_world_position(),
                engine.facing()
            );
            if state == EngineState::Idle {
                episode_done = true;
                break;
            }
            last_state = state;
        }
    }

    if episode_done {
        log::info!(
            "角色已站起: 根节点={:?}, 髋骨={:?}",
            engine.root().position,
            engine.skeleton().joint_world_position(HIP_JOINT)
        );
    } else {
        log::warn!("{} 帧内未完成起身，最终状态 {}", MAX_FRAMES, engine.current_state());
    }
    Ok(())
}
