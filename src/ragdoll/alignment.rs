//! 静止后的朝向判定与根节点对齐
//!
//! 对齐只移动根变换；髋骨世界姿势在每一步之后恢复原值，
//! 因此角色在屏幕上不动，只是根节点“追上”了布娃娃。

use std::f32::consts::PI;

use glam::{Quat, Vec3};

use crate::physics::PhysicsQuery;
use crate::skeleton::{BonePose, Skeleton, HIP_JOINT};
use super::state::{Facing, FacingAxis};

/// 判定静止时的朝向
pub fn detect_facing(skeleton: &Skeleton, axis: FacingAxis) -> Facing {
    let probe = match axis {
        FacingAxis::Up => skeleton.joint_up(HIP_JOINT),
        FacingAxis::Forward => skeleton.joint_forward(HIP_JOINT),
    };
    if probe.y > 0.0 {
        Facing::Up
    } else {
        Facing::Down
    }
}

/// 恢复髋骨世界姿势并刷新全部世界缓存
fn restore_hip(skeleton: &mut Skeleton, hip: BonePose) {
    skeleton.set_joint_world_pose(HIP_JOINT, hip.position, hip.rotation);
    skeleton.update_world_transforms();
}

/// 根节点位置对齐到髋骨
///
/// 根节点移到髋骨位置，再减去起身姿势中髋骨相对根节点的水平偏移（按根旋转变换），
/// 混合结束后髋骨正好落回静止位置。之后向下投射射线贴地，未命中则保持 Y 不变。
///
/// 返回是否命中地面。
pub fn align_position_to_hips<P: PhysicsQuery>(
    skeleton: &mut Skeleton,
    stand_up_pose: &[BonePose],
    physics: &P,
) -> bool {
    let hip = skeleton.joint_world_pose(HIP_JOINT);

    let mut offset = stand_up_pose[HIP_JOINT].position;
    offset.y = 0.0;
    let offset = skeleton.root().rotation * offset;

    let mut position = hip.position - offset;
    let grounded = match physics.raycast_down(position) {
        Some(hit) => {
            position.y = hit.y;
            true
        }
        None => {
            log::warn!("根节点贴地失败: {:?} 下方没有地面，保持原高度", position);
            false
        }
    };

    skeleton.set_root_position(position);
    restore_hip(skeleton, hip);
    grounded
}

/// 根节点旋转对齐到髋骨
///
/// 目标前向为髋骨 up 轴（仰面时取反）在水平面上的投影；
/// 根节点绕最短弧从当前前向转到目标前向。投影长度为零时不旋转，返回 false。
pub fn align_rotation_to_hips(skeleton: &mut Skeleton, facing: Facing) -> bool {
    let hip = skeleton.joint_world_pose(HIP_JOINT);

    let mut desired = hip.rotation * Vec3::Y;
    if facing.is_up() {
        desired = -desired;
    }
    desired.y = 0.0;
    let desired = desired.normalize_or_zero();
    if desired == Vec3::ZERO {
        log::debug!("髋骨 up 轴接近竖直，跳过根旋转对齐");
        return false;
    }

    let forward = skeleton.root_forward();
    // 反向时最短弧的转轴不唯一，固定绕竖直轴转半圈
    let from_to = if forward.dot(desired) < -1.0 + 1e-6 {
        Quat::from_rotation_y(PI)
    } else {
        Quat::from_rotation_arc(forward, desired)
    };
    let rotation = from_to * skeleton.root().rotation;

    skeleton.set_root_rotation(rotation);
    restore_hip(skeleton, hip);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::JointDef;
    use std::f32::consts::FRAC_PI_2;

    struct Ground(Option<f32>);

    impl PhysicsQuery for Ground {
        fn body_count(&self) -> usize {
            0
        }
        fn body_position(&self, _joint: usize) -> Vec3 {
            Vec3::ZERO
        }
        fn body_rotation(&self, _joint: usize) -> Quat {
            Quat::IDENTITY
        }
        fn body_linear_velocity(&self, _joint: usize) -> Vec3 {
            Vec3::ZERO
        }
        fn set_simulated(&mut self, _joint: usize, _simulated: bool) {}
        fn set_body_pose(&mut self, _joint: usize, _position: Vec3, _rotation: Quat) {}
        fn apply_impulse(&mut self, _joint: usize, _force: Vec3, _at_point: Vec3) {}
        fn raycast_down(&self, origin: Vec3) -> Option<Vec3> {
            self.0.map(|y| Vec3::new(origin.x, y, origin.z))
        }
    }

    /// 髋骨躺倒在 (3, 0.2, 4)
    fn lying_skeleton(hip_rotation: Quat) -> Skeleton {
        let mut skeleton = Skeleton::new(vec![
            JointDef::root("hips", BonePose::from_position(Vec3::new(0.0, 1.0, 0.0))),
            JointDef::child("spine", 0, BonePose::from_position(Vec3::new(0.0, 0.5, 0.0))),
        ])
        .unwrap();
        skeleton.set_joint_world_pose(HIP_JOINT, Vec3::new(3.0, 0.2, 4.0), hip_rotation);
        skeleton.update_world_transforms();
        skeleton
    }

    #[test]
    fn test_detect_facing() {
        let face_up = lying_skeleton(Quat::from_rotation_x(-0.3));
        assert_eq!(detect_facing(&face_up, FacingAxis::Up), Facing::Up);

        let upside_down = lying_skeleton(Quat::from_rotation_x(2.5));
        assert_eq!(detect_facing(&upside_down, FacingAxis::Up), Facing::Down);

        // forward 轴：绕 X 轴 -90° 后 +Z → +Y
        let chest_up = lying_skeleton(Quat::from_rotation_x(-FRAC_PI_2));
        assert_eq!(detect_facing(&chest_up, FacingAxis::Forward), Facing::Up);
        let chest_down = lying_skeleton(Quat::from_rotation_x(FRAC_PI_2));
        assert_eq!(detect_facing(&chest_down, FacingAxis::Forward), Facing::Down);
    }

    #[test]
    fn test_align_position_snaps_to_ground() {
        let hip_rotation = Quat::from_rotation_x(FRAC_PI_2);
        let mut skeleton = lying_skeleton(hip_rotation);
        let spine_before = skeleton.joint_world_position(1);
        let stand_up = vec![
            BonePose::from_position(Vec3::new(0.5, 0.9, 0.25)),
            BonePose::from_position(Vec3::new(0.0, 0.5, 0.0)),
        ];

        assert!(align_position_to_hips(&mut skeleton, &stand_up, &Ground(Some(0.0))));

        // 根节点 = 髋骨 - 水平偏移，Y 贴地
        assert!(skeleton.root().position.abs_diff_eq(Vec3::new(2.5, 0.0, 3.75), 1e-5));
        // 髋骨与子关节世界姿势不变
        assert!(skeleton.joint_world_position(HIP_JOINT).abs_diff_eq(Vec3::new(3.0, 0.2, 4.0), 1e-5));
        assert!(crate::skeleton::same_rotation(
            skeleton.joint_world_rotation(HIP_JOINT),
            hip_rotation,
            1e-5
        ));
        assert!(skeleton.joint_world_position(1).abs_diff_eq(spine_before, 1e-5));
    }

    #[test]
    fn test_align_position_offset_follows_root_rotation() {
        let mut skeleton = lying_skeleton(Quat::IDENTITY);
        skeleton.set_root_rotation(Quat::from_rotation_y(FRAC_PI_2));
        skeleton.update_world_transforms();
        skeleton.set_joint_world_pose(HIP_JOINT, Vec3::new(3.0, 0.2, 4.0), Quat::IDENTITY);
        skeleton.update_world_transforms();

        let stand_up = vec![BonePose::from_position(Vec3::new(0.0, 0.9, 1.0)); 2];
        align_position_to_hips(&mut skeleton, &stand_up, &Ground(Some(-1.0)));
        // +Z 偏移绕 Y 轴 90° 后变为 +X
        assert!(skeleton.root().position.abs_diff_eq(Vec3::new(2.0, -1.0, 4.0), 1e-5));
    }

    #[test]
    fn test_align_position_ray_miss_keeps_height() {
        let mut skeleton = lying_skeleton(Quat::IDENTITY);
        let stand_up = vec![BonePose::from_position(Vec3::new(0.0, 0.9, 0.0)); 2];

        assert!(!align_position_to_hips(&mut skeleton, &stand_up, &Ground(None)));
        assert!(skeleton.root().position.abs_diff_eq(Vec3::new(3.0, 0.2, 4.0), 1e-5));
        assert!(skeleton.joint_world_position(HIP_JOINT).abs_diff_eq(Vec3::new(3.0, 0.2, 4.0), 1e-5));
    }

    #[test]
    fn test_align_rotation_face_down() {
        // 俯卧：髋骨 up 轴指向 +X（绕 Z 轴 -90°）
        let hip_rotation = Quat::from_rotation_z(-FRAC_PI_2);
        let mut skeleton = lying_skeleton(hip_rotation);
        let spine_before = skeleton.joint_world_position(1);

        assert!(align_rotation_to_hips(&mut skeleton, Facing::Down));
        assert!(skeleton.root_forward().abs_diff_eq(Vec3::X, 1e-5));
        assert!(skeleton.root().up().abs_diff_eq(Vec3::Y, 1e-5));
        assert!(crate::skeleton::same_rotation(
            skeleton.joint_world_rotation(HIP_JOINT),
            hip_rotation,
            1e-5
        ));
        assert!(skeleton.joint_world_position(1).abs_diff_eq(spine_before, 1e-5));
    }

    #[test]
    fn test_align_rotation_face_up_negates() {
        let mut skeleton = lying_skeleton(Quat::from_rotation_z(-FRAC_PI_2));
        assert!(align_rotation_to_hips(&mut skeleton, Facing::Up));
        assert!(skeleton.root_forward().abs_diff_eq(Vec3::NEG_X, 1e-5));
    }

    #[test]
    fn test_align_rotation_opposite_direction_stays_upright() {
        // 仰面：髋骨 up 轴指向 +Z，目标前向为 -Z
        let mut skeleton = lying_skeleton(Quat::from_rotation_x(FRAC_PI_2));
        assert!(align_rotation_to_hips(&mut skeleton, Facing::Up));
        assert!(skeleton.root_forward().abs_diff_eq(Vec3::NEG_Z, 1e-5));
        assert!(skeleton.root().up().abs_diff_eq(Vec3::Y, 1e-5));
    }

    #[test]
    fn test_align_rotation_skips_vertical_hip() {
        let mut skeleton = lying_skeleton(Quat::IDENTITY);
        let root_before = *skeleton.root();
        assert!(!align_rotation_to_hips(&mut skeleton, Facing::Up));
        assert_eq!(*skeleton.root(), root_before);
    }
}
