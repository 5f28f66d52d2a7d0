//! Rapier 布娃娃物理世界
//!
//! 每个关节一个刚体（球体碰撞体，原点与关节重合），子关节通过球形关节挂在父关节上。
//! 布娃娃碰撞体之间互不碰撞，只与地面及其他场景物体碰撞。
//! 流程：build_ragdoll → 每帧 [set_body_pose（运动学跟随）| step（模拟）]

use glam::{Quat, Vec3};
use rapier3d::na;
use rapier3d::prelude::*;

use crate::skeleton::Skeleton;
use super::config::{get_config, PhysicsConfig};
use super::PhysicsQuery;

/// 布娃娃碰撞体所属的碰撞组
pub const RAGDOLL_GROUP: Group = Group::GROUP_2;

/// 单个关节对应的刚体
#[derive(Debug, Clone)]
struct RagdollBody {
    joint_name: String,
    body_handle: RigidBodyHandle,
    simulated: bool,
}

/// Rapier 布娃娃物理世界
pub struct RapierRagdoll {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,

    /// 地面刚体句柄
    ground_handle: RigidBodyHandle,
    /// 关节刚体（索引与骨骼关节一致）
    bodies: Vec<RagdollBody>,

    config: PhysicsConfig,
    /// 未消耗的步进时间
    accumulator: f32,
}

// ============================================================================
// glam <-> nalgebra 转换
// ============================================================================

#[inline]
fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

#[inline]
fn to_point(v: Vec3) -> Point<Real> {
    point![v.x, v.y, v.z]
}

#[inline]
fn from_vector(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

#[inline]
fn to_isometry(position: Vec3, rotation: Quat) -> na::Isometry3<Real> {
    let rotation = na::UnitQuaternion::from_quaternion(na::Quaternion::new(
        rotation.w, rotation.x, rotation.y, rotation.z,
    ));
    na::Isometry3::from_parts(na::Translation3::new(position.x, position.y, position.z), rotation)
}

#[inline]
fn from_rotation(q: &na::UnitQuaternion<Real>) -> Quat {
    Quat::from_xyzw(q.i, q.j, q.k, q.w)
}

impl RapierRagdoll {
    /// 创建只含地面的物理世界（使用全局配置）
    pub fn new() -> Self {
        Self::with_config(get_config())
    }

    pub fn with_config(config: PhysicsConfig) -> Self {
        let config = config.sanitized();
        let mut rigid_body_set = RigidBodySet::new();
        let mut collider_set = ColliderSet::new();

        // 地面：静态盒子，顶面位于 ground_height
        let ground = RigidBodyBuilder::fixed()
            .translation(vector![0.0, config.ground_height - 0.5, 0.0])
            .build();
        let ground_handle = rigid_body_set.insert(ground);
        let ground_collider =
            ColliderBuilder::cuboid(config.ground_half_extent, 0.5, config.ground_half_extent)
                .friction(config.friction)
                .build();
        collider_set.insert_with_parent(ground_collider, ground_handle, &mut rigid_body_set);

        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = 1.0 / config.physics_fps;

        if config.debug_log {
            log::info!(
                "[物理配置] FPS={}, 重力Y={}, 最大子步={}",
                config.physics_fps, config.gravity_y, config.max_substep_count
            );
        }

        let mut query_pipeline = QueryPipeline::new();
        query_pipeline.update(&collider_set);

        Self {
            gravity: vector![0.0, config.gravity_y, 0.0],
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set,
            collider_set,
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline,
            ground_handle,
            bodies: Vec::new(),
            config,
            accumulator: 0.0,
        }
    }

    /// 按骨骼当前世界姿势创建布娃娃（使用全局配置）
    pub fn from_skeleton(skeleton: &Skeleton) -> Self {
        let mut ragdoll = Self::new();
        ragdoll.build_ragdoll(skeleton);
        ragdoll
    }

    /// 构建布娃娃刚体与关节
    ///
    /// 所有刚体初始为运动学；已有布娃娃时追加（调用方负责只构建一次）。
    pub fn build_ragdoll(&mut self, skeleton: &Skeleton) {
        let base = self.bodies.len();
        self.bodies.reserve(skeleton.len());

        // 第一步：创建刚体与碰撞体
        for joint in skeleton.joints() {
            let pose = joint.world_pose();
            let body = RigidBodyBuilder::kinematic_position_based()
                .position(to_isometry(pose.position, pose.rotation))
                .linear_damping(self.config.linear_damping)
                .angular_damping(self.config.angular_damping)
                .build();
            let body_handle = self.rigid_body_set.insert(body);

            let collider = ColliderBuilder::ball(self.config.body_radius)
                .density(self.config.body_density)
                .friction(self.config.friction)
                .collision_groups(InteractionGroups::new(
                    RAGDOLL_GROUP,
                    Group::ALL.difference(RAGDOLL_GROUP),
                ))
                .build();
            self.collider_set
                .insert_with_parent(collider, body_handle, &mut self.rigid_body_set);

            self.bodies.push(RagdollBody {
                joint_name: joint.name.clone(),
                body_handle,
                simulated: false,
            });
        }

        // 第二步：子关节挂到父关节（锚点 = 子关节在父刚体坐标系中的位置）
        let mut joint_count = 0;
        if self.config.joints_enabled {
            for joint in skeleton.joints() {
                let Some(parent) = joint.parent_id() else {
                    continue;
                };
                let anchor = joint.local_pose().position;
                let spherical = SphericalJointBuilder::new()
                    .local_anchor1(to_point(anchor))
                    .local_anchor2(point![0.0, 0.0, 0.0])
                    .contacts_enabled(false)
                    .build();
                self.impulse_joint_set.insert(
                    self.bodies[base + parent].body_handle,
                    self.bodies[base + joint.index()].body_handle,
                    spherical,
                    true,
                );
                joint_count += 1;
            }
        }

        self.query_pipeline.update(&self.collider_set);

        log::info!(
            "Rapier 布娃娃构建完成: {} 刚体, {} 关节",
            skeleton.len(),
            joint_count
        );
    }

    /// 添加静态盒子（场景障碍物）
    pub fn add_static_box(&mut self, center: Vec3, half_extents: Vec3) -> RigidBodyHandle {
        let body = RigidBodyBuilder::fixed().translation(to_vector(center)).build();
        let handle = self.rigid_body_set.insert(body);
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .friction(self.config.friction)
            .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        self.query_pipeline.update(&self.collider_set);
        handle
    }

    /// 步进物理模拟（固定步长，子步数受 max_substep_count 限制）
    pub fn step(&mut self, delta_time: f32) {
        if !delta_time.is_finite() || delta_time <= 0.0 {
            return;
        }
        let fixed_dt = self.integration_parameters.dt;
        self.accumulator += delta_time;

        let mut substeps = 0;
        while self.accumulator >= fixed_dt && substeps < self.config.max_substep_count {
            self.physics_pipeline.step(
                &self.gravity,
                &self.integration_parameters,
                &mut self.island_manager,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.rigid_body_set,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                &mut self.ccd_solver,
                Some(&mut self.query_pipeline),
                &(),
                &(),
            );
            self.clamp_velocities();
            self.accumulator -= fixed_dt;
            substeps += 1;
        }

        if substeps == self.config.max_substep_count && self.accumulator >= fixed_dt {
            if self.config.debug_log {
                log::debug!("物理步进落后 {:.3}s，丢弃", self.accumulator);
            }
            self.accumulator = 0.0;
        }
    }

    /// 限制刚体速度，防止物理爆炸
    fn clamp_velocities(&mut self) {
        let max_lin = self.config.max_linear_velocity;
        let max_ang = self.config.max_angular_velocity;

        for rb in &self.bodies {
            if !rb.simulated {
                continue;
            }
            let Some(body) = self.rigid_body_set.get_mut(rb.body_handle) else {
                continue;
            };

            let lin = *body.linvel();
            let lin_len = lin.norm();
            if lin_len > max_lin {
                body.set_linvel(lin * (max_lin / lin_len), false);
            }

            let ang = *body.angvel();
            let ang_len = ang.norm();
            if ang_len > max_ang {
                body.set_angvel(ang * (max_ang / ang_len), false);
            }
        }
    }

    /// 全部刚体回到运动学并对齐骨骼当前姿势
    pub fn reset_to_skeleton(&mut self, skeleton: &Skeleton) {
        self.accumulator = 0.0;
        for index in 0..self.bodies.len().min(skeleton.len()) {
            self.set_simulated(index, false);
            let pose = skeleton.joint_world_pose(index);
            if let Some(body) = self.rigid_body_set.get_mut(self.bodies[index].body_handle) {
                body.set_position(to_isometry(pose.position, pose.rotation), true);
                body.set_linvel(vector![0.0, 0.0, 0.0], false);
                body.set_angvel(vector![0.0, 0.0, 0.0], false);
            }
        }
    }

    pub fn set_gravity(&mut self, gravity_y: f32) {
        self.gravity = vector![0.0, gravity_y, 0.0];
    }

    pub fn body_handle(&self, joint: usize) -> Option<RigidBodyHandle> {
        self.bodies.get(joint).map(|rb| rb.body_handle)
    }

    pub fn ground_handle(&self) -> RigidBodyHandle {
        self.ground_handle
    }

    pub fn joint_name(&self, joint: usize) -> Option<&str> {
        self.bodies.get(joint).map(|rb| rb.joint_name.as_str())
    }

    pub fn is_simulated(&self, joint: usize) -> bool {
        self.bodies.get(joint).is_some_and(|rb| rb.simulated)
    }

    pub fn joint_count(&self) -> usize {
        self.impulse_joint_set.len()
    }

    #[inline]
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    fn body(&self, joint: usize) -> Option<&RigidBody> {
        self.bodies
            .get(joint)
            .and_then(|rb| self.rigid_body_set.get(rb.body_handle))
    }
}

impl Default for RapierRagdoll {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsQuery for RapierRagdoll {
    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn body_position(&self, joint: usize) -> Vec3 {
        self.body(joint)
            .map(|body| from_vector(body.translation()))
            .unwrap_or(Vec3::ZERO)
    }

    fn body_rotation(&self, joint: usize) -> Quat {
        self.body(joint)
            .map(|body| from_rotation(body.rotation()))
            .unwrap_or(Quat::IDENTITY)
    }

    fn body_linear_velocity(&self, joint: usize) -> Vec3 {
        self.body(joint)
            .map(|body| from_vector(body.linvel()))
            .unwrap_or(Vec3::ZERO)
    }

    fn set_simulated(&mut self, joint: usize, simulated: bool) {
        let Some(rb) = self.bodies.get_mut(joint) else {
            return;
        };
        if rb.simulated == simulated {
            return;
        }
        rb.simulated = simulated;
        if let Some(body) = self.rigid_body_set.get_mut(rb.body_handle) {
            let body_type = if simulated {
                RigidBodyType::Dynamic
            } else {
                RigidBodyType::KinematicPositionBased
            };
            body.set_body_type(body_type, true);
            // 立即刷新质量属性，同一帧内施加的冲量才能生效
            body.recompute_mass_properties_from_colliders(&self.collider_set);
        }
    }

    fn set_body_pose(&mut self, joint: usize, position: Vec3, rotation: Quat) {
        let Some(rb) = self.bodies.get(joint) else {
            return;
        };
        if rb.simulated {
            return;
        }
        if let Some(body) = self.rigid_body_set.get_mut(rb.body_handle) {
            body.set_position(to_isometry(position, rotation), true);
        }
    }

    fn apply_impulse(&mut self, joint: usize, force: Vec3, at_point: Vec3) {
        let Some(rb) = self.bodies.get(joint) else {
            return;
        };
        if let Some(body) = self.rigid_body_set.get_mut(rb.body_handle) {
            body.apply_impulse_at_point(to_vector(force), to_point(at_point), true);
        }
    }

    fn raycast_down(&self, origin: Vec3) -> Option<Vec3> {
        let ray = Ray::new(to_point(origin), vector![0.0, -1.0, 0.0]);
        // 忽略布娃娃自身的碰撞体
        let filter = QueryFilter::default().groups(InteractionGroups::new(
            Group::ALL,
            Group::ALL.difference(RAGDOLL_GROUP),
        ));

        self.query_pipeline
            .cast_ray(
                &self.rigid_body_set,
                &self.collider_set,
                &ray,
                self.config.max_ray_distance,
                true,
                filter,
            )
            .map(|(_, toi)| {
                let hit = ray.point_at(toi);
                Vec3::new(hit.x, hit.y, hit.z)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::{BonePose, JointDef};

    fn skeleton() -> Skeleton {
        Skeleton::new(vec![
            JointDef::root("hips", BonePose::from_position(Vec3::new(0.0, 1.0, 0.0))),
            JointDef::child("spine", 0, BonePose::from_position(Vec3::new(0.0, 0.4, 0.0))),
            JointDef::child("head", 1, BonePose::from_position(Vec3::new(0.0, 0.4, 0.0))),
        ])
        .unwrap()
    }

    #[test]
    fn test_build_matches_skeleton() {
        let skeleton = skeleton();
        let mut ragdoll = RapierRagdoll::with_config(PhysicsConfig::default());
        ragdoll.build_ragdoll(&skeleton);

        assert_eq!(ragdoll.body_count(), 3);
        assert_eq!(ragdoll.joint_count(), 2);
        assert_eq!(ragdoll.joint_name(2), Some("head"));
        for i in 0..3 {
            assert!(!ragdoll.is_simulated(i));
            assert!(ragdoll
                .body_position(i)
                .abs_diff_eq(skeleton.joint_world_position(i), 1e-5));
        }
    }

    #[test]
    fn test_raycast_down_hits_ground() {
        let mut ragdoll = RapierRagdoll::with_config(PhysicsConfig::default());
        ragdoll.build_ragdoll(&skeleton());

        let hit = ragdoll.raycast_down(Vec3::new(0.3, 5.0, -2.0)).expect("应命中地面");
        assert!((hit.y - 0.0).abs() < 1e-3, "命中高度应为 0，实际 {}", hit.y);
        assert!((hit.x - 0.3).abs() < 1e-5);
        assert!((hit.z + 2.0).abs() < 1e-5);

        // 地面之下向下投射不会命中
        assert!(ragdoll.raycast_down(Vec3::new(0.0, -5.0, 0.0)).is_none());
    }

    #[test]
    fn test_raycast_hits_static_box() {
        let mut ragdoll = RapierRagdoll::with_config(PhysicsConfig::default());
        ragdoll.add_static_box(Vec3::new(0.0, 0.5, 0.0), Vec3::splat(0.5));
        let hit = ragdoll.raycast_down(Vec3::new(0.0, 3.0, 0.0)).unwrap();
        assert!((hit.y - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_simulated_bodies_fall() {
        let skeleton = skeleton();
        let mut ragdoll = RapierRagdoll::with_config(PhysicsConfig::default());
        ragdoll.build_ragdoll(&skeleton);

        for i in 0..skeleton.len() {
            ragdoll.set_simulated(i, true);
        }
        let start = ragdoll.body_position(0);
        for _ in 0..20 {
            ragdoll.step(1.0 / 60.0);
        }
        assert!(ragdoll.body_position(0).y < start.y);
    }

    #[test]
    fn test_kinematic_bodies_follow_pose() {
        let skeleton = skeleton();
        let mut ragdoll = RapierRagdoll::with_config(PhysicsConfig::default());
        ragdoll.build_ragdoll(&skeleton);

        let target = Vec3::new(2.0, 3.0, 4.0);
        ragdoll.set_body_pose(1, target, Quat::from_rotation_y(0.5));
        assert!(ragdoll.body_position(1).abs_diff_eq(target, 1e-5));
        assert!(crate::skeleton::same_rotation(
            ragdoll.body_rotation(1),
            Quat::from_rotation_y(0.5),
            1e-5
        ));

        // 模拟中的刚体不跟随
        ragdoll.set_simulated(1, true);
        ragdoll.set_body_pose(1, Vec3::ZERO, Quat::IDENTITY);
        assert!(ragdoll.body_position(1).abs_diff_eq(target, 1e-5));
    }

    #[test]
    fn test_impulse_pushes_body() {
        let skeleton = Skeleton::new(vec![JointDef::root(
            "hips",
            BonePose::from_position(Vec3::new(0.0, 2.0, 0.0)),
        )])
        .unwrap();
        let mut ragdoll = RapierRagdoll::with_config(PhysicsConfig::default());
        ragdoll.build_ragdoll(&skeleton);
        ragdoll.set_simulated(0, true);
        ragdoll.step(1.0 / 60.0);

        let position = ragdoll.body_position(0);
        ragdoll.apply_impulse(0, Vec3::new(0.0, 50.0, 0.0), position);
        ragdoll.step(1.0 / 60.0);
        assert!(ragdoll.body_linear_velocity(0).y > 0.0);
    }

    #[test]
    fn test_zero_gravity_keeps_body_in_place() {
        let skeleton = skeleton();
        let mut ragdoll = RapierRagdoll::from_skeleton(&skeleton);
        ragdoll.set_gravity(0.0);

        assert_ne!(ragdoll.body_handle(0), Some(ragdoll.ground_handle()));
        assert!(ragdoll.body_handle(3).is_none());

        ragdoll.set_simulated(0, true);
        let start = ragdoll.body_position(0);
        for _ in 0..10 {
            ragdoll.step(1.0 / 60.0);
        }
        assert!(ragdoll.body_position(0).abs_diff_eq(start, 1e-4));
    }

    #[test]
    fn test_invalid_step_config_still_simulates() {
        let skeleton = skeleton();
        let mut ragdoll = RapierRagdoll::with_config(PhysicsConfig {
            physics_fps: 0.0,
            max_substep_count: 0,
            ..Default::default()
        });
        ragdoll.build_ragdoll(&skeleton);
        assert!(ragdoll.config().physics_fps > 0.0);
        assert!(ragdoll.config().max_substep_count >= 1);

        for i in 0..skeleton.len() {
            ragdoll.set_simulated(i, true);
        }
        let start = ragdoll.body_position(0);
        for _ in 0..20 {
            ragdoll.step(1.0 / 60.0);
        }
        assert!(ragdoll.body_position(0).y < start.y);
    }

    #[test]
    fn test_reset_to_skeleton() {
        let skeleton = skeleton();
        let mut ragdoll = RapierRagdoll::with_config(PhysicsConfig::default());
        ragdoll.build_ragdoll(&skeleton);
        for i in 0..3 {
            ragdoll.set_simulated(i, true);
        }
        for _ in 0..10 {
            ragdoll.step(1.0 / 60.0);
        }
        ragdoll.reset_to_skeleton(&skeleton);
        for i in 0..3 {
            assert!(!ragdoll.is_simulated(i));
            assert!(ragdoll
                .body_position(i)
                .abs_diff_eq(skeleton.joint_world_position(i), 1e-5));
        }
    }
}
