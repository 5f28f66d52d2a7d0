//! 骨骼数组
//!
//! 关节按“父节点在前”的顺序存放，索引在整个生命周期内稳定，
//! 所有 BonePose 数组都使用相同顺序。

use std::collections::HashMap;

use glam::{Quat, Vec3};

use crate::{RagdollError, Result};
use super::{BonePose, Joint, JointDef, RootTransform};

/// 骨骼：关节数组 + 角色根变换
#[derive(Clone, Debug)]
pub struct Skeleton {
    joints: Vec<Joint>,
    name_to_index: HashMap<String, usize>,
    root: RootTransform,
}

impl Skeleton {
    /// 构建骨骼
    ///
    /// 要求：非空；0 号关节无父节点；每个父索引小于自身索引；名称唯一。
    pub fn new(defs: Vec<JointDef>) -> Result<Self> {
        if defs.is_empty() {
            return Err(RagdollError::EmptySkeleton);
        }
        if let Some(parent) = defs[0].parent {
            return Err(RagdollError::InvalidJointParent { joint: 0, parent });
        }

        let mut joints = Vec::with_capacity(defs.len());
        let mut name_to_index = HashMap::with_capacity(defs.len());

        for (index, def) in defs.into_iter().enumerate() {
            if let Some(parent) = def.parent {
                if parent >= index {
                    return Err(RagdollError::InvalidJointParent { joint: index, parent });
                }
            }
            if name_to_index.insert(def.name.clone(), index).is_some() {
                return Err(RagdollError::DuplicateJoint(def.name));
            }
            joints.push(Joint::from_def(index, def));
        }

        for i in 0..joints.len() {
            if let Some(parent) = joints[i].parent {
                joints[parent].is_leaf = false;
            }
        }

        let mut skeleton = Self {
            joints,
            name_to_index,
            root: RootTransform::default(),
        };
        skeleton.update_world_transforms();
        Ok(skeleton)
    }

    // ========================================
    // 访问器
    // ========================================

    #[inline]
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    #[inline]
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    #[inline]
    pub fn joint(&self, index: usize) -> Option<&Joint> {
        self.joints.get(index)
    }

    pub fn find_joint(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    #[inline]
    pub fn root(&self) -> &RootTransform {
        &self.root
    }

    /// 移动根变换（子关节的世界缓存需调用 update_world_transforms 刷新）
    pub fn set_root_position(&mut self, position: Vec3) {
        self.root.position = position;
    }

    pub fn set_root_rotation(&mut self, rotation: Quat) {
        self.root.rotation = rotation.normalize();
    }

    #[inline]
    pub fn root_forward(&self) -> Vec3 {
        self.root.forward()
    }

    // ========================================
    // 变换计算
    // ========================================

    /// 父节点世界姿势（无父关节时为根变换）
    fn parent_world(&self, index: usize) -> BonePose {
        match self.joints[index].parent {
            Some(parent) => self.joints[parent].world,
            None => self.root.as_pose(),
        }
    }

    /// 刷新全部世界姿势（父节点在前，单次正向遍历即可）
    pub fn update_world_transforms(&mut self) {
        for i in 0..self.joints.len() {
            let parent_world = self.parent_world(i);
            let local = self.joints[i].local;
            self.joints[i].world = parent_world.mul_pose(&local);
        }
    }

    #[inline]
    pub fn joint_world_pose(&self, index: usize) -> BonePose {
        self.joints[index].world
    }

    #[inline]
    pub fn joint_world_position(&self, index: usize) -> Vec3 {
        self.joints[index].position()
    }

    #[inline]
    pub fn joint_world_rotation(&self, index: usize) -> Quat {
        self.joints[index].rotation()
    }

    #[inline]
    pub fn joint_up(&self, index: usize) -> Vec3 {
        self.joints[index].up()
    }

    #[inline]
    pub fn joint_forward(&self, index: usize) -> Vec3 {
        self.joints[index].forward()
    }

    /// 设置关节世界姿势，并反推局部姿势
    ///
    /// local = inverse(parent_world) * world。父节点的世界缓存必须是最新的；
    /// 子关节的世界缓存不会自动刷新。
    pub fn set_joint_world_pose(&mut self, index: usize, position: Vec3, rotation: Quat) {
        let world = BonePose::new(position, rotation.normalize());
        let local = self.parent_world(index).inverse().mul_pose(&world);
        let joint = &mut self.joints[index];
        joint.local = local;
        joint.world = world;
    }

    #[inline]
    pub fn local_pose(&self, index: usize) -> BonePose {
        self.joints[index].local
    }

    #[inline]
    pub fn set_local_pose(&mut self, index: usize, pose: BonePose) {
        self.joints[index].local = pose;
    }

    /// 把全部局部姿势写入 `out`（长度必须等于关节数）
    pub fn capture_local_poses(&self, out: &mut [BonePose]) {
        debug_assert_eq!(out.len(), self.joints.len());
        for (slot, joint) in out.iter_mut().zip(&self.joints) {
            *slot = joint.local;
        }
    }

    pub fn local_poses(&self) -> Vec<BonePose> {
        self.joints.iter().map(|j| j.local).collect()
    }

    /// 应用整套局部姿势并刷新世界缓存
    pub fn apply_local_poses(&mut self, poses: &[BonePose]) {
        debug_assert_eq!(poses.len(), self.joints.len());
        for (joint, pose) in self.joints.iter_mut().zip(poses) {
            joint.local = *pose;
        }
        self.update_world_transforms();
    }

    /// 恢复初始姿势
    pub fn reset_to_rest(&mut self) {
        for joint in &mut self.joints {
            joint.reset_to_rest();
        }
        self.update_world_transforms();
    }
}
