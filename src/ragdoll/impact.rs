//! 受击：最近刚体选择与冲量计算

use glam::Vec3;

use crate::physics::PhysicsQuery;

/// 一次受击（冲量 + 世界空间命中点）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impact {
    pub force: Vec3,
    pub hit_point: Vec3,
}

impl Impact {
    pub fn new(force: Vec3, hit_point: Vec3) -> Self {
        Self { force, hit_point }
    }

    /// 由攻击者与目标位置构造巴掌冲击，见 [`slap_impulse`]
    pub fn slap(
        attacker: Vec3,
        target: Vec3,
        hit_point: Vec3,
        base_force: f32,
        attacker_speed: f32,
        velocity_multiplier: f32,
    ) -> Self {
        Self::new(
            slap_impulse(attacker, target, base_force, attacker_speed, velocity_multiplier),
            hit_point,
        )
    }
}

/// 距离命中点最近的刚体索引
///
/// 距离相同时取索引最小者；位置非有限的刚体跳过。没有刚体时返回 None。
pub fn nearest_body<P: PhysicsQuery + ?Sized>(physics: &P, hit_point: Vec3) -> Option<usize> {
    let mut nearest = None;
    let mut min_distance = f32::INFINITY;

    for index in 0..physics.body_count() {
        let distance = physics.body_position(index).distance(hit_point);
        if !distance.is_finite() {
            continue;
        }
        if distance < min_distance {
            min_distance = distance;
            nearest = Some(index);
        }
    }
    nearest
}

/// 巴掌冲量
///
/// 方向为攻击者指向目标，Y 分量固定为 1（向上挑起）后归一化；
/// 大小为 `base_force + attacker_speed * velocity_multiplier`。
pub fn slap_impulse(
    attacker: Vec3,
    target: Vec3,
    base_force: f32,
    attacker_speed: f32,
    velocity_multiplier: f32,
) -> Vec3 {
    let mut direction = target - attacker;
    direction.y = 1.0;
    direction.normalize() * (base_force + attacker_speed * velocity_multiplier)
}
