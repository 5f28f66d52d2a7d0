//! 状态机相关的小型枚举

use std::fmt;

/// 引擎状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EngineState {
    /// 动画驱动，全部刚体为运动学
    #[default]
    Idle,
    /// 全部刚体参与模拟，动画停用
    Ragdoll,
    /// 从静止姿势混合到起身姿势
    ResettingBones,
    /// 播放起身动画
    StandingUp,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineState::Idle => "Idle",
            EngineState::Ragdoll => "Ragdoll",
            EngineState::ResettingBones => "ResettingBones",
            EngineState::StandingUp => "StandingUp",
        };
        f.write_str(name)
    }
}

/// 静止时的朝向（每次布娃娃过程只判定一次）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    #[default]
    Up,
    Down,
}

impl Facing {
    #[inline]
    pub fn is_up(self) -> bool {
        self == Facing::Up
    }
}

/// 朝向判定使用的髋骨轴
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacingAxis {
    /// 髋骨 up.y > 0 视为仰面
    #[default]
    Up,
    /// 髋骨 forward.y > 0 视为仰面（骨骼前向轴指向胸口的模型）
    Forward,
}

/// 起身过程中再次受击的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReimpactPolicy {
    /// 放弃当前混合/起身，立即重新进入布娃娃
    #[default]
    Restart,
    /// 忽略冲击，继续起身
    Ignore,
}
