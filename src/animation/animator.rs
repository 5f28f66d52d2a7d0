//! 动画状态播放器
//!
//! 每个状态播放一个片段；非循环状态播放结束后切换到 `next` 状态，
//! 外部通过 `is_current_state` 判断某个状态是否已播完。

use std::collections::HashMap;

use crate::skeleton::Skeleton;
use super::clip::AnimationClip;
use super::AnimationPlayback;

/// 动画状态
#[derive(Debug, Clone)]
pub struct AnimatorState {
    pub name: String,
    /// 播放的片段名称
    pub clip: String,
    /// 播放结束后切换到的状态
    pub next: Option<String>,
    pub looping: bool,
}

impl AnimatorState {
    pub fn new(name: impl Into<String>, clip: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            clip: clip.into(),
            next: None,
            looping: false,
        }
    }

    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }

    pub fn then(mut self, next: impl Into<String>) -> Self {
        self.next = Some(next.into());
        self
    }
}

/// 关键帧动画播放器
#[derive(Debug, Clone, Default)]
pub struct Animator {
    clips: HashMap<String, AnimationClip>,
    states: HashMap<String, AnimatorState>,
    default_state: Option<String>,
    current_state: Option<String>,
    /// 当前状态已播放时间（秒）
    state_time: f32,
    enabled: bool,
}

impl Animator {
    pub fn new() -> Self {
        Self {
            enabled: true,
            ..Default::default()
        }
    }

    pub fn add_clip(&mut self, clip: AnimationClip) {
        self.clips.insert(clip.name.clone(), clip);
    }

    pub fn add_state(&mut self, state: AnimatorState) {
        self.states.insert(state.name.clone(), state);
    }

    /// 默认状态（启用后尚未播放任何状态时进入）
    pub fn set_default_state(&mut self, name: impl Into<String>) {
        self.default_state = Some(name.into());
    }

    pub fn clip(&self, name: &str) -> Option<&AnimationClip> {
        self.clips.get(name)
    }

    pub fn current_state_name(&self) -> Option<&str> {
        self.current_state.as_deref()
    }

    pub fn state_time(&self) -> f32 {
        self.state_time
    }

    /// 当前状态播放结束后的切换
    fn finish_state(&mut self, state: &AnimatorState, duration: f32) {
        if state.looping {
            if duration > 0.0 {
                self.state_time %= duration;
            } else {
                self.state_time = 0.0;
            }
            return;
        }

        match state.next.as_deref() {
            Some(next) if self.states.contains_key(next) => {
                log::debug!("动画状态 '{}' 播放结束 → '{}'", state.name, next);
                self.state_time = (self.state_time - duration).max(0.0);
                self.current_state = Some(next.to_string());
            }
            Some(next) => {
                log::warn!("动画状态 '{}' 的后继状态 '{}' 不存在", state.name, next);
                self.state_time = duration;
            }
            None => self.state_time = duration,
        }
    }
}

impl AnimationPlayback for Animator {
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
        self.states.contains_key(state)
    }

    fn sample_clip(&mut self, clip: &str, time: f32, skeleton: &mut Skeleton) -> bool {
        match self.clips.get(clip) {
            Some(clip) => {
                clip.sample(time, skeleton);
                true
            }
            None => false,
        }
    }

    fn play_state(&mut self, state: &str) {
        if self.states.contains_key(state) {
            self.current_state = Some(state.to_string());
            self.state_time = 0.0;
        } else {
            log::warn!("动画状态不存在: {}", state);
        }
    }

    fn is_current_state(&self, state: &str) -> bool {
        self.current_state.as_deref() == Some(state)
    }

    fn advance(&mut self, dt: f32, skeleton: &mut Skeleton) {
        if !self.enabled {
            return;
        }
        if self.current_state.is_none() {
            match self.default_state.clone() {
                Some(default) => self.play_state(&default),
                None => return,
            }
        }

        let Some(state) = self
            .current_state
            .as_ref()
            .and_then(|name| self.states.get(name))
            .cloned()
        else {
            return;
        };
        let Some(duration) = self.clips.get(&state.clip).map(AnimationClip::duration) else {
            log::warn!("动画状态 '{}' 引用的片段 '{}' 不存在", state.name, state.clip);
            return;
        };

        self.state_time += dt.max(0.0);
        if self.state_time >= duration {
            self.finish_state(&state, duration);
        }

        let Some(clip_name) = self
            .current_state
            .as_ref()
            .and_then(|name| self.states.get(name))
            .map(|s| s.clip.clone())
        else {
            return;
        };
        if let Some(clip) = self.clips.get(&clip_name) {
            clip.sample(self.state_time, skeleton);
        }
    }
}
