//! Sprite sheet animation clips and playback

use thiserror::Error;

/// Named clips registered on the player sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimKey {
    Run,
    Idle,
}

impl AnimKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnimKey::Run => "run",
            AnimKey::Idle => "idle",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClipError {
    #[error("clip `{key}` uses frame {frame} but the sheet only has {available} frames")]
    FrameOutOfRange {
        key: &'static str,
        frame: u32,
        available: u32,
    },
    #[error("clip `{key}` has no frames")]
    Empty { key: &'static str },
    #[error("clip `{key}` has non-positive frame rate {rate}")]
    BadFrameRate { key: &'static str, rate: f32 },
}

/// A looping sequence of sheet frames played at a fixed rate
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub frames: Vec<u32>,
    /// Frames per second
    pub frame_rate: f32,
}

impl AnimationClip {
    /// Frames `start..=end` of the sheet
    pub fn from_range(start: u32, end: u32, frame_rate: f32) -> Self {
        Self {
            frames: (start..=end).collect(),
            frame_rate,
        }
    }

    pub fn frame_duration(&self) -> f32 {
        1.0 / self.frame_rate
    }
}

/// Clips registered for one sprite sheet
#[derive(Debug, Clone, Default)]
pub struct AnimationSet {
    clips: Vec<(AnimKey, AnimationClip)>,
}

impl AnimationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a clip, checking it against the sheet's frame count.
    /// Re-registering a key replaces the old clip.
    pub fn register(
        &mut self,
        key: AnimKey,
        clip: AnimationClip,
        sheet_frames: u32,
    ) -> Result<(), ClipError> {
        if clip.frames.is_empty() {
            return Err(ClipError::Empty { key: key.as_str() });
        }
        if !(clip.frame_rate > 0.0) {
            return Err(ClipError::BadFrameRate {
                key: key.as_str(),
                rate: clip.frame_rate,
            });
        }
        if let Some(&frame) = clip.frames.iter().find(|&&f| f >= sheet_frames) {
            return Err(ClipError::FrameOutOfRange {
                key: key.as_str(),
                frame,
                available: sheet_frames,
            });
        }

        self.clips.retain(|(k, _)| *k != key);
        self.clips.push((key, clip));
        Ok(())
    }

    pub fn get(&self, key: AnimKey) -> Option<&AnimationClip> {
        self.clips.iter().find(|(k, _)| *k == key).map(|(_, c)| c)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

/// Playback state for one sprite
#[derive(Debug, Clone, Default)]
pub struct Animator {
    current: Option<AnimKey>,
    index: usize,
    elapsed: f32,
}

impl Animator {
    /// Start `key`; does nothing if it is already playing
    pub fn play(&mut self, key: AnimKey) {
        if self.current == Some(key) {
            return;
        }
        self.current = Some(key);
        self.index = 0;
        self.elapsed = 0.0;
    }

    pub fn current(&self) -> Option<AnimKey> {
        self.current
    }

    pub fn advance(&mut self, dt: f32, clips: &AnimationSet) {
        let Some(clip) = self.current.and_then(|k| clips.get(k)) else {
            return;
        };

        self.elapsed += dt;
        let step = clip.frame_duration();
        while self.elapsed >= step {
            self.elapsed -= step;
            self.index = (self.index + 1) % clip.frames.len();
        }
    }

    /// Sheet frame to draw (frame 0 when nothing is playing)
    pub fn frame(&self, clips: &AnimationSet) -> u32 {
        self.current
            .and_then(|k| clips.get(k))
            .and_then(|clip| clip.frames.get(self.index).copied())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::test_support::player_clips;

    #[test]
    fn test_register_rejects_out_of_range() {
        let mut set = AnimationSet::new();
        let err = set
            .register(AnimKey::Run, AnimationClip::from_range(0, 1, 8.0), 1)
            .unwrap_err();
        assert_eq!(
            err,
            ClipError::FrameOutOfRange {
                key: "run",
                frame: 1,
                available: 1
            }
        );
        assert!(set.is_empty());
    }

    #[test]
    fn test_register_replaces() {
        let mut set = player_clips();
        set.register(AnimKey::Idle, AnimationClip::from_range(1, 1, 2.0), 2)
            .unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(AnimKey::Idle).unwrap().frames, vec![1]);
    }

    #[test]
    fn test_run_alternates_every_125ms() {
        let clips = player_clips();
        let mut anim = Animator::default();
        anim.play(AnimKey::Run);
        assert_eq!(anim.frame(&clips), 0);

        anim.advance(0.1, &clips);
        assert_eq!(anim.frame(&clips), 0);
        anim.advance(0.03, &clips);
        assert_eq!(anim.frame(&clips), 1);
        anim.advance(0.125, &clips);
        assert_eq!(anim.frame(&clips), 0);
    }

    #[test]
    fn test_idle_stays_on_frame_zero() {
        let clips = player_clips();
        let mut anim = Animator::default();
        anim.play(AnimKey::Idle);
        for _ in 0..10 {
            anim.advance(0.7, &clips);
            assert_eq!(anim.frame(&clips), 0);
        }
    }

    #[test]
    fn test_play_same_key_does_not_restart() {
        let clips = player_clips();
        let mut anim = Animator::default();
        anim.play(AnimKey::Run);
        anim.advance(0.13, &clips);
        assert_eq!(anim.frame(&clips), 1);

        anim.play(AnimKey::Run);
        assert_eq!(anim.frame(&clips), 1);

        anim.play(AnimKey::Idle);
        assert_eq!(anim.current(), Some(AnimKey::Idle));
        assert_eq!(anim.frame(&clips), 0);
    }
}
