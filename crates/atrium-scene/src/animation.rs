//! Named-clip animation playback with crossfade
//!
//! Clip contents are opaque here (assets are handed in by the loader); the
//! player tracks which clip is active, playback time, and the crossfade
//! from the previously active clip.

use std::collections::HashMap;

/// Metadata for one registered clip
#[derive(Debug, Clone)]
struct Clip {
    duration: f32,
    looping: bool,
}

/// Playback state over a set of named clips.
///
/// Requesting a clip that was never registered logs a warning and leaves
/// the current clip playing; it is never fatal.
pub struct AnimationPlayer {
    clips: HashMap<String, Clip>,
    current: Option<String>,
    /// Clip fading out, with seconds of fade remaining
    fading_out: Option<(String, f32)>,
    fade_duration: f32,
    time: f32,
    paused: bool,
}

impl AnimationPlayer {
    pub fn new() -> Self {
        Self::with_fade_duration(0.3)
    }

    pub fn with_fade_duration(fade_duration: f32) -> Self {
        Self {
            clips: HashMap::new(),
            current: None,
            fading_out: None,
            fade_duration,
            time: 0.0,
            paused: false,
        }
    }

    /// Register a clip. Overwrites any existing clip with the same name.
    pub fn add_clip(&mut self, name: impl Into<String>, duration: f32, looping: bool) {
        self.clips.insert(name.into(), Clip { duration, looping });
    }

    /// Check if a clip is registered.
    pub fn has_clip(&self, name: &str) -> bool {
        self.clips.contains_key(name)
    }

    /// Switch to a clip, crossfading from the one currently playing.
    ///
    /// No-op if the clip is already active; warns and no-ops if unknown.
    pub fn play(&mut self, name: &str) {
        if !self.clips.contains_key(name) {
            log::warn!("animation clip not found: {name}");
            return;
        }

        if self.current.as_deref() == Some(name) {
            return;
        }

        if let Some(previous) = self.current.take() {
            self.fading_out = Some((previous, self.fade_duration));
        }
        self.current = Some(name.to_string());
        self.time = 0.0;
    }

    /// Freeze playback (used while the world is paused)
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume playback
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Name of the active clip, if any
    pub fn current_animation(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Blend weight of the active clip (ramps 0 -> 1 across the crossfade)
    pub fn fade_in_weight(&self) -> f32 {
        match &self.fading_out {
            Some((_, remaining)) if self.fade_duration > 0.0 => {
                1.0 - (remaining / self.fade_duration).clamp(0.0, 1.0)
            }
            _ => 1.0,
        }
    }

    /// Playback time within the active clip
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Advance playback by `delta` seconds
    pub fn update(&mut self, delta: f32) {
        if self.paused {
            return;
        }

        if let Some(name) = &self.current {
            if let Some(clip) = self.clips.get(name) {
                self.time += delta;
                if clip.looping && clip.duration > 0.0 {
                    self.time %= clip.duration;
                } else {
                    self.time = self.time.min(clip.duration);
                }
            }
        }

        if let Some((_, remaining)) = &mut self.fading_out {
            *remaining -= delta;
            if *remaining <= 0.0 {
                self.fading_out = None;
            }
        }
    }
}

impl Default for AnimationPlayer {
    fn default() -> Self {
        Self::new()
    }
}
