//! Velocity kick detection for wheel streams
//!
//! Trackpads and free-spinning wheels keep emitting wheel events after the
//! physical gesture has ended. Those momentum events decay smoothly, while a
//! fresh gesture shows up as a sharp rise in velocity. The detector keeps a
//! slow EMA baseline and a peak envelope that rises quickly and decays
//! slowly; a run of samples well above the envelope is a *kick*.
//!
//! [`KickSample::is_kick_start`] is an edge, not a level: it is `true` only
//! on the sample where the qualifying streak first reaches
//! [`KickConfig::required_streak`], and stays `false` until a
//! non-qualifying sample breaks the streak.
//!
//! One detector filters one axis.

/// Tuning parameters for [`VelocityKickDetector`]
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct KickConfig {
    /// Time constant of the baseline EMA (ms)
    pub baseline_tau_ms: f32,
    /// Time constant of the envelope when velocity rises above it (ms)
    pub envelope_rise_tau_ms: f32,
    /// Time constant of the envelope decay toward the baseline (ms)
    pub envelope_decay_tau_ms: f32,
    /// Lower clamp for the sample interval (ms)
    pub min_dt_ms: f32,
    /// Upper clamp for the sample interval (ms). Longer gaps start a new episode.
    pub max_dt_ms: f32,
    /// Absolute velocity floor for a qualifying sample (px/ms)
    pub min_velocity: f32,
    /// Required relative excess over the envelope
    pub min_excess_ratio: f32,
    /// Required absolute excess over the envelope (px/ms)
    pub min_excess_abs: f32,
    /// Consecutive qualifying samples that make a kick
    pub required_streak: u32,
}

impl Default for KickConfig {
    fn default() -> Self {
        Self {
            baseline_tau_ms: 100.0,
            envelope_rise_tau_ms: 30.0,
            envelope_decay_tau_ms: 100.0,
            min_dt_ms: 1.0,
            max_dt_ms: 100.0,
            min_velocity: 0.3,
            min_excess_ratio: 0.5,
            min_excess_abs: 0.2,
            required_streak: 2,
        }
    }
}

/// Result of feeding one wheel sample
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct KickSample {
    /// Measured velocity (px/ms); zero for the first sample of an episode
    pub velocity: f32,
    /// Whether this sample exceeded the envelope
    pub qualifies: bool,
    /// Whether this sample completed a kick streak
    pub is_kick_start: bool,
}

/// Per-axis momentum/kick filter
#[derive(Clone, Debug)]
pub struct VelocityKickDetector {
    config: KickConfig,
    baseline: f32,
    envelope: f32,
    streak: u32,
    last_timestamp: Option<u64>,
}

impl VelocityKickDetector {
    pub fn new(config: KickConfig) -> Self {
        Self {
            config,
            baseline: 0.0,
            envelope: 0.0,
            streak: 0,
            last_timestamp: None,
        }
    }

    pub fn config(&self) -> &KickConfig {
        &self.config
    }

    /// Current baseline velocity (px/ms)
    pub fn baseline(&self) -> f32 {
        self.baseline
    }

    /// Current envelope velocity (px/ms)
    pub fn envelope(&self) -> f32 {
        self.envelope
    }

    /// Forget all history
    pub fn reset(&mut self) {
        self.baseline = 0.0;
        self.envelope = 0.0;
        self.streak = 0;
        self.last_timestamp = None;
    }

    /// Feed a wheel delta observed at `timestamp_ms`
    pub fn sample(&mut self, delta: f32, timestamp_ms: u64) -> KickSample {
        let Some(last) = self.last_timestamp else {
            self.begin_episode(timestamp_ms);
            return KickSample::default();
        };

        let raw_dt = timestamp_ms.saturating_sub(last) as f32;
        if raw_dt > self.config.max_dt_ms {
            tracing::trace!(gap_ms = raw_dt, "wheel episode boundary");
            self.begin_episode(timestamp_ms);
            return KickSample::default();
        }
        self.last_timestamp = Some(timestamp_ms);

        let dt = raw_dt
            .max(self.config.min_dt_ms)
            .min(self.config.max_dt_ms)
            .max(f32::EPSILON);
        let velocity = delta.abs() / dt;

        let threshold = (self.envelope * (1.0 + self.config.min_excess_ratio))
            .max(self.envelope + self.config.min_excess_abs);
        let qualifies = velocity >= self.config.min_velocity && velocity >= threshold;

        let mut is_kick_start = false;
        if qualifies {
            self.streak = self.streak.saturating_add(1);
            is_kick_start = self.streak == self.config.required_streak.max(1);
        } else {
            self.streak = 0;
        }

        self.update_envelope(velocity, dt);

        if is_kick_start {
            tracing::trace!(velocity, envelope = self.envelope, "wheel kick");
        }

        KickSample {
            velocity,
            qualifies,
            is_kick_start,
        }
    }

    fn begin_episode(&mut self, timestamp_ms: u64) {
        self.reset();
        self.last_timestamp = Some(timestamp_ms);
    }

    fn update_envelope(&mut self, velocity: f32, dt: f32) {
        self.baseline += (velocity - self.baseline) * smoothing(dt, self.config.baseline_tau_ms);

        if velocity > self.envelope {
            self.envelope +=
                (velocity - self.envelope) * smoothing(dt, self.config.envelope_rise_tau_ms);
        } else {
            let decay = (-dt / self.config.envelope_decay_tau_ms.max(f32::EPSILON)).exp();
            self.envelope = (self.envelope * decay).max(self.baseline);
        }
    }
}

impl Default for VelocityKickDetector {
    fn default() -> Self {
        Self::new(KickConfig::default())
    }
}

/// EMA coefficient for a step of `dt` with time constant `tau`
fn smoothing(dt: f32, tau: f32) -> f32 {
    1.0 - (-dt / tau.max(f32::EPSILON)).exp()
}
