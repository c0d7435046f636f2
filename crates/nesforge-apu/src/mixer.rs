//! Non-linear audio mixer with the NES analog output filter chain.
//!
//! The APU combines its five channels with two non-linear curves that
//! approximate the behavior of the real hardware's summing resistor network:
//!
//! ```text
//! pulse_out = 95.52 / (8128.0 / (pulse1 + pulse2) + 100.0)
//! tnd_out   = 163.67 / (24329.0 / (3*triangle + 2*noise + dmc) + 100.0)
//! mix       = pulse_out + tnd_out
//! ```
//!
//! The result is then run through three one-pole IIR filters in series —
//! two high-pass stages (90 Hz, 440 Hz) and one low-pass stage (14 kHz) —
//! matching the analog filtering the NES performs between the APU and the
//! RF/composite output. Lookup tables turn the non-linear mixing curves
//! into two array reads plus an addition.

/// One-pole IIR filter shared shape for both high-pass and low-pass stages.
///
/// Coefficients are derived once from the cutoff frequency and sample rate
/// and then applied as a simple difference equation every sample.
#[derive(Debug, Clone, Copy)]
struct OnePoleFilter {
    alpha: f32,
    prev_input: f32,
    prev_output: f32,
    high_pass: bool,
}

impl OnePoleFilter {
    fn high_pass(cutoff_hz: f32, sample_rate: f32) -> Self {
        let rc = 1.0 / (2.0 * core::f32::consts::PI * cutoff_hz);
        let dt = 1.0 / sample_rate;
        Self {
            alpha: rc / (rc + dt),
            prev_input: 0.0,
            prev_output: 0.0,
            high_pass: true,
        }
    }

    fn low_pass(cutoff_hz: f32, sample_rate: f32) -> Self {
        let rc = 1.0 / (2.0 * core::f32::consts::PI * cutoff_hz);
        let dt = 1.0 / sample_rate;
        Self {
            alpha: dt / (rc + dt),
            prev_input: 0.0,
            prev_output: 0.0,
            high_pass: false,
        }
    }

    fn process(&mut self, input: f32) -> f32 {
        let output = if self.high_pass {
            self.alpha * (self.prev_output + input - self.prev_input)
        } else {
            self.prev_output + self.alpha * (input - self.prev_output)
        };
        self.prev_input = input;
        self.prev_output = output;
        output
    }

    fn reset(&mut self) {
        self.prev_input = 0.0;
        self.prev_output = 0.0;
    }
}

/// The six channels a recording session can tap: one per voice plus the
/// final filtered mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingChannel {
    /// Pulse channel 1.
    Pulse0,
    /// Pulse channel 2.
    Pulse1,
    /// Triangle channel.
    Triangle,
    /// Noise channel.
    Noise,
    /// DMC channel (always silent; see [`crate::dmc`]).
    Dmc,
    /// Fully mixed and filtered output.
    Mix,
}

impl RecordingChannel {
    /// All six channels, in the order recording sinks are created.
    pub const ALL: [RecordingChannel; 6] = [
        RecordingChannel::Pulse0,
        RecordingChannel::Pulse1,
        RecordingChannel::Triangle,
        RecordingChannel::Noise,
        RecordingChannel::Dmc,
        RecordingChannel::Mix,
    ];

    /// Short name used to label a per-channel recording sink.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            RecordingChannel::Pulse0 => "pulse_0",
            RecordingChannel::Pulse1 => "pulse_1",
            RecordingChannel::Triangle => "triangle",
            RecordingChannel::Noise => "noise",
            RecordingChannel::Dmc => "dmc",
            RecordingChannel::Mix => "mix",
        }
    }
}

/// One sample from every recordable channel, produced per mixer tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelSamples {
    /// Pulse channel 1 sample, normalized 0.0-1.0.
    pub pulse0: f32,
    /// Pulse channel 2 sample, normalized 0.0-1.0.
    pub pulse1: f32,
    /// Triangle channel sample, normalized 0.0-1.0.
    pub triangle: f32,
    /// Noise channel sample, normalized 0.0-1.0.
    pub noise: f32,
    /// DMC channel sample (always 0.0).
    pub dmc: f32,
    /// Mixed and filtered output sample.
    pub mix: f32,
}

impl ChannelSamples {
    /// Fetch the sample for a given recording channel.
    #[must_use]
    pub fn get(&self, channel: RecordingChannel) -> f32 {
        match channel {
            RecordingChannel::Pulse0 => self.pulse0,
            RecordingChannel::Pulse1 => self.pulse1,
            RecordingChannel::Triangle => self.triangle,
            RecordingChannel::Noise => self.noise,
            RecordingChannel::Dmc => self.dmc,
            RecordingChannel::Mix => self.mix,
        }
    }
}

/// Non-linear mixer with the NES output filter chain.
#[derive(Debug, Clone)]
pub struct Mixer {
    pulse_table: [f32; 31],
    tnd_table: [f32; 203],
    high_pass_90: OnePoleFilter,
    high_pass_440: OnePoleFilter,
    low_pass_14k: OnePoleFilter,
}

impl Mixer {
    /// Create a mixer whose IIR filters are tuned for `sample_rate` Hz
    /// (the rate samples are produced at, i.e. the *output* rate, not the
    /// CPU clock).
    #[must_use]
    pub fn new(sample_rate: u32) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let rate = sample_rate as f32;
        Self {
            pulse_table: Self::generate_pulse_table(),
            tnd_table: Self::generate_tnd_table(),
            high_pass_90: OnePoleFilter::high_pass(90.0, rate),
            high_pass_440: OnePoleFilter::high_pass(440.0, rate),
            low_pass_14k: OnePoleFilter::low_pass(14_000.0, rate),
        }
    }

    fn generate_pulse_table() -> [f32; 31] {
        let mut table = [0.0f32; 31];
        for (i, entry) in table.iter_mut().enumerate().skip(1) {
            #[allow(clippy::cast_precision_loss)]
            let i = i as f32;
            *entry = 95.52 / (8128.0 / i + 100.0);
        }
        table
    }

    fn generate_tnd_table() -> [f32; 203] {
        let mut table = [0.0f32; 203];
        for (i, entry) in table.iter_mut().enumerate().skip(1) {
            #[allow(clippy::cast_precision_loss)]
            let i = i as f32;
            *entry = 163.67 / (24329.0 / i + 100.0);
        }
        table
    }

    /// Mix one sample's worth of channel outputs, running the result
    /// through the high-pass/high-pass/low-pass filter chain.
    ///
    /// `pulse1`/`pulse2` are 0-15, `triangle`/`noise` are 0-15, `dmc` is
    /// always 0 in this core.
    pub fn mix(&mut self, pulse1: u8, pulse2: u8, triangle: u8, noise: u8, dmc: u8) -> ChannelSamples {
        let pulse_index = usize::from(pulse1) + usize::from(pulse2);
        let tnd_index = 3 * usize::from(triangle) + 2 * usize::from(noise) + usize::from(dmc);

        let pulse_out = self.pulse_table[pulse_index.min(30)];
        let tnd_out = self.tnd_table[tnd_index.min(202)];
        let raw = pulse_out + tnd_out;

        let filtered = self.low_pass_14k.process(
            self.high_pass_440
                .process(self.high_pass_90.process(raw)),
        );

        ChannelSamples {
            pulse0: self.pulse_table[usize::from(pulse1).min(30)],
            pulse1: self.pulse_table[usize::from(pulse2).min(30)],
            triangle: self.tnd_table[(3 * usize::from(triangle)).min(202)],
            noise: self.tnd_table[(2 * usize::from(noise)).min(202)],
            dmc: 0.0,
            mix: filtered,
        }
    }

    /// Reset filter state (e.g. after a console reset) without recomputing
    /// the lookup tables.
    pub fn reset_filters(&mut self) {
        self.high_pass_90.reset();
        self.high_pass_440.reset();
        self.low_pass_14k.reset();
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new(48_000)
    }
}
