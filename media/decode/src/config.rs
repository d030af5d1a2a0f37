/*!
    Decoder configuration types.
*/

/**
    Configuration for a [`crate::Decoder`].

    All fields have explicit defaults: zero bounds (fall back to the
    session's dimensions), no seek, unity volume, nothing discarded.
*/
#[derive(Clone, Debug)]
pub struct DecoderConfig {
    /// Maximum decoded frame width; 0 uses the session's default width.
    pub max_width: u32,
    /// Maximum decoded frame height; 0 uses the session's default height.
    pub max_height: u32,
    /// Number of target-rate frames to skip before the first decode.
    pub start_frame: i64,
    /// User-facing volume in 0..=1; mapped through [`effective_gain`].
    pub volume: f32,
    /// Never open the video stream; `has_video` reports false.
    pub discard_video: bool,
    /// Never open the audio stream; `has_audio` reports false.
    pub discard_audio: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_width: 0,
            max_height: 0,
            start_frame: 0,
            volume: 1.0,
            discard_video: false,
            discard_audio: false,
        }
    }
}

impl DecoderConfig {
    /**
        Create a config with default settings.
    */
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Set the maximum decoded frame bounds.
    */
    pub fn with_bounds(mut self, max_width: u32, max_height: u32) -> Self {
        self.max_width = max_width;
        self.max_height = max_height;
        self
    }

    /**
        Seek forward by `start_frame` target-rate frames before decoding.
    */
    pub fn with_start_frame(mut self, start_frame: i64) -> Self {
        self.start_frame = start_frame;
        self
    }

    /**
        Set the user-facing volume (0..=1).
    */
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    /**
        Suppress the video stream entirely.
    */
    pub fn discard_video(mut self) -> Self {
        self.discard_video = true;
        self
    }

    /**
        Suppress the audio stream entirely.
    */
    pub fn discard_audio(mut self) -> Self {
        self.discard_audio = true;
        self
    }
}

/**
    Map a user-facing volume in 0..=1 to the effective per-sample gain.

    Perceived loudness is roughly exponential in the control position, so
    the linear control value is shaped as `exp(6.908 * v) / 1000`, giving
    0.001 at the bottom of the range and unity at the top. Below a gain
    of 0.1 the curve is squared and rescaled (`g * g * 10`) to keep the
    quiet end of the control usable.

    Volumes at or above 1 are unity gain; at or below 0 the gain is zero
    (callers treat that as "audio disabled").
*/
pub fn effective_gain(volume: f32) -> f32 {
    if volume <= 0.0 {
        return 0.0;
    }
    if volume >= 1.0 {
        return 1.0;
    }
    let mut gain = (6.908 * volume as f64).exp() / 1000.0;
    if gain < 0.1 {
        gain = gain * gain * 10.0;
    }
    gain as f32
}
