/*!
    The engine's fixed intermediate formats.

    Every decoder produces, and every encoder consumes, exactly one video
    and one audio format. Keeping these fixed is what makes buffers from
    different decoders interchangeable at the mixer and encoder.

    - Video: packed UYVY422, 2 bytes per pixel. Packed so a frame is one
      contiguous buffer with a single line stride.
    - Audio: interleaved signed 16-bit native-endian PCM, stereo, 44100 Hz.
*/

/// Audio sample type.
pub type Sample = i16;

/// Fixed audio sample rate in Hz.
pub const AUDIO_SAMPLE_RATE: u32 = 44100;

/// Fixed audio channel count (stereo).
pub const AUDIO_CHANNELS: u32 = 2;

/// Bytes per audio sample (signed 16-bit).
pub const AUDIO_BYTES_PER_SAMPLE: usize = size_of::<Sample>();

/// Byte value representing silence in the audio format.
pub const AUDIO_SILENCE: u8 = 0;

/// Minimum representable sample value.
pub const AUDIO_SAMPLE_MIN: Sample = i16::MIN;

/// Maximum representable sample value.
pub const AUDIO_SAMPLE_MAX: Sample = i16::MAX;

/// Bytes per pixel of the packed UYVY422 video format.
pub const VIDEO_BYTES_PER_PIXEL: usize = 2;

/**
    Bytes occupied by one interleaved audio sample across all channels.
*/
pub const fn bytes_per_interleaved_sample() -> usize {
    AUDIO_BYTES_PER_SAMPLE * AUDIO_CHANNELS as usize
}

static_assertions::const_assert_eq!(bytes_per_interleaved_sample(), 4);
static_assertions::const_assert_eq!(AUDIO_BYTES_PER_SAMPLE, 2);
