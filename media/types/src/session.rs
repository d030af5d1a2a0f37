/*!
    Session: the shared format parameters of a media pipeline.
*/

use crate::format;
use crate::{Error, Rational, Result};

/**
    Shared format parameters for a set of decoders, encoders and mixers.

    A session fixes the target frame rate and, optionally, default frame
    dimensions. From the frame rate it derives the number of audio samples
    in one frame interval and therefore the exact byte size of an audio
    frame buffer. Every component constructed against the same session
    produces and consumes buffers of that size, which is what allows audio
    from different decoders to meet in one mixer or encoder.

    Sessions are immutable after construction and cheap to clone; share
    them freely across components.
*/
#[derive(Clone, Debug)]
pub struct Session {
    frame_rate: Rational,
    dimensions: Option<(u32, u32)>,
    samples_per_frame: usize,
}

impl Session {
    /**
        Create a session with the given target frame rate.

        Returns [`Error::InvalidUsage`] if the frame rate is not positive.
    */
    pub fn new(frame_rate: Rational) -> Result<Self> {
        if !frame_rate.is_positive() {
            return Err(Error::invalid_usage(format!(
                "invalid frame rate {frame_rate}"
            )));
        }
        let interval = frame_rate.invert();
        let samples = interval.rescale(1, Rational::new(1, format::AUDIO_SAMPLE_RATE as i32));
        Ok(Self {
            frame_rate,
            dimensions: None,
            samples_per_frame: samples as usize,
        })
    }

    /**
        Create a session with default frame dimensions.

        The dimensions act as the fallback bound for decoders and the
        fallback target size for encoders whose configs leave their own
        dimensions unset. Width must be even (UYVY422 pairs pixels) and
        both dimensions must be positive.
    */
    pub fn with_dimensions(frame_rate: Rational, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 || width % 2 != 0 {
            return Err(Error::invalid_usage(format!(
                "invalid frame dimensions {width}x{height}"
            )));
        }
        let mut session = Self::new(frame_rate)?;
        session.dimensions = Some((width, height));
        Ok(session)
    }

    /**
        The session's target frame rate.
    */
    pub fn frame_rate(&self) -> Rational {
        self.frame_rate
    }

    /**
        Default frame dimensions, if the session was created with any.
    */
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }

    /**
        Audio samples per channel in one video frame interval.
    */
    pub fn samples_per_frame(&self) -> usize {
        self.samples_per_frame
    }

    /**
        Byte size of one frame interval of audio.

        This is the exact size a decoder fills per `decode_audio` call,
        the size an encoder consumes per `encode_audio` call, and the size
        the mixer requires of every buffer. 30 fps yields 5880 bytes,
        25 fps yields 7056.
    */
    pub fn audio_framebuffer_size(&self) -> usize {
        self.samples_per_frame * format::bytes_per_interleaved_sample()
    }

    /**
        Allocate a zeroed audio buffer of exactly
        [`audio_framebuffer_size`](Self::audio_framebuffer_size) bytes.
    */
    pub fn create_audio_buffer(&self) -> Vec<u8> {
        vec![format::AUDIO_SILENCE; self.audio_framebuffer_size()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framebuffer_size_at_30fps() {
        let session = Session::new(Rational::new(30, 1)).unwrap();
        assert_eq!(session.samples_per_frame(), 1470);
        assert_eq!(session.audio_framebuffer_size(), 5880);
    }

    #[test]
    fn framebuffer_size_at_25fps() {
        let session = Session::new(Rational::new(25, 1)).unwrap();
        assert_eq!(session.audio_framebuffer_size(), 7056);
    }

    #[test]
    fn framebuffer_size_at_15fps() {
        // Third data point pinning the 44100 Hz constant
        let session = Session::new(Rational::new(15, 1)).unwrap();
        assert_eq!(session.audio_framebuffer_size(), 11760);
    }

    #[test]
    fn framebuffer_size_rounds_fractional_intervals() {
        // 29.97 fps: 1471.47 samples rounds to 1471
        let session = Session::new(Rational::new(30000, 1001)).unwrap();
        assert_eq!(session.samples_per_frame(), 1471);
        assert_eq!(session.audio_framebuffer_size(), 5884);
    }

    #[test]
    fn create_audio_buffer_is_zeroed() {
        let session = Session::new(Rational::new(25, 1)).unwrap();
        let buffer = session.create_audio_buffer();
        assert_eq!(buffer.len(), 7056);
        assert!(buffer.iter().all(|&b| b == 0));
    }

    #[test]
    fn rejects_invalid_frame_rate() {
        assert!(Session::new(Rational::new(0, 1)).is_err());
        assert!(Session::new(Rational::new(-30, 1)).is_err());
        assert!(Session::new(Rational::new(30, -1)).is_err());
    }

    #[test]
    fn rejects_invalid_dimensions() {
        let rate = Rational::new(30, 1);
        assert!(Session::with_dimensions(rate, 0, 100).is_err());
        assert!(Session::with_dimensions(rate, 100, 0).is_err());
        // Odd width cannot be expressed in UYVY422
        assert!(Session::with_dimensions(rate, 321, 240).is_err());
    }

    #[test]
    fn dimensions_are_optional() {
        let rate = Rational::new(30, 1);
        assert_eq!(Session::new(rate).unwrap().dimensions(), None);
        assert_eq!(
            Session::with_dimensions(rate, 320, 240).unwrap().dimensions(),
            Some((320, 240))
        );
    }
}
