/*!
    Media decoding for the rawmill media engine.

    This crate opens a media file and exposes it one frame interval at a
    time, paced at the session's target frame rate regardless of the
    source's own rate. Video is scaled to fit the configured bounds
    without upscaling and converted to packed UYVY422; audio is resampled
    to the engine's fixed 44100 Hz stereo S16 format with an exponential
    volume taper applied.

    # Example

    ```ignore
    use rawmill_types::{Rational, Session};
    use rawmill_decode::{Decoder, DecoderConfig};

    let session = Session::new(Rational::new(30, 1))?;
    let config = DecoderConfig::default().with_bounds(1000, 1000);
    let mut decoder = Decoder::open("clip.mov", &session, config)?;

    let mut audio = session.create_audio_buffer();
    for _ in 0..decoder.duration() {
        if decoder.has_video() {
            decoder.decode_video()?;
            // decoder.video_buffer() / width() / height() / linesize()
            // are valid until the next decode_video call
        }
        if decoder.has_audio() {
            decoder.decode_audio(&mut audio)?;
        }
    }
    decoder.close()?;
    ```

    # Pacing

    One `decode_video` call yields one target-rate frame interval: source
    frames are repeated when the source runs slower than the session rate
    and skipped when it runs faster. `decode_audio` always fills exactly
    one frame interval of samples, padding with silence at end of stream.
*/

pub use rawmill_types::{Error, Rational, Result, Session};

mod config;
mod decoder;
mod resample;
mod scale;

pub use config::{effective_gain, DecoderConfig};
pub use decoder::Decoder;
pub use scale::fit_within;
