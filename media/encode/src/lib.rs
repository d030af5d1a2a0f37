/*!
    Media encoding for the rawmill media engine.

    Writes the engine's fixed intermediate formats straight into a
    QuickTime/MOV container: packed UYVY422 video as `rawvideo` and
    44100 Hz stereo S16 audio as `pcm_s16le`. No transcoding happens
    here, which keeps encoding cheap enough to run inline with playback.

    # Example

    ```ignore
    use rawmill_types::{Rational, Session};
    use rawmill_encode::{Encoder, EncoderConfig};

    let session = Session::new(Rational::new(30, 1))?;
    let config = EncoderConfig::new().with_dimensions(320, 240);
    let mut encoder = Encoder::open("out.mov", &session, config)?;

    for _ in 0..frames {
        encoder.encode_video(&video_frame, linesize)?;
        encoder.encode_audio(&audio_frame)?;
    }
    encoder.close()?;
    ```
*/

pub use rawmill_types::{Error, Rational, Result, Session};

mod config;
mod encoder;

pub use config::EncoderConfig;
pub use encoder::Encoder;
