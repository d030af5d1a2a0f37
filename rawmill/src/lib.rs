/*!
    # rawmill

    A frame-paced media engine: decode any media file into fixed
    intermediate formats, mix audio from multiple sources, and write the
    result back out as a MOV file — all clocked by a single session
    frame rate.

    The engine is built from four pieces that meet at the [`Session`]:

    - [`Decoder`] — opens a media file and serves it one frame interval
      at a time, repeating or skipping source frames to match the
      session rate. Video comes out as packed UYVY422 scaled to fit the
      configured bounds (never upscaled); audio comes out as 44100 Hz
      interleaved stereo S16 with an exponential volume taper applied.
    - [`AudioMixer`] — sums any number of frame-interval audio buffers
      with saturating 16-bit clamping.
    - [`Encoder`] — writes the intermediate formats into a MOV container
      as `rawvideo` and `pcm_s16le`, without transcoding.
    - [`Session`] — fixes the frame rate and derives the exact audio
      buffer size every component shares.

    ```ignore
    use rawmill::{AudioMixer, Decoder, DecoderConfig, Encoder, EncoderConfig, Rational, Session};

    let session = Session::new(Rational::new(30, 1))?;
    let mut a = Decoder::open("a.mov", &session, DecoderConfig::default())?;
    let mut b = Decoder::open("b.mov", &session, DecoderConfig::default())?;
    let mut mixer = AudioMixer::new(&session);
    let mut out = Encoder::open("out.mov", &session, EncoderConfig::new().audio_only())?;

    let mut buf_a = session.create_audio_buffer();
    let mut buf_b = session.create_audio_buffer();
    let mut mixed = session.create_audio_buffer();
    for _ in 0..a.duration().min(b.duration()) {
        a.decode_audio(&mut buf_a)?;
        b.decode_audio(&mut buf_b)?;
        mixer.mix(&[Some(buf_a.as_slice()), Some(buf_b.as_slice())], &mut mixed)?;
        out.encode_audio(&mixed)?;
    }
    out.close()?;
    ```
*/

pub use rawmill_decode::{effective_gain, fit_within, Decoder, DecoderConfig};
pub use rawmill_encode::{Encoder, EncoderConfig};
pub use rawmill_mix::AudioMixer;
pub use rawmill_types::{format, log, Error, LogLevel, Rational, Result, Session};
