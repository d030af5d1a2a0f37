/*!
    PCM audio mixing for the rawmill media engine.

    Sums any number of frame-interval audio buffers into one, clamping to
    the 16-bit sample domain. Inputs may be absent (a decoder that has hit
    end of stream, a track that is momentarily silent) and contribute
    nothing.

    ```ignore
    use rawmill_types::{Rational, Session};
    use rawmill_mix::AudioMixer;

    let session = Session::new(Rational::new(30, 1))?;
    let mut mixer = AudioMixer::new(&session);

    let mut output = session.create_audio_buffer();
    mixer.mix(&[Some(track_a.as_slice()), None, Some(track_c.as_slice())], &mut output)?;
    ```
*/

pub use rawmill_types::{Error, Result, Session};

mod mixer;

pub use mixer::AudioMixer;
