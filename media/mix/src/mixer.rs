/*!
    Audio mixer implementation.
*/

use rawmill_types::format::{self, Sample};
use rawmill_types::{Error, Result, Session};

/**
    Mixes N frame-interval PCM buffers into one.

    Every present input and the output must be exactly the session's
    `audio_framebuffer_size`. Summation happens in i32 and the result is
    clamped to the 16-bit sample domain, so stacking loud inputs saturates
    instead of wrapping.

    The mixer holds a reusable accumulator sized to the session's frame
    interval; it is allocated once and never shrinks.
*/
pub struct AudioMixer {
    framebuffer_size: usize,
    accumulator: Vec<i32>,
}

impl AudioMixer {
    /**
        Create a mixer for buffers of the session's audio frame size.
    */
    pub fn new(session: &Session) -> Self {
        let total_samples = session.samples_per_frame() * format::AUDIO_CHANNELS as usize;
        Self {
            framebuffer_size: session.audio_framebuffer_size(),
            accumulator: vec![0i32; total_samples],
        }
    }

    /**
        Mix `inputs` into `output`, overwriting it entirely.

        Absent inputs are treated as silence. Returns
        [`Error::InvalidUsage`] if the output or any present input is not
        exactly the session's audio frame size.
    */
    pub fn mix(&mut self, inputs: &[Option<&[u8]>], output: &mut [u8]) -> Result<()> {
        if output.len() != self.framebuffer_size {
            return Err(Error::invalid_usage(format!(
                "output buffer is {} bytes, expected {}",
                output.len(),
                self.framebuffer_size
            )));
        }
        for (index, input) in inputs.iter().enumerate() {
            if let Some(buffer) = input {
                if buffer.len() != self.framebuffer_size {
                    return Err(Error::invalid_usage(format!(
                        "input buffer {index} is {} bytes, expected {}",
                        buffer.len(),
                        self.framebuffer_size
                    )));
                }
            }
        }

        let total_samples = self.framebuffer_size / format::AUDIO_BYTES_PER_SAMPLE;
        if self.accumulator.len() < total_samples {
            self.accumulator.resize(total_samples, 0);
        }
        let acc = &mut self.accumulator[..total_samples];
        acc.fill(0);

        for buffer in inputs.iter().flatten() {
            for (sum, bytes) in acc
                .iter_mut()
                .zip(buffer.chunks_exact(format::AUDIO_BYTES_PER_SAMPLE))
            {
                *sum += Sample::from_ne_bytes([bytes[0], bytes[1]]) as i32;
            }
        }

        for (sum, bytes) in acc
            .iter()
            .zip(output.chunks_exact_mut(format::AUDIO_BYTES_PER_SAMPLE))
        {
            let clamped =
                (*sum).clamp(format::AUDIO_SAMPLE_MIN as i32, format::AUDIO_SAMPLE_MAX as i32);
            bytes.copy_from_slice(&(clamped as Sample).to_ne_bytes());
        }

        Ok(())
    }
}
