/*!
    Audio resampling into the engine's fixed output format.
*/

use std::collections::VecDeque;

use ffmpeg_next::software::resampling;
use ffmpeg_next::{format::sample, frame, ChannelLayout};

use rawmill_types::format::{self, Sample};
use rawmill_types::{Error, Result};

/// Interleaved S16 output format fed to the fifo.
const OUTPUT_FORMAT: sample::Sample = sample::Sample::I16(sample::Type::Packed);

/**
    Converts decoded audio frames to interleaved stereo S16 at 44100 Hz
    and buffers the result for frame-interval reads.

    The resampling context is built lazily from the first frame and
    rebuilt if the source format changes mid-stream. Converted samples
    pass through a fixed gain (with clamping) before they are buffered,
    and an initial run of samples can be dropped to align reads after a
    coarse container seek.
*/
pub struct AudioPipeline {
    gain: f32,
    resampler: Option<resampling::Context>,
    source: Option<(sample::Sample, ChannelLayout, u32)>,
    fifo: VecDeque<Sample>,
    skip_samples: usize,
}

impl AudioPipeline {
    pub fn new(gain: f32) -> Self {
        Self {
            gain,
            resampler: None,
            source: None,
            fifo: VecDeque::new(),
            skip_samples: 0,
        }
    }

    /**
        Drop the next `samples` interleaved output samples before any
        further buffering.
    */
    pub fn set_skip(&mut self, samples: usize) {
        self.skip_samples = samples;
    }

    /// Interleaved samples currently buffered and ready to read.
    pub fn available(&self) -> usize {
        self.fifo.len()
    }

    /**
        Convert one decoded frame and buffer its output samples.
    */
    pub fn push_frame(&mut self, frame: &frame::Audio) -> Result<()> {
        let source = (frame.format(), frame.channel_layout(), frame.rate());
        if self.resampler.is_none() || self.source != Some(source) {
            let resampler = resampling::Context::get(
                source.0,
                source.1,
                source.2,
                OUTPUT_FORMAT,
                ChannelLayout::STEREO,
                format::AUDIO_SAMPLE_RATE,
            )
            .map_err(|err| Error::codec(format!("failed to create resampler: {err}")))?;
            self.resampler = Some(resampler);
            self.source = Some(source);
        }

        // Capacity covers the rate change plus resampler delay
        let capacity = frame.samples() * format::AUDIO_SAMPLE_RATE as usize
            / (frame.rate().max(1) as usize)
            + 256;
        let mut output = frame::Audio::new(OUTPUT_FORMAT, capacity, ChannelLayout::STEREO);
        output.set_rate(format::AUDIO_SAMPLE_RATE);

        let resampler = self.resampler.as_mut().ok_or_else(|| {
            Error::codec("resampler context missing after initialization".to_string())
        })?;
        resampler
            .run(frame, &mut output)
            .map_err(|err| Error::codec(format!("failed to resample frame: {err}")))?;

        self.buffer_output(&output);
        Ok(())
    }

    /**
        Drain any samples still delayed inside the resampler.
    */
    pub fn flush(&mut self) -> Result<()> {
        loop {
            let Some(resampler) = self.resampler.as_mut() else {
                return Ok(());
            };
            let mut output = frame::Audio::new(OUTPUT_FORMAT, 1024, ChannelLayout::STEREO);
            output.set_rate(format::AUDIO_SAMPLE_RATE);
            resampler
                .flush(&mut output)
                .map_err(|err| Error::codec(format!("failed to flush resampler: {err}")))?;
            if output.samples() == 0 {
                break;
            }
            let samples = output.samples();
            self.buffer_converted(&output, samples);
        }
        Ok(())
    }

    fn buffer_output(&mut self, output: &frame::Audio) {
        let samples = output.samples();
        self.buffer_converted(output, samples);
    }

    fn buffer_converted(&mut self, output: &frame::Audio, samples: usize) {
        let bytes = samples * format::bytes_per_interleaved_sample();
        let data = &output.data(0)[..bytes];
        self.buffer_bytes(data);
    }

    fn buffer_bytes(&mut self, data: &[u8]) {
        for bytes in data.chunks_exact(format::AUDIO_BYTES_PER_SAMPLE) {
            if self.skip_samples > 0 {
                self.skip_samples -= 1;
                continue;
            }
            let sample = Sample::from_ne_bytes([bytes[0], bytes[1]]);
            self.fifo.push_back(self.apply_gain(sample));
        }
    }

    fn apply_gain(&self, sample: Sample) -> Sample {
        if self.gain >= 1.0 {
            return sample;
        }
        let scaled = (sample as f32 * self.gain).round();
        scaled.clamp(format::AUDIO_SAMPLE_MIN as f32, format::AUDIO_SAMPLE_MAX as f32) as Sample
    }

    /**
        Fill `buffer` from the fifo, padding the tail with silence when
        fewer samples are buffered than requested.
    */
    pub fn read(&mut self, buffer: &mut [u8]) {
        for bytes in buffer.chunks_exact_mut(format::AUDIO_BYTES_PER_SAMPLE) {
            let sample = self.fifo.pop_front().unwrap_or(0);
            bytes.copy_from_slice(&sample.to_ne_bytes());
        }
    }
}
