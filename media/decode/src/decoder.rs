/*!
    Paced media file decoder.
*/

use std::collections::VecDeque;
use std::path::Path;

use ffmpeg_next::{codec, ffi, format, frame, media, Packet};

use rawmill_types::format as media_format;
use rawmill_types::log::{self, LogLevel};
use rawmill_types::{Error, Rational, Result, Session};

use crate::config::{effective_gain, DecoderConfig};
use crate::resample::AudioPipeline;
use crate::scale::VideoScaler;

/// Microsecond time base used for container-level seeks.
const CONTAINER_TIME_BASE: Rational = Rational::new(1, ffi::AV_TIME_BASE as i32);

/**
    A media file opened for paced decoding against a [`Session`].

    One `decode_video` call yields one frame interval at the session's
    target rate: source frames are repeated or skipped as needed, so a
    60 fps source decoded against a 30 fps session advances two source
    frames per call and a 15 fps source serves each frame twice. One
    `decode_audio` call fills exactly one frame interval of 44100 Hz
    stereo S16 samples, padded with silence past end of stream.

    Streams the source lacks (or that the config discards) simply report
    `has_video` / `has_audio` as false; decode calls for a missing stream
    are an [`Error::InvalidUsage`].
*/
pub struct Decoder {
    state: Option<DecoderState>,
}

struct DecoderState {
    ictx: format::context::Input,
    video: Option<VideoState>,
    audio: Option<AudioState>,
    samples_per_frame: usize,
    duration: i64,
}

/// Per-stream timing in that stream's own time base.
struct StreamClock {
    time_base: Rational,
    frame_duration: i64,
    start_time: i64,
}

struct VideoState {
    stream_index: usize,
    decoder: codec::decoder::Video,
    scaler: VideoScaler,
    clock: StreamClock,
    packets: VecDeque<Packet>,
    pending: Option<frame::Video>,
    current_frame: i64,
    sent_eof: bool,
    drained: bool,
}

struct AudioState {
    stream_index: usize,
    decoder: codec::decoder::Audio,
    pipeline: AudioPipeline,
    clock: StreamClock,
    packets: VecDeque<Packet>,
    // Seek target pts; resolved against the first decoded frame
    skip_to: Option<i64>,
    sent_eof: bool,
    drained: bool,
}

impl StreamClock {
    fn new(stream: &format::stream::Stream, interval: Rational) -> Self {
        let tb = stream.time_base();
        let time_base = Rational::new(tb.numerator(), tb.denominator());
        let start_time = match stream.start_time() {
            ffi::AV_NOPTS_VALUE => 0,
            start => start,
        };
        Self {
            time_base,
            frame_duration: interval.rescale(1, time_base).max(1),
            start_time,
        }
    }

    /// Number of session-rate frames covering the stream, if it reports
    /// its own duration.
    fn frame_count(&self, stream_duration: i64) -> Option<i64> {
        if stream_duration == ffi::AV_NOPTS_VALUE || stream_duration <= 0 {
            return None;
        }
        Some(ceil_div(stream_duration, self.frame_duration))
    }
}

impl Decoder {
    /**
        Open `path` for decoding against `session`.

        Stream selection, the initial seek, and the volume taper are all
        resolved here; failures surface as [`Error::Open`]. A source with
        neither a usable video nor a usable audio stream is rejected.
    */
    pub fn open(path: impl AsRef<Path>, session: &Session, config: DecoderConfig) -> Result<Self> {
        let path = path.as_ref();
        ffmpeg_next::init().map_err(|err| Error::open(err.to_string()))?;

        let mut ictx = format::input(&path)
            .map_err(|err| Error::open(format!("{}: {err}", path.display())))?;

        let interval = session.frame_rate().invert();
        let gain = effective_gain(config.volume);

        let mut video = None;
        if !config.discard_video {
            if let Some(stream) = ictx.streams().best(media::Type::Video) {
                let decoder = codec::context::Context::from_parameters(stream.parameters())
                    .and_then(|ctx| ctx.decoder().video())
                    .map_err(|err| {
                        Error::open(format!("{}: video decoder: {err}", path.display()))
                    })?;
                let (max_width, max_height) = resolve_bounds(&config, session);
                video = Some(VideoState {
                    stream_index: stream.index(),
                    decoder,
                    scaler: VideoScaler::new(max_width, max_height),
                    clock: StreamClock::new(&stream, interval),
                    packets: VecDeque::new(),
                    pending: None,
                    current_frame: config.start_frame,
                    sent_eof: false,
                    drained: false,
                });
            }
        }

        let mut audio = None;
        if !config.discard_audio && gain > 0.0 {
            if let Some(stream) = ictx.streams().best(media::Type::Audio) {
                let decoder = codec::context::Context::from_parameters(stream.parameters())
                    .and_then(|ctx| ctx.decoder().audio())
                    .map_err(|err| {
                        Error::open(format!("{}: audio decoder: {err}", path.display()))
                    })?;
                let clock = StreamClock::new(&stream, interval);
                let skip_to = (config.start_frame > 0)
                    .then(|| clock.start_time + config.start_frame * clock.frame_duration);
                audio = Some(AudioState {
                    stream_index: stream.index(),
                    decoder,
                    pipeline: AudioPipeline::new(gain),
                    clock,
                    packets: VecDeque::new(),
                    skip_to,
                    sent_eof: false,
                    drained: false,
                });
            }
        }

        if video.is_none() && audio.is_none() {
            return Err(Error::open(format!(
                "{}: no usable audio or video stream",
                path.display()
            )));
        }

        let duration = compute_duration(&ictx, session, video.as_ref(), audio.as_ref())
            .saturating_sub(config.start_frame)
            .max(0);

        if config.start_frame > 0 {
            let ts = interval.rescale(config.start_frame, CONTAINER_TIME_BASE);
            ictx.seek(ts, ..ts)
                .map_err(|err| Error::open(format!("{}: seek: {err}", path.display())))?;
        }

        log::emit(
            LogLevel::Info,
            &format!(
                "opened {} (video: {}, audio: {}, {duration} frames)",
                path.display(),
                video.is_some(),
                audio.is_some(),
            ),
        );

        Ok(Self {
            state: Some(DecoderState {
                ictx,
                video,
                audio,
                samples_per_frame: session.samples_per_frame(),
                duration,
            }),
        })
    }

    /**
        Decode one frame interval of video.

        Returns `Ok(true)` while the source still advances, `Ok(false)`
        once end of stream is reached; the last decoded picture stays
        readable through the buffer accessors either way.
    */
    pub fn decode_video(&mut self) -> Result<bool> {
        let state = self.state_mut()?;
        let DecoderState {
            ictx, video, audio, ..
        } = state;
        let Some(video) = video.as_mut() else {
            return Err(Error::invalid_usage("decoder has no video stream"));
        };

        let expected = video.clock.start_time + video.current_frame * video.clock.frame_duration;
        video.current_frame += 1;

        // Consume source frames up to the expected pts; a frame past it
        // stays pending so slow sources repeat and fast sources skip.
        let mut current = None;
        loop {
            let frame = match video.pending.take() {
                Some(frame) => frame,
                None => match next_video_frame(ictx, video, audio.as_mut())? {
                    Some(frame) => frame,
                    None => break,
                },
            };
            let pts = frame.timestamp().unwrap_or(expected);
            if pts > expected {
                video.pending = Some(frame);
                break;
            }
            current = Some(frame);
        }

        if let Some(frame) = current {
            video.scaler.scale(&frame)?;
            return Ok(true);
        }
        if let Some(frame) = video.pending.as_ref() {
            // A seek can land past the expected pts; the caller still
            // needs a picture to read before that frame's interval comes
            if video.scaler.output().is_none() {
                video.scaler.scale(frame)?;
            }
            return Ok(true);
        }
        Ok(false)
    }

    /**
        Decode one frame interval of audio into `buffer`.

        `buffer` must be exactly the session's `audio_framebuffer_size`;
        use [`Session::create_audio_buffer`]. Past end of stream the
        buffer is filled with silence.
    */
    pub fn decode_audio(&mut self, buffer: &mut [u8]) -> Result<()> {
        let state = self.state_mut()?;
        let expected_len = state.samples_per_frame * media_format::bytes_per_interleaved_sample();
        if buffer.len() != expected_len {
            return Err(Error::invalid_usage(format!(
                "audio buffer is {} bytes, expected {expected_len}",
                buffer.len()
            )));
        }
        let DecoderState {
            ictx, video, audio, ..
        } = state;
        let Some(audio) = audio.as_mut() else {
            return Err(Error::invalid_usage("decoder has no audio stream"));
        };

        let needed = buffer.len() / media_format::AUDIO_BYTES_PER_SAMPLE;
        while audio.pipeline.available() < needed && !audio.drained {
            match next_audio_frame(ictx, audio, video.as_mut())? {
                Some(frame) => {
                    if let Some(target) = audio.skip_to.take() {
                        let skip = seek_skip_samples(&audio.clock, frame.timestamp(), target);
                        audio.pipeline.set_skip(skip);
                    }
                    audio.pipeline.push_frame(&frame)?;
                }
                None => {
                    audio.pipeline.flush()?;
                    audio.drained = true;
                }
            }
        }

        audio.pipeline.read(buffer);
        Ok(())
    }

    /// Total frame intervals, reduced by the configured start frame.
    pub fn duration(&self) -> i64 {
        self.state.as_ref().map_or(0, |state| state.duration)
    }

    pub fn has_video(&self) -> bool {
        self.state
            .as_ref()
            .is_some_and(|state| state.video.is_some())
    }

    pub fn has_audio(&self) -> bool {
        self.state
            .as_ref()
            .is_some_and(|state| state.audio.is_some())
    }

    /// Width of the scaled output, 0 before the first decoded frame.
    pub fn width(&self) -> u32 {
        self.scaled_output().map_or(0, |frame| frame.width())
    }

    /// Height of the scaled output, 0 before the first decoded frame.
    pub fn height(&self) -> u32 {
        self.scaled_output().map_or(0, |frame| frame.height())
    }

    /// Bytes per output row, 0 before the first decoded frame.
    pub fn linesize(&self) -> usize {
        self.scaled_output().map_or(0, |frame| frame.stride(0))
    }

    /**
        The most recently decoded picture as packed UYVY422 bytes.

        Valid until the next `decode_video` call. `None` before the first
        decoded frame.
    */
    pub fn video_buffer(&self) -> Option<&[u8]> {
        self.scaled_output().map(|frame| frame.data(0))
    }

    /**
        Release the file and all codec state.

        Further decode calls return [`Error::InvalidUsage`]. Closing an
        already closed decoder is a no-op.
    */
    pub fn close(&mut self) -> Result<()> {
        if self.state.take().is_some() {
            log::emit(LogLevel::Verbose, "decoder closed");
        }
        Ok(())
    }

    fn scaled_output(&self) -> Option<&frame::Video> {
        self.state
            .as_ref()
            .and_then(|state| state.video.as_ref())
            .and_then(|video| video.scaler.output())
    }

    fn state_mut(&mut self) -> Result<&mut DecoderState> {
        self.state
            .as_mut()
            .ok_or_else(|| Error::invalid_usage("decoder is closed"))
    }
}

impl Drop for Decoder {
    fn drop(&mut self) {
        self.state.take();
    }
}

fn resolve_bounds(config: &DecoderConfig, session: &Session) -> (u32, u32) {
    let (session_width, session_height) = session.dimensions().unwrap_or((0, 0));
    let width = if config.max_width > 0 {
        config.max_width
    } else {
        session_width
    };
    let height = if config.max_height > 0 {
        config.max_height
    } else {
        session_height
    };
    // Unbounded axes decode at source size
    (
        if width > 0 { width } else { u32::MAX },
        if height > 0 { height } else { u32::MAX },
    )
}

/// Read the next packet from the container, or `None` at end of file.
fn read_packet(ictx: &mut format::context::Input) -> Result<Option<Packet>> {
    let mut packet = Packet::empty();
    loop {
        match packet.read(ictx) {
            Ok(()) => return Ok(Some(packet)),
            Err(ffmpeg_next::Error::Eof) => return Ok(None),
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {}
            Err(err) => {
                log::emit(LogLevel::Error, &format!("packet read failed: {err}"));
                return Err(Error::codec(format!("failed to read packet: {err}")));
            }
        }
    }
}

fn next_video_frame(
    ictx: &mut format::context::Input,
    video: &mut VideoState,
    mut audio: Option<&mut AudioState>,
) -> Result<Option<frame::Video>> {
    if video.drained {
        return Ok(None);
    }
    loop {
        let mut frame = frame::Video::empty();
        match video.decoder.receive_frame(&mut frame) {
            Ok(()) => return Ok(Some(frame)),
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {}
            Err(ffmpeg_next::Error::Eof) => {
                video.drained = true;
                return Ok(None);
            }
            Err(err) => {
                log::emit(LogLevel::Error, &format!("video decode failed: {err}"));
                return Err(Error::codec(format!("failed to decode video: {err}")));
            }
        }

        // Decoder wants input; queued packets first, then the demuxer
        let packet = match video.packets.pop_front() {
            Some(packet) => Some(packet),
            None => loop {
                match read_packet(ictx)? {
                    Some(packet) => {
                        if packet.stream() == video.stream_index {
                            break Some(packet);
                        }
                        if let Some(audio) = audio.as_deref_mut() {
                            if packet.stream() == audio.stream_index {
                                audio.packets.push_back(packet);
                            }
                        }
                    }
                    None => break None,
                }
            },
        };

        match packet {
            Some(packet) => send_packet(&mut video.decoder, packet, &mut video.packets)?,
            None => {
                if !video.sent_eof {
                    video
                        .decoder
                        .send_eof()
                        .map_err(|err| Error::codec(format!("failed to flush video: {err}")))?;
                    video.sent_eof = true;
                }
            }
        }
    }
}

fn next_audio_frame(
    ictx: &mut format::context::Input,
    audio: &mut AudioState,
    mut video: Option<&mut VideoState>,
) -> Result<Option<frame::Audio>> {
    if audio.drained {
        return Ok(None);
    }
    loop {
        let mut frame = frame::Audio::empty();
        match audio.decoder.receive_frame(&mut frame) {
            Ok(()) => return Ok(Some(frame)),
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {}
            Err(ffmpeg_next::Error::Eof) => {
                audio.drained = true;
                return Ok(None);
            }
            Err(err) => {
                log::emit(LogLevel::Error, &format!("audio decode failed: {err}"));
                return Err(Error::codec(format!("failed to decode audio: {err}")));
            }
        }

        let packet = match audio.packets.pop_front() {
            Some(packet) => Some(packet),
            None => loop {
                match read_packet(ictx)? {
                    Some(packet) => {
                        if packet.stream() == audio.stream_index {
                            break Some(packet);
                        }
                        if let Some(video) = video.as_deref_mut() {
                            if packet.stream() == video.stream_index {
                                video.packets.push_back(packet);
                            }
                        }
                    }
                    None => break None,
                }
            },
        };

        match packet {
            Some(packet) => send_packet(&mut audio.decoder, packet, &mut audio.packets)?,
            None => {
                if !audio.sent_eof {
                    audio
                        .decoder
                        .send_eof()
                        .map_err(|err| Error::codec(format!("failed to flush audio: {err}")))?;
                    audio.sent_eof = true;
                }
            }
        }
    }
}

fn send_packet(
    decoder: &mut codec::decoder::Opened,
    packet: Packet,
    queue: &mut VecDeque<Packet>,
) -> Result<()> {
    match decoder.send_packet(&packet) {
        Ok(()) => Ok(()),
        Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {
            // Decoder is full; retry the packet after the next drain
            queue.push_front(packet);
            Ok(())
        }
        Err(err) => Err(Error::codec(format!("failed to send packet: {err}"))),
    }
}

/// Interleaved output samples to drop so audio lines up with a seek
/// target that the container seek undershot. `pts` is the first decoded
/// audio frame's timestamp in the stream's own time base.
fn seek_skip_samples(clock: &StreamClock, pts: Option<i64>, target: i64) -> usize {
    let Some(pts) = pts else {
        return 0;
    };
    let delta = target - pts;
    if delta <= 0 {
        return 0;
    }
    let per_channel = clock.time_base.rescale(
        delta,
        Rational::new(1, media_format::AUDIO_SAMPLE_RATE as i32),
    );
    per_channel.max(0) as usize * media_format::AUDIO_CHANNELS as usize
}

fn compute_duration(
    ictx: &format::context::Input,
    session: &Session,
    video: Option<&VideoState>,
    audio: Option<&AudioState>,
) -> i64 {
    let mut frames = 0i64;
    for stream in ictx.streams() {
        let clock = match (video, audio) {
            (Some(video), _) if stream.index() == video.stream_index => &video.clock,
            (_, Some(audio)) if stream.index() == audio.stream_index => &audio.clock,
            _ => continue,
        };
        if let Some(count) = clock.frame_count(stream.duration()) {
            frames = frames.max(count);
        }
    }
    if frames > 0 {
        return frames;
    }

    // No per-stream duration; fall back to the container estimate
    let container = ictx.duration();
    if container == ffi::AV_NOPTS_VALUE || container <= 0 {
        return 0;
    }
    let fps = session.frame_rate();
    let num = container as i128 * fps.num as i128;
    let den = ffi::AV_TIME_BASE as i128 * fps.den as i128;
    ((num + den - 1) / den) as i64
}

fn ceil_div(value: i64, divisor: i64) -> i64 {
    (value + divisor - 1) / divisor
}
