/*!
    MOV encoder for the engine's fixed intermediate formats.
*/

use std::path::Path;

use ffmpeg_next::format::{sample, Pixel};
use ffmpeg_next::{codec, encoder, ffi, format, frame, ChannelLayout, Packet};

use rawmill_types::format as media_format;
use rawmill_types::log::{self, LogLevel};
use rawmill_types::{Error, Result, Session};

use crate::config::EncoderConfig;

/// Interleaved S16 sample format written to the audio stream.
const AUDIO_FORMAT: sample::Sample = sample::Sample::I16(sample::Type::Packed);

/**
    Writes UYVY422 video and stereo S16 audio into a MOV file.

    Frames are accepted in the exact formats the decoder and mixer
    produce, stamped with monotonic timestamps derived from the session's
    frame rate, and muxed interleaved. [`close`](Self::close) finalizes
    the container index; dropping an unclosed encoder finalizes it on a
    best-effort basis, but errors are only reported through `close`.
*/
pub struct Encoder {
    state: Option<EncoderState>,
}

impl std::fmt::Debug for Encoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encoder")
            .field("open", &self.state.is_some())
            .finish()
    }
}

struct EncoderState {
    octx: format::context::Output,
    video: Option<VideoTrack>,
    audio: Option<AudioTrack>,
    samples_per_frame: usize,
}

struct VideoTrack {
    encoder: encoder::video::Encoder,
    stream_index: usize,
    time_base: ffmpeg_next::Rational,
    width: u32,
    height: u32,
    next_pts: i64,
}

struct AudioTrack {
    encoder: encoder::audio::Encoder,
    stream_index: usize,
    time_base: ffmpeg_next::Rational,
    next_pts: i64,
}

impl Encoder {
    /**
        Create a MOV file at `path` for the streams `config` enables.

        Video dimensions come from the config, falling back to the
        session's defaults; a video stream without resolvable dimensions
        is an [`Error::InvalidUsage`], as is disabling both streams.
        Container and codec failures surface as [`Error::Open`].
    */
    pub fn open(path: impl AsRef<Path>, session: &Session, config: EncoderConfig) -> Result<Self> {
        let path = path.as_ref();
        if !config.has_video && !config.has_audio {
            return Err(Error::invalid_usage(
                "encoder needs at least one of video and audio",
            ));
        }

        let dimensions = if config.has_video {
            let (width, height) = resolve_dimensions(&config, session)?;
            Some((width, height))
        } else {
            None
        };

        ffmpeg_next::init().map_err(|err| Error::open(err.to_string()))?;
        let mut octx = format::output_as(&path, "mov")
            .map_err(|err| Error::open(format!("{}: {err}", path.display())))?;
        let global_header = octx
            .format()
            .flags()
            .contains(format::Flags::GLOBAL_HEADER);

        let fps = session.frame_rate();
        let frame_interval = ffmpeg_next::Rational::new(fps.den, fps.num);

        let mut video = None;
        if let Some((width, height)) = dimensions {
            let codec = encoder::find(codec::Id::RAWVIDEO)
                .ok_or_else(|| Error::open("rawvideo encoder unavailable"))?;
            let mut ost = octx
                .add_stream(codec)
                .map_err(|err| Error::open(format!("video stream: {err}")))?;
            ost.set_time_base(frame_interval);
            let mut context = codec::context::Context::new_with_codec(codec)
                .encoder()
                .video()
                .map_err(|err| Error::open(format!("video encoder: {err}")))?;
            context.set_width(width);
            context.set_height(height);
            context.set_format(Pixel::UYVY422);
            context.set_time_base(frame_interval);
            context.set_frame_rate(Some(ffmpeg_next::Rational::new(fps.num, fps.den)));
            if global_header {
                context.set_flags(codec::Flags::GLOBAL_HEADER);
            }
            let opened = context
                .open_as(codec)
                .map_err(|err| Error::open(format!("video encoder: {err}")))?;
            ost.set_parameters(&opened);
            video = Some(VideoTrack {
                encoder: opened,
                stream_index: ost.index(),
                time_base: frame_interval,
                width,
                height,
                next_pts: 0,
            });
        }

        let mut audio = None;
        if config.has_audio {
            let codec = encoder::find(codec::Id::PCM_S16LE)
                .ok_or_else(|| Error::open("pcm_s16le encoder unavailable"))?;
            let sample_time_base =
                ffmpeg_next::Rational::new(1, media_format::AUDIO_SAMPLE_RATE as i32);
            let mut ost = octx
                .add_stream(codec)
                .map_err(|err| Error::open(format!("audio stream: {err}")))?;
            ost.set_time_base(sample_time_base);
            let mut context = codec::context::Context::new_with_codec(codec)
                .encoder()
                .audio()
                .map_err(|err| Error::open(format!("audio encoder: {err}")))?;
            context.set_rate(media_format::AUDIO_SAMPLE_RATE as i32);
            context.set_format(AUDIO_FORMAT);
            context.set_channel_layout(ChannelLayout::STEREO);
            context.set_time_base(sample_time_base);
            if global_header {
                context.set_flags(codec::Flags::GLOBAL_HEADER);
            }
            let opened = context
                .open_as(codec)
                .map_err(|err| Error::open(format!("audio encoder: {err}")))?;
            ost.set_parameters(&opened);
            audio = Some(AudioTrack {
                encoder: opened,
                stream_index: ost.index(),
                time_base: sample_time_base,
                next_pts: 0,
            });
        }

        octx.write_header()
            .map_err(|err| Error::open(format!("{}: header: {err}", path.display())))?;

        log::emit(
            LogLevel::Info,
            &format!(
                "encoding {} (video: {}, audio: {})",
                path.display(),
                video.is_some(),
                audio.is_some(),
            ),
        );

        Ok(Self {
            state: Some(EncoderState {
                octx,
                video,
                audio,
                samples_per_frame: session.samples_per_frame(),
            }),
        })
    }

    /**
        Write one UYVY422 video frame whose rows are `linesize` bytes
        apart.

        `linesize` must be at least `width * 2` and `buffer` must cover
        `linesize * height` bytes; this accepts a decoder's stride-padded
        output directly. Returns [`Error::InvalidUsage`] if the encoder
        has no video stream or the geometry does not match.
    */
    pub fn encode_video(&mut self, buffer: &[u8], linesize: usize) -> Result<()> {
        let state = self.state_mut()?;
        let EncoderState { octx, video, .. } = state;
        let Some(video) = video.as_mut() else {
            return Err(Error::invalid_usage("encoder has no video stream"));
        };

        let row_bytes = video.width as usize * media_format::VIDEO_BYTES_PER_PIXEL;
        if linesize < row_bytes {
            return Err(Error::invalid_usage(format!(
                "linesize {linesize} is less than a {row_bytes} byte row"
            )));
        }
        if buffer.len() < linesize * video.height as usize {
            return Err(Error::invalid_usage(format!(
                "video buffer is {} bytes, expected at least {}",
                buffer.len(),
                linesize * video.height as usize
            )));
        }

        let mut frame = frame::Video::new(Pixel::UYVY422, video.width, video.height);
        let stride = frame.stride(0);
        let data = frame.data_mut(0);
        for row in 0..video.height as usize {
            data[row * stride..row * stride + row_bytes]
                .copy_from_slice(&buffer[row * linesize..row * linesize + row_bytes]);
        }
        frame.set_pts(Some(video.next_pts));
        video.next_pts += 1;

        video
            .encoder
            .send_frame(&frame)
            .map_err(|err| Error::codec(format!("failed to encode video: {err}")))?;
        write_packets(
            &mut video.encoder,
            octx,
            video.stream_index,
            video.time_base,
        )
    }

    /**
        Write one frame interval of interleaved stereo S16 audio.

        `buffer` must be exactly the session's `audio_framebuffer_size`.
        Returns [`Error::InvalidUsage`] if the encoder has no audio
        stream or the buffer size does not match.
    */
    pub fn encode_audio(&mut self, buffer: &[u8]) -> Result<()> {
        let state = self.state_mut()?;
        let expected = state.samples_per_frame * media_format::bytes_per_interleaved_sample();
        if buffer.len() != expected {
            return Err(Error::invalid_usage(format!(
                "audio buffer is {} bytes, expected {expected}",
                buffer.len()
            )));
        }
        let samples = state.samples_per_frame;
        let EncoderState { octx, audio, .. } = state;
        let Some(audio) = audio.as_mut() else {
            return Err(Error::invalid_usage("encoder has no audio stream"));
        };

        let mut frame = frame::Audio::new(AUDIO_FORMAT, samples, ChannelLayout::STEREO);
        frame.set_rate(media_format::AUDIO_SAMPLE_RATE);
        frame.data_mut(0)[..buffer.len()].copy_from_slice(buffer);
        frame.set_pts(Some(audio.next_pts));
        audio.next_pts += samples as i64;

        audio
            .encoder
            .send_frame(&frame)
            .map_err(|err| Error::codec(format!("failed to encode audio: {err}")))?;
        write_packets(
            &mut audio.encoder,
            octx,
            audio.stream_index,
            audio.time_base,
        )
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

    /**
        Flush both encoders and finalize the container.

        Further encode calls return [`Error::InvalidUsage`]. Closing an
        already closed encoder is a no-op.
    */
    pub fn close(&mut self) -> Result<()> {
        let Some(mut state) = self.state.take() else {
            return Ok(());
        };
        state.finish()?;
        log::emit(LogLevel::Verbose, "encoder closed");
        Ok(())
    }

    fn state_mut(&mut self) -> Result<&mut EncoderState> {
        self.state
            .as_mut()
            .ok_or_else(|| Error::invalid_usage("encoder is closed"))
    }
}

impl EncoderState {
    fn finish(&mut self) -> Result<()> {
        if let Some(video) = self.video.as_mut() {
            video
                .encoder
                .send_eof()
                .map_err(|err| Error::codec(format!("failed to flush video: {err}")))?;
            write_packets(
                &mut video.encoder,
                &mut self.octx,
                video.stream_index,
                video.time_base,
            )?;
        }
        if let Some(audio) = self.audio.as_mut() {
            audio
                .encoder
                .send_eof()
                .map_err(|err| Error::codec(format!("failed to flush audio: {err}")))?;
            write_packets(
                &mut audio.encoder,
                &mut self.octx,
                audio.stream_index,
                audio.time_base,
            )?;
        }
        self.octx
            .write_trailer()
            .map_err(|err| Error::codec(format!("failed to write trailer: {err}")))
    }
}

impl Drop for Encoder {
    fn drop(&mut self) {
        if let Some(mut state) = self.state.take() {
            if let Err(err) = state.finish() {
                log::emit(LogLevel::Error, &format!("encoder drop: {err}"));
            }
        }
    }
}

fn resolve_dimensions(config: &EncoderConfig, session: &Session) -> Result<(u32, u32)> {
    let (session_width, session_height) = session.dimensions().unwrap_or((0, 0));
    let width = if config.width > 0 {
        config.width
    } else {
        session_width
    };
    let height = if config.height > 0 {
        config.height
    } else {
        session_height
    };
    if width == 0 || height == 0 || width % 2 != 0 {
        return Err(Error::invalid_usage(format!(
            "invalid video dimensions {width}x{height}"
        )));
    }
    Ok((width, height))
}

/// Drain all pending packets from `encoder` into the container.
fn write_packets(
    encoder: &mut codec::encoder::Encoder,
    octx: &mut format::context::Output,
    stream_index: usize,
    encoder_time_base: ffmpeg_next::Rational,
) -> Result<()> {
    let stream_time_base = octx
        .stream(stream_index)
        .map(|stream| stream.time_base())
        .ok_or_else(|| Error::codec(format!("missing output stream {stream_index}")))?;

    loop {
        let mut packet = Packet::empty();
        match encoder.receive_packet(&mut packet) {
            Ok(()) => {
                packet.set_stream(stream_index);
                packet.rescale_ts(encoder_time_base, stream_time_base);
                packet
                    .write_interleaved(octx)
                    .map_err(|err| Error::codec(format!("failed to write packet: {err}")))?;
            }
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {
                return Ok(());
            }
            Err(ffmpeg_next::Error::Eof) => return Ok(()),
            Err(err) => {
                log::emit(LogLevel::Error, &format!("packet write failed: {err}"));
                return Err(Error::codec(format!("failed to receive packet: {err}")));
            }
        }
    }
}
