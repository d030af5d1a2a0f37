/*!
    End-to-end tests: encode a fixture MOV, then decode it back.
*/

use std::path::{Path, PathBuf};

use rawmill::{
    AudioMixer, Decoder, DecoderConfig, Encoder, EncoderConfig, Error, Rational, Session,
};

const FIXTURE_WIDTH: u32 = 320;
const FIXTURE_HEIGHT: u32 = 240;
const FIXTURE_FRAMES: usize = 30;
const FIXTURE_SAMPLE: i16 = 1000;

fn session() -> Session {
    Session::new(Rational::new(30, 1)).unwrap()
}

/// One second of 320x240 video and constant-valued audio at 30 fps.
fn write_fixture(dir: &Path, session: &Session) -> PathBuf {
    let path = dir.join("fixture.mov");
    let config = EncoderConfig::new().with_dimensions(FIXTURE_WIDTH, FIXTURE_HEIGHT);
    let mut encoder = Encoder::open(&path, session, config).unwrap();

    let video = vec![0x80u8; (FIXTURE_WIDTH * FIXTURE_HEIGHT * 2) as usize];
    let mut audio = session.create_audio_buffer();
    for bytes in audio.chunks_exact_mut(2) {
        bytes.copy_from_slice(&FIXTURE_SAMPLE.to_ne_bytes());
    }

    for _ in 0..FIXTURE_FRAMES {
        encoder.encode_video(&video, (FIXTURE_WIDTH * 2) as usize).unwrap();
        encoder.encode_audio(&audio).unwrap();
    }
    encoder.close().unwrap();
    path
}

/// One second of 64x48 video at an arbitrary source frame rate.
fn write_rate_fixture(dir: &Path, rate: i32, frames: usize) -> PathBuf {
    let source = Session::new(Rational::new(rate, 1)).unwrap();
    let path = dir.join(format!("{rate}fps.mov"));
    let config = EncoderConfig::new().with_dimensions(64, 48).video_only();
    let mut encoder = Encoder::open(&path, &source, config).unwrap();

    let video = vec![0x80u8; 64 * 48 * 2];
    for _ in 0..frames {
        encoder.encode_video(&video, 64 * 2).unwrap();
    }
    encoder.close().unwrap();
    path
}

fn sample_at(buffer: &[u8], index: usize) -> i16 {
    let offset = index * 2;
    i16::from_ne_bytes([buffer[offset], buffer[offset + 1]])
}

#[test]
fn fixture_reports_streams_and_duration() {
    let session = session();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), &session);

    let decoder = Decoder::open(&path, &session, DecoderConfig::default()).unwrap();
    assert!(decoder.has_video());
    assert!(decoder.has_audio());
    assert_eq!(decoder.duration(), FIXTURE_FRAMES as i64);
}

#[test]
fn accessors_are_empty_before_first_decode() {
    let session = session();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), &session);

    let decoder = Decoder::open(&path, &session, DecoderConfig::default()).unwrap();
    assert_eq!(decoder.width(), 0);
    assert_eq!(decoder.height(), 0);
    assert_eq!(decoder.linesize(), 0);
    assert!(decoder.video_buffer().is_none());
}

#[test]
fn video_is_never_upscaled() {
    let session = session();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), &session);

    let config = DecoderConfig::new().with_bounds(1000, 1000);
    let mut decoder = Decoder::open(&path, &session, config).unwrap();
    assert!(decoder.decode_video().unwrap());
    assert_eq!(decoder.width(), FIXTURE_WIDTH);
    assert_eq!(decoder.height(), FIXTURE_HEIGHT);
    assert!(decoder.linesize() >= (FIXTURE_WIDTH * 2) as usize);
    let buffer = decoder.video_buffer().unwrap();
    assert!(buffer.len() >= (FIXTURE_WIDTH * 2) as usize * FIXTURE_HEIGHT as usize);
}

#[test]
fn video_downscales_to_fit_bounds() {
    let session = session();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), &session);

    let config = DecoderConfig::new().with_bounds(300, 300);
    let mut decoder = Decoder::open(&path, &session, config).unwrap();
    assert!(decoder.decode_video().unwrap());
    // 320x240 into 300x300 scales by width, preserving 4:3
    assert_eq!(decoder.width(), 300);
    assert_eq!(decoder.height(), 225);
}

#[test]
fn decode_video_reports_end_of_stream() {
    let session = session();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), &session);

    let mut decoder = Decoder::open(&path, &session, DecoderConfig::default()).unwrap();
    for _ in 0..decoder.duration() {
        assert!(decoder.decode_video().unwrap());
    }
    assert!(!decoder.decode_video().unwrap());
    // The last picture stays readable past end of stream
    assert!(decoder.video_buffer().is_some());
    assert_eq!(decoder.width(), FIXTURE_WIDTH);
}

#[test]
fn slow_source_repeats_frames_to_session_rate() {
    let session = session();
    let dir = tempfile::tempdir().unwrap();
    // One second at 15 fps, decoded against a 30 fps session
    let path = write_rate_fixture(dir.path(), 15, 15);

    let mut decoder = Decoder::open(&path, &session, DecoderConfig::default()).unwrap();
    assert_eq!(decoder.duration(), 30);

    // Each source frame serves two intervals; the picture stays readable
    // on every call, repeated or fresh
    let mut served = 0;
    while decoder.decode_video().unwrap() {
        served += 1;
        assert_eq!(decoder.width(), 64);
        assert!(decoder.video_buffer().is_some());
        assert!(served <= 31, "decoder never reported end of stream");
    }
    assert!(served >= 29, "served only {served} of 30 intervals");
}

#[test]
fn fast_source_skips_frames_to_session_rate() {
    let session = session();
    let dir = tempfile::tempdir().unwrap();
    // One second at 60 fps, decoded against a 30 fps session
    let path = write_rate_fixture(dir.path(), 60, 60);

    let mut decoder = Decoder::open(&path, &session, DecoderConfig::default()).unwrap();
    assert_eq!(decoder.duration(), 30);

    // Sixty source frames collapse into thirty intervals
    let mut served = 0;
    while decoder.decode_video().unwrap() {
        served += 1;
        assert!(served <= 31, "decoder never reported end of stream");
    }
    assert!(served >= 29, "served only {served} of 30 intervals");
}

#[test]
fn decode_audio_round_trips_samples() {
    let session = session();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), &session);

    let mut decoder = Decoder::open(&path, &session, DecoderConfig::default()).unwrap();
    let mut buffer = session.create_audio_buffer();
    decoder.decode_audio(&mut buffer).unwrap();

    // pcm_s16le at the engine rate passes through untouched
    assert_eq!(sample_at(&buffer, 0), FIXTURE_SAMPLE);
    assert_eq!(sample_at(&buffer, 100), FIXTURE_SAMPLE);
}

#[test]
fn decode_audio_pads_with_silence_past_end() {
    let session = session();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), &session);

    let config = DecoderConfig::new().discard_video();
    let mut decoder = Decoder::open(&path, &session, config).unwrap();
    let mut buffer = session.create_audio_buffer();
    for _ in 0..FIXTURE_FRAMES {
        decoder.decode_audio(&mut buffer).unwrap();
    }
    decoder.decode_audio(&mut buffer).unwrap();
    assert!(buffer.iter().all(|&b| b == 0));
}

#[test]
fn volume_scales_decoded_samples() {
    let session = session();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), &session);

    let config = DecoderConfig::new().discard_video().with_volume(0.9);
    let mut decoder = Decoder::open(&path, &session, config).unwrap();
    let mut buffer = session.create_audio_buffer();
    decoder.decode_audio(&mut buffer).unwrap();

    // Volume 0.9 maps to a gain of ~0.5012
    let sample = sample_at(&buffer, 100);
    assert!((495..=507).contains(&sample), "sample was {sample}");
}

#[test]
fn zero_volume_disables_audio() {
    let session = session();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), &session);

    let config = DecoderConfig::new().with_volume(0.0);
    let mut decoder = Decoder::open(&path, &session, config).unwrap();
    assert!(!decoder.has_audio());
    let mut buffer = session.create_audio_buffer();
    let err = decoder.decode_audio(&mut buffer).unwrap_err();
    assert!(err.is_invalid_usage());
}

#[test]
fn start_frame_reduces_duration() {
    let session = session();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), &session);

    let config = DecoderConfig::new().with_start_frame(10);
    let decoder = Decoder::open(&path, &session, config).unwrap();
    assert_eq!(decoder.duration(), FIXTURE_FRAMES as i64 - 10);
}

#[test]
fn start_frame_aligns_audio_to_the_seek_target() {
    let session = session();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ramp.mov");

    // Every frame interval carries its own index as the sample value
    let mut encoder =
        Encoder::open(&path, &session, EncoderConfig::new().audio_only()).unwrap();
    let mut buffer = session.create_audio_buffer();
    for frame in 0..FIXTURE_FRAMES {
        let value = frame as i16 * 100;
        for bytes in buffer.chunks_exact_mut(2) {
            bytes.copy_from_slice(&value.to_ne_bytes());
        }
        encoder.encode_audio(&buffer).unwrap();
    }
    encoder.close().unwrap();

    let config = DecoderConfig::new().with_start_frame(10);
    let mut decoder = Decoder::open(&path, &session, config).unwrap();
    assert_eq!(decoder.duration(), FIXTURE_FRAMES as i64 - 10);

    // The first decoded interval is frame 10's content from its first
    // sample, wherever the container seek actually landed
    let mut decoded = session.create_audio_buffer();
    decoder.decode_audio(&mut decoded).unwrap();
    assert_eq!(sample_at(&decoded, 0), 1000);
    assert_eq!(sample_at(&decoded, decoded.len() / 2 - 1), 1000);

    // And the next interval is frame 11's
    decoder.decode_audio(&mut decoded).unwrap();
    assert_eq!(sample_at(&decoded, 0), 1100);
}

#[test]
fn first_decode_after_seek_yields_picture() {
    let session = session();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), &session);

    let config = DecoderConfig::new().with_start_frame(10);
    let mut decoder = Decoder::open(&path, &session, config).unwrap();
    // A successful decode always leaves a readable picture, even when
    // the seek lands past the first expected interval
    assert!(decoder.decode_video().unwrap());
    assert_eq!(decoder.width(), FIXTURE_WIDTH);
    assert!(decoder.video_buffer().is_some());
}

#[test]
fn discard_flags_suppress_streams() {
    let session = session();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), &session);

    let config = DecoderConfig::new().discard_video();
    let mut decoder = Decoder::open(&path, &session, config).unwrap();
    assert!(!decoder.has_video());
    assert!(decoder.has_audio());
    let err = decoder.decode_video().unwrap_err();
    assert!(err.is_invalid_usage());

    let config = DecoderConfig::new().discard_audio();
    let mut decoder = Decoder::open(&path, &session, config).unwrap();
    assert!(decoder.has_video());
    assert!(!decoder.has_audio());
    let mut buffer = session.create_audio_buffer();
    let err = decoder.decode_audio(&mut buffer).unwrap_err();
    assert!(err.is_invalid_usage());
}

#[test]
fn wrong_sized_audio_buffer_is_rejected() {
    let session = session();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), &session);

    let mut decoder = Decoder::open(&path, &session, DecoderConfig::default()).unwrap();
    let mut short = vec![0u8; 16];
    let err = decoder.decode_audio(&mut short).unwrap_err();
    assert!(err.is_invalid_usage());
}

#[test]
fn closed_decoder_rejects_operations() {
    let session = session();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), &session);

    let mut decoder = Decoder::open(&path, &session, DecoderConfig::default()).unwrap();
    decoder.close().unwrap();
    decoder.close().unwrap();

    let err = decoder.decode_video().unwrap_err();
    assert!(err.is_invalid_usage());
    assert!(!decoder.has_video());
    assert!(!decoder.has_audio());
    assert_eq!(decoder.duration(), 0);
    assert!(decoder.video_buffer().is_none());
}

#[test]
fn open_rejects_missing_file() {
    let session = session();
    let result = Decoder::open(
        "/nonexistent/missing.mov",
        &session,
        DecoderConfig::default(),
    );
    assert!(matches!(result, Err(Error::Open { .. })));
}

#[test]
fn mixes_two_decoded_tracks() {
    let session = session();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), &session);

    let config = DecoderConfig::new().discard_video();
    let mut a = Decoder::open(&path, &session, config.clone()).unwrap();
    let mut b = Decoder::open(&path, &session, config).unwrap();

    let mut buf_a = session.create_audio_buffer();
    let mut buf_b = session.create_audio_buffer();
    a.decode_audio(&mut buf_a).unwrap();
    b.decode_audio(&mut buf_b).unwrap();

    let mut mixer = AudioMixer::new(&session);
    let mut mixed = session.create_audio_buffer();
    mixer
        .mix(&[Some(buf_a.as_slice()), Some(buf_b.as_slice())], &mut mixed)
        .unwrap();
    assert_eq!(sample_at(&mixed, 50), FIXTURE_SAMPLE * 2);
}

#[test]
fn decoded_video_re_encodes() {
    let session = session();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), &session);

    let config = DecoderConfig::new().discard_audio().with_bounds(160, 120);
    let mut decoder = Decoder::open(&path, &session, config).unwrap();
    assert!(decoder.decode_video().unwrap());

    let out_path = dir.path().join("video-out.mov");
    let out_config = EncoderConfig::new()
        .video_only()
        .with_dimensions(decoder.width(), decoder.height());
    let mut encoder = Encoder::open(&out_path, &session, out_config).unwrap();

    // The decoder's buffer pipes straight through, stride padding and all
    encoder
        .encode_video(decoder.video_buffer().unwrap(), decoder.linesize())
        .unwrap();
    while decoder.decode_video().unwrap() {
        encoder
            .encode_video(decoder.video_buffer().unwrap(), decoder.linesize())
            .unwrap();
    }
    encoder.close().unwrap();

    let check = Decoder::open(&out_path, &session, DecoderConfig::default()).unwrap();
    assert!(check.has_video());
    assert_eq!(check.duration(), FIXTURE_FRAMES as i64);
}

#[test]
fn decoded_audio_re_encodes() {
    let session = session();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), &session);

    let config = DecoderConfig::new().discard_video();
    let mut decoder = Decoder::open(&path, &session, config).unwrap();

    let out_path = dir.path().join("out.mov");
    let mut encoder =
        Encoder::open(&out_path, &session, EncoderConfig::new().audio_only()).unwrap();

    let mut buffer = session.create_audio_buffer();
    for _ in 0..decoder.duration() {
        decoder.decode_audio(&mut buffer).unwrap();
        encoder.encode_audio(&buffer).unwrap();
    }
    encoder.close().unwrap();

    let decoder = Decoder::open(&out_path, &session, DecoderConfig::default()).unwrap();
    assert!(decoder.has_audio());
    assert!(!decoder.has_video());
    assert_eq!(decoder.duration(), FIXTURE_FRAMES as i64);
}
