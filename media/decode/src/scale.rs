/*!
    Video scaling to packed UYVY422 within configured bounds.
*/

use ffmpeg_next::software::scaling;
use ffmpeg_next::{format::Pixel, frame};

use rawmill_types::{Error, Result};

/**
    Fit `(src_width, src_height)` within `(max_width, max_height)` while
    preserving aspect ratio, never upscaling.

    A source that already fits is returned unchanged, and a bound of zero
    leaves that axis unconstrained. The resulting width is rounded down
    to an even value since packed UYVY422 stores two pixels per four-byte
    group.
*/
pub fn fit_within(src_width: u32, src_height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if src_width == 0 || src_height == 0 {
        return (0, 0);
    }
    let max_width = if max_width == 0 { src_width } else { max_width };
    let max_height = if max_height == 0 { src_height } else { max_height };
    if src_width <= max_width && src_height <= max_height {
        return (src_width & !1, src_height);
    }

    let scale_w = max_width as f64 / src_width as f64;
    let scale_h = max_height as f64 / src_height as f64;
    let scale = scale_w.min(scale_h);

    let width = ((src_width as f64 * scale) as u32).max(2) & !1;
    let height = ((src_height as f64 * scale) as u32).max(1);
    (width, height)
}

/**
    Converts decoded video frames to packed UYVY422 at a bounded size.

    The scaling context is built lazily from the first frame and rebuilt
    whenever the source geometry changes mid-stream. The output frame is
    owned by the scaler and stays valid (and readable) until the next
    `scale` call, which is what lets a decoder keep serving the last
    frame after end of stream.
*/
pub struct VideoScaler {
    max_width: u32,
    max_height: u32,
    context: Option<scaling::Context>,
    source: Option<(Pixel, u32, u32)>,
    output: Option<frame::Video>,
}

impl VideoScaler {
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
            context: None,
            source: None,
            output: None,
        }
    }

    /**
        Scale `frame` into the owned output buffer.
    */
    pub fn scale(&mut self, frame: &frame::Video) -> Result<()> {
        let source = (frame.format(), frame.width(), frame.height());
        if self.context.is_none() || self.source != Some(source) {
            let (dst_width, dst_height) =
                fit_within(frame.width(), frame.height(), self.max_width, self.max_height);
            let context = scaling::Context::get(
                source.0,
                source.1,
                source.2,
                Pixel::UYVY422,
                dst_width,
                dst_height,
                scaling::Flags::LANCZOS,
            )
            .map_err(|err| Error::codec(format!("failed to create scaler: {err}")))?;
            self.context = Some(context);
            self.source = Some(source);
            self.output = Some(frame::Video::new(Pixel::UYVY422, dst_width, dst_height));
        }

        let context = self.context.as_mut().ok_or_else(|| {
            Error::codec("scaler context missing after initialization".to_string())
        })?;
        let output = self.output.as_mut().ok_or_else(|| {
            Error::codec("scaler output missing after initialization".to_string())
        })?;
        context
            .run(frame, output)
            .map_err(|err| Error::codec(format!("failed to scale frame: {err}")))?;

        Ok(())
    }

    /**
        The most recently scaled frame, if any frame has been scaled yet.
    */
    pub fn output(&self) -> Option<&frame::Video> {
        // Only valid once scale() has filled it
        if self.source.is_some() {
            self.output.as_ref()
        } else {
            None
        }
    }
}
