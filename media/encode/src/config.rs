/*!
    Encoder configuration types.
*/

/**
    Configuration for an [`crate::Encoder`].

    Both streams are enabled by default; dimensions of zero fall back to
    the session's default dimensions.
*/
#[derive(Clone, Debug)]
pub struct EncoderConfig {
    /// Video frame width; 0 uses the session's default width.
    pub width: u32,
    /// Video frame height; 0 uses the session's default height.
    pub height: u32,
    /// Write a video stream.
    pub has_video: bool,
    /// Write an audio stream.
    pub has_audio: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            has_video: true,
            has_audio: true,
        }
    }
}

impl EncoderConfig {
    /**
        Create a config with default settings.
    */
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Set the video frame dimensions.
    */
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /**
        Write only an audio stream.
    */
    pub fn audio_only(mut self) -> Self {
        self.has_video = false;
        self.has_audio = true;
        self
    }

    /**
        Write only a video stream.
    */
    pub fn video_only(mut self) -> Self {
        self.has_video = true;
        self.has_audio = false;
        self
    }
}
