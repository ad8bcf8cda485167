use std::ffi::OsString;
use std::path::Path;

use crate::command::ToolCommand;

/// ffmpeg flag helpers
impl ToolCommand {
    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").path_arg(path)
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.path_arg(path)
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Set video codec
    pub fn video_codec<S: Into<OsString>>(self, codec: S) -> Self {
        self.flag("-c:v", codec)
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<OsString>>(self, codec: S) -> Self {
        self.flag("-c:a", codec)
    }

    /// Copy video stream
    pub fn copy_video(self) -> Self {
        self.video_codec("copy")
    }

    /// Disable video
    pub fn no_video(self) -> Self {
        self.arg("-vn")
    }

    /// Select streams by specifier
    pub fn map<S: Into<OsString>>(self, spec: S) -> Self {
        self.flag("-map", spec)
    }

    /// Set audio sample rate
    pub fn audio_sample_rate(self, rate: u32) -> Self {
        self.flag("-ar", rate.to_string())
    }

    /// Set audio channels
    pub fn audio_channels(self, channels: u32) -> Self {
        self.flag("-ac", channels.to_string())
    }

    /// Add video filter
    pub fn video_filter<S: Into<OsString>>(self, filter: S) -> Self {
        self.flag("-vf", filter)
    }

    /// Add audio filter
    pub fn audio_filter<S: Into<OsString>>(self, filter: S) -> Self {
        self.flag("-af", filter)
    }
}

/// Builder for the pipeline's media processing commands
pub struct MediaCommandBuilder {
    ffmpeg_path: String,
    ffprobe_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S1: Into<String>, S2: Into<String>>(ffmpeg_path: S1, ffprobe_path: S2) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
        }
    }

    fn ffmpeg<S: Into<String>>(&self, description: S) -> ToolCommand {
        ToolCommand::new(&self.ffmpeg_path, description)
    }

    /// Build the normalizing re-encode: height capped, width proportional and even
    pub fn resize_video<P: AsRef<Path>>(&self, input_path: P, output_path: P, max_height: u32) -> ToolCommand {
        self.ffmpeg(format!("Resize to {}p", max_height))
            .overwrite()
            .input(input_path)
            .video_filter(format!("scale=-2:{}", max_height))
            .output(output_path)
    }

    /// Build the container probe; prints streams and format as JSON
    pub fn probe<P: AsRef<Path>>(&self, media_path: P) -> ToolCommand {
        ToolCommand::new(&self.ffprobe_path, "Duration probe")
            .flag("-v", "error")
            .arg("-show_streams")
            .arg("-show_format")
            .flag("-of", "json")
            .path_arg(media_path)
    }

    /// Build the PCM demux of every audio stream
    pub fn extract_audio<P: AsRef<Path>>(&self, video_path: P, audio_path: P, codec: &str, sample_rate: u32) -> ToolCommand {
        self.ffmpeg("Audio extraction")
            .overwrite()
            .input(video_path)
            .audio_codec(codec)
            .audio_sample_rate(sample_rate)
            .map("a")
            .output(audio_path)
    }

    /// Build the noise-suppressing audio filter pass
    pub fn filter_audio<P: AsRef<Path>>(&self, input_path: P, output_path: P, filter: &str) -> ToolCommand {
        self.ffmpeg("Audio filtering")
            .overwrite()
            .input(input_path)
            .audio_filter(filter)
            .output(output_path)
    }

    /// Build the remux: first video stream copied, first stream of the new audio as AAC
    pub fn replace_audio<P: AsRef<Path>>(&self, video_path: P, audio_path: P, output_path: P) -> ToolCommand {
        self.ffmpeg("Audio replacement")
            .overwrite()
            .input(video_path)
            .input(audio_path)
            .copy_video()
            .audio_codec("aac")
            .flag("-strict", "experimental")
            .map("0:v:0")
            .map("1:a:0")
            .output(output_path)
    }

    /// Build the speech-recognition extraction used for raw video input
    pub fn extract_speech_audio<P: AsRef<Path>>(&self, video_path: P, audio_path: P) -> ToolCommand {
        self.ffmpeg("Speech audio extraction")
            .overwrite()
            .input(video_path)
            .no_video()
            .audio_codec("pcm_s16le")
            .audio_sample_rate(16000)
            .audio_channels(1)
            .output(audio_path)
    }

    /// Build version check command
    pub fn version_check(&self) -> ToolCommand {
        self.ffmpeg("Version check").arg("-version")
    }

    /// Build ffprobe version check command
    pub fn probe_version_check(&self) -> ToolCommand {
        ToolCommand::new(&self.ffprobe_path, "Probe version check").arg("-version")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(cmd: &ToolCommand) -> Vec<String> {
        cmd.args.iter().map(|a| a.to_string_lossy().to_string()).collect()
    }

    #[test]
    fn test_resize_command() {
        let builder = MediaCommandBuilder::new("ffmpeg", "ffprobe");
        let cmd = builder.resize_video("in.mov", "abc123_resized_video.mp4", 720);

        assert_eq!(cmd.binary_path, "ffmpeg");
        assert_eq!(
            args(&cmd),
            vec!["-y", "-i", "in.mov", "-vf", "scale=-2:720", "abc123_resized_video.mp4"]
        );
    }

    #[test]
    fn test_extract_and_filter_commands() {
        let builder = MediaCommandBuilder::new("ffmpeg", "ffprobe");

        let extract = builder.extract_audio("v.mp4", "a.wav", "pcm_s24le", 48000);
        assert_eq!(
            args(&extract),
            vec!["-y", "-i", "v.mp4", "-c:a", "pcm_s24le", "-ar", "48000", "-map", "a", "a.wav"]
        );

        let filter = builder.filter_audio("a.wav", "f.wav", "lowpass=3000,highpass=100");
        assert_eq!(
            args(&filter),
            vec!["-y", "-i", "a.wav", "-af", "lowpass=3000,highpass=100", "f.wav"]
        );
    }

    #[test]
    fn test_replace_audio_selects_one_stream_each() {
        let builder = MediaCommandBuilder::new("ffmpeg", "ffprobe");
        let cmd = builder.replace_audio("v.mp4", "s.wav", "o.mp4");

        assert_eq!(
            args(&cmd),
            vec![
                "-y", "-i", "v.mp4", "-i", "s.wav", "-c:v", "copy", "-c:a", "aac",
                "-strict", "experimental", "-map", "0:v:0", "-map", "1:a:0", "o.mp4",
            ]
        );
    }

    #[test]
    fn test_probe_command_uses_ffprobe() {
        let builder = MediaCommandBuilder::new("ffmpeg", "/opt/bin/ffprobe");
        let cmd = builder.probe("v.mp4");

        assert_eq!(cmd.binary_path, "/opt/bin/ffprobe");
        assert_eq!(args(&cmd).last().map(String::as_str), Some("v.mp4"));
        assert!(args(&cmd).contains(&"-show_streams".to_string()));
    }
}
