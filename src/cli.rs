use crate::cv::CaptureSource;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output debug information
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Only output warnings and errors
    #[arg(short, long, global = true, conflicts_with = "debug")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Capture labeled training images from a camera
    Capture {
        /// Class labels, captured in the given order
        #[arg(short = 'l', long, value_delimiter = ',', required = true)]
        classes: Vec<String>,

        /// Images per label
        #[arg(short, long)]
        num_imgs: usize,

        /// Directory the images are written to
        #[arg(short, long)]
        out: PathBuf,

        /// Camera index
        #[arg(long, default_value_t = 0)]
        device: i32,

        /// Seconds between two images (overrides the config)
        #[arg(long)]
        delay: Option<f32>,

        /// Do not render captured frames
        #[arg(long)]
        no_show: bool,
    },

    /// Show the images of a directory in a grid
    Grid {
        dir: PathBuf,

        /// Grid columns (overrides the config)
        #[arg(long)]
        columns: Option<usize>,
    },

    /// Run the most recently trained model on a video or a camera
    Infer {
        /// Parent directory of the training runs
        #[arg(short, long)]
        models: PathBuf,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Print the weights of the most recently trained model
    LatestModel {
        /// Parent directory of the training runs
        models: PathBuf,
    },

    /// Copy a file into a directory under a collision-free name
    Copy { source: PathBuf, destination: PathBuf },

    /// Print a directory tree, skipping hidden entries
    Tree {
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Also list files
        #[arg(short, long)]
        files: bool,
    },
}

#[derive(ClapArgs, Debug)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// Read a video file
    #[arg(short, long)]
    pub video: Option<PathBuf>,

    /// Read from a camera
    #[arg(long)]
    pub device: Option<i32>,
}

impl SourceArgs {
    /// The selected source; clap guarantees exactly one of the two is set.
    pub fn capture_source(self) -> Option<CaptureSource> {
        match (self.video, self.device) {
            (Some(video), _) => Some(CaptureSource::File(video)),
            (None, Some(device)) => Some(CaptureSource::Device(device)),
            (None, None) => None,
        }
    }
}

pub fn parse_args() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_capture() {
        let args = Args::try_parse_from([
            "cvkit", "capture", "-l", "thumbsup,thumbsdown", "-n", "5", "-o", "imgs", "--no-show",
        ])
        .unwrap();

        match args.command {
            Command::Capture { classes, num_imgs, no_show, device, .. } => {
                assert_eq!(classes, ["thumbsup", "thumbsdown"]);
                assert_eq!(num_imgs, 5);
                assert!(no_show);
                assert_eq!(device, 0);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn infer_needs_exactly_one_source() {
        assert!(Args::try_parse_from(["cvkit", "infer", "-m", "runs"]).is_err());
        assert!(
            Args::try_parse_from(["cvkit", "infer", "-m", "runs", "-v", "a.mp4", "--device", "1"])
                .is_err()
        );
        assert!(Args::try_parse_from(["cvkit", "infer", "-m", "runs", "--device", "4"]).is_ok());
    }

    #[test]
    fn infer_source_follows_the_flag() {
        let args = Args::try_parse_from(["cvkit", "infer", "-m", "runs", "--device", "4"]).unwrap();
        let Command::Infer { source, .. } = args.command else {
            panic!("expected infer");
        };
        assert!(matches!(source.capture_source(), Some(CaptureSource::Device(4))));

        let args = Args::try_parse_from(["cvkit", "infer", "-m", "runs", "-v", "clip.mp4"]).unwrap();
        let Command::Infer { source, .. } = args.command else {
            panic!("expected infer");
        };
        match source.capture_source() {
            Some(CaptureSource::File(path)) => assert_eq!(path, PathBuf::from("clip.mp4")),
            other => panic!("unexpected source: {other:?}"),
        }
    }
}
