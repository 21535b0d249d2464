//! Command-line front end: argument parsing, version text and the
//! file-to-file conversion driver.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::audio::pipeline::{self, ConvertStats};
use crate::audio::resample::{Quality, QualityLevel, Resampler};
use crate::audio::wav::{WavReader, WavWriter};
use crate::common::errors::{CliError, ConfigError};
use crate::configs::{Config, FilterFile};

pub const USAGE: &str = "
USAGE: One of the following:

      resample -to srate [-noFilterInterp] [-quality <b|l|m>] [-f filterFile] [-terse] input output
          b: linear interpolation, l: low 13 taps, m: medium 21 taps
      resample -by factor [options as above] input output
      resample -version
      input & output must be stereo 16-bit wav files

Options can be abbreviated.
";

macro_rules! env_or {
    ($key:literal, $default:literal) => {
        option_env!($key).unwrap_or($default)
    };
}

pub struct VersionInfo {
    pub version: &'static str,
    pub branch: &'static str,
    pub commit_short: &'static str,
    pub profile: &'static str,
}

impl Default for VersionInfo {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            branch: env_or!("GIT_BRANCH", "unknown"),
            commit_short: env_or!("GIT_COMMIT_SHORT", "unknown"),
            profile: if cfg!(debug_assertions) {
                "debug"
            } else {
                "release"
            },
        }
    }
}

pub fn version_text(info: &VersionInfo) -> String {
    format!(
        "resample {} ({} on {}, {} build)\n\
         Bandlimited sampling-rate conversion for stereo 16-bit PCM,\n\
         after J. O. Smith's resample (CCRMA). Free software under the LGPL.",
        info.version, info.commit_short, info.branch, info.profile
    )
}

/// How the output rate is specified.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateSpec {
    /// Target rate in Hz.
    To(f64),
    /// Output rate / input rate.
    By(f64),
}

impl RateSpec {
    /// Conversion factor and output rate for an input at `input_rate` Hz.
    pub fn resolve(self, input_rate: u32) -> Result<(f64, u32), CliError> {
        if input_rate == 0 {
            return Err(CliError::Rate("input declares a sample rate of 0 Hz".into()));
        }
        let input_rate = f64::from(input_rate);

        let (factor, output_rate) = match self {
            Self::To(rate) => (rate / input_rate, rate),
            Self::By(ratio) => (ratio, (input_rate * ratio).round()),
        };
        if !(factor.is_finite() && factor > 0.0) {
            return Err(ConfigError::InvalidRatio(factor).into());
        }
        if !(1.0..=f64::from(u32::MAX)).contains(&output_rate) {
            return Err(CliError::Rate(format!("output rate {output_rate} Hz is out of range")));
        }
        Ok((factor, output_rate.round() as u32))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConvertArgs {
    pub rate: RateSpec,
    pub quality: Option<QualityLevel>,
    pub filter_file: Option<PathBuf>,
    pub no_interpolate: bool,
    pub terse: bool,
    pub show_version: bool,
    pub input: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Version,
    Convert(ConvertArgs),
}

fn number(flag: &str, value: Option<String>) -> Result<f64, CliError> {
    let value = value.ok_or_else(|| CliError::Usage(format!("{flag} needs a value")))?;
    value
        .trim()
        .parse()
        .map_err(|_| CliError::Usage(format!("{flag} expects a number, got '{value}'")))
}

/// Parse the arguments following the program name. Switches may be
/// abbreviated to their first letter (`-te` for `-terse`).
pub fn parse<I, S>(args: I) -> Result<Command, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut args = args.into_iter().map(Into::into).peekable();
    if args.peek().is_none() {
        return Err(CliError::Usage("no arguments given".into()));
    }

    let mut to = None;
    let mut by = None;
    let mut quality = None;
    let mut filter_file = None;
    let mut no_interpolate = false;
    let mut terse = false;
    let mut show_version = false;

    while let Some(arg) = args.next_if(|a| a.len() > 1 && a.starts_with('-')) {
        let switch = &arg[1..];
        match switch.as_bytes()[0] {
            b'b' => by = Some(number("-by", args.next())?),
            b'f' => {
                let path = args
                    .next()
                    .ok_or_else(|| CliError::Usage("Need to specify filter file name".into()))?;
                filter_file = Some(PathBuf::from(path));
            }
            b'n' => no_interpolate = true,
            b'q' => {
                let level = args
                    .next()
                    .ok_or_else(|| CliError::Usage("Need to specify a quality".into()))?;
                quality = Some(level.parse::<QualityLevel>()?);
            }
            b't' if switch.starts_with("te") => terse = true,
            b't' => to = Some(number("-to", args.next())?),
            b'v' => {
                if args.peek().is_none() {
                    return Ok(Command::Version);
                }
                show_version = true;
            }
            _ => return Err(CliError::Usage(format!("Unknown switch -{switch}"))),
        }
    }

    let rate = match (to, by) {
        (Some(rate), None) => RateSpec::To(rate),
        (None, Some(ratio)) => RateSpec::By(ratio),
        (Some(_), Some(_)) => {
            return Err(CliError::Usage("Specify only one of '-to' or '-by'".into()));
        }
        (None, None) => {
            return Err(CliError::Usage(
                "Must specify sampling-rate conversion factor via '-to' or '-by' option".into(),
            ));
        }
    };

    let input = args
        .next()
        .ok_or_else(|| CliError::Usage("Need to specify input soundfile".into()))?;
    let output = args
        .next()
        .ok_or_else(|| CliError::Usage("Need to specify output soundfile".into()))?;
    if let Some(extra) = args.next() {
        return Err(CliError::Usage(format!("Unexpected argument '{extra}'")));
    }

    Ok(Command::Convert(ConvertArgs {
        rate,
        quality,
        filter_file,
        no_interpolate,
        terse,
        show_version,
        input: input.into(),
        output: output.into(),
    }))
}

/// Quality for the run. A filter file implies custom quality unless a level
/// was given explicitly.
pub fn resolve_quality(args: &ConvertArgs, config: &Config) -> Result<Quality, CliError> {
    let custom = args
        .filter_file
        .as_deref()
        .map(FilterFile::load)
        .transpose()?;
    let level = match (args.quality, &custom) {
        (Some(level), _) => level,
        (None, Some(_)) => QualityLevel::Custom,
        (None, None) => config.resample.quality,
    };
    Ok(Quality::resolve(level, custom)?)
}

fn open(path: &Path) -> Result<File, CliError> {
    File::open(path).map_err(|source| CliError::Open {
        path: path.display().to_string(),
        source,
    })
}

fn create(path: &Path) -> Result<File, CliError> {
    File::create(path).map_err(|source| CliError::Open {
        path: path.display().to_string(),
        source,
    })
}

/// Convert `args.input` into `args.output`.
pub fn run(args: &ConvertArgs, config: &Config) -> Result<ConvertStats, CliError> {
    if args.show_version {
        println!("{}", version_text(&VersionInfo::default()));
    }

    let quality = resolve_quality(args, config)?;
    let interpolate = config.resample.interpolate && !args.no_interpolate;
    if !interpolate {
        info!("Filter-table interpolation disabled.");
    }

    let mut reader = WavReader::new(BufReader::new(open(&args.input)?))?;
    let input_rate = reader.header().sample_rate;
    let (factor, output_rate) = args.rate.resolve(input_rate)?;
    info!(
        "Converting {} ({} Hz) to {} ({} Hz), factor {:.6}, quality {}",
        args.input.display(),
        input_rate,
        args.output.display(),
        output_rate,
        factor,
        quality.level()
    );

    let mut resampler = Resampler::new(factor, quality, interpolate)?;
    let mut writer = WavWriter::new(BufWriter::new(create(&args.output)?), output_rate)?;

    let stats = pipeline::convert(
        &mut reader,
        &mut writer,
        &mut resampler,
        config.resample.block_frames,
    )?;
    writer.finish()?;

    info!(
        "Wrote {} frames from {} input frames in {} blocks",
        stats.output_frames, stats.input_frames, stats.blocks
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert_args(args: &[&str]) -> ConvertArgs {
        match parse(args.iter().copied()).unwrap() {
            Command::Convert(c) => c,
            other => panic!("expected a conversion, got {other:?}"),
        }
    }

    fn usage(args: &[&str]) -> String {
        match parse(args.iter().copied()) {
            Err(CliError::Usage(msg)) => msg,
            other => panic!("expected a usage error, got {other:?}"),
        }
    }

    #[test]
    fn parses_full_command() {
        let args = convert_args(&[
            "-to", "48000", "-quality", "m", "-f", "wide.toml", "-noFilterInterp", "-terse",
            "in.wav", "out.wav",
        ]);
        assert_eq!(args.rate, RateSpec::To(48_000.0));
        assert_eq!(args.quality, Some(QualityLevel::Medium));
        assert_eq!(args.filter_file, Some(PathBuf::from("wide.toml")));
        assert!(args.no_interpolate);
        assert!(args.terse);
        assert!(!args.show_version);
        assert_eq!(args.input, PathBuf::from("in.wav"));
        assert_eq!(args.output, PathBuf::from("out.wav"));
    }

    #[test]
    fn accepts_abbreviations() {
        let args = convert_args(&["-b", "0.5", "-q", "l", "-n", "-te", "a.wav", "b.wav"]);
        assert_eq!(args.rate, RateSpec::By(0.5));
        assert_eq!(args.quality, Some(QualityLevel::Low));
        assert!(args.no_interpolate);
        assert!(args.terse);

        // `-t` alone is `-to`.
        let args = convert_args(&["-t", "22050", "a.wav", "b.wav"]);
        assert_eq!(args.rate, RateSpec::To(22_050.0));
        assert!(!args.terse);
    }

    #[test]
    fn version_alone_or_with_a_conversion() {
        assert_eq!(parse(["-version"]).unwrap(), Command::Version);
        assert_eq!(parse(["-v"]).unwrap(), Command::Version);
        let args = convert_args(&["-v", "-by", "2", "a.wav", "b.wav"]);
        assert!(args.show_version);
        assert!(version_text(&VersionInfo::default()).starts_with("resample "));
    }

    #[test]
    fn reports_usage_errors() {
        assert_eq!(usage(&[]), "no arguments given");
        assert!(usage(&["a.wav", "b.wav"]).starts_with("Must specify"));
        assert!(usage(&["-to", "48000", "-by", "2", "a.wav", "b.wav"]).starts_with("Specify only one"));
        assert_eq!(usage(&["-x", "a.wav"]), "Unknown switch -x");
        assert_eq!(usage(&["-by", "2"]), "Need to specify input soundfile");
        assert_eq!(usage(&["-by", "2", "a.wav"]), "Need to specify output soundfile");
        assert!(usage(&["-by", "two", "a.wav", "b.wav"]).contains("expects a number"));
        assert!(usage(&["-by", "2", "a.wav", "b.wav", "c.wav"]).contains("c.wav"));
        assert!(usage(&["-to"]).contains("needs a value"));
    }

    #[test]
    fn unknown_quality_is_a_config_error() {
        assert!(matches!(
            parse(["-to", "8000", "-quality", "q", "a.wav", "b.wav"]),
            Err(CliError::Config(ConfigError::UnknownQuality(_)))
        ));
    }

    #[test]
    fn resolves_rates() {
        let (factor, rate) = RateSpec::To(48_000.0).resolve(44_100).unwrap();
        assert_eq!(rate, 48_000);
        assert!((factor - 48_000.0 / 44_100.0).abs() < 1e-12);

        let (factor, rate) = RateSpec::By(1.0884).resolve(44_100).unwrap();
        assert_eq!(factor, 1.0884);
        assert_eq!(rate, 47_998);

        assert!(matches!(
            RateSpec::By(-1.0).resolve(44_100),
            Err(CliError::Config(ConfigError::InvalidRatio(_)))
        ));
        assert!(matches!(RateSpec::To(48_000.0).resolve(0), Err(CliError::Rate(_))));
        assert!(matches!(RateSpec::By(1e-6).resolve(44_100), Err(CliError::Rate(_))));
    }

    #[test]
    fn quality_falls_back_to_config_then_filter_file() {
        let mut config = Config::default();
        config.resample.quality = QualityLevel::Low;
        let mut args = convert_args(&["-by", "2", "a.wav", "b.wav"]);
        assert_eq!(resolve_quality(&args, &config).unwrap(), Quality::Low);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.toml");
        std::fs::write(&path, "nmult = 3\nlp_scl = 16000\nimp = [300, 200, 100, 0]").unwrap();
        args.filter_file = Some(path);
        assert!(matches!(resolve_quality(&args, &config).unwrap(), Quality::Custom(_)));

        args.quality = Some(QualityLevel::Basic);
        assert_eq!(resolve_quality(&args, &config).unwrap(), Quality::Basic);
    }
}
