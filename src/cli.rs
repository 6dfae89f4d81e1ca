//! Command line parsing
//!
//! Values are range checked here, so bad input ends the process before any
//! hardware is touched.

use core::fmt;
use std::path::PathBuf;

use myrtio_matrix_composer::{ColorOrder, MatrixLayout, Rgb};

use crate::config;

/// What the process was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Version,
    Run(Options),
}

/// Options of a render run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub color: Rgb,
    pub width: usize,
    pub height: usize,
    pub dma: u8,
    pub pin: i32,
    pub order: ColorOrder,
    pub brightness: u8,
    pub invert: bool,
    /// Turn the matrix dark before exiting
    pub clear_on_exit: bool,
    /// Only switch the matrix off
    pub off: bool,
    /// Run the color sweep instead of a static color
    pub test: bool,
    /// JSON file with the channel set, replaces the single flag channel
    pub config_path: Option<PathBuf>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            color: Rgb::default(),
            width: config::DEFAULT_WIDTH,
            height: config::DEFAULT_HEIGHT,
            dma: config::DEFAULT_DMA_CHANNEL,
            pin: config::DEFAULT_GPIO_PIN,
            order: config::DEFAULT_COLOR_ORDER,
            brightness: u8::MAX,
            invert: false,
            clear_on_exit: false,
            off: false,
            test: false,
            config_path: None,
        }
    }
}

impl Options {
    /// Matrix shape given by `--width` and `--height`
    pub fn layout(&self) -> MatrixLayout {
        MatrixLayout::new(self.width, self.height)
    }

    /// Number of LEDs covered by the matrix
    pub fn pixel_count(&self) -> usize {
        self.layout().len()
    }
}

/// Error type for command line parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    /// Option value failed to parse or is out of range
    InvalidValue {
        option: &'static str,
        value: String,
        expected: &'static str,
    },
    /// Option requires a value but none was given
    MissingValue(&'static str),
    /// Option is not known
    UnknownOption(String),
    /// Positional argument, none are accepted
    UnexpectedArgument(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::InvalidValue {
                option,
                value,
                expected,
            } => write!(f, "invalid {option} {value}, expected {expected}"),
            CliError::MissingValue(option) => write!(f, "option --{option} requires a value"),
            CliError::UnknownOption(option) => write!(f, "unknown option {option}"),
            CliError::UnexpectedArgument(arg) => write!(f, "unexpected argument {arg}"),
        }
    }
}

impl std::error::Error for CliError {}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Flag {
    Help,
    Version,
    Red,
    Green,
    Blue,
    Off,
    Clear,
    Dma,
    Width,
    Height,
    Test,
    Pin,
    Strip,
    Brightness,
    Invert,
    Config,
}

/// Short name, long name, flag
const FLAGS: &[(char, &str, Flag)] = &[
    ('h', "help", Flag::Help),
    ('v', "version", Flag::Version),
    ('r', "red", Flag::Red),
    ('g', "green", Flag::Green),
    ('b', "blue", Flag::Blue),
    ('o', "off", Flag::Off),
    ('c', "clear", Flag::Clear),
    ('d', "dma", Flag::Dma),
    ('x', "width", Flag::Width),
    ('y', "height", Flag::Height),
    ('t', "test", Flag::Test),
    ('p', "pin", Flag::Pin),
    ('s', "strip", Flag::Strip),
    ('l', "brightness", Flag::Brightness),
    ('i', "invert", Flag::Invert),
    ('f', "config", Flag::Config),
];

impl Flag {
    fn takes_value(self) -> bool {
        matches!(
            self,
            Flag::Red
                | Flag::Green
                | Flag::Blue
                | Flag::Dma
                | Flag::Width
                | Flag::Height
                | Flag::Pin
                | Flag::Strip
                | Flag::Brightness
                | Flag::Config
        )
    }

    fn long_name(self) -> &'static str {
        FLAGS
            .iter()
            .find(|(_, _, flag)| *flag == self)
            .map_or("", |(_, name, _)| name)
    }
}

fn lookup_long(name: &str) -> Option<Flag> {
    FLAGS
        .iter()
        .find(|(_, long, _)| *long == name)
        .map(|(_, _, flag)| *flag)
}

fn lookup_short(name: char) -> Option<Flag> {
    FLAGS
        .iter()
        .find(|(short, _, _)| *short == name)
        .map(|(_, _, flag)| *flag)
}

/// Parse the arguments following the program name
///
/// `--help` and `--version` win immediately, like with getopt the arguments
/// after them are not looked at.
pub fn parse_args<I, S>(args: I) -> Result<Command, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut options = Options::default();
    let mut args = args.into_iter().map(Into::into);

    while let Some(arg) = args.next() {
        let (flag, inline_value) = if let Some(long) = arg.strip_prefix("--") {
            let (name, value) = match long.split_once('=') {
                Some((name, value)) => (name, Some(value.to_owned())),
                None => (long, None),
            };
            let flag = lookup_long(name).ok_or_else(|| CliError::UnknownOption(arg.clone()))?;
            (flag, value)
        } else if let Some(short) = arg.strip_prefix('-') {
            let mut chars = short.chars();
            let flag = chars
                .next()
                .and_then(lookup_short)
                .ok_or_else(|| CliError::UnknownOption(arg.clone()))?;
            let rest = chars.as_str();
            let value = if rest.is_empty() {
                None
            } else if flag.takes_value() {
                Some(rest.to_owned())
            } else {
                return Err(CliError::UnknownOption(arg.clone()));
            };
            (flag, value)
        } else {
            return Err(CliError::UnexpectedArgument(arg));
        };

        let value = if flag.takes_value() {
            match inline_value {
                Some(value) => value,
                None => args
                    .next()
                    .ok_or(CliError::MissingValue(flag.long_name()))?,
            }
        } else if inline_value.is_some() {
            return Err(CliError::UnknownOption(arg));
        } else {
            String::new()
        };

        match flag {
            Flag::Help => return Ok(Command::Help),
            Flag::Version => return Ok(Command::Version),
            Flag::Red => options.color.r = parse_component("red", &value)?,
            Flag::Green => options.color.g = parse_component("green", &value)?,
            Flag::Blue => options.color.b = parse_component("blue", &value)?,
            Flag::Brightness => options.brightness = parse_component("brightness", &value)?,
            Flag::Off => options.off = true,
            Flag::Clear => options.clear_on_exit = true,
            Flag::Test => options.test = true,
            Flag::Invert => options.invert = true,
            Flag::Dma => options.dma = parse_dma(&value)?,
            Flag::Width => options.width = parse_dimension("width", &value)?,
            Flag::Height => options.height = parse_dimension("height", &value)?,
            Flag::Pin => {
                options.pin = value.parse().map_err(|_| CliError::InvalidValue {
                    option: "pin",
                    value: value.clone(),
                    expected: "a GPIO number",
                })?;
            }
            Flag::Strip => {
                options.order = value.parse().map_err(|_| CliError::InvalidValue {
                    option: "strip",
                    value: value.clone(),
                    expected: "a color order such as GRB or RGBW",
                })?;
            }
            Flag::Config => options.config_path = Some(PathBuf::from(value)),
        }
    }

    Ok(Command::Run(options))
}

fn parse_component(option: &'static str, value: &str) -> Result<u8, CliError> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|v| u8::try_from(v).ok())
        .ok_or_else(|| CliError::InvalidValue {
            option,
            value: value.to_owned(),
            expected: "a value in [0-255]",
        })
}

fn parse_dimension(option: &'static str, value: &str) -> Result<usize, CliError> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|v| *v > 0)
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| CliError::InvalidValue {
            option,
            value: value.to_owned(),
            expected: "a positive number",
        })
}

fn parse_dma(value: &str) -> Result<u8, CliError> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|v| u8::try_from(v).ok())
        .filter(|v| *v < config::DMA_CHANNEL_LIMIT)
        .ok_or_else(|| CliError::InvalidValue {
            option: "dma",
            value: value.to_owned(),
            expected: "a DMA channel below 14",
        })
}

/// Usage text for `program`
pub fn usage(program: &str) -> String {
    format!(
        "{program} version {version}
Usage: {program} [options]
-h (--help)        - this information
-v (--version)     - print the version
-r (--red)         - set red value [0-255]
-g (--green)       - set green value [0-255]
-b (--blue)        - set blue value [0-255]
-o (--off)         - switch off display
-c (--clear)       - clear on exit
-d (--dma)         - select DMA channel [0-13]
-x (--width)       - set width
-y (--height)      - set height
-t (--test)        - run the test pattern
-p (--pin)         - select GPIO pin
-s (--strip)       - set color order (RGB, GRB, GBR, ..., RGBW, GRBW, ...)
-l (--brightness)  - set brightness [0-255]
-i (--invert)      - invert the output signal
-f (--config)      - load channels from a JSON file
",
        version = crate::BUILD_VERSION,
    )
}
