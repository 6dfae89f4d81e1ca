//! Channel configuration tests.

use std::path::PathBuf;

use myrtio_matrix_composer::{ChannelId, ColorOrder, DriverCapabilities};
use myrtio_matrix_light::cli::Options;
use myrtio_matrix_light::config::{
    ConfigFileError, engine_config, file_engine_config, flag_channel, load_config_file,
    parse_config,
};

fn temp_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("{}-{name}", std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
}

// -----------------------------------------------------------------------------
// Flags
// -----------------------------------------------------------------------------

#[test]
fn flags_describe_a_single_channel() {
    let options = Options {
        width: 16,
        height: 2,
        pin: 21,
        order: ColorOrder::Rgbw,
        brightness: 100,
        invert: true,
        dma: 5,
        ..Options::default()
    };

    let config = engine_config(&options).unwrap();

    assert_eq!(config.dma_channel, 5);
    assert_eq!(config.channels.len(), 1);
    let settings = &config.channels[&ChannelId(0)];
    assert_eq!(settings.pin, 21);
    assert_eq!(settings.pixel_count, 32);
    assert_eq!(settings.color_order, ColorOrder::Rgbw);
    assert_eq!(settings.brightness, 100);
    assert!(settings.invert);
    assert_eq!(settings.frequency_hz, 800_000);
}

#[test]
fn default_flags_validate_against_the_pi() {
    let config = engine_config(&Options::default()).unwrap();
    let validated = config.validate(&DriverCapabilities::RPI_PWM).unwrap();

    assert_eq!(validated.dma_channel, 10);
    assert_eq!(validated.channels[0].1.pixel_count(), 32);
    assert_eq!(validated.channels[0].1.color_order(), ColorOrder::Gbr);
}

// -----------------------------------------------------------------------------
// JSON documents
// -----------------------------------------------------------------------------

#[test]
fn full_document_parses() {
    let file = parse_config(
        br#"{ "dma": 5, "channels": [
            { "id": 0, "pin": 18, "count": 32, "order": "GRB", "brightness": 200,
              "invert": false, "frequency": 800000 },
            { "id": 1, "pin": 13, "count": 8, "order": "RGBW" }
        ] }"#,
    )
    .unwrap();

    assert_eq!(file.dma, Some(5));
    assert_eq!(file.channels.len(), 2);
    assert_eq!(file.channels[0].order, Some(ColorOrder::Grb));
    assert_eq!(file.channels[0].brightness, Some(200));
    assert_eq!(file.channels[1].order, Some(ColorOrder::Rgbw));
    assert_eq!(file.channels[1].invert, None);
}

#[test]
fn order_names_are_case_insensitive() {
    let file = parse_config(
        br#"{ "channels": [
            { "id": 0, "order": "grb" },
            { "id": 1, "order": "Rgbw" }
        ] }"#,
    )
    .unwrap();

    assert_eq!(file.channels[0].order, Some(ColorOrder::Grb));
    assert_eq!(file.channels[1].order, Some(ColorOrder::Rgbw));
}

#[test]
fn parse_errors_read_as_messages() {
    let error = parse_config(b"not json").unwrap_err();

    let ConfigFileError::Parse(inner) = &error else {
        panic!("expected a parse error, got {error:?}");
    };
    assert_eq!(error.to_string(), format!("invalid config: {inner}"));
}

#[test]
fn missing_fields_fall_back_to_flags() {
    let options = Options {
        pin: 12,
        brightness: 80,
        ..Options::default()
    };
    let file = parse_config(br#"{ "channels": [ { "id": 1 } ] }"#).unwrap();

    let config = file_engine_config(&options, &file);

    assert_eq!(config.dma_channel, 10);
    assert!(!config.channels.contains_key(&ChannelId(0)));
    assert_eq!(config.channels[&ChannelId(1)], flag_channel(&options));
}

#[test]
fn zero_count_channel_stays_configured() {
    let file = parse_config(br#"{ "channels": [ { "id": 0, "count": 0 } ] }"#).unwrap();
    let config = file_engine_config(&Options::default(), &file);

    let validated = config.validate(&DriverCapabilities::RPI_PWM).unwrap();
    assert_eq!(validated.channels.len(), 1);
    assert_eq!(validated.enabled().count(), 0);
}

#[test]
fn duplicate_channels_are_rejected() {
    let result = parse_config(br#"{ "channels": [ { "id": 0 }, { "id": 0 } ] }"#);
    assert!(matches!(result, Err(ConfigFileError::DuplicateChannel(0))));
}

#[test]
fn malformed_documents_are_rejected() {
    assert!(matches!(
        parse_config(br#"{ "channels": [ { "pin": 18 } ] }"#),
        Err(ConfigFileError::Parse(_))
    ));
    assert!(matches!(
        parse_config(br#"{ "channels": [ { "id": 0, "order": "XYZ" } ] }"#),
        Err(ConfigFileError::Parse(_))
    ));
    assert!(matches!(parse_config(b"not json"), Err(ConfigFileError::Parse(_))));
}

// -----------------------------------------------------------------------------
// Files
// -----------------------------------------------------------------------------

#[test]
fn config_file_replaces_flag_channel() {
    let path = temp_file(
        "matrix.json",
        r#"{ "dma": 7, "channels": [ { "id": 1, "count": 64, "order": "BGR" } ] }"#,
    );
    let options = Options {
        config_path: Some(path.clone()),
        ..Options::default()
    };

    let config = engine_config(&options).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.dma_channel, 7);
    assert_eq!(config.channels.len(), 1);
    let settings = &config.channels[&ChannelId(1)];
    assert_eq!(settings.pixel_count, 64);
    assert_eq!(settings.color_order, ColorOrder::Bgr);
}

#[test]
fn missing_file_reports_io_error() {
    let path = std::env::temp_dir().join("myrtio-matrix-light-does-not-exist.json");
    let error = load_config_file(&path).unwrap_err();

    assert!(matches!(error, ConfigFileError::Io { .. }));
    assert!(error.to_string().contains("does-not-exist"));
}
