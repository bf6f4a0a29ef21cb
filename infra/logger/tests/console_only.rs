use arbor_logger::{Format, LevelFilter, Logger};

#[test]
fn console_only_has_no_file_output() {
    let logger = Logger::builder()
        .name("integration-console-only")
        .console_format(Format::Json)
        .level(LevelFilter::INFO)
        .init()
        .expect("logger should initialize");

    tracing::info!(target: "arbor_model", "console record");
    assert!(!logger.has_file_output(), "console-only logger should not own a file writer");
}
