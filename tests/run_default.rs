//! Integration test for running with no arguments.
use evsite::cli::{RunOpts, handle_run_command};
use evsite::settings::Settings;

/// With default options the built-in instance is solved and no output files are written
#[test]
fn test_handle_run_command_default_options() {
    unsafe { std::env::set_var("EVSITE_LOG_LEVEL", "off") };

    let opts = RunOpts::default();
    assert!(opts.instance.is_none() && opts.output_dir.is_none());
    handle_run_command(&opts, Some(Settings::default())).unwrap();
}
