pub(super) const DEFAULT_CONFIG_TOML: &str = r#"# Portal window configuration

[sync]
# Wait before the first request to a newly opened window (ms).
grace_delay_ms = 1000
# Give up on a ping after this long (ms).
ping_timeout_ms = 2000

[debounce]
# Coalescing window for repositioning a portal window (ms).
reposition_ms = 50
# Show a window after this long if no content update arrived (ms).
first_show_ms = 200
# Keep resizing on every trigger this long after the first content update (ms).
first_dom_settle_ms = 500
# Quiet period before overlaying windows may show again (ms).
overlay_quiet_ms = 5000

[logging]
# trace, debug, info, warn, error
level = "info"
"#;
