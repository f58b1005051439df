use serial_test::serial;
use sftp_bucket::load_config::{
    config_from_lookup, load_config, ConfigError, FileSettings, S3_BUCKET, SECRET_ARN, SFTP_HOST,
    SFTP_PORT, SFTP_REMOTE_DIR, SFTP_USERNAME, WORK_DIR,
};
use sftp_bucket_core::config::DEFAULT_MAX_COMPRESSED_BYTES;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn required_env() -> HashMap<String, String> {
    [
        (SFTP_HOST, "sftp.example.com"),
        (SFTP_USERNAME, "drop"),
        (SECRET_ARN, "arn:aws:secretsmanager:eu-west-1:000000000000:secret:key"),
        (S3_BUCKET, "dest-bucket"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn lookup(env: &HashMap<String, String>) -> impl Fn(&str) -> Option<String> + '_ {
    move |key: &str| env.get(key).cloned()
}

#[test]
fn defaults_apply_when_only_required_vars_are_set() {
    let env = required_env();
    let config = config_from_lookup(lookup(&env), FileSettings::default()).unwrap();

    assert_eq!(config.sftp.host, "sftp.example.com");
    assert_eq!(config.sftp.port, 22);
    assert_eq!(config.sftp.username, "drop");
    assert_eq!(config.sftp.remote_dir, ".");
    assert!(config.secret_id.ends_with("secret:key"));
    assert_eq!(config.pipeline.bucket, "dest-bucket");
    assert_eq!(config.pipeline.work_dir, std::env::temp_dir());
    assert_eq!(config.pipeline.max_compressed_bytes, 250 * 1024 * 1024);
    assert_eq!(DEFAULT_MAX_COMPRESSED_BYTES, 262_144_000);
}

#[test]
fn every_missing_required_var_is_reported() {
    let env = HashMap::new();
    let err = config_from_lookup(lookup(&env), FileSettings::default()).unwrap_err();

    match err {
        ConfigError::MissingVars(missing) => {
            assert_eq!(missing, [SFTP_HOST, SFTP_USERNAME, SECRET_ARN, S3_BUCKET]);
        }
        other => panic!("expected missing vars, got {other:?}"),
    }
}

#[test]
fn blank_values_count_as_missing() {
    let mut env = required_env();
    env.insert(S3_BUCKET.to_string(), "   ".to_string());
    let err = config_from_lookup(lookup(&env), FileSettings::default()).unwrap_err();

    assert!(matches!(err, ConfigError::MissingVars(ref m) if m == &[S3_BUCKET.to_string()]));
    assert!(err.to_string().contains("S3_BUCKET"));
}

#[test]
fn invalid_port_is_rejected() {
    let mut env = required_env();
    env.insert(SFTP_PORT.to_string(), "sixty".to_string());
    let err = config_from_lookup(lookup(&env), FileSettings::default()).unwrap_err();

    assert!(matches!(err, ConfigError::InvalidPort { ref value, .. } if value == "sixty"));
}

#[test]
fn environment_overrides_file_which_overrides_defaults() {
    let mut env = required_env();
    env.insert(SFTP_PORT.to_string(), "2222".to_string());
    env.insert(WORK_DIR.to_string(), "/var/spool/relay".to_string());
    let file = FileSettings {
        port: Some(2022),
        remote_dir: Some("outbound".to_string()),
        work_dir: Some(PathBuf::from("/tmp/from-file")),
        max_compressed_bytes: Some(1024),
    };

    let config = config_from_lookup(lookup(&env), file).unwrap();

    assert_eq!(config.sftp.port, 2222);
    assert_eq!(config.sftp.remote_dir, "outbound");
    assert_eq!(config.pipeline.work_dir, PathBuf::from("/var/spool/relay"));
    assert_eq!(config.pipeline.max_compressed_bytes, 1024);
}

#[test]
#[serial]
fn load_config_reads_yaml_and_process_environment() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "port: 2022\nremote_dir: outbound\nmax_compressed_bytes: 4096").unwrap();

    for (key, value) in required_env() {
        std::env::set_var(key, value);
    }
    std::env::set_var(SFTP_REMOTE_DIR, "from-env");
    std::env::remove_var(SFTP_PORT);

    let config = load_config(Some(file.path()));

    for key in [SFTP_HOST, SFTP_USERNAME, SECRET_ARN, S3_BUCKET, SFTP_REMOTE_DIR] {
        std::env::remove_var(key);
    }

    let config = config.expect("valid YAML and environment should load");
    assert_eq!(config.sftp.port, 2022);
    assert_eq!(config.sftp.remote_dir, "from-env");
    assert_eq!(config.pipeline.max_compressed_bytes, 4096);
}

#[test]
#[serial]
fn unknown_yaml_keys_are_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "port: 2022\nbucket: not-allowed-here").unwrap();

    let err = load_config(Some(file.path())).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse config YAML"));
}
