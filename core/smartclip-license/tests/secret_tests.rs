use smartclip_license::{KeyCodec, LicenseError, LicenseSecret};

#[test]
fn empty_secret_is_configuration_error() {
    for value in ["", "   ", "\n\t"] {
        let err = LicenseSecret::new(value).unwrap_err();
        assert!(matches!(err, LicenseError::Configuration(_)));
    }
}

#[test]
fn secret_debug_is_redacted() {
    let secret = LicenseSecret::new("SC-PRO-2025-LICENSE").unwrap();
    let debug = format!("{secret:?}");
    assert!(!debug.contains("SC-PRO"));
    assert!(debug.contains("REDACTED"));
}

#[test]
fn codec_debug_does_not_leak_secret() {
    let codec = KeyCodec::new(LicenseSecret::new("hunter2-secret").unwrap());
    assert!(!format!("{codec:?}").contains("hunter2"));
}

#[test]
fn missing_env_var_is_configuration_error() {
    let err = LicenseSecret::from_env_var("SMARTCLIP_TEST_SECRET_THAT_IS_NEVER_SET").unwrap_err();
    match err {
        LicenseError::Configuration(msg) => {
            assert!(msg.contains("SMARTCLIP_TEST_SECRET_THAT_IS_NEVER_SET"));
        }
        other => panic!("expected Configuration, got {other:?}"),
    }
}

#[test]
fn expose_returns_value() {
    let secret = LicenseSecret::new("abc").unwrap();
    assert_eq!(secret.expose(), "abc");
}
