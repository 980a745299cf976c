//! Property tests for save-time validation

use connhub_core::models::{
    ConnectionFormData, ConnectionType, Credentials, validate_form,
};
use proptest::prelude::*;

fn type_strategy() -> impl Strategy<Value = ConnectionType> {
    prop::sample::select(ConnectionType::ALL.to_vec())
}

fn host_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,12}(\\.[a-z]{2,8}){1,2}"
}

fn valid_form_strategy() -> impl Strategy<Value = ConnectionFormData> {
    (
        "[A-Za-z][A-Za-z0-9 _-]{0,40}",
        type_strategy(),
        "[a-z]{1,16}",
        host_strategy(),
        prop::bool::ANY,
        1u64..=300,
        0u32..=5,
        0u64..=10,
    )
        .prop_map(
            |(name, connection_type, provider, host, https, timeout, retries, delay)| {
                let scheme = if https { "https" } else { "http" };
                let mut form = ConnectionFormData::new(
                    name,
                    connection_type,
                    provider,
                    format!("{scheme}://{host}"),
                );
                form.config = form.config.with_timeout(timeout).with_retries(retries, delay);
                form
            },
        )
}

proptest! {
    /// Property: well-formed input always validates
    #[test]
    fn valid_forms_pass(form in valid_form_strategy()) {
        prop_assert!(validate_form(&form).is_ok(), "{:?}", validate_form(&form));
    }

    /// Property: a zero timeout is always rejected
    #[test]
    fn zero_timeout_rejected(mut form in valid_form_strategy()) {
        form.config.timeout = 0;
        let err = validate_form(&form).unwrap_err();
        prop_assert_eq!(err.field, "config.timeout");
    }

    /// Property: blank names are always rejected
    #[test]
    fn blank_name_rejected(mut form in valid_form_strategy(), blank in "[ \t]{0,5}") {
        form.name = blank;
        let err = validate_form(&form).unwrap_err();
        prop_assert_eq!(err.field, "name");
    }

    /// Property: credentials with an empty required secret are rejected
    #[test]
    fn empty_secret_rejected(form in valid_form_strategy(), kind in 0u8..3) {
        let credentials = match kind {
            0 => Credentials::api_key(""),
            1 => Credentials::bearer(""),
            _ => Credentials::basic("user", ""),
        };
        let form = form.with_credentials(credentials);
        let err = validate_form(&form).unwrap_err();
        prop_assert!(err.field.starts_with("credentials."), "{}", err.field);
    }

    /// Property: base URLs without a scheme are rejected
    #[test]
    fn schemeless_url_rejected(mut form in valid_form_strategy(), host in host_strategy()) {
        form.config.base_url = host;
        let err = validate_form(&form).unwrap_err();
        prop_assert_eq!(err.field, "config.baseUrl");
    }
}
