//! Integration tests for the scrubber

#[cfg(test)]
mod tests {
    use beacon_config::ScrubConfig;
    use beacon_scrub::*;
    use beacon_types::{json, ContextMap, Value};
    use proptest::prelude::*;

    fn ctx(value: Value) -> ContextMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_realistic_mobile_context() {
        let scrubber = Scrubber::default();
        let input = ctx(json!({
            "app_version": "2.4.1",
            "platform": "android",
            "route": "RedeemOffer",
            "user": {
                "id": "u_123",
                "email": "someone@example.com",
                "profile": {"firstName": "Ana", "plan": "pro"},
            },
            "error": "request failed for someone@example.com with Bearer eyJ0.abc.def",
            "attempts": [1, 2, 3],
        }));

        let out = scrubber.scrub(&input);
        assert_eq!(out["app_version"], "2.4.1");
        assert_eq!(out["user"]["id"], "u_123");
        assert_eq!(out["user"]["email"], REDACTED);
        assert_eq!(out["user"]["profile"]["firstName"], REDACTED);
        assert_eq!(out["user"]["profile"]["plan"], "pro");
        assert_eq!(out["error"], "request failed for [email] with [token]");
        assert_eq!(out["attempts"], json!([1, 2, 3]));
    }

    #[test]
    fn test_scrub_text_leaves_length_alone() {
        let scrubber = Scrubber::new(&ScrubConfig {
            max_string_chars: 4,
            ..ScrubConfig::default()
        });
        assert_eq!(
            scrubber.scrub_text("checkout failed for ana@example.com"),
            "checkout failed for [email]"
        );
    }

    #[test]
    fn test_deeply_nested_input_is_bounded() {
        let mut value = json!("leaf");
        for _ in 0..200 {
            value = json!({ "inner": value });
        }
        let input = ctx(json!({ "deep": value }));
        let out = Scrubber::default().scrub(&input);

        let mut cursor = &out["deep"];
        let mut levels = 0;
        while let Some(next) = cursor.get("inner") {
            cursor = next;
            levels += 1;
        }
        assert_eq!(cursor, &json!(DEPTH_LIMIT));
        assert!(levels < 4);
    }

    proptest! {
        #[test]
        fn denied_values_never_leak(
            key in "(email|phone|password|access_token|home_address)",
            secret in "[a-z0-9]{6,20}",
        ) {
            let input = ctx(json!({ "outer": { key.clone(): secret.clone() } }));
            let out = Scrubber::default().scrub(&input);
            prop_assert_eq!(&out["outer"][key.as_str()], &json!(REDACTED));
            prop_assert!(!serde_json::to_string(&out).unwrap().contains(&secret));
        }

        #[test]
        fn scrubbing_is_deterministic(note in ".{0,400}", n in any::<i64>()) {
            let input = ctx(json!({ "note": note, "n": n }));
            let scrubber = Scrubber::default();
            prop_assert_eq!(scrubber.scrub(&input), scrubber.scrub(&input));
        }

        #[test]
        fn strings_respect_the_length_limit(note in ".{0,400}") {
            let input = ctx(json!({ "note": note }));
            let out = Scrubber::default().scrub(&input);
            let chars = out["note"].as_str().unwrap().chars().count();
            prop_assert!(chars <= ScrubConfig::default().max_string_chars);
        }

        #[test]
        fn email_redaction_is_idempotent(
            user in "[a-z]{3,8}",
            domain in "[a-z]{3,8}",
        ) {
            let input = ctx(json!({ "note": format!("contact: {user}@{domain}.com") }));
            let scrubber = Scrubber::default();
            let first = scrubber.scrub(&input);
            let second = scrubber.scrub(&first);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(&first["note"], &json!("contact: [email]"));
        }
    }
}
