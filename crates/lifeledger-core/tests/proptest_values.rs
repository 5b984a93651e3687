//! Value and identifier property-based tests.
//!
//! ## Purpose
//! These tests fuzz the canonical value rendering used for uniqueness and
//! duplicate matching, and the identifier parsers that guard SQL literals.
//!
//! ## What is covered
//! - Finite numbers never render with exponent notation.
//! - Integral floats and integers render identically.
//! - Dataset ids accept exactly the slug alphabet.
//! - Generated record ids always parse.
// crates/lifeledger-core/tests/proptest_values.rs
// ============================================================================
// Module: Value Property-Based Tests
// Description: Fuzz checks for canonical rendering and identifier parsing.
// Purpose: Ensure comparisons and SQL-embedded identifiers stay well-formed.
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

use lifeledger_core::DatasetId;
use lifeledger_core::FieldKey;
use lifeledger_core::RecordId;
use lifeledger_core::canonical_string;
use proptest::prelude::*;
use serde_json::json;

proptest! {
    #[test]
    fn finite_floats_render_without_exponent(value in any::<f64>().prop_filter("finite", |v| v.is_finite())) {
        let rendered = canonical_string(&json!(value)).unwrap();
        prop_assert!(!rendered.contains('e'));
        prop_assert!(!rendered.contains('E'));
    }

    #[test]
    fn integers_and_integral_floats_agree(value in -1_000_000_i64 .. 1_000_000) {
        #[allow(clippy::cast_precision_loss, reason = "Range is exactly representable.")]
        let as_float = value as f64;
        prop_assert_eq!(canonical_string(&json!(value)), canonical_string(&json!(as_float)));
    }

    #[test]
    fn dataset_ids_accept_only_slugs(value in ".{0,80}") {
        let is_slug = !value.is_empty()
            && value.len() <= 64
            && value.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
        prop_assert_eq!(DatasetId::parse(value.clone()).is_ok(), is_slug);
    }

    #[test]
    fn field_keys_never_contain_quotes(value in ".{1,64}") {
        if let Ok(key) = FieldKey::parse(value) {
            prop_assert!(!key.as_str().contains('"'));
            prop_assert!(!key.as_str().contains('\''));
        }
    }

    #[test]
    fn generated_record_ids_parse(_seed in any::<u8>()) {
        let id = RecordId::generate();
        prop_assert_eq!(RecordId::parse(id.as_str()).unwrap(), id);
    }
}
