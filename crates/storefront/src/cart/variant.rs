//! Variant resolution from URL option state.
//!
//! Resolution is total: a partial or impossible option combination is a
//! normal state while the shopper is still choosing, so it falls back to the
//! default variant instead of failing. The fallback policy is applied in
//! three discrete steps:
//!
//! 1. [`exact_match`]: first variant (list order) matching every selected pair
//! 2. [`default_variant`]: the variant with the supplied default id
//! 3. [`first_variant`]: the first variant in list order

use std::collections::{BTreeMap, BTreeSet};

use storefront_cart_core::MerchandiseId;

use crate::shopify::types::{ProductOption, ProductVariant};

/// Option selections parsed from URL query parameters.
///
/// Keys are option names lower-cased; values are kept verbatim. A repeated
/// key keeps its last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectedOptionQuery {
    pairs: BTreeMap<String, String>,
}

impl SelectedOptionQuery {
    /// Build a query from raw key/value pairs. Empty keys are skipped.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let pairs = pairs
            .into_iter()
            .filter_map(|(key, value)| {
                let key = key.as_ref().trim().to_lowercase();
                (!key.is_empty()).then(|| (key, value.into()))
            })
            .collect();
        Self { pairs }
    }

    /// Drop keys that do not name one of the product's options.
    ///
    /// URL state carries unrelated parameters (tracking, pagination) that
    /// would otherwise make every exact match fail.
    #[must_use]
    pub fn retain_options(mut self, options: &[ProductOption]) -> Self {
        let names: BTreeSet<String> = options.iter().map(|o| o.name.to_lowercase()).collect();
        self.pairs.retain(|key, _| names.contains(key));
        self
    }

    /// Whether no option is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Selected pairs as `(lower-cased name, value)`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether every selected pair is one of the variant's options.
    ///
    /// Names compare case-insensitively, values exactly.
    #[must_use]
    pub fn matches(&self, variant: &ProductVariant) -> bool {
        self.iter().all(|(name, value)| {
            variant
                .selected_options
                .iter()
                .any(|o| o.name.to_lowercase() == name && o.value == value)
        })
    }
}

/// Resolve the variant a shopper is viewing.
///
/// Returns `None` only when `variants` is empty.
#[must_use]
pub fn resolve<'a>(
    variants: &'a [ProductVariant],
    selected: &SelectedOptionQuery,
    default_variant_id: Option<&MerchandiseId>,
) -> Option<&'a ProductVariant> {
    exact_match(variants, selected)
        .or_else(|| default_variant(variants, default_variant_id))
        .or_else(|| first_variant(variants))
}

/// Step 1: first variant matching every selected pair.
///
/// An empty query selects nothing here; the default applies instead.
#[must_use]
pub fn exact_match<'a>(
    variants: &'a [ProductVariant],
    selected: &SelectedOptionQuery,
) -> Option<&'a ProductVariant> {
    if selected.is_empty() {
        return None;
    }
    variants.iter().find(|v| selected.matches(v))
}

/// Step 2: the variant with the default id, if supplied and present.
#[must_use]
pub fn default_variant<'a>(
    variants: &'a [ProductVariant],
    default_variant_id: Option<&MerchandiseId>,
) -> Option<&'a ProductVariant> {
    let id = default_variant_id?;
    variants.iter().find(|v| &v.id == id)
}

/// Step 3: the first variant in list order.
#[must_use]
pub fn first_variant(variants: &[ProductVariant]) -> Option<&ProductVariant> {
    variants.first()
}

/// A variant whose option names differ from the first variant's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionMismatch {
    pub variant_id: MerchandiseId,
    pub expected: BTreeSet<String>,
    pub found: BTreeSet<String>,
}

/// Check that all variants share one set of option names.
///
/// The resolver tolerates a mismatch (it matches per pair), so callers only
/// log the result.
///
/// # Errors
///
/// Returns the first variant whose option names differ.
pub fn check_option_completeness(variants: &[ProductVariant]) -> Result<(), OptionMismatch> {
    let mut iter = variants.iter();
    let Some(first) = iter.next() else {
        return Ok(());
    };
    let expected = option_names(first);

    for variant in iter {
        let found = option_names(variant);
        if found != expected {
            return Err(OptionMismatch {
                variant_id: variant.id.clone(),
                expected,
                found,
            });
        }
    }
    Ok(())
}

fn option_names(variant: &ProductVariant) -> BTreeSet<String> {
    variant
        .selected_options
        .iter()
        .map(|o| o.name.to_lowercase())
        .collect()
}
