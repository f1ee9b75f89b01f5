use std::collections::HashMap;

use serde::Serialize;

use crate::types::PreorderSetting;

/// One product in the aggregated view, grouping every configured variant
/// under its handle.
#[derive(Debug, Clone, Serialize)]
pub struct ProductGroup {
    pub handle: String,
    pub title: String,
    pub status: &'static str,
    pub variants: Vec<VariantView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariantView {
    pub title: String,
    pub sku: String,
    pub enabled: bool,
    pub limit: i64,
    pub text: String,
    /// Advisory only; order-consumption tracking is external.
    pub remaining: i64,
}

const PRODUCT_STATUS_ACTIVE: &str = "ACTIVE";

/// Derives a display title from a product handle: separators become spaces
/// and each word is capitalized. Display-only; the handle stays the identity.
#[must_use]
pub fn title_from_handle(handle: &str) -> String {
    handle
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Groups configuration rows into the per-product view, applying an optional
/// case-insensitive search filter.
///
/// A row survives the filter iff the term is a substring of the derived
/// title, the raw handle, or the variant title. Groups keep the insertion
/// order of the first matching row per handle; variants keep row order.
#[must_use]
pub fn build_product_view(rows: &[PreorderSetting], search: &str) -> Vec<ProductGroup> {
    let term = search.trim().to_lowercase();

    let mut groups: Vec<ProductGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let title = title_from_handle(&row.product_handle);

        if !term.is_empty() {
            let matches = title.to_lowercase().contains(&term)
                || row.product_handle.to_lowercase().contains(&term)
                || row.variant_title.to_lowercase().contains(&term);
            if !matches {
                continue;
            }
        }

        let position = match index.get(&row.product_handle) {
            Some(&position) => position,
            None => {
                groups.push(ProductGroup {
                    handle: row.product_handle.clone(),
                    title,
                    status: PRODUCT_STATUS_ACTIVE,
                    variants: Vec::new(),
                });
                index.insert(row.product_handle.clone(), groups.len() - 1);
                groups.len() - 1
            }
        };

        groups[position].variants.push(VariantView {
            title: row.variant_title.clone(),
            sku: row.variant_sku.clone(),
            enabled: row.is_preorder_enabled,
            limit: row.preorder_limit,
            text: row.preorder_text.clone(),
            remaining: row.preorder_limit,
        });
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row(handle: &str, variant: &str, enabled: bool, limit: i64, text: &str) -> PreorderSetting {
        PreorderSetting {
            account_id: "acc-1".to_string(),
            product_handle: handle.to_string(),
            variant_title: variant.to_string(),
            variant_sku: format!("{handle}-{variant}"),
            is_preorder_enabled: enabled,
            preorder_limit: limit,
            preorder_text: text.to_string(),
            last_updated: Utc::now(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_title_from_handle() {
        assert_eq!(title_from_handle("blue-mug"), "Blue Mug");
        assert_eq!(title_from_handle("vintage_coffee_cup"), "Vintage Coffee Cup");
        assert_eq!(title_from_handle("mug"), "Mug");
        assert_eq!(title_from_handle(""), "");
    }

    #[test]
    fn test_groups_by_handle_in_first_seen_order() {
        let rows = [
            row("red-cup", "Small", false, 0, ""),
            row("blue-mug", "Blue", true, 5, "Ships soon"),
            row("red-cup", "Large", true, 2, ""),
        ];

        let view = build_product_view(&rows, "");
        assert_eq!(view.len(), 2);
        assert_eq!(view[0].handle, "red-cup");
        assert_eq!(view[0].title, "Red Cup");
        assert_eq!(view[0].variants.len(), 2);
        assert_eq!(view[0].variants[0].title, "Small");
        assert_eq!(view[0].variants[1].title, "Large");
        assert_eq!(view[1].handle, "blue-mug");
    }

    #[test]
    fn test_variant_fields_carried_through() {
        let rows = [row("blue-mug", "Blue", true, 5, "Ships in 2 weeks")];

        let view = build_product_view(&rows, "");
        let variant = &view[0].variants[0];
        assert_eq!(variant.sku, "blue-mug-Blue");
        assert!(variant.enabled);
        assert_eq!(variant.limit, 5);
        assert_eq!(variant.text, "Ships in 2 weeks");
        assert_eq!(variant.remaining, 5);
        assert_eq!(view[0].status, "ACTIVE");
    }

    #[test]
    fn test_search_filters_by_handle() {
        let rows = [
            row("blue-mug", "Default", true, 5, ""),
            row("red-cup", "Default", false, 0, ""),
        ];

        let view = build_product_view(&rows, "mug");
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].handle, "blue-mug");
    }

    #[test]
    fn test_search_is_case_insensitive_and_matches_variant_title() {
        let rows = [
            row("tote-bag", "Forest Green", true, 3, ""),
            row("red-cup", "Default", false, 0, ""),
        ];

        let view = build_product_view(&rows, "GREEN");
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].handle, "tote-bag");
    }

    #[test]
    fn test_blank_search_returns_everything() {
        let rows = [
            row("blue-mug", "Default", true, 5, ""),
            row("red-cup", "Default", false, 0, ""),
        ];

        assert_eq!(build_product_view(&rows, "   ").len(), 2);
    }

    #[test]
    fn test_output_is_deterministic() {
        let rows = [
            row("blue-mug", "Blue", true, 5, ""),
            row("blue-mug", "Red", false, 0, ""),
            row("red-cup", "Default", true, 1, ""),
        ];

        let first = serde_json::to_string(&build_product_view(&rows, "u")).unwrap();
        let second = serde_json::to_string(&build_product_view(&rows, "u")).unwrap();
        assert_eq!(first, second);
    }
}
