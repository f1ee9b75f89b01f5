use serde::{Deserialize, Serialize};

/// A product as reported by the external catalog.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogProduct {
    pub id: String,
    pub title: String,
    pub variants: Vec<CatalogVariant>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogVariant {
    pub id: String,
    pub title: String,
    pub inventory_quantity: i64,
    pub is_preorder: bool,
    pub preorder_limit: i64,
}

/// A lightweight product hit for typeahead suggestions.
#[derive(Debug, Clone, Serialize)]
pub struct ProductSuggestion {
    pub id: String,
    pub title: String,
    pub variant_count: usize,
}

/// One flag/limit change pushed back to the catalog, keyed by variant
/// identity. Absent fields are left untouched upstream.
#[derive(Debug, Clone, Deserialize)]
pub struct VariantUpdate {
    pub id: String,
    #[serde(default)]
    pub is_preorder: Option<bool>,
    #[serde(default)]
    pub preorder_limit: Option<i64>,
}
