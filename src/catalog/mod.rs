//! Admin GraphQL client for the external catalog platform.
//!
//! The platform is a network collaborator: failures surface as
//! `Error::Upstream` and are never retried here.

mod types;

pub use types::*;

use serde::Deserialize;
use serde_json::json;

use crate::error::{Error, Result};

const API_VERSION: &str = "2023-10";

pub struct CatalogClient {
    http: reqwest::Client,
    endpoint: String,
    access_token: String,
}

impl CatalogClient {
    #[must_use]
    pub fn new(store_url: &str, access_token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: format!("{store_url}/admin/api/{API_VERSION}/graphql.json"),
            access_token: access_token.to_string(),
        }
    }

    async fn graphql<T: for<'de> Deserialize<'de>>(&self, body: serde_json::Value) -> Result<T> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("X-Shopify-Access-Token", &self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("catalog request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream(format!(
                "catalog returned status {status}"
            )));
        }

        let envelope: GraphQlResponse<T> = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("catalog response unreadable: {e}")))?;

        if let Some(errors) = envelope.errors {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(Error::Upstream(messages.join("; ")));
        }

        envelope
            .data
            .ok_or_else(|| Error::Upstream("catalog response carried no data".to_string()))
    }

    /// Fetches products with their preorder metafields, optionally filtered
    /// by the platform's own search syntax.
    pub async fn fetch_products(&self, search: Option<&str>) -> Result<Vec<CatalogProduct>> {
        let filter = match search.map(str::trim).filter(|s| !s.is_empty()) {
            Some(term) => format!(", query: \"{}\"", escape_query_term(term)),
            None => String::new(),
        };

        let query = format!(
            r#"query getProductsWithPreorderMetafields {{
              products(first: 50{filter}) {{
                edges {{
                  node {{
                    id
                    title
                    variants(first: 20) {{
                      edges {{
                        node {{
                          id
                          title
                          inventoryQuantity
                          isPreorder: metafield(namespace: "custom", key: "is_preorder") {{ value }}
                          preorderLimit: metafield(namespace: "custom", key: "preorder_limit") {{ value }}
                        }}
                      }}
                    }}
                  }}
                }}
              }}
            }}"#
        );

        let data: ProductsData = self.graphql(json!({ "query": query })).await?;
        Ok(data.products.edges.into_iter().map(|e| e.node.into()).collect())
    }

    /// Fetches lightweight product hits for typeahead suggestions.
    pub async fn search_suggestions(&self, term: &str) -> Result<Vec<ProductSuggestion>> {
        let query = format!(
            r#"query getProductSuggestions {{
              products(first: 10, query: "{}") {{
                edges {{
                  node {{
                    id
                    title
                    variants(first: 1) {{
                      edges {{ node {{ id }} }}
                    }}
                  }}
                }}
              }}
            }}"#,
            escape_query_term(term)
        );

        let data: SuggestionsData = self.graphql(json!({ "query": query })).await?;
        Ok(data
            .products
            .edges
            .into_iter()
            .map(|e| ProductSuggestion {
                id: e.node.id,
                title: e.node.title,
                variant_count: e.node.variants.edges.len(),
            })
            .collect())
    }

    /// Pushes batched flag/limit changes as a single metafieldsSet mutation.
    pub async fn push_variant_updates(&self, updates: &[VariantUpdate]) -> Result<()> {
        let metafields = metafields_for_updates(updates);
        if metafields.is_empty() {
            return Ok(());
        }

        let mutation = r"mutation metafieldsSet($metafields: [MetafieldsSetInput!]!) {
          metafieldsSet(metafields: $metafields) {
            metafields { id }
            userErrors { field message }
          }
        }";

        let data: MetafieldsSetData = self
            .graphql(json!({
                "query": mutation,
                "variables": { "metafields": metafields },
            }))
            .await?;

        let user_errors = data.metafields_set.user_errors;
        if !user_errors.is_empty() {
            let messages: Vec<String> = user_errors.into_iter().map(|e| e.message).collect();
            return Err(Error::Upstream(messages.join("; ")));
        }
        Ok(())
    }
}

/// Strips characters that would break out of the embedded search string.
fn escape_query_term(term: &str) -> String {
    term.chars().filter(|c| *c != '"' && *c != '\\').collect()
}

fn metafields_for_updates(updates: &[VariantUpdate]) -> Vec<serde_json::Value> {
    let mut metafields = Vec::new();
    for update in updates {
        if let Some(is_preorder) = update.is_preorder {
            metafields.push(json!({
                "ownerId": update.id,
                "namespace": "custom",
                "key": "is_preorder",
                "type": "boolean",
                "value": is_preorder.to_string(),
            }));
        }
        if let Some(limit) = update.preorder_limit {
            metafields.push(json!({
                "ownerId": update.id,
                "namespace": "custom",
                "key": "preorder_limit",
                "type": "integer",
                "value": limit.to_string(),
            }));
        }
    }
    metafields
}

// Wire shapes for the GraphQL envelope and the queries above.

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct Connection<T> {
    edges: Vec<Edge<T>>,
}

#[derive(Debug, Deserialize)]
struct Edge<T> {
    node: T,
}

#[derive(Debug, Deserialize)]
struct ProductsData {
    products: Connection<ProductNode>,
}

#[derive(Debug, Deserialize)]
struct ProductNode {
    id: String,
    title: String,
    variants: Connection<VariantNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariantNode {
    id: String,
    title: String,
    #[serde(default)]
    inventory_quantity: Option<i64>,
    is_preorder: Option<MetafieldValue>,
    preorder_limit: Option<MetafieldValue>,
}

#[derive(Debug, Deserialize)]
struct MetafieldValue {
    value: String,
}

#[derive(Debug, Deserialize)]
struct SuggestionsData {
    products: Connection<SuggestionNode>,
}

#[derive(Debug, Deserialize)]
struct SuggestionNode {
    id: String,
    title: String,
    variants: Connection<IdNode>,
}

#[derive(Debug, Deserialize)]
struct IdNode {
    #[allow(dead_code)]
    id: String,
}

#[derive(Debug, Deserialize)]
struct MetafieldsSetData {
    #[serde(rename = "metafieldsSet")]
    metafields_set: MetafieldsSetPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetafieldsSetPayload {
    #[serde(default)]
    user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
struct UserError {
    message: String,
}

impl From<ProductNode> for CatalogProduct {
    fn from(node: ProductNode) -> Self {
        Self {
            id: node.id,
            title: node.title,
            variants: node
                .variants
                .edges
                .into_iter()
                .map(|e| e.node.into())
                .collect(),
        }
    }
}

impl From<VariantNode> for CatalogVariant {
    fn from(node: VariantNode) -> Self {
        Self {
            id: node.id,
            title: node.title,
            inventory_quantity: node.inventory_quantity.unwrap_or(0),
            is_preorder: node
                .is_preorder
                .is_some_and(|m| m.value.eq_ignore_ascii_case("true")),
            preorder_limit: node
                .preorder_limit
                .and_then(|m| m.value.parse().ok())
                .unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_query_term() {
        assert_eq!(escape_query_term(r#"blue "mug"\"#), "blue mug");
        assert_eq!(escape_query_term("plain"), "plain");
    }

    #[test]
    fn test_product_response_conversion() {
        let raw = serde_json::json!({
            "data": {
                "products": {
                    "edges": [{
                        "node": {
                            "id": "gid://shopify/Product/1",
                            "title": "Blue Mug",
                            "variants": {
                                "edges": [{
                                    "node": {
                                        "id": "gid://shopify/ProductVariant/11",
                                        "title": "Blue",
                                        "inventoryQuantity": 3,
                                        "isPreorder": { "value": "true" },
                                        "preorderLimit": { "value": "5" }
                                    }
                                }, {
                                    "node": {
                                        "id": "gid://shopify/ProductVariant/12",
                                        "title": "Red",
                                        "inventoryQuantity": null,
                                        "isPreorder": null,
                                        "preorderLimit": null
                                    }
                                }]
                            }
                        }
                    }]
                }
            }
        });

        let envelope: GraphQlResponse<ProductsData> = serde_json::from_value(raw).unwrap();
        let products: Vec<CatalogProduct> = envelope
            .data
            .unwrap()
            .products
            .edges
            .into_iter()
            .map(|e| e.node.into())
            .collect();

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].title, "Blue Mug");

        let blue = &products[0].variants[0];
        assert!(blue.is_preorder);
        assert_eq!(blue.preorder_limit, 5);
        assert_eq!(blue.inventory_quantity, 3);

        let red = &products[0].variants[1];
        assert!(!red.is_preorder);
        assert_eq!(red.preorder_limit, 0);
        assert_eq!(red.inventory_quantity, 0);
    }

    #[test]
    fn test_metafields_for_updates() {
        let updates = [
            VariantUpdate {
                id: "v1".to_string(),
                is_preorder: Some(true),
                preorder_limit: Some(7),
            },
            VariantUpdate {
                id: "v2".to_string(),
                is_preorder: None,
                preorder_limit: None,
            },
        ];

        let metafields = metafields_for_updates(&updates);
        assert_eq!(metafields.len(), 2);
        assert_eq!(metafields[0]["key"], "is_preorder");
        assert_eq!(metafields[0]["value"], "true");
        assert_eq!(metafields[1]["key"], "preorder_limit");
        assert_eq!(metafields[1]["value"], "7");
    }
}
