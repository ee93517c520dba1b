//! Explicit table/column names for the host catalog's join tables.
//!
//! The mapping is chosen once at startup (built-in default or a YAML file)
//! and checked against the live database before any write. Nothing here is
//! guessed from `information_schema` at runtime.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::reconcile::MembershipKind;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("identifier pattern is valid")
});

/// A many-to-many join table: `owner_column` points at the entity that holds
/// the membership, `member_column` at the thing it is a member of / holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinTable {
    pub table: String,
    pub owner_column: String,
    pub member_column: String,
}

impl JoinTable {
    fn new(table: &str, owner_column: &str, member_column: &str) -> Self {
        Self {
            table: table.to_string(),
            owner_column: owner_column.to_string(),
            member_column: member_column.to_string(),
        }
    }
}

/// Asset links carry an ordering column besides the two ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetTable {
    #[serde(flatten)]
    pub join: JoinTable,
    pub position_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaMapping {
    pub version: String,
    pub product_facet_join: JoinTable,
    pub variant_facet_join: JoinTable,
    pub collection_variant_join: JoinTable,
    pub product_asset: AssetTable,
    pub variant_asset: AssetTable,
    pub collection_asset: AssetTable,
}

impl SchemaMapping {
    /// Default join-table layout of the catalog platform's v3 schema.
    #[must_use]
    pub fn vendure_v3() -> Self {
        Self {
            version: "vendure-v3".to_string(),
            product_facet_join: JoinTable::new(
                "product_facet_values_facet_value",
                "productId",
                "facetValueId",
            ),
            variant_facet_join: JoinTable::new(
                "product_variant_facet_values_facet_value",
                "productVariantId",
                "facetValueId",
            ),
            collection_variant_join: JoinTable::new(
                "collection_product_variants_product_variant",
                "collectionId",
                "productVariantId",
            ),
            product_asset: AssetTable {
                join: JoinTable::new("product_asset", "productId", "assetId"),
                position_column: "position".to_string(),
            },
            variant_asset: AssetTable {
                join: JoinTable::new("product_variant_asset", "productVariantId", "assetId"),
                position_column: "position".to_string(),
            },
            collection_asset: AssetTable {
                join: JoinTable::new("collection_asset", "collectionId", "assetId"),
                position_column: "position".to_string(),
            },
        }
    }

    /// The join table backing a membership kind.
    #[must_use]
    pub fn join_for(&self, kind: MembershipKind) -> &JoinTable {
        match kind {
            MembershipKind::ProductFacetValue => &self.product_facet_join,
            MembershipKind::VariantFacetValue => &self.variant_facet_join,
            MembershipKind::CollectionVariant => &self.collection_variant_join,
        }
    }

    /// Every `(table, column)` pair the mapping refers to, for startup checks.
    #[must_use]
    pub fn columns(&self) -> Vec<(&str, &str)> {
        let mut out = Vec::new();
        for join in [
            &self.product_facet_join,
            &self.variant_facet_join,
            &self.collection_variant_join,
            &self.product_asset.join,
            &self.variant_asset.join,
            &self.collection_asset.join,
        ] {
            out.push((join.table.as_str(), join.owner_column.as_str()));
            out.push((join.table.as_str(), join.member_column.as_str()));
        }
        for assets in [
            &self.product_asset,
            &self.variant_asset,
            &self.collection_asset,
        ] {
            out.push((assets.join.table.as_str(), assets.position_column.as_str()));
        }
        out
    }

    /// Reject names that would have to be escaped to be used as identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidIdentifier`] naming the first bad field.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let fields: [(&'static str, &str); 21] = [
            ("product_facet_join.table", &self.product_facet_join.table),
            (
                "product_facet_join.owner_column",
                &self.product_facet_join.owner_column,
            ),
            (
                "product_facet_join.member_column",
                &self.product_facet_join.member_column,
            ),
            ("variant_facet_join.table", &self.variant_facet_join.table),
            (
                "variant_facet_join.owner_column",
                &self.variant_facet_join.owner_column,
            ),
            (
                "variant_facet_join.member_column",
                &self.variant_facet_join.member_column,
            ),
            (
                "collection_variant_join.table",
                &self.collection_variant_join.table,
            ),
            (
                "collection_variant_join.owner_column",
                &self.collection_variant_join.owner_column,
            ),
            (
                "collection_variant_join.member_column",
                &self.collection_variant_join.member_column,
            ),
            ("product_asset.table", &self.product_asset.join.table),
            (
                "product_asset.owner_column",
                &self.product_asset.join.owner_column,
            ),
            (
                "product_asset.member_column",
                &self.product_asset.join.member_column,
            ),
            (
                "product_asset.position_column",
                &self.product_asset.position_column,
            ),
            ("variant_asset.table", &self.variant_asset.join.table),
            (
                "variant_asset.owner_column",
                &self.variant_asset.join.owner_column,
            ),
            (
                "variant_asset.member_column",
                &self.variant_asset.join.member_column,
            ),
            (
                "variant_asset.position_column",
                &self.variant_asset.position_column,
            ),
            ("collection_asset.table", &self.collection_asset.join.table),
            (
                "collection_asset.owner_column",
                &self.collection_asset.join.owner_column,
            ),
            (
                "collection_asset.member_column",
                &self.collection_asset.join.member_column,
            ),
            (
                "collection_asset.position_column",
                &self.collection_asset.position_column,
            ),
        ];

        for (field, value) in fields {
            if !IDENTIFIER.is_match(value) {
                return Err(SchemaError::InvalidIdentifier {
                    field,
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}
