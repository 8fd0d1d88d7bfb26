//! The contract of the storefront database: products, their categories, coupons and review
//! statistics.

use indexmap::IndexMap;
use query_engine_metadata::metadata::{
    Contract, FieldInfo, FieldType, JoinKind, RelationInfo, ResourceInfo, Resources,
};

/// The built-in storefront contract.
pub fn contract() -> Contract {
    Contract {
        resources: Resources(IndexMap::from([
            ("Product".to_string(), product()),
            ("Category".to_string(), category()),
            ("Coupon".to_string(), coupon()),
            ("FeedbackStat".to_string(), feedback_stat()),
        ])),
    }
}

fn fields(fields: &[(&str, FieldType, &str)]) -> IndexMap<String, FieldInfo> {
    fields
        .iter()
        .map(|(name, field_type, description)| {
            ((*name).to_string(), FieldInfo::new(*field_type, description))
        })
        .collect()
}

fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_string()).collect()
}

fn product() -> ResourceInfo {
    ResourceInfo {
        view: "products".to_string(),
        description: Some("Products on sale on the website".to_string()),
        synonyms: names(&["products", "san_pham", "sản phẩm", "sp"]),
        fields: fields(&[
            ("id", FieldType::Text, "Product id"),
            ("category_id", FieldType::Identifier, "Id of the product's category"),
            ("title", FieldType::Text, "Product name"),
            ("origin_price", FieldType::Number, "Price before discount"),
            ("sale_price", FieldType::Number, "Price after discount"),
            ("discount", FieldType::Number, "Discount in percent"),
            ("description", FieldType::Text, "Product description"),
            ("quantity", FieldType::Number, "Units in stock"),
            ("deleted", FieldType::Boolean, "Whether the product was removed from sale"),
            ("created_at", FieldType::Timestamp, "When the product was added"),
        ]),
        default_select: names(&["id", "title", "sale_price", "discount"]),
        filterable: true,
        sortable: true,
        relations: IndexMap::from([
            (
                "Category".to_string(),
                RelationInfo {
                    kind: JoinKind::Inner,
                    local_field: "category_id".to_string(),
                    target_resource: "Category".to_string(),
                    target_field: "id".to_string(),
                    alias: "c".to_string(),
                },
            ),
            (
                "FeedbackStat".to_string(),
                RelationInfo {
                    kind: JoinKind::Left,
                    local_field: "id".to_string(),
                    target_resource: "FeedbackStat".to_string(),
                    target_field: "product_id".to_string(),
                    alias: "fs".to_string(),
                },
            ),
        ]),
    }
}

fn category() -> ResourceInfo {
    ResourceInfo {
        view: "categories".to_string(),
        description: Some("Product categories".to_string()),
        synonyms: names(&["category", "categories", "danh_muc", "danh mục"]),
        fields: fields(&[
            ("id", FieldType::Identifier, "Category id"),
            ("name", FieldType::Text, "Category name, e.g. phones or laptops"),
            ("created_at", FieldType::Timestamp, "When the category was created"),
        ]),
        default_select: names(&["id", "name"]),
        filterable: true,
        sortable: true,
        relations: IndexMap::new(),
    }
}

fn coupon() -> ResourceInfo {
    ResourceInfo {
        view: "coupons".to_string(),
        description: Some("Discount coupons".to_string()),
        synonyms: names(&["coupons", "voucher", "vouchers", "khuyen_mai", "khuyến mãi", "km"]),
        fields: fields(&[
            ("code", FieldType::Text, "Coupon code"),
            ("discount", FieldType::Number, "Discount in percent"),
            ("expiration_date", FieldType::Timestamp, "Last day the coupon can be used"),
            ("expired", FieldType::Boolean, "Whether the coupon has expired"),
            ("quantity", FieldType::Number, "Coupons left"),
            ("created_at", FieldType::Timestamp, "When the coupon was created"),
        ]),
        default_select: names(&["code", "discount", "expiration_date"]),
        filterable: true,
        sortable: true,
        relations: IndexMap::new(),
    }
}

fn feedback_stat() -> ResourceInfo {
    ResourceInfo {
        view: "v_feedback_stats".to_string(),
        description: Some("Review statistics per product".to_string()),
        synonyms: vec![],
        fields: fields(&[
            ("product_id", FieldType::Text, "Product id"),
            ("avg_star", FieldType::Number, "Average star rating"),
            ("review_count", FieldType::Number, "Number of reviews"),
            ("last_review_at", FieldType::Timestamp, "When the last review was written"),
        ]),
        default_select: names(&["product_id", "avg_star", "review_count"]),
        filterable: false,
        sortable: false,
        relations: IndexMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storefront_contract_is_consistent() {
        assert_eq!(contract().check(), Ok(()));
    }

    #[test]
    fn storefront_resources_are_declared_in_order() {
        assert_eq!(
            contract().resource_names(),
            vec!["Product", "Category", "Coupon", "FeedbackStat"]
        );
    }
}
