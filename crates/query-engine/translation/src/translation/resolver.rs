//! Resolve free-text resource names to canonical contract resources.

use std::collections::HashMap;

use query_engine_metadata::metadata::Contract;
use unicode_normalization::UnicodeNormalization;

/// Normalize a free-text name: NFKC, lowercase, and keep only ASCII letters and digits plus
/// Latin letters with diacritics. Whitespace, underscores and hyphens disappear with the rest.
pub fn normalize(name: &str) -> String {
    name.nfkc()
        .flat_map(char::to_lowercase)
        .filter(|c| is_kept(*c))
        .collect()
}

fn is_kept(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '\u{00C0}'..='\u{024F}' | '\u{1E00}'..='\u{1EFF}')
}

/// Strip a single trailing `s`.
pub fn singularize(name: &str) -> &str {
    name.strip_suffix('s').unwrap_or(name)
}

/// Normalized name -> canonical resource name.
#[derive(Debug, Clone, Default)]
pub struct ResourceIndex {
    entries: HashMap<String, String>,
}

impl ResourceIndex {
    /// Index every canonical name, its plural, and every synonym, each also in singular form.
    pub fn build(contract: &Contract) -> ResourceIndex {
        let mut index = ResourceIndex::default();
        for (name, resource) in &contract.resources.0 {
            let plural = format!("{name}s");
            let names = std::iter::once(name.as_str())
                .chain(resource.synonyms.iter().map(String::as_str))
                .chain(std::iter::once(plural.as_str()));
            for alternative in names {
                let normalized = normalize(alternative);
                index.insert(singularize(&normalized).to_string(), name);
                index.insert(normalized, name);
            }
        }
        index
    }

    fn insert(&mut self, key: String, canonical: &str) {
        if key.is_empty() {
            return;
        }
        if let Some(previous) = self.entries.insert(key.clone(), canonical.to_string()) {
            if previous != canonical {
                tracing::warn!(
                    key = %key,
                    previous = %previous,
                    canonical = canonical,
                    "resource name resolves to more than one resource, keeping the last"
                );
            }
        }
    }

    /// Look up the normalized name, then its singular form.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        let normalized = normalize(name);
        self.entries
            .get(&normalized)
            .or_else(|| self.entries.get(singularize(&normalized)))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_engine_metadata::metadata::{FieldInfo, FieldType, ResourceInfo, Resources};

    fn resource(view: &str, synonyms: &[&str]) -> ResourceInfo {
        ResourceInfo {
            view: view.to_string(),
            description: None,
            synonyms: synonyms.iter().map(|s| (*s).to_string()).collect(),
            fields: [("id".to_string(), FieldInfo::new(FieldType::Text, "id"))].into(),
            default_select: vec!["id".to_string()],
            filterable: true,
            sortable: true,
            relations: Default::default(),
        }
    }

    fn contract() -> Contract {
        Contract {
            resources: Resources(
                [
                    (
                        "Product".to_string(),
                        resource("products", &["san_pham", "sản phẩm", "sp"]),
                    ),
                    (
                        "Coupon".to_string(),
                        resource("coupons", &["voucher", "khuyến mãi"]),
                    ),
                ]
                .into(),
            ),
        }
    }

    #[test]
    fn normalizes_case_separators_and_symbols() {
        assert_eq!(normalize("  San_Pham - Mới! "), "sanphammới");
        assert_eq!(normalize("FEEDBACK stats"), "feedbackstats");
    }

    #[test]
    fn normalization_composes_decomposed_diacritics() {
        // "sản phẩm" written with combining marks
        let decomposed = "sa\u{0309}n pha\u{0302}\u{0309}m";
        assert_eq!(normalize(decomposed), normalize("sản phẩm"));
    }

    #[test]
    fn resolves_names_plurals_and_synonyms() {
        let index = ResourceIndex::build(&contract());
        for name in [
            "Product",
            "products",
            "PRODUCTS",
            "san pham",
            "san-pham",
            "Sản Phẩm",
            "sp",
            "coupons",
            "Vouchers",
            "Khuyến mãi",
        ] {
            assert!(index.resolve(name).is_some(), "{name} should resolve");
        }
        assert_eq!(index.resolve("Sản Phẩm"), Some("Product"));
        assert_eq!(index.resolve("Vouchers"), Some("Coupon"));
    }

    #[test]
    fn unknown_names_do_not_resolve() {
        let index = ResourceIndex::build(&contract());
        assert_eq!(index.resolve("orders"), None);
        assert_eq!(index.resolve(""), None);
        assert_eq!(index.resolve("!!!"), None);
    }

    #[test]
    fn later_entries_win_on_collision() {
        let mut contract = contract();
        contract
            .resources
            .0
            .get_mut("Coupon")
            .unwrap()
            .synonyms
            .push("sp".to_string());
        let index = ResourceIndex::build(&contract);
        assert_eq!(index.resolve("sp"), Some("Coupon"));
    }
}
