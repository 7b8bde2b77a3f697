/// Normalizes a free-form source header into a staging column identifier:
/// surrounding whitespace is trimmed, the name is lower-cased and every
/// space becomes an underscore.
pub fn normalize_col_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Returns true if `name` is a plain (optionally schema-qualified) SQL
/// identifier such as `staging_sales` or `public.staging_sales`.
pub fn is_plain_identifier(name: &str) -> bool {
    let parts = name.split('.').collect::<Vec<_>>();
    if parts.is_empty() || parts.len() > 2 {
        return false;
    }

    parts.iter().all(|part| {
        let mut chars = part.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() || first == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_col_name() {
        assert_eq!(normalize_col_name("Order ID"), "order_id");
        assert_eq!(normalize_col_name("  Customer Age "), "customer_age");
        assert_eq!(normalize_col_name("Total  Amount"), "total__amount");
        assert_eq!(normalize_col_name("returned"), "returned");
        assert_eq!(normalize_col_name(""), "");
    }

    #[test]
    fn test_is_plain_identifier() {
        assert!(is_plain_identifier("staging_ecommerce_sales"));
        assert!(is_plain_identifier("public.staging_ecommerce_sales"));
        assert!(is_plain_identifier("_t1"));
        assert!(!is_plain_identifier("1table"));
        assert!(!is_plain_identifier("a.b.c"));
        assert!(!is_plain_identifier("sales; DROP TABLE x"));
        assert!(!is_plain_identifier(""));
    }
}
