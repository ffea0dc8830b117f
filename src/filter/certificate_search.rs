use serde_json::{json, Value};

use super::types::{Condition, FilterOp, FilterWhereInfo, Relation};

pub const CERTIFICATE_TAGS: Relation = Relation {
    link_table: "certificate_tag",
    owner_column: "cert_id",
    target_column: "tag_id",
    target_table: "tag",
};

/// Certificate search parameters. Every present parameter adds one ANDed
/// predicate; an empty search lists everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateSearch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

impl CertificateSearch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.tags.is_empty()
    }

    pub fn to_conditions(&self) -> Vec<Condition> {
        let mut conditions = vec![];

        if let Some(name) = &self.name {
            let pattern = contains_pattern(name);
            conditions.push(Condition::Any(vec![
                FilterWhereInfo::new("name", FilterOp::Like, pattern.clone()),
                FilterWhereInfo::new("description", FilterOp::Like, pattern),
            ]));
        }

        if let Some(description) = &self.description {
            conditions.push(Condition::Field(FilterWhereInfo::new(
                "description",
                FilterOp::Like,
                contains_pattern(description),
            )));
        }

        if !self.tags.is_empty() {
            let names: Vec<Value> = self.tags.iter().map(|t| json!(t)).collect();
            conditions.push(Condition::Related {
                relation: CERTIFICATE_TAGS,
                info: FilterWhereInfo::new("name", FilterOp::In, Value::Array(names)),
            });
        }

        conditions
    }
}

/// `%value%` with LIKE metacharacters escaped (backslash is Postgres' default escape)
pub fn contains_pattern(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('%');
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Filter, FilterData};

    fn search_sql(search: &CertificateSearch) -> (String, Vec<Value>) {
        let mut filter = Filter::new("gift_certificate").unwrap();
        filter
            .assign(FilterData { conditions: search.to_conditions(), ..Default::default() })
            .unwrap();
        let sql = filter.to_where_sql().unwrap();
        (sql.query, sql.params)
    }

    #[test]
    fn no_parameters_means_no_restriction() {
        let search = CertificateSearch::default();
        assert!(search.is_empty());
        assert_eq!(search_sql(&search), (String::new(), vec![]));
    }

    #[test]
    fn name_matches_name_or_description() {
        let search = CertificateSearch { name: Some("spa".into()), ..Default::default() };
        let (sql, params) = search_sql(&search);
        assert_eq!(sql, "(\"name\" LIKE $1 OR \"description\" LIKE $2)");
        assert_eq!(params, vec![json!("%spa%"), json!("%spa%")]);
    }

    #[test]
    fn all_parameters_are_anded() {
        let search = CertificateSearch {
            name: Some("spa".into()),
            description: Some("relax".into()),
            tags: vec!["wellness".into(), "gift".into()],
        };
        let (sql, params) = search_sql(&search);
        assert_eq!(
            sql,
            "(\"name\" LIKE $1 OR \"description\" LIKE $2) AND \"description\" LIKE $3 AND \
             EXISTS (SELECT 1 FROM \"certificate_tag\" l JOIN \"tag\" r ON r.\"id\" = l.\"tag_id\" \
             WHERE l.\"cert_id\" = \"gift_certificate\".\"id\" AND r.\"name\" IN ($4, $5))"
        );
        assert_eq!(params, vec![json!("%spa%"), json!("%spa%"), json!("%relax%"), json!("wellness"), json!("gift")]);
    }

    #[test]
    fn tags_only() {
        let search = CertificateSearch { tags: vec!["x".into()], ..Default::default() };
        let (sql, params) = search_sql(&search);
        assert!(sql.starts_with("EXISTS (SELECT 1 FROM \"certificate_tag\""));
        assert!(sql.ends_with("r.\"name\" IN ($1))"));
        assert_eq!(params, vec![json!("x")]);
    }

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(contains_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
        assert_eq!(contains_pattern(""), "%%");
    }
}
