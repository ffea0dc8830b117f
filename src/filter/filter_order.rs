use super::error::FilterError;
use super::types::{FilterOrderInfo, SortDirection, SortWhitelist};

pub struct FilterOrder;

impl FilterOrder {
    /// Parse `sort` query values (`field` or `field,asc|desc`) against the
    /// resource's whitelist of sortable properties.
    pub fn validate_and_parse(sort: &[String], allowed: SortWhitelist) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let mut out = Vec::new();
        for value in sort {
            let mut parts = value.split(',').map(str::trim).filter(|p| !p.is_empty());
            let Some(property) = parts.next() else { continue };

            let column = allowed
                .iter()
                .find(|(name, _)| *name == property)
                .map(|(_, column)| column.to_string())
                .ok_or_else(|| FilterError::InvalidSort(property.to_string()))?;

            let sort = match parts.next() {
                None => SortDirection::Asc,
                Some(dir) if dir.eq_ignore_ascii_case("asc") => SortDirection::Asc,
                Some(dir) if dir.eq_ignore_ascii_case("desc") => SortDirection::Desc,
                Some(dir) => return Err(FilterError::InvalidSort(format!("{} {}", property, dir))),
            };
            out.push(FilterOrderInfo { column, sort });
        }
        Ok(out)
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() { return String::new(); }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("\"{}\" {}", i.column, i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALLOWED: SortWhitelist = &[("id", "id"), ("name", "name"), ("createDate", "created_date")];

    fn sort(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn maps_properties_to_columns() {
        let infos = FilterOrder::validate_and_parse(&sort(&["createDate,desc", "name"]), ALLOWED).unwrap();
        assert_eq!(FilterOrder::generate(&infos), "ORDER BY \"created_date\" DESC, \"name\" ASC");
    }

    #[test]
    fn rejects_unknown_property_and_direction() {
        assert!(matches!(
            FilterOrder::validate_and_parse(&sort(&["password"]), ALLOWED),
            Err(FilterError::InvalidSort(p)) if p == "password"
        ));
        assert!(FilterOrder::validate_and_parse(&sort(&["name,sideways"]), ALLOWED).is_err());
    }

    #[test]
    fn empty_sort_generates_nothing() {
        let infos = FilterOrder::validate_and_parse(&sort(&["", " , "]), ALLOWED).unwrap();
        assert!(infos.is_empty());
        assert_eq!(FilterOrder::generate(&infos), "");
    }
}
