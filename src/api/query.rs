use crate::config::PaginationConfig;
use crate::error::ApiError;
use crate::filter::CertificateSearch;
use crate::types::PageRequest;

/// Query string parsed into ordered key/value pairs. Keys may repeat
/// (`sort=name&sort=id`, `tags=a&tags=b`).
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn parse(raw: Option<&str>) -> Self {
        let pairs = raw
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        Self { pairs }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs.iter().filter(|(k, _)| k == key).map(|(_, v)| v.as_str()).collect()
    }

    pub fn optional_i64(&self, key: &str) -> Result<Option<i64>, ApiError> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => v
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| ApiError::field_error(key, format!("'{}' is not a valid number", v))),
        }
    }

    pub fn required_i64(&self, key: &str) -> Result<i64, ApiError> {
        self.optional_i64(key)?
            .ok_or_else(|| ApiError::field_error(key, "Required request parameter is not present"))
    }

    /// `page` (0-based), `size` (capped at the configured maximum) and `sort`
    pub fn page_request(&self, pagination: &PaginationConfig) -> Result<PageRequest, ApiError> {
        let page = self.optional_i64("page")?.unwrap_or(0);
        if page < 0 {
            return Err(ApiError::field_error("page", "must not be negative"));
        }

        let size = self.optional_i64("size")?.unwrap_or(pagination.default_size);
        if size < 1 {
            return Err(ApiError::field_error("size", "must be at least 1"));
        }

        let request = PageRequest {
            page,
            size: size.min(pagination.max_size),
            sort: self.get_all("sort").into_iter().map(str::to_string).collect(),
        };
        if request.checked_offset().is_none() {
            return Err(ApiError::field_error("page", "is too large"));
        }
        Ok(request)
    }

    /// `name`, `description` and `tags` (repeated or comma separated); blank values are ignored
    pub fn certificate_search(&self) -> CertificateSearch {
        let non_blank = |v: &str| {
            let v = v.trim();
            (!v.is_empty()).then(|| v.to_string())
        };

        CertificateSearch {
            name: self.get("name").and_then(non_blank),
            description: self.get("description").and_then(non_blank),
            tags: self
                .get_all("tags")
                .into_iter()
                .flat_map(|v| v.split(','))
                .filter_map(non_blank)
                .collect(),
        }
    }
}
