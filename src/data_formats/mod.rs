mod request;
mod response;

pub use request::*;
pub use response::*;

use serde::{Deserialize, Serialize};

/// Sort parameters as they arrive on the query string. Anything unrecognized
/// silently falls back to the default instead of erroring.
#[derive(Deserialize, Serialize, Debug, Default)]
pub struct SortQuery {
    #[serde(default, rename = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(default, rename = "sortOrder")]
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    PublishedDate,
    LikeCount,
    ReadCount,
    Status,
}

impl SortKey {
    fn from_param(value: &str) -> Option<Self> {
        match value {
            "publishedDate" => Some(SortKey::PublishedDate),
            "likeCount" => Some(SortKey::LikeCount),
            "readCount" => Some(SortKey::ReadCount),
            "status" => Some(SortKey::Status),
            _ => None,
        }
    }

    /// Column the key maps to. Keys come from this closed set, never from
    /// raw user input, so the result is safe to splice into ORDER BY.
    pub fn column(self) -> &'static str {
        match self {
            SortKey::PublishedDate => "published_at",
            SortKey::LikeCount => "like_count",
            SortKey::ReadCount => "read_count",
            SortKey::Status => "status",
        }
    }

    pub fn param(self) -> &'static str {
        match self {
            SortKey::PublishedDate => "publishedDate",
            SortKey::LikeCount => "likeCount",
            SortKey::ReadCount => "readCount",
            SortKey::Status => "status",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn from_param(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("asc") {
            Some(SortOrder::Asc)
        } else if value.eq_ignore_ascii_case("desc") {
            Some(SortOrder::Desc)
        } else {
            None
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    pub fn param(self) -> &'static str {
        self.sql()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ArticleSort {
    pub key: SortKey,
    pub order: SortOrder,
}

impl ArticleSort {
    /// Resolves the raw query against the route's whitelist. The reader view
    /// does not sort by status; an invalid or disallowed key falls back to
    /// publishedDate, an invalid order to DESC.
    pub fn from_query(query: &SortQuery, allow_status: bool) -> Self {
        let key = query
            .sort_by
            .as_deref()
            .and_then(SortKey::from_param)
            .filter(|key| allow_status || *key != SortKey::Status)
            .unwrap_or(SortKey::PublishedDate);
        let order = query
            .sort_order
            .as_deref()
            .and_then(SortOrder::from_param)
            .unwrap_or(SortOrder::Desc);
        ArticleSort { key, order }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(sort_by: &str, sort_order: &str) -> SortQuery {
        SortQuery {
            sort_by: Some(sort_by.to_string()),
            sort_order: Some(sort_order.to_string()),
        }
    }

    #[test]
    fn valid_keys_parse() {
        let sort = ArticleSort::from_query(&query("likeCount", "asc"), true);
        assert_eq!(sort.key, SortKey::LikeCount);
        assert_eq!(sort.order, SortOrder::Asc);
    }

    #[test]
    fn invalid_key_falls_back_to_published_date_desc() {
        let sort = ArticleSort::from_query(&query("'; DROP TABLE articles;--", "sideways"), true);
        assert_eq!(sort.key, SortKey::PublishedDate);
        assert_eq!(sort.order, SortOrder::Desc);
    }

    #[test]
    fn missing_params_use_defaults() {
        let sort = ArticleSort::from_query(&SortQuery::default(), true);
        assert_eq!(sort.key, SortKey::PublishedDate);
        assert_eq!(sort.order, SortOrder::Desc);
    }

    #[test]
    fn status_is_not_a_reader_sort_key() {
        let sort = ArticleSort::from_query(&query("status", "ASC"), false);
        assert_eq!(sort.key, SortKey::PublishedDate);

        let sort = ArticleSort::from_query(&query("status", "ASC"), true);
        assert_eq!(sort.key, SortKey::Status);
    }

    #[test]
    fn order_is_case_insensitive() {
        let sort = ArticleSort::from_query(&query("readCount", "ASC"), true);
        assert_eq!(sort.order, SortOrder::Asc);
        let sort = ArticleSort::from_query(&query("readCount", "desc"), true);
        assert_eq!(sort.order, SortOrder::Desc);
    }
}
