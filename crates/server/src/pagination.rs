use meigen_proto::Pagination;

pub const DEFAULT_PAGE_LIMIT: usize = 10;
pub const MAX_PAGE_LIMIT: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: usize,
    pub offset: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

fn parse_count(name: &str, raw: &str) -> Result<usize, String> {
    raw.trim()
        .parse::<usize>()
        .map_err(|_| format!("{name} must be a non-negative integer"))
}

impl PageRequest {
    /// Build from raw query values. `page` is 1-based and wins over `offset`.
    pub fn parse(
        limit: Option<&str>,
        offset: Option<&str>,
        page: Option<&str>,
        default_limit: usize,
    ) -> Result<Self, String> {
        let limit = match limit {
            Some(raw) => parse_count("limit", raw)?,
            None => default_limit,
        };
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(format!("limit must be between 1 and {MAX_PAGE_LIMIT}"));
        }
        let offset = match (page, offset) {
            (Some(raw), _) => {
                let page = parse_count("page", raw)?;
                if page == 0 {
                    return Err("page must be a positive integer".to_owned());
                }
                (page - 1)
                    .checked_mul(limit)
                    .ok_or_else(|| "page is out of range".to_owned())?
            }
            (None, Some(raw)) => parse_count("offset", raw)?,
            (None, None) => 0,
        };
        Ok(Self { limit, offset })
    }

    pub fn apply<T: Clone>(&self, items: &[T]) -> (Vec<T>, Pagination) {
        let total = items.len();
        let page: Vec<T> = items
            .iter()
            .skip(self.offset)
            .take(self.limit)
            .cloned()
            .collect();
        let meta = Pagination {
            page: self.offset / self.limit + 1,
            limit: self.limit,
            total,
            total_pages: total.div_ceil(self.limit),
        };
        (page, meta)
    }
}
