use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

fn first_page() -> u64 {
    1
}

/// One page of a backend listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default = "first_page")]
    pub current_page: u64,
    #[serde(default)]
    pub per_page: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "first_page")]
    pub last_page: u64,
}

/// The shapes list endpoints answer with.
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Wrapped { data: Page<T> },
    Paged(Page<T>),
    Plain(Vec<T>),
}

impl<T> From<Listing<T>> for Page<T> {
    fn from(listing: Listing<T>) -> Self {
        match listing {
            Listing::Wrapped { data } | Listing::Paged(data) => data,
            Listing::Plain(data) => Page::single(data),
        }
    }
}

impl<T> Page<T> {
    /// Wraps an unpaginated list.
    #[must_use]
    pub fn single(data: Vec<T>) -> Self {
        let total = data.len() as u64;
        Self {
            data,
            current_page: 1,
            per_page: total,
            total,
            last_page: 1,
        }
    }

    /// 1-based position of the record at `index` across all pages.
    #[must_use]
    pub fn row_number(&self, index: usize) -> u64 {
        let per_page = if self.per_page == 0 {
            self.data.len() as u64
        } else {
            self.per_page
        };
        self.current_page.saturating_sub(1) * per_page + index as u64 + 1
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.total.max(self.data.len() as u64)
    }

    #[must_use]
    pub fn previous(&self) -> Option<u64> {
        (self.current_page > 1).then(|| self.current_page - 1)
    }

    #[must_use]
    pub fn next(&self) -> Option<u64> {
        (self.current_page < self.last_page).then(|| self.current_page + 1)
    }
}

impl<T: DeserializeOwned> Page<T> {
    /// Reads any of the listing shapes the backend produces.
    ///
    /// # Errors
    ///
    /// Fails when the value is none of a paginator, a wrapped paginator or a
    /// plain array of records.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value::<Listing<T>>(value).map(Into::into)
    }
}
