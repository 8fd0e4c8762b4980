//! Listing order

use super::listing::Entry;

/// Field a listing can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Size,
    Date,
}

impl SortField {
    /// Unknown values yield `None`, which leaves a listing untouched
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "name" => Some(SortField::Name),
            "size" => Some(SortField::Size),
            "date" => Some(SortField::Date),
            _ => None,
        }
    }
}

/// Sort direction; anything but `desc` is ascending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Self {
        if value == "desc" {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }
}

/// Order entries in place; `None` is a no-op
pub fn sort_entries(entries: &mut [Entry], field: Option<SortField>, order: SortOrder) {
    let Some(field) = field else {
        return;
    };

    entries.sort_unstable_by(|a, b| {
        let ordering = match field {
            SortField::Name => a.name.as_bytes().cmp(b.name.as_bytes()),
            SortField::Size => a.size.cmp(&b.size),
            SortField::Date => a.modified_at.cmp(&b.modified_at),
        };
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}
