//! Store queries derived from the table state.
//!
//! A [`MarketQuery`] is the (Filter, SortSpec, PageWindow) triple after
//! validation, with favorites already joined down to the set of item
//! names they select.

use crate::config::MAX_PAGE_SIZE;
use crate::error::{MarketError, Result};
use crate::filter::{Filter, SelectionMode};
use crate::models::{FavoriteItem, MarketItem, PageWindow, SortSpec};
use crate::sql_builder::SqlBuilder;

/// The predicate of the active selection mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Items whose name is one of the favorites. Rarity is not part of the
    /// match.
    Names(Vec<String>),
    Category {
        category: String,
        subcategory: Option<String>,
    },
    /// Case-insensitive name substring.
    Search(String),
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketQuery {
    pub region: String,
    pub predicate: Predicate,
    pub sort: SortSpec,
    pub page: PageWindow,
}

/// One page of results and whether another page follows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketPage {
    pub items: Vec<MarketItem>,
    pub has_more: bool,
}

impl MarketQuery {
    /// Validate the inputs and build the query.
    pub fn build(
        filter: &Filter,
        sort: SortSpec,
        page: PageWindow,
        favorites: &[FavoriteItem],
    ) -> Result<Self> {
        validate_filter(filter)?;
        validate_page(page)?;

        let predicate = match filter.mode() {
            SelectionMode::Favorites => {
                let mut names: Vec<String> = Vec::with_capacity(favorites.len());
                for fav in favorites {
                    if !names.contains(&fav.name) {
                        names.push(fav.name.clone());
                    }
                }
                Predicate::Names(names)
            }
            SelectionMode::Category {
                category,
                subcategory,
            } => Predicate::Category {
                category: category.to_string(),
                subcategory: subcategory.map(str::to_string),
            },
            SelectionMode::Search(term) => Predicate::Search(term.to_string()),
            SelectionMode::All => Predicate::None,
        };

        Ok(Self {
            region: filter.region.clone(),
            predicate,
            sort,
            page,
        })
    }

    /// SQL for this query against a table with one row per (region, item).
    ///
    /// Fetches one row past the page so the caller can tell whether a next
    /// page exists. Ties on the sort column break on `id`.
    pub fn to_sql(&self, table: &str) -> (String, Vec<String>) {
        let mut qb = SqlBuilder::new(table);
        qb.where_eq("region", &self.region);

        match &self.predicate {
            Predicate::Names(names) => {
                let names: Vec<&str> = names.iter().map(String::as_str).collect();
                qb.where_in("name", &names);
            }
            Predicate::Category {
                category,
                subcategory,
            } => {
                qb.where_eq("category", category);
                if let Some(sub) = subcategory {
                    qb.where_eq("subcategory", sub);
                }
            }
            Predicate::Search(term) => {
                qb.where_contains("name", term);
            }
            Predicate::None => {}
        }

        qb.order_by(self.sort.field.column(), self.sort.direction.sql())
            .order_by("id", "ASC")
            .window(self.page.page_size + 1, self.page.offset());
        qb.build()
    }
}

/// Check that a filter can be turned into a query.
pub fn validate_filter(filter: &Filter) -> Result<()> {
    if filter.region.trim().is_empty() {
        return Err(MarketError::InvalidQuery("region is empty".into()));
    }
    let modes = [
        filter.favorites,
        filter.category.is_some(),
        filter.search.is_some(),
    ];
    if modes.iter().filter(|m| **m).count() > 1 {
        return Err(MarketError::InvalidQuery(
            "more than one selection mode is active".into(),
        ));
    }
    if filter.subcategory.is_some() && filter.category.is_none() {
        return Err(MarketError::InvalidQuery(
            "subcategory given without a category".into(),
        ));
    }
    if matches!(filter.search.as_deref(), Some(s) if s.trim().is_empty()) {
        return Err(MarketError::InvalidQuery("search term is empty".into()));
    }
    Ok(())
}

pub fn validate_page(page: PageWindow) -> Result<()> {
    if page.page_size == 0 || page.page_size > MAX_PAGE_SIZE {
        return Err(MarketError::InvalidQuery(format!(
            "page size {} outside 1..={}",
            page.page_size, MAX_PAGE_SIZE
        )));
    }
    if page.page_index.checked_mul(page.page_size).is_none() {
        return Err(MarketError::InvalidQuery(format!(
            "page index {} out of range",
            page.page_index
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SortDirection, SortField};

    fn fav(name: &str, rarity: u8) -> FavoriteItem {
        FavoriteItem {
            name: name.into(),
            rarity,
        }
    }

    #[test]
    fn favorites_join_on_name_only() {
        let filter = Filter::favorites("Europe West");
        let q = MarketQuery::build(
            &filter,
            SortSpec::default(),
            PageWindow::default(),
            &[fav("Solar Grace", 1), fav("Solar Grace", 2), fav("Oreha", 3)],
        )
        .unwrap();
        assert_eq!(
            q.predicate,
            Predicate::Names(vec!["Solar Grace".into(), "Oreha".into()])
        );
    }

    #[test]
    fn sql_scopes_region_and_pages() {
        let filter = Filter::favorites("Europe West").with_category("Trader".into(), None);
        let q = MarketQuery::build(
            &filter,
            SortSpec::new(SortField::LowPrice, SortDirection::Desc),
            PageWindow::new(2, 10),
            &[],
        )
        .unwrap();
        let (sql, params) = q.to_sql("markets");
        assert!(sql.contains("WHERE \"region\" = ? AND \"category\" = ?"));
        assert!(sql.contains("ORDER BY \"lowPrice\" DESC NULLS LAST, \"id\" ASC NULLS LAST"));
        assert!(sql.ends_with("LIMIT 11\nOFFSET 20"));
        assert_eq!(params, vec!["Europe West", "Trader"]);
    }

    #[test]
    fn conflicting_modes_are_rejected() {
        let mut filter = Filter::favorites("Europe West");
        filter.search = Some("oreha".into());
        let err = MarketQuery::build(&filter, SortSpec::default(), PageWindow::default(), &[])
            .unwrap_err();
        assert!(matches!(err, MarketError::InvalidQuery(_)));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let filter = Filter::favorites("Europe West");
        assert!(
            MarketQuery::build(&filter, SortSpec::default(), PageWindow::new(0, 0), &[]).is_err()
        );
    }
}
