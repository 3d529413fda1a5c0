//! DuckDB store: predicates, region scoping, ordering and paging.

mod common;

use common::{setup_sample_store, OTHER_REGION, REGION};
use market_view::{
    FavoriteItem, Filter, MarketQuery, MarketStore, PageWindow, SortDirection, SortField, SortSpec,
};

fn names(page: &market_view::MarketPage) -> Vec<&str> {
    page.items.iter().map(|i| i.name.as_str()).collect()
}

fn query(filter: &Filter, sort: SortSpec, page: PageWindow, favorites: &[FavoriteItem]) -> MarketQuery {
    MarketQuery::build(filter, sort, page, favorites).unwrap()
}

#[test]
fn sample_rows_are_loaded() {
    let store = setup_sample_store();
    assert_eq!(store.count().unwrap(), 8);
}

#[test]
fn category_and_subcategory_are_equality_predicates() {
    let store = setup_sample_store();
    let filter = Filter::favorites(REGION)
        .with_category("Enhancement Material".into(), Some("Additional Honing Materials".into()));
    let page = store
        .query_blocking(&query(&filter, SortSpec::default(), PageWindow::default(), &[]))
        .unwrap();
    assert_eq!(names(&page), vec!["Solar Blessing", "Solar Grace"]);
    assert!(!page.has_more);
}

#[test]
fn results_are_scoped_to_region() {
    let store = setup_sample_store();
    let filter = Filter::favorites(OTHER_REGION).with_search("solar");
    let page = store
        .query_blocking(&query(&filter, SortSpec::default(), PageWindow::default(), &[]))
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, "euw-solar-grace");
    assert_eq!(page.items[0].avg_price, Some(20.0));
}

#[test]
fn search_is_case_insensitive_substring() {
    let store = setup_sample_store();
    let filter = Filter::favorites(REGION).with_search("IRON");
    let page = store
        .query_blocking(&query(&filter, SortSpec::default(), PageWindow::default(), &[]))
        .unwrap();
    assert_eq!(names(&page), vec!["Heavy Iron Ore", "Iron Ore"]);
}

#[test]
fn favorites_join_on_name() {
    let store = setup_sample_store();
    let favorites = vec![
        FavoriteItem {
            name: "Solar Grace".into(),
            rarity: 2,
        },
        FavoriteItem {
            name: "HP Potion".into(),
            rarity: 1,
        },
    ];
    let filter = Filter::favorites(REGION);
    let page = store
        .query_blocking(&query(&filter, SortSpec::default(), PageWindow::default(), &favorites))
        .unwrap();
    assert_eq!(names(&page), vec!["HP Potion", "Solar Grace"]);
}

#[test]
fn no_favorites_selects_nothing() {
    let store = setup_sample_store();
    let filter = Filter::favorites(REGION);
    let page = store
        .query_blocking(&query(&filter, SortSpec::default(), PageWindow::default(), &[]))
        .unwrap();
    assert!(page.items.is_empty());
    assert!(!page.has_more);
}

#[test]
fn missing_prices_sort_last_in_both_directions() {
    let store = setup_sample_store();
    let filter = Filter::favorites(REGION).with_category("Trader".into(), None);

    for direction in [SortDirection::Asc, SortDirection::Desc] {
        let page = store
            .query_blocking(&query(
                &filter,
                SortSpec::new(SortField::AvgPrice, direction),
                PageWindow::default(),
                &[],
            ))
            .unwrap();
        assert_eq!(names(&page), vec!["Heavy Iron Ore", "Iron Ore"]);
    }
}

#[test]
fn sort_by_updated_at_descending() {
    let store = setup_sample_store();
    let filter = Filter::favorites(REGION)
        .with_category("Enhancement Material".into(), None);
    let page = store
        .query_blocking(&query(
            &filter,
            SortSpec::new(SortField::UpdatedAt, SortDirection::Desc),
            PageWindow::default(),
            &[],
        ))
        .unwrap();
    assert_eq!(
        names(&page),
        vec![
            "Solar Grace",
            "Honor Leapstone",
            "Solar Blessing",
            "Basic Oreha Fusion Material"
        ]
    );
    assert!(page.items[0].updated_at.is_some());
}

#[test]
fn pages_report_whether_more_rows_follow() {
    let store = setup_sample_store();
    let filter = Filter::favorites(REGION).with_category("Enhancement Material".into(), None);
    let sort = SortSpec::new(SortField::Name, SortDirection::Asc);

    let first = store
        .query_blocking(&query(&filter, sort, PageWindow::new(0, 3), &[]))
        .unwrap();
    assert_eq!(
        names(&first),
        vec!["Basic Oreha Fusion Material", "Honor Leapstone", "Solar Blessing"]
    );
    assert!(first.has_more);

    let second = store
        .query_blocking(&query(&filter, sort, PageWindow::new(1, 3), &[]))
        .unwrap();
    assert_eq!(names(&second), vec!["Solar Grace"]);
    assert!(!second.has_more);
}

#[test]
fn inserted_items_are_queryable() {
    let store = setup_sample_store();
    let mut item = common::item("na-crystallized-guardian-stone", "Crystallized Guardian Stone");
    item.category = "Enhancement Material".into();
    item.subcategory = "Honing Materials".into();
    item.low_price = Some(0.5);
    store.insert(REGION, &[item.clone()]).unwrap();

    let filter = Filter::favorites(REGION).with_search("guardian");
    let page = store
        .query_blocking(&query(&filter, SortSpec::default(), PageWindow::default(), &[]))
        .unwrap();
    assert_eq!(page.items, vec![item]);
}

#[tokio::test]
async fn async_query_matches_blocking_query() {
    let store = setup_sample_store();
    let filter = Filter::favorites(REGION).with_category("Trader".into(), Some("Mining Loot".into()));
    let q = query(&filter, SortSpec::default(), PageWindow::default(), &[]);
    let blocking = store.query_blocking(&q).unwrap();
    let awaited = store.query(&q).await.unwrap();
    assert_eq!(blocking, awaited);
}
