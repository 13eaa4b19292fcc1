//! Behaviour tests for offset page navigation.

use std::cell::RefCell;

use pagination::{Page, PageRequest};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

#[derive(Default)]
struct NavigationWorld {
    rows: RefCell<Vec<u64>>,
    page: RefCell<Option<Page<u64>>>,
}

#[fixture]
fn world() -> NavigationWorld {
    NavigationWorld::default()
}

#[given("a result set of {count} rows")]
fn a_result_set_of_rows(world: &NavigationWorld, count: u64) {
    *world.rows.borrow_mut() = (1..=count).collect();
}

#[when("page {page} is requested with limit {limit}")]
fn page_is_requested(world: &NavigationWorld, page: u32, limit: u32) {
    let request = PageRequest::new(page, limit).expect("valid page request");
    let rows = world.rows.borrow();
    let offset = usize::try_from(request.offset()).expect("offset fits usize");
    let limit = usize::try_from(request.limit()).expect("limit fits usize");
    let items: Vec<u64> = rows.iter().copied().skip(offset).take(limit).collect();
    let total = u64::try_from(rows.len()).expect("row count fits u64");
    *world.page.borrow_mut() = Some(Page::new(items, total, request));
}

#[then("the page holds {count} items")]
fn the_page_holds_items(world: &NavigationWorld, count: usize) {
    let page = world.page.borrow();
    let page = page.as_ref().expect("page requested");
    assert_eq!(page.items().len(), count);
}

#[then("the envelope reports {total} rows across {pages} pages")]
fn the_envelope_reports_totals(world: &NavigationWorld, total: u64, pages: u64) {
    let page = world.page.borrow();
    let page = page.as_ref().expect("page requested");
    assert_eq!(page.total_count(), total);
    assert_eq!(page.total_pages(), pages);
}

#[scenario(
    path = "tests/features/page_navigation.feature",
    name = "A page inside the range is never empty"
)]
fn a_page_inside_the_range_is_never_empty(world: NavigationWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/page_navigation.feature",
    name = "A page beyond the range is empty"
)]
fn a_page_beyond_the_range_is_empty(world: NavigationWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/page_navigation.feature",
    name = "An empty result set has no pages"
)]
fn an_empty_result_set_has_no_pages(world: NavigationWorld) {
    drop(world);
}
