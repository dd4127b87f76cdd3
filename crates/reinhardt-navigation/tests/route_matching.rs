//! Integration tests for route matching through the router
//!
//! These tests verify:
//! 1. Wildcard routes match after every other route
//! 2. Redirects keep the location that started them
//! 3. Named and relative navigation inherit params
//! 4. Aliases render the canonical chain with the alias leaf
//! 5. Query strings survive a round trip through the full path

use std::sync::Arc;

use proptest::prelude::*;
use reinhardt_navigation::{
	Component, Location, ParamValue, Query, QueryValue, RawLocation, RouteComponent, RouteConfig, Router, RouterOptions,
};
use rstest::rstest;

struct Page;

impl RouteComponent for Page {}

fn view(path: &str) -> RouteConfig {
	RouteConfig::new(path).with_component(Component::view(Page))
}

fn router(routes: Vec<RouteConfig>) -> Router {
	Router::new(RouterOptions::new().with_routes(routes)).unwrap()
}

#[rstest]
fn test_wildcard_is_matched_last() {
	// Arrange
	let router = router(vec![view("*"), view("/users/:id"), view("/files/*")]);

	// Act
	let user = router.match_route("/users/3", None);
	let file = router.match_route("/files/docs/a.txt", None);
	let unknown = router.match_route("/nowhere", None);

	// Assert
	assert_eq!(user.leaf().unwrap().path(), "/users/:id");
	assert_eq!(file.leaf().unwrap().path(), "/files/*");
	assert_eq!(file.params()["pathMatch"], ParamValue::from("docs/a.txt"));
	assert_eq!(unknown.leaf().unwrap().path(), "*");
	assert_eq!(unknown.params()["pathMatch"], ParamValue::from("/nowhere"));
}

#[rstest]
fn test_redirect_keeps_origin() {
	// Arrange
	let router = router(vec![
		view("/new/:id"),
		RouteConfig::new("/old/:id").with_redirect("/new/:id"),
		RouteConfig::new("/older/:id").with_redirect("/old/:id"),
	]);

	// Act
	router.push("/older/4?ref=mail#top");
	let resolved = router.resolve("/old/5", None, false);

	// Assert
	let current = router.current_route();
	assert_eq!(current.full_path(), "/new/4?ref=mail#top");
	assert_eq!(current.redirected_from(), Some("/older/4?ref=mail#top"));
	assert_eq!(resolved.route.path(), "/new/5");
	assert_eq!(resolved.href, "/old/5");
}

#[rstest]
fn test_redirect_function_receives_matched_route() {
	// Arrange
	let router = router(vec![
		view("/search"),
		RouteConfig::new("/find/:term").with_redirect_fn(|route| {
			let term = route.params().get("term")?.clone();
			Some(RawLocation::from(
				Location::from_path("/search").with_query_param("q", term.to_string()),
			))
		}),
	]);

	// Act
	let route = router.match_route("/find/rust", None);

	// Assert
	assert_eq!(route.full_path(), "/search?q=rust");
	assert_eq!(route.redirected_from(), Some("/find/rust"));
}

#[rstest]
fn test_named_navigation_inherits_current_params() {
	// Arrange
	let router = router(vec![
		view("/users/:id")
			.with_name("user")
			.with_child(view("posts").with_name("user-posts")),
	]);
	router.push("/users/5");

	// Act
	router.push(Location::named("user-posts"));
	let posts = router.current_route();
	router.push(Location::new().with_param("id", "9"));

	// Assert
	assert_eq!(posts.path(), "/users/5/posts");
	assert_eq!(posts.params()["id"], ParamValue::from("5"));
	assert_eq!(router.current_route().path(), "/users/9/posts");
	assert_eq!(router.current_route().name(), Some("user-posts"));
}

#[rstest]
fn test_alias_renders_canonical_chain_with_alias_leaf() {
	// Arrange
	let router = router(vec![view("/bar").with_alias("/baz").with_meta("title", "Bar")]);

	// Act
	let canonical = router.match_route("/bar", None);
	let aliased = router.match_route("/baz?x=1", None);

	// Assert
	assert_eq!(aliased.path(), "/baz");
	assert_eq!(aliased.full_path(), "/baz?x=1");
	assert_eq!(aliased.matched().len(), 1);
	let leaf = aliased.leaf().unwrap();
	assert!(leaf.is_alias());
	assert_eq!(leaf.path(), "/baz");
	assert_eq!(leaf.match_as(), Some("/bar"));
	assert!(!Arc::ptr_eq(leaf, canonical.leaf().unwrap()));
	assert_eq!(aliased.meta()["title"], "Bar");
}

#[rstest]
fn test_add_routes_rematches_current_location() {
	// Arrange
	let router = router(vec![view("/")]);
	router.push("/late");
	let before = router.current_route().matched().len();

	// Act
	router.add_routes([view("/late")]).unwrap();

	// Assert
	assert_eq!(before, 0);
	assert_eq!(router.current_route().leaf().unwrap().path(), "/late");
}

#[rstest]
fn test_matched_components_flatten_nested_slots() {
	// Arrange
	let router = router(vec![
		view("/shell").with_child(
			view("inbox").with_named_component("sidebar", Component::view(Page)),
		),
	]);
	router.push("/shell/inbox");

	// Act
	let current = router.matched_components(None);
	let other = router.matched_components(Some("/shell".into()));

	// Assert
	assert_eq!(current.len(), 3);
	assert_eq!(other.len(), 1);
}

#[rstest]
#[case("c", true, "/a/b/c")]
#[case("c", false, "/a/c")]
#[case("../d", false, "/d")]
#[case("?page=2", false, "/a/b?page=2")]
fn test_resolve_relative_targets(#[case] target: &str, #[case] append: bool, #[case] expected: &str) {
	// Arrange
	let router = router(vec![view("*")]);
	router.push("/a/b");

	// Act
	let resolved = router.resolve(target, None, append);

	// Assert
	assert_eq!(resolved.route.full_path(), expected);
}

#[rstest]
fn test_case_sensitive_routes() {
	// Arrange
	let router = router(vec![view("/About").with_case_sensitive(true), view("/faq")]);

	// Act & Assert
	assert!(router.match_route("/about", None).matched().is_empty());
	assert!(!router.match_route("/About", None).matched().is_empty());
	assert!(!router.match_route("/FAQ", None).matched().is_empty());
}

#[test]
#[tracing_test::traced_test]
fn test_unknown_named_route_warns() {
	// Arrange
	let router = router(vec![view("/")]);

	// Act
	let route = router.match_route(Location::named("ghost"), None);

	// Assert
	assert!(route.matched().is_empty());
	assert!(logs_contain("route with name 'ghost' does not exist"));
}

#[test]
#[tracing_test::traced_test]
fn test_uncaught_guard_error_is_logged() {
	// Arrange
	let router = router(vec![view("/")]);
	router.before_each(|_, _, _| Err(reinhardt_navigation::NavigationError::message("no entry")));

	// Act
	router.push("/");

	// Assert
	assert!(logs_contain("uncaught error during route navigation"));
	assert!(logs_contain("no entry"));
}

fn query_strategy() -> impl Strategy<Value = Query> {
	prop::collection::btree_map(
		"[a-z]{1,6}",
		prop_oneof![
			"\\PC{0,8}".prop_map(QueryValue::Value),
			Just(QueryValue::Null),
			prop::collection::vec("\\PC{0,4}".prop_map(Some), 2..4).prop_map(QueryValue::List),
		],
		0..5,
	)
}

proptest! {
	#[test]
	fn prop_query_survives_full_path_round_trip(query in query_strategy()) {
		let router = router(vec![view("/")]);

		let route = router.match_route(Location::from_path("/").with_query(query.clone()), None);
		let reparsed = router.match_route(route.full_path(), None);

		prop_assert_eq!(route.query(), &query);
		prop_assert_eq!(reparsed.query(), &query);
	}
}
