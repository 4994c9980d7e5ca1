use std::sync::Arc;

use tabula::{ApiError, ListConfig, ListEngine, ResourceFetcher};
use tabula_cli::{load_and_render, CliArgs};
use tabula_rest::{FakeResource, User};

fn user(id: i64, name: &str, city: &str, age: i64) -> User {
    User {
        id,
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        phone: None,
        age,
        city: city.to_string(),
        is_active: id % 2 == 1,
    }
}

fn backend() -> Arc<FakeResource<User>> {
    Arc::new(FakeResource::with_items(vec![
        user(1, "Alice", "Taipei", 31),
        user(2, "Bob", "Tainan", 24),
        user(3, "Carol", "Taipei", 45),
        user(4, "Dan", "Hsinchu", 24),
    ]))
}

fn engine_over(backend: Arc<FakeResource<User>>) -> ListEngine {
    let fetcher = Arc::new(ResourceFetcher::<User, _>::new(backend));
    let config = ListConfig::default()
        .with_auto_load(false)
        .with_search_fields(["name", "city"]);
    ListEngine::new(fetcher, config)
}

fn args(list: &[&str]) -> CliArgs {
    CliArgs::parse(list.iter().map(|s| s.to_string())).expect("valid arguments")
}

#[tokio::test]
async fn test_renders_filtered_sorted_page() {
    let mut engine = engine_over(backend());
    let args = args(&[
        "users",
        "--filter",
        "isActive=true",
        "--search",
        "tai",
        "--sort",
        "age",
        "--desc",
        "--page-size",
        "1",
        "--page",
        "2",
    ]);

    let output = load_and_render(&mut engine, &args).await.unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert!(lines[0].starts_with("id"));
    assert!(lines[0].contains("name"));
    assert!(lines[2].starts_with("1 "));
    assert!(lines[2].contains("Alice"));
    assert!(!output.contains("Carol"));
    assert_eq!(lines.last(), Some(&"showing 2–2 of 2 (page 2/2)"));
}

#[tokio::test]
async fn test_empty_result_and_page_out_of_range() {
    let mut engine = engine_over(backend());
    let output = load_and_render(&mut engine, &args(&["--search", "kaohsiung"]))
        .await
        .unwrap();
    assert_eq!(output, "no matching records\nshowing 0–0 of 0 (page 1/1)\n");

    let mut engine = engine_over(backend());
    let err = load_and_render(&mut engine, &args(&["--page", "5"]))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "page 5 is out of range (1..=1)");
}

#[tokio::test]
async fn test_load_failure_is_reported() {
    let backend = backend();
    backend
        .fail_next(ApiError::Network {
            message: "connection refused".into(),
        })
        .await;
    let mut engine = engine_over(backend);

    let err = load_and_render(&mut engine, &args(&["users"]))
        .await
        .unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to load users"));
    assert!(format!("{:#}", err).contains("connection refused"));
}
