use chrono::Utc;
use planer::filter::{parse_priority_filter, parse_status_filter, TaskFilter};
use planer::models::{Priority, Status, Task};
use planer::stats::{compute_stats, percent, Stats};
use proptest::prelude::*;

fn task(id: &str, status: Status, priority: Priority) -> Task {
    let now = Utc::now();
    Task {
        id: id.to_string(),
        title: format!("Task {}", id),
        description: None,
        status,
        priority,
        category: None,
        project: None,
        due_date: None,
        created_at: now,
        updated_at: now,
        subtasks: Vec::new(),
        time_spent: None,
        time_estimate: None,
    }
}

#[test]
fn test_stats_scenario() {
    let tasks = vec![
        task("t1", Status::Completed, Priority::High),
        task("t2", Status::Pending, Priority::Low),
    ];
    assert_eq!(
        compute_stats(&tasks),
        Stats {
            total: 2,
            completed: 1,
            pending: 1,
            high_priority: 1,
            medium_priority: 0,
            low_priority: 1,
            completion_rate: 50,
        }
    );
}

#[test]
fn test_stats_empty() {
    let stats = compute_stats(&[]);
    assert_eq!(stats.total, 0);
    assert_eq!(stats.completion_rate, 0);
}

#[test]
fn test_pending_excludes_in_progress_and_canceled() {
    let tasks = vec![
        task("a", Status::InProgress, Priority::Medium),
        task("b", Status::Canceled, Priority::Medium),
        task("c", Status::Pending, Priority::Medium),
    ];
    let stats = compute_stats(&tasks);
    assert_eq!(stats.total, 3);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.completed, 0);
    assert_eq!(stats.medium_priority, 3);
}

#[test]
fn test_completion_rate_rounds() {
    assert_eq!(percent(1, 3), 33);
    assert_eq!(percent(2, 3), 67);
    assert_eq!(percent(0, 0), 0);
}

#[test]
fn test_stats_serialize_camel_case() {
    let json = serde_json::to_value(compute_stats(&[])).unwrap();
    assert!(json.get("completionRate").is_some());
    assert!(json.get("highPriority").is_some());
}

#[test]
fn test_search_matches_title_or_description() {
    let mut with_desc = task("a", Status::Pending, Priority::Low);
    with_desc.description = Some("Call the PLUMBER".into());
    let mut with_title = task("b", Status::Pending, Priority::Low);
    with_title.title = "Plumber invoice".into();
    let other = task("c", Status::Pending, Priority::Low);
    let tasks = vec![with_desc, with_title, other];

    let found = TaskFilter::default().with_search("plumber").apply(&tasks);
    let ids: Vec<&str> = found.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[test]
fn test_filters_combine_and_keep_order() {
    let tasks = vec![
        task("1", Status::Pending, Priority::High),
        task("2", Status::Completed, Priority::High),
        task("3", Status::Pending, Priority::Low),
        task("4", Status::Pending, Priority::High),
    ];
    let filter = TaskFilter::default()
        .with_status(Status::Pending)
        .with_priority(Priority::High);
    let ids: Vec<&str> = filter.apply(&tasks).iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "4"]);
    assert_eq!(TaskFilter::default().apply(&tasks).len(), 4);
}

#[test]
fn test_parse_filters() {
    assert_eq!(parse_status_filter("all"), Ok(None));
    assert_eq!(parse_status_filter(""), Ok(None));
    assert_eq!(parse_status_filter("in_progress"), Ok(Some(Status::InProgress)));
    assert!(parse_status_filter("someday").is_err());
    assert_eq!(parse_priority_filter("ALL"), Ok(None));
    assert_eq!(parse_priority_filter("3"), Ok(Some(Priority::High)));
    assert!(parse_priority_filter("urgent").is_err());
}

fn status_strategy() -> impl Strategy<Value = Status> {
    prop_oneof![
        Just(Status::Pending),
        Just(Status::InProgress),
        Just(Status::Completed),
        Just(Status::Canceled),
    ]
}

fn priority_strategy() -> impl Strategy<Value = Priority> {
    prop_oneof![Just(Priority::Low), Just(Priority::Medium), Just(Priority::High)]
}

fn task_strategy() -> impl Strategy<Value = Task> {
    (
        status_strategy(),
        priority_strategy(),
        "[a-c ]{0,6}",
        proptest::option::of("[a-c ]{0,6}"),
    )
        .prop_map(|(status, priority, title, description)| {
            let mut t = task("x", status, priority);
            t.title = title;
            t.description = description;
            t
        })
}

fn narrow(tasks: Vec<Task>, filter: &TaskFilter) -> Vec<Task> {
    filter.apply(&tasks).into_iter().cloned().collect()
}

proptest! {
    #[test]
    fn prop_stats_total_is_len(tasks in proptest::collection::vec(task_strategy(), 0..40)) {
        let stats = compute_stats(&tasks);
        prop_assert_eq!(stats.total, tasks.len());
        let by_priority = stats.high_priority + stats.medium_priority + stats.low_priority;
        prop_assert_eq!(by_priority, tasks.len());
        prop_assert!(stats.completed + stats.pending <= stats.total);
        prop_assert!(stats.completion_rate <= 100);
    }

    #[test]
    fn prop_filter_order_does_not_matter(
        tasks in proptest::collection::vec(task_strategy(), 0..30),
        status in status_strategy(),
        priority in priority_strategy(),
        search in "[a-c]{0,2}",
    ) {
        let by_status = TaskFilter::default().with_status(status);
        let by_priority = TaskFilter::default().with_priority(priority);
        let by_search = TaskFilter::default().with_search(search.clone());

        let combined = narrow(
            tasks.clone(),
            &TaskFilter::default().with_status(status).with_priority(priority).with_search(search),
        );
        let orders = [
            [&by_status, &by_priority, &by_search],
            [&by_status, &by_search, &by_priority],
            [&by_priority, &by_status, &by_search],
            [&by_priority, &by_search, &by_status],
            [&by_search, &by_status, &by_priority],
            [&by_search, &by_priority, &by_status],
        ];
        for order in orders {
            let result = order.iter().fold(tasks.clone(), |acc, f| narrow(acc, f));
            prop_assert_eq!(&result, &combined);
        }
    }
}
