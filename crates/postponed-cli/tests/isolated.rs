//! ProcessExecutor against the real `postponed worker` binary.

use postponed_core::impls::builtins;
use postponed_core::{
    Arguments, InvocationError, TaskError, TransportError, WorkerCommand, postponed, run_isolated,
    run_threaded,
};
use std::time::{Duration, Instant};

use serde_json::json;

fn worker() -> WorkerCommand {
    WorkerCommand::new(env!("CARGO_BIN_EXE_postponed")).arg("worker")
}

fn doubles() -> Vec<postponed_core::DeferredTask> {
    postponed(builtins::double().unwrap())
        .bind_many([3, 3, 4, 6].map(|v| Arguments::positional([v])))
        .unwrap()
}

#[tokio::test]
async fn isolated_doubles_keep_submission_order() {
    let results = run_isolated(doubles(), 2, &worker()).await.unwrap();
    assert_eq!(
        results.into_values().unwrap(),
        vec![json!(6), json!(6), json!(8), json!(12)]
    );
}

#[test]
fn threaded_and_isolated_agree() {
    let threaded = run_threaded(&doubles(), 2).unwrap().into_values().unwrap();

    let rt = tokio::runtime::Runtime::new().unwrap();
    let isolated = rt
        .block_on(run_isolated(doubles(), 3, &worker()))
        .unwrap()
        .into_values()
        .unwrap();

    assert_eq!(threaded, isolated);
}

#[tokio::test]
async fn keyword_and_string_functions_cross_the_boundary() {
    let tasks = vec![
        postponed(builtins::multiply().unwrap())
            .bind(Arguments::new().kwarg("a", 1.5).kwarg("b", 4))
            .unwrap(),
        postponed(builtins::repeat_string().unwrap())
            .bind(Arguments::new().arg("ab").arg(3))
            .unwrap(),
        postponed(builtins::sleep_echo().unwrap())
            .bind(Arguments::new().kwarg("ms", 10).kwarg("value", json!({"k": [1, 2]})))
            .unwrap(),
    ];

    let results = run_isolated(tasks, 2, &worker()).await.unwrap();
    assert_eq!(
        results.into_values().unwrap(),
        vec![json!(6.0), json!("ababab"), json!({"k": [1, 2]})]
    );
}

#[tokio::test]
async fn one_failure_does_not_mask_the_others() {
    let double = postponed(builtins::double().unwrap());
    let fail = postponed(builtins::fail().unwrap());
    let tasks = vec![
        double.bind(Arguments::positional([1])).unwrap(),
        fail.bind(Arguments::positional(["first"])).unwrap(),
        double.bind(Arguments::positional([2])).unwrap(),
        fail.bind(Arguments::positional(["second"])).unwrap(),
    ];

    let results = run_isolated(tasks, 2, &worker()).await.unwrap();
    assert_eq!(results.get(0), Some(&Ok(json!(2.0))));
    assert_eq!(
        results.get(1),
        Some(&Err(TaskError::Invocation(InvocationError::failed("first"))))
    );
    assert_eq!(results.get(2), Some(&Ok(json!(4.0))));
    assert_eq!(
        results.get(3),
        Some(&Err(TaskError::Invocation(InvocationError::failed("second"))))
    );
    assert_eq!(
        results.into_values(),
        Err(TaskError::Invocation(InvocationError::failed("first")))
    );
}

#[tokio::test]
async fn unchecked_type_error_surfaces_in_the_worker() {
    let tasks = vec![
        postponed(builtins::multiply().unwrap())
            .with_check_inputs(false)
            .bind(Arguments::new().kwarg("a", 1.0).kwarg("b", "x"))
            .unwrap(),
    ];

    let results = run_isolated(tasks, 1, &worker()).await.unwrap();
    assert!(matches!(
        results.get(0),
        Some(Err(TaskError::Invocation(InvocationError::BadArgument { name, .. }))) if name == "b"
    ));
}

#[tokio::test]
async fn function_missing_in_the_worker_is_a_transport_error() {
    // 親プロセスにしかない名前付き関数
    let local = postponed_core::Function::named("local_only", postponed_core::Signature::empty(), |_| {
        Ok(json!(1))
    });
    let tasks = vec![postponed(local).bind(Arguments::new()).unwrap()];

    let results = run_isolated(tasks, 1, &worker()).await.unwrap();
    assert_eq!(
        results.get(0),
        Some(&Err(TaskError::Transport(TransportError::UnknownFunction {
            name: "local_only".to_string()
        })))
    );
}

#[tokio::test]
async fn at_most_max_workers_processes_run_at_once() {
    // 2 ワーカーで 300ms のタスク 4 つ: 各ワーカーが 2 つずつ順に処理するので 600ms 以上かかる
    let sleepy = postponed(builtins::sleep_echo().unwrap());
    let tasks = sleepy
        .bind_many((0..4).map(|i| Arguments::new().arg(300).arg(i)))
        .unwrap();

    let started = Instant::now();
    let results = run_isolated(tasks, 2, &worker()).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(
        results.into_values().unwrap(),
        vec![json!(0), json!(1), json!(2), json!(3)]
    );
    assert!(elapsed >= Duration::from_millis(600), "{elapsed:?}");
}
