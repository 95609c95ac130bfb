use hookline::{Constraints, Filter, HookError, Hooks, Next, testing::RecordingHandler};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

mod common;
use common::{Document, inject_tag, labelled, registry, tagger};

#[test]
fn test_handler_observes_emitted_value() {
    let (hooks, mut driver) = Hooks::<i32>::new();
    let recorder = RecordingHandler::new();
    hooks.on("x", recorder.handler()).emit("x", 1).unwrap();
    driver.tick();
    assert_eq!(recorder.events(), [(1, "x".to_string())]);
}

#[test]
fn test_disjoint_names_never_cross_trigger() {
    let (hooks, mut driver) = Hooks::<i32>::new();
    let a = RecordingHandler::new();
    let b = RecordingHandler::new();
    hooks.on("a", a.handler()).on("b", b.handler());

    hooks.emit("a", 1).unwrap().emit("a", 2).unwrap();
    driver.tick();
    assert_eq!(a.payloads(), [1, 2]);
    assert_eq!(b.count(), 0);

    hooks.emit("b", 3).unwrap();
    driver.tick();
    assert_eq!(a.count(), 2);
    assert_eq!(b.payloads(), [3]);
}

#[test]
fn test_interceptors_run_before_handlers_in_resolved_order() {
    let (hooks, mut driver) = registry();
    let recorder = RecordingHandler::new();
    hooks.on("save", recorder.handler());
    inject_tag(&hooks, "save", "format", Constraints::post());
    inject_tag(&hooks, "save", "validate", Constraints::pre());
    inject_tag(&hooks, "save", "normalize", Constraints::new());

    hooks.emit("save", Document::new("body")).unwrap();
    driver.tick();

    let docs = recorder.payloads();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].tags, ["validate", "normalize", "format"]);
}

#[test]
fn test_withheld_continuation_cancels_silently() {
    let (hooks, mut driver) = registry();
    let recorder = RecordingHandler::new();
    let completed = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&completed);

    hooks
        .on("save", recorder.handler())
        .inject_with(
            "save",
            "guard",
            |doc: Document, next: Next<Document>, _: &str| {
                if doc.body.is_empty() {
                    next.halt();
                } else {
                    next.call(doc);
                }
            },
            Constraints::pre(),
        )
        .unwrap()
        .emit_with("save", Document::new(""), move |_, _| {
            *flag.lock().unwrap() = true;
        })
        .unwrap();

    driver.tick();
    assert_eq!(recorder.count(), 0);
    assert!(!*completed.lock().unwrap());

    hooks.emit("save", Document::new("kept")).unwrap();
    driver.tick();
    assert_eq!(recorder.count(), 1);
}

#[test]
fn test_last_interceptor_sees_handlers_done_after_next() {
    let (hooks, mut driver) = registry();
    let log = Arc::new(Mutex::new(Vec::new()));
    let step_log = Arc::clone(&log);
    hooks
        .on("save", labelled(&log, "handler"))
        .inject_with("save", "format", tagger("format"), Constraints::pre())
        .unwrap()
        .inject_with(
            "save",
            "audit",
            move |doc: Document, next: Next<Document>, _: &str| {
                next.call(doc);
                step_log.lock().unwrap().push("audit:after-next".to_string());
            },
            Constraints::post(),
        )
        .unwrap();

    let done = Arc::clone(&log);
    hooks
        .emit_with("save", Document::new("x"), move |_, _| {
            done.lock().unwrap().push("complete".to_string());
        })
        .unwrap();
    driver.tick();
    assert_eq!(
        *log.lock().unwrap(),
        ["complete", "handler:save", "audit:after-next"]
    );
}

#[test]
fn test_ordering_errors_reject_emit_and_queue_nothing() {
    let (hooks, mut driver) = registry();
    let recorder = RecordingHandler::new();
    hooks.on("save", recorder.handler());
    inject_tag(&hooks, "save", "minify", Constraints::new().conflicts_with("pretty"));
    inject_tag(&hooks, "save", "pretty", Constraints::new());

    let err = hooks.emit("save", Document::new("x")).unwrap_err();
    assert_eq!(
        err,
        HookError::Conflict {
            id: "minify".into(),
            other: "pretty".into(),
        }
    );
    assert_eq!(driver.tick(), 0);

    hooks.remove("save", "pretty").unwrap();
    inject_tag(&hooks, "save", "a", Constraints::new().before("b"));
    inject_tag(&hooks, "save", "b", Constraints::new().before("a"));
    let err = hooks.emit("save", Document::new("x")).unwrap_err();
    assert_eq!(
        err,
        HookError::CircularDependency {
            ids: vec!["a".into(), "b".into()],
        }
    );
    assert_eq!(driver.tick(), 0);
    assert_eq!(recorder.count(), 0);

    hooks.remove("save", "b").unwrap();
    hooks.emit("save", Document::new("x")).unwrap();
    assert_eq!(driver.tick(), 1);
    assert_eq!(recorder.payloads()[0].tags, ["minify", "a"]);
}

#[test]
fn test_completion_callback_runs_first() {
    let (hooks, mut driver) = registry();
    let log = Arc::new(Mutex::new(Vec::new()));
    hooks.on("save", labelled(&log, "handler"));

    let done = Arc::clone(&log);
    hooks
        .emit_with("save", Document::new("x"), move |_, event| {
            done.lock().unwrap().push(format!("complete:{event}"));
        })
        .unwrap();
    driver.tick();
    assert_eq!(*log.lock().unwrap(), ["complete:save", "handler:save"]);
}

#[test]
fn test_handlers_fire_in_registration_order() {
    let (hooks, mut driver) = registry();
    let log = Arc::new(Mutex::new(Vec::new()));
    hooks
        .on(Filter::any(), labelled(&log, "any"))
        .on("save", labelled(&log, "first"))
        .on("save", labelled(&log, "second"));
    hooks.emit("save", Document::new("x")).unwrap();
    driver.tick();
    assert_eq!(
        *log.lock().unwrap(),
        ["first:save", "second:save", "any:save"]
    );
}

#[test]
fn test_off_and_once() {
    let (hooks, mut driver) = registry();
    let log = Arc::new(Mutex::new(Vec::new()));
    let stays = labelled(&log, "stays");
    let leaves = labelled(&log, "leaves");
    hooks
        .on("save", stays)
        .on("save", leaves.clone())
        .once("save", labelled(&log, "once"));
    hooks.off("save", &leaves).unwrap();
    assert!(hooks.off("save", &leaves).is_err());

    hooks
        .emit("save", Document::new("1"))
        .unwrap()
        .emit("save", Document::new("2"))
        .unwrap();
    driver.tick();
    assert_eq!(
        *log.lock().unwrap(),
        ["stays:save", "once:save", "stays:save"]
    );
}

#[test]
fn test_side_effect_events_keep_chronological_order() {
    let (hooks, mut driver) = registry();
    let log = Arc::new(Mutex::new(Vec::new()));

    let relay = hooks.downgrade();
    let relay_log = Arc::clone(&log);
    hooks.on(
        "open",
        Arc::new(move |doc: &Document, _: &str| {
            relay_log.lock().unwrap().push("open:begin".to_string());
            if let Some(hooks) = relay.upgrade() {
                hooks.emit("opened", doc.clone()).unwrap();
            }
            relay_log.lock().unwrap().push("open:end".to_string());
        }),
    );
    hooks
        .on("opened", labelled(&log, "opened"))
        .on("close", labelled(&log, "close"));

    hooks
        .emit("open", Document::new("a"))
        .unwrap()
        .emit("close", Document::new("a"))
        .unwrap();
    assert_eq!(driver.tick(), 3);
    assert_eq!(
        *log.lock().unwrap(),
        ["open:begin", "open:end", "close:close", "opened:opened"]
    );
}

#[test]
#[should_panic(expected = "handler failure")]
fn test_handler_panics_propagate_to_driver() {
    let (hooks, mut driver) = Hooks::<i32>::new();
    hooks.on(
        "x",
        Arc::new(|n: &i32, _: &str| {
            if *n == 1 {
                panic!("handler failure");
            }
        }),
    );
    hooks.emit("x", 1).unwrap();
    driver.tick();
}

#[tokio::test]
async fn test_parked_continuation_resumes_from_another_task() {
    let (hooks, driver) = registry();
    tokio::spawn(driver.run());
    let recorder = RecordingHandler::new();
    let parked: Arc<Mutex<Option<(Document, Next<Document>)>>> = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&parked);

    hooks
        .on("save", recorder.handler())
        .inject_with(
            "save",
            "slow",
            move |doc: Document, next: Next<Document>, _: &str| {
                *slot.lock().unwrap() = Some((doc, next));
            },
            Constraints::pre(),
        )
        .unwrap();
    inject_tag(&hooks, "save", "fast", Constraints::post());

    hooks.emit("save", Document::new("x")).unwrap();
    hooks.flush().await;
    // The driver moved on; the chain is parked until the continuation is called.
    assert_eq!(recorder.count(), 0);

    let (mut doc, next) = parked.lock().unwrap().take().unwrap();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        doc.tags.push("slow".to_string());
        next.call(doc);
    })
    .await
    .unwrap();

    let docs = recorder.payloads();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].tags, ["slow", "fast"]);
}

#[tokio::test]
async fn test_flush_waits_for_nested_emissions() {
    let (hooks, driver) = Hooks::<i32>::new();
    tokio::spawn(driver.run());
    let recorder = RecordingHandler::new();

    let relay = hooks.downgrade();
    hooks
        .on(
            "ping",
            Arc::new(move |n: &i32, _: &str| {
                if let Some(hooks) = relay.upgrade() {
                    hooks.emit("pong", n + 1).unwrap();
                }
            }),
        )
        .on("pong", recorder.handler());

    hooks.emit("ping", 1).unwrap();
    hooks.flush().await;
    assert_eq!(recorder.payloads(), [2]);
}
