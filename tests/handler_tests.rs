use std::borrow::Cow;
use std::io::{self, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use text_log_handler::{
    attrs, Attr, HandleError, Handler, HandlerOptions, Level, LogSink, MemorySink, Record,
    TimeFormat, Value,
};

fn quiet() -> HandlerOptions {
    HandlerOptions::default().time_format(TimeFormat::Disabled)
}

fn emit(handler: &Handler, level: Level, message: &str, attrs: &[Attr]) {
    let record = Record::new(level, message).with_attrs(attrs);
    handler.handle(&record).unwrap();
}

struct FailingSink {
    attempts: Arc<AtomicUsize>,
}

impl LogSink for FailingSink {
    fn write_record(&mut self, _line: &[u8]) -> io::Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "destination gone"))
    }
}

#[test]
fn service_up_scenario() {
    let sink = MemorySink::new();
    let handler = Handler::new(sink.clone(), HandlerOptions::default());
    emit(&handler, Level::INFO, "svc up", &attrs!["port" => 8080]);

    let line = sink.contents();
    assert!(line.ends_with("INFO msg=svc up port=8080\n"), "{line}");
    assert!(line.trim_end().ends_with("msg=svc up port=8080"));
}

#[test]
fn bound_before_group_has_no_prefix() {
    let sink = MemorySink::new();
    let handler = Handler::new(sink.clone(), quiet())
        .with_attrs(attrs!["service" => "api"])
        .with_group("request");
    emit(&handler, Level::INFO, "served", &attrs!["method" => "GET", "path" => "/x"]);
    assert_eq!(
        sink.contents(),
        "INFO service=api msg=served request.method=GET request.path=/x\n"
    );
}

#[test]
fn bound_attributes_keep_binding_order_and_groups() {
    let sink = MemorySink::new();
    let handler = Handler::new(sink.clone(), quiet())
        .with_attrs(attrs!["z" => 1, "a" => 2])
        .with_group("outer")
        .with_attrs(attrs!["m" => 3])
        .with_group("inner")
        .with_attrs(attrs!["a" => 4]);
    emit(&handler, Level::DEBUG, "ordered", &attrs!["c" => 5]);
    assert_eq!(
        sink.contents(),
        "DEBUG z=1 a=2 outer.m=3 outer.inner.a=4 msg=ordered outer.inner.c=5\n"
    );
}

#[test]
fn group_nesting_is_independent_of_bindings_in_between() {
    let sink = MemorySink::new();
    let base = Handler::new(sink.clone(), quiet());

    let direct = base.with_group("a").with_group("b");
    let interleaved = base
        .with_group("a")
        .with_attrs(attrs!["x" => 1])
        .with_group("b")
        .with_attrs(Vec::new());

    emit(&direct, Level::INFO, "m", &attrs!["k" => "v"]);
    emit(&interleaved, Level::INFO, "m", &attrs!["k" => "v"]);
    assert_eq!(
        sink.lines(),
        ["INFO msg=m a.b.k=v", "INFO a.x=1 msg=m a.b.k=v"]
    );
}

#[test]
fn dropping_password_removes_only_that_attribute() {
    let sink = MemorySink::new();
    let options = quiet().replace_attr(|_, attr| {
        if attr.key == "password" {
            None
        } else {
            Some(Cow::Borrowed(attr))
        }
    });
    let handler = Handler::new(sink.clone(), options)
        .with_attrs(attrs!["password" => "bound-secret", "user" => "admin"])
        .with_group("auth");
    emit(
        &handler,
        Level::WARN,
        "login",
        &attrs!["password" => "call-secret", "attempt" => 3],
    );

    let line = sink.contents();
    assert!(!line.contains("password="), "{line}");
    assert!(!line.contains("secret"), "{line}");
    assert_eq!(line, "WARN user=admin msg=login auth.attempt=3\n");
}

#[test]
fn masking_changes_only_the_masked_value() {
    let sink = MemorySink::new();
    let options = quiet().replace_attr(|groups, attr| {
        if groups.last() == Some("card") && attr.key == "number" {
            Some(Cow::Owned(Attr::new(attr.key.clone(), "****")))
        } else {
            Some(Cow::Borrowed(attr))
        }
    });
    let handler = Handler::new(sink.clone(), options).with_group("card");
    emit(&handler, Level::INFO, "charge", &attrs!["number" => "4111", "amount" => 12.5]);
    emit(&handler.with_group("other"), Level::INFO, "charge", &attrs!["number" => "4111"]);
    assert_eq!(
        sink.lines(),
        [
            "INFO msg=charge card.number=**** card.amount=12.5",
            "INFO msg=charge card.other.number=4111",
        ]
    );
}

#[test]
fn hook_is_not_called_for_level_or_message() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let options = quiet().replace_attr(move |_, attr| {
        counter.fetch_add(1, Ordering::SeqCst);
        Some(Cow::Borrowed(attr))
    });
    let handler = Handler::new(MemorySink::new(), options).with_attrs(attrs!["a" => 1]);
    emit(&handler, Level::INFO, "message", &attrs!["b" => 2, "c" => 3]);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn empty_group_value_adds_no_bytes() {
    let sink = MemorySink::new();
    let handler = Handler::new(sink.clone(), quiet());
    emit(
        &handler,
        Level::INFO,
        "m",
        &[Attr::new("n", 1), Attr::new("g", Value::Group(Vec::new()))],
    );
    emit(
        &handler,
        Level::INFO,
        "m",
        &[Attr::group("outer", vec![Attr::new("a", 1), Attr::group("none", vec![])])],
    );
    assert_eq!(sink.lines(), ["INFO msg=m n=1", "INFO msg=m outer={a=1}"]);
}

#[test]
fn value_kinds_render_in_one_line() {
    let sink = MemorySink::new();
    let handler = Handler::new(sink.clone(), quiet());
    emit(
        &handler,
        Level::INFO,
        "test",
        &attrs![
            "string" => "value",
            "int" => 42,
            "neg" => -7i64,
            "float" => 3.14,
            "bool" => true,
            "elapsed" => std::time::Duration::from_millis(250),
        ],
    );
    assert_eq!(
        sink.contents(),
        "INFO msg=test string=value int=42 neg=-7 float=3.14 bool=true elapsed=250ms\n"
    );
}

#[test]
fn destination_errors_reach_the_caller_and_buffers_return() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let handler = Handler::new(
        FailingSink {
            attempts: Arc::clone(&attempts),
        },
        quiet(),
    );

    let record = Record::new(Level::ERROR, "lost");
    let err = handler.handle(&record).unwrap_err();
    assert!(matches!(err, HandleError::Write(_)));
    assert_eq!(err.io_error().kind(), io::ErrorKind::BrokenPipe);
    assert_eq!(attempts.load(Ordering::SeqCst), 1, "no retries");
    assert!(handler.pool().idle() >= 1, "scratch buffer returned after failure");

    handler.handle(&record).unwrap_err();
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn concurrent_writers_never_interleave() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 200;

    let sink = MemorySink::new();
    let base = Handler::new(sink.clone(), quiet()).with_attrs(attrs!["app" => "demo"]);
    let barrier = Arc::new(Barrier::new(THREADS));

    let workers: Vec<_> = (0..THREADS)
        .map(|t| {
            let handler = base.with_group(format!("worker{t}"));
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..PER_THREAD {
                    let padding = "x".repeat(i % 37);
                    let attrs = attrs!["seq" => i, "pad" => padding];
                    emit(&handler, Level::INFO, "tick", &attrs);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let lines = sink.lines();
    assert_eq!(lines.len(), THREADS * PER_THREAD);

    let mut next = vec![0usize; THREADS];
    for line in &lines {
        let rest = line
            .strip_prefix("INFO app=demo msg=tick worker")
            .unwrap_or_else(|| panic!("malformed line: {line}"));
        let (t, rest) = rest.split_once(".seq=").unwrap();
        let t: usize = t.parse().unwrap();
        let (seq, pad) = rest.split_once(' ').unwrap();
        let seq: usize = seq.parse().unwrap();
        assert_eq!(seq, next[t], "per-thread order is preserved");
        next[t] += 1;
        let expected = format!("worker{t}.pad={}", "x".repeat(seq % 37));
        assert_eq!(pad, expected);
    }
}

#[test]
fn file_destination_receives_whole_lines() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let writer = file.reopen().unwrap();
    let handler = Handler::new(writer, quiet());
    emit(&handler, Level::INFO, "one", &[]);
    emit(&handler.with_attrs(attrs!["k" => "v"]), Level::WARN, "two", &[]);
    handler.flush().unwrap();

    let mut contents = String::new();
    file.reopen().unwrap().read_to_string(&mut contents).unwrap();
    assert_eq!(contents, "INFO msg=one\nWARN k=v msg=two\n");
}
