use std::thread;
use std::time::Instant;

use text_log_handler::{attrs, Handler, HandlerOptions, Level, NoopSink, Record};

fn main() {
    let threads = thread::available_parallelism().map(|n| n.get()).unwrap_or(4);
    let per_thread: u64 = 200_000;

    let base = Handler::new(NoopSink, HandlerOptions::default())
        .with_attrs(attrs!["service" => "load"]);

    let start = Instant::now();
    let workers: Vec<_> = (0..threads)
        .map(|t| {
            let handler = base.with_group(format!("worker{t}"));
            thread::spawn(move || {
                for i in 0..per_thread {
                    let attrs = attrs!["iteration" => i, "ok" => true];
                    let record = Record::new(Level::INFO, "load test").with_attrs(&attrs);
                    if let Err(e) = handler.handle(&record) {
                        eprintln!("write failed: {}", e);
                    }
                }
            })
        })
        .collect();
    for worker in workers {
        let _ = worker.join();
    }

    let n = threads as u64 * per_thread;
    let elapsed = start.elapsed();
    println!(
        "{} threads: handled {} records in {:?} (~{:.0} rec/s), {} idle buffers",
        threads,
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64(),
        base.pool().idle()
    );
}
