// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::io;
use std::io::Write;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;
use ctxlog::Error;
use ctxlog::Handler;
use ctxlog::Logger;
use ctxlog::Record;
use ctxlog::Trap;
use ctxlog::ctx;
use ctxlog::format::JsonFormat;
use ctxlog::format::LogfmtFormat;
use ctxlog::handler::Buffered;
use ctxlog::handler::BufferedBuilder;
use ctxlog::handler::Criterion;
use ctxlog::handler::Failover;
use ctxlog::handler::FilterHandler;
use ctxlog::handler::LevelFilter;
use ctxlog::handler::MatchFilter;
use ctxlog::handler::Multi;
use ctxlog::handler::StreamHandler;
use ctxlog::kv::Value;
use ctxlog::record::Level;

#[derive(Debug, Default)]
struct Capture(Mutex<Vec<Record>>);

impl Capture {
    fn records(&self) -> Vec<Record> {
        self.0.lock().unwrap().clone()
    }
}

impl Handler for Capture {
    fn handle(&self, record: &Record) -> Result<(), Error> {
        self.0.lock().unwrap().push(record.clone());
        Ok(())
    }
}

#[derive(Debug)]
struct Failing(&'static str);

impl Handler for Failing {
    fn handle(&self, _: &Record) -> Result<(), Error> {
        Err(Error::new(self.0))
    }
}

/// A sink that can be shared with the test after being moved into a handler.
#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct BrokenPipe;

impl Write for BrokenPipe {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "connection reset"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn record(level: Level, context: Vec<(ctxlog::kv::Key, Value)>) -> Record {
    Record::builder()
        .level(level)
        .message("test")
        .context(context)
        .build()
}

#[test]
fn test_level_filter() {
    let capture = Arc::new(Capture::default());
    let filter = LevelFilter::new(Level::Warn, capture.clone());

    filter.handle(&record(Level::Info, ctx!())).unwrap();
    filter.handle(&record(Level::Warn, ctx!("k" => 1))).unwrap();
    filter.handle(&record(Level::Error, ctx!())).unwrap();
    filter.handle(&record(Level::Debug, ctx!())).unwrap();

    let records = capture.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].level(), Level::Warn);
    assert_eq!(records[0].get("k"), Some(&Value::I64(1)));
    assert_eq!(records[1].level(), Level::Error);
}

#[test]
fn test_match_filter_any() {
    let capture = Arc::new(Capture::default());
    let filter = MatchFilter::any("err", capture.clone());

    filter.handle(&record(Level::Error, ctx!("other" => 1))).unwrap();
    filter
        .handle(&record(
            Level::Error,
            ctx!("err" => Value::from_error(io::Error::other("bad fd"))),
        ))
        .unwrap();
    filter
        .handle(&record(Level::Error, ctx!("err" => Value::Nil)))
        .unwrap();

    let records = capture.records();
    assert_eq!(records.len(), 2);
    assert!(records[0].get("err").is_none());
    assert_eq!(records[1].get("err"), Some(&Value::Nil));
}

#[test]
fn test_match_filter_value() {
    let capture = Arc::new(Capture::default());
    let filter = MatchFilter::new(
        "module",
        Criterion::Value(Value::from("noisy")),
        capture.clone(),
    );

    filter
        .handle(&record(Level::Info, ctx!("module" => "noisy")))
        .unwrap();
    filter
        .handle(&record(Level::Info, ctx!("module" => "quiet")))
        .unwrap();
    // only the first occurrence decides
    filter
        .handle(&record(
            Level::Info,
            ctx!("module" => "quiet", "module" => "noisy"),
        ))
        .unwrap();

    let records = capture.records();
    assert_eq!(records.len(), 2);
    assert!(
        records
            .iter()
            .all(|r| r.get("module") == Some(&Value::from("quiet")))
    );
}

#[test]
fn test_filter_handler() {
    let capture = Arc::new(Capture::default());
    let filter = FilterHandler::new(
        |record: &Record| record.get("audit").is_some(),
        capture.clone(),
    );

    filter.handle(&record(Level::Info, ctx!())).unwrap();
    filter
        .handle(&record(Level::Info, ctx!("audit" => true)))
        .unwrap();
    assert_eq!(capture.records().len(), 1);
}

#[test]
fn test_multi_delivers_to_all_and_returns_first_error() {
    let first = Arc::new(Capture::default());
    let last = Arc::new(Capture::default());
    let multi = Multi::new(first.clone())
        .chain(Failing("first failure"))
        .chain(Failing("second failure"))
        .chain(last.clone());

    let err = multi.handle(&record(Level::Info, ctx!())).unwrap_err();
    assert_eq!(err.message(), "first failure");
    assert_eq!(first.records().len(), 1);
    assert_eq!(last.records().len(), 1);

    let empty = std::iter::empty::<Box<dyn Handler>>().collect::<Multi>();
    empty.handle(&record(Level::Info, ctx!())).unwrap();
}

#[test]
fn test_failover_annotates_each_failure() {
    let capture = Arc::new(Capture::default());
    let failover = Failover::new(Failing("primary down"))
        .fallback(Failing("secondary down"))
        .fallback(capture.clone());

    let original = record(Level::Error, ctx!("id" => 7));
    failover.handle(&original).unwrap();
    assert_eq!(original.context().len(), 1);

    let records = capture.records();
    let delivered = &records[0];
    assert_eq!(delivered.context().len(), 3);
    assert_eq!(
        delivered.get("failover_err_0"),
        Some(&Value::from("primary down"))
    );
    assert_eq!(
        delivered.get("failover_err_1"),
        Some(&Value::from("secondary down"))
    );
}

#[test]
fn test_failover_with_failing_stream() {
    let buf = SharedBuf::default();
    let failover = Failover::new(StreamHandler::new(BrokenPipe, LogfmtFormat::default()))
        .fallback(StreamHandler::new(buf.clone(), JsonFormat::default()));

    let logger = Logger::new(ctx!("svc" => "api"));
    logger.set_handler(failover);
    logger.error("write failed", ctx!("x" => 1));

    let output = buf.contents();
    assert_eq!(output.lines().count(), 1);
    let line: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(line["msg"], "write failed");
    assert_eq!(line["lvl"], "eror");
    assert_eq!(line["svc"], "api");
    assert_eq!(line["x"], 1);
    let annotation = line["failover_err_0"].as_str().unwrap();
    assert!(annotation.contains("connection reset"), "{annotation}");
}

#[test]
fn test_failover_all_fail_returns_last_error() {
    let failover = Failover::new(Failing("one")).fallback(Failing("two"));
    let err = failover.handle(&record(Level::Info, ctx!())).unwrap_err();
    assert_eq!(err.message(), "two");
}

#[test]
fn test_stream_handler_appends_newline() {
    #[derive(Debug)]
    struct Bare;

    impl ctxlog::Format for Bare {
        fn format(&self, record: &Record) -> Result<Vec<u8>, Error> {
            Ok(record.message().as_bytes().to_vec())
        }
    }

    let buf = SharedBuf::default();
    let handler = StreamHandler::new(buf.clone(), Bare);
    handler.handle(&record(Level::Info, ctx!())).unwrap();
    handler.handle(&record(Level::Info, ctx!())).unwrap();
    handler.flush().unwrap();
    assert_eq!(buf.contents(), "test\ntest\n");
}

#[test]
fn test_buffered_preserves_order() {
    let capture = Arc::new(Capture::default());
    let (buffered, guard) = Buffered::new(16, capture.clone()).unwrap();

    let logger = Logger::new(());
    logger.set_handler(buffered);
    for i in 0..100 {
        logger.info("seq", ctx!("i" => i));
    }
    guard.shutdown().unwrap();

    let seen = capture
        .records()
        .iter()
        .map(|r| r.get("i").and_then(Value::to_i64).unwrap())
        .collect::<Vec<_>>();
    assert_eq!(seen, (0..100i64).collect::<Vec<_>>());
}

#[test]
fn test_buffered_rendezvous_hands_off_before_returning() {
    #[derive(Debug)]
    struct Gate {
        entered: Sender<i64>,
        release: Receiver<()>,
        capture: Arc<Capture>,
    }

    impl Handler for Gate {
        fn handle(&self, record: &Record) -> Result<(), Error> {
            let i = record.get("i").and_then(Value::to_i64).unwrap_or(-1);
            self.entered.send(i).unwrap();
            self.release.recv().unwrap();
            self.capture.handle(record)
        }
    }

    let (entered_tx, entered_rx) = crossbeam_channel::unbounded();
    let (release_tx, release_rx) = crossbeam_channel::unbounded();
    let capture = Arc::new(Capture::default());
    let (buffered, guard) = BufferedBuilder::new("rendezvous")
        .capacity(0)
        .build(Gate {
            entered: entered_tx,
            release: release_rx,
            capture: capture.clone(),
        })
        .unwrap();
    let buffered = Arc::new(buffered);

    // returns only once the worker has taken the record
    buffered.handle(&record(Level::Info, ctx!("i" => 0))).unwrap();
    assert_eq!(entered_rx.recv_timeout(Duration::from_secs(5)), Ok(0));

    // the worker is busy with record 0, so nobody can take record 1 yet
    let handed_off = Arc::new(AtomicBool::new(false));
    let producer = {
        let buffered = buffered.clone();
        let handed_off = handed_off.clone();
        thread::spawn(move || {
            buffered.handle(&record(Level::Info, ctx!("i" => 1))).unwrap();
            handed_off.store(true, Ordering::SeqCst);
        })
    };
    thread::sleep(Duration::from_millis(100));
    assert!(!handed_off.load(Ordering::SeqCst));

    release_tx.send(()).unwrap();
    producer.join().unwrap();
    assert!(handed_off.load(Ordering::SeqCst));
    assert_eq!(entered_rx.recv_timeout(Duration::from_secs(5)), Ok(1));
    release_tx.send(()).unwrap();

    guard.shutdown().unwrap();
    assert_eq!(capture.records().len(), 2);
    let err = buffered.handle(&record(Level::Info, ctx!())).unwrap_err();
    assert!(err.to_string().contains("stopped"), "{err}");
}

#[test]
fn test_buffered_shutdown_delivers_every_accepted_record() {
    #[derive(Debug, Default)]
    struct Count(AtomicUsize);

    impl Handler for Count {
        fn handle(&self, _: &Record) -> Result<(), Error> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    for _ in 0..20 {
        let delivered = Arc::new(Count::default());
        let (buffered, guard) = BufferedBuilder::new("draining")
            .capacity(64)
            .build(delivered.clone())
            .unwrap();
        let buffered = Arc::new(buffered);

        let producers = (0..4)
            .map(|_| {
                let buffered = buffered.clone();
                thread::spawn(move || {
                    let mut accepted = 0;
                    while buffered.handle(&record(Level::Info, ctx!())).is_ok() {
                        accepted += 1;
                    }
                    accepted
                })
            })
            .collect::<Vec<_>>();

        thread::sleep(Duration::from_millis(2));
        guard.shutdown().unwrap();

        let accepted = producers
            .into_iter()
            .map(|producer| producer.join().unwrap())
            .sum::<usize>();
        assert_eq!(accepted, delivered.0.load(Ordering::SeqCst));
    }
}

#[test]
fn test_buffered_sends_inner_errors_to_trap() {
    #[derive(Debug, Clone, Default)]
    struct Collect(Arc<Mutex<Vec<String>>>);

    impl Trap for Collect {
        fn trap(&self, err: &Error) {
            self.0.lock().unwrap().push(err.to_string());
        }
    }

    let trapped = Collect::default();
    let (buffered, guard) = BufferedBuilder::new("trapping")
        .capacity(4)
        .trap(trapped.clone())
        .build(Failing("sink gone"))
        .unwrap();

    buffered.handle(&record(Level::Info, ctx!())).unwrap();
    guard.shutdown().unwrap();

    let trapped = trapped.0.lock().unwrap();
    assert_eq!(trapped.len(), 1);
    assert!(trapped[0].contains("sink gone"), "{trapped:?}");
}

#[test]
fn test_buffered_drop_incoming_never_blocks() {
    #[derive(Debug)]
    struct Gate(Arc<Mutex<()>>, Arc<Capture>);

    impl Handler for Gate {
        fn handle(&self, record: &Record) -> Result<(), Error> {
            let _open = self.0.lock().unwrap();
            self.1.handle(record)
        }
    }

    let gate = Arc::new(Mutex::new(()));
    let capture = Arc::new(Capture::default());
    let (buffered, guard) = BufferedBuilder::new("dropping")
        .capacity(2)
        .overflow_drop_incoming()
        .build(Gate(gate.clone(), capture.clone()))
        .unwrap();

    {
        let _closed = gate.lock().unwrap();
        for i in 0..50 {
            buffered.handle(&record(Level::Info, ctx!("i" => i))).unwrap();
        }
    }
    guard.shutdown().unwrap();

    let delivered = capture.records().len();
    assert!(delivered >= 1, "{delivered}");
    assert!(delivered < 50, "{delivered}");
}
