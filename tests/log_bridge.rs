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

use std::sync::Arc;
use std::sync::Mutex;

use ctxlog::Error;
use ctxlog::Handler;
use ctxlog::Record;
use ctxlog::ctx;
use ctxlog::kv::Value;
use ctxlog::record::Level;

#[derive(Debug, Default)]
struct Capture(Mutex<Vec<Record>>);

impl Handler for Capture {
    fn handle(&self, record: &Record) -> Result<(), Error> {
        self.0.lock().unwrap().push(record.clone());
        Ok(())
    }
}

// the log crate global logger can be installed once per process
#[test]
fn test_log_macros_reach_the_handler() {
    let capture = Arc::new(Capture::default());
    let logger = ctxlog::new(ctx!("bridge" => "log"));
    ctxlog::root().set_handler(capture.clone());
    ctxlog::install_log_bridge(logger.clone(), log::LevelFilter::Debug).unwrap();
    assert!(ctxlog::install_log_bridge(logger, log::LevelFilter::Debug).is_err());

    log::info!(user = "alice", attempts = 3; "signed in");
    log::trace!("filtered by the max level");
    log::debug!("debug {}", 42);

    let records = capture.0.lock().unwrap();
    assert_eq!(records.len(), 2);

    let signed_in = &records[0];
    assert_eq!(signed_in.level(), Level::Info);
    assert_eq!(signed_in.message(), "signed in");
    assert_eq!(signed_in.get("bridge"), Some(&Value::from("log")));
    assert_eq!(signed_in.get("user"), Some(&Value::from("alice")));
    assert_eq!(signed_in.get("attempts"), Some(&Value::I64(3)));

    assert_eq!(records[1].level(), Level::Debug);
    assert_eq!(records[1].message(), "debug 42");
}
